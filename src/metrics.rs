use axum::{
    extract::{Request, State},
    http::{header::AUTHORIZATION, StatusCode},
    middleware::Next,
    response::Response,
};
use metrics_exporter_prometheus::{PrometheusBuilder, PrometheusHandle};

use crate::config::Config;

pub fn init_metrics() -> anyhow::Result<PrometheusHandle> {
    let handle = PrometheusBuilder::new().install_recorder()?;

    metrics::describe_counter!("pos_checkout_total", "Checkouts committed");
    metrics::describe_counter!("pos_refund_total", "Transactions cancelled and refunded");
    metrics::describe_counter!("pos_topup_approved_total", "Top up requests approved");
    metrics::describe_counter!(
        "pos_notification_failed_total",
        "WhatsApp notifications that failed to send"
    );

    Ok(handle)
}

pub async fn metrics_handler(State(handle): State<PrometheusHandle>) -> String {
    handle.render()
}

pub async fn metrics_auth_middleware(
    State(config): State<Config>,
    req: Request,
    next: Next,
) -> Result<Response, StatusCode> {
    let auth_header = req
        .headers()
        .get(AUTHORIZATION)
        .and_then(|h| h.to_str().ok());

    match auth_header {
        Some(auth)
            if auth == format!("Bearer {}", config.metrics_api_key)
                || auth == config.metrics_api_key =>
        {
            Ok(next.run(req).await)
        }
        _ => Err(StatusCode::UNAUTHORIZED),
    }
}
