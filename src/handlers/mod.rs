pub mod catalog;
pub mod checkout;
pub mod customers;
pub mod loyalty;
pub mod products;
pub mod settings;
pub mod stores;
pub mod topups;
pub mod transactions;

use axum::{extract::State, http::StatusCode, response::IntoResponse, Json};
use serde::Serialize;

use crate::AppState;

#[derive(Serialize)]
struct DbPoolStats {
    active_connections: u32,
    idle_connections: u32,
}

#[derive(Serialize)]
struct HealthStatus {
    status: String,
    version: String,
    db: String,
    db_pool: DbPoolStats,
}

pub async fn health(State(state): State<AppState>) -> impl IntoResponse {
    // Check database connectivity with SELECT 1 query
    let db_status = match sqlx::query("SELECT 1").execute(&state.db).await {
        Ok(_) => "connected",
        Err(_) => "disconnected",
    };

    let pool_stats = DbPoolStats {
        active_connections: state.db.size(),
        idle_connections: state.db.num_idle() as u32,
    };

    let health_response = HealthStatus {
        status: if db_status == "connected" {
            "healthy".to_string()
        } else {
            "unhealthy".to_string()
        },
        version: env!("CARGO_PKG_VERSION").to_string(),
        db: db_status.to_string(),
        db_pool: pool_stats,
    };

    let status_code = if db_status == "connected" {
        StatusCode::OK
    } else {
        StatusCode::SERVICE_UNAVAILABLE
    };

    (status_code, Json(health_response))
}
