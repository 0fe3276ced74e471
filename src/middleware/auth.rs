use axum::{
    extract::{Request, State},
    http::{header::AUTHORIZATION, HeaderMap},
    middleware::Next,
    response::Response,
};

use crate::config::Config;
use crate::db::queries;
use crate::error::AppError;
use crate::AppState;

fn bearer_token(headers: &HeaderMap) -> Option<&str> {
    let value = headers.get(AUTHORIZATION)?.to_str().ok()?;
    Some(value.strip_prefix("Bearer ").unwrap_or(value))
}

/// Resolve the calling store from its API key and attach it to the request.
/// Every `/api` handler reads the store from request extensions.
pub async fn store_auth(
    State(state): State<AppState>,
    mut req: Request,
    next: Next,
) -> Result<Response, AppError> {
    let token = bearer_token(req.headers())
        .ok_or_else(|| AppError::Unauthorized("API key toko diperlukan".to_string()))?
        .to_string();

    let store = queries::get_store_by_api_key(&state.db, &token)
        .await
        .map_err(|e| match e {
            sqlx::Error::RowNotFound => {
                AppError::Unauthorized("API key toko tidak valid".to_string())
            }
            other => AppError::Database(other),
        })?;

    req.extensions_mut().insert(store);
    Ok(next.run(req).await)
}

pub async fn admin_auth(
    State(config): State<Config>,
    req: Request,
    next: Next,
) -> Result<Response, AppError> {
    match bearer_token(req.headers()) {
        Some(token) if token == config.admin_api_key => Ok(next.run(req).await),
        _ => Err(AppError::Unauthorized(
            "API key admin tidak valid".to_string(),
        )),
    }
}
