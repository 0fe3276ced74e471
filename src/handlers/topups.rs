use axum::{
    extract::{Path, Query, State},
    http::{HeaderMap, StatusCode},
    response::IntoResponse,
    Extension, Json,
};
use bigdecimal::BigDecimal;
use hmac::{Hmac, Mac};
use serde::Deserialize;
use sha2::Sha256;
use utoipa::ToSchema;
use uuid::Uuid;

use crate::db::models::Store;
use crate::db::queries;
use crate::domain::status::TopUpStatus;
use crate::error::AppError;
use crate::services::TopUpService;
use crate::validation;
use crate::AppState;

type HmacSha256 = Hmac<Sha256>;

#[derive(Debug, Deserialize, ToSchema)]
pub struct TopUpPayload {
    #[schema(value_type = String)]
    pub amount_rp: BigDecimal,
    pub note: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct TopUpListQuery {
    pub status: Option<String>,
}

fn service(state: &AppState) -> TopUpService {
    TopUpService::new(
        state.db.clone(),
        state.settings.clone(),
        state.notifier.clone(),
    )
}

pub async fn create_top_up(
    State(state): State<AppState>,
    Extension(store): Extension<Store>,
    Json(payload): Json<TopUpPayload>,
) -> Result<impl IntoResponse, AppError> {
    let note = payload.note.map(|n| validation::sanitize_string(&n));
    if let Some(note) = &note {
        validation::validate_max_len("note", note, validation::NOTE_MAX_LEN)?;
    }

    let request = service(&state)
        .create_request(store.id, payload.amount_rp, note)
        .await?;

    Ok((StatusCode::CREATED, Json(request)))
}

pub async fn list_store_top_ups(
    State(state): State<AppState>,
    Extension(store): Extension<Store>,
) -> Result<impl IntoResponse, AppError> {
    let requests = queries::list_top_ups_for_store(&state.db, store.id).await?;
    Ok(Json(requests))
}

// Admin surface.

pub async fn list_top_ups(
    State(state): State<AppState>,
    Query(query): Query<TopUpListQuery>,
) -> Result<impl IntoResponse, AppError> {
    let status = match &query.status {
        Some(raw) => Some(
            raw.parse::<TopUpStatus>()
                .map_err(|_| AppError::Validation(format!("status tidak dikenal: {}", raw)))?
                .to_string(),
        ),
        None => None,
    };

    let requests = queries::list_top_ups(&state.db, status.as_deref()).await?;
    Ok(Json(requests))
}

pub async fn approve_top_up(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> Result<impl IntoResponse, AppError> {
    let approved = service(&state).approve(id).await?;
    Ok(Json(approved))
}

pub async fn reject_top_up(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> Result<impl IntoResponse, AppError> {
    let rejected = service(&state).reject(id).await?;
    Ok(Json(rejected))
}

// Payment gateway callback.

#[derive(Debug, Deserialize)]
pub struct CallbackPayload {
    pub request_id: Uuid,
    /// `paid` or `failed` as reported by the gateway.
    pub status: String,
}

fn verify_signature(secret: &str, body: &str, signature: &str) -> Result<(), AppError> {
    let mut mac = HmacSha256::new_from_slice(secret.as_bytes())
        .map_err(|e| AppError::Internal(format!("callback secret unusable: {}", e)))?;
    mac.update(body.as_bytes());

    let expected = hex::decode(signature.trim())
        .map_err(|_| AppError::Unauthorized("Signature tidak valid".to_string()))?;
    mac.verify_slice(&expected)
        .map_err(|_| AppError::Unauthorized("Signature tidak valid".to_string()))
}

/// The gateway confirms (or fails) a pending top-up. The body is verified
/// with an HMAC-SHA256 signature over the raw bytes.
pub async fn gateway_callback(
    State(state): State<AppState>,
    headers: HeaderMap,
    body: String,
) -> Result<impl IntoResponse, AppError> {
    let signature = headers
        .get("x-callback-signature")
        .and_then(|value| value.to_str().ok())
        .ok_or_else(|| AppError::Unauthorized("Signature tidak ditemukan".to_string()))?;

    verify_signature(&state.config.topup_callback_secret, &body, signature)?;

    let payload: CallbackPayload = serde_json::from_str(&body)
        .map_err(|e| AppError::BadRequest(format!("payload tidak valid: {}", e)))?;

    let updated = match payload.status.as_str() {
        "paid" => service(&state).approve(payload.request_id).await?,
        "failed" | "expired" => service(&state).reject(payload.request_id).await?,
        other => {
            return Err(AppError::BadRequest(format!(
                "status callback tidak dikenal: {}",
                other
            )));
        }
    };

    Ok(Json(updated))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sign(secret: &str, body: &str) -> String {
        let mut mac = HmacSha256::new_from_slice(secret.as_bytes()).unwrap();
        mac.update(body.as_bytes());
        hex::encode(mac.finalize().into_bytes())
    }

    #[test]
    fn accepts_a_valid_signature() {
        let body = r#"{"request_id":"00000000-0000-0000-0000-000000000000","status":"paid"}"#;
        let signature = sign("rahasia", body);
        assert!(verify_signature("rahasia", body, &signature).is_ok());
    }

    #[test]
    fn rejects_a_tampered_body() {
        let signature = sign("rahasia", "original");
        assert!(verify_signature("rahasia", "tampered", &signature).is_err());
    }

    #[test]
    fn rejects_a_wrong_secret() {
        let signature = sign("rahasia-lain", "body");
        assert!(verify_signature("rahasia", "body", &signature).is_err());
    }

    #[test]
    fn rejects_non_hex_signatures() {
        assert!(verify_signature("rahasia", "body", "not-hex!").is_err());
    }
}
