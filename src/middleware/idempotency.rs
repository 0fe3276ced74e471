//! Redis-backed idempotency for the checkout endpoint.
//!
//! A cashier terminal on flaky Wi-Fi retries checkout requests; replaying a
//! retried request must not sell the cart twice. Requests carrying an
//! `x-idempotency-key` header are answered from cache on repeat, rejected
//! while the first attempt is still in flight, and processed normally when
//! Redis itself is unreachable (fail open).

use axum::{
    body::Body,
    extract::{Request, State},
    http::StatusCode,
    middleware::Next,
    response::{IntoResponse, Response},
    Json,
};
use redis::AsyncCommands;
use serde::{Deserialize, Serialize};

const KEY_PREFIX: &str = "pos:idem:";

#[derive(Clone)]
pub struct IdempotencyService {
    redis_client: redis::Client,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct CachedResponse {
    status: u16,
    body: String,
}

#[derive(Debug)]
pub enum IdempotencyStatus {
    New,
    Processing,
    Completed(CachedResponse),
}

impl IdempotencyService {
    pub fn new(redis_url: &str) -> anyhow::Result<Self> {
        let redis_client = redis::Client::open(redis_url)?;
        Ok(Self { redis_client })
    }

    pub async fn check(&self, key: &str) -> anyhow::Result<IdempotencyStatus> {
        let mut conn = self.redis_client.get_multiplexed_async_connection().await?;
        let redis_key = format!("{}{}", KEY_PREFIX, key);

        let existing: Option<String> = conn.get(&redis_key).await?;
        match existing {
            Some(value) if value == "PROCESSING" => Ok(IdempotencyStatus::Processing),
            Some(value) => {
                let cached: CachedResponse = serde_json::from_str(&value)?;
                Ok(IdempotencyStatus::Completed(cached))
            }
            None => {
                // Short-lived processing lock; the full response replaces it
                // on success.
                let _: () = conn.set_ex(&redis_key, "PROCESSING", 300).await?;
                Ok(IdempotencyStatus::New)
            }
        }
    }

    pub async fn store_response(&self, key: &str, status: u16, body: String) -> anyhow::Result<()> {
        let mut conn = self.redis_client.get_multiplexed_async_connection().await?;
        let redis_key = format!("{}{}", KEY_PREFIX, key);

        let serialized = serde_json::to_string(&CachedResponse { status, body })?;
        let _: () = conn.set_ex(&redis_key, serialized, 86_400).await?;
        Ok(())
    }

    pub async fn release_lock(&self, key: &str) -> anyhow::Result<()> {
        let mut conn = self.redis_client.get_multiplexed_async_connection().await?;
        let redis_key = format!("{}{}", KEY_PREFIX, key);
        let _: () = conn.del(&redis_key).await?;
        Ok(())
    }
}

pub async fn idempotency_middleware(
    State(service): State<IdempotencyService>,
    request: Request,
    next: Next,
) -> Response {
    let key = match request.headers().get("x-idempotency-key") {
        Some(value) => match value.to_str() {
            Ok(k) => k.to_string(),
            Err(_) => {
                return (
                    StatusCode::BAD_REQUEST,
                    Json(serde_json::json!({
                        "error": "x-idempotency-key tidak valid"
                    })),
                )
                    .into_response();
            }
        },
        // No key, no idempotency guarantees.
        None => return next.run(request).await,
    };

    match service.check(&key).await {
        Ok(IdempotencyStatus::New) => {
            let response = next.run(request).await;

            if response.status().is_success() {
                let (parts, body) = response.into_parts();
                let bytes = match axum::body::to_bytes(body, usize::MAX).await {
                    Ok(bytes) => bytes,
                    Err(e) => {
                        tracing::error!("failed to buffer response for idempotency cache: {}", e);
                        return StatusCode::INTERNAL_SERVER_ERROR.into_response();
                    }
                };
                let body_text = String::from_utf8_lossy(&bytes).to_string();
                if let Err(e) = service
                    .store_response(&key, parts.status.as_u16(), body_text)
                    .await
                {
                    tracing::error!("failed to store idempotency response: {}", e);
                }
                Response::from_parts(parts, Body::from(bytes))
            } else {
                // Let the client retry a failed attempt with the same key.
                if let Err(e) = service.release_lock(&key).await {
                    tracing::error!("failed to release idempotency lock: {}", e);
                }
                response
            }
        }
        Ok(IdempotencyStatus::Processing) => (
            StatusCode::TOO_MANY_REQUESTS,
            Json(serde_json::json!({
                "error": "Permintaan dengan kunci yang sama sedang diproses",
                "retry_after": 5
            })),
        )
            .into_response(),
        Ok(IdempotencyStatus::Completed(cached)) => {
            let status = StatusCode::from_u16(cached.status).unwrap_or(StatusCode::OK);
            (
                status,
                [("content-type", "application/json")],
                cached.body,
            )
                .into_response()
        }
        Err(e) => {
            tracing::error!("idempotency check failed, continuing without it: {}", e);
            next.run(request).await
        }
    }
}
