//! Pradana Token top-ups.
//!
//! A store files a request; an admin (or the payment gateway callback)
//! approves or rejects it. Approval credits the store balance and flips the
//! request status inside one database transaction, so a request is credited
//! at most once no matter how often approval is retried.

use bigdecimal::BigDecimal;
use chrono::Utc;
use sqlx::PgPool;
use std::sync::Arc;
use uuid::Uuid;

use crate::db::models::TopUpRequest;
use crate::db::queries;
use crate::domain::status::TopUpStatus;
use crate::error::AppError;
use crate::services::notification::{topup_message, Notifier, WaTarget};
use crate::services::settings::SettingsCache;
use crate::validation;

#[derive(Clone)]
pub struct TopUpService {
    pool: PgPool,
    settings: Arc<SettingsCache>,
    notifier: Notifier,
}

impl TopUpService {
    pub fn new(pool: PgPool, settings: Arc<SettingsCache>, notifier: Notifier) -> Self {
        Self {
            pool,
            settings,
            notifier,
        }
    }

    pub async fn create_request(
        &self,
        store_id: Uuid,
        amount_rp: BigDecimal,
        note: Option<String>,
    ) -> Result<TopUpRequest, AppError> {
        validation::validate_positive_amount("amount_rp", &amount_rp)?;

        let token_value = self.settings.fees().token_value_rp.clone();
        if token_value <= BigDecimal::from(0) {
            return Err(AppError::Internal(
                "token value is not configured".to_string(),
            ));
        }
        let tokens = &amount_rp / &token_value;

        let request = TopUpRequest {
            id: Uuid::new_v4(),
            store_id,
            amount_rp,
            tokens,
            status: TopUpStatus::Menunggu.to_string(),
            note,
            created_at: Utc::now(),
            processed_at: None,
        };

        let inserted = queries::insert_top_up(&self.pool, &request).await?;
        tracing::info!(
            store_id = %store_id,
            request_id = %inserted.id,
            tokens = %inserted.tokens,
            "top up request created"
        );

        Ok(inserted)
    }

    pub async fn approve(&self, request_id: Uuid) -> Result<TopUpRequest, AppError> {
        let mut tx = self.pool.begin().await?;

        let request = queries::get_top_up_for_update(&mut tx, request_id)
            .await
            .map_err(|e| match e {
                sqlx::Error::RowNotFound => {
                    AppError::NotFound("Permintaan top up tidak ditemukan".to_string())
                }
                other => AppError::Database(other),
            })?;

        let status: TopUpStatus = request
            .status
            .parse()
            .map_err(|e: String| AppError::Internal(e))?;
        if status != TopUpStatus::Menunggu {
            return Err(AppError::BadRequest(format!(
                "Permintaan top up sudah diproses ({})",
                status
            )));
        }

        let store = queries::get_store_for_update(&mut tx, request.store_id).await?;
        queries::credit_store_tokens(&mut tx, request.store_id, &request.tokens).await?;
        let updated =
            queries::mark_top_up_processed(&mut tx, request_id, TopUpStatus::Disetujui.as_str())
                .await?;

        tx.commit().await?;

        metrics::counter!("pos_topup_approved_total", 1);
        tracing::info!(
            store_id = %request.store_id,
            request_id = %request_id,
            tokens = %request.tokens,
            "top up approved"
        );

        self.notifier.send(
            WaTarget::Number(store.phone.clone()),
            topup_message(&store.name, &request.tokens),
        );

        Ok(updated)
    }

    pub async fn reject(&self, request_id: Uuid) -> Result<TopUpRequest, AppError> {
        let mut tx = self.pool.begin().await?;

        let request = queries::get_top_up_for_update(&mut tx, request_id)
            .await
            .map_err(|e| match e {
                sqlx::Error::RowNotFound => {
                    AppError::NotFound("Permintaan top up tidak ditemukan".to_string())
                }
                other => AppError::Database(other),
            })?;

        let status: TopUpStatus = request
            .status
            .parse()
            .map_err(|e: String| AppError::Internal(e))?;
        if status != TopUpStatus::Menunggu {
            return Err(AppError::BadRequest(format!(
                "Permintaan top up sudah diproses ({})",
                status
            )));
        }

        let updated =
            queries::mark_top_up_processed(&mut tx, request_id, TopUpStatus::Ditolak.as_str())
                .await?;

        tx.commit().await?;

        tracing::info!(request_id = %request_id, "top up rejected");

        Ok(updated)
    }
}
