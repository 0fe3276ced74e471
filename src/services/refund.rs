//! The refund reverser.
//!
//! Inverse of a checkout, replayed from the transaction's stored snapshot
//! inside one database transaction. The cancelled-status check happens under
//! the transaction row's lock, so refunding twice fails instead of crediting
//! twice.

use sqlx::PgPool;
use std::sync::Arc;
use uuid::Uuid;

use crate::db::models::TransactionRecord;
use crate::db::queries;
use crate::domain::checkout::TransactionItem;
use crate::domain::refund::{plan_refund, RefundError};
use crate::domain::status::TransactionStatus;
use crate::error::AppError;
use crate::services::notification::{cancellation_message, Notifier, WaTarget};
use crate::services::settings::SettingsCache;

#[derive(Clone)]
pub struct RefundService {
    pool: PgPool,
    settings: Arc<SettingsCache>,
    notifier: Notifier,
}

impl RefundService {
    pub fn new(pool: PgPool, settings: Arc<SettingsCache>, notifier: Notifier) -> Self {
        Self {
            pool,
            settings,
            notifier,
        }
    }

    pub async fn refund(
        &self,
        store_id: Uuid,
        transaction_id: Uuid,
    ) -> Result<TransactionRecord, AppError> {
        let fee_settings = self.settings.fees();

        let mut tx = self.pool.begin().await?;

        let record = queries::get_transaction_for_update(&mut tx, store_id, transaction_id)
            .await
            .map_err(|e| match e {
                sqlx::Error::RowNotFound => {
                    AppError::NotFound("Transaksi tidak ditemukan".to_string())
                }
                other => AppError::Database(other),
            })?;

        let status: TransactionStatus = record
            .status
            .parse()
            .map_err(|e: String| AppError::Internal(e))?;
        let items: Vec<TransactionItem> = serde_json::from_value(record.items.clone())
            .map_err(|e| AppError::from(RefundError::CorruptSnapshot(e.to_string())))?;

        let plan = plan_refund(
            status,
            record.receipt_number,
            &items,
            &record.total_amount,
            record.points_earned,
            record.points_redeemed,
            &fee_settings,
        )?;

        // Same lock order as checkout: store, then products, then customer.
        let store = queries::get_store_for_update(&mut tx, store_id).await?;

        for (product_id, quantity) in &plan.restock {
            let touched = queries::restock_product(&mut tx, store_id, *product_id, *quantity).await?;
            if touched == 0 {
                // Product deleted since the sale; nothing to restore.
                tracing::warn!(
                    product_id = %product_id,
                    receipt = record.receipt_number,
                    "product missing during refund restock"
                );
            }
        }

        if let Some(customer_id) = record.customer_id {
            if plan.customer_points_delta != 0 {
                let touched =
                    queries::adjust_customer_points(&mut tx, customer_id, plan.customer_points_delta)
                        .await?;
                if touched == 0 {
                    tracing::warn!(
                        customer_id = %customer_id,
                        receipt = record.receipt_number,
                        "customer missing during refund point reversal"
                    );
                }
            }
        }

        queries::credit_store_tokens(&mut tx, store_id, &plan.fee_tokens).await?;
        let updated = queries::mark_transaction_cancelled(&mut tx, record.id).await?;

        tx.commit().await?;

        metrics::counter!("pos_refund_total", 1);
        tracing::info!(
            store_id = %store_id,
            receipt = updated.receipt_number,
            fee_refunded = %plan.fee_tokens,
            "transaction cancelled and refunded"
        );

        self.notifier.send(
            WaTarget::Number(store.phone.clone()),
            cancellation_message(&store.name, updated.receipt_number),
        );

        Ok(updated)
    }
}
