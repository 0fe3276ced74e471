//! The checkout engine.
//!
//! One database transaction re-reads every row the sale touches under
//! `FOR UPDATE` locks, plans the writes with [`plan_checkout`], applies them,
//! and commits. Any error before the commit rolls back every change: stock,
//! points, balance, and counter move together or not at all.

use bigdecimal::BigDecimal;
use chrono::Utc;
use sqlx::PgPool;
use std::sync::Arc;
use uuid::Uuid;

use crate::db::models::TransactionRecord;
use crate::db::queries;
use crate::domain::checkout::{
    plan_checkout, CartLine, CustomerSnapshot, PaymentIntent, ProductSnapshot, StoreSnapshot,
};
use crate::error::AppError;
use crate::services::notification::{receipt_message, Notifier, WaTarget};
use crate::services::settings::SettingsCache;

#[derive(Debug, Clone)]
pub struct CheckoutRequest {
    pub items: Vec<CartLine>,
    pub customer_id: Option<Uuid>,
    pub discount: Option<BigDecimal>,
    pub points_to_redeem: Option<i64>,
    pub payment: PaymentIntent,
    pub payment_method: Option<String>,
    pub table_session_id: Option<Uuid>,
}

#[derive(Clone)]
pub struct CheckoutService {
    pool: PgPool,
    settings: Arc<SettingsCache>,
    notifier: Notifier,
}

impl CheckoutService {
    pub fn new(pool: PgPool, settings: Arc<SettingsCache>, notifier: Notifier) -> Self {
        Self {
            pool,
            settings,
            notifier,
        }
    }

    pub async fn checkout(
        &self,
        store_id: Uuid,
        request: CheckoutRequest,
    ) -> Result<TransactionRecord, AppError> {
        let fee_settings = self.settings.fees();
        let point_settings = self.settings.points();
        let discount = request.discount.clone().unwrap_or_else(|| BigDecimal::from(0));
        let points_to_redeem = request.points_to_redeem.unwrap_or(0);

        let mut product_ids: Vec<Uuid> = request.items.iter().map(|l| l.product_id).collect();
        product_ids.sort();
        product_ids.dedup();

        let mut tx = self.pool.begin().await?;

        // Lock order: store, products (by id), customer. The refund path
        // takes the same order.
        let store = queries::get_store_for_update(&mut tx, store_id).await?;
        let products = queries::get_products_for_update(&mut tx, store_id, &product_ids).await?;
        let customer = match request.customer_id {
            Some(id) => Some(
                queries::get_customer_for_update(&mut tx, store_id, id)
                    .await
                    .map_err(|e| match e {
                        sqlx::Error::RowNotFound => {
                            AppError::NotFound("Pelanggan tidak ditemukan".to_string())
                        }
                        other => AppError::Database(other),
                    })?,
            ),
            None => None,
        };

        let store_snapshot = StoreSnapshot {
            token_balance: store.pradana_token_balance.clone(),
            transaction_counter: store.transaction_counter,
        };
        let product_snapshots: Vec<ProductSnapshot> = products
            .iter()
            .map(|p| ProductSnapshot {
                id: p.id,
                name: p.name.clone(),
                stock: p.stock,
            })
            .collect();
        let customer_snapshot = customer.as_ref().map(|c| CustomerSnapshot {
            id: c.id,
            loyalty_points: c.loyalty_points,
        });

        let plan = plan_checkout(
            &store_snapshot,
            &product_snapshots,
            customer_snapshot.as_ref(),
            &request.items,
            &discount,
            points_to_redeem,
            &fee_settings,
            Some(point_settings.as_ref()),
            request.payment,
        )?;

        for (product_id, stock) in &plan.stock_after {
            queries::set_product_stock(&mut tx, *product_id, *stock).await?;
        }
        if let Some(customer) = &customer {
            if plan.customer_points_delta != 0 {
                queries::adjust_customer_points(&mut tx, customer.id, plan.customer_points_delta)
                    .await?;
            }
        }
        queries::apply_checkout_store_update(
            &mut tx,
            store_id,
            &plan.fee_tokens,
            plan.receipt_number,
            plan.stamp_first_transaction,
        )
        .await?;

        // An order taken at a table has been served; drop its pending cart
        // before the record references the session.
        if let Some(session_id) = request.table_session_id {
            let touched = queries::clear_pending_cart(&mut tx, store_id, session_id).await?;
            if touched == 0 {
                return Err(AppError::NotFound("Sesi meja tidak ditemukan".to_string()));
            }
        }

        let record = TransactionRecord {
            id: Uuid::new_v4(),
            store_id,
            receipt_number: plan.receipt_number,
            customer_id: customer.as_ref().map(|c| c.id),
            items: serde_json::to_value(&plan.items)
                .map_err(|e| AppError::Internal(format!("item snapshot serialize failed: {}", e)))?,
            total_amount: plan.total_amount.clone(),
            discount: plan.discount.clone(),
            points_earned: plan.points_earned,
            points_redeemed: plan.points_redeemed,
            fee_tokens: plan.fee_tokens.clone(),
            status: plan.status.to_string(),
            payment_method: request.payment_method.clone(),
            table_session_id: request.table_session_id,
            created_at: Utc::now(),
            cancelled_at: None,
        };
        let record = queries::insert_transaction(&mut tx, &record).await?;

        tx.commit().await?;

        metrics::counter!("pos_checkout_total", 1);
        tracing::info!(
            store_id = %store_id,
            receipt = record.receipt_number,
            total = %record.total_amount,
            fee = %record.fee_tokens,
            "checkout committed"
        );

        if let Some(customer) = &customer {
            if let Some(phone) = customer.phone.clone() {
                self.notifier.send(
                    WaTarget::Number(phone),
                    receipt_message(
                        &store.name,
                        record.receipt_number,
                        &plan.items,
                        &record.total_amount,
                    ),
                );
            }
        }

        Ok(record)
    }
}
