//! Loyalty reward redemption, outside the checkout path: trading accumulated
//! points for a reward from the store's redemption catalog.

use sqlx::PgPool;
use uuid::Uuid;

use crate::db::models::Customer;
use crate::db::queries;
use crate::error::AppError;

#[derive(Clone)]
pub struct LoyaltyService {
    pool: PgPool,
}

impl LoyaltyService {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    pub async fn redeem(
        &self,
        store_id: Uuid,
        customer_id: Uuid,
        option_id: Uuid,
    ) -> Result<Customer, AppError> {
        let option = queries::get_redemption_option(&self.pool, store_id, option_id)
            .await
            .map_err(|e| match e {
                sqlx::Error::RowNotFound => {
                    AppError::NotFound("Hadiah tidak ditemukan".to_string())
                }
                other => AppError::Database(other),
            })?;

        let mut tx = self.pool.begin().await?;

        let customer = queries::get_customer_for_update(&mut tx, store_id, customer_id)
            .await
            .map_err(|e| match e {
                sqlx::Error::RowNotFound => {
                    AppError::NotFound("Pelanggan tidak ditemukan".to_string())
                }
                other => AppError::Database(other),
            })?;

        if customer.loyalty_points < option.points_cost {
            return Err(AppError::InsufficientPoints(format!(
                "Poin pelanggan tidak mencukupi (tersisa {}, dibutuhkan {})",
                customer.loyalty_points, option.points_cost
            )));
        }

        queries::adjust_customer_points(&mut tx, customer_id, -option.points_cost).await?;
        tx.commit().await?;

        tracing::info!(
            store_id = %store_id,
            customer_id = %customer_id,
            option = %option.name,
            points = option.points_cost,
            "reward redeemed"
        );

        queries::get_customer(&self.pool, store_id, customer_id)
            .await
            .map_err(AppError::Database)
    }
}
