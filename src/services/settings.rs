//! Cached application settings.
//!
//! Fee and point settings live in the `app_settings` table and are read on
//! every checkout, so they are kept in an `ArcSwap` cache: loaded at startup,
//! refreshed in the background, and swapped eagerly when an admin writes new
//! values.

use arc_swap::ArcSwap;
use sqlx::PgPool;
use std::sync::Arc;
use std::time::Duration;
use tokio::time::sleep;

use crate::db::queries;
use crate::domain::fee::FeeSettings;
use crate::domain::points::PointSettings;
use crate::error::AppError;

pub const FEE_SETTINGS_NAME: &str = "transaction_fee";
pub const POINT_SETTINGS_NAME: &str = "loyalty_points";

pub struct SettingsCache {
    fees: ArcSwap<FeeSettings>,
    points: ArcSwap<PointSettings>,
}

impl SettingsCache {
    /// Cache with built-in defaults, not backed by the database yet.
    pub fn with_defaults() -> Arc<Self> {
        Arc::new(Self {
            fees: ArcSwap::from_pointee(FeeSettings::default()),
            points: ArcSwap::from_pointee(PointSettings::default()),
        })
    }

    /// Load once, then refresh periodically in the background.
    pub async fn start(pool: PgPool, refresh_interval: Duration) -> Arc<Self> {
        let cache = Self::with_defaults();
        if let Err(e) = cache.reload_once(&pool).await {
            tracing::warn!("settings load failed, using defaults: {}", e);
        }

        let cache_clone = cache.clone();
        tokio::spawn(async move {
            loop {
                sleep(refresh_interval).await;
                if let Err(e) = cache_clone.reload_once(&pool).await {
                    tracing::warn!("settings refresh failed: {}", e);
                }
            }
        });

        cache
    }

    pub async fn reload_once(&self, pool: &PgPool) -> anyhow::Result<()> {
        if let Some(value) = queries::get_app_setting(pool, FEE_SETTINGS_NAME).await? {
            match serde_json::from_value::<FeeSettings>(value) {
                Ok(fees) => self.fees.store(Arc::new(fees)),
                Err(e) => tracing::warn!("stored fee settings unreadable: {}", e),
            }
        }
        if let Some(value) = queries::get_app_setting(pool, POINT_SETTINGS_NAME).await? {
            match serde_json::from_value::<PointSettings>(value) {
                Ok(points) => self.points.store(Arc::new(points)),
                Err(e) => tracing::warn!("stored point settings unreadable: {}", e),
            }
        }

        Ok(())
    }

    pub fn fees(&self) -> Arc<FeeSettings> {
        self.fees.load_full()
    }

    pub fn points(&self) -> Arc<PointSettings> {
        self.points.load_full()
    }

    pub async fn update_fees(&self, pool: &PgPool, fees: FeeSettings) -> Result<(), AppError> {
        let value = serde_json::to_value(&fees)
            .map_err(|e| AppError::Internal(format!("fee settings serialize failed: {}", e)))?;
        queries::upsert_app_setting(pool, FEE_SETTINGS_NAME, &value).await?;
        self.fees.store(Arc::new(fees));

        Ok(())
    }

    pub async fn update_points(&self, pool: &PgPool, points: PointSettings) -> Result<(), AppError> {
        let value = serde_json::to_value(&points)
            .map_err(|e| AppError::Internal(format!("point settings serialize failed: {}", e)))?;
        queries::upsert_app_setting(pool, POINT_SETTINGS_NAME, &value).await?;
        self.points.store(Arc::new(points));

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use bigdecimal::BigDecimal;

    #[test]
    fn defaults_match_the_published_fee_schedule() {
        let cache = SettingsCache::with_defaults();
        let fees = cache.fees();
        assert_eq!(fees.min_fee_rp, BigDecimal::from(500));
        assert_eq!(fees.max_fee_rp, BigDecimal::from(2500));
        assert_eq!(fees.token_value_rp, BigDecimal::from(1000));
        assert!(cache.points().enabled);
    }

    #[test]
    fn swapped_values_are_visible_immediately() {
        let cache = SettingsCache::with_defaults();
        cache.fees.store(Arc::new(FeeSettings {
            min_fee_rp: BigDecimal::from(100),
            ..FeeSettings::default()
        }));
        assert_eq!(cache.fees().min_fee_rp, BigDecimal::from(100));
    }
}
