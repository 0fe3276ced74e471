//! Admin management of the app-wide fee and loyalty schedules.

use axum::{extract::State, response::IntoResponse, Json};
use bigdecimal::BigDecimal;

use crate::domain::fee::FeeSettings;
use crate::domain::points::PointSettings;
use crate::error::AppError;
use crate::AppState;

pub async fn get_fee_settings(State(state): State<AppState>) -> impl IntoResponse {
    Json(state.settings.fees().as_ref().clone())
}

pub async fn put_fee_settings(
    State(state): State<AppState>,
    Json(payload): Json<FeeSettings>,
) -> Result<impl IntoResponse, AppError> {
    let zero = BigDecimal::from(0);
    if payload.fee_percentage < zero
        || payload.min_fee_rp < zero
        || payload.max_fee_rp < zero
        || payload.token_value_rp < zero
    {
        return Err(AppError::Validation(
            "pengaturan biaya tidak boleh negatif".to_string(),
        ));
    }

    state.settings.update_fees(&state.db, payload.clone()).await?;
    tracing::info!("fee settings updated");

    Ok(Json(payload))
}

pub async fn get_point_settings(State(state): State<AppState>) -> impl IntoResponse {
    Json(state.settings.points().as_ref().clone())
}

pub async fn put_point_settings(
    State(state): State<AppState>,
    Json(payload): Json<PointSettings>,
) -> Result<impl IntoResponse, AppError> {
    if payload.rp_per_point < BigDecimal::from(0) {
        return Err(AppError::Validation(
            "rp_per_point tidak boleh negatif".to_string(),
        ));
    }

    state
        .settings
        .update_points(&state.db, payload.clone())
        .await?;
    tracing::info!("point settings updated");

    Ok(Json(payload))
}
