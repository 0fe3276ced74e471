//! Redemption catalog and reward redemption.

use axum::{
    extract::{Path, State},
    http::StatusCode,
    response::IntoResponse,
    Extension, Json,
};
use chrono::Utc;
use serde::Deserialize;
use utoipa::ToSchema;
use uuid::Uuid;

use crate::db::models::{RedemptionOption, Store};
use crate::db::queries;
use crate::error::AppError;
use crate::services::LoyaltyService;
use crate::validation;
use crate::AppState;

#[derive(Debug, Deserialize, ToSchema)]
pub struct RedemptionOptionPayload {
    pub name: String,
    pub points_cost: i64,
}

#[derive(Debug, Deserialize, ToSchema)]
pub struct RedeemPayload {
    pub option_id: Uuid,
}

pub async fn create_redemption_option(
    State(state): State<AppState>,
    Extension(store): Extension<Store>,
    Json(payload): Json<RedemptionOptionPayload>,
) -> Result<impl IntoResponse, AppError> {
    let name = validation::sanitize_string(&payload.name);
    validation::validate_required("name", &name)?;
    validation::validate_max_len("name", &name, validation::NAME_MAX_LEN)?;
    validation::validate_quantity("points_cost", payload.points_cost)?;

    let option = RedemptionOption {
        id: Uuid::new_v4(),
        store_id: store.id,
        name,
        points_cost: payload.points_cost,
        created_at: Utc::now(),
    };

    let inserted = queries::insert_redemption_option(&state.db, &option).await?;
    Ok((StatusCode::CREATED, Json(inserted)))
}

pub async fn list_redemption_options(
    State(state): State<AppState>,
    Extension(store): Extension<Store>,
) -> Result<impl IntoResponse, AppError> {
    let options = queries::list_redemption_options(&state.db, store.id).await?;
    Ok(Json(options))
}

pub async fn delete_redemption_option(
    State(state): State<AppState>,
    Extension(store): Extension<Store>,
    Path(id): Path<Uuid>,
) -> Result<impl IntoResponse, AppError> {
    let deleted = queries::delete_redemption_option(&state.db, store.id, id).await?;
    if deleted == 0 {
        return Err(AppError::NotFound("Hadiah tidak ditemukan".to_string()));
    }

    Ok(StatusCode::NO_CONTENT)
}

pub async fn redeem(
    State(state): State<AppState>,
    Extension(store): Extension<Store>,
    Path(customer_id): Path<Uuid>,
    Json(payload): Json<RedeemPayload>,
) -> Result<impl IntoResponse, AppError> {
    let service = LoyaltyService::new(state.db.clone());
    let customer = service
        .redeem(store.id, customer_id, payload.option_id)
        .await?;

    Ok(Json(customer))
}
