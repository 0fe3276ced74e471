use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    response::IntoResponse,
    Extension, Json,
};
use chrono::Utc;
use serde::Deserialize;
use utoipa::ToSchema;
use uuid::Uuid;

use crate::db::models::{Customer, Store};
use crate::db::queries;
use crate::error::AppError;
use crate::validation;
use crate::AppState;

#[derive(Debug, Deserialize, ToSchema)]
pub struct CustomerPayload {
    pub name: String,
    pub phone: Option<String>,
}

#[derive(Deserialize)]
pub struct Pagination {
    pub limit: Option<i64>,
    pub offset: Option<i64>,
}

fn validate_payload(payload: &CustomerPayload) -> Result<(String, Option<String>), AppError> {
    let name = validation::sanitize_string(&payload.name);
    validation::validate_required("name", &name)?;
    validation::validate_max_len("name", &name, validation::NAME_MAX_LEN)?;

    let phone = match &payload.phone {
        Some(phone) if !phone.trim().is_empty() => {
            validation::validate_phone("phone", phone)?;
            Some(validation::sanitize_string(phone))
        }
        _ => None,
    };

    Ok((name, phone))
}

pub async fn create_customer(
    State(state): State<AppState>,
    Extension(store): Extension<Store>,
    Json(payload): Json<CustomerPayload>,
) -> Result<impl IntoResponse, AppError> {
    let (name, phone) = validate_payload(&payload)?;

    let now = Utc::now();
    let customer = Customer {
        id: Uuid::new_v4(),
        store_id: store.id,
        name,
        phone,
        loyalty_points: 0,
        created_at: now,
        updated_at: now,
    };

    let inserted = queries::insert_customer(&state.db, &customer).await?;
    Ok((StatusCode::CREATED, Json(inserted)))
}

pub async fn list_customers(
    State(state): State<AppState>,
    Extension(store): Extension<Store>,
    Query(pagination): Query<Pagination>,
) -> Result<impl IntoResponse, AppError> {
    let limit = pagination.limit.unwrap_or(50).clamp(1, 200);
    let offset = pagination.offset.unwrap_or(0).max(0);

    let customers = queries::list_customers(&state.db, store.id, limit, offset).await?;
    Ok(Json(customers))
}

pub async fn get_customer(
    State(state): State<AppState>,
    Extension(store): Extension<Store>,
    Path(id): Path<Uuid>,
) -> Result<impl IntoResponse, AppError> {
    let customer = queries::get_customer(&state.db, store.id, id)
        .await
        .map_err(|e| match e {
            sqlx::Error::RowNotFound => AppError::NotFound("Pelanggan tidak ditemukan".to_string()),
            other => AppError::Database(other),
        })?;

    Ok(Json(customer))
}

pub async fn update_customer(
    State(state): State<AppState>,
    Extension(store): Extension<Store>,
    Path(id): Path<Uuid>,
    Json(payload): Json<CustomerPayload>,
) -> Result<impl IntoResponse, AppError> {
    let (name, phone) = validate_payload(&payload)?;

    let existing = queries::get_customer(&state.db, store.id, id)
        .await
        .map_err(|e| match e {
            sqlx::Error::RowNotFound => AppError::NotFound("Pelanggan tidak ditemukan".to_string()),
            other => AppError::Database(other),
        })?;

    let updated = queries::update_customer(
        &state.db,
        &Customer {
            name,
            phone,
            ..existing
        },
    )
    .await?;

    Ok(Json(updated))
}

pub async fn delete_customer(
    State(state): State<AppState>,
    Extension(store): Extension<Store>,
    Path(id): Path<Uuid>,
) -> Result<impl IntoResponse, AppError> {
    let deleted = queries::delete_customer(&state.db, store.id, id).await?;
    if deleted == 0 {
        return Err(AppError::NotFound("Pelanggan tidak ditemukan".to_string()));
    }

    Ok(StatusCode::NO_CONTENT)
}
