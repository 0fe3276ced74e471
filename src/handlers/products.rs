use axum::{
    extract::{Path, State},
    http::StatusCode,
    response::IntoResponse,
    Extension, Json,
};
use bigdecimal::BigDecimal;
use chrono::Utc;
use serde::Deserialize;
use utoipa::ToSchema;
use uuid::Uuid;

use crate::db::models::{Product, Store};
use crate::db::queries;
use crate::error::AppError;
use crate::validation;
use crate::AppState;

#[derive(Debug, Deserialize, ToSchema)]
pub struct ProductPayload {
    pub name: String,
    #[schema(value_type = String)]
    pub price: BigDecimal,
    pub stock: i64,
    pub category: Option<String>,
    pub image_url: Option<String>,
    #[serde(default = "default_listed")]
    pub is_listed: bool,
}

fn default_listed() -> bool {
    true
}

fn validate_payload(payload: &ProductPayload) -> Result<String, AppError> {
    let name = validation::sanitize_string(&payload.name);
    validation::validate_required("name", &name)?;
    validation::validate_max_len("name", &name, validation::NAME_MAX_LEN)?;
    validation::validate_non_negative_amount("price", &payload.price)?;
    if payload.stock < 0 {
        return Err(AppError::Validation("stock: tidak boleh negatif".to_string()));
    }

    Ok(name)
}

pub async fn create_product(
    State(state): State<AppState>,
    Extension(store): Extension<Store>,
    Json(payload): Json<ProductPayload>,
) -> Result<impl IntoResponse, AppError> {
    let name = validate_payload(&payload)?;

    let now = Utc::now();
    let product = Product {
        id: Uuid::new_v4(),
        store_id: store.id,
        name,
        price: payload.price,
        stock: payload.stock,
        category: payload.category,
        image_url: payload.image_url,
        is_listed: payload.is_listed,
        created_at: now,
        updated_at: now,
    };

    let inserted = queries::insert_product(&state.db, &product).await?;
    Ok((StatusCode::CREATED, Json(inserted)))
}

pub async fn list_products(
    State(state): State<AppState>,
    Extension(store): Extension<Store>,
) -> Result<impl IntoResponse, AppError> {
    let products = queries::list_products(&state.db, store.id).await?;
    Ok(Json(products))
}

pub async fn get_product(
    State(state): State<AppState>,
    Extension(store): Extension<Store>,
    Path(id): Path<Uuid>,
) -> Result<impl IntoResponse, AppError> {
    let product = queries::get_product(&state.db, store.id, id)
        .await
        .map_err(|e| match e {
            sqlx::Error::RowNotFound => AppError::NotFound("Produk tidak ditemukan".to_string()),
            other => AppError::Database(other),
        })?;

    Ok(Json(product))
}

pub async fn update_product(
    State(state): State<AppState>,
    Extension(store): Extension<Store>,
    Path(id): Path<Uuid>,
    Json(payload): Json<ProductPayload>,
) -> Result<impl IntoResponse, AppError> {
    let name = validate_payload(&payload)?;

    // Stock edits here are manual corrections; sales go through checkout.
    let existing = queries::get_product(&state.db, store.id, id)
        .await
        .map_err(|e| match e {
            sqlx::Error::RowNotFound => AppError::NotFound("Produk tidak ditemukan".to_string()),
            other => AppError::Database(other),
        })?;

    let updated = queries::update_product(
        &state.db,
        &Product {
            name,
            price: payload.price,
            stock: payload.stock,
            category: payload.category,
            image_url: payload.image_url,
            is_listed: payload.is_listed,
            ..existing
        },
    )
    .await?;

    Ok(Json(updated))
}

pub async fn delete_product(
    State(state): State<AppState>,
    Extension(store): Extension<Store>,
    Path(id): Path<Uuid>,
) -> Result<impl IntoResponse, AppError> {
    let deleted = queries::delete_product(&state.db, store.id, id).await?;
    if deleted == 0 {
        return Err(AppError::NotFound("Produk tidak ditemukan".to_string()));
    }

    Ok(StatusCode::NO_CONTENT)
}
