use axum::{extract::State, http::StatusCode, response::IntoResponse, Extension, Json};
use chrono::Utc;
use serde::Deserialize;
use serde_json::json;
use utoipa::ToSchema;
use uuid::Uuid;

use crate::db::models::Store;
use crate::db::queries;
use crate::error::AppError;
use crate::validation;
use crate::AppState;

#[derive(Debug, Deserialize, ToSchema)]
pub struct RegisterPayload {
    pub name: String,
    pub owner_name: String,
    pub phone: String,
    pub catalog_slug: String,
}

/// Self-service store registration. The API key is returned exactly once.
pub async fn register(
    State(state): State<AppState>,
    Json(payload): Json<RegisterPayload>,
) -> Result<impl IntoResponse, AppError> {
    let name = validation::sanitize_string(&payload.name);
    let owner_name = validation::sanitize_string(&payload.owner_name);
    let slug = validation::sanitize_string(&payload.catalog_slug);

    validation::validate_required("name", &name)?;
    validation::validate_max_len("name", &name, validation::NAME_MAX_LEN)?;
    validation::validate_required("owner_name", &owner_name)?;
    validation::validate_max_len("owner_name", &owner_name, validation::NAME_MAX_LEN)?;
    validation::validate_phone("phone", &payload.phone)?;
    validation::validate_slug(&slug)?;

    let api_key = format!(
        "cpos_{}{}",
        Uuid::new_v4().simple(),
        Uuid::new_v4().simple()
    );
    let now = Utc::now();
    let store = Store {
        id: Uuid::new_v4(),
        name,
        owner_name,
        phone: validation::sanitize_string(&payload.phone),
        catalog_slug: slug,
        api_key: api_key.clone(),
        pradana_token_balance: state.config.initial_token_balance.clone(),
        transaction_counter: 0,
        first_transaction_date: None,
        created_at: now,
        updated_at: now,
    };

    let inserted = queries::insert_store(&state.db, &store)
        .await
        .map_err(|e| match &e {
            sqlx::Error::Database(db) if db.is_unique_violation() => {
                AppError::BadRequest("Slug katalog sudah dipakai toko lain".to_string())
            }
            _ => AppError::Database(e),
        })?;

    tracing::info!(store_id = %inserted.id, slug = %inserted.catalog_slug, "store registered");

    Ok((
        StatusCode::CREATED,
        Json(json!({
            "store": inserted,
            "api_key": api_key,
        })),
    ))
}

pub async fn current_store(
    Extension(store): Extension<Store>,
) -> Result<impl IntoResponse, AppError> {
    Ok(Json(store))
}
