//! The public digital catalog: no authentication, CORS-open, read-mostly.
//! Orders placed here park a cart on a table session; the cashier turns the
//! cart into a real transaction at checkout.

use axum::{
    extract::{Path, State},
    http::StatusCode,
    response::IntoResponse,
    Extension, Json,
};
use bigdecimal::BigDecimal;
use chrono::Utc;
use serde::{Deserialize, Serialize};
use serde_json::json;
use utoipa::ToSchema;
use uuid::Uuid;

use crate::db::models::{Product, Store, TableSession};
use crate::db::queries;
use crate::domain::checkout::CartLine;
use crate::error::AppError;
use crate::validation;
use crate::AppState;

#[derive(Debug, Serialize, ToSchema)]
pub struct CatalogProfile {
    pub name: String,
    pub catalog_slug: String,
    pub phone: String,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct CatalogProduct {
    pub id: Uuid,
    pub name: String,
    #[schema(value_type = String)]
    pub price: BigDecimal,
    pub category: Option<String>,
    pub image_url: Option<String>,
    pub in_stock: bool,
}

impl From<&Product> for CatalogProduct {
    fn from(product: &Product) -> Self {
        CatalogProduct {
            id: product.id,
            name: product.name.clone(),
            price: product.price.clone(),
            category: product.category.clone(),
            image_url: product.image_url.clone(),
            in_stock: product.stock > 0,
        }
    }
}

#[derive(Debug, Deserialize, ToSchema)]
pub struct OrderItemPayload {
    pub product_id: Uuid,
    pub quantity: i64,
}

#[derive(Debug, Deserialize, ToSchema)]
pub struct OrderPayload {
    pub table_name: String,
    pub customer_name: Option<String>,
    pub customer_phone: Option<String>,
    pub items: Vec<OrderItemPayload>,
}

async fn store_by_slug(state: &AppState, slug: &str) -> Result<Store, AppError> {
    queries::get_store_by_slug(&state.db, slug)
        .await
        .map_err(|e| match e {
            sqlx::Error::RowNotFound => AppError::NotFound("Toko tidak ditemukan".to_string()),
            other => AppError::Database(other),
        })
}

pub async fn store_profile(
    State(state): State<AppState>,
    Path(slug): Path<String>,
) -> Result<impl IntoResponse, AppError> {
    let store = store_by_slug(&state, &slug).await?;

    Ok(Json(CatalogProfile {
        name: store.name,
        catalog_slug: store.catalog_slug,
        phone: store.phone,
    }))
}

pub async fn list_products(
    State(state): State<AppState>,
    Path(slug): Path<String>,
) -> Result<impl IntoResponse, AppError> {
    let store = store_by_slug(&state, &slug).await?;
    let products = queries::list_catalog_products(&state.db, store.id).await?;
    let catalog: Vec<CatalogProduct> = products.iter().map(CatalogProduct::from).collect();

    Ok(Json(catalog))
}

pub async fn place_order(
    State(state): State<AppState>,
    Path(slug): Path<String>,
    Json(payload): Json<OrderPayload>,
) -> Result<impl IntoResponse, AppError> {
    let store = store_by_slug(&state, &slug).await?;

    let table_name = validation::sanitize_string(&payload.table_name);
    validation::validate_required("table_name", &table_name)?;
    validation::validate_max_len("table_name", &table_name, validation::NAME_MAX_LEN)?;
    if payload.items.is_empty() {
        return Err(AppError::BadRequest("Pesanan masih kosong".to_string()));
    }
    if let Some(phone) = &payload.customer_phone {
        if !phone.trim().is_empty() {
            validation::validate_phone("customer_phone", phone)?;
        }
    }

    // Price the cart from the catalog now; the cashier checks out exactly
    // what the customer saw.
    let listed = queries::list_catalog_products(&state.db, store.id).await?;
    let mut cart: Vec<CartLine> = Vec::with_capacity(payload.items.len());
    for item in &payload.items {
        validation::validate_quantity("quantity", item.quantity)?;
        let product = listed
            .iter()
            .find(|p| p.id == item.product_id)
            .ok_or_else(|| {
                AppError::BadRequest("Produk tidak tersedia di katalog".to_string())
            })?;
        cart.push(CartLine {
            product_id: product.id,
            quantity: item.quantity,
            price: product.price.clone(),
        });
    }

    let now = Utc::now();
    let session = TableSession {
        id: Uuid::new_v4(),
        store_id: store.id,
        table_name,
        customer_name: payload
            .customer_name
            .map(|n| validation::sanitize_string(&n))
            .filter(|n| !n.is_empty()),
        customer_phone: payload
            .customer_phone
            .map(|p| validation::sanitize_string(&p))
            .filter(|p| !p.is_empty()),
        pending_cart: Some(
            serde_json::to_value(&cart)
                .map_err(|e| AppError::Internal(format!("cart serialize failed: {}", e)))?,
        ),
        created_at: now,
        updated_at: now,
    };

    let inserted = queries::insert_table_session(&state.db, &session).await?;
    tracing::info!(
        store_id = %store.id,
        session_id = %inserted.id,
        table = %inserted.table_name,
        "catalog order placed"
    );

    Ok((
        StatusCode::CREATED,
        Json(json!({
            "session_id": inserted.id,
            "table_name": inserted.table_name,
        })),
    ))
}

/// Cashier view of catalog orders still waiting to be checked out.
pub async fn list_pending_orders(
    State(state): State<AppState>,
    Extension(store): Extension<Store>,
) -> Result<impl IntoResponse, AppError> {
    let sessions = queries::list_pending_table_sessions(&state.db, store.id).await?;
    Ok(Json(sessions))
}
