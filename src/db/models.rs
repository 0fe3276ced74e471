use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::types::BigDecimal;
use sqlx::FromRow;
use utoipa::ToSchema;
use uuid::Uuid;

/// A tenant. Owns its products, customers, and transactions; pays the
/// per-transaction fee from `pradana_token_balance`.
#[derive(Debug, Clone, FromRow, Serialize, Deserialize)]
pub struct Store {
    pub id: Uuid,
    pub name: String,
    pub owner_name: String,
    pub phone: String,
    pub catalog_slug: String,
    #[serde(skip_serializing)]
    pub api_key: String,
    pub pradana_token_balance: BigDecimal,
    pub transaction_counter: i64,
    pub first_transaction_date: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone, FromRow, Serialize, Deserialize, ToSchema)]
pub struct Product {
    pub id: Uuid,
    pub store_id: Uuid,
    pub name: String,
    #[schema(value_type = String)]
    pub price: BigDecimal,
    pub stock: i64,
    pub category: Option<String>,
    pub image_url: Option<String>,
    /// Whether the product appears in the public catalog.
    pub is_listed: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone, FromRow, Serialize, Deserialize, ToSchema)]
pub struct Customer {
    pub id: Uuid,
    pub store_id: Uuid,
    pub name: String,
    pub phone: Option<String>,
    pub loyalty_points: i64,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Immutable once written, except the one-way status transition to
/// `Dibatalkan`. `items` carries the line-item snapshot refunds replay.
#[derive(Debug, Clone, FromRow, Serialize, Deserialize)]
pub struct TransactionRecord {
    pub id: Uuid,
    pub store_id: Uuid,
    pub receipt_number: i64,
    pub customer_id: Option<Uuid>,
    pub items: serde_json::Value,
    pub total_amount: BigDecimal,
    pub discount: BigDecimal,
    pub points_earned: i64,
    pub points_redeemed: i64,
    pub fee_tokens: BigDecimal,
    pub status: String,
    pub payment_method: Option<String>,
    pub table_session_id: Option<Uuid>,
    pub created_at: DateTime<Utc>,
    pub cancelled_at: Option<DateTime<Utc>>,
}

#[derive(Debug, Clone, FromRow, Serialize, Deserialize)]
pub struct TopUpRequest {
    pub id: Uuid,
    pub store_id: Uuid,
    pub amount_rp: BigDecimal,
    pub tokens: BigDecimal,
    pub status: String,
    pub note: Option<String>,
    pub created_at: DateTime<Utc>,
    pub processed_at: Option<DateTime<Utc>>,
}

/// A dine-in table (or online catalog session). `pending_cart` holds an order
/// placed through the public catalog until the cashier checks it out.
#[derive(Debug, Clone, FromRow, Serialize, Deserialize)]
pub struct TableSession {
    pub id: Uuid,
    pub store_id: Uuid,
    pub table_name: String,
    pub customer_name: Option<String>,
    pub customer_phone: Option<String>,
    pub pending_cart: Option<serde_json::Value>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone, FromRow, Serialize, Deserialize, ToSchema)]
pub struct RedemptionOption {
    pub id: Uuid,
    pub store_id: Uuid,
    pub name: String,
    pub points_cost: i64,
    pub created_at: DateTime<Utc>,
}
