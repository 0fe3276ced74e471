use axum::{extract::State, http::StatusCode, response::IntoResponse, Extension, Json};
use bigdecimal::BigDecimal;
use serde::Deserialize;
use utoipa::ToSchema;
use uuid::Uuid;

use crate::db::models::Store;
use crate::domain::checkout::{CartLine, PaymentIntent};
use crate::error::AppError;
use crate::services::{CheckoutRequest, CheckoutService};
use crate::validation;
use crate::AppState;

#[derive(Debug, Deserialize, ToSchema)]
pub struct CartLinePayload {
    pub product_id: Uuid,
    pub quantity: i64,
    /// Unit price quoted at the register; snapshotted into the receipt.
    #[schema(value_type = String)]
    pub price: BigDecimal,
}

#[derive(Debug, Deserialize, ToSchema)]
pub struct CheckoutPayload {
    pub items: Vec<CartLinePayload>,
    pub customer_id: Option<Uuid>,
    #[schema(value_type = Option<String>)]
    pub discount: Option<BigDecimal>,
    pub points_to_redeem: Option<i64>,
    /// `paid` settles immediately, `deferred` opens a tab.
    #[serde(default = "default_payment")]
    #[schema(value_type = String)]
    pub payment: PaymentIntent,
    pub payment_method: Option<String>,
    pub table_session_id: Option<Uuid>,
}

fn default_payment() -> PaymentIntent {
    PaymentIntent::Paid
}

pub async fn checkout(
    State(state): State<AppState>,
    Extension(store): Extension<Store>,
    Json(payload): Json<CheckoutPayload>,
) -> Result<impl IntoResponse, AppError> {
    if payload.items.is_empty() {
        return Err(AppError::BadRequest(
            "Keranjang belanja masih kosong".to_string(),
        ));
    }
    for line in &payload.items {
        validation::validate_quantity("quantity", line.quantity)?;
        validation::validate_non_negative_amount("price", &line.price)?;
    }
    if let Some(discount) = &payload.discount {
        validation::validate_non_negative_amount("discount", discount)?;
    }

    let request = CheckoutRequest {
        items: payload
            .items
            .into_iter()
            .map(|line| CartLine {
                product_id: line.product_id,
                quantity: line.quantity,
                price: line.price,
            })
            .collect(),
        customer_id: payload.customer_id,
        discount: payload.discount,
        points_to_redeem: payload.points_to_redeem,
        payment: payload.payment,
        payment_method: payload
            .payment_method
            .map(|m| validation::sanitize_string(&m)),
        table_session_id: payload.table_session_id,
    };

    let service = CheckoutService::new(
        state.db.clone(),
        state.settings.clone(),
        state.notifier.clone(),
    );
    let record = service.checkout(store.id, request).await?;

    Ok((StatusCode::CREATED, Json(record)))
}
