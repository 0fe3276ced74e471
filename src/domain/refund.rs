//! Refund planning: the exact inverse of a checkout, replayed from the
//! transaction's stored snapshot. Current product prices are never consulted;
//! the fee is recomputed from the stored `total_amount` so the credit equals
//! what was charged as long as the fee settings are unchanged.

use bigdecimal::BigDecimal;
use std::fmt;
use uuid::Uuid;

use super::checkout::TransactionItem;
use super::fee::{calculate_fee, FeeSettings};
use super::status::TransactionStatus;

#[derive(Debug, Clone)]
pub struct RefundPlan {
    /// `(product_id, quantity to restore)` per line item.
    pub restock: Vec<(Uuid, i64)>,
    /// `redeemed - earned`: returns redeemed points, takes back earned ones.
    pub customer_points_delta: i64,
    pub fee_tokens: BigDecimal,
}

#[derive(Debug, Clone, PartialEq)]
pub enum RefundError {
    AlreadyCancelled(i64),
    CorruptSnapshot(String),
}

impl fmt::Display for RefundError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RefundError::AlreadyCancelled(receipt) => {
                write!(f, "Transaksi #{} sudah dibatalkan", receipt)
            }
            RefundError::CorruptSnapshot(detail) => {
                write!(f, "transaction snapshot unreadable: {}", detail)
            }
        }
    }
}

impl std::error::Error for RefundError {}

pub fn plan_refund(
    status: TransactionStatus,
    receipt_number: i64,
    items: &[TransactionItem],
    total_amount: &BigDecimal,
    points_earned: i64,
    points_redeemed: i64,
    fee_settings: &FeeSettings,
) -> Result<RefundPlan, RefundError> {
    // The status check lives here, inside the same locked read as the rest of
    // the plan, so a concurrent or repeated refund cannot credit twice.
    if status.is_cancelled() {
        return Err(RefundError::AlreadyCancelled(receipt_number));
    }

    let mut restock: Vec<(Uuid, i64)> = Vec::new();
    for item in items {
        match restock.iter_mut().find(|(id, _)| *id == item.product_id) {
            Some((_, qty)) => *qty += item.quantity,
            None => restock.push((item.product_id, item.quantity)),
        }
    }

    Ok(RefundPlan {
        restock,
        customer_points_delta: points_redeemed - points_earned,
        fee_tokens: calculate_fee(total_amount, fee_settings),
    })
}
