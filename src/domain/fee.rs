//! Transaction fee schedule.
//!
//! Every paid checkout costs the store a fee in Pradana Token, derived from
//! the transaction total: a percentage of the total, clamped to a floor and a
//! cap in Rupiah, then converted to tokens at `token_value_rp` per token.

use bigdecimal::BigDecimal;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct FeeSettings {
    pub fee_percentage: BigDecimal,
    pub min_fee_rp: BigDecimal,
    pub max_fee_rp: BigDecimal,
    pub token_value_rp: BigDecimal,
}

impl Default for FeeSettings {
    fn default() -> Self {
        Self {
            fee_percentage: "0.005".parse().unwrap(),
            min_fee_rp: BigDecimal::from(500),
            max_fee_rp: BigDecimal::from(2500),
            token_value_rp: BigDecimal::from(1000),
        }
    }
}

/// Token fee for a transaction total.
///
/// `clamp(total * fee_percentage, min_fee_rp, max_fee_rp) / token_value_rp`.
/// Has no failure mode: a non-positive `token_value_rp` yields 0 tokens, and
/// a floor above the cap resolves in favor of the floor.
pub fn calculate_fee(total_amount: &BigDecimal, settings: &FeeSettings) -> BigDecimal {
    let zero = BigDecimal::from(0);
    if settings.token_value_rp <= zero {
        return zero;
    }

    let mut fee_rp = total_amount * &settings.fee_percentage;
    if fee_rp < settings.min_fee_rp {
        fee_rp = settings.min_fee_rp.clone();
    } else if settings.max_fee_rp >= settings.min_fee_rp && fee_rp > settings.max_fee_rp {
        fee_rp = settings.max_fee_rp.clone();
    }

    fee_rp / &settings.token_value_rp
}
