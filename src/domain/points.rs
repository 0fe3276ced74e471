//! Loyalty point accrual.

use bigdecimal::{BigDecimal, ToPrimitive};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct PointSettings {
    /// Rupiah spent per loyalty point earned.
    pub rp_per_point: BigDecimal,
    pub enabled: bool,
}

impl Default for PointSettings {
    fn default() -> Self {
        Self {
            rp_per_point: BigDecimal::from(1000),
            enabled: true,
        }
    }
}

/// Points earned for a transaction total: `floor(total / rp_per_point)`.
/// Disabled or degenerate settings earn nothing.
pub fn points_earned(total_amount: &BigDecimal, settings: &PointSettings) -> i64 {
    if !settings.enabled || settings.rp_per_point <= BigDecimal::from(0) {
        return 0;
    }
    if total_amount <= &BigDecimal::from(0) {
        return 0;
    }

    (total_amount / &settings.rp_per_point).to_i64().unwrap_or(0)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn floors_the_quotient() {
        let s = PointSettings::default();
        assert_eq!(points_earned(&BigDecimal::from(19_999), &s), 19);
        assert_eq!(points_earned(&BigDecimal::from(20_000), &s), 20);
        assert_eq!(points_earned(&BigDecimal::from(999), &s), 0);
    }

    #[test]
    fn disabled_settings_earn_nothing() {
        let s = PointSettings {
            enabled: false,
            ..PointSettings::default()
        };
        assert_eq!(points_earned(&BigDecimal::from(100_000), &s), 0);
    }

    #[test]
    fn degenerate_divisor_earns_nothing() {
        let s = PointSettings {
            rp_per_point: BigDecimal::from(0),
            enabled: true,
        };
        assert_eq!(points_earned(&BigDecimal::from(100_000), &s), 0);
    }

    #[test]
    fn negative_total_earns_nothing() {
        let s = PointSettings::default();
        assert_eq!(points_earned(&BigDecimal::from(-5_000), &s), 0);
    }
}
