//! Checkout planning.
//!
//! `plan_checkout` is the pure core of the checkout engine: given snapshots
//! of the store, the cart products, and the optional customer as they were
//! re-read inside the database transaction, it either rejects the checkout or
//! produces the complete set of writes to apply. The caller holds row locks
//! on every snapshot for the duration, so the plan can use absolute values.

use bigdecimal::BigDecimal;
use serde::{Deserialize, Serialize};
use std::fmt;
use uuid::Uuid;

use super::fee::{calculate_fee, FeeSettings};
use super::points::{points_earned, PointSettings};
use super::status::TransactionStatus;

/// One cart entry as submitted by the cashier. The unit price is the price
/// quoted at sale time and becomes part of the immutable snapshot; later
/// price changes never affect this transaction or its refund.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CartLine {
    pub product_id: Uuid,
    pub quantity: i64,
    pub price: BigDecimal,
}

/// Line item as persisted in the transaction record.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TransactionItem {
    pub product_id: Uuid,
    pub name: String,
    pub quantity: i64,
    pub price: BigDecimal,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PaymentIntent {
    /// Settled at the counter; the record is final immediately.
    Paid,
    /// Pay-later tab (open bill); settled from the transactions screen.
    Deferred,
}

#[derive(Debug, Clone)]
pub struct StoreSnapshot {
    pub token_balance: BigDecimal,
    pub transaction_counter: i64,
}

#[derive(Debug, Clone)]
pub struct ProductSnapshot {
    pub id: Uuid,
    pub name: String,
    pub stock: i64,
}

#[derive(Debug, Clone)]
pub struct CustomerSnapshot {
    pub id: Uuid,
    pub loyalty_points: i64,
}

/// Everything the checkout transaction writes, computed up front.
#[derive(Debug, Clone)]
pub struct CheckoutPlan {
    pub receipt_number: i64,
    pub items: Vec<TransactionItem>,
    pub total_amount: BigDecimal,
    pub discount: BigDecimal,
    pub fee_tokens: BigDecimal,
    pub points_earned: i64,
    pub points_redeemed: i64,
    /// `(product_id, stock after decrement)` per distinct product.
    pub stock_after: Vec<(Uuid, i64)>,
    /// `earned - redeemed`; only meaningful when a customer is attached.
    pub customer_points_delta: i64,
    pub status: TransactionStatus,
    pub stamp_first_transaction: bool,
}

#[derive(Debug, Clone, PartialEq)]
pub enum CheckoutError {
    EmptyCart,
    InvalidQuantity { product_id: Uuid },
    UnknownProduct(Uuid),
    InsufficientStock { name: String, available: i64, requested: i64 },
    InsufficientBalance { needed: BigDecimal, available: BigDecimal },
    InsufficientPoints { available: i64, requested: i64 },
}

impl fmt::Display for CheckoutError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CheckoutError::EmptyCart => write!(f, "Keranjang belanja masih kosong"),
            CheckoutError::InvalidQuantity { .. } => {
                write!(f, "Jumlah barang di keranjang tidak valid")
            }
            CheckoutError::UnknownProduct(_) => {
                write!(f, "Produk tidak ditemukan di toko ini")
            }
            CheckoutError::InsufficientStock {
                name,
                available,
                requested,
            } => write!(
                f,
                "Stok {} tidak mencukupi (tersisa {}, diminta {})",
                name, available, requested
            ),
            CheckoutError::InsufficientBalance { needed, available } => write!(
                f,
                "Saldo Pradana Token tidak mencukupi (butuh {}, tersisa {})",
                needed, available
            ),
            CheckoutError::InsufficientPoints {
                available,
                requested,
            } => write!(
                f,
                "Poin pelanggan tidak mencukupi (tersisa {}, ditukar {})",
                available, requested
            ),
        }
    }
}

impl std::error::Error for CheckoutError {}

#[allow(clippy::too_many_arguments)]
pub fn plan_checkout(
    store: &StoreSnapshot,
    products: &[ProductSnapshot],
    customer: Option<&CustomerSnapshot>,
    cart: &[CartLine],
    discount: &BigDecimal,
    points_to_redeem: i64,
    fee_settings: &FeeSettings,
    point_settings: Option<&PointSettings>,
    intent: PaymentIntent,
) -> Result<CheckoutPlan, CheckoutError> {
    if cart.is_empty() {
        return Err(CheckoutError::EmptyCart);
    }

    // Merge duplicate lines so the stock check sees cumulative demand.
    let mut items: Vec<TransactionItem> = Vec::new();
    let mut demand: Vec<(Uuid, i64)> = Vec::new();
    for line in cart {
        if line.quantity <= 0 {
            return Err(CheckoutError::InvalidQuantity {
                product_id: line.product_id,
            });
        }
        let product = products
            .iter()
            .find(|p| p.id == line.product_id)
            .ok_or(CheckoutError::UnknownProduct(line.product_id))?;

        match demand.iter_mut().find(|(id, _)| *id == line.product_id) {
            Some((_, qty)) => *qty += line.quantity,
            None => demand.push((line.product_id, line.quantity)),
        }
        items.push(TransactionItem {
            product_id: product.id,
            name: product.name.clone(),
            quantity: line.quantity,
            price: line.price.clone(),
        });
    }

    let subtotal: BigDecimal = cart
        .iter()
        .map(|line| &line.price * BigDecimal::from(line.quantity))
        .sum();
    let mut total_amount = subtotal - discount;
    if total_amount < BigDecimal::from(0) {
        total_amount = BigDecimal::from(0);
    }

    // Balance first, then stock: the cashier hears about an empty token
    // wallet before item-level problems.
    let fee_tokens = calculate_fee(&total_amount, fee_settings);
    if store.token_balance < fee_tokens {
        return Err(CheckoutError::InsufficientBalance {
            needed: fee_tokens,
            available: store.token_balance.clone(),
        });
    }

    let mut stock_after = Vec::with_capacity(demand.len());
    for (product_id, requested) in &demand {
        let product = products
            .iter()
            .find(|p| p.id == *product_id)
            .ok_or(CheckoutError::UnknownProduct(*product_id))?;
        if product.stock < *requested {
            return Err(CheckoutError::InsufficientStock {
                name: product.name.clone(),
                available: product.stock,
                requested: *requested,
            });
        }
        stock_after.push((*product_id, product.stock - requested));
    }

    let earned = match (customer, point_settings) {
        (Some(_), Some(settings)) => points_earned(&total_amount, settings),
        _ => 0,
    };
    let redeemed = match customer {
        Some(c) => {
            if points_to_redeem < 0 {
                return Err(CheckoutError::InsufficientPoints {
                    available: c.loyalty_points,
                    requested: points_to_redeem,
                });
            }
            if c.loyalty_points < points_to_redeem {
                return Err(CheckoutError::InsufficientPoints {
                    available: c.loyalty_points,
                    requested: points_to_redeem,
                });
            }
            points_to_redeem
        }
        None if points_to_redeem > 0 => {
            return Err(CheckoutError::InsufficientPoints {
                available: 0,
                requested: points_to_redeem,
            });
        }
        None => 0,
    };

    Ok(CheckoutPlan {
        receipt_number: store.transaction_counter + 1,
        items,
        total_amount,
        discount: discount.clone(),
        fee_tokens,
        points_earned: earned,
        points_redeemed: redeemed,
        stock_after,
        customer_points_delta: earned - redeemed,
        status: match intent {
            PaymentIntent::Paid => TransactionStatus::SelesaiDibayar,
            PaymentIntent::Deferred => TransactionStatus::BelumDibayar,
        },
        stamp_first_transaction: store.transaction_counter == 0,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn store(balance: i64, counter: i64) -> StoreSnapshot {
        StoreSnapshot {
            token_balance: BigDecimal::from(balance),
            transaction_counter: counter,
        }
    }

    fn product(id: Uuid, name: &str, stock: i64) -> ProductSnapshot {
        ProductSnapshot {
            id,
            name: name.to_string(),
            stock,
        }
    }

    fn line(id: Uuid, qty: i64, price: i64) -> CartLine {
        CartLine {
            product_id: id,
            quantity: qty,
            price: BigDecimal::from(price),
        }
    }

    fn zero() -> BigDecimal {
        BigDecimal::from(0)
    }

    #[test]
    fn worked_example_from_the_fee_schedule() {
        // cart [{price:10000, qty:2}] -> total 20000 -> fee 0.5 token
        let id = Uuid::new_v4();
        let plan = plan_checkout(
            &store(10, 0),
            &[product(id, "Kopi Susu", 5)],
            None,
            &[line(id, 2, 10_000)],
            &zero(),
            0,
            &FeeSettings::default(),
            None,
            PaymentIntent::Paid,
        )
        .unwrap();

        assert_eq!(plan.total_amount, BigDecimal::from(20_000));
        assert_eq!(plan.fee_tokens, "0.5".parse().unwrap());
        assert_eq!(plan.receipt_number, 1);
        assert!(plan.stamp_first_transaction);
        assert_eq!(plan.status, TransactionStatus::SelesaiDibayar);
        assert_eq!(plan.stock_after, vec![(id, 3)]);
    }

    #[test]
    fn stock_decrement_equals_cart_quantities() {
        let a = Uuid::new_v4();
        let b = Uuid::new_v4();
        let products = [product(a, "Teh", 10), product(b, "Roti", 7)];
        let cart = [line(a, 3, 5_000), line(b, 2, 8_000), line(a, 1, 5_000)];

        let plan = plan_checkout(
            &store(100, 4),
            &products,
            None,
            &cart,
            &zero(),
            0,
            &FeeSettings::default(),
            None,
            PaymentIntent::Paid,
        )
        .unwrap();

        let decremented: i64 = products
            .iter()
            .map(|p| {
                let after = plan
                    .stock_after
                    .iter()
                    .find(|(id, _)| *id == p.id)
                    .map(|(_, s)| *s)
                    .unwrap();
                p.stock - after
            })
            .sum();
        let requested: i64 = cart.iter().map(|l| l.quantity).sum();
        assert_eq!(decremented, requested);
        assert_eq!(plan.receipt_number, 5);
        assert!(!plan.stamp_first_transaction);
    }

    #[test]
    fn rejects_insufficient_stock_naming_the_product() {
        let id = Uuid::new_v4();
        let err = plan_checkout(
            &store(100, 0),
            &[product(id, "Es Jeruk", 1)],
            None,
            &[line(id, 2, 6_000)],
            &zero(),
            0,
            &FeeSettings::default(),
            None,
            PaymentIntent::Paid,
        )
        .unwrap_err();

        assert!(matches!(err, CheckoutError::InsufficientStock { .. }));
        assert!(err.to_string().contains("Es Jeruk"));
    }

    #[test]
    fn rejects_insufficient_token_balance() {
        let id = Uuid::new_v4();
        let err = plan_checkout(
            &store(0, 0),
            &[product(id, "Kopi", 5)],
            None,
            &[line(id, 1, 10_000)],
            &zero(),
            0,
            &FeeSettings::default(),
            None,
            PaymentIntent::Paid,
        )
        .unwrap_err();

        assert!(matches!(err, CheckoutError::InsufficientBalance { .. }));
    }

    #[test]
    fn balance_is_checked_before_stock() {
        // Both violated; the balance error wins.
        let id = Uuid::new_v4();
        let err = plan_checkout(
            &store(0, 0),
            &[product(id, "Kopi", 0)],
            None,
            &[line(id, 1, 10_000)],
            &zero(),
            0,
            &FeeSettings::default(),
            None,
            PaymentIntent::Paid,
        )
        .unwrap_err();

        assert!(matches!(err, CheckoutError::InsufficientBalance { .. }));
    }

    #[test]
    fn duplicate_lines_count_cumulatively_against_stock() {
        let id = Uuid::new_v4();
        let err = plan_checkout(
            &store(100, 0),
            &[product(id, "Roti", 3)],
            None,
            &[line(id, 2, 4_000), line(id, 2, 4_000)],
            &zero(),
            0,
            &FeeSettings::default(),
            None,
            PaymentIntent::Paid,
        )
        .unwrap_err();

        assert!(matches!(
            err,
            CheckoutError::InsufficientStock {
                available: 3,
                requested: 4,
                ..
            }
        ));
    }

    #[test]
    fn customer_earns_and_redeems_points() {
        let id = Uuid::new_v4();
        let customer = CustomerSnapshot {
            id: Uuid::new_v4(),
            loyalty_points: 30,
        };
        let plan = plan_checkout(
            &store(100, 9),
            &[product(id, "Nasi Goreng", 10)],
            Some(&customer),
            &[line(id, 2, 25_000)],
            &zero(),
            20,
            &FeeSettings::default(),
            Some(&PointSettings::default()),
            PaymentIntent::Deferred,
        )
        .unwrap();

        // 50_000 / 1_000 = 50 earned, 20 redeemed
        assert_eq!(plan.points_earned, 50);
        assert_eq!(plan.points_redeemed, 20);
        assert_eq!(plan.customer_points_delta, 30);
        assert_eq!(plan.status, TransactionStatus::BelumDibayar);
    }

    #[test]
    fn rejects_redeeming_more_points_than_owned() {
        let id = Uuid::new_v4();
        let customer = CustomerSnapshot {
            id: Uuid::new_v4(),
            loyalty_points: 5,
        };
        let err = plan_checkout(
            &store(100, 0),
            &[product(id, "Kopi", 10)],
            Some(&customer),
            &[line(id, 1, 10_000)],
            &zero(),
            6,
            &FeeSettings::default(),
            Some(&PointSettings::default()),
            PaymentIntent::Paid,
        )
        .unwrap_err();

        assert!(matches!(
            err,
            CheckoutError::InsufficientPoints {
                available: 5,
                requested: 6
            }
        ));
    }

    #[test]
    fn redeeming_without_a_customer_is_rejected() {
        let id = Uuid::new_v4();
        let err = plan_checkout(
            &store(100, 0),
            &[product(id, "Kopi", 10)],
            None,
            &[line(id, 1, 10_000)],
            &zero(),
            5,
            &FeeSettings::default(),
            None,
            PaymentIntent::Paid,
        )
        .unwrap_err();

        assert!(matches!(err, CheckoutError::InsufficientPoints { .. }));
    }

    #[test]
    fn no_points_without_point_settings() {
        let id = Uuid::new_v4();
        let customer = CustomerSnapshot {
            id: Uuid::new_v4(),
            loyalty_points: 0,
        };
        let plan = plan_checkout(
            &store(100, 0),
            &[product(id, "Kopi", 10)],
            Some(&customer),
            &[line(id, 1, 50_000)],
            &zero(),
            0,
            &FeeSettings::default(),
            None,
            PaymentIntent::Paid,
        )
        .unwrap();

        assert_eq!(plan.points_earned, 0);
        assert_eq!(plan.customer_points_delta, 0);
    }

    #[test]
    fn discount_reduces_the_total_but_not_below_zero() {
        let id = Uuid::new_v4();
        let plan = plan_checkout(
            &store(100, 0),
            &[product(id, "Kopi", 10)],
            None,
            &[line(id, 1, 10_000)],
            &BigDecimal::from(15_000),
            0,
            &FeeSettings::default(),
            None,
            PaymentIntent::Paid,
        )
        .unwrap();

        assert_eq!(plan.total_amount, BigDecimal::from(0));
        // Zero total still pays the floor fee.
        assert_eq!(plan.fee_tokens, "0.5".parse().unwrap());
    }

    #[test]
    fn empty_cart_is_rejected() {
        let err = plan_checkout(
            &store(100, 0),
            &[],
            None,
            &[],
            &zero(),
            0,
            &FeeSettings::default(),
            None,
            PaymentIntent::Paid,
        )
        .unwrap_err();
        assert_eq!(err, CheckoutError::EmptyCart);
    }

    #[test]
    fn unknown_product_is_rejected() {
        let err = plan_checkout(
            &store(100, 0),
            &[],
            None,
            &[line(Uuid::new_v4(), 1, 1_000)],
            &zero(),
            0,
            &FeeSettings::default(),
            None,
            PaymentIntent::Paid,
        )
        .unwrap_err();
        assert!(matches!(err, CheckoutError::UnknownProduct(_)));
    }
}
