pub mod checkout;
pub mod fee;
pub mod points;
pub mod refund;
pub mod status;

pub use checkout::{CartLine, CheckoutError, CheckoutPlan, PaymentIntent};
pub use fee::{calculate_fee, FeeSettings};
pub use points::{points_earned, PointSettings};
pub use refund::{RefundError, RefundPlan};
pub use status::{TopUpStatus, TransactionStatus};
