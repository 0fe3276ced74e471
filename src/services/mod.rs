pub mod checkout;
pub mod loyalty;
pub mod notification;
pub mod refund;
pub mod settings;
pub mod topup;

pub use checkout::{CheckoutRequest, CheckoutService};
pub use loyalty::LoyaltyService;
pub use notification::{Notifier, WaGateway, WhatsAppClient};
pub use refund::RefundService;
pub use settings::SettingsCache;
pub use topup::TopUpService;
