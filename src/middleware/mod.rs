pub mod auth;
pub mod idempotency;
pub mod ip_filter;
