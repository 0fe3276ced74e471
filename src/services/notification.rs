//! Outbound WhatsApp notifications.
//!
//! Messages go out over a third-party gateway as an HTTP form POST. Sends are
//! fire-and-forget and happen strictly after the business transaction has
//! committed: a gateway outage is logged and counted, never propagated.

use async_trait::async_trait;
use bigdecimal::BigDecimal;
use failsafe::futures::CircuitBreaker as FuturesCircuitBreaker;
use failsafe::{backoff, failure_policy, Config as FailsafeConfig, Error as FailsafeError, StateMachine};
use reqwest::Client;
use serde::Deserialize;
use std::sync::Arc;
use std::time::Duration;
use thiserror::Error;

use crate::config::Config;
use crate::domain::checkout::TransactionItem;

#[derive(Error, Debug)]
pub enum GatewayError {
    #[error("HTTP request failed: {0}")]
    Request(#[from] reqwest::Error),
    #[error("gateway rejected message: {0}")]
    Rejected(String),
    #[error("WhatsApp gateway circuit breaker is open")]
    CircuitOpen,
}

/// Recipient: a direct number or a group id, matching the gateway's
/// `number` / `group` form fields.
#[derive(Debug, Clone)]
pub enum WaTarget {
    Number(String),
    Group(String),
}

#[async_trait]
pub trait WaGateway: Send + Sync {
    async fn send_text(&self, target: &WaTarget, message: &str) -> Result<(), GatewayError>;
}

/// `{status, reason}` response body; `status: false` signals failure.
#[derive(Debug, Deserialize)]
struct GatewayResponse {
    status: bool,
    reason: Option<String>,
}

/// HTTP client for the WhatsApp gateway.
pub struct WhatsAppClient {
    client: Client,
    base_url: String,
    device_id: String,
    circuit_breaker: StateMachine<failure_policy::ConsecutiveFailures<backoff::EqualJittered>, ()>,
}

impl WhatsAppClient {
    pub fn new(base_url: String, device_id: String) -> Self {
        Self::with_circuit_breaker(base_url, device_id, 3, 60)
    }

    pub fn with_circuit_breaker(
        base_url: String,
        device_id: String,
        failure_threshold: u32,
        reset_timeout_secs: u64,
    ) -> Self {
        let client = Client::builder()
            .timeout(Duration::from_secs(15))
            .build()
            .unwrap_or_default();

        let backoff = backoff::equal_jittered(
            Duration::from_secs(reset_timeout_secs),
            Duration::from_secs(reset_timeout_secs * 2),
        );
        let policy = failure_policy::consecutive_failures(failure_threshold, backoff);
        let circuit_breaker = FailsafeConfig::new().failure_policy(policy).build();

        WhatsAppClient {
            client,
            base_url,
            device_id,
            circuit_breaker,
        }
    }

    pub fn circuit_state(&self) -> &'static str {
        if self.circuit_breaker.is_call_permitted() {
            "closed"
        } else {
            "open"
        }
    }
}

#[async_trait]
impl WaGateway for WhatsAppClient {
    async fn send_text(&self, target: &WaTarget, message: &str) -> Result<(), GatewayError> {
        let url = format!("{}/send", self.base_url.trim_end_matches('/'));
        let client = self.client.clone();
        let device_id = self.device_id.clone();
        let message = message.to_string();
        let (field, value) = match target {
            WaTarget::Number(number) => ("number", number.clone()),
            WaTarget::Group(group) => ("group", group.clone()),
        };

        let result = self
            .circuit_breaker
            .call(async move {
                let response = client
                    .post(&url)
                    .form(&[
                        ("device_id", device_id.as_str()),
                        (field, value.as_str()),
                        ("message", message.as_str()),
                    ])
                    .send()
                    .await?
                    .error_for_status()?;

                let body = response.json::<GatewayResponse>().await?;
                if !body.status {
                    return Err(GatewayError::Rejected(
                        body.reason.unwrap_or_else(|| "no reason given".to_string()),
                    ));
                }

                Ok(())
            })
            .await;

        match result {
            Ok(()) => Ok(()),
            Err(FailsafeError::Rejected) => Err(GatewayError::CircuitOpen),
            Err(FailsafeError::Inner(e)) => Err(e),
        }
    }
}

/// Handle the business side holds. `disabled()` (no gateway configured)
/// swallows every send.
#[derive(Clone)]
pub struct Notifier {
    gateway: Option<Arc<dyn WaGateway>>,
}

impl Notifier {
    pub fn new(gateway: Arc<dyn WaGateway>) -> Self {
        Self {
            gateway: Some(gateway),
        }
    }

    pub fn disabled() -> Self {
        Self { gateway: None }
    }

    pub fn from_config(config: &Config) -> Self {
        match (&config.wa_gateway_url, &config.wa_device_id) {
            (Some(url), Some(device_id)) => {
                Self::new(Arc::new(WhatsAppClient::new(url.clone(), device_id.clone())))
            }
            _ => {
                tracing::info!("WhatsApp gateway not configured, notifications disabled");
                Self::disabled()
            }
        }
    }

    /// Queue a message without awaiting the gateway round-trip.
    pub fn send(&self, target: WaTarget, message: String) {
        let Some(gateway) = self.gateway.clone() else {
            return;
        };
        tokio::spawn(async move {
            if let Err(e) = gateway.send_text(&target, &message).await {
                metrics::counter!("pos_notification_failed_total", 1);
                tracing::warn!("WhatsApp notification failed: {}", e);
            }
        });
    }
}

pub fn receipt_message(
    store_name: &str,
    receipt_number: i64,
    items: &[TransactionItem],
    total_amount: &BigDecimal,
) -> String {
    let mut lines = vec![
        format!("*{}*", store_name),
        format!("Struk #{}", receipt_number),
        String::new(),
    ];
    for item in items {
        lines.push(format!("{} x{} @ Rp{}", item.name, item.quantity, item.price));
    }
    lines.push(String::new());
    lines.push(format!("Total: Rp{}", total_amount));
    lines.push("Terima kasih sudah berbelanja!".to_string());
    lines.join("\n")
}

pub fn cancellation_message(store_name: &str, receipt_number: i64) -> String {
    format!(
        "*{}*\nTransaksi #{} telah dibatalkan. Stok dan poin sudah dikembalikan.",
        store_name, receipt_number
    )
}

pub fn topup_message(store_name: &str, tokens: &BigDecimal) -> String {
    format!(
        "*Chika POS*\nTop up untuk {} disetujui. {} Pradana Token sudah masuk ke saldo Anda.",
        store_name, tokens
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use uuid::Uuid;

    #[test]
    fn receipt_message_lists_items_and_total() {
        let items = vec![TransactionItem {
            product_id: Uuid::new_v4(),
            name: "Kopi Susu".into(),
            quantity: 2,
            price: BigDecimal::from(10_000),
        }];
        let message = receipt_message("Warung Bu Sri", 7, &items, &BigDecimal::from(20_000));

        assert!(message.contains("Warung Bu Sri"));
        assert!(message.contains("Struk #7"));
        assert!(message.contains("Kopi Susu x2"));
        assert!(message.contains("Total: Rp20000"));
    }

    #[test]
    fn cancellation_message_names_the_receipt() {
        let message = cancellation_message("Warung Bu Sri", 3);
        assert!(message.contains("#3"));
        assert!(message.contains("dibatalkan"));
    }

    #[test]
    fn client_starts_with_a_closed_circuit() {
        let client = WhatsAppClient::new("https://wa.example.com".to_string(), "dev-1".to_string());
        assert_eq!(client.circuit_state(), "closed");
    }

    #[tokio::test]
    async fn disabled_notifier_ignores_sends() {
        let notifier = Notifier::disabled();
        notifier.send(WaTarget::Number("0812".into()), "halo".into());
    }
}
