use anyhow::Result;
use hmac::{Hmac, Mac};
use serde::{Deserialize, Serialize};
use sha2::Sha256;
use subtle::ConstantTimeEq;

pub mod mock;
pub mod razorpay;

#[derive(Debug, Clone)]
pub struct CreateOrderSpec {
    /// Our globally unique order reference (timestamp + payer fragment).
    pub receipt: String,
    pub amount_minor: i64,
    pub currency: String,
}

#[derive(Debug, Clone)]
pub struct GatewayOrder {
    pub order_id: String,
    pub payment_link: String,
}

/// Gateway-reported state of an individual payment attempt. Anything the
/// adapter cannot map stays Pending so the caller retries later.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum GatewayPaymentStatus {
    Captured,
    Failed { reason: String },
    Pending,
}

#[derive(Debug, Clone)]
pub struct TransferSpec {
    pub reference_id: String,
    pub amount_minor: i64,
    pub destination: serde_json::Value,
}

/// A refusal is a business answer from the gateway; transport failures and
/// timeouts surface as Err so local state stays recoverable.
#[derive(Debug, Clone)]
pub enum TransferOutcome {
    Accepted { transfer_id: String },
    Refused { reason: String },
}

#[async_trait::async_trait]
pub trait PaymentGateway: Send + Sync {
    fn name(&self) -> &'static str;

    async fn create_order(&self, spec: &CreateOrderSpec) -> Result<GatewayOrder>;

    async fn get_payment(&self, gateway_payment_id: &str) -> Result<GatewayPaymentStatus>;

    async fn request_transfer(&self, spec: &TransferSpec) -> Result<TransferOutcome>;
}

/// Webhook body shape shared by the adapters: the gateway echoes our order id
/// and reports the payment outcome.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WebhookEvent {
    pub event: String,
    pub order_id: String,
    pub payment_id: Option<String>,
    pub error_reason: Option<String>,
}

type HmacSha256 = Hmac<Sha256>;

/// HMAC-SHA256 over the raw body, hex encoded. Comparison is constant-time.
pub fn verify_webhook_signature(payload: &[u8], signature_hex: &str, secret: &str) -> bool {
    let Ok(mut mac) = HmacSha256::new_from_slice(secret.as_bytes()) else {
        return false;
    };
    mac.update(payload);
    let expected = hex::encode(mac.finalize().into_bytes());
    expected.as_bytes().ct_eq(signature_hex.as_bytes()).into()
}

/// Counterpart used by tests and the mock gateway to produce valid signatures.
pub fn sign_webhook_payload(payload: &[u8], secret: &str) -> String {
    let mut mac = HmacSha256::new_from_slice(secret.as_bytes()).expect("hmac accepts any key length");
    mac.update(payload);
    hex::encode(mac.finalize().into_bytes())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn valid_signature_is_accepted() {
        let body = br#"{"event":"payment.captured","order_id":"ord_1"}"#;
        let sig = sign_webhook_payload(body, "whsec_test");
        assert!(verify_webhook_signature(body, &sig, "whsec_test"));
    }

    #[test]
    fn tampered_body_is_rejected() {
        let sig = sign_webhook_payload(b"original", "whsec_test");
        assert!(!verify_webhook_signature(b"tampered", &sig, "whsec_test"));
    }

    #[test]
    fn wrong_secret_is_rejected() {
        let sig = sign_webhook_payload(b"body", "whsec_a");
        assert!(!verify_webhook_signature(b"body", &sig, "whsec_b"));
    }
}
