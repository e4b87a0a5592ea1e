use crate::gateways::{
    CreateOrderSpec, GatewayOrder, GatewayPaymentStatus, PaymentGateway, TransferOutcome, TransferSpec,
};
use anyhow::{anyhow, Context, Result};
use serde_json::json;

pub struct RazorpayGateway {
    pub base_url: String,
    pub key_id: String,
    pub key_secret: String,
    pub timeout_ms: u64,
    pub client: reqwest::Client,
}

impl RazorpayGateway {
    fn timeout(&self) -> std::time::Duration {
        std::time::Duration::from_millis(self.timeout_ms)
    }
}

#[async_trait::async_trait]
impl PaymentGateway for RazorpayGateway {
    fn name(&self) -> &'static str {
        "razorpay"
    }

    async fn create_order(&self, spec: &CreateOrderSpec) -> Result<GatewayOrder> {
        let body = json!({
            "amount": spec.amount_minor,
            "currency": spec.currency,
            "receipt": spec.receipt,
            "payment_capture": 1
        });

        let resp = self
            .client
            .post(format!("{}/v1/orders", self.base_url))
            .basic_auth(&self.key_id, Some(&self.key_secret))
            .json(&body)
            .timeout(self.timeout())
            .send()
            .await
            .context("razorpay order creation unreachable")?;

        if !resp.status().is_success() {
            let status = resp.status();
            let text = resp.text().await.unwrap_or_default();
            return Err(anyhow!(
                "razorpay order creation returned {}: {}",
                status,
                text.chars().take(200).collect::<String>()
            ));
        }

        let v: serde_json::Value = resp.json().await.context("razorpay order response body")?;
        let order_id = v
            .get("id")
            .and_then(|id| id.as_str())
            .ok_or_else(|| anyhow!("razorpay order response missing id"))?
            .to_string();

        Ok(GatewayOrder {
            payment_link: format!("{}/v1/checkout?order_id={}", self.base_url, order_id),
            order_id,
        })
    }

    async fn get_payment(&self, gateway_payment_id: &str) -> Result<GatewayPaymentStatus> {
        let resp = self
            .client
            .get(format!("{}/v1/payments/{}", self.base_url, gateway_payment_id))
            .basic_auth(&self.key_id, Some(&self.key_secret))
            .timeout(self.timeout())
            .send()
            .await
            .context("razorpay payment lookup unreachable")?;

        if !resp.status().is_success() {
            return Err(anyhow!("razorpay payment lookup returned {}", resp.status()));
        }

        let v: serde_json::Value = resp.json().await.context("razorpay payment response body")?;
        let status = v.get("status").and_then(|s| s.as_str()).unwrap_or("");
        Ok(match status {
            "captured" => GatewayPaymentStatus::Captured,
            "failed" => GatewayPaymentStatus::Failed {
                reason: v
                    .get("error_description")
                    .and_then(|e| e.as_str())
                    .unwrap_or("payment failed at gateway")
                    .to_string(),
            },
            _ => GatewayPaymentStatus::Pending,
        })
    }

    async fn request_transfer(&self, spec: &TransferSpec) -> Result<TransferOutcome> {
        let body = json!({
            "reference_id": spec.reference_id,
            "amount": spec.amount_minor,
            "currency": "INR",
            "mode": "IMPS",
            "fund_account": spec.destination,
        });

        let resp = self
            .client
            .post(format!("{}/v1/payouts", self.base_url))
            .basic_auth(&self.key_id, Some(&self.key_secret))
            .json(&body)
            .timeout(self.timeout())
            .send()
            .await
            .context("razorpay payout dispatch unreachable")?;

        let status = resp.status();
        let v: serde_json::Value = resp.json().await.unwrap_or_default();
        if status.is_success() {
            let transfer_id = v
                .get("id")
                .and_then(|id| id.as_str())
                .ok_or_else(|| anyhow!("razorpay payout response missing id"))?
                .to_string();
            Ok(TransferOutcome::Accepted { transfer_id })
        } else {
            let reason = v
                .pointer("/error/description")
                .and_then(|d| d.as_str())
                .unwrap_or("payout refused by gateway")
                .to_string();
            Ok(TransferOutcome::Refused { reason })
        }
    }
}
