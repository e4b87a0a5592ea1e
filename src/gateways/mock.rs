use crate::gateways::{
    CreateOrderSpec, GatewayOrder, GatewayPaymentStatus, PaymentGateway, TransferOutcome, TransferSpec,
};
use anyhow::{anyhow, Result};

/// Behavior strings: ALWAYS_SUCCESS (default), ALWAYS_FAILURE, ALWAYS_PENDING,
/// ALWAYS_UNREACHABLE, TRANSFER_REFUSED.
pub struct MockGateway {
    pub behavior: String,
}

impl MockGateway {
    pub fn new(behavior: &str) -> Self {
        Self {
            behavior: behavior.to_string(),
        }
    }
}

#[async_trait::async_trait]
impl PaymentGateway for MockGateway {
    fn name(&self) -> &'static str {
        "mock"
    }

    async fn create_order(&self, spec: &CreateOrderSpec) -> Result<GatewayOrder> {
        if self.behavior == "ALWAYS_UNREACHABLE" {
            return Err(anyhow!("mock gateway timeout"));
        }
        Ok(GatewayOrder {
            order_id: format!("order_mock_{}", spec.receipt),
            payment_link: format!("https://mock.test/checkout/{}", spec.receipt),
        })
    }

    async fn get_payment(&self, gateway_payment_id: &str) -> Result<GatewayPaymentStatus> {
        match self.behavior.as_str() {
            "ALWAYS_UNREACHABLE" => Err(anyhow!("mock gateway timeout")),
            "ALWAYS_FAILURE" => Ok(GatewayPaymentStatus::Failed {
                reason: format!("mock decline for {gateway_payment_id}"),
            }),
            "ALWAYS_PENDING" => Ok(GatewayPaymentStatus::Pending),
            _ => Ok(GatewayPaymentStatus::Captured),
        }
    }

    async fn request_transfer(&self, spec: &TransferSpec) -> Result<TransferOutcome> {
        match self.behavior.as_str() {
            "ALWAYS_UNREACHABLE" => Err(anyhow!("mock gateway timeout")),
            "TRANSFER_REFUSED" | "ALWAYS_FAILURE" => Ok(TransferOutcome::Refused {
                reason: "mock transfer refused".to_string(),
            }),
            _ => Ok(TransferOutcome::Accepted {
                transfer_id: format!("mock_txn_{}", spec.reference_id),
            }),
        }
    }
}
