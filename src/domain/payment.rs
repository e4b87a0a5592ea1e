use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum PaymentStatus {
    Created,
    Paid,
    Failed,
    Cancelled,
    Refunded,
}

impl PaymentStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            PaymentStatus::Created => "CREATED",
            PaymentStatus::Paid => "PAID",
            PaymentStatus::Failed => "FAILED",
            PaymentStatus::Cancelled => "CANCELLED",
            PaymentStatus::Refunded => "REFUNDED",
        }
    }

    pub fn parse(s: &str) -> Option<PaymentStatus> {
        match s {
            "CREATED" => Some(PaymentStatus::Created),
            "PAID" => Some(PaymentStatus::Paid),
            "FAILED" => Some(PaymentStatus::Failed),
            "CANCELLED" => Some(PaymentStatus::Cancelled),
            "REFUNDED" => Some(PaymentStatus::Refunded),
            _ => None,
        }
    }

    /// Paid, Cancelled and Refunded admit no further transition except
    /// Paid -> Refunded. Failed re-admits Created for the bounded retry flow.
    pub fn can_transition(from: PaymentStatus, to: PaymentStatus) -> bool {
        use PaymentStatus::*;
        matches!(
            (from, to),
            (Created, Paid) | (Created, Failed) | (Created, Cancelled) | (Failed, Created) | (Paid, Refunded)
        )
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum PaymentMethod {
    Upi,
    Card,
    Netbanking,
    Emi,
}

impl PaymentMethod {
    pub fn as_str(&self) -> &'static str {
        match self {
            PaymentMethod::Upi => "UPI",
            PaymentMethod::Card => "CARD",
            PaymentMethod::Netbanking => "NETBANKING",
            PaymentMethod::Emi => "EMI",
        }
    }

    pub fn parse(s: &str) -> Option<PaymentMethod> {
        match s {
            "UPI" => Some(PaymentMethod::Upi),
            "CARD" => Some(PaymentMethod::Card),
            "NETBANKING" => Some(PaymentMethod::Netbanking),
            "EMI" => Some(PaymentMethod::Emi),
            _ => None,
        }
    }
}

/// What the student is buying. A course is owned outright; a batch seat is
/// capacity-limited and produces an enrollment row on confirmation.
#[derive(Debug, Clone, Copy, Deserialize, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum TargetRef {
    Course { course_id: Uuid },
    Batch { batch_id: Uuid },
}

#[derive(Debug, Clone, Deserialize)]
pub struct CreateOrderRequest {
    #[serde(flatten)]
    pub target: TargetRef,
    pub payment_method: PaymentMethod,
}

#[derive(Debug, Clone, Serialize)]
pub struct CreateOrderResponse {
    pub payment_id: Uuid,
    pub gateway_order_id: String,
    pub payment_link: String,
    pub amount_minor: i64,
    pub currency: String,
}

#[derive(Debug, Clone, Deserialize)]
pub struct VerifyPaymentRequest {
    pub gateway_order_id: String,
    pub gateway_payment_id: String,
}

#[derive(Debug, Clone, Serialize)]
pub struct PaymentView {
    pub payment_id: Uuid,
    pub amount_minor: i64,
    pub currency: String,
    pub status: PaymentStatus,
    pub payment_method: String,
    pub course_id: Option<Uuid>,
    pub batch_id: Option<Uuid>,
    pub gateway_order_id: String,
    pub failure_reason: Option<String>,
    pub retry_count: i32,
    pub created_at: DateTime<Utc>,
    pub paid_at: Option<DateTime<Utc>>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn terminal_states_admit_no_exit() {
        use PaymentStatus::*;
        for to in [Created, Paid, Failed, Cancelled] {
            assert!(!PaymentStatus::can_transition(Refunded, to));
            assert!(!PaymentStatus::can_transition(Cancelled, to));
        }
        assert!(!PaymentStatus::can_transition(Paid, Created));
        assert!(!PaymentStatus::can_transition(Paid, Failed));
        assert!(PaymentStatus::can_transition(Paid, Refunded));
    }

    #[test]
    fn failed_readmits_created_for_retry() {
        assert!(PaymentStatus::can_transition(PaymentStatus::Failed, PaymentStatus::Created));
        assert!(!PaymentStatus::can_transition(PaymentStatus::Failed, PaymentStatus::Paid));
    }

    #[test]
    fn status_round_trips_through_storage_form() {
        use PaymentStatus::*;
        for s in [Created, Paid, Failed, Cancelled, Refunded] {
            assert_eq!(PaymentStatus::parse(s.as_str()), Some(s));
        }
        assert_eq!(PaymentStatus::parse("SETTLED"), None);
    }
}
