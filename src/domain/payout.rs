use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Minimum withdrawal: ₹1000 in minor units.
pub const MIN_PAYOUT_MINOR: i64 = 1000_00;

/// Rejection reasons must carry enough detail for the teacher to act on.
pub const MIN_REJECTION_REASON_LEN: usize = 10;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum PayoutStatus {
    Requested,
    Processing,
    Completed,
    Rejected,
}

impl PayoutStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            PayoutStatus::Requested => "REQUESTED",
            PayoutStatus::Processing => "PROCESSING",
            PayoutStatus::Completed => "COMPLETED",
            PayoutStatus::Rejected => "REJECTED",
        }
    }

    pub fn parse(s: &str) -> Option<PayoutStatus> {
        match s {
            "REQUESTED" => Some(PayoutStatus::Requested),
            "PROCESSING" => Some(PayoutStatus::Processing),
            "COMPLETED" => Some(PayoutStatus::Completed),
            "REJECTED" => Some(PayoutStatus::Rejected),
            _ => None,
        }
    }

    /// Completed and Rejected are immutable. Processing can still fail back
    /// to Rejected when the external transfer errors out.
    pub fn can_transition(from: PayoutStatus, to: PayoutStatus) -> bool {
        use PayoutStatus::*;
        matches!(
            (from, to),
            (Requested, Processing) | (Requested, Rejected) | (Processing, Completed) | (Processing, Rejected)
        )
    }

    /// Statuses whose amounts are held against the teacher's balance.
    /// Rejected payouts release their reservation.
    pub fn holds_balance(&self) -> bool {
        !matches!(self, PayoutStatus::Rejected)
    }
}

/// Outcome of the overdraw guard, computed from sums read under the
/// per-teacher lock.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WithdrawalCheck {
    Allowed,
    BelowMinimum { minimum_minor: i64 },
    ExceedsBalance { available_minor: i64 },
}

/// available = confirmed earnings − payouts still holding balance.
pub fn check_withdrawal(amount_minor: i64, earned_minor: i64, held_minor: i64) -> WithdrawalCheck {
    if amount_minor < MIN_PAYOUT_MINOR {
        return WithdrawalCheck::BelowMinimum {
            minimum_minor: MIN_PAYOUT_MINOR,
        };
    }
    let available_minor = earned_minor - held_minor;
    if amount_minor > available_minor {
        return WithdrawalCheck::ExceedsBalance { available_minor };
    }
    WithdrawalCheck::Allowed
}

/// Where the money goes. Stored as jsonb on the payout row; the bank
/// variant is what gets registered as a gateway beneficiary.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum PayoutDestination {
    BankAccount {
        account_number: String,
        ifsc: String,
        holder_name: String,
    },
    Upi {
        vpa: String,
    },
}

impl PayoutDestination {
    pub fn method_str(&self) -> &'static str {
        match self {
            PayoutDestination::BankAccount { .. } => "BANK_TRANSFER",
            PayoutDestination::Upi { .. } => "UPI",
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct RequestPayoutBody {
    pub amount_minor: i64,
    pub destination: PayoutDestination,
}

#[derive(Debug, Clone, Deserialize)]
pub struct RejectPayoutBody {
    pub reason: String,
}

#[derive(Debug, Clone, Serialize)]
pub struct PayoutView {
    pub payout_id: Uuid,
    pub amount_minor: i64,
    pub status: PayoutStatus,
    pub payment_method: String,
    pub gateway_transfer_id: Option<String>,
    pub requested_at: DateTime<Utc>,
    pub processed_at: Option<DateTime<Utc>>,
    pub completed_at: Option<DateTime<Utc>>,
    pub rejected_at: Option<DateTime<Utc>>,
    pub rejection_reason: Option<String>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn completed_and_rejected_are_immutable() {
        use PayoutStatus::*;
        for to in [Requested, Processing, Completed, Rejected] {
            assert!(!PayoutStatus::can_transition(Completed, to));
            assert!(!PayoutStatus::can_transition(Rejected, to));
        }
    }

    #[test]
    fn processing_can_fail_back_to_rejected() {
        assert!(PayoutStatus::can_transition(PayoutStatus::Processing, PayoutStatus::Rejected));
        assert!(!PayoutStatus::can_transition(PayoutStatus::Requested, PayoutStatus::Completed));
    }

    #[test]
    fn withdrawal_guard_orders_its_checks() {
        // Below-minimum wins even when the balance would cover it.
        assert_eq!(
            check_withdrawal(500_00, 10_000_00, 0),
            WithdrawalCheck::BelowMinimum { minimum_minor: MIN_PAYOUT_MINOR }
        );
        assert_eq!(check_withdrawal(1000_00, 1000_00, 0), WithdrawalCheck::Allowed);
        assert_eq!(
            check_withdrawal(2000_00, 1500_00, 0),
            WithdrawalCheck::ExceedsBalance { available_minor: 1500_00 }
        );
    }

    #[test]
    fn rejected_releases_balance_hold() {
        assert!(!PayoutStatus::Rejected.holds_balance());
        assert!(PayoutStatus::Requested.holds_balance());
        assert!(PayoutStatus::Processing.holds_balance());
        assert!(PayoutStatus::Completed.holds_balance());
    }
}
