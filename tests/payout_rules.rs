use coursepay::domain::payout::{
    check_withdrawal, PayoutDestination, PayoutStatus, WithdrawalCheck, MIN_PAYOUT_MINOR,
    MIN_REJECTION_REASON_LEN,
};

#[test]
fn minimum_payout_is_one_thousand_rupees() {
    assert_eq!(MIN_PAYOUT_MINOR, 1000_00);
}

#[test]
fn withdrawal_above_available_balance_is_refused() {
    // ₹2000 requested against ₹1500 of confirmed, unheld earnings.
    assert_eq!(
        check_withdrawal(2000_00, 1500_00, 0),
        WithdrawalCheck::ExceedsBalance { available_minor: 1500_00 }
    );
    assert_eq!(check_withdrawal(1500_00, 1500_00, 0), WithdrawalCheck::Allowed);
}

#[test]
fn held_payouts_shrink_the_available_balance() {
    // ₹5000 earned, ₹4000 already requested or processing: only ₹1000 left.
    assert_eq!(check_withdrawal(1000_00, 5000_00, 4000_00), WithdrawalCheck::Allowed);
    assert_eq!(
        check_withdrawal(1001_00, 5000_00, 4000_00),
        WithdrawalCheck::ExceedsBalance { available_minor: 1000_00 }
    );
}

#[test]
fn late_gateway_acceptance_cannot_overwrite_a_rejection() {
    // An admin can reject while the transfer dispatch is still in flight at
    // the gateway; the acceptance that comes back is stale and must not put
    // the payout into processing. The status UPDATEs guard on the expected
    // pre-state for exactly this reason.
    assert!(!PayoutStatus::can_transition(PayoutStatus::Rejected, PayoutStatus::Processing));
    assert!(!PayoutStatus::Rejected.holds_balance());
}

#[test]
fn insufficient_documentation_is_a_valid_reason() {
    assert!("insufficient documentation".len() >= MIN_REJECTION_REASON_LEN);
    assert!("too short".len() < MIN_REJECTION_REASON_LEN);
}

#[test]
fn balance_hold_covers_every_live_status() {
    // available = earnings − Σ(requested + processing + completed); only a
    // rejection releases the hold.
    let holding: Vec<PayoutStatus> = [
        PayoutStatus::Requested,
        PayoutStatus::Processing,
        PayoutStatus::Completed,
        PayoutStatus::Rejected,
    ]
    .into_iter()
    .filter(|s| s.holds_balance())
    .collect();
    assert_eq!(
        holding,
        vec![PayoutStatus::Requested, PayoutStatus::Processing, PayoutStatus::Completed]
    );
}

#[test]
fn destination_serializes_with_type_tag() {
    let bank = PayoutDestination::BankAccount {
        account_number: "000111222333".to_string(),
        ifsc: "HDFC0001234".to_string(),
        holder_name: "A Teacher".to_string(),
    };
    let v = serde_json::to_value(&bank).unwrap();
    assert_eq!(v["type"], "bank_account");
    assert_eq!(bank.method_str(), "BANK_TRANSFER");

    let upi = PayoutDestination::Upi {
        vpa: "teacher@bank".to_string(),
    };
    assert_eq!(serde_json::to_value(&upi).unwrap()["type"], "upi");
    assert_eq!(upi.method_str(), "UPI");
}

#[test]
fn destination_round_trips_through_storage_json() {
    let original = PayoutDestination::BankAccount {
        account_number: "000111222333".to_string(),
        ifsc: "HDFC0001234".to_string(),
        holder_name: "A Teacher".to_string(),
    };
    let v = serde_json::to_value(&original).unwrap();
    let back: PayoutDestination = serde_json::from_value(v).unwrap();
    assert!(matches!(back, PayoutDestination::BankAccount { ref ifsc, .. } if ifsc == "HDFC0001234"));
}
