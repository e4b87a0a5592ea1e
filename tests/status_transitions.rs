use coursepay::domain::payment::PaymentStatus;
use coursepay::domain::payout::PayoutStatus;

#[test]
fn payment_created_fans_out_to_three_outcomes() {
    use PaymentStatus::*;
    assert!(PaymentStatus::can_transition(Created, Paid));
    assert!(PaymentStatus::can_transition(Created, Failed));
    assert!(PaymentStatus::can_transition(Created, Cancelled));
    assert!(!PaymentStatus::can_transition(Created, Refunded));
}

#[test]
fn paid_only_moves_to_refunded() {
    use PaymentStatus::*;
    for to in [Created, Failed, Cancelled] {
        assert!(!PaymentStatus::can_transition(Paid, to), "paid must not move to {to:?}");
    }
    assert!(PaymentStatus::can_transition(Paid, Refunded));
}

#[test]
fn payment_never_moves_backwards_from_settlement() {
    use PaymentStatus::*;
    for terminal in [Refunded, Cancelled] {
        for to in [Created, Paid, Failed, Cancelled, Refunded] {
            if terminal == to {
                continue;
            }
            assert!(!PaymentStatus::can_transition(terminal, to));
        }
    }
}

#[test]
fn payout_happy_path_is_requested_processing_completed() {
    use PayoutStatus::*;
    assert!(PayoutStatus::can_transition(Requested, Processing));
    assert!(PayoutStatus::can_transition(Processing, Completed));
    // No shortcut straight to completed.
    assert!(!PayoutStatus::can_transition(Requested, Completed));
}

#[test]
fn payout_rejection_paths() {
    use PayoutStatus::*;
    assert!(PayoutStatus::can_transition(Requested, Rejected));
    assert!(PayoutStatus::can_transition(Processing, Rejected));
    assert!(!PayoutStatus::can_transition(Completed, Rejected));
    assert!(!PayoutStatus::can_transition(Rejected, Requested));
}
