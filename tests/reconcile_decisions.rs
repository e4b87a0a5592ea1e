use coursepay::domain::payment::PaymentStatus;
use coursepay::repo::payments_repo::StoredPayment;
use coursepay::service::reconciler::{decide, ReconcileOutcome, ReconcileStep};
use uuid::Uuid;

fn captured() -> ReconcileOutcome {
    ReconcileOutcome::Captured {
        gateway_payment_id: "pay_abc123".to_string(),
    }
}

#[test]
fn duplicate_capture_of_a_paid_payment_is_a_no_op() {
    // Webhook redelivery and a concurrent verify land on an already-paid
    // row: no second ledger entry, no second enrollment, same answer.
    assert_eq!(
        decide(PaymentStatus::Paid, captured()),
        ReconcileStep::AlreadySettled(PaymentStatus::Paid)
    );
}

#[test]
fn first_capture_marks_the_payment_paid() {
    assert_eq!(
        decide(PaymentStatus::Created, captured()),
        ReconcileStep::MarkPaid {
            gateway_payment_id: "pay_abc123".to_string()
        }
    );
}

#[test]
fn failure_report_after_settlement_is_stale_news() {
    let failed = ReconcileOutcome::Failed {
        reason: "card declined".to_string(),
    };
    assert_eq!(
        decide(PaymentStatus::Paid, failed.clone()),
        ReconcileStep::AlreadySettled(PaymentStatus::Paid)
    );
    // Failing twice is also absorbed.
    assert_eq!(
        decide(PaymentStatus::Failed, failed),
        ReconcileStep::AlreadySettled(PaymentStatus::Failed)
    );
}

#[test]
fn pending_never_mutates_the_row() {
    for current in [PaymentStatus::Created, PaymentStatus::Failed, PaymentStatus::Paid] {
        assert_eq!(decide(current, ReconcileOutcome::Pending), ReconcileStep::StillPending);
    }
}

#[test]
fn cancellation_lands_only_on_open_payments() {
    assert_eq!(
        decide(PaymentStatus::Created, ReconcileOutcome::Cancelled),
        ReconcileStep::MarkCancelled
    );
    assert_eq!(
        decide(PaymentStatus::Cancelled, ReconcileOutcome::Cancelled),
        ReconcileStep::AlreadySettled(PaymentStatus::Cancelled)
    );
    // A settled payment cannot be cancelled; refund is the only exit.
    assert_eq!(
        decide(PaymentStatus::Paid, ReconcileOutcome::Cancelled),
        ReconcileStep::Illegal {
            from: PaymentStatus::Paid,
            to: PaymentStatus::Cancelled
        }
    );
}

#[test]
fn refund_requires_a_paid_payment() {
    assert_eq!(decide(PaymentStatus::Paid, ReconcileOutcome::Refunded), ReconcileStep::MarkRefunded);
    assert_eq!(
        decide(PaymentStatus::Refunded, ReconcileOutcome::Refunded),
        ReconcileStep::AlreadySettled(PaymentStatus::Refunded)
    );
    assert_eq!(
        decide(PaymentStatus::Created, ReconcileOutcome::Refunded),
        ReconcileStep::Illegal {
            from: PaymentStatus::Created,
            to: PaymentStatus::Refunded
        }
    );
}

#[test]
fn verification_is_scoped_to_the_owning_student() {
    // Knowing another student's order id must not expose their payment.
    let owner = Uuid::new_v4();
    let stranger = Uuid::new_v4();
    let payment = StoredPayment {
        payment_id: Uuid::new_v4(),
        student_id: owner,
        teacher_id: Uuid::new_v4(),
        course_id: None,
        batch_id: None,
        amount_minor: 5000_00,
        currency: "INR".to_string(),
        status: "CREATED".to_string(),
        commission_rate: 0.40,
        platform_fee_minor: 2000_00,
        teacher_earnings_minor: 3000_00,
        gateway_order_id: "order_xyz789".to_string(),
        gateway_payment_id: None,
        payment_method: "UPI".to_string(),
        failure_reason: None,
        retry_count: 0,
        created_at: chrono::Utc::now(),
        paid_at: None,
    };
    assert!(payment.owned_by(owner));
    assert!(!payment.owned_by(stranger));
}

#[test]
fn capture_cannot_resurrect_a_cancelled_payment() {
    assert_eq!(
        decide(PaymentStatus::Cancelled, captured()),
        ReconcileStep::Illegal {
            from: PaymentStatus::Cancelled,
            to: PaymentStatus::Paid
        }
    );
}
