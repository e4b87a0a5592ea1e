use crate::domain::payment::{PaymentStatus, PaymentView, VerifyPaymentRequest};
use crate::error::ApiError;
use crate::gateways::{self, GatewayPaymentStatus, PaymentGateway, WebhookEvent};
use crate::repo::enrollments_repo::EnrollmentsRepo;
use crate::repo::outbox_repo::OutboxRepo;
use crate::repo::payments_repo::{PaymentsRepo, StoredPayment};
use crate::repo::revenue_repo::{RevenueRecordInput, RevenueRepo};
use serde_json::json;
use sqlx::PgPool;
use std::sync::Arc;
use uuid::Uuid;

/// Authoritative result of a gateway status check or webhook event.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ReconcileOutcome {
    Captured { gateway_payment_id: String },
    Failed { reason: String },
    Cancelled,
    Refunded,
    Pending,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ReconcileResult {
    /// Payment moved to a new state in this call.
    Applied(PaymentStatus),
    /// Already in the requested terminal state; nothing to do.
    AlreadySettled(PaymentStatus),
    /// Gateway still pending; caller should retry later.
    StillPending,
}

/// What `reconcile` should do to the locked row.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ReconcileStep {
    MarkPaid { gateway_payment_id: String },
    MarkFailed { reason: String },
    MarkCancelled,
    MarkRefunded,
    AlreadySettled(PaymentStatus),
    StillPending,
    Illegal { from: PaymentStatus, to: PaymentStatus },
}

/// Pure decision table: current status + gateway outcome → step. Keeps the
/// idempotency rules (a settled payment absorbs repeats, a failure report
/// after settlement is stale news) out of the transaction plumbing.
pub fn decide(current: PaymentStatus, outcome: ReconcileOutcome) -> ReconcileStep {
    match outcome {
        ReconcileOutcome::Pending => ReconcileStep::StillPending,
        ReconcileOutcome::Captured { gateway_payment_id } => {
            if current == PaymentStatus::Paid {
                ReconcileStep::AlreadySettled(PaymentStatus::Paid)
            } else if PaymentStatus::can_transition(current, PaymentStatus::Paid) {
                ReconcileStep::MarkPaid { gateway_payment_id }
            } else {
                ReconcileStep::Illegal { from: current, to: PaymentStatus::Paid }
            }
        }
        ReconcileOutcome::Failed { reason } => {
            if matches!(current, PaymentStatus::Failed | PaymentStatus::Paid) {
                ReconcileStep::AlreadySettled(current)
            } else if PaymentStatus::can_transition(current, PaymentStatus::Failed) {
                ReconcileStep::MarkFailed { reason }
            } else {
                ReconcileStep::Illegal { from: current, to: PaymentStatus::Failed }
            }
        }
        ReconcileOutcome::Cancelled => {
            if current == PaymentStatus::Cancelled {
                ReconcileStep::AlreadySettled(PaymentStatus::Cancelled)
            } else if PaymentStatus::can_transition(current, PaymentStatus::Cancelled) {
                ReconcileStep::MarkCancelled
            } else {
                ReconcileStep::Illegal { from: current, to: PaymentStatus::Cancelled }
            }
        }
        ReconcileOutcome::Refunded => {
            if current == PaymentStatus::Refunded {
                ReconcileStep::AlreadySettled(PaymentStatus::Refunded)
            } else if PaymentStatus::can_transition(current, PaymentStatus::Refunded) {
                ReconcileStep::MarkRefunded
            } else {
                ReconcileStep::Illegal { from: current, to: PaymentStatus::Refunded }
            }
        }
    }
}

#[derive(Clone)]
pub struct PaymentReconciler {
    pub pool: PgPool,
    pub payments_repo: PaymentsRepo,
    pub revenue_repo: RevenueRepo,
    pub enrollments_repo: EnrollmentsRepo,
    pub outbox_repo: OutboxRepo,
    pub gateway: Arc<dyn PaymentGateway>,
    pub webhook_secret: String,
    /// Test-only escape hatch; production wiring always leaves this false.
    pub allow_unverified_webhooks: bool,
}

impl PaymentReconciler {
    /// Client-initiated verification after the checkout redirect. The
    /// gateway's status query is authoritative, never the client's claim.
    /// Only the student who owns the payment may look it up by order id.
    pub async fn verify_payment(
        &self,
        caller_id: Uuid,
        req: VerifyPaymentRequest,
    ) -> Result<PaymentView, ApiError> {
        let payment = self
            .payments_repo
            .find_by_order_id(&req.gateway_order_id)
            .await?
            .ok_or_else(|| ApiError::NotFound("no payment for this order".to_string()))?;

        if !payment.owned_by(caller_id) {
            return Err(ApiError::Authorization("payment belongs to another student".to_string()));
        }

        if payment.status_enum() == Some(PaymentStatus::Paid) {
            return Ok(payment.to_view());
        }

        let status = self
            .gateway
            .get_payment(&req.gateway_payment_id)
            .await
            .map_err(ApiError::Gateway)?;

        let outcome = match status {
            GatewayPaymentStatus::Captured => ReconcileOutcome::Captured {
                gateway_payment_id: req.gateway_payment_id.clone(),
            },
            GatewayPaymentStatus::Failed { reason } => ReconcileOutcome::Failed { reason },
            GatewayPaymentStatus::Pending => ReconcileOutcome::Pending,
        };

        self.reconcile(&req.gateway_order_id, outcome).await?;

        let refreshed = self
            .payments_repo
            .find_by_order_id(&req.gateway_order_id)
            .await?
            .ok_or_else(|| ApiError::NotFound("no payment for this order".to_string()))?;
        Ok(refreshed.to_view())
    }

    /// Gateway-initiated path. Signature verification is mandatory; the
    /// handler always acknowledges so the gateway stops redelivering, and
    /// anything unattributable is logged for manual review.
    pub async fn handle_webhook(&self, body: &[u8], signature: Option<&str>) {
        if !self.allow_unverified_webhooks {
            let Some(signature) = signature else {
                tracing::warn!("webhook without signature header dropped");
                return;
            };
            if !gateways::verify_webhook_signature(body, signature, &self.webhook_secret) {
                tracing::warn!("webhook with invalid signature dropped");
                return;
            }
        }

        let event: WebhookEvent = match serde_json::from_slice(body) {
            Ok(e) => e,
            Err(e) => {
                tracing::warn!(error = %e, "unparseable webhook payload, flagged for review");
                return;
            }
        };

        let outcome = match event.event.as_str() {
            "payment.captured" => match event.payment_id.clone() {
                Some(gateway_payment_id) => ReconcileOutcome::Captured { gateway_payment_id },
                None => {
                    tracing::warn!(order_id = %event.order_id, "captured event missing payment id");
                    return;
                }
            },
            "payment.failed" => ReconcileOutcome::Failed {
                reason: event
                    .error_reason
                    .clone()
                    .unwrap_or_else(|| "payment failed at gateway".to_string()),
            },
            "payment.cancelled" => ReconcileOutcome::Cancelled,
            "refund.processed" => ReconcileOutcome::Refunded,
            other => {
                tracing::debug!(event = other, "ignoring webhook event type");
                return;
            }
        };

        match self.reconcile(&event.order_id, outcome).await {
            Ok(result) => {
                tracing::info!(order_id = %event.order_id, ?result, "webhook reconciled");
            }
            Err(ApiError::NotFound(_)) => {
                // Unknown order: acknowledge anyway, keep a trace for review.
                tracing::warn!(order_id = %event.order_id, "webhook for unknown order, flagged for review");
            }
            Err(e) => {
                tracing::error!(order_id = %event.order_id, error = %e, "webhook reconciliation failed");
            }
        }
    }

    /// The convergence point for both entry points. Locks the payment row,
    /// re-checks terminal state under the lock, and commits the status
    /// change together with its ledger entry, enrollment and notifications.
    pub async fn reconcile(&self, gateway_order_id: &str, outcome: ReconcileOutcome) -> Result<ReconcileResult, ApiError> {
        if matches!(outcome, ReconcileOutcome::Pending) {
            return Ok(ReconcileResult::StillPending);
        }

        let mut tx = self.pool.begin().await.map_err(|e| ApiError::Internal(e.into()))?;

        let payment = PaymentsRepo::lock_by_order_id_tx(&mut tx, gateway_order_id)
            .await?
            .ok_or_else(|| ApiError::NotFound("no payment for this order".to_string()))?;
        let current = payment
            .status_enum()
            .ok_or_else(|| ApiError::Internal(anyhow::anyhow!("unknown payment status {}", payment.status)))?;

        let result = match decide(current, outcome) {
            ReconcileStep::StillPending => {
                tx.rollback().await.map_err(|e| ApiError::Internal(e.into()))?;
                return Ok(ReconcileResult::StillPending);
            }
            ReconcileStep::AlreadySettled(status) => {
                tx.rollback().await.map_err(|e| ApiError::Internal(e.into()))?;
                return Ok(ReconcileResult::AlreadySettled(status));
            }
            ReconcileStep::Illegal { from, to } => {
                tx.rollback().await.map_err(|e| ApiError::Internal(e.into()))?;
                return Err(ApiError::Conflict(format!(
                    "cannot move payment from {} to {}",
                    from.as_str(),
                    to.as_str()
                )));
            }
            ReconcileStep::MarkPaid { gateway_payment_id } => {
                self.apply_captured(&mut tx, &payment, &gateway_payment_id).await?;
                ReconcileResult::Applied(PaymentStatus::Paid)
            }
            ReconcileStep::MarkFailed { reason } => {
                PaymentsRepo::mark_failed_tx(&mut tx, payment.payment_id, &reason, chrono::Utc::now()).await?;
                OutboxRepo::insert_tx(
                    &mut tx,
                    payment.payment_id,
                    "payment.failed.student",
                    json!({
                        "user_id": payment.student_id,
                        "message": format!("Your payment of {} {} could not be completed: {}", payment.currency, payment.amount_minor / 100, reason),
                    }),
                )
                .await?;
                ReconcileResult::Applied(PaymentStatus::Failed)
            }
            ReconcileStep::MarkCancelled => {
                PaymentsRepo::mark_cancelled_tx(&mut tx, payment.payment_id, chrono::Utc::now()).await?;
                OutboxRepo::insert_tx(
                    &mut tx,
                    payment.payment_id,
                    "payment.cancelled.student",
                    json!({
                        "user_id": payment.student_id,
                        "message": format!("Your payment of {} {} was cancelled", payment.currency, payment.amount_minor / 100),
                    }),
                )
                .await?;
                ReconcileResult::Applied(PaymentStatus::Cancelled)
            }
            ReconcileStep::MarkRefunded => {
                PaymentsRepo::mark_refunded_tx(&mut tx, payment.payment_id, chrono::Utc::now()).await?;
                RevenueRepo::mark_unconfirmed_tx(&mut tx, payment.payment_id).await?;
                OutboxRepo::insert_tx(
                    &mut tx,
                    payment.payment_id,
                    "payment.refunded.student",
                    json!({
                        "user_id": payment.student_id,
                        "message": format!("Your payment of {} {} has been refunded", payment.currency, payment.amount_minor / 100),
                    }),
                )
                .await?;
                ReconcileResult::Applied(PaymentStatus::Refunded)
            }
        };

        tx.commit().await.map_err(|e| ApiError::Internal(e.into()))?;
        Ok(result)
    }

    async fn apply_captured(
        &self,
        tx: &mut sqlx::Transaction<'_, sqlx::Postgres>,
        payment: &StoredPayment,
        gateway_payment_id: &str,
    ) -> Result<(), ApiError> {
        PaymentsRepo::mark_paid_tx(tx, payment.payment_id, gateway_payment_id, chrono::Utc::now()).await?;

        RevenueRepo::insert_confirmed_tx(
            tx,
            &RevenueRecordInput {
                payment_id: payment.payment_id,
                teacher_id: payment.teacher_id,
                amount_minor: payment.amount_minor,
                platform_share_minor: payment.platform_fee_minor,
                teacher_share_minor: payment.teacher_earnings_minor,
                commission_rate: payment.commission_rate,
            },
        )
        .await?;

        if let Some(batch_id) = payment.batch_id {
            let newly_enrolled =
                EnrollmentsRepo::enroll_tx(tx, payment.student_id, batch_id, payment.payment_id).await?;
            if !newly_enrolled {
                tracing::info!(payment_id = %payment.payment_id, %batch_id, "enrollment already present, skipped");
            }
        }

        OutboxRepo::insert_tx(
            tx,
            payment.payment_id,
            "payment.paid.student",
            json!({
                "user_id": payment.student_id,
                "message": format!("Payment of {} {} confirmed. You're enrolled!", payment.currency, payment.amount_minor / 100),
            }),
        )
        .await?;
        OutboxRepo::insert_tx(
            tx,
            payment.payment_id,
            "payment.paid.teacher",
            json!({
                "user_id": payment.teacher_id,
                "message": format!("You earned {} {} from a new enrollment", payment.currency, payment.teacher_earnings_minor / 100),
            }),
        )
        .await?;

        Ok(())
    }
}
