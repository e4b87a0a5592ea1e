use crate::domain::payout::{
    check_withdrawal, PayoutStatus, PayoutView, RequestPayoutBody, WithdrawalCheck,
    MIN_REJECTION_REASON_LEN,
};
use crate::error::ApiError;
use crate::gateways::{PaymentGateway, TransferOutcome, TransferSpec};
use crate::repo::outbox_repo::OutboxRepo;
use crate::repo::payouts_repo::{PayoutsRepo, StoredPayout};
use crate::repo::revenue_repo::RevenueRepo;
use serde_json::json;
use sqlx::PgPool;
use std::sync::Arc;
use uuid::Uuid;

#[derive(Clone)]
pub struct PayoutService {
    pub pool: PgPool,
    pub payouts_repo: PayoutsRepo,
    pub revenue_repo: RevenueRepo,
    pub outbox_repo: OutboxRepo,
    pub gateway: Arc<dyn PaymentGateway>,
}

impl PayoutService {
    /// Balance check and insert happen under a per-teacher advisory lock, so
    /// two racing requests can never both pass the overdraw guard. Dispatch
    /// to the gateway happens after commit; a timeout there leaves the
    /// payout in REQUESTED for later reconciliation, never half-committed.
    pub async fn request_payout(&self, teacher_id: Uuid, body: RequestPayoutBody) -> Result<PayoutView, ApiError> {
        let details =
            serde_json::to_value(&body.destination).map_err(|e| ApiError::Internal(e.into()))?;
        let payout_id = Uuid::new_v4();

        let mut tx = self.pool.begin().await.map_err(|e| ApiError::Internal(e.into()))?;
        PayoutsRepo::lock_teacher_tx(&mut tx, teacher_id).await?;

        let earned = RevenueRepo::confirmed_teacher_share_tx(&mut tx, teacher_id).await?;
        let held = PayoutsRepo::held_amount_tx(&mut tx, teacher_id).await?;
        match check_withdrawal(body.amount_minor, earned, held) {
            WithdrawalCheck::Allowed => {}
            WithdrawalCheck::BelowMinimum { minimum_minor } => {
                tx.rollback().await.map_err(|e| ApiError::Internal(e.into()))?;
                return Err(ApiError::Validation(format!(
                    "minimum payout is {minimum_minor} minor units"
                )));
            }
            WithdrawalCheck::ExceedsBalance { available_minor } => {
                tx.rollback().await.map_err(|e| ApiError::Internal(e.into()))?;
                return Err(ApiError::Validation(format!(
                    "requested {} exceeds available balance {}",
                    body.amount_minor, available_minor
                )));
            }
        }

        PayoutsRepo::insert_requested_tx(
            &mut tx,
            payout_id,
            teacher_id,
            body.amount_minor,
            body.destination.method_str(),
            &details,
        )
        .await?;
        tx.commit().await.map_err(|e| ApiError::Internal(e.into()))?;

        tracing::info!(%payout_id, %teacher_id, amount_minor = body.amount_minor, "payout requested");

        self.dispatch_transfer(payout_id, body.amount_minor, teacher_id, &details).await?;

        let payout = self.get_owned(payout_id, teacher_id).await?;
        Ok(payout.to_view())
    }

    async fn dispatch_transfer(
        &self,
        payout_id: Uuid,
        amount_minor: i64,
        teacher_id: Uuid,
        destination: &serde_json::Value,
    ) -> Result<(), ApiError> {
        let spec = TransferSpec {
            reference_id: payout_id.to_string(),
            amount_minor,
            destination: destination.clone(),
        };

        match self.gateway.request_transfer(&spec).await {
            Ok(TransferOutcome::Accepted { transfer_id }) => {
                // The guarded update loses against an admin who settled the
                // payout during the gateway round-trip; the acceptance is
                // then stale and the row must not be resurrected.
                let updated = self
                    .payouts_repo
                    .set_processing(payout_id, Some(&transfer_id), chrono::Utc::now())
                    .await?;
                if updated {
                    tracing::info!(%payout_id, transfer_id, "payout accepted by gateway");
                } else {
                    tracing::error!(%payout_id, transfer_id, "gateway accepted a payout no longer REQUESTED, flagged for manual review");
                }
            }
            Ok(TransferOutcome::Refused { reason }) => {
                let updated = self
                    .payouts_repo
                    .set_rejected(payout_id, &reason, chrono::Utc::now(), "REQUESTED")
                    .await?;
                if updated {
                    self.notify_teacher(payout_id, teacher_id, &format!("Your payout was rejected: {reason}"))
                        .await?;
                    tracing::warn!(%payout_id, reason, "payout refused by gateway");
                } else {
                    tracing::warn!(%payout_id, reason, "gateway refusal for a payout no longer REQUESTED, ignored");
                }
            }
            Err(e) => {
                // Transport failure: stay REQUESTED, resolvable by an admin.
                tracing::error!(%payout_id, error = %e, "payout dispatch failed, left in REQUESTED");
            }
        }

        Ok(())
    }

    pub async fn approve(&self, payout_id: Uuid) -> Result<PayoutView, ApiError> {
        let payout = self.expect_status(payout_id, PayoutStatus::Requested, PayoutStatus::Processing).await?;
        let updated = self.payouts_repo.set_processing(payout_id, None, chrono::Utc::now()).await?;
        if !updated {
            return Err(ApiError::Conflict("payout changed state concurrently".to_string()));
        }
        tracing::info!(%payout_id, "payout approved");
        Ok(StoredPayout {
            status: PayoutStatus::Processing.as_str().to_string(),
            ..payout
        }
        .to_view())
    }

    pub async fn complete(&self, payout_id: Uuid) -> Result<PayoutView, ApiError> {
        let payout = self.expect_status(payout_id, PayoutStatus::Processing, PayoutStatus::Completed).await?;
        let updated = self.payouts_repo.set_completed(payout_id, chrono::Utc::now()).await?;
        if !updated {
            return Err(ApiError::Conflict("payout changed state concurrently".to_string()));
        }
        self.notify_teacher(
            payout_id,
            payout.teacher_id,
            &format!("Your payout of {} has been completed", payout.amount_minor / 100),
        )
        .await?;
        tracing::info!(%payout_id, "payout completed");
        Ok(StoredPayout {
            status: PayoutStatus::Completed.as_str().to_string(),
            ..payout
        }
        .to_view())
    }

    pub async fn reject(&self, payout_id: Uuid, reason: &str) -> Result<PayoutView, ApiError> {
        let reason = reason.trim();
        if reason.len() < MIN_REJECTION_REASON_LEN {
            return Err(ApiError::Validation(format!(
                "rejection reason must be at least {MIN_REJECTION_REASON_LEN} characters"
            )));
        }

        let payout = self.expect_status(payout_id, PayoutStatus::Requested, PayoutStatus::Rejected).await?;
        let updated = self
            .payouts_repo
            .set_rejected(payout_id, reason, chrono::Utc::now(), PayoutStatus::Requested.as_str())
            .await?;
        if !updated {
            return Err(ApiError::Conflict("payout changed state concurrently".to_string()));
        }
        self.notify_teacher(
            payout_id,
            payout.teacher_id,
            &format!("Your payout request was rejected: {reason}"),
        )
        .await?;
        tracing::info!(%payout_id, reason, "payout rejected");
        Ok(StoredPayout {
            status: PayoutStatus::Rejected.as_str().to_string(),
            rejection_reason: Some(reason.to_string()),
            ..payout
        }
        .to_view())
    }

    pub async fn my_payouts(&self, teacher_id: Uuid) -> Result<Vec<PayoutView>, ApiError> {
        let rows = self.payouts_repo.list_by_teacher(teacher_id).await?;
        Ok(rows.iter().map(|p| p.to_view()).collect())
    }

    async fn expect_status(
        &self,
        payout_id: Uuid,
        expected: PayoutStatus,
        to: PayoutStatus,
    ) -> Result<StoredPayout, ApiError> {
        let payout = self
            .payouts_repo
            .find_by_id(payout_id)
            .await?
            .ok_or_else(|| ApiError::NotFound("payout not found".to_string()))?;
        let current = payout
            .status_enum()
            .ok_or_else(|| ApiError::Internal(anyhow::anyhow!("unknown payout status {}", payout.status)))?;

        if current != expected || !PayoutStatus::can_transition(current, to) {
            return Err(ApiError::Conflict(format!(
                "payout is {}, expected {}",
                payout.status,
                expected.as_str()
            )));
        }
        Ok(payout)
    }

    async fn get_owned(&self, payout_id: Uuid, teacher_id: Uuid) -> Result<StoredPayout, ApiError> {
        let payout = self
            .payouts_repo
            .find_by_id(payout_id)
            .await?
            .ok_or_else(|| ApiError::NotFound("payout not found".to_string()))?;
        if payout.teacher_id != teacher_id {
            return Err(ApiError::Authorization("payout belongs to another teacher".to_string()));
        }
        Ok(payout)
    }

    async fn notify_teacher(&self, payout_id: Uuid, teacher_id: Uuid, message: &str) -> Result<(), ApiError> {
        self.outbox_repo
            .insert(
                payout_id,
                "payout.teacher",
                json!({ "user_id": teacher_id, "message": message }),
            )
            .await?;
        Ok(())
    }
}
