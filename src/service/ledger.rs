use crate::error::ApiError;
use crate::repo::payouts_repo::PayoutsRepo;
use crate::repo::revenue_repo::{MonthlyRevenue, RevenueRepo};
use serde::Serialize;
use uuid::Uuid;

#[derive(Debug, Clone, Serialize)]
pub struct EarningsSummary {
    pub lifetime_earnings_minor: i64,
    pub pending_payouts_minor: i64,
    pub completed_payouts_minor: i64,
    /// Always derived, never stored: confirmed earnings minus everything
    /// requested, in flight or already paid out.
    pub available_balance_minor: i64,
    pub monthly: Vec<MonthlyRevenue>,
}

/// Read-only aggregation over the revenue ledger and payouts. Aggregates
/// across weakly-consistent sources, so any sub-query that fails degrades to
/// a zeroed field instead of failing the whole request.
#[derive(Clone)]
pub struct LedgerQuery {
    pub revenue_repo: RevenueRepo,
    pub payouts_repo: PayoutsRepo,
}

impl LedgerQuery {
    pub async fn earnings_summary(&self, teacher_id: Uuid) -> Result<EarningsSummary, ApiError> {
        let lifetime = self
            .revenue_repo
            .confirmed_teacher_share(teacher_id)
            .await
            .unwrap_or_else(|e| {
                tracing::warn!(%teacher_id, error = %e, "earnings sum unavailable, reporting 0");
                0
            });

        let pending = self
            .payouts_repo
            .sum_by_status(teacher_id, &["REQUESTED", "PROCESSING"])
            .await
            .unwrap_or_else(|e| {
                tracing::warn!(%teacher_id, error = %e, "pending payout sum unavailable, reporting 0");
                0
            });

        let completed = self
            .payouts_repo
            .sum_by_status(teacher_id, &["COMPLETED"])
            .await
            .unwrap_or_else(|e| {
                tracing::warn!(%teacher_id, error = %e, "completed payout sum unavailable, reporting 0");
                0
            });

        let monthly = self
            .revenue_repo
            .monthly_breakdown(teacher_id, 12)
            .await
            .unwrap_or_else(|e| {
                tracing::warn!(%teacher_id, error = %e, "monthly breakdown unavailable");
                Vec::new()
            });

        Ok(EarningsSummary {
            lifetime_earnings_minor: lifetime,
            pending_payouts_minor: pending,
            completed_payouts_minor: completed,
            available_balance_minor: lifetime - pending - completed,
            monthly,
        })
    }
}
