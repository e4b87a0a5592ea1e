use crate::domain::payout::{PayoutStatus, PayoutView};
use anyhow::Result;
use chrono::{DateTime, Utc};
use sqlx::{PgPool, Postgres, Row, Transaction};
use uuid::Uuid;

#[derive(Debug, Clone)]
pub struct StoredPayout {
    pub payout_id: Uuid,
    pub teacher_id: Uuid,
    pub amount_minor: i64,
    pub status: String,
    pub payment_method: String,
    pub payment_details: serde_json::Value,
    pub gateway_transfer_id: Option<String>,
    pub requested_at: DateTime<Utc>,
    pub processed_at: Option<DateTime<Utc>>,
    pub completed_at: Option<DateTime<Utc>>,
    pub rejected_at: Option<DateTime<Utc>>,
    pub rejection_reason: Option<String>,
}

impl StoredPayout {
    pub fn status_enum(&self) -> Option<PayoutStatus> {
        PayoutStatus::parse(&self.status)
    }

    pub fn to_view(&self) -> PayoutView {
        PayoutView {
            payout_id: self.payout_id,
            amount_minor: self.amount_minor,
            status: self.status_enum().unwrap_or(PayoutStatus::Requested),
            payment_method: self.payment_method.clone(),
            gateway_transfer_id: self.gateway_transfer_id.clone(),
            requested_at: self.requested_at,
            processed_at: self.processed_at,
            completed_at: self.completed_at,
            rejected_at: self.rejected_at,
            rejection_reason: self.rejection_reason.clone(),
        }
    }
}

const SELECT_COLS: &str = r#"
    payout_id, teacher_id, amount_minor, status, payment_method, payment_details,
    gateway_transfer_id, requested_at, processed_at, completed_at, rejected_at, rejection_reason
"#;

fn map_row(r: sqlx::postgres::PgRow) -> StoredPayout {
    StoredPayout {
        payout_id: r.get("payout_id"),
        teacher_id: r.get("teacher_id"),
        amount_minor: r.get("amount_minor"),
        status: r.get("status"),
        payment_method: r.get("payment_method"),
        payment_details: r.get("payment_details"),
        gateway_transfer_id: r.get("gateway_transfer_id"),
        requested_at: r.get("requested_at"),
        processed_at: r.get("processed_at"),
        completed_at: r.get("completed_at"),
        rejected_at: r.get("rejected_at"),
        rejection_reason: r.get("rejection_reason"),
    }
}

#[derive(Clone)]
pub struct PayoutsRepo {
    pub pool: PgPool,
}

impl PayoutsRepo {
    /// Serializes payout requests per teacher for the lifetime of the
    /// enclosing transaction, so two concurrent requests cannot both read
    /// the same balance.
    pub async fn lock_teacher_tx(tx: &mut Transaction<'_, Postgres>, teacher_id: Uuid) -> Result<()> {
        sqlx::query("SELECT pg_advisory_xact_lock(hashtext($1::text))")
            .bind(teacher_id.to_string())
            .execute(tx.as_mut())
            .await?;
        Ok(())
    }

    /// Sum of payouts still counted against the balance (everything except
    /// rejected ones).
    pub async fn held_amount_tx(tx: &mut Transaction<'_, Postgres>, teacher_id: Uuid) -> Result<i64> {
        let row = sqlx::query(
            "SELECT COALESCE(SUM(amount_minor), 0) AS total FROM payouts WHERE teacher_id=$1 AND status <> 'REJECTED'",
        )
        .bind(teacher_id)
        .fetch_one(tx.as_mut())
        .await?;
        Ok(row.get("total"))
    }

    pub async fn sum_by_status(&self, teacher_id: Uuid, statuses: &[&str]) -> Result<i64> {
        let statuses: Vec<String> = statuses.iter().map(|s| s.to_string()).collect();
        let row = sqlx::query(
            "SELECT COALESCE(SUM(amount_minor), 0) AS total FROM payouts WHERE teacher_id=$1 AND status = ANY($2)",
        )
        .bind(teacher_id)
        .bind(&statuses)
        .fetch_one(&self.pool)
        .await?;
        Ok(row.get("total"))
    }

    pub async fn insert_requested_tx(
        tx: &mut Transaction<'_, Postgres>,
        payout_id: Uuid,
        teacher_id: Uuid,
        amount_minor: i64,
        payment_method: &str,
        payment_details: &serde_json::Value,
    ) -> Result<()> {
        sqlx::query(
            r#"
            INSERT INTO payouts (payout_id, teacher_id, amount_minor, status, payment_method, payment_details)
            VALUES ($1, $2, $3, 'REQUESTED', $4, $5)
            "#,
        )
        .bind(payout_id)
        .bind(teacher_id)
        .bind(amount_minor)
        .bind(payment_method)
        .bind(payment_details)
        .execute(tx.as_mut())
        .await?;
        Ok(())
    }

    pub async fn find_by_id(&self, payout_id: Uuid) -> Result<Option<StoredPayout>> {
        let row = sqlx::query(&format!("SELECT {SELECT_COLS} FROM payouts WHERE payout_id = $1"))
            .bind(payout_id)
            .fetch_optional(&self.pool)
            .await?;
        Ok(row.map(map_row))
    }

    /// Every status UPDATE below is guarded on the expected pre-state and
    /// reports whether it matched, so a payout that moved concurrently (an
    /// admin rejecting during a gateway round-trip, two racing admin calls)
    /// is never overwritten from stale state. Zero rows means the caller
    /// lost the race.
    pub async fn set_processing(
        &self,
        payout_id: Uuid,
        gateway_transfer_id: Option<&str>,
        processed_at: DateTime<Utc>,
    ) -> Result<bool> {
        let res = sqlx::query(
            r#"
            UPDATE payouts
            SET status='PROCESSING', gateway_transfer_id=COALESCE($2, gateway_transfer_id), processed_at=$3
            WHERE payout_id=$1 AND status='REQUESTED'
            "#,
        )
        .bind(payout_id)
        .bind(gateway_transfer_id)
        .bind(processed_at)
        .execute(&self.pool)
        .await?;
        Ok(res.rows_affected() == 1)
    }

    pub async fn set_completed(&self, payout_id: Uuid, completed_at: DateTime<Utc>) -> Result<bool> {
        let res = sqlx::query(
            "UPDATE payouts SET status='COMPLETED', completed_at=$2 WHERE payout_id=$1 AND status='PROCESSING'",
        )
        .bind(payout_id)
        .bind(completed_at)
        .execute(&self.pool)
        .await?;
        Ok(res.rows_affected() == 1)
    }

    pub async fn set_rejected(
        &self,
        payout_id: Uuid,
        reason: &str,
        rejected_at: DateTime<Utc>,
        expected_status: &str,
    ) -> Result<bool> {
        let res = sqlx::query(
            r#"
            UPDATE payouts
            SET status='REJECTED', rejection_reason=$2, rejected_at=$3
            WHERE payout_id=$1 AND status=$4
            "#,
        )
        .bind(payout_id)
        .bind(reason)
        .bind(rejected_at)
        .bind(expected_status)
        .execute(&self.pool)
        .await?;
        Ok(res.rows_affected() == 1)
    }

    pub async fn list_by_teacher(&self, teacher_id: Uuid) -> Result<Vec<StoredPayout>> {
        let rows = sqlx::query(&format!(
            "SELECT {SELECT_COLS} FROM payouts WHERE teacher_id = $1 ORDER BY requested_at DESC"
        ))
        .bind(teacher_id)
        .fetch_all(&self.pool)
        .await?;
        Ok(rows.into_iter().map(map_row).collect())
    }
}
