use anyhow::Result;
use chrono::{DateTime, Utc};
use serde::Serialize;
use sqlx::{PgPool, Postgres, Row, Transaction};
use uuid::Uuid;

pub struct RevenueRecordInput {
    pub payment_id: Uuid,
    pub teacher_id: Uuid,
    pub amount_minor: i64,
    pub platform_share_minor: i64,
    pub teacher_share_minor: i64,
    pub commission_rate: f64,
}

#[derive(Debug, Clone, Serialize)]
pub struct MonthlyRevenue {
    pub month: DateTime<Utc>,
    pub teacher_share_minor: i64,
    pub payment_count: i64,
}

#[derive(Clone)]
pub struct RevenueRepo {
    pub pool: PgPool,
}

impl RevenueRepo {
    /// One ledger entry per confirmed payment; the unique payment_id
    /// constraint makes a duplicate confirmation a no-op at the ledger too.
    pub async fn insert_confirmed_tx(tx: &mut Transaction<'_, Postgres>, data: &RevenueRecordInput) -> Result<()> {
        sqlx::query(
            r#"
            INSERT INTO revenue_records (
                record_id, payment_id, teacher_id, amount_minor,
                platform_share_minor, teacher_share_minor, commission_rate, confirmed
            ) VALUES ($1, $2, $3, $4, $5, $6, $7, TRUE)
            ON CONFLICT (payment_id) DO NOTHING
            "#,
        )
        .bind(Uuid::new_v4())
        .bind(data.payment_id)
        .bind(data.teacher_id)
        .bind(data.amount_minor)
        .bind(data.platform_share_minor)
        .bind(data.teacher_share_minor)
        .bind(data.commission_rate)
        .execute(tx.as_mut())
        .await?;
        Ok(())
    }

    /// Refund: the entry stays for audit but stops counting toward balance.
    pub async fn mark_unconfirmed_tx(tx: &mut Transaction<'_, Postgres>, payment_id: Uuid) -> Result<()> {
        sqlx::query("UPDATE revenue_records SET confirmed = FALSE WHERE payment_id = $1")
            .bind(payment_id)
            .execute(tx.as_mut())
            .await?;
        Ok(())
    }

    pub async fn confirmed_teacher_share(&self, teacher_id: Uuid) -> Result<i64> {
        let row = sqlx::query(
            "SELECT COALESCE(SUM(teacher_share_minor), 0) AS total FROM revenue_records WHERE teacher_id=$1 AND confirmed",
        )
        .bind(teacher_id)
        .fetch_one(&self.pool)
        .await?;
        Ok(row.get("total"))
    }

    pub async fn confirmed_teacher_share_tx(tx: &mut Transaction<'_, Postgres>, teacher_id: Uuid) -> Result<i64> {
        let row = sqlx::query(
            "SELECT COALESCE(SUM(teacher_share_minor), 0) AS total FROM revenue_records WHERE teacher_id=$1 AND confirmed",
        )
        .bind(teacher_id)
        .fetch_one(tx.as_mut())
        .await?;
        Ok(row.get("total"))
    }

    pub async fn monthly_breakdown(&self, teacher_id: Uuid, months: i32) -> Result<Vec<MonthlyRevenue>> {
        let rows = sqlx::query(
            r#"
            SELECT date_trunc('month', created_at) AS month,
                   COALESCE(SUM(teacher_share_minor), 0) AS teacher_share_minor,
                   COUNT(*) AS payment_count
            FROM revenue_records
            WHERE teacher_id = $1 AND confirmed
              AND created_at >= date_trunc('month', now()) - ($2 || ' months')::interval
            GROUP BY 1
            ORDER BY 1 DESC
            "#,
        )
        .bind(teacher_id)
        .bind(months.to_string())
        .fetch_all(&self.pool)
        .await?;

        Ok(rows
            .into_iter()
            .map(|r| MonthlyRevenue {
                month: r.get("month"),
                teacher_share_minor: r.get("teacher_share_minor"),
                payment_count: r.get("payment_count"),
            })
            .collect())
    }
}
