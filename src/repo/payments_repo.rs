use crate::domain::payment::{PaymentStatus, PaymentView};
use anyhow::Result;
use chrono::{DateTime, Utc};
use sqlx::{PgPool, Postgres, Row, Transaction};
use uuid::Uuid;

pub struct PaymentRecordInput {
    pub payment_id: Uuid,
    pub student_id: Uuid,
    pub teacher_id: Uuid,
    pub course_id: Option<Uuid>,
    pub batch_id: Option<Uuid>,
    pub amount_minor: i64,
    pub currency: String,
    pub commission_rate: f64,
    pub platform_fee_minor: i64,
    pub teacher_earnings_minor: i64,
    pub gateway_order_id: String,
    pub payment_method: String,
    pub emi_schedule: Option<serde_json::Value>,
}

#[derive(Debug, Clone)]
pub struct StoredPayment {
    pub payment_id: Uuid,
    pub student_id: Uuid,
    pub teacher_id: Uuid,
    pub course_id: Option<Uuid>,
    pub batch_id: Option<Uuid>,
    pub amount_minor: i64,
    pub currency: String,
    pub status: String,
    pub commission_rate: f64,
    pub platform_fee_minor: i64,
    pub teacher_earnings_minor: i64,
    pub gateway_order_id: String,
    pub gateway_payment_id: Option<String>,
    pub payment_method: String,
    pub failure_reason: Option<String>,
    pub retry_count: i32,
    pub created_at: DateTime<Utc>,
    pub paid_at: Option<DateTime<Utc>>,
}

const SELECT_COLS: &str = r#"
    payment_id, student_id, teacher_id, course_id, batch_id, amount_minor, currency,
    status, commission_rate, platform_fee_minor, teacher_earnings_minor,
    gateway_order_id, gateway_payment_id, payment_method, failure_reason,
    retry_count, created_at, paid_at
"#;

fn map_row(r: sqlx::postgres::PgRow) -> StoredPayment {
    StoredPayment {
        payment_id: r.get("payment_id"),
        student_id: r.get("student_id"),
        teacher_id: r.get("teacher_id"),
        course_id: r.get("course_id"),
        batch_id: r.get("batch_id"),
        amount_minor: r.get("amount_minor"),
        currency: r.get("currency"),
        status: r.get("status"),
        commission_rate: r.get("commission_rate"),
        platform_fee_minor: r.get("platform_fee_minor"),
        teacher_earnings_minor: r.get("teacher_earnings_minor"),
        gateway_order_id: r.get("gateway_order_id"),
        gateway_payment_id: r.get("gateway_payment_id"),
        payment_method: r.get("payment_method"),
        failure_reason: r.get("failure_reason"),
        retry_count: r.get("retry_count"),
        created_at: r.get("created_at"),
        paid_at: r.get("paid_at"),
    }
}

impl StoredPayment {
    pub fn status_enum(&self) -> Option<PaymentStatus> {
        PaymentStatus::parse(&self.status)
    }

    /// Order ids are guessable enough that lookups must stay scoped to the
    /// owning student.
    pub fn owned_by(&self, user_id: Uuid) -> bool {
        self.student_id == user_id
    }

    pub fn to_view(&self) -> PaymentView {
        PaymentView {
            payment_id: self.payment_id,
            amount_minor: self.amount_minor,
            currency: self.currency.clone(),
            status: self.status_enum().unwrap_or(PaymentStatus::Created),
            payment_method: self.payment_method.clone(),
            course_id: self.course_id,
            batch_id: self.batch_id,
            gateway_order_id: self.gateway_order_id.clone(),
            failure_reason: self.failure_reason.clone(),
            retry_count: self.retry_count,
            created_at: self.created_at,
            paid_at: self.paid_at,
        }
    }
}

#[derive(Clone)]
pub struct PaymentsRepo {
    pub pool: PgPool,
}

impl PaymentsRepo {
    pub async fn insert(&self, data: &PaymentRecordInput) -> Result<()> {
        sqlx::query(
            r#"
            INSERT INTO payments (
                payment_id, student_id, teacher_id, course_id, batch_id, amount_minor, currency,
                status, commission_rate, platform_fee_minor, teacher_earnings_minor,
                gateway_order_id, payment_method, emi_schedule, retry_count
            ) VALUES (
                $1, $2, $3, $4, $5, $6, $7,
                'CREATED', $8, $9, $10,
                $11, $12, $13, 0
            )
            "#,
        )
        .bind(data.payment_id)
        .bind(data.student_id)
        .bind(data.teacher_id)
        .bind(data.course_id)
        .bind(data.batch_id)
        .bind(data.amount_minor)
        .bind(&data.currency)
        .bind(data.commission_rate)
        .bind(data.platform_fee_minor)
        .bind(data.teacher_earnings_minor)
        .bind(&data.gateway_order_id)
        .bind(&data.payment_method)
        .bind(&data.emi_schedule)
        .execute(&self.pool)
        .await?;

        Ok(())
    }

    pub async fn find_by_id(&self, payment_id: Uuid) -> Result<Option<StoredPayment>> {
        let row = sqlx::query(&format!("SELECT {SELECT_COLS} FROM payments WHERE payment_id = $1"))
            .bind(payment_id)
            .fetch_optional(&self.pool)
            .await?;
        Ok(row.map(map_row))
    }

    pub async fn find_by_order_id(&self, gateway_order_id: &str) -> Result<Option<StoredPayment>> {
        let row = sqlx::query(&format!("SELECT {SELECT_COLS} FROM payments WHERE gateway_order_id = $1"))
            .bind(gateway_order_id)
            .fetch_optional(&self.pool)
            .await?;
        Ok(row.map(map_row))
    }

    /// Row-locked lookup used by the reconciler so racing verify/webhook
    /// calls serialize on the payment row.
    pub async fn lock_by_order_id_tx(
        tx: &mut Transaction<'_, Postgres>,
        gateway_order_id: &str,
    ) -> Result<Option<StoredPayment>> {
        let row = sqlx::query(&format!(
            "SELECT {SELECT_COLS} FROM payments WHERE gateway_order_id = $1 FOR UPDATE"
        ))
        .bind(gateway_order_id)
        .fetch_optional(tx.as_mut())
        .await?;
        Ok(row.map(map_row))
    }

    pub async fn mark_paid_tx(
        tx: &mut Transaction<'_, Postgres>,
        payment_id: Uuid,
        gateway_payment_id: &str,
        paid_at: DateTime<Utc>,
    ) -> Result<()> {
        sqlx::query(
            "UPDATE payments SET status='PAID', gateway_payment_id=$2, paid_at=$3 WHERE payment_id=$1",
        )
        .bind(payment_id)
        .bind(gateway_payment_id)
        .bind(paid_at)
        .execute(tx.as_mut())
        .await?;
        Ok(())
    }

    pub async fn mark_failed_tx(
        tx: &mut Transaction<'_, Postgres>,
        payment_id: Uuid,
        reason: &str,
        failed_at: DateTime<Utc>,
    ) -> Result<()> {
        sqlx::query(
            "UPDATE payments SET status='FAILED', failure_reason=$2, failed_at=$3 WHERE payment_id=$1",
        )
        .bind(payment_id)
        .bind(reason)
        .bind(failed_at)
        .execute(tx.as_mut())
        .await?;
        Ok(())
    }

    pub async fn mark_cancelled_tx(
        tx: &mut Transaction<'_, Postgres>,
        payment_id: Uuid,
        cancelled_at: DateTime<Utc>,
    ) -> Result<()> {
        sqlx::query("UPDATE payments SET status='CANCELLED', cancelled_at=$2 WHERE payment_id=$1")
            .bind(payment_id)
            .bind(cancelled_at)
            .execute(tx.as_mut())
            .await?;
        Ok(())
    }

    pub async fn mark_refunded_tx(
        tx: &mut Transaction<'_, Postgres>,
        payment_id: Uuid,
        refunded_at: DateTime<Utc>,
    ) -> Result<()> {
        sqlx::query("UPDATE payments SET status='REFUNDED', refunded_at=$2 WHERE payment_id=$1")
            .bind(payment_id)
            .bind(refunded_at)
            .execute(tx.as_mut())
            .await?;
        Ok(())
    }

    /// Retry flow: fresh gateway order, status back to CREATED, attempt counted.
    pub async fn reset_for_retry(&self, payment_id: Uuid, new_gateway_order_id: &str) -> Result<()> {
        sqlx::query(
            r#"
            UPDATE payments
            SET status='CREATED', gateway_order_id=$2, gateway_payment_id=NULL,
                failure_reason=NULL, failed_at=NULL, retry_count=retry_count+1
            WHERE payment_id=$1
            "#,
        )
        .bind(payment_id)
        .bind(new_gateway_order_id)
        .execute(&self.pool)
        .await?;
        Ok(())
    }

    pub async fn list_by_student(&self, student_id: Uuid) -> Result<Vec<StoredPayment>> {
        let rows = sqlx::query(&format!(
            "SELECT {SELECT_COLS} FROM payments WHERE student_id = $1 ORDER BY created_at DESC"
        ))
        .bind(student_id)
        .fetch_all(&self.pool)
        .await?;
        Ok(rows.into_iter().map(map_row).collect())
    }

    pub async fn has_paid_for_course(&self, student_id: Uuid, course_id: Uuid) -> Result<bool> {
        let row = sqlx::query(
            "SELECT 1 AS one FROM payments WHERE student_id=$1 AND course_id=$2 AND status='PAID' LIMIT 1",
        )
        .bind(student_id)
        .bind(course_id)
        .fetch_optional(&self.pool)
        .await?;
        Ok(row.is_some())
    }
}
