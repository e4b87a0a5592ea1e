use anyhow::Result;
use sqlx::{PgPool, Postgres, Transaction};
use uuid::Uuid;

#[derive(Clone)]
pub struct EnrollmentsRepo {
    pub pool: PgPool,
}

impl EnrollmentsRepo {
    /// Idempotent find-or-create keyed on (student_id, batch_id). Returns
    /// whether a new enrollment row was actually written; the seat counter
    /// moves only in that case, so a duplicate webhook cannot double-count.
    pub async fn enroll_tx(
        tx: &mut Transaction<'_, Postgres>,
        student_id: Uuid,
        batch_id: Uuid,
        payment_id: Uuid,
    ) -> Result<bool> {
        let res = sqlx::query(
            r#"
            INSERT INTO enrollments (enrollment_id, student_id, batch_id, payment_id)
            VALUES ($1, $2, $3, $4)
            ON CONFLICT (student_id, batch_id) DO NOTHING
            "#,
        )
        .bind(Uuid::new_v4())
        .bind(student_id)
        .bind(batch_id)
        .bind(payment_id)
        .execute(tx.as_mut())
        .await?;

        let inserted = res.rows_affected() == 1;
        if inserted {
            sqlx::query("UPDATE batches SET seats_taken = seats_taken + 1 WHERE batch_id = $1")
                .bind(batch_id)
                .execute(tx.as_mut())
                .await?;
        }

        Ok(inserted)
    }

    pub async fn exists(&self, student_id: Uuid, batch_id: Uuid) -> Result<bool> {
        let row: Option<(i32,)> =
            sqlx::query_as("SELECT 1 FROM enrollments WHERE student_id=$1 AND batch_id=$2 LIMIT 1")
                .bind(student_id)
                .bind(batch_id)
                .fetch_optional(&self.pool)
                .await?;
        Ok(row.is_some())
    }
}
