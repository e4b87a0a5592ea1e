use anyhow::Result;
use sqlx::{PgPool, Row};
use uuid::Uuid;

#[derive(Debug, Clone)]
pub struct CourseRow {
    pub course_id: Uuid,
    pub teacher_id: Uuid,
    pub title: String,
    pub price_minor: i64,
    pub currency: String,
    pub is_active: bool,
    pub acquisition_source: String,
}

#[derive(Debug, Clone)]
pub struct BatchRow {
    pub batch_id: Uuid,
    pub course_id: Uuid,
    pub teacher_id: Uuid,
    pub name: String,
    pub enrollment_fee_minor: i64,
    pub currency: String,
    pub is_active: bool,
    pub seat_limit: i32,
    pub seats_taken: i32,
    pub acquisition_source: String,
}

impl BatchRow {
    /// seat_limit of 0 means unbounded.
    pub fn has_capacity(&self) -> bool {
        self.seat_limit == 0 || self.seats_taken < self.seat_limit
    }
}

#[derive(Clone)]
pub struct CatalogRepo {
    pub pool: PgPool,
}

impl CatalogRepo {
    pub async fn find_course(&self, course_id: Uuid) -> Result<Option<CourseRow>> {
        let row = sqlx::query(
            r#"
            SELECT course_id, teacher_id, title, price_minor, currency, is_active, acquisition_source
            FROM courses WHERE course_id = $1
            "#,
        )
        .bind(course_id)
        .fetch_optional(&self.pool)
        .await?;

        Ok(row.map(|r| CourseRow {
            course_id: r.get("course_id"),
            teacher_id: r.get("teacher_id"),
            title: r.get("title"),
            price_minor: r.get("price_minor"),
            currency: r.get("currency"),
            is_active: r.get("is_active"),
            acquisition_source: r.get("acquisition_source"),
        }))
    }

    pub async fn find_batch(&self, batch_id: Uuid) -> Result<Option<BatchRow>> {
        let row = sqlx::query(
            r#"
            SELECT batch_id, course_id, teacher_id, name, enrollment_fee_minor, currency,
                   is_active, seat_limit, seats_taken, acquisition_source
            FROM batches WHERE batch_id = $1
            "#,
        )
        .bind(batch_id)
        .fetch_optional(&self.pool)
        .await?;

        Ok(row.map(|r| BatchRow {
            batch_id: r.get("batch_id"),
            course_id: r.get("course_id"),
            teacher_id: r.get("teacher_id"),
            name: r.get("name"),
            enrollment_fee_minor: r.get("enrollment_fee_minor"),
            currency: r.get("currency"),
            is_active: r.get("is_active"),
            seat_limit: r.get("seat_limit"),
            seats_taken: r.get("seats_taken"),
            acquisition_source: r.get("acquisition_source"),
        }))
    }
}
