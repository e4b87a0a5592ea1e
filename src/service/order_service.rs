use crate::domain::emi;
use crate::domain::payment::{
    CreateOrderRequest, CreateOrderResponse, PaymentMethod, PaymentStatus, PaymentView, TargetRef,
};
use crate::domain::split::{self, AcquisitionSource};
use crate::error::ApiError;
use crate::gateways::{CreateOrderSpec, PaymentGateway};
use crate::repo::catalog_repo::CatalogRepo;
use crate::repo::enrollments_repo::EnrollmentsRepo;
use crate::repo::payments_repo::{PaymentRecordInput, PaymentsRepo};
use serde::Deserialize;
use std::sync::Arc;
use uuid::Uuid;

pub const MAX_PAYMENT_RETRIES: i32 = 3;

/// A validated, priced purchase target.
struct PricedTarget {
    teacher_id: Uuid,
    course_id: Option<Uuid>,
    batch_id: Option<Uuid>,
    amount_minor: i64,
    currency: String,
    source: AcquisitionSource,
}

#[derive(Debug, Clone, Deserialize)]
pub struct EnrollEmiRequest {
    #[serde(flatten)]
    pub target: TargetRef,
    pub plan_id: String,
}

#[derive(Clone)]
pub struct OrderService {
    pub payments_repo: PaymentsRepo,
    pub catalog_repo: CatalogRepo,
    pub enrollments_repo: EnrollmentsRepo,
    pub gateway: Arc<dyn PaymentGateway>,
}

impl OrderService {
    pub async fn create_order(&self, student_id: Uuid, req: CreateOrderRequest) -> Result<CreateOrderResponse, ApiError> {
        let target = self.resolve_target(student_id, req.target).await?;
        self.open_payment(student_id, req.payment_method, &target, target.amount_minor, None)
            .await
    }

    /// EMI enrollment charges only the down payment plus processing fee up
    /// front; the full schedule rides along in payment metadata so a future
    /// recurring-charge worker can pick it up.
    pub async fn enroll_emi(&self, student_id: Uuid, req: EnrollEmiRequest) -> Result<CreateOrderResponse, ApiError> {
        let plan = emi::find_plan(&req.plan_id)
            .ok_or_else(|| ApiError::Validation(format!("unknown EMI plan: {}", req.plan_id)))?;
        let target = self.resolve_target(student_id, req.target).await?;

        let quote = emi::quote(target.amount_minor, plan);
        let schedule = emi::schedule_for(&quote, target.amount_minor);
        let metadata = serde_json::to_value(&schedule).map_err(|e| ApiError::Internal(e.into()))?;

        self.open_payment(
            student_id,
            PaymentMethod::Emi,
            &target,
            quote.initial_charge_minor,
            Some(metadata),
        )
        .await
    }

    /// Gateway order first, local row second: a gateway failure leaves no
    /// orphan Payment behind.
    async fn open_payment(
        &self,
        student_id: Uuid,
        payment_method: PaymentMethod,
        target: &PricedTarget,
        amount_minor: i64,
        emi_schedule: Option<serde_json::Value>,
    ) -> Result<CreateOrderResponse, ApiError> {
        let commission_rate = split::commission_rate_for(target.source);
        let revenue_split = split::split(amount_minor, commission_rate);

        let receipt = order_receipt(student_id);
        let order = self
            .gateway
            .create_order(&CreateOrderSpec {
                receipt,
                amount_minor,
                currency: target.currency.clone(),
            })
            .await
            .map_err(ApiError::Gateway)?;

        let payment_id = Uuid::new_v4();
        self.payments_repo
            .insert(&PaymentRecordInput {
                payment_id,
                student_id,
                teacher_id: target.teacher_id,
                course_id: target.course_id,
                batch_id: target.batch_id,
                amount_minor,
                currency: target.currency.clone(),
                commission_rate,
                platform_fee_minor: revenue_split.platform_fee_minor,
                teacher_earnings_minor: revenue_split.teacher_earnings_minor,
                gateway_order_id: order.order_id.clone(),
                payment_method: payment_method.as_str().to_string(),
                emi_schedule,
            })
            .await?;

        tracing::info!(%payment_id, order_id = %order.order_id, amount_minor, "payment order created");

        Ok(CreateOrderResponse {
            payment_id,
            gateway_order_id: order.order_id,
            payment_link: order.payment_link,
            amount_minor,
            currency: target.currency.clone(),
        })
    }

    /// Caller-initiated retry with a fresh gateway order id, bounded at
    /// MAX_PAYMENT_RETRIES attempts.
    pub async fn retry(&self, student_id: Uuid, payment_id: Uuid) -> Result<CreateOrderResponse, ApiError> {
        let payment = self
            .payments_repo
            .find_by_id(payment_id)
            .await?
            .ok_or_else(|| ApiError::NotFound("payment not found".to_string()))?;

        if !payment.owned_by(student_id) {
            return Err(ApiError::Authorization("payment belongs to another student".to_string()));
        }

        let status = payment
            .status_enum()
            .ok_or_else(|| ApiError::Internal(anyhow::anyhow!("unknown payment status {}", payment.status)))?;
        let retryable = status == PaymentStatus::Created
            || PaymentStatus::can_transition(status, PaymentStatus::Created);
        if !retryable {
            return Err(ApiError::Conflict(format!("payment in status {} cannot be retried", payment.status)));
        }
        if payment.retry_count >= MAX_PAYMENT_RETRIES {
            return Err(ApiError::Conflict("payment retry limit reached".to_string()));
        }

        let order = self
            .gateway
            .create_order(&CreateOrderSpec {
                receipt: order_receipt(student_id),
                amount_minor: payment.amount_minor,
                currency: payment.currency.clone(),
            })
            .await
            .map_err(ApiError::Gateway)?;

        self.payments_repo.reset_for_retry(payment_id, &order.order_id).await?;
        tracing::info!(%payment_id, order_id = %order.order_id, attempt = payment.retry_count + 1, "payment retried");

        Ok(CreateOrderResponse {
            payment_id,
            gateway_order_id: order.order_id,
            payment_link: order.payment_link,
            amount_minor: payment.amount_minor,
            currency: payment.currency,
        })
    }

    pub async fn my_payments(&self, student_id: Uuid) -> Result<Vec<PaymentView>, ApiError> {
        let rows = self.payments_repo.list_by_student(student_id).await?;
        Ok(rows.iter().map(|p| p.to_view()).collect())
    }

    async fn resolve_target(&self, student_id: Uuid, target: TargetRef) -> Result<PricedTarget, ApiError> {
        match target {
            TargetRef::Course { course_id } => {
                let course = self
                    .catalog_repo
                    .find_course(course_id)
                    .await?
                    .ok_or_else(|| ApiError::NotFound("course not found".to_string()))?;
                if !course.is_active {
                    return Err(ApiError::Validation("course is not open for purchase".to_string()));
                }
                if self.payments_repo.has_paid_for_course(student_id, course_id).await? {
                    return Err(ApiError::Validation("course already purchased".to_string()));
                }
                let source = AcquisitionSource::parse(&course.acquisition_source)
                    .unwrap_or(AcquisitionSource::Platform);
                Ok(PricedTarget {
                    teacher_id: course.teacher_id,
                    course_id: Some(course_id),
                    batch_id: None,
                    amount_minor: course.price_minor,
                    currency: course.currency,
                    source,
                })
            }
            TargetRef::Batch { batch_id } => {
                let batch = self
                    .catalog_repo
                    .find_batch(batch_id)
                    .await?
                    .ok_or_else(|| ApiError::NotFound("batch not found".to_string()))?;
                if !batch.is_active {
                    return Err(ApiError::Validation("batch is not open for enrollment".to_string()));
                }
                if self.enrollments_repo.exists(student_id, batch_id).await? {
                    return Err(ApiError::Validation("already enrolled in this batch".to_string()));
                }
                if !batch.has_capacity() {
                    return Err(ApiError::Validation("batch is full".to_string()));
                }
                let source = AcquisitionSource::parse(&batch.acquisition_source)
                    .unwrap_or(AcquisitionSource::Platform);
                Ok(PricedTarget {
                    teacher_id: batch.teacher_id,
                    course_id: Some(batch.course_id),
                    batch_id: Some(batch_id),
                    amount_minor: batch.enrollment_fee_minor,
                    currency: batch.currency,
                    source,
                })
            }
        }
    }
}

/// Millisecond timestamp plus a payer fragment keeps receipts unique across
/// concurrent orders without coordination.
fn order_receipt(student_id: Uuid) -> String {
    let short = student_id.simple().to_string();
    format!("ord_{}_{}", chrono::Utc::now().timestamp_millis(), &short[..8])
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn receipts_embed_timestamp_and_student_fragment() {
        let student = Uuid::new_v4();
        let r = order_receipt(student);
        assert!(r.starts_with("ord_"));
        assert!(r.ends_with(&student.simple().to_string()[..8]));
    }
}
