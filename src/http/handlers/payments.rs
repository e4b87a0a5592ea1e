use crate::domain::emi;
use crate::domain::payment::{CreateOrderRequest, VerifyPaymentRequest};
use crate::error::{ok, ok_message, ApiError};
use crate::http::middleware::identity::{Identity, Role};
use crate::service::order_service::EnrollEmiRequest;
use crate::AppState;
use axum::body::Bytes;
use axum::extract::{Path, Query, State};
use axum::http::HeaderMap;
use axum::response::IntoResponse;
use axum::Json;
use serde::Deserialize;
use uuid::Uuid;

pub async fn create_order(
    State(state): State<AppState>,
    identity: Identity,
    Json(req): Json<CreateOrderRequest>,
) -> Result<impl IntoResponse, ApiError> {
    if identity.role != Role::Student {
        return Err(ApiError::Authorization("only students can purchase".to_string()));
    }
    let resp = state.order_service.create_order(identity.user_id, req).await?;
    Ok(ok_message("order created", resp))
}

pub async fn verify_payment(
    State(state): State<AppState>,
    identity: Identity,
    Json(req): Json<VerifyPaymentRequest>,
) -> Result<impl IntoResponse, ApiError> {
    let view = state.reconciler.verify_payment(identity.user_id, req).await?;
    Ok(ok(view))
}

/// Public endpoint. Signature is checked inside the reconciler and the
/// response is always 200 so the gateway stops redelivering.
pub async fn webhook(State(state): State<AppState>, headers: HeaderMap, body: Bytes) -> impl IntoResponse {
    let signature = headers.get("X-Webhook-Signature").and_then(|h| h.to_str().ok());
    state.reconciler.handle_webhook(&body, signature).await;
    ok(serde_json::json!({"received": true}))
}

pub async fn my_payments(
    State(state): State<AppState>,
    identity: Identity,
) -> Result<impl IntoResponse, ApiError> {
    let payments = state.order_service.my_payments(identity.user_id).await?;
    Ok(ok(payments))
}

pub async fn retry_payment(
    State(state): State<AppState>,
    identity: Identity,
    Path(payment_id): Path<Uuid>,
) -> Result<impl IntoResponse, ApiError> {
    let resp = state.order_service.retry(identity.user_id, payment_id).await?;
    Ok(ok_message("retry order created", resp))
}

#[derive(Debug, Deserialize)]
pub struct EmiPlansQuery {
    pub amount_minor: i64,
}

pub async fn emi_plans(Query(q): Query<EmiPlansQuery>) -> Result<impl IntoResponse, ApiError> {
    if q.amount_minor <= 0 {
        return Err(ApiError::Validation("amount_minor must be > 0".to_string()));
    }
    Ok(ok(emi::quote_all(q.amount_minor)))
}

pub async fn enroll_emi(
    State(state): State<AppState>,
    identity: Identity,
    Json(req): Json<EnrollEmiRequest>,
) -> Result<impl IntoResponse, ApiError> {
    if identity.role != Role::Student {
        return Err(ApiError::Authorization("only students can purchase".to_string()));
    }
    let resp = state.order_service.enroll_emi(identity.user_id, req).await?;
    Ok(ok_message("EMI enrollment created", resp))
}

pub async fn health() -> impl IntoResponse {
    (axum::http::StatusCode::OK, "ok")
}
