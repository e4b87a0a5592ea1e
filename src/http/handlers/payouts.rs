use crate::domain::payout::{RejectPayoutBody, RequestPayoutBody};
use crate::error::{ok, ok_message, ApiError};
use crate::http::middleware::identity::{Identity, Role};
use crate::AppState;
use axum::extract::{Path, State};
use axum::response::IntoResponse;
use axum::Json;
use uuid::Uuid;

pub async fn request_payout(
    State(state): State<AppState>,
    identity: Identity,
    Json(body): Json<RequestPayoutBody>,
) -> Result<impl IntoResponse, ApiError> {
    if identity.role != Role::Teacher {
        return Err(ApiError::Authorization("only teachers can request payouts".to_string()));
    }
    let view = state.payout_service.request_payout(identity.user_id, body).await?;
    Ok(ok_message("payout requested", view))
}

pub async fn approve_payout(
    State(state): State<AppState>,
    identity: Identity,
    Path(payout_id): Path<Uuid>,
) -> Result<impl IntoResponse, ApiError> {
    require_admin(&identity)?;
    let view = state.payout_service.approve(payout_id).await?;
    Ok(ok_message("payout approved", view))
}

pub async fn complete_payout(
    State(state): State<AppState>,
    identity: Identity,
    Path(payout_id): Path<Uuid>,
) -> Result<impl IntoResponse, ApiError> {
    require_admin(&identity)?;
    let view = state.payout_service.complete(payout_id).await?;
    Ok(ok_message("payout completed", view))
}

pub async fn reject_payout(
    State(state): State<AppState>,
    identity: Identity,
    Path(payout_id): Path<Uuid>,
    Json(body): Json<RejectPayoutBody>,
) -> Result<impl IntoResponse, ApiError> {
    require_admin(&identity)?;
    let view = state.payout_service.reject(payout_id, &body.reason).await?;
    Ok(ok_message("payout rejected", view))
}

pub async fn my_payouts(
    State(state): State<AppState>,
    identity: Identity,
) -> Result<impl IntoResponse, ApiError> {
    let payouts = state.payout_service.my_payouts(identity.user_id).await?;
    Ok(ok(payouts))
}

pub async fn earnings_summary(
    State(state): State<AppState>,
    identity: Identity,
) -> Result<impl IntoResponse, ApiError> {
    if identity.role != Role::Teacher && identity.role != Role::Admin {
        return Err(ApiError::Authorization("earnings are visible to teachers only".to_string()));
    }
    let summary = state.ledger.earnings_summary(identity.user_id).await?;
    Ok(ok(summary))
}

fn require_admin(identity: &Identity) -> Result<(), ApiError> {
    if identity.role != Role::Admin {
        return Err(ApiError::Authorization("admin role required".to_string()));
    }
    Ok(())
}
