use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde::Serialize;

/// Service-level failure taxonomy. Gateway failures keep their detail in the
/// logs; the HTTP surface only sees a generic message.
#[derive(Debug, thiserror::Error)]
pub enum ApiError {
    #[error("{0}")]
    Validation(String),
    #[error("{0}")]
    NotFound(String),
    #[error("{0}")]
    Authorization(String),
    #[error("{0}")]
    Conflict(String),
    #[error("payment gateway error")]
    Gateway(anyhow::Error),
    #[error("internal error")]
    Internal(anyhow::Error),
}

impl From<anyhow::Error> for ApiError {
    fn from(e: anyhow::Error) -> Self {
        ApiError::Internal(e)
    }
}

impl ApiError {
    pub fn status(&self) -> StatusCode {
        match self {
            ApiError::Validation(_) => StatusCode::BAD_REQUEST,
            ApiError::NotFound(_) => StatusCode::NOT_FOUND,
            ApiError::Authorization(_) => StatusCode::FORBIDDEN,
            ApiError::Conflict(_) => StatusCode::CONFLICT,
            ApiError::Gateway(_) | ApiError::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        match &self {
            ApiError::Gateway(source) => {
                tracing::error!(error = %source, "gateway call failed");
            }
            ApiError::Internal(source) => {
                tracing::error!(error = %source, "internal error");
            }
            _ => {}
        }
        let body = Envelope::<()> {
            success: false,
            message: Some(self.to_string()),
            data: None,
        };
        (self.status(), Json(body)).into_response()
    }
}

impl From<sqlx::Error> for ApiError {
    fn from(e: sqlx::Error) -> Self {
        ApiError::Internal(e.into())
    }
}

/// Uniform response body: `{"success": bool, "message"?, "data"?}`.
#[derive(Debug, Serialize)]
pub struct Envelope<T: Serialize> {
    pub success: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub data: Option<T>,
}

pub fn ok<T: Serialize>(data: T) -> Json<Envelope<T>> {
    Json(Envelope {
        success: true,
        message: None,
        data: Some(data),
    })
}

pub fn ok_message<T: Serialize>(message: &str, data: T) -> Json<Envelope<T>> {
    Json(Envelope {
        success: true,
        message: Some(message.to_string()),
        data: Some(data),
    })
}
