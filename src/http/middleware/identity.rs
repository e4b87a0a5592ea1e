use axum::extract::FromRequestParts;
use axum::http::request::Parts;
use axum::http::StatusCode;
use uuid::Uuid;

/// Caller identity as asserted by the upstream auth proxy. Authentication
/// itself is out of scope here; the proxy strips these headers from external
/// traffic and re-injects them after verifying the session.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Role {
    Student,
    Teacher,
    Admin,
}

impl Role {
    fn parse(s: &str) -> Option<Role> {
        match s {
            "student" => Some(Role::Student),
            "teacher" => Some(Role::Teacher),
            "admin" => Some(Role::Admin),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, Copy)]
pub struct Identity {
    pub user_id: Uuid,
    pub role: Role,
}

#[async_trait::async_trait]
impl<S: Send + Sync> FromRequestParts<S> for Identity {
    type Rejection = (StatusCode, &'static str);

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        let user_id = parts
            .headers
            .get("X-User-Id")
            .and_then(|h| h.to_str().ok())
            .and_then(|s| Uuid::parse_str(s).ok())
            .ok_or((StatusCode::FORBIDDEN, "missing or invalid X-User-Id"))?;

        let role = parts
            .headers
            .get("X-User-Role")
            .and_then(|h| h.to_str().ok())
            .and_then(Role::parse)
            .ok_or((StatusCode::FORBIDDEN, "missing or invalid X-User-Role"))?;

        Ok(Identity { user_id, role })
    }
}
