//! Caller identity extractor
//!
//! Authentication happens upstream; the identity gateway forwards the
//! resolved caller as `X-User-Id` (UUID) and `X-User-Role`. A missing role
//! is treated as a customer.

use axum::extract::FromRequestParts;
use axum::http::request::Parts;
use axum::http::StatusCode;
use axum::Json;
use uuid::Uuid;

use super::{ApiError, ApiResponse};
use crate::domain::{Principal, Role};

pub const USER_ID_HEADER: &str = "x-user-id";
pub const ROLE_HEADER: &str = "x-user-role";

/// The authenticated caller of a request
#[derive(Debug, Clone, Copy)]
pub struct Caller(pub Principal);

impl<S> FromRequestParts<S> for Caller
where
    S: Send + Sync,
{
    type Rejection = ApiError<()>;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        let raw_id = header_value(parts, USER_ID_HEADER)?.ok_or_else(|| {
            (
                StatusCode::UNAUTHORIZED,
                Json(ApiResponse::error("Missing X-User-Id header")),
            )
        })?;
        let user_id = Uuid::parse_str(raw_id).map_err(|_| bad_request("X-User-Id must be a UUID"))?;

        let role = match header_value(parts, ROLE_HEADER)? {
            Some(raw) => raw
                .parse::<Role>()
                .map_err(|e| bad_request(e.to_string()))?,
            None => Role::Customer,
        };

        Ok(Caller(Principal::new(user_id, role)))
    }
}

fn header_value<'a>(parts: &'a Parts, name: &str) -> Result<Option<&'a str>, ApiError<()>> {
    match parts.headers.get(name) {
        None => Ok(None),
        Some(value) => value
            .to_str()
            .map(|v| Some(v.trim()))
            .map_err(|_| bad_request(format!("Header {} is not valid text", name))),
    }
}

fn bad_request(message: impl Into<String>) -> ApiError<()> {
    (StatusCode::BAD_REQUEST, Json(ApiResponse::error(message)))
}
