//! Authentication extractors.
//!
//! Route handlers state their access requirement by taking one of these
//! extractors; the bearer token is parsed and verified before the handler
//! body runs.
//!
//! # Example
//!
//! ```rust,ignore
//! async fn protected_handler(
//!     RequireUser(claims): RequireUser,
//! ) -> impl IntoResponse {
//!     format!("Hello, {}!", claims.email)
//! }
//! ```

use axum::{extract::FromRequestParts, http::request::Parts};

use crate::error::AppError;
use crate::services::token::Claims;
use crate::state::AppState;

/// Extractor that requires a full session token.
pub struct RequireUser(pub Claims);

/// Extractor that requires a full session token with the admin role.
pub struct RequireAdmin(pub Claims);

/// Extractor that requires a pending (mid-login) token.
///
/// Only the one-time-code endpoints accept this; a pending token opens no
/// other door, and a full session token is rejected here in turn.
pub struct RequirePending(pub Claims);

fn bearer_token(parts: &Parts) -> Result<&str, AppError> {
    let header = parts
        .headers
        .get(axum::http::header::AUTHORIZATION)
        .and_then(|value| value.to_str().ok())
        .ok_or_else(|| AppError::Unauthorized("missing authorization header".to_string()))?;

    header
        .strip_prefix("Bearer ")
        .map(str::trim)
        .filter(|token| !token.is_empty())
        .ok_or_else(|| AppError::Unauthorized("malformed authorization header".to_string()))
}

impl FromRequestParts<AppState> for RequireUser {
    type Rejection = AppError;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &AppState,
    ) -> Result<Self, Self::Rejection> {
        let token = bearer_token(parts)?;
        let claims = state
            .tokens()
            .require_session(token)
            .map_err(|_| AppError::Unauthorized("invalid or expired token".to_string()))?;

        Ok(Self(claims))
    }
}

impl FromRequestParts<AppState> for RequireAdmin {
    type Rejection = AppError;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &AppState,
    ) -> Result<Self, Self::Rejection> {
        let RequireUser(claims) = RequireUser::from_request_parts(parts, state).await?;

        if !claims.role.is_admin() {
            return Err(AppError::Forbidden("admin access required".to_string()));
        }

        Ok(Self(claims))
    }
}

impl FromRequestParts<AppState> for RequirePending {
    type Rejection = AppError;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &AppState,
    ) -> Result<Self, Self::Rejection> {
        let token = bearer_token(parts)?;
        let claims = state
            .tokens()
            .require_pending(token)
            .map_err(|_| AppError::Unauthorized("invalid or expired token".to_string()))?;

        Ok(Self(claims))
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use axum::http::Request;

    fn parts_with_auth(value: Option<&str>) -> Parts {
        let mut builder = Request::builder().uri("/");
        if let Some(value) = value {
            builder = builder.header(axum::http::header::AUTHORIZATION, value);
        }
        builder.body(()).unwrap().into_parts().0
    }

    #[test]
    fn test_missing_header_rejected() {
        let parts = parts_with_auth(None);
        assert!(bearer_token(&parts).is_err());
    }

    #[test]
    fn test_wrong_scheme_rejected() {
        let parts = parts_with_auth(Some("Basic dXNlcjpwYXNz"));
        assert!(bearer_token(&parts).is_err());
    }

    #[test]
    fn test_empty_bearer_rejected() {
        let parts = parts_with_auth(Some("Bearer "));
        assert!(bearer_token(&parts).is_err());
    }

    #[test]
    fn test_bearer_token_extracted() {
        let parts = parts_with_auth(Some("Bearer abc.def.ghi"));
        assert_eq!(bearer_token(&parts).unwrap(), "abc.def.ghi");
    }
}
