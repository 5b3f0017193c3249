//! Authentication API routes.
//!
//! JSON endpoints for registration, two-step login, and the two-factor
//! preference. Login is split: the password step yields either a full session
//! token or a short-lived pending token, and the pending token is exchanged
//! for a session via the code endpoints.

use axum::{Json, extract::State, http::StatusCode};
use serde::{Deserialize, Serialize};

use crate::db::users::UserRepository;
use crate::error::{AppError, Result};
use crate::middleware::{RequirePending, RequireUser};
use crate::models::user::PublicUser;
use crate::services::auth::{AuthService, LoginOutcome};
use crate::state::AppState;

fn auth_service(state: &AppState) -> AuthService<'_> {
    AuthService::new(state.pool(), state.tokens(), state.codes())
}

/// Request to create an account.
#[derive(Debug, Deserialize)]
pub struct RegisterRequest {
    pub email: String,
    pub name: String,
    pub password: String,
}

/// A completed login: session token plus the public account view.
#[derive(Debug, Serialize)]
pub struct SessionResponse {
    pub token: String,
    pub user: PublicUser,
}

/// Create a new account.
///
/// POST /api/auth/register
///
/// # Errors
///
/// Returns 400 on invalid input, 409 if the email is taken.
pub async fn register(
    State(state): State<AppState>,
    Json(req): Json<RegisterRequest>,
) -> Result<(StatusCode, Json<SessionResponse>)> {
    let (token, user) = auth_service(&state)
        .register(&req.email, &req.name, &req.password)
        .await?;

    tracing::info!(user_id = %user.id, "account registered");

    Ok((
        StatusCode::CREATED,
        Json(SessionResponse {
            token,
            user: user.public(),
        }),
    ))
}

/// Request for the password step of login.
#[derive(Debug, Deserialize)]
pub struct LoginRequest {
    pub email: String,
    pub password: String,
}

/// Response to the password step.
///
/// Exactly one of `token` (single-step account) or `pending_token`
/// (two-factor account, code still owed) is present.
#[derive(Debug, Serialize)]
pub struct LoginResponse {
    pub two_factor_required: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub token: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub pending_token: Option<String>,
    pub user: PublicUser,
}

/// Password step of login.
///
/// POST /api/auth/login
///
/// # Errors
///
/// Returns 401 on bad credentials; the response does not reveal whether the
/// account exists.
pub async fn login(
    State(state): State<AppState>,
    Json(req): Json<LoginRequest>,
) -> Result<Json<LoginResponse>> {
    let outcome = auth_service(&state).login(&req.email, &req.password).await?;

    let response = match outcome {
        LoginOutcome::Authenticated { token, user } => LoginResponse {
            two_factor_required: false,
            token: Some(token),
            pending_token: None,
            user: user.public(),
        },
        LoginOutcome::TwoFactorRequired {
            pending_token,
            user,
        } => LoginResponse {
            two_factor_required: true,
            token: None,
            pending_token: Some(pending_token),
            user: user.public(),
        },
    };

    Ok(Json(response))
}

/// Acknowledgement that a code was issued.
#[derive(Debug, Serialize)]
pub struct SendCodeResponse {
    pub sent: bool,
    pub email: String,
}

/// Issue (or re-issue) a one-time code against a pending token.
///
/// POST /api/auth/code/send
///
/// # Errors
///
/// Returns 401 if the bearer token is not a live pending token.
pub async fn send_code(
    State(state): State<AppState>,
    RequirePending(claims): RequirePending,
) -> Result<Json<SendCodeResponse>> {
    let email = auth_service(&state).send_code(&claims)?;

    Ok(Json(SendCodeResponse {
        sent: true,
        email: email.as_str().to_owned(),
    }))
}

/// Request to redeem a one-time code.
#[derive(Debug, Deserialize)]
pub struct VerifyCodeRequest {
    pub code: String,
}

/// Redeem a one-time code for a full session token.
///
/// POST /api/auth/code/verify
///
/// # Errors
///
/// Returns 401 if the bearer token is not a live pending token, 400 if the
/// code is absent, expired, or wrong.
pub async fn verify_code(
    State(state): State<AppState>,
    RequirePending(claims): RequirePending,
    Json(req): Json<VerifyCodeRequest>,
) -> Result<Json<SessionResponse>> {
    let (token, user) = auth_service(&state).verify_code(&claims, &req.code).await?;

    tracing::info!(user_id = %user.id, "two-factor login completed");

    Ok(Json(SessionResponse {
        token,
        user: user.public(),
    }))
}

/// Request to change the two-factor preference.
#[derive(Debug, Deserialize)]
pub struct TwoFactorRequest {
    pub enabled: bool,
}

/// Acknowledgement of the new two-factor preference.
#[derive(Debug, Serialize)]
pub struct TwoFactorResponse {
    pub two_factor_enabled: bool,
}

/// Read the calling account's current two-factor preference.
///
/// GET /api/auth/two-factor
///
/// # Errors
///
/// Returns 401 without a full session token or if the account is gone.
pub async fn get_two_factor(
    State(state): State<AppState>,
    RequireUser(claims): RequireUser,
) -> Result<Json<TwoFactorResponse>> {
    let user = UserRepository::new(state.pool())
        .get_by_id(claims.user_id())
        .await?
        .ok_or_else(|| AppError::Unauthorized("account no longer exists".to_string()))?;

    Ok(Json(TwoFactorResponse {
        two_factor_enabled: user.two_factor_enabled,
    }))
}

/// Enable or disable the one-time-code step for the calling account.
///
/// POST /api/auth/two-factor
///
/// Takes effect from the next login; the current session stays valid.
///
/// # Errors
///
/// Returns 401 without a full session token.
pub async fn set_two_factor(
    State(state): State<AppState>,
    RequireUser(claims): RequireUser,
    Json(req): Json<TwoFactorRequest>,
) -> Result<Json<TwoFactorResponse>> {
    auth_service(&state)
        .set_two_factor(claims.user_id(), req.enabled)
        .await?;

    Ok(Json(TwoFactorResponse {
        two_factor_enabled: req.enabled,
    }))
}
