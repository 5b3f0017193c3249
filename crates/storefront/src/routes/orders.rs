//! Order API routes for buyers.

use axum::{Json, extract::State, http::StatusCode};

use crate::db::users::UserRepository;
use crate::error::{AppError, Result};
use crate::middleware::RequireUser;
use crate::models::order::Order;
use crate::services::orders::{CheckoutRequest, OrderService};
use crate::state::AppState;

/// List the calling user's own orders, newest first.
///
/// GET /api/orders
///
/// # Errors
///
/// Returns 401 without a full session token.
pub async fn list(
    State(state): State<AppState>,
    RequireUser(claims): RequireUser,
) -> Result<Json<Vec<Order>>> {
    let orders = OrderService::new(state.pool())
        .list_for_user(claims.user_id())
        .await?;

    Ok(Json(orders))
}

/// Commit a checkout.
///
/// POST /api/orders
///
/// The order is created atomically with its stock reservations; on any
/// depleted line the whole checkout fails and nothing is written.
///
/// # Errors
///
/// Returns 400 on a malformed cart or total mismatch, 404 on an unknown
/// product, 409 when stock cannot cover a line.
pub async fn create(
    State(state): State<AppState>,
    RequireUser(claims): RequireUser,
    Json(req): Json<CheckoutRequest>,
) -> Result<(StatusCode, Json<Order>)> {
    // The order snapshots the buyer's current name and email, so read the
    // account rather than trusting token claims.
    let user = UserRepository::new(state.pool())
        .get_by_id(claims.user_id())
        .await?
        .ok_or_else(|| AppError::Unauthorized("account no longer exists".to_string()))?;

    let order = OrderService::new(state.pool()).checkout(&user, req).await?;

    Ok((StatusCode::CREATED, Json(order)))
}
