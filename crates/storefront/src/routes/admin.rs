//! Admin API routes.
//!
//! Order management and catalog writes. Every handler here requires a full
//! session token carrying the admin role.

use std::collections::HashMap;

use axum::{
    Json,
    extract::{Path, Query, State},
    http::StatusCode,
};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use tamarind_core::{OrderId, OrderStatus};

use crate::db::orders::StatusStats;
use crate::db::products::ProductRepository;
use crate::error::{AppError, Result};
use crate::middleware::RequireAdmin;
use crate::models::order::Order;
use crate::models::product::Product;
use crate::services::orders::OrderService;
use crate::state::AppState;

/// Optional status filter for the order listing.
#[derive(Debug, Deserialize)]
pub struct OrderListQuery {
    pub status: Option<OrderStatus>,
}

/// Order listing plus per-status dashboard statistics.
#[derive(Debug, Serialize)]
pub struct OrderListResponse {
    pub orders: Vec<Order>,
    pub stats: HashMap<OrderStatus, StatusStats>,
}

/// List all orders with dashboard statistics.
///
/// GET /api/admin/orders?status=pending
///
/// The statistics always cover every status, regardless of the filter.
///
/// # Errors
///
/// Returns 403 without the admin role.
pub async fn list_orders(
    State(state): State<AppState>,
    RequireAdmin(_claims): RequireAdmin,
    Query(query): Query<OrderListQuery>,
) -> Result<Json<OrderListResponse>> {
    let service = OrderService::new(state.pool());

    let orders = service.list_all(query.status).await?;
    let stats = service.stats().await?;

    Ok(Json(OrderListResponse { orders, stats }))
}

/// Request to move an order to a new status.
#[derive(Debug, Deserialize)]
pub struct UpdateOrderRequest {
    pub status: OrderStatus,
    pub cancel_reason: Option<String>,
}

/// Update an order's status.
///
/// PUT /api/admin/orders/{id}
///
/// Cancelling restocks the order's units; reverting a cancelled order to
/// processing re-reserves them and fails with 409 if stock has since been
/// taken.
///
/// # Errors
///
/// Returns 404 on an unknown order, 400 on a forbidden transition.
pub async fn update_order(
    State(state): State<AppState>,
    RequireAdmin(claims): RequireAdmin,
    Path(id): Path<OrderId>,
    Json(req): Json<UpdateOrderRequest>,
) -> Result<Json<Order>> {
    let order = OrderService::new(state.pool())
        .update_status(id, req.status, req.cancel_reason.as_deref())
        .await?;

    tracing::info!(
        order_id = %order.id,
        admin_id = %claims.user_id(),
        status = %order.status,
        "order updated by admin"
    );

    Ok(Json(order))
}

/// Request to add a catalog product.
#[derive(Debug, Deserialize)]
pub struct CreateProductRequest {
    pub name: String,
    pub description: String,
    pub price: Decimal,
    pub stock: i32,
    pub category: String,
    pub image: String,
}

/// Add a product to the catalog.
///
/// POST /api/admin/products
///
/// # Errors
///
/// Returns 400 on a negative price or stock, 403 without the admin role.
pub async fn create_product(
    State(state): State<AppState>,
    RequireAdmin(_claims): RequireAdmin,
    Json(req): Json<CreateProductRequest>,
) -> Result<(StatusCode, Json<Product>)> {
    if req.price < Decimal::ZERO {
        return Err(AppError::BadRequest("price must not be negative".to_string()));
    }
    if req.stock < 0 {
        return Err(AppError::BadRequest("stock must not be negative".to_string()));
    }

    let product = ProductRepository::new(state.pool())
        .create(
            &req.name,
            &req.description,
            req.price,
            req.stock,
            &req.category,
            &req.image,
        )
        .await?;

    Ok((StatusCode::CREATED, Json(product)))
}
