//! Product catalog API routes.

use axum::{Json, extract::State};

use crate::db::products::ProductRepository;
use crate::error::Result;
use crate::models::product::Product;
use crate::state::AppState;

/// List in-stock products, newest first.
///
/// GET /api/products
///
/// Public; depleted products are filtered out rather than shown as
/// unbuyable.
///
/// # Errors
///
/// Returns 500 if the query fails.
pub async fn list(State(state): State<AppState>) -> Result<Json<Vec<Product>>> {
    let products = ProductRepository::new(state.pool()).list_in_stock().await?;
    Ok(Json(products))
}
