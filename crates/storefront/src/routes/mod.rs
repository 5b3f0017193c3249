//! HTTP route handlers for the storefront API.
//!
//! # Route Structure
//!
//! ```text
//! GET  /health                  - Liveness check
//! GET  /health/ready            - Readiness check (database ping)
//!
//! # Auth
//! POST /api/auth/register       - Create account, returns session token
//! POST /api/auth/login          - Password step, returns session or pending token
//! POST /api/auth/code/send      - Issue one-time code (pending token)
//! POST /api/auth/code/verify    - Redeem code for session token (pending token)
//! GET  /api/auth/two-factor     - Current two-factor preference (session token)
//! POST /api/auth/two-factor     - Toggle the code step (session token)
//!
//! # Catalog
//! GET  /api/products            - In-stock product listing (public)
//!
//! # Orders
//! GET  /api/orders              - Own order history (session token)
//! POST /api/orders              - Checkout (session token)
//!
//! # Admin (admin session token)
//! GET  /api/admin/orders        - All orders plus dashboard stats
//! PUT  /api/admin/orders/{id}   - Change order status
//! POST /api/admin/products      - Add catalog product
//! ```

pub mod admin;
pub mod auth;
pub mod orders;
pub mod products;

use axum::{
    Router,
    routing::{get, post, put},
};

use crate::state::AppState;

/// Create the auth routes router.
pub fn auth_routes() -> Router<AppState> {
    Router::new()
        .route("/register", post(auth::register))
        .route("/login", post(auth::login))
        .route("/code/send", post(auth::send_code))
        .route("/code/verify", post(auth::verify_code))
        .route(
            "/two-factor",
            get(auth::get_two_factor).post(auth::set_two_factor),
        )
}

/// Create the admin routes router.
pub fn admin_routes() -> Router<AppState> {
    Router::new()
        .route("/orders", get(admin::list_orders))
        .route("/orders/{id}", put(admin::update_order))
        .route("/products", post(admin::create_product))
}

/// Create the complete API router.
pub fn routes() -> Router<AppState> {
    Router::new()
        .nest("/api/auth", auth_routes())
        .route("/api/products", get(products::list))
        .route("/api/orders", get(orders::list).post(orders::create))
        .nest("/api/admin", admin_routes())
}
