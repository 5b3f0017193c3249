//! Product domain types.

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::Serialize;

use tamarind_core::ProductId;

/// A catalog product.
///
/// `stock` and `sold` are mutated only through the inventory ledger
/// ([`crate::db::products::ProductRepository::reserve`] and `release`), never
/// by plain field updates.
#[derive(Debug, Clone, Serialize)]
pub struct Product {
    /// Unique product ID.
    pub id: ProductId,
    /// Display name.
    pub name: String,
    /// Long description.
    pub description: String,
    /// Authoritative unit price. Client-supplied prices are never trusted.
    pub price: Decimal,
    /// Units currently available. Never negative.
    pub stock: i32,
    /// Net units sold.
    pub sold: i32,
    /// Category label.
    pub category: String,
    /// Image path or URL.
    pub image: String,
    /// When the product was created.
    pub created_at: DateTime<Utc>,
}
