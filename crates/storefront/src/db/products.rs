//! Product repository and inventory ledger.
//!
//! Stock is a shared mutable resource with no single owner. Every decrement
//! goes through [`ProductRepository::reserve`], whose conditional UPDATE makes
//! the check-and-decrement a single indivisible statement.
//!
//! `sold` is a *net* counter: a cancellation restocks via
//! [`ProductRepository::release`], which gives the reserved units back and
//! subtracts them from `sold` again, so the counter reflects units actually
//! sold rather than units ever reserved.

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use sqlx::{PgConnection, PgPool};

use tamarind_core::ProductId;

use super::RepositoryError;
use crate::models::product::Product;

/// Raw row shape for the `products` table.
#[derive(sqlx::FromRow)]
struct ProductRow {
    id: i32,
    name: String,
    description: String,
    price: Decimal,
    stock: i32,
    sold: i32,
    category: String,
    image: String,
    created_at: DateTime<Utc>,
}

impl From<ProductRow> for Product {
    fn from(row: ProductRow) -> Self {
        Self {
            id: ProductId::new(row.id),
            name: row.name,
            description: row.description,
            price: row.price,
            stock: row.stock,
            sold: row.sold,
            category: row.category,
            image: row.image,
            created_at: row.created_at,
        }
    }
}

const SELECT_PRODUCT: &str = "SELECT id, name, description, price, stock, sold, category, image, \
     created_at FROM products";

/// Outcome of a successful stock reservation.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct StockLevel {
    pub stock: i32,
    pub sold: i32,
}

/// Errors from the inventory ledger.
#[derive(Debug, thiserror::Error)]
pub enum ReserveError {
    /// The product does not exist.
    #[error("product not found")]
    NotFound,
    /// Requested quantity exceeds available stock.
    #[error("insufficient stock")]
    InsufficientStock,
    /// Underlying database failure.
    #[error(transparent)]
    Repository(#[from] RepositoryError),
}

impl From<sqlx::Error> for ReserveError {
    fn from(e: sqlx::Error) -> Self {
        Self::Repository(RepositoryError::Database(e))
    }
}

/// Repository for product reads and the stock ledger.
pub struct ProductRepository<'a> {
    pool: &'a PgPool,
}

impl<'a> ProductRepository<'a> {
    /// Create a new product repository.
    #[must_use]
    pub const fn new(pool: &'a PgPool) -> Self {
        Self { pool }
    }

    /// List products that currently have stock, newest first.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn list_in_stock(&self) -> Result<Vec<Product>, RepositoryError> {
        let rows: Vec<ProductRow> =
            sqlx::query_as(&format!("{SELECT_PRODUCT} WHERE stock > 0 ORDER BY created_at DESC"))
                .fetch_all(self.pool)
                .await?;

        Ok(rows.into_iter().map(Product::from).collect())
    }

    /// Get a product by its ID.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn get_by_id(&self, id: ProductId) -> Result<Option<Product>, RepositoryError> {
        let row: Option<ProductRow> =
            sqlx::query_as(&format!("{SELECT_PRODUCT} WHERE id = $1"))
                .bind(id.as_i32())
                .fetch_optional(self.pool)
                .await?;

        Ok(row.map(Product::from))
    }

    /// Create a new product (admin catalog management).
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn create(
        &self,
        name: &str,
        description: &str,
        price: Decimal,
        stock: i32,
        category: &str,
        image: &str,
    ) -> Result<Product, RepositoryError> {
        let row: ProductRow = sqlx::query_as(
            "INSERT INTO products (name, description, price, stock, category, image) \
             VALUES ($1, $2, $3, $4, $5, $6) \
             RETURNING id, name, description, price, stock, sold, category, image, created_at",
        )
        .bind(name)
        .bind(description)
        .bind(price)
        .bind(stock)
        .bind(category)
        .bind(image)
        .fetch_one(self.pool)
        .await?;

        Ok(row.into())
    }

    /// Atomically reserve `quantity` units of a product.
    ///
    /// The read of current stock and the write of the decremented value are
    /// one conditional UPDATE (`... AND stock >= $n`), so two concurrent
    /// reservations for the last unit cannot both succeed and stock never
    /// goes negative. Takes a connection so checkout can run every line's
    /// reservation inside one transaction.
    ///
    /// # Errors
    ///
    /// Returns `ReserveError::NotFound` if the product does not exist,
    /// `ReserveError::InsufficientStock` if fewer than `quantity` units remain.
    pub async fn reserve(
        conn: &mut PgConnection,
        id: ProductId,
        quantity: i32,
    ) -> Result<StockLevel, ReserveError> {
        let updated: Option<(i32, i32)> = sqlx::query_as(
            "UPDATE products SET stock = stock - $2, sold = sold + $2 \
             WHERE id = $1 AND stock >= $2 \
             RETURNING stock, sold",
        )
        .bind(id.as_i32())
        .bind(quantity)
        .fetch_optional(&mut *conn)
        .await?;

        if let Some((stock, sold)) = updated {
            return Ok(StockLevel { stock, sold });
        }

        // The guard rejected the update: distinguish a missing product from
        // a depleted one.
        let exists: Option<(i32,)> = sqlx::query_as("SELECT 1 FROM products WHERE id = $1")
            .bind(id.as_i32())
            .fetch_optional(&mut *conn)
            .await?;

        if exists.is_some() {
            Err(ReserveError::InsufficientStock)
        } else {
            Err(ReserveError::NotFound)
        }
    }

    /// Return `quantity` units of a product to stock.
    ///
    /// Compensating operation for [`Self::reserve`], used when an order is
    /// cancelled. `sold` tracks net units sold, so it is decremented here.
    ///
    /// # Errors
    ///
    /// Returns `ReserveError::NotFound` if the product does not exist.
    pub async fn release(
        conn: &mut PgConnection,
        id: ProductId,
        quantity: i32,
    ) -> Result<StockLevel, ReserveError> {
        let updated: Option<(i32, i32)> = sqlx::query_as(
            "UPDATE products SET stock = stock + $2, sold = GREATEST(sold - $2, 0) \
             WHERE id = $1 \
             RETURNING stock, sold",
        )
        .bind(id.as_i32())
        .bind(quantity)
        .fetch_optional(&mut *conn)
        .await?;

        updated
            .map(|(stock, sold)| StockLevel { stock, sold })
            .ok_or(ReserveError::NotFound)
    }
}
