//! Order repository for database operations.
//!
//! Line items are stored as a JSONB snapshot taken at order time. The order
//! insert and the matching stock reservations share one transaction (see
//! `services::orders`), so a failed reservation never leaves a dangling order.

use std::collections::HashMap;

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use sqlx::types::Json;
use sqlx::{PgConnection, PgPool};

use tamarind_core::{OrderId, OrderStatus, UserId};

use super::RepositoryError;
use crate::models::order::{NewOrder, Order, OrderItem};

/// Raw row shape for the `orders` table.
#[derive(sqlx::FromRow)]
struct OrderRow {
    id: i32,
    user_id: i32,
    user_email: String,
    user_name: String,
    items: Json<Vec<OrderItem>>,
    total: Decimal,
    status: String,
    payment_proof: String,
    cancel_reason: Option<String>,
    completed_at: Option<DateTime<Utc>>,
    created_at: DateTime<Utc>,
}

impl TryFrom<OrderRow> for Order {
    type Error = RepositoryError;

    fn try_from(row: OrderRow) -> Result<Self, Self::Error> {
        let status: OrderStatus = row.status.parse().map_err(|e| {
            RepositoryError::DataCorruption(format!("invalid order status in database: {e}"))
        })?;

        Ok(Self {
            id: OrderId::new(row.id),
            user_id: UserId::new(row.user_id),
            user_email: row.user_email,
            user_name: row.user_name,
            items: row.items.0,
            total: row.total,
            status,
            payment_proof: row.payment_proof,
            cancel_reason: row.cancel_reason,
            completed_at: row.completed_at,
            created_at: row.created_at,
        })
    }
}

const SELECT_ORDER: &str = "SELECT id, user_id, user_email, user_name, items, total, status, \
     payment_proof, cancel_reason, completed_at, created_at FROM orders";

/// Per-status order statistics for the admin dashboard.
#[derive(Debug, Clone, Copy, Default, serde::Serialize)]
pub struct StatusStats {
    pub count: i64,
    pub total: Decimal,
}

/// Repository for order database operations.
pub struct OrderRepository<'a> {
    pool: &'a PgPool,
}

impl<'a> OrderRepository<'a> {
    /// Create a new order repository.
    #[must_use]
    pub const fn new(pool: &'a PgPool) -> Self {
        Self { pool }
    }

    /// List a user's orders, newest first.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn list_by_user(&self, user_id: UserId) -> Result<Vec<Order>, RepositoryError> {
        let rows: Vec<OrderRow> =
            sqlx::query_as(&format!("{SELECT_ORDER} WHERE user_id = $1 ORDER BY created_at DESC"))
                .bind(user_id.as_i32())
                .fetch_all(self.pool)
                .await?;

        rows.into_iter().map(Order::try_from).collect()
    }

    /// List all orders, optionally filtered by status, newest first.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn list_all(
        &self,
        status: Option<OrderStatus>,
    ) -> Result<Vec<Order>, RepositoryError> {
        let rows: Vec<OrderRow> = match status {
            Some(status) => {
                sqlx::query_as(&format!(
                    "{SELECT_ORDER} WHERE status = $1 ORDER BY created_at DESC"
                ))
                .bind(status.to_string())
                .fetch_all(self.pool)
                .await?
            }
            None => {
                sqlx::query_as(&format!("{SELECT_ORDER} ORDER BY created_at DESC"))
                    .fetch_all(self.pool)
                    .await?
            }
        };

        rows.into_iter().map(Order::try_from).collect()
    }

    /// Per-status counts and revenue totals.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    /// Returns `RepositoryError::DataCorruption` on an unknown stored status.
    pub async fn stats(&self) -> Result<HashMap<OrderStatus, StatusStats>, RepositoryError> {
        let rows: Vec<(String, i64, Option<Decimal>)> = sqlx::query_as(
            "SELECT status, COUNT(*), SUM(total) FROM orders GROUP BY status",
        )
        .fetch_all(self.pool)
        .await?;

        let mut stats: HashMap<OrderStatus, StatusStats> = HashMap::new();
        for (status, count, total) in rows {
            let status: OrderStatus = status.parse().map_err(|e| {
                RepositoryError::DataCorruption(format!("invalid order status in database: {e}"))
            })?;
            stats.insert(
                status,
                StatusStats {
                    count,
                    total: total.unwrap_or_default(),
                },
            );
        }

        Ok(stats)
    }

    /// Insert a new order with its frozen line-item snapshot.
    ///
    /// Takes a connection so the caller can bundle the insert with the stock
    /// reservations in one transaction.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn insert(
        conn: &mut PgConnection,
        order: &NewOrder,
    ) -> Result<Order, RepositoryError> {
        let completed_at = (order.status == OrderStatus::Completed).then(Utc::now);

        let row: OrderRow = sqlx::query_as(
            "INSERT INTO orders \
               (user_id, user_email, user_name, items, total, status, payment_proof, completed_at) \
             VALUES ($1, $2, $3, $4, $5, $6, $7, $8) \
             RETURNING id, user_id, user_email, user_name, items, total, status, \
                       payment_proof, cancel_reason, completed_at, created_at",
        )
        .bind(order.user_id.as_i32())
        .bind(&order.user_email)
        .bind(&order.user_name)
        .bind(Json(&order.items))
        .bind(order.total)
        .bind(order.status.to_string())
        .bind(&order.payment_proof)
        .bind(completed_at)
        .fetch_one(conn)
        .await?;

        row.try_into()
    }

    /// Fetch an order by ID with a row lock, for use inside a transaction.
    ///
    /// The lock serializes concurrent status transitions on the same order.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn get_for_update(
        conn: &mut PgConnection,
        id: OrderId,
    ) -> Result<Option<Order>, RepositoryError> {
        let row: Option<OrderRow> =
            sqlx::query_as(&format!("{SELECT_ORDER} WHERE id = $1 FOR UPDATE"))
                .bind(id.as_i32())
                .fetch_optional(conn)
                .await?;

        row.map(Order::try_from).transpose()
    }

    /// Update an order's status and the status-dependent fields.
    ///
    /// Sets `completed_at` when moving to completed, records the cancel
    /// reason when moving to cancelled, and clears both on a revert.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::NotFound` if the order does not exist.
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn update_status(
        conn: &mut PgConnection,
        id: OrderId,
        status: OrderStatus,
        cancel_reason: Option<&str>,
    ) -> Result<Order, RepositoryError> {
        let completed_at = (status == OrderStatus::Completed).then(Utc::now);
        let cancel_reason = (status == OrderStatus::Cancelled)
            .then_some(cancel_reason)
            .flatten();

        let row: Option<OrderRow> = sqlx::query_as(
            "UPDATE orders SET status = $2, cancel_reason = $3, completed_at = $4 \
             WHERE id = $1 \
             RETURNING id, user_id, user_email, user_name, items, total, status, \
                       payment_proof, cancel_reason, completed_at, created_at",
        )
        .bind(id.as_i32())
        .bind(status.to_string())
        .bind(cancel_reason)
        .bind(completed_at)
        .fetch_optional(conn)
        .await?;

        row.ok_or(RepositoryError::NotFound)?.try_into()
    }
}
