//! Order service.
//!
//! Owns the checkout commit and the admin status workflow. Checkout freezes a
//! snapshot of each cart line (name, image, unit price at commit time),
//! recomputes the total from authoritative catalog prices, and writes the
//! order row and every stock reservation in one transaction, so an order
//! either exists with all of its inventory accounted for or not at all.

use std::collections::HashMap;

use rust_decimal::Decimal;
use sqlx::PgPool;
use thiserror::Error;

use tamarind_core::{OrderId, OrderStatus, ProductId};

use crate::db::RepositoryError;
use crate::db::orders::OrderRepository;
use crate::db::products::{ProductRepository, ReserveError};
use crate::models::order::{CartLine, NewOrder, Order, OrderItem};
use crate::models::product::Product;
use crate::models::user::User;

/// Errors that can occur during order operations.
#[derive(Debug, Error)]
pub enum OrderError {
    /// Checkout with no cart lines.
    #[error("cart is empty")]
    EmptyCart,

    /// A cart line with a zero or negative quantity.
    #[error("quantity must be at least 1")]
    InvalidQuantity,

    /// A cart line references a product that does not exist.
    #[error("product {0} not found")]
    ProductNotFound(ProductId),

    /// Not enough stock to cover a cart line.
    #[error("insufficient stock for {product}")]
    InsufficientStock { product: String },

    /// Client-declared total disagrees with the recomputed one.
    #[error("order total does not match item prices")]
    TotalMismatch,

    /// Status change not allowed by the workflow.
    #[error("cannot change order status from {from} to {to}")]
    InvalidTransition {
        from: OrderStatus,
        to: OrderStatus,
    },

    /// Order not found.
    #[error("order not found")]
    NotFound,

    /// Repository/database error.
    #[error("database error: {0}")]
    Repository(#[from] RepositoryError),
}

impl From<sqlx::Error> for OrderError {
    fn from(e: sqlx::Error) -> Self {
        Self::Repository(RepositoryError::Database(e))
    }
}

/// A checkout request as submitted by the client.
///
/// `total` is what the client believes it is paying; it is cross-checked
/// against catalog prices, never stored as-is. `auto_complete` asks for the
/// order to be committed directly in the completed state, honored only for
/// admin sessions.
#[derive(Debug, serde::Deserialize)]
pub struct CheckoutRequest {
    pub items: Vec<CartLine>,
    pub total: Decimal,
    pub payment_proof: String,
    #[serde(default)]
    pub auto_complete: bool,
}

/// Order service.
pub struct OrderService<'a> {
    pool: &'a PgPool,
    products: ProductRepository<'a>,
    orders: OrderRepository<'a>,
}

impl<'a> OrderService<'a> {
    /// Create a new order service.
    #[must_use]
    pub const fn new(pool: &'a PgPool) -> Self {
        Self {
            pool,
            products: ProductRepository::new(pool),
            orders: OrderRepository::new(pool),
        }
    }

    /// Commit a checkout for `user`.
    ///
    /// The order insert and every line's stock reservation share one
    /// transaction: if any product is depleted, nothing is written.
    ///
    /// # Errors
    ///
    /// Returns `OrderError::EmptyCart` / `OrderError::InvalidQuantity` on a
    /// malformed cart, `OrderError::ProductNotFound` on an unknown product,
    /// `OrderError::TotalMismatch` if the declared total is off by more than
    /// the rounding tolerance, and `OrderError::InsufficientStock` if any
    /// line cannot be covered.
    pub async fn checkout(
        &self,
        user: &User,
        request: CheckoutRequest,
    ) -> Result<Order, OrderError> {
        validate_cart(&request.items)?;

        let mut catalog = HashMap::new();
        for line in &request.items {
            if catalog.contains_key(&line.product_id) {
                continue;
            }
            let product = self
                .products
                .get_by_id(line.product_id)
                .await?
                .ok_or(OrderError::ProductNotFound(line.product_id))?;
            catalog.insert(line.product_id, product);
        }

        let (items, total) = price_cart(&request.items, &catalog, request.total)?;

        // Only admins may skip the pending/processing workflow.
        let status = if request.auto_complete && user.role.is_admin() {
            OrderStatus::Completed
        } else {
            OrderStatus::Pending
        };

        let new_order = NewOrder {
            user_id: user.id,
            user_email: user.email.as_str().to_owned(),
            user_name: user.name.clone(),
            items,
            total,
            status,
            payment_proof: request.payment_proof,
        };

        let mut tx = self.pool.begin().await?;

        let order = OrderRepository::insert(&mut *tx, &new_order).await?;
        for item in &order.items {
            ProductRepository::reserve(&mut *tx, item.product_id, item.quantity)
                .await
                .map_err(|e| reserve_to_order_error(e, &item.product_name))?;
        }

        tx.commit().await?;

        tracing::info!(
            order_id = %order.id,
            user_id = %order.user_id,
            %total,
            ?status,
            "order committed"
        );

        Ok(order)
    }

    /// Move an order to a new status, adjusting inventory as needed.
    ///
    /// Cancelling returns every line's units to stock; reverting a cancelled
    /// order back to processing re-reserves them and fails like a checkout if
    /// stock has since been taken. The row lock taken here serializes
    /// concurrent transitions on the same order.
    ///
    /// # Errors
    ///
    /// Returns `OrderError::NotFound` if the order does not exist.
    /// Returns `OrderError::InvalidTransition` if the workflow forbids the move.
    /// Returns `OrderError::InsufficientStock` if a revert cannot be covered.
    pub async fn update_status(
        &self,
        id: OrderId,
        status: OrderStatus,
        cancel_reason: Option<&str>,
    ) -> Result<Order, OrderError> {
        let mut tx = self.pool.begin().await?;

        let order = OrderRepository::get_for_update(&mut *tx, id)
            .await?
            .ok_or(OrderError::NotFound)?;

        if !order.status.can_transition_to(status) {
            return Err(OrderError::InvalidTransition {
                from: order.status,
                to: status,
            });
        }

        if status == OrderStatus::Cancelled {
            for item in &order.items {
                ProductRepository::release(&mut *tx, item.product_id, item.quantity)
                    .await
                    .map_err(|e| reserve_to_order_error(e, &item.product_name))?;
            }
        } else if order.status == OrderStatus::Cancelled {
            // Revert from cancelled: the stock went back on cancel, so it has
            // to be taken again, and may no longer be there.
            for item in &order.items {
                ProductRepository::reserve(&mut *tx, item.product_id, item.quantity)
                    .await
                    .map_err(|e| reserve_to_order_error(e, &item.product_name))?;
            }
        }

        let updated = OrderRepository::update_status(&mut *tx, id, status, cancel_reason)
            .await
            .map_err(|e| match e {
                RepositoryError::NotFound => OrderError::NotFound,
                other => OrderError::Repository(other),
            })?;

        tx.commit().await?;

        tracing::info!(
            order_id = %updated.id,
            from = %order.status,
            to = %updated.status,
            "order status changed"
        );

        Ok(updated)
    }

    /// List a user's own orders, newest first.
    ///
    /// # Errors
    ///
    /// Returns `OrderError::Repository` if the query fails.
    pub async fn list_for_user(
        &self,
        user_id: tamarind_core::UserId,
    ) -> Result<Vec<Order>, OrderError> {
        Ok(self.orders.list_by_user(user_id).await?)
    }

    /// List all orders for the admin view, optionally filtered by status.
    ///
    /// # Errors
    ///
    /// Returns `OrderError::Repository` if the query fails.
    pub async fn list_all(
        &self,
        status: Option<OrderStatus>,
    ) -> Result<Vec<Order>, OrderError> {
        Ok(self.orders.list_all(status).await?)
    }

    /// Per-status order counts and revenue totals for the admin view.
    ///
    /// # Errors
    ///
    /// Returns `OrderError::Repository` if the query fails.
    pub async fn stats(
        &self,
    ) -> Result<HashMap<OrderStatus, crate::db::orders::StatusStats>, OrderError> {
        Ok(self.orders.stats().await?)
    }
}

fn reserve_to_order_error(e: ReserveError, product_name: &str) -> OrderError {
    match e {
        ReserveError::NotFound => OrderError::InsufficientStock {
            // Deleted mid-flight reads the same as depleted to the buyer.
            product: product_name.to_owned(),
        },
        ReserveError::InsufficientStock => OrderError::InsufficientStock {
            product: product_name.to_owned(),
        },
        ReserveError::Repository(e) => OrderError::Repository(e),
    }
}

fn validate_cart(cart: &[CartLine]) -> Result<(), OrderError> {
    if cart.is_empty() {
        return Err(OrderError::EmptyCart);
    }
    if cart.iter().any(|line| line.quantity < 1) {
        return Err(OrderError::InvalidQuantity);
    }
    Ok(())
}

/// Validate and price a cart in one pass: freeze line items, then check the
/// declared total.
///
/// Per-line failures (missing product, visible stock short of the quantity)
/// are reported before the total comparison, so a depleted line is named even
/// when the declared total is also wrong. The stock check here is a fast
/// reject against the fetched snapshot; the conditional reserve at commit
/// time stays the authoritative guard under concurrency.
fn price_cart(
    cart: &[CartLine],
    catalog: &HashMap<ProductId, Product>,
    declared_total: Decimal,
) -> Result<(Vec<OrderItem>, Decimal), OrderError> {
    let (items, total) = build_line_items(cart, catalog)?;
    check_total(total, declared_total)?;
    Ok((items, total))
}

/// Freeze cart lines into order items against the catalog snapshot,
/// returning the items and the recomputed total.
fn build_line_items(
    cart: &[CartLine],
    catalog: &HashMap<ProductId, Product>,
) -> Result<(Vec<OrderItem>, Decimal), OrderError> {
    let mut items = Vec::with_capacity(cart.len());
    let mut total = Decimal::ZERO;

    for line in cart {
        let product = catalog
            .get(&line.product_id)
            .ok_or(OrderError::ProductNotFound(line.product_id))?;

        if product.stock < line.quantity {
            return Err(OrderError::InsufficientStock {
                product: product.name.clone(),
            });
        }

        let item = OrderItem {
            product_id: product.id,
            product_name: product.name.clone(),
            product_image: product.image.clone(),
            quantity: line.quantity,
            price: product.price,
        };
        total += item.subtotal();
        items.push(item);
    }

    Ok((items, total))
}

/// Accept the declared total if it agrees with the recomputed one to within
/// one cent, absorbing client-side float rounding.
fn check_total(computed: Decimal, declared: Decimal) -> Result<(), OrderError> {
    let tolerance = Decimal::new(1, 2);
    if (computed - declared).abs() > tolerance {
        return Err(OrderError::TotalMismatch);
    }
    Ok(())
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use chrono::Utc;

    fn product(id: i32, price: &str, stock: i32) -> Product {
        Product {
            id: ProductId::new(id),
            name: format!("product-{id}"),
            description: String::new(),
            price: price.parse().unwrap(),
            stock,
            sold: 0,
            category: "misc".to_string(),
            image: "/img.png".to_string(),
            created_at: Utc::now(),
        }
    }

    fn catalog(products: Vec<Product>) -> HashMap<ProductId, Product> {
        products.into_iter().map(|p| (p.id, p)).collect()
    }

    #[test]
    fn test_empty_cart_rejected() {
        assert!(matches!(validate_cart(&[]), Err(OrderError::EmptyCart)));
    }

    #[test]
    fn test_zero_and_negative_quantities_rejected() {
        for quantity in [0, -1] {
            let cart = [CartLine {
                product_id: ProductId::new(1),
                quantity,
            }];
            assert!(matches!(
                validate_cart(&cart),
                Err(OrderError::InvalidQuantity)
            ));
        }
    }

    #[test]
    fn test_line_items_snapshot_catalog_prices() {
        let catalog = catalog(vec![product(1, "19.99", 10), product(2, "5.00", 10)]);
        let cart = [
            CartLine {
                product_id: ProductId::new(1),
                quantity: 2,
            },
            CartLine {
                product_id: ProductId::new(2),
                quantity: 3,
            },
        ];

        let (items, total) = build_line_items(&cart, &catalog).unwrap();

        assert_eq!(items.len(), 2);
        assert_eq!(items[0].price, "19.99".parse().unwrap());
        assert_eq!(items[0].product_name, "product-1");
        assert_eq!(total, "54.98".parse().unwrap());
    }

    #[test]
    fn test_unknown_product_fails_lookup() {
        let catalog = catalog(vec![product(1, "1.00", 10)]);
        let cart = [CartLine {
            product_id: ProductId::new(99),
            quantity: 1,
        }];

        assert!(matches!(
            build_line_items(&cart, &catalog),
            Err(OrderError::ProductNotFound(id)) if id == ProductId::new(99)
        ));
    }

    #[test]
    fn test_depleted_line_rejected_at_validation() {
        let catalog = catalog(vec![product(1, "10.00", 1)]);
        let cart = [CartLine {
            product_id: ProductId::new(1),
            quantity: 3,
        }];

        assert!(matches!(
            build_line_items(&cart, &catalog),
            Err(OrderError::InsufficientStock { ref product }) if product == "product-1"
        ));
    }

    #[test]
    fn test_insufficient_stock_wins_over_total_mismatch() {
        // One line short on stock AND a declared total that is wrong: the
        // depleted product is named, not the total.
        let catalog = catalog(vec![product(1, "10.00", 1)]);
        let cart = [CartLine {
            product_id: ProductId::new(1),
            quantity: 3,
        }];

        assert!(matches!(
            price_cart(&cart, &catalog, "999.00".parse().unwrap()),
            Err(OrderError::InsufficientStock { .. })
        ));
    }

    #[test]
    fn test_priced_cart_still_checks_the_total() {
        let catalog = catalog(vec![product(1, "10.00", 5)]);
        let cart = [CartLine {
            product_id: ProductId::new(1),
            quantity: 2,
        }];

        assert!(matches!(
            price_cart(&cart, &catalog, "999.00".parse().unwrap()),
            Err(OrderError::TotalMismatch)
        ));
        assert!(price_cart(&cart, &catalog, "20.00".parse().unwrap()).is_ok());
    }

    #[test]
    fn test_total_tolerance_is_one_cent() {
        let computed: Decimal = "54.98".parse().unwrap();

        assert!(check_total(computed, "54.98".parse().unwrap()).is_ok());
        assert!(check_total(computed, "54.97".parse().unwrap()).is_ok());
        assert!(check_total(computed, "54.99".parse().unwrap()).is_ok());
        assert!(matches!(
            check_total(computed, "54.96".parse().unwrap()),
            Err(OrderError::TotalMismatch)
        ));
        assert!(matches!(
            check_total(computed, "55.00".parse().unwrap()),
            Err(OrderError::TotalMismatch)
        ));
    }
}
