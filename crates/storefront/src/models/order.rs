//! Order domain types.

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use tamarind_core::{OrderId, OrderStatus, ProductId, UserId};

/// One requested (product, quantity) pair in a checkout cart.
#[derive(Debug, Clone, Deserialize)]
pub struct CartLine {
    pub product_id: ProductId,
    pub quantity: i32,
}

/// A frozen line item inside a committed order.
///
/// Name, image and price are snapshots taken at order time; later catalog
/// edits do not change them.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OrderItem {
    pub product_id: ProductId,
    pub product_name: String,
    pub product_image: String,
    pub quantity: i32,
    pub price: Decimal,
}

impl OrderItem {
    /// Line subtotal: snapshot price times quantity.
    #[must_use]
    pub fn subtotal(&self) -> Decimal {
        self.price * Decimal::from(self.quantity)
    }
}

/// A committed order.
///
/// `total` is immutable after creation - it is a point-in-time financial
/// record, not a live recomputation. Status changes go through
/// [`tamarind_core::OrderStatus::can_transition_to`].
#[derive(Debug, Clone, Serialize)]
pub struct Order {
    pub id: OrderId,
    pub user_id: UserId,
    pub user_email: String,
    pub user_name: String,
    pub items: Vec<OrderItem>,
    pub total: Decimal,
    pub status: OrderStatus,
    /// Opaque client-supplied payment token. Stored, never verified.
    pub payment_proof: String,
    pub cancel_reason: Option<String>,
    pub completed_at: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
}

/// Fields required to persist a new order.
#[derive(Debug, Clone)]
pub struct NewOrder {
    pub user_id: UserId,
    pub user_email: String,
    pub user_name: String,
    pub items: Vec<OrderItem>,
    pub total: Decimal,
    pub status: OrderStatus,
    pub payment_proof: String,
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn test_subtotal() {
        let item = OrderItem {
            product_id: ProductId::new(1),
            product_name: "Tea".to_string(),
            product_image: "/images/tea.jpg".to_string(),
            quantity: 3,
            price: Decimal::new(1250, 2), // 12.50
        };
        assert_eq!(item.subtotal(), Decimal::new(3750, 2)); // 37.50
    }
}
