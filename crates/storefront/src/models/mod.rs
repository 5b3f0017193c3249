//! Domain types for the storefront.
//!
//! These types represent validated domain objects separate from database row types.

pub mod order;
pub mod product;
pub mod user;

pub use order::{CartLine, NewOrder, Order, OrderItem};
pub use product::Product;
pub use user::{PublicUser, User};
