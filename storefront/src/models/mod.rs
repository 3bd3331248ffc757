// storefront/src/models/mod.rs

//! Rows read from and written to the store, plus the checkout request shape.

pub mod cart;
pub mod order;
pub mod order_item;
pub mod product;

pub use cart::{CartLine, CheckoutRequest, ShippingForm};
pub use order::{Order, OrderStatus, OrderWithItems, ShippingAddress};
pub use order_item::{OrderItem, OrderItemDetail, ProductSummary};
pub use product::Product;
