// storefront/src/models/order_item.rs

use serde::Serialize;
use sqlx::FromRow;
use uuid::Uuid;

#[derive(Debug, Clone, Serialize, FromRow)]
pub struct OrderItem {
  pub id: Uuid,
  pub order_id: Uuid,
  pub product_id: String,
  pub quantity: i32,
  /// Catalog price at order creation, minor currency units. Never updated.
  pub unit_price: i64,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ProductSummary {
  pub name: String,
  pub image: Option<String>,
}

/// An order item joined with what is left of its product.
#[derive(Debug, Clone, Serialize)]
pub struct OrderItemDetail {
  #[serde(flatten)]
  pub item: OrderItem,
  pub product: Option<ProductSummary>,
}
