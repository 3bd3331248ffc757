// storefront/src/models/product.rs

use serde::Serialize;
use sqlx::FromRow;

#[derive(Debug, Clone, Serialize, FromRow)]
pub struct Product {
  pub id: String,
  pub name: String,
  pub description: Option<String>,
  /// Major currency units as stored in the catalog (e.g. 25.0 for $25.00).
  pub price: f64,
  pub image: Option<String>,
  pub category: Option<String>,
  pub stock: i32,
}
