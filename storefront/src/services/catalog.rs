// storefront/src/services/catalog.rs

use crate::errors::Result;
use crate::models::Product;
use async_trait::async_trait;
use sqlx::PgPool;
use tracing::instrument;

/// Read-only view of the product catalog.
#[async_trait]
pub trait Catalog: Send + Sync {
  /// Products whose id is in `ids`. Unknown ids are simply absent from the result.
  async fn find_products(&self, ids: &[String]) -> Result<Vec<Product>>;
}

pub struct PgCatalog {
  pool: PgPool,
}

impl PgCatalog {
  pub fn new(pool: PgPool) -> Self {
    Self { pool }
  }
}

#[async_trait]
impl Catalog for PgCatalog {
  #[instrument(name = "catalog::find_products", skip(self), fields(count = ids.len()))]
  async fn find_products(&self, ids: &[String]) -> Result<Vec<Product>> {
    let products = sqlx::query_as::<_, Product>(
      "SELECT id, name, description, price::float8 AS price, image, category, stock \
       FROM products WHERE id = ANY($1)",
    )
    .bind(ids)
    .fetch_all(&self.pool)
    .await?;
    Ok(products)
  }
}
