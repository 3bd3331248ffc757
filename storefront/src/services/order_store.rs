// storefront/src/services/order_store.rs

use crate::errors::Result;
use crate::models::{Order, OrderItem, OrderItemDetail, OrderStatus, OrderWithItems, ProductSummary, ShippingAddress};
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::types::Json;
use sqlx::{FromRow, PgPool};
use std::collections::HashMap;
use tracing::{debug, info, instrument};
use uuid::Uuid;

#[derive(Debug, Clone)]
pub struct NewOrder {
  pub user_id: Uuid,
  pub amount_subtotal: i64,
  pub amount_total: i64,
  pub currency: String,
  pub shipping_address: ShippingAddress,
}

#[derive(Debug, Clone)]
pub struct NewOrderItem {
  pub product_id: String,
  pub quantity: i32,
  pub unit_price: i64,
}

/// Result of a conditional status change.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Transition {
  /// The order was pending and now has the target status.
  Applied,
  /// The order already had the target status; nothing changed.
  AlreadyInState,
  /// The order is in some other status and was left alone.
  Conflict(OrderStatus),
  NotFound,
}

impl Transition {
  /// Classifies a status change that did not apply, given the current status.
  pub fn not_applied(current: Option<OrderStatus>, target: OrderStatus) -> Self {
    match current {
      None => Transition::NotFound,
      Some(status) if status == target => Transition::AlreadyInState,
      Some(status) => Transition::Conflict(status),
    }
  }
}

/// Persistence for orders and their items.
///
/// Status changes only ever leave `pending_payment`; every other starting
/// status is reported back instead of overwritten.
#[async_trait]
pub trait OrderStore: Send + Sync {
  /// Inserts a pending order and its items atomically. Returns the new order id.
  async fn create_order(&self, order: NewOrder, items: Vec<NewOrderItem>) -> Result<Uuid>;

  async fn attach_payment_session(&self, order_id: Uuid, session_id: &str) -> Result<()>;

  /// Without a `session_id` the stored session reference is kept.
  async fn mark_paid(&self, order_id: Uuid, payment_intent: Option<&str>, session_id: Option<&str>) -> Result<Transition>;

  async fn mark_cancelled(&self, order_id: Uuid) -> Result<Transition>;

  async fn find_order_id_by_session(&self, session_id: &str) -> Result<Option<Uuid>>;

  /// The user's orders, newest first, with their items.
  async fn list_orders_for_user(&self, user_id: Uuid) -> Result<Vec<OrderWithItems>>;

  async fn find_order_by_session(&self, user_id: Uuid, session_id: &str) -> Result<Option<OrderWithItems>>;

  /// Cancels pending orders that never got a payment session and were created
  /// before `cutoff`. Returns how many were cancelled.
  async fn cancel_stale_pending(&self, cutoff: DateTime<Utc>) -> Result<u64>;
}

pub struct PgOrderStore {
  pool: PgPool,
}

impl PgOrderStore {
  pub fn new(pool: PgPool) -> Self {
    Self { pool }
  }

  async fn current_status(&self, order_id: Uuid) -> Result<Option<OrderStatus>> {
    let status = sqlx::query_scalar::<_, OrderStatus>("SELECT status FROM orders WHERE id = $1")
      .bind(order_id)
      .fetch_optional(&self.pool)
      .await?;
    Ok(status)
  }

  async fn attach_items(&self, orders: Vec<Order>) -> Result<Vec<OrderWithItems>> {
    if orders.is_empty() {
      return Ok(Vec::new());
    }
    let ids: Vec<Uuid> = orders.iter().map(|o| o.id).collect();
    let rows = sqlx::query_as::<_, ItemRow>(ITEM_ROWS_QUERY)
      .bind(&ids)
      .fetch_all(&self.pool)
      .await?;

    let mut by_order: HashMap<Uuid, Vec<OrderItemDetail>> = HashMap::new();
    for row in rows {
      by_order.entry(row.item.order_id).or_default().push(row.into_detail());
    }
    Ok(
      orders
        .into_iter()
        .map(|order| {
          let items = by_order.remove(&order.id).unwrap_or_default();
          OrderWithItems { order, items }
        })
        .collect(),
    )
  }
}

#[derive(FromRow)]
struct ItemRow {
  #[sqlx(flatten)]
  item: OrderItem,
  product_name: Option<String>,
  product_image: Option<String>,
}

impl ItemRow {
  fn into_detail(self) -> OrderItemDetail {
    let product = self.product_name.map(|name| ProductSummary {
      name,
      image: self.product_image,
    });
    OrderItemDetail { item: self.item, product }
  }
}

/// Items come back in the order the cart listed them.
const ITEM_ROWS_QUERY: &str = "SELECT oi.id, oi.order_id, oi.product_id, oi.quantity, oi.unit_price, \
                                      p.name AS product_name, p.image AS product_image \
                               FROM order_items oi LEFT JOIN products p ON p.id = oi.product_id \
                               WHERE oi.order_id = ANY($1) ORDER BY oi.order_id, oi.line_no";

const ORDER_COLUMNS: &str = "id, user_id, status, amount_subtotal, amount_total, currency, shipping_address, \
                             stripe_session_id, payment_intent, tracking_number, created_at, updated_at";

#[async_trait]
impl OrderStore for PgOrderStore {
  #[instrument(name = "order_store::create_order", skip_all, fields(user_id = %order.user_id, items = items.len()))]
  async fn create_order(&self, order: NewOrder, items: Vec<NewOrderItem>) -> Result<Uuid> {
    let order_id = Uuid::new_v4();
    let mut tx = self.pool.begin().await?;

    sqlx::query(
      "INSERT INTO orders (id, user_id, status, amount_subtotal, amount_total, currency, shipping_address) \
       VALUES ($1, $2, $3, $4, $5, $6, $7)",
    )
    .bind(order_id)
    .bind(order.user_id)
    .bind(OrderStatus::PendingPayment)
    .bind(order.amount_subtotal)
    .bind(order.amount_total)
    .bind(&order.currency)
    .bind(Json(&order.shipping_address))
    .execute(&mut *tx)
    .await?;

    for (line_no, item) in (0i32..).zip(&items) {
      sqlx::query(
        "INSERT INTO order_items (id, order_id, product_id, quantity, unit_price, line_no) \
         VALUES ($1, $2, $3, $4, $5, $6)",
      )
      .bind(Uuid::new_v4())
      .bind(order_id)
      .bind(&item.product_id)
      .bind(item.quantity)
      .bind(item.unit_price)
      .bind(line_no)
      .execute(&mut *tx)
      .await?;
    }

    tx.commit().await?;
    info!(%order_id, "Pending order persisted.");
    Ok(order_id)
  }

  #[instrument(name = "order_store::attach_payment_session", skip(self))]
  async fn attach_payment_session(&self, order_id: Uuid, session_id: &str) -> Result<()> {
    sqlx::query("UPDATE orders SET stripe_session_id = $2, updated_at = now() WHERE id = $1")
      .bind(order_id)
      .bind(session_id)
      .execute(&self.pool)
      .await?;
    Ok(())
  }

  #[instrument(name = "order_store::mark_paid", skip(self))]
  async fn mark_paid(&self, order_id: Uuid, payment_intent: Option<&str>, session_id: Option<&str>) -> Result<Transition> {
    let updated = sqlx::query(
      "UPDATE orders SET status = $2, payment_intent = COALESCE($3, payment_intent), \
              stripe_session_id = COALESCE($4, stripe_session_id), updated_at = now() \
       WHERE id = $1 AND status = $5",
    )
    .bind(order_id)
    .bind(OrderStatus::Paid)
    .bind(payment_intent)
    .bind(session_id)
    .bind(OrderStatus::PendingPayment)
    .execute(&self.pool)
    .await?
    .rows_affected();

    if updated > 0 {
      return Ok(Transition::Applied);
    }
    let current = self.current_status(order_id).await?;
    debug!(?current, "Paid transition not applied.");
    Ok(Transition::not_applied(current, OrderStatus::Paid))
  }

  #[instrument(name = "order_store::mark_cancelled", skip(self))]
  async fn mark_cancelled(&self, order_id: Uuid) -> Result<Transition> {
    let updated = sqlx::query("UPDATE orders SET status = $2, updated_at = now() WHERE id = $1 AND status = $3")
      .bind(order_id)
      .bind(OrderStatus::Cancelled)
      .bind(OrderStatus::PendingPayment)
      .execute(&self.pool)
      .await?
      .rows_affected();

    if updated > 0 {
      return Ok(Transition::Applied);
    }
    let current = self.current_status(order_id).await?;
    debug!(?current, "Cancel transition not applied.");
    Ok(Transition::not_applied(current, OrderStatus::Cancelled))
  }

  async fn find_order_id_by_session(&self, session_id: &str) -> Result<Option<Uuid>> {
    let id = sqlx::query_scalar::<_, Uuid>("SELECT id FROM orders WHERE stripe_session_id = $1")
      .bind(session_id)
      .fetch_optional(&self.pool)
      .await?;
    Ok(id)
  }

  #[instrument(name = "order_store::list_orders_for_user", skip(self))]
  async fn list_orders_for_user(&self, user_id: Uuid) -> Result<Vec<OrderWithItems>> {
    let orders = sqlx::query_as::<_, Order>(&format!(
      "SELECT {} FROM orders WHERE user_id = $1 ORDER BY created_at DESC",
      ORDER_COLUMNS
    ))
    .bind(user_id)
    .fetch_all(&self.pool)
    .await?;
    self.attach_items(orders).await
  }

  #[instrument(name = "order_store::find_order_by_session", skip(self))]
  async fn find_order_by_session(&self, user_id: Uuid, session_id: &str) -> Result<Option<OrderWithItems>> {
    let order = sqlx::query_as::<_, Order>(&format!(
      "SELECT {} FROM orders WHERE user_id = $1 AND stripe_session_id = $2",
      ORDER_COLUMNS
    ))
    .bind(user_id)
    .bind(session_id)
    .fetch_optional(&self.pool)
    .await?;

    match order {
      Some(order) => Ok(self.attach_items(vec![order]).await?.pop()),
      None => Ok(None),
    }
  }

  #[instrument(name = "order_store::cancel_stale_pending", skip(self))]
  async fn cancel_stale_pending(&self, cutoff: DateTime<Utc>) -> Result<u64> {
    let cancelled = sqlx::query(
      "UPDATE orders SET status = $1, updated_at = now() \
       WHERE status = $2 AND stripe_session_id IS NULL AND created_at < $3",
    )
    .bind(OrderStatus::Cancelled)
    .bind(OrderStatus::PendingPayment)
    .bind(cutoff)
    .execute(&self.pool)
    .await?
    .rows_affected();
    Ok(cancelled)
  }
}
