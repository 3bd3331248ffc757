// tests/common/mod.rs
#![allow(dead_code)]

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use parking_lot::Mutex;
use serde_json::{json, Value};
use sqlx::types::Json;
use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;
use uuid::Uuid;

use storefront::config::AppConfig;
use storefront::errors::{AppError, Result};
use storefront::models::{Order, OrderItem, OrderItemDetail, OrderStatus, OrderWithItems, Product, ShippingAddress};
use storefront::services::identity::INVALID_SESSION;
use storefront::services::webhook_signature::signature_header;
use storefront::services::{
  Catalog, CheckoutSession, IdentityVerifier, NewOrder, NewOrderItem, Notifier, OrderStore, PaymentGateway,
  SessionRequest, Transition,
};
use storefront::state::{AppState, Collaborators};

pub const TOKEN: &str = "token-ada";
pub const OTHER_TOKEN: &str = "token-grace";
pub const WEBHOOK_SECRET: &str = "whsec_test_secret";

pub fn user_id() -> Uuid {
  Uuid::from_u128(0x0a0a_0000_0000_4000_8000_0000_0000_0001)
}

pub fn other_user_id() -> Uuid {
  Uuid::from_u128(0x0b0b_0000_0000_4000_8000_0000_0000_0002)
}

/// Shared, ordered record of calls across fakes.
pub type Journal = Arc<Mutex<Vec<String>>>;

// ---- Order store ----

#[derive(Default)]
pub struct MemoryOrderStore {
  orders: Mutex<Vec<Order>>,
  items: Mutex<Vec<OrderItem>>,
  journal: Journal,
  pub fail_writes: AtomicBool,
}

impl MemoryOrderStore {
  pub fn new(journal: Journal) -> Self {
    Self {
      journal,
      ..Default::default()
    }
  }

  fn record(&self, entry: &str) {
    self.journal.lock().push(entry.to_string());
  }

  fn check_writable(&self) -> Result<()> {
    if self.fail_writes.load(Ordering::SeqCst) {
      return Err(AppError::Internal("order store offline".to_string()));
    }
    Ok(())
  }

  pub fn order(&self, id: Uuid) -> Option<Order> {
    self.orders.lock().iter().find(|o| o.id == id).cloned()
  }

  pub fn order_count(&self) -> usize {
    self.orders.lock().len()
  }

  pub fn items_for(&self, order_id: Uuid) -> Vec<OrderItem> {
    self.items.lock().iter().filter(|i| i.order_id == order_id).cloned().collect()
  }

  /// Seeds an order directly, bypassing checkout.
  pub fn insert_order(
    &self,
    user_id: Uuid,
    status: OrderStatus,
    session_id: Option<&str>,
    created_at: DateTime<Utc>,
  ) -> Uuid {
    let id = Uuid::new_v4();
    self.orders.lock().push(Order {
      id,
      user_id,
      status,
      amount_subtotal: 5000,
      amount_total: 6399,
      currency: "usd".to_string(),
      shipping_address: Some(Json(ShippingAddress {
        full_name: "Ada Lovelace".to_string(),
        ..Default::default()
      })),
      stripe_session_id: session_id.map(String::from),
      payment_intent: None,
      tracking_number: None,
      created_at,
      updated_at: created_at,
    });
    self.items.lock().push(OrderItem {
      id: Uuid::new_v4(),
      order_id: id,
      product_id: "vinyl".to_string(),
      quantity: 2,
      unit_price: 2500,
    });
    id
  }

  fn with_items(&self, order: Order) -> OrderWithItems {
    let items = self
      .items_for(order.id)
      .into_iter()
      .map(|item| OrderItemDetail { item, product: None })
      .collect();
    OrderWithItems { order, items }
  }

  fn transition(&self, order_id: Uuid, target: OrderStatus, apply: impl FnOnce(&mut Order)) -> Transition {
    let mut orders = self.orders.lock();
    match orders.iter_mut().find(|o| o.id == order_id) {
      Some(order) if order.status == OrderStatus::PendingPayment => {
        order.status = target;
        order.updated_at = Utc::now();
        apply(order);
        Transition::Applied
      }
      Some(order) => Transition::not_applied(Some(order.status), target),
      None => Transition::NotFound,
    }
  }
}

#[async_trait]
impl OrderStore for MemoryOrderStore {
  async fn create_order(&self, order: NewOrder, items: Vec<NewOrderItem>) -> Result<Uuid> {
    self.check_writable()?;
    self.record("create_order");
    let id = Uuid::new_v4();
    let now = Utc::now();
    self.orders.lock().push(Order {
      id,
      user_id: order.user_id,
      status: OrderStatus::PendingPayment,
      amount_subtotal: order.amount_subtotal,
      amount_total: order.amount_total,
      currency: order.currency,
      shipping_address: Some(Json(order.shipping_address)),
      stripe_session_id: None,
      payment_intent: None,
      tracking_number: None,
      created_at: now,
      updated_at: now,
    });
    self.items.lock().extend(items.into_iter().map(|item| OrderItem {
      id: Uuid::new_v4(),
      order_id: id,
      product_id: item.product_id,
      quantity: item.quantity,
      unit_price: item.unit_price,
    }));
    Ok(id)
  }

  async fn attach_payment_session(&self, order_id: Uuid, session_id: &str) -> Result<()> {
    self.check_writable()?;
    self.record("attach_payment_session");
    if let Some(order) = self.orders.lock().iter_mut().find(|o| o.id == order_id) {
      order.stripe_session_id = Some(session_id.to_string());
      order.updated_at = Utc::now();
    }
    Ok(())
  }

  async fn mark_paid(&self, order_id: Uuid, payment_intent: Option<&str>, session_id: Option<&str>) -> Result<Transition> {
    self.check_writable()?;
    self.record("mark_paid");
    Ok(self.transition(order_id, OrderStatus::Paid, |order| {
      if let Some(intent) = payment_intent {
        order.payment_intent = Some(intent.to_string());
      }
      if let Some(session_id) = session_id {
        order.stripe_session_id = Some(session_id.to_string());
      }
    }))
  }

  async fn mark_cancelled(&self, order_id: Uuid) -> Result<Transition> {
    self.check_writable()?;
    self.record("mark_cancelled");
    Ok(self.transition(order_id, OrderStatus::Cancelled, |_| {}))
  }

  async fn find_order_id_by_session(&self, session_id: &str) -> Result<Option<Uuid>> {
    Ok(
      self
        .orders
        .lock()
        .iter()
        .find(|o| o.stripe_session_id.as_deref() == Some(session_id))
        .map(|o| o.id),
    )
  }

  async fn list_orders_for_user(&self, user_id: Uuid) -> Result<Vec<OrderWithItems>> {
    let mut orders: Vec<Order> = self.orders.lock().iter().filter(|o| o.user_id == user_id).cloned().collect();
    orders.sort_by(|a, b| b.created_at.cmp(&a.created_at));
    Ok(orders.into_iter().map(|o| self.with_items(o)).collect())
  }

  async fn find_order_by_session(&self, user_id: Uuid, session_id: &str) -> Result<Option<OrderWithItems>> {
    let order = self
      .orders
      .lock()
      .iter()
      .find(|o| o.user_id == user_id && o.stripe_session_id.as_deref() == Some(session_id))
      .cloned();
    Ok(order.map(|o| self.with_items(o)))
  }

  async fn cancel_stale_pending(&self, cutoff: DateTime<Utc>) -> Result<u64> {
    self.check_writable()?;
    let mut cancelled = 0;
    for order in self.orders.lock().iter_mut() {
      if order.status == OrderStatus::PendingPayment && order.stripe_session_id.is_none() && order.created_at < cutoff {
        order.status = OrderStatus::Cancelled;
        order.updated_at = Utc::now();
        cancelled += 1;
      }
    }
    Ok(cancelled)
  }
}

// ---- Catalog ----

pub struct StaticCatalog {
  products: Vec<Product>,
}

impl StaticCatalog {
  pub fn new(products: Vec<Product>) -> Self {
    Self { products }
  }
}

#[async_trait]
impl Catalog for StaticCatalog {
  async fn find_products(&self, ids: &[String]) -> Result<Vec<Product>> {
    Ok(self.products.iter().filter(|p| ids.contains(&p.id)).cloned().collect())
  }
}

pub fn product(id: &str, name: &str, price: f64, stock: i32) -> Product {
  Product {
    id: id.to_string(),
    name: name.to_string(),
    description: None,
    price,
    image: Some(format!("https://cdn.example.com/{}.png", id)),
    category: Some("music".to_string()),
    stock,
  }
}

pub fn default_products() -> Vec<Product> {
  vec![
    product("vinyl", "Vinyl", 25.0, 10),
    product("poster", "Poster", 12.5, 2),
    product("turntable", "Turntable", 150.0, 3),
  ]
}

// ---- Identity ----

pub struct FakeIdentity {
  users: HashMap<String, Uuid>,
}

impl Default for FakeIdentity {
  fn default() -> Self {
    let users = HashMap::from([(TOKEN.to_string(), user_id()), (OTHER_TOKEN.to_string(), other_user_id())]);
    Self { users }
  }
}

#[async_trait]
impl IdentityVerifier for FakeIdentity {
  async fn verify(&self, token: &str) -> Result<Uuid> {
    self
      .users
      .get(token)
      .copied()
      .ok_or_else(|| AppError::Unauthenticated(INVALID_SESSION.to_string()))
  }
}

// ---- Payment gateway ----

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum GatewayMode {
  Succeed,
  Fail(String),
  Hang,
}

pub struct FakeGateway {
  journal: Journal,
  pub mode: Mutex<GatewayMode>,
  pub requests: Mutex<Vec<SessionRequest>>,
}

impl FakeGateway {
  pub fn new(journal: Journal) -> Self {
    Self {
      journal,
      mode: Mutex::new(GatewayMode::Succeed),
      requests: Mutex::new(Vec::new()),
    }
  }

  pub fn set_mode(&self, mode: GatewayMode) {
    *self.mode.lock() = mode;
  }
}

#[async_trait]
impl PaymentGateway for FakeGateway {
  async fn create_checkout_session(&self, request: &SessionRequest) -> Result<CheckoutSession> {
    self.journal.lock().push("create_checkout_session".to_string());
    let count = {
      let mut requests = self.requests.lock();
      requests.push(request.clone());
      requests.len()
    };
    let mode = self.mode.lock().clone();
    match mode {
      GatewayMode::Succeed => Ok(CheckoutSession {
        id: format!("cs_test_{}", count),
        url: Some(format!("https://checkout.example.com/pay/cs_test_{}", count)),
      }),
      GatewayMode::Fail(message) => Err(AppError::Upstream(message)),
      GatewayMode::Hang => {
        tokio::time::sleep(Duration::from_secs(3600)).await;
        Err(AppError::Upstream("gateway never answered".to_string()))
      }
    }
  }
}

// ---- Notifier ----

#[derive(Default)]
pub struct RecordingNotifier {
  pub sent: Mutex<Vec<(String, Uuid)>>,
  pub fail: AtomicBool,
}

#[async_trait]
impl Notifier for RecordingNotifier {
  async fn send_order_confirmation(&self, to: &str, order_id: Uuid) -> Result<()> {
    if self.fail.load(Ordering::SeqCst) {
      return Err(AppError::Upstream("email provider unavailable".to_string()));
    }
    self.sent.lock().push((to.to_string(), order_id));
    Ok(())
  }
}

// ---- Harness ----

pub fn test_config(extra: &[(&str, &str)]) -> AppConfig {
  let mut values: HashMap<String, String> = [
    ("STRIPE_SECRET_KEY", "sk_test_123"),
    ("STRIPE_WEBHOOK_SECRET", WEBHOOK_SECRET),
    ("SUPABASE_URL", "https://identity.example.com"),
    ("SUPABASE_SERVICE_ROLE_KEY", "service-role"),
    ("DATABASE_URL", "postgres://localhost/storefront_test"),
    ("APP_URL", "https://shop.example.com"),
  ]
  .iter()
  .map(|(k, v)| (k.to_string(), v.to_string()))
  .collect();
  values.extend(extra.iter().map(|(k, v)| (k.to_string(), v.to_string())));
  AppConfig::from_lookup(move |name| values.get(name).cloned()).expect("test config")
}

pub struct Harness {
  pub state: AppState,
  pub store: Arc<MemoryOrderStore>,
  pub gateway: Arc<FakeGateway>,
  pub notifier: Arc<RecordingNotifier>,
  pub journal: Journal,
}

impl Harness {
  pub fn new() -> Self {
    Self::build(&[], true)
  }

  pub fn with_config(extra: &[(&str, &str)]) -> Self {
    Self::build(extra, true)
  }

  pub fn without_notifier() -> Self {
    Self::build(&[], false)
  }

  fn build(extra: &[(&str, &str)], with_notifier: bool) -> Self {
    let journal: Journal = Arc::new(Mutex::new(Vec::new()));
    let store = Arc::new(MemoryOrderStore::new(journal.clone()));
    let gateway = Arc::new(FakeGateway::new(journal.clone()));
    let notifier = Arc::new(RecordingNotifier::default());

    let collaborators = Collaborators {
      orders: store.clone(),
      catalog: Arc::new(StaticCatalog::new(default_products())),
      identity: Arc::new(FakeIdentity::default()),
      gateway: gateway.clone(),
      notifier: with_notifier.then(|| notifier.clone() as Arc<dyn Notifier>),
    };
    let state = AppState::new(Arc::new(test_config(extra)), collaborators);
    Self {
      state,
      store,
      gateway,
      notifier,
      journal,
    }
  }

  pub fn journal(&self) -> Vec<String> {
    self.journal.lock().clone()
  }

  pub fn emails_sent(&self) -> usize {
    self.notifier.sent.lock().len()
  }
}

/// Builds the actix test service for a harness.
macro_rules! test_app {
  ($harness:expr) => {
    actix_web::test::init_service(
      actix_web::App::new()
        .app_data(actix_web::web::Data::new($harness.state.clone()))
        .configure(storefront::web::configure_app_routes),
    )
    .await
  };
}

// ---- Request bodies ----

pub fn checkout_body(items: Value) -> Value {
  json!({
    "items": items,
    "shipping": {
      "firstName": "Ada",
      "lastName": "Lovelace",
      "line1": "12 Analytical Way",
      "city": "London",
      "state": "LDN",
      "postalCode": "N1 9GU",
      "country": "GB",
      "phone": "+44 20 0000 0000"
    },
    "customerEmail": "ada@example.com"
  })
}

pub fn gateway_event(event_type: &str, object: Value) -> Vec<u8> {
  serde_json::to_vec(&json!({
    "id": "evt_test_1",
    "object": "event",
    "type": event_type,
    "data": { "object": object }
  }))
  .expect("event json")
}

pub fn session_object(session_id: &str, order_id: Option<Uuid>) -> Value {
  let metadata = match order_id {
    Some(id) => json!({ "order_id": id.to_string(), "user_id": user_id().to_string() }),
    None => json!({}),
  };
  json!({
    "id": session_id,
    "object": "checkout.session",
    "payment_intent": "pi_test_123",
    "customer_email": "fallback@example.com",
    "customer_details": { "email": "buyer@example.com" },
    "metadata": metadata
  })
}

pub fn sign(payload: &[u8]) -> String {
  signature_header(WEBHOOK_SECRET, Utc::now().timestamp(), payload).expect("signature")
}
