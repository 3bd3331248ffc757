// storefront/src/pipelines/contexts.rs

//! Data threaded through each saga run. Handlers wrap these in `saga::StepContext`.

use crate::models::{CheckoutRequest, Product};
use crate::pricing::{PriceBreakdown, PricedLine};
use crate::services::{GatewayEvent, Transition};
use crate::state::AppState;
use actix_web::web::Bytes;
use std::collections::HashMap;
use uuid::Uuid;

#[derive(Clone)]
pub struct CheckoutCtxData {
  pub app_state: AppState,
  pub bearer_token: Option<String>,
  /// Request body as received. Decoded only after the caller is authenticated.
  pub raw_body: Bytes,
  pub json_body: bool,

  pub user_id: Option<Uuid>,
  pub request: CheckoutRequest,
  pub products: HashMap<String, Product>,
  pub priced_lines: Vec<PricedLine>,
  pub pricing: Option<PriceBreakdown>,
  pub order_id: Option<Uuid>,
  pub session_id: Option<String>,
}

impl CheckoutCtxData {
  pub fn new(app_state: AppState, bearer_token: Option<String>, raw_body: Bytes, json_body: bool) -> Self {
    Self {
      app_state,
      bearer_token,
      raw_body,
      json_body,
      user_id: None,
      request: CheckoutRequest::default(),
      products: HashMap::new(),
      priced_lines: Vec::new(),
      pricing: None,
      order_id: None,
      session_id: None,
    }
  }
}

#[derive(Clone)]
pub struct WebhookCtxData {
  pub app_state: AppState,
  /// Exact request bytes; the signature covers these.
  pub raw_payload: Bytes,
  pub signature_header: Option<String>,

  pub event: Option<GatewayEvent>,
  pub order_id: Option<Uuid>,
  pub transition: Option<Transition>,
  pub confirmation_email_sent: bool,
}

impl WebhookCtxData {
  pub fn new(app_state: AppState, raw_payload: Bytes, signature_header: Option<String>) -> Self {
    Self {
      app_state,
      raw_payload,
      signature_header,
      event: None,
      order_id: None,
      transition: None,
      confirmation_email_sent: false,
    }
  }
}
