// storefront/src/services/payment_gateway.rs

use crate::errors::{AppError, Result};
use async_trait::async_trait;
use serde::Deserialize;
use std::time::Duration;
use tracing::{info, instrument, warn};
use uuid::Uuid;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SessionLineItem {
  pub name: String,
  pub image: Option<String>,
  pub unit_amount: i64,
  pub quantity: i32,
}

/// Everything the gateway needs to open a hosted, one-time payment page.
#[derive(Debug, Clone)]
pub struct SessionRequest {
  pub order_id: Uuid,
  pub user_id: Uuid,
  pub customer_email: String,
  pub currency: String,
  pub success_url: String,
  pub cancel_url: String,
  pub line_items: Vec<SessionLineItem>,
  pub allowed_countries: Vec<String>,
  pub allow_promotion_codes: bool,
  pub automatic_tax: bool,
}

impl SessionRequest {
  /// Form-encoded parameters in the gateway's bracketed key syntax.
  pub fn to_form_params(&self) -> Vec<(String, String)> {
    let mut params: Vec<(String, String)> = vec![
      ("mode".into(), "payment".into()),
      ("customer_email".into(), self.customer_email.clone()),
      ("success_url".into(), self.success_url.clone()),
      ("cancel_url".into(), self.cancel_url.clone()),
      ("metadata[order_id]".into(), self.order_id.to_string()),
      ("metadata[user_id]".into(), self.user_id.to_string()),
      ("automatic_tax[enabled]".into(), self.automatic_tax.to_string()),
      ("allow_promotion_codes".into(), self.allow_promotion_codes.to_string()),
    ];
    for (i, country) in self.allowed_countries.iter().enumerate() {
      params.push((format!("shipping_address_collection[allowed_countries][{}]", i), country.clone()));
    }
    for (i, item) in self.line_items.iter().enumerate() {
      let prefix = format!("line_items[{}]", i);
      params.push((format!("{}[price_data][currency]", prefix), self.currency.clone()));
      params.push((format!("{}[price_data][product_data][name]", prefix), item.name.clone()));
      if let Some(image) = &item.image {
        params.push((format!("{}[price_data][product_data][images][0]", prefix), image.clone()));
      }
      params.push((format!("{}[price_data][unit_amount]", prefix), item.unit_amount.to_string()));
      params.push((format!("{}[quantity]", prefix), item.quantity.to_string()));
    }
    params
  }
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct CheckoutSession {
  pub id: String,
  #[serde(default)]
  pub url: Option<String>,
}

#[async_trait]
pub trait PaymentGateway: Send + Sync {
  async fn create_checkout_session(&self, request: &SessionRequest) -> Result<CheckoutSession>;
}

pub struct StripeGateway {
  client: reqwest::Client,
  api_base: String,
  secret_key: String,
}

#[derive(Deserialize)]
struct StripeErrorBody {
  error: StripeErrorDetail,
}

#[derive(Deserialize)]
struct StripeErrorDetail {
  message: Option<String>,
}

impl StripeGateway {
  pub fn new(api_base: impl Into<String>, secret_key: impl Into<String>, timeout: Duration) -> Result<Self> {
    Ok(Self {
      client: super::http_client(timeout)?,
      api_base: api_base.into().trim_end_matches('/').to_string(),
      secret_key: secret_key.into(),
    })
  }
}

#[async_trait]
impl PaymentGateway for StripeGateway {
  #[instrument(name = "gateway::create_checkout_session", skip_all, fields(order_id = %request.order_id))]
  async fn create_checkout_session(&self, request: &SessionRequest) -> Result<CheckoutSession> {
    let response = self
      .client
      .post(format!("{}/v1/checkout/sessions", self.api_base))
      .bearer_auth(&self.secret_key)
      .form(&request.to_form_params())
      .send()
      .await?;

    let status = response.status();
    if !status.is_success() {
      let message = response
        .json::<StripeErrorBody>()
        .await
        .ok()
        .and_then(|body| body.error.message)
        .unwrap_or_else(|| format!("Payment gateway returned {}", status));
      warn!(%status, %message, "Checkout session creation failed.");
      return Err(AppError::Upstream(message));
    }

    let session: CheckoutSession = response
      .json()
      .await
      .map_err(|e| AppError::Upstream(format!("Unreadable payment gateway response: {}", e)))?;
    info!(session_id = %session.id, "Checkout session created.");
    Ok(session)
  }
}
