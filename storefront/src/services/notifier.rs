// storefront/src/services/notifier.rs

use crate::errors::{AppError, Result};
use async_trait::async_trait;
use serde_json::json;
use std::time::Duration;
use tracing::{info, instrument};
use uuid::Uuid;

/// Outbound customer notifications.
#[async_trait]
pub trait Notifier: Send + Sync {
  async fn send_order_confirmation(&self, to: &str, order_id: Uuid) -> Result<()>;
}

pub fn confirmation_subject(store_name: &str, order_id: Uuid) -> String {
  format!("Your {} order {} is confirmed", store_name, order_id)
}

fn confirmation_html(order_id: Uuid) -> String {
  format!(
    "<h2>Thanks for your purchase!</h2>\
     <p>Your order <strong>{}</strong> has been confirmed. We'll notify you again once it's on the way.</p>\
     <p>Need anything? Just reply to this email.</p>",
    order_id
  )
}

/// Sends email through the Resend HTTP API.
pub struct ResendNotifier {
  client: reqwest::Client,
  api_base: String,
  api_key: String,
  from_address: String,
  store_name: String,
}

impl ResendNotifier {
  pub fn new(
    api_base: impl Into<String>,
    api_key: impl Into<String>,
    from_address: impl Into<String>,
    store_name: impl Into<String>,
    timeout: Duration,
  ) -> Result<Self> {
    Ok(Self {
      client: super::http_client(timeout)?,
      api_base: api_base.into().trim_end_matches('/').to_string(),
      api_key: api_key.into(),
      from_address: from_address.into(),
      store_name: store_name.into(),
    })
  }
}

#[async_trait]
impl Notifier for ResendNotifier {
  #[instrument(name = "notifier::send_order_confirmation", skip(self, to))]
  async fn send_order_confirmation(&self, to: &str, order_id: Uuid) -> Result<()> {
    let response = self
      .client
      .post(format!("{}/emails", self.api_base))
      .bearer_auth(&self.api_key)
      .json(&json!({
        "from": self.from_address,
        "to": [to],
        "subject": confirmation_subject(&self.store_name, order_id),
        "html": confirmation_html(order_id),
      }))
      .send()
      .await?;

    if !response.status().is_success() {
      return Err(AppError::Upstream(format!("Email provider returned {}", response.status())));
    }
    info!("Order confirmation email accepted by provider.");
    Ok(())
  }
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn subject_names_store_and_order() {
    let id = Uuid::nil();
    assert_eq!(
      confirmation_subject("Musika", id),
      "Your Musika order 00000000-0000-0000-0000-000000000000 is confirmed"
    );
    assert!(confirmation_html(id).contains("<strong>00000000-0000-0000-0000-000000000000</strong>"));
  }
}
