// storefront/src/services/gateway_events.rs

//! Typed view of verified gateway webhook payloads.

use serde::Deserialize;
use std::collections::HashMap;
use uuid::Uuid;

pub const CHECKOUT_COMPLETED: &str = "checkout.session.completed";
pub const ASYNC_PAYMENT_FAILED: &str = "checkout.session.async_payment_failed";

/// The events the reconciler acts on. Everything else decodes to `Unhandled`.
#[derive(Debug, Clone, PartialEq)]
pub enum GatewayEvent {
  CheckoutCompleted(SessionSnapshot),
  AsyncPaymentFailed(SessionSnapshot),
  Unhandled { event_type: String },
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(untagged)]
pub enum PaymentIntentRef {
  Id(String),
  Expanded { id: String },
}

#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
pub struct CustomerDetails {
  #[serde(default)]
  pub email: Option<String>,
}

/// The parts of a checkout session the reconciler reads.
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
pub struct SessionSnapshot {
  /// Empty when the payload omits it.
  #[serde(default)]
  pub id: String,
  #[serde(default)]
  pub payment_intent: Option<PaymentIntentRef>,
  #[serde(default)]
  pub customer_email: Option<String>,
  #[serde(default)]
  pub customer_details: Option<CustomerDetails>,
  #[serde(default)]
  pub metadata: Option<HashMap<String, String>>,
}

#[derive(Deserialize)]
struct RawEvent {
  #[serde(rename = "type")]
  event_type: String,
  data: RawEventData,
}

#[derive(Deserialize)]
struct RawEventData {
  object: serde_json::Value,
}

impl GatewayEvent {
  pub fn decode(payload: &[u8]) -> Result<Self, serde_json::Error> {
    let raw: RawEvent = serde_json::from_slice(payload)?;
    match raw.event_type.as_str() {
      CHECKOUT_COMPLETED => Ok(GatewayEvent::CheckoutCompleted(serde_json::from_value(raw.data.object)?)),
      ASYNC_PAYMENT_FAILED => Ok(GatewayEvent::AsyncPaymentFailed(serde_json::from_value(raw.data.object)?)),
      _ => Ok(GatewayEvent::Unhandled {
        event_type: raw.event_type,
      }),
    }
  }

  pub fn event_type(&self) -> &str {
    match self {
      GatewayEvent::CheckoutCompleted(_) => CHECKOUT_COMPLETED,
      GatewayEvent::AsyncPaymentFailed(_) => ASYNC_PAYMENT_FAILED,
      GatewayEvent::Unhandled { event_type } => event_type,
    }
  }

  pub fn session(&self) -> Option<&SessionSnapshot> {
    match self {
      GatewayEvent::CheckoutCompleted(session) | GatewayEvent::AsyncPaymentFailed(session) => Some(session),
      GatewayEvent::Unhandled { .. } => None,
    }
  }
}

impl SessionSnapshot {
  /// Order id carried in the session metadata, when present and well formed.
  pub fn order_id(&self) -> Option<Uuid> {
    self
      .metadata
      .as_ref()
      .and_then(|m| m.get("order_id"))
      .and_then(|id| Uuid::parse_str(id.trim()).ok())
  }

  pub fn session_id(&self) -> Option<&str> {
    Some(self.id.trim()).filter(|id| !id.is_empty())
  }

  pub fn payment_intent_id(&self) -> Option<&str> {
    match self.payment_intent.as_ref()? {
      PaymentIntentRef::Id(id) | PaymentIntentRef::Expanded { id } => Some(id.as_str()),
    }
  }

  /// Detailed customer contact first, then the plain email field.
  pub fn contact_email(&self) -> Option<&str> {
    self
      .customer_details
      .as_ref()
      .and_then(|d| d.email.as_deref())
      .or(self.customer_email.as_deref())
      .map(str::trim)
      .filter(|e| !e.is_empty())
  }
}

#[cfg(test)]
mod tests {
  use super::*;
  use serde_json::json;

  fn payload(event_type: &str, object: serde_json::Value) -> Vec<u8> {
    serde_json::to_vec(&json!({ "id": "evt_1", "type": event_type, "data": { "object": object } })).unwrap()
  }

  #[test]
  fn completed_event_exposes_session_fields() {
    let order_id = Uuid::new_v4();
    let body = payload(
      CHECKOUT_COMPLETED,
      json!({
        "id": "cs_test_123",
        "payment_intent": "pi_123",
        "customer_email": "fallback@example.com",
        "customer_details": { "email": "buyer@example.com" },
        "metadata": { "order_id": order_id.to_string(), "user_id": "u" }
      }),
    );
    let event = GatewayEvent::decode(&body).unwrap();
    let session = match &event {
      GatewayEvent::CheckoutCompleted(s) => s,
      other => panic!("unexpected {:?}", other),
    };
    assert_eq!(session.id, "cs_test_123");
    assert_eq!(session.order_id(), Some(order_id));
    assert_eq!(session.payment_intent_id(), Some("pi_123"));
    assert_eq!(session.contact_email(), Some("buyer@example.com"));
  }

  #[test]
  fn expanded_payment_intent_and_email_fallback() {
    let body = payload(
      ASYNC_PAYMENT_FAILED,
      json!({
        "id": "cs_2",
        "payment_intent": { "id": "pi_expanded", "object": "payment_intent" },
        "customer_email": "fallback@example.com",
        "customer_details": { "email": null },
        "metadata": null
      }),
    );
    let event = GatewayEvent::decode(&body).unwrap();
    let session = event.session().unwrap();
    assert_eq!(session.payment_intent_id(), Some("pi_expanded"));
    assert_eq!(session.contact_email(), Some("fallback@example.com"));
    assert_eq!(session.order_id(), None);
  }

  #[test]
  fn session_without_id_still_decodes() {
    let order_id = Uuid::new_v4();
    let body = payload(CHECKOUT_COMPLETED, json!({ "metadata": { "order_id": order_id.to_string() } }));
    let session = GatewayEvent::decode(&body).unwrap().session().cloned().unwrap();
    assert_eq!(session.session_id(), None);
    assert_eq!(session.order_id(), Some(order_id));
  }

  #[test]
  fn unknown_types_decode_without_session_shape() {
    let body = payload("invoice.paid", json!({ "anything": true }));
    assert_eq!(
      GatewayEvent::decode(&body).unwrap(),
      GatewayEvent::Unhandled {
        event_type: "invoice.paid".into()
      }
    );
  }

  #[test]
  fn malformed_body_is_an_error() {
    assert!(GatewayEvent::decode(b"not json").is_err());
  }
}
