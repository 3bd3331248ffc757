// storefront/src/models/cart.rs

use crate::models::order::ShippingAddress;
use serde::{Deserialize, Deserializer};
use serde_json::Value;

/// Body of `POST /api/checkout/session`.
///
/// Every field is defaulted so that absent values reach validation and get
/// the specific message for what is missing. An `items` value that is not an
/// array reads as an empty cart.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CheckoutRequest {
  #[serde(default, deserialize_with = "items_or_empty")]
  pub items: Vec<CartLine>,
  #[serde(default)]
  pub shipping: Option<ShippingForm>,
  #[serde(default)]
  pub customer_email: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CartLine {
  pub product_id: String,
  pub quantity: i64,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct ShippingForm {
  pub first_name: String,
  pub last_name: String,
  pub line1: Option<String>,
  pub line2: Option<String>,
  pub city: Option<String>,
  pub state: Option<String>,
  pub postal_code: Option<String>,
  pub country: Option<String>,
  pub phone: Option<String>,
}

impl ShippingForm {
  pub fn to_address(&self) -> ShippingAddress {
    ShippingAddress {
      full_name: format!("{} {}", self.first_name, self.last_name).trim().to_string(),
      line1: self.line1.clone(),
      line2: self.line2.clone(),
      city: self.city.clone(),
      state: self.state.clone(),
      postal_code: self.postal_code.clone(),
      country: self.country.clone(),
      phone: self.phone.clone(),
    }
  }
}

fn items_or_empty<'de, D>(deserializer: D) -> Result<Vec<CartLine>, D::Error>
where
  D: Deserializer<'de>,
{
  match Value::deserialize(deserializer)? {
    Value::Array(lines) => serde_json::from_value(Value::Array(lines)).map_err(serde::de::Error::custom),
    _ => Ok(Vec::new()),
  }
}

impl CheckoutRequest {
  /// Reads a raw request body. Bodies that are empty or not declared as JSON
  /// count as an empty request.
  pub fn decode(body: &[u8], is_json: bool) -> Result<Self, serde_json::Error> {
    if !is_json || body.iter().all(u8::is_ascii_whitespace) {
      return Ok(Self::default());
    }
    serde_json::from_slice(body)
  }

  /// The customer email, if present and not blank.
  pub fn contact_email(&self) -> Option<&str> {
    self.customer_email.as_deref().map(str::trim).filter(|e| !e.is_empty())
  }
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn full_name_is_trimmed_when_a_part_is_missing() {
    let form = ShippingForm {
      first_name: "Ada".into(),
      ..Default::default()
    };
    assert_eq!(form.to_address().full_name, "Ada");
  }

  #[test]
  fn request_fields_use_camel_case() {
    let req: CheckoutRequest = serde_json::from_str(
      r#"{"items":[{"productId":"prod_123","quantity":2}],
          "shipping":{"firstName":"Ada","lastName":"Lovelace","postalCode":"94107"},
          "customerEmail":"ada@example.com"}"#,
    )
    .unwrap();
    assert_eq!(req.items, vec![CartLine { product_id: "prod_123".into(), quantity: 2 }]);
    let address = req.shipping.as_ref().map(ShippingForm::to_address).unwrap();
    assert_eq!(address.full_name, "Ada Lovelace");
    assert_eq!(address.postal_code.as_deref(), Some("94107"));
    assert_eq!(req.contact_email(), Some("ada@example.com"));
  }

  #[test]
  fn empty_body_deserializes_to_empty_request() {
    let req: CheckoutRequest = serde_json::from_str("{}").unwrap();
    assert!(req.items.is_empty());
    assert!(req.shipping.is_none());
    assert_eq!(req.contact_email(), None);
  }

  #[test]
  fn non_array_items_read_as_empty_cart() {
    for body in [r#"{"items":null}"#, r#"{"items":"vinyl"}"#, r#"{"items":{"productId":"a"}}"#] {
      let req = CheckoutRequest::decode(body.as_bytes(), true).unwrap();
      assert!(req.items.is_empty(), "{}", body);
    }
  }

  #[test]
  fn empty_or_non_json_bodies_decode_to_empty_request() {
    assert!(CheckoutRequest::decode(b"", true).unwrap().items.is_empty());
    let form = br#"{"items":[{"productId":"a","quantity":1}]}"#;
    assert!(CheckoutRequest::decode(form, false).unwrap().items.is_empty());
    assert_eq!(CheckoutRequest::decode(form, true).unwrap().items.len(), 1);
  }

  #[test]
  fn syntactically_broken_json_is_an_error() {
    assert!(CheckoutRequest::decode(b"{ not json", true).is_err());
  }
}
