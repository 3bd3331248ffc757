// storefront/src/web/extractors.rs

use actix_web::dev::Payload;
use actix_web::http::header;
use actix_web::{FromRequest, HttpRequest};
use futures_util::future::{ready, Ready};

/// The `Authorization: Bearer <token>` value, if the request carries one.
///
/// Never fails to extract: a missing or non-bearer header yields `None`, and the
/// saga or handler decides how to reject it.
#[derive(Debug, Clone, Default)]
pub struct BearerToken(pub Option<String>);

impl BearerToken {
  pub fn as_deref(&self) -> Option<&str> {
    self.0.as_deref()
  }

  fn from_header(value: &str) -> Option<String> {
    value
      .strip_prefix("Bearer ")
      .map(str::trim)
      .filter(|token| !token.is_empty())
      .map(String::from)
  }
}

impl FromRequest for BearerToken {
  type Error = actix_web::Error;
  type Future = Ready<Result<Self, Self::Error>>;

  fn from_request(req: &HttpRequest, _payload: &mut Payload) -> Self::Future {
    let token = req
      .headers()
      .get(header::AUTHORIZATION)
      .and_then(|value| value.to_str().ok())
      .and_then(BearerToken::from_header);
    ready(Ok(BearerToken(token)))
  }
}
