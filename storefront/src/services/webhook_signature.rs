// storefront/src/services/webhook_signature.rs

//! Gateway webhook signatures: header `t=<unix seconds>,v1=<hex hmac>[,v1=...]`,
//! HMAC-SHA256 keyed by the signing secret over `"<t>." + raw body`.

use hmac::{Hmac, Mac};
use sha2::Sha256;
use std::time::Duration;
use thiserror::Error;

type HmacSha256 = Hmac<Sha256>;

pub const SIGNATURE_HEADER: &str = "stripe-signature";

#[derive(Debug, Error, PartialEq, Eq)]
pub enum SignatureError {
  #[error("Unable to extract timestamp and signatures from header")]
  MalformedHeader,

  #[error("Timestamp outside the tolerance zone")]
  OutsideTolerance,

  #[error("No signatures found matching the expected signature for payload")]
  NoMatch,

  #[error("Invalid signing secret")]
  InvalidSecret,
}

fn mac_for(secret: &str, timestamp: i64, payload: &[u8]) -> Result<HmacSha256, SignatureError> {
  let mut mac = HmacSha256::new_from_slice(secret.as_bytes()).map_err(|_| SignatureError::InvalidSecret)?;
  mac.update(timestamp.to_string().as_bytes());
  mac.update(b".");
  mac.update(payload);
  Ok(mac)
}

/// Checks `header` against `payload`. `now` is unix seconds.
///
/// Any one matching `v1` entry is enough; comparison is constant time.
pub fn verify_signature(
  secret: &str,
  header: &str,
  payload: &[u8],
  tolerance: Duration,
  now: i64,
) -> Result<(), SignatureError> {
  let mut timestamp = None;
  let mut candidates = Vec::new();
  for part in header.split(',') {
    match part.trim().split_once('=') {
      Some(("t", value)) => timestamp = value.parse::<i64>().ok(),
      Some(("v1", value)) => candidates.push(value),
      _ => {}
    }
  }
  let timestamp = timestamp.ok_or(SignatureError::MalformedHeader)?;
  if candidates.is_empty() {
    return Err(SignatureError::MalformedHeader);
  }

  let mac = mac_for(secret, timestamp, payload)?;
  let matched = candidates
    .iter()
    .filter_map(|candidate| hex::decode(candidate).ok())
    .any(|bytes| mac.clone().verify_slice(&bytes).is_ok());
  if !matched {
    return Err(SignatureError::NoMatch);
  }

  if now.abs_diff(timestamp) > tolerance.as_secs() {
    return Err(SignatureError::OutsideTolerance);
  }
  Ok(())
}

/// Builds a header the way the gateway does. Used to sign test deliveries.
pub fn signature_header(secret: &str, timestamp: i64, payload: &[u8]) -> Result<String, SignatureError> {
  let digest = mac_for(secret, timestamp, payload)?.finalize().into_bytes();
  Ok(format!("t={},v1={}", timestamp, hex::encode(digest)))
}
