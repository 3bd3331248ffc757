// storefront/src/services/identity.rs

use crate::errors::{AppError, Result};
use crate::services::bounded;
use async_trait::async_trait;
use serde::Deserialize;
use std::time::Duration;
use tracing::{instrument, warn};
use uuid::Uuid;

pub const MISSING_TOKEN: &str = "Missing authorization token";
pub const INVALID_SESSION: &str = "Invalid or expired session";

/// Exchanges a bearer token for the id of the user it belongs to.
#[async_trait]
pub trait IdentityVerifier: Send + Sync {
  async fn verify(&self, token: &str) -> Result<Uuid>;
}

/// Verifies tokens against a Supabase auth endpoint.
pub struct SupabaseIdentity {
  client: reqwest::Client,
  base_url: String,
  service_key: String,
}

#[derive(Deserialize)]
struct AuthUser {
  id: String,
}

impl SupabaseIdentity {
  pub fn new(base_url: impl Into<String>, service_key: impl Into<String>, timeout: Duration) -> Result<Self> {
    Ok(Self {
      client: super::http_client(timeout)?,
      base_url: base_url.into(),
      service_key: service_key.into(),
    })
  }
}

#[async_trait]
impl IdentityVerifier for SupabaseIdentity {
  #[instrument(name = "identity::verify", skip_all)]
  async fn verify(&self, token: &str) -> Result<Uuid> {
    let response = self
      .client
      .get(format!("{}/auth/v1/user", self.base_url))
      .header("apikey", &self.service_key)
      .bearer_auth(token)
      .send()
      .await?;

    if !response.status().is_success() {
      warn!(status = %response.status(), "Identity provider rejected token.");
      return Err(AppError::Unauthenticated(INVALID_SESSION.to_string()));
    }
    let user: AuthUser = response
      .json()
      .await
      .map_err(|_| AppError::Unauthenticated(INVALID_SESSION.to_string()))?;
    Uuid::parse_str(&user.id).map_err(|_| AppError::Unauthenticated(INVALID_SESSION.to_string()))
  }
}

/// Resolves the caller of a request: the token must be present and verify.
///
/// Provider failures other than a timeout read as an invalid session.
pub async fn authenticate(identity: &dyn IdentityVerifier, token: Option<&str>, limit: Duration) -> Result<Uuid> {
  let token = token.ok_or_else(|| AppError::Unauthenticated(MISSING_TOKEN.to_string()))?;
  match bounded("Identity verification", limit, identity.verify(token)).await {
    Ok(user_id) => Ok(user_id),
    Err(err @ (AppError::Timeout { .. } | AppError::Unauthenticated(_))) => Err(err),
    Err(other) => {
      warn!(error = %other, "Token verification failed.");
      Err(AppError::Unauthenticated(INVALID_SESSION.to_string()))
    }
  }
}
