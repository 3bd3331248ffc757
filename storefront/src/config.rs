// storefront/src/config.rs

use crate::errors::{AppError, Result};
use dotenvy::dotenv;
use std::fmt;
use std::time::Duration;

const DEFAULT_APP_URL: &str = "http://localhost:5173";
const DEFAULT_STRIPE_API_BASE: &str = "https://api.stripe.com";
const DEFAULT_RESEND_API_BASE: &str = "https://api.resend.com";

/// Credentials for the transactional email provider. Both halves must be present.
#[derive(Clone)]
pub struct EmailConfig {
  pub api_key: String,
  pub from_address: String,
}

#[derive(Clone)]
pub struct AppConfig {
  pub server_host: String,
  pub server_port: u16,
  pub database_url: String,
  /// Public base URL of the storefront, used for payment redirect URLs.
  pub app_base_url: String,
  pub cors_origins: Vec<String>,

  pub stripe_secret_key: String,
  pub stripe_webhook_secret: String,
  pub stripe_api_base: String,
  pub webhook_tolerance: Duration,

  pub identity_url: String,
  pub identity_service_key: String,

  pub email: Option<EmailConfig>,
  pub resend_api_base: String,
  /// Brand name used in customer emails.
  pub store_name: String,

  pub currency: String,
  pub allowed_shipping_countries: Vec<String>,
  pub external_call_timeout: Duration,
  pub stale_order_after: Duration,
  /// `None` disables the sweeper.
  pub stale_order_sweep_every: Option<Duration>,
}

impl AppConfig {
  pub fn from_env() -> Result<Self> {
    dotenv().ok();
    Self::from_lookup(|name| std::env::var(name).ok())
  }

  /// Builds the configuration from any key lookup. Empty values count as absent.
  pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self> {
    let get_env = |names: &[&str]| {
      names
        .iter()
        .find_map(|name| lookup(name).map(|v| v.trim().to_string()).filter(|v| !v.is_empty()))
    };
    let require = |names: &[&str]| {
      get_env(names).ok_or_else(|| AppError::Config(format!("Missing environment variable '{}'", names.join("' or '"))))
    };

    let stripe_secret_key = require(&["STRIPE_SECRET_KEY"])?;
    let stripe_webhook_secret = require(&["STRIPE_WEBHOOK_SECRET"])?;
    let identity_url = require(&["VITE_SUPABASE_URL", "SUPABASE_URL", "IDENTITY_PROVIDER_URL"])?;
    let identity_service_key = require(&["SUPABASE_SERVICE_ROLE_KEY", "IDENTITY_SERVICE_KEY"])?;
    let database_url = require(&["DATABASE_URL"])?;

    let email = match (get_env(&["RESEND_API_KEY"]), get_env(&["RESEND_FROM_EMAIL"])) {
      (Some(api_key), Some(from_address)) => Some(EmailConfig { api_key, from_address }),
      _ => {
        tracing::warn!("RESEND_API_KEY or RESEND_FROM_EMAIL missing. Confirmation emails will be skipped.");
        None
      }
    };

    let app_base_url = get_env(&["VITE_APP_URL", "APP_URL"])
      .unwrap_or_else(|| DEFAULT_APP_URL.to_string())
      .trim_end_matches('/')
      .to_string();
    let cors_origins = match get_env(&["CLIENT_URL"]) {
      Some(list) => split_list(&list),
      None => vec![app_base_url.clone()],
    };

    let server_host = get_env(&["SERVER_HOST"]).unwrap_or_else(|| "0.0.0.0".to_string());
    let server_port = parse_or(get_env(&["PORT"]), "PORT", 4000u16)?;

    let currency = get_env(&["CURRENCY"]).unwrap_or_else(|| "usd".to_string()).to_lowercase();
    let allowed_shipping_countries = split_list(&get_env(&["ALLOWED_SHIPPING_COUNTRIES"]).unwrap_or_else(|| "US,CA".to_string()))
      .into_iter()
      .map(|c| c.to_uppercase())
      .collect();

    let external_call_timeout =
      Duration::from_secs(parse_or(get_env(&["EXTERNAL_CALL_TIMEOUT_SECS"]), "EXTERNAL_CALL_TIMEOUT_SECS", 15u64)?);
    let webhook_tolerance =
      Duration::from_secs(parse_or(get_env(&["WEBHOOK_TOLERANCE_SECS"]), "WEBHOOK_TOLERANCE_SECS", 300u64)?);
    let stale_order_after =
      Duration::from_secs(60 * parse_or(get_env(&["STALE_ORDER_AFTER_MINUTES"]), "STALE_ORDER_AFTER_MINUTES", 60u64)?);
    let sweep_secs = parse_or(get_env(&["STALE_ORDER_SWEEP_SECS"]), "STALE_ORDER_SWEEP_SECS", 300u64)?;
    let stale_order_sweep_every = (sweep_secs > 0).then(|| Duration::from_secs(sweep_secs));

    let config = Self {
      server_host,
      server_port,
      database_url,
      app_base_url,
      cors_origins,
      stripe_secret_key,
      stripe_webhook_secret,
      stripe_api_base: get_env(&["STRIPE_API_BASE"]).unwrap_or_else(|| DEFAULT_STRIPE_API_BASE.to_string()),
      webhook_tolerance,
      identity_url: identity_url.trim_end_matches('/').to_string(),
      identity_service_key,
      email,
      resend_api_base: get_env(&["RESEND_API_BASE"]).unwrap_or_else(|| DEFAULT_RESEND_API_BASE.to_string()),
      store_name: get_env(&["STORE_NAME"]).unwrap_or_else(|| "Musika".to_string()),
      currency,
      allowed_shipping_countries,
      external_call_timeout,
      stale_order_after,
      stale_order_sweep_every,
    };
    tracing::info!(config = ?config, "Application configuration loaded successfully.");
    Ok(config)
  }

  pub fn success_url(&self) -> String {
    format!("{}/order-confirmation?session_id={{CHECKOUT_SESSION_ID}}", self.app_base_url)
  }

  pub fn cancel_url(&self) -> String {
    format!("{}/cart", self.app_base_url)
  }
}

fn split_list(raw: &str) -> Vec<String> {
  raw
    .split(',')
    .map(str::trim)
    .filter(|s| !s.is_empty())
    .map(String::from)
    .collect()
}

fn parse_or<T: std::str::FromStr>(raw: Option<String>, name: &str, default: T) -> Result<T>
where
  T::Err: fmt::Display,
{
  match raw {
    None => Ok(default),
    Some(value) => value
      .parse::<T>()
      .map_err(|e| AppError::Config(format!("Invalid {}: {}", name, e))),
  }
}

// Secrets are shown only as present/absent.
impl fmt::Debug for AppConfig {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    f.debug_struct("AppConfig")
      .field("server_host", &self.server_host)
      .field("server_port", &self.server_port)
      .field("database_url", &"[REDACTED]")
      .field("app_base_url", &self.app_base_url)
      .field("cors_origins", &self.cors_origins)
      .field("stripe_secret_key", &"[REDACTED]")
      .field("stripe_webhook_secret", &"[REDACTED]")
      .field("stripe_api_base", &self.stripe_api_base)
      .field("webhook_tolerance", &self.webhook_tolerance)
      .field("identity_url", &self.identity_url)
      .field("identity_service_key", &"[REDACTED]")
      .field("email_enabled", &self.email.is_some())
      .field("store_name", &self.store_name)
      .field("currency", &self.currency)
      .field("allowed_shipping_countries", &self.allowed_shipping_countries)
      .field("external_call_timeout", &self.external_call_timeout)
      .field("stale_order_after", &self.stale_order_after)
      .field("stale_order_sweep_every", &self.stale_order_sweep_every)
      .finish()
  }
}

impl fmt::Debug for EmailConfig {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    f.debug_struct("EmailConfig")
      .field("api_key", &"[REDACTED]")
      .field("from_address", &self.from_address)
      .finish()
  }
}
