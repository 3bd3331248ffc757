// storefront/src/errors.rs

use actix_web::http::StatusCode;
use actix_web::{HttpResponse, ResponseError};
use saga::SagaError;
use serde_json::json;
use thiserror::Error;

pub const WEBHOOK_FAILURE_MESSAGE: &str = "Webhook handler failed";
pub const CHECKOUT_FALLBACK_MESSAGE: &str = "Unable to start checkout";

#[derive(Debug, Error)]
pub enum AppError {
  #[error("{0}")]
  Unauthenticated(String),

  #[error("{0}")]
  Validation(String),

  #[error("{0}")]
  NotFound(String),

  /// A collaborator (identity provider, catalog, payment gateway) refused or failed.
  #[error("{0}")]
  Upstream(String),

  #[error("{operation} timed out, please retry")]
  Timeout { operation: String },

  #[error("Database Error: {0}")]
  Sqlx(#[from] sqlx::Error),

  #[error("Saga Error: {0}")]
  Saga(SagaError),

  /// Missing or invalid webhook signature.
  #[error("{0}")]
  WebhookRejected(String),

  /// Failure while applying a verified webhook event.
  #[error("Webhook processing failed: {0}")]
  WebhookProcessing(String),

  #[error("Configuration Error: {0}")]
  Config(String),

  #[error("Internal Server Error: {0}")]
  Internal(String),
}

impl AppError {
  pub fn is_retryable(&self) -> bool {
    matches!(self, AppError::Timeout { .. })
  }
}

impl From<SagaError> for AppError {
  fn from(err: SagaError) -> Self {
    match err {
      SagaError::StepTimedOut { step_name, .. } => AppError::Timeout { operation: step_name },
      SagaError::HandlerError { source } => match source.downcast::<AppError>() {
        Ok(app_err) => app_err,
        Err(other) => AppError::Internal(other.to_string()),
      },
      other => AppError::Saga(other),
    }
  }
}

impl From<anyhow::Error> for AppError {
  fn from(err: anyhow::Error) -> Self {
    match err.downcast::<AppError>() {
      Ok(app_err) => app_err,
      Err(err) => match err.downcast::<sqlx::Error>() {
        Ok(sqlx_err) => AppError::Sqlx(sqlx_err),
        Err(other) => AppError::Internal(other.to_string()),
      },
    }
  }
}

impl From<reqwest::Error> for AppError {
  fn from(err: reqwest::Error) -> Self {
    if err.is_timeout() {
      AppError::Timeout {
        operation: "External request".to_string(),
      }
    } else {
      AppError::Upstream(err.to_string())
    }
  }
}

impl ResponseError for AppError {
  fn status_code(&self) -> StatusCode {
    match self {
      AppError::NotFound(_) => StatusCode::NOT_FOUND,
      AppError::WebhookProcessing(_) | AppError::Config(_) | AppError::Internal(_) => {
        StatusCode::INTERNAL_SERVER_ERROR
      }
      _ => StatusCode::BAD_REQUEST,
    }
  }

  fn error_response(&self) -> HttpResponse {
    tracing::error!(application_error = %self, "Responding with error");
    let status = self.status_code();
    match self {
      AppError::WebhookRejected(m) => HttpResponse::build(status).content_type("text/plain").body(m.clone()),
      AppError::WebhookProcessing(_) => HttpResponse::build(status)
        .content_type("text/plain")
        .body(WEBHOOK_FAILURE_MESSAGE),
      // Database details stay in the logs.
      AppError::Sqlx(_) => HttpResponse::build(status).json(json!({ "message": CHECKOUT_FALLBACK_MESSAGE })),
      AppError::Config(_) => HttpResponse::build(status).json(json!({ "message": "Server misconfigured" })),
      other => HttpResponse::build(status).json(json!({ "message": other.to_string() })),
    }
  }
}

pub type Result<T, E = AppError> = std::result::Result<T, E>;

#[cfg(test)]
mod tests {
  use super::*;
  use actix_web::body::to_bytes;
  use std::time::Duration;

  async fn body_of(err: AppError) -> (StatusCode, String) {
    let resp = err.error_response();
    let status = resp.status();
    let bytes = to_bytes(resp.into_body()).await.unwrap_or_default();
    (status, String::from_utf8_lossy(&bytes).into_owned())
  }

  #[actix_rt::test]
  async fn client_errors_render_message_json() {
    let (status, body) = body_of(AppError::Validation("Cart items are required".into())).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body, r#"{"message":"Cart items are required"}"#);
  }

  #[actix_rt::test]
  async fn webhook_errors_render_plain_text() {
    let (status, body) = body_of(AppError::WebhookRejected("Missing Stripe signature".into())).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body, "Missing Stripe signature");

    let (status, body) = body_of(AppError::WebhookProcessing("db down".into())).await;
    assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
    assert_eq!(body, "Webhook handler failed");
  }

  #[test]
  fn step_timeouts_become_retryable_timeouts() {
    let err = AppError::from(SagaError::StepTimedOut {
      step_name: "request_payment_session".into(),
      timeout: Duration::from_secs(15),
    });
    assert!(err.is_retryable());
    assert_eq!(err.to_string(), "request_payment_session timed out, please retry");
  }

  #[test]
  fn wrapped_app_errors_are_unwrapped() {
    let wrapped = SagaError::HandlerError {
      source: anyhow::Error::new(AppError::Validation("Products not found".into())),
    };
    assert!(matches!(AppError::from(wrapped), AppError::Validation(m) if m == "Products not found"));
  }
}
