// storefront/src/web/handlers/checkout_handlers.rs

use actix_web::{web, HttpMessage, HttpRequest, HttpResponse};
use saga::{Outcome, StepContext};
use serde::Serialize;
use tracing::{info, instrument, warn};
use uuid::Uuid;

use crate::errors::{AppError, CHECKOUT_FALLBACK_MESSAGE};
use crate::pipelines::contexts::CheckoutCtxData;
use crate::state::AppState;
use crate::web::extractors::BearerToken;

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CheckoutSessionResponse {
  pub session_id: String,
  pub order_id: Uuid,
}

/// Checkout failures always reach the caller as a 400 with a readable message.
fn client_facing(err: AppError) -> AppError {
  match err {
    AppError::Internal(_) | AppError::Config(_) | AppError::Saga(_) => {
      AppError::Upstream(CHECKOUT_FALLBACK_MESSAGE.to_string())
    }
    other => other,
  }
}

/// JSON media types, matched on the type without parameters.
fn is_json_content(req: &HttpRequest) -> bool {
  let content_type = req.content_type();
  content_type.eq_ignore_ascii_case("application/json") || content_type.to_ascii_lowercase().ends_with("+json")
}

/// Takes the body as raw bytes: it is only decoded once the caller is authenticated.
#[instrument(name = "handler::create_checkout_session", skip_all, fields(bytes = body.len()))]
pub async fn create_checkout_session_handler(
  app_state: web::Data<AppState>,
  req: HttpRequest,
  token: BearerToken,
  body: web::Bytes,
) -> Result<HttpResponse, AppError> {
  let ctx = StepContext::new(CheckoutCtxData::new(
    app_state.get_ref().clone(),
    token.0,
    body,
    is_json_content(&req),
  ));

  match app_state.sagas.run(ctx.clone()).await {
    Ok(Outcome::Completed) => {
      let (order_id, session_id) = ctx.with(|d| (d.order_id, d.session_id.clone()));
      let (Some(order_id), Some(session_id)) = (order_id, session_id) else {
        warn!("Checkout saga completed without an order or payment session.");
        return Err(client_facing(AppError::Internal("Checkout result incomplete".to_string())));
      };
      info!(%order_id, %session_id, "Checkout session ready.");
      Ok(HttpResponse::Ok().json(CheckoutSessionResponse { session_id, order_id }))
    }
    Ok(Outcome::Halted) => {
      warn!("Checkout saga halted before opening a payment session.");
      Err(AppError::Upstream(CHECKOUT_FALLBACK_MESSAGE.to_string()))
    }
    Err(err) => {
      warn!(error = %err, "Checkout failed.");
      Err(client_facing(err))
    }
  }
}
