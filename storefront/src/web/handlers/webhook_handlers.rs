// storefront/src/web/handlers/webhook_handlers.rs

use actix_web::{web, HttpRequest, HttpResponse};
use saga::StepContext;
use serde_json::json;
use tracing::{error, info, instrument};

use crate::errors::AppError;
use crate::pipelines::contexts::WebhookCtxData;
use crate::services::webhook_signature::SIGNATURE_HEADER;
use crate::state::AppState;

/// Receives gateway events. The body is taken as raw bytes so the signature
/// is checked against exactly what was sent.
#[instrument(name = "handler::payment_webhook", skip_all, fields(bytes = body.len()))]
pub async fn payment_webhook_handler(
  app_state: web::Data<AppState>,
  req: HttpRequest,
  body: web::Bytes,
) -> Result<HttpResponse, AppError> {
  let signature_header = req
    .headers()
    .get(SIGNATURE_HEADER)
    .and_then(|value| value.to_str().ok())
    .map(String::from);

  let ctx = StepContext::new(WebhookCtxData::new(app_state.get_ref().clone(), body, signature_header));

  match app_state.sagas.run(ctx.clone()).await {
    Ok(outcome) => {
      let (order_id, transition, email_sent) = ctx.with(|d| (d.order_id, d.transition, d.confirmation_email_sent));
      info!(?outcome, ?order_id, ?transition, email_sent, "Webhook acknowledged.");
      Ok(HttpResponse::Ok().json(json!({ "received": true })))
    }
    Err(err @ AppError::WebhookRejected(_)) => Err(err),
    // Anything past verification is answered with a 500 so the gateway redelivers.
    Err(err) => {
      error!(error = %err, "Webhook processing failed.");
      Err(AppError::WebhookProcessing(err.to_string()))
    }
  }
}
