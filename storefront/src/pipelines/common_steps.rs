// storefront/src/pipelines/common_steps.rs
use crate::errors::AppError;
use crate::pipelines::contexts::WebhookCtxData;
use crate::services::{bounded, GatewayEvent, Transition};
use saga::{Flow, StepContext};
use tracing::{debug, info, instrument, warn};

/// Emails the customer once a completed payment has just moved their order to `paid`.
///
/// Only the pending → paid edge qualifies, so redelivered events send nothing.
/// The status change is already committed here: delivery failures are logged
/// and the step still continues.
#[instrument(name = "common_step::send_order_confirmation", skip_all)]
pub async fn send_order_confirmation_step(ctx: StepContext<WebhookCtxData>) -> Result<Flow, AppError> {
  let (notifier, recipient, order_id, limit) = ctx.with(|d| {
    let recipient = match (&d.event, d.transition) {
      (Some(GatewayEvent::CheckoutCompleted(session)), Some(Transition::Applied)) => {
        session.contact_email().map(str::to_string)
      }
      _ => None,
    };
    (
      d.app_state.notifier.clone(),
      recipient,
      d.order_id,
      d.app_state.config.external_call_timeout,
    )
  });

  let (Some(recipient), Some(order_id)) = (recipient, order_id) else {
    debug!("No confirmation email due for this event.");
    return Ok(Flow::Continue);
  };
  let Some(notifier) = notifier else {
    info!(%order_id, "Email delivery not configured; skipping order confirmation.");
    return Ok(Flow::Continue);
  };

  match bounded(
    "Confirmation email",
    limit,
    notifier.send_order_confirmation(&recipient, order_id),
  )
  .await
  {
    Ok(()) => {
      ctx.update(|d| d.confirmation_email_sent = true);
      info!(%order_id, "Order confirmation email sent.");
    }
    Err(e) => warn!(%order_id, error = %e, "Order confirmation email failed; order status already committed."),
  }
  Ok(Flow::Continue)
}
