// storefront/src/pipelines/webhook_pipeline.rs

//! Webhook saga: verified gateway events move orders out of `pending_payment`.
//!
//! Redelivery is safe. Status changes only apply to pending orders and the
//! confirmation email only follows a change that actually applied.

use crate::config::AppConfig;
use crate::errors::AppError;
use crate::pipelines::common_steps::send_order_confirmation_step;
use crate::pipelines::contexts::WebhookCtxData;
use crate::services::webhook_signature::verify_signature;
use crate::services::{GatewayEvent, Transition};
use chrono::Utc;
use saga::{Flow, Saga, SagaRegistry, StepContext, StepSpec};
use tracing::{debug, info, warn};

pub const MISSING_SIGNATURE: &str = "Missing Stripe signature";

fn rejected(detail: impl std::fmt::Display) -> AppError {
  AppError::WebhookRejected(format!("Webhook Error: {}", detail))
}

pub fn webhook_saga(config: &AppConfig) -> Saga<WebhookCtxData, AppError> {
  let mut saga = Saga::<WebhookCtxData, AppError>::new(&[
    StepSpec::step("verify_signature"),
    StepSpec::step("decode_event"),
    StepSpec::step("apply_transition").with_timeout(config.external_call_timeout),
    StepSpec::optional_step("send_confirmation_email"),
  ]);

  // Nothing downstream runs on an unverified body.
  saga.on("verify_signature", |ctx: StepContext<WebhookCtxData>| async move {
    let (header, payload, secret, tolerance) = ctx.with(|d| {
      (
        d.signature_header.clone(),
        d.raw_payload.clone(),
        d.app_state.config.stripe_webhook_secret.clone(),
        d.app_state.config.webhook_tolerance,
      )
    });
    let Some(header) = header else {
      warn!("Webhook rejected: signature header missing.");
      return Err(AppError::WebhookRejected(MISSING_SIGNATURE.to_string()));
    };
    verify_signature(&secret, &header, &payload, tolerance, Utc::now().timestamp()).map_err(|e| {
      warn!(error = %e, "Webhook rejected: signature did not verify.");
      rejected(e)
    })?;
    debug!(bytes = payload.len(), "Webhook signature verified.");
    Ok(Flow::Continue)
  });

  saga.on("decode_event", |ctx: StepContext<WebhookCtxData>| async move {
    let payload = ctx.with(|d| d.raw_payload.clone());
    let event = GatewayEvent::decode(&payload).map_err(|e| {
      warn!(error = %e, "Verified webhook body is not a readable event.");
      rejected(e)
    })?;
    info!(event_type = event.event_type(), "Webhook event received.");
    ctx.update(|d| d.event = Some(event));
    Ok::<_, AppError>(Flow::Continue)
  });

  saga.on("apply_transition", |ctx: StepContext<WebhookCtxData>| async move {
    let (orders, event) = ctx.with(|d| (d.app_state.orders.clone(), d.event.clone()));
    let Some(event) = event else {
      return Err(AppError::Internal("Webhook event missing after decode".to_string()));
    };

    let (session, completed) = match &event {
      GatewayEvent::CheckoutCompleted(session) => (session, true),
      GatewayEvent::AsyncPaymentFailed(session) => (session, false),
      GatewayEvent::Unhandled { event_type } => {
        info!(%event_type, "Ignoring unhandled webhook event.");
        return Ok(Flow::Continue);
      }
    };

    // Metadata is set before the session exists, so it never races the session link.
    let order_id = match (session.order_id(), session.session_id()) {
      (Some(id), _) => Some(id),
      (None, Some(session_id)) => orders.find_order_id_by_session(session_id).await?,
      (None, None) => None,
    };
    let Some(order_id) = order_id else {
      warn!(session_id = %session.id, "Webhook event matches no order.");
      return Ok(Flow::Continue);
    };

    let transition = if completed {
      orders
        .mark_paid(order_id, session.payment_intent_id(), session.session_id())
        .await?
    } else {
      orders.mark_cancelled(order_id).await?
    };

    match transition {
      Transition::Applied => info!(%order_id, event_type = event.event_type(), "Order status updated."),
      Transition::AlreadyInState => info!(%order_id, "Order already in target status; redelivery ignored."),
      Transition::Conflict(current) => warn!(%order_id, %current, "Order not pending; status left unchanged."),
      Transition::NotFound => warn!(%order_id, "Webhook references an unknown order."),
    }
    ctx.update(|d| {
      d.order_id = Some(order_id);
      d.transition = Some(transition);
    });
    Ok(Flow::Continue)
  });

  saga.on("send_confirmation_email", send_order_confirmation_step);

  saga
}

pub fn register_webhook_saga(registry: &SagaRegistry<AppError>, config: &AppConfig) {
  registry.register(webhook_saga(config));
  info!("Webhook saga registered.");
}
