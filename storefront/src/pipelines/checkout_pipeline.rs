// storefront/src/pipelines/checkout_pipeline.rs

//! Checkout saga: authenticated cart in, pending order plus hosted payment session out.
//!
//! Steps run strictly in order and the first failure ends the run. Nothing
//! already written is rolled back; orders left without a payment session are
//! collected later by the stale order sweeper.

use crate::config::AppConfig;
use crate::errors::AppError;
use crate::models::{CartLine, CheckoutRequest, Product, ShippingForm};
use crate::pipelines::contexts::CheckoutCtxData;
use crate::pricing::{price_cart, PriceBreakdown, PricedLine};
use crate::services::identity::authenticate;
use crate::services::{NewOrder, NewOrderItem, SessionLineItem, SessionRequest};
use saga::{Flow, Saga, SagaRegistry, StepContext, StepSpec};
use std::collections::{HashMap, HashSet};
use tracing::{info, warn};

pub const CART_REQUIRED: &str = "Cart items are required";
pub const CONTACT_REQUIRED: &str = "Shipping information and email are required";
pub const PRODUCTS_NOT_FOUND: &str = "Products not found";

fn missing_state(what: &str) -> AppError {
  AppError::Internal(format!("Checkout state is missing {}", what))
}

fn distinct_product_ids(lines: &[CartLine]) -> Vec<String> {
  let mut seen = HashSet::new();
  lines
    .iter()
    .filter(|line| seen.insert(line.product_id.as_str()))
    .map(|line| line.product_id.clone())
    .collect()
}

/// Gateway line items for an order: one per priced line, then shipping and tax
/// as their own lines so the hosted page charges exactly `pricing.total`.
pub(crate) fn session_line_items(lines: &[PricedLine], pricing: &PriceBreakdown) -> Vec<SessionLineItem> {
  let mut items: Vec<SessionLineItem> = lines
    .iter()
    .map(|line| SessionLineItem {
      name: line.name.clone(),
      image: line.image.clone(),
      unit_amount: line.unit_amount,
      quantity: line.quantity,
    })
    .collect();
  for (name, amount) in [("Shipping", pricing.shipping_fee), ("Tax", pricing.tax)] {
    if amount > 0 {
      items.push(SessionLineItem {
        name: name.to_string(),
        image: None,
        unit_amount: amount,
        quantity: 1,
      });
    }
  }
  items
}

pub fn checkout_saga(config: &AppConfig) -> Saga<CheckoutCtxData, AppError> {
  let external = config.external_call_timeout;
  let mut saga = Saga::<CheckoutCtxData, AppError>::new(&[
    StepSpec::step("authenticate"),
    StepSpec::step("decode_request"),
    StepSpec::step("validate_cart"),
    StepSpec::step("validate_contact"),
    StepSpec::step("resolve_products").with_timeout(external),
    StepSpec::step("price_order"),
    StepSpec::step("persist_order").with_timeout(external),
    StepSpec::step("request_payment_session").with_timeout(external),
    StepSpec::step("link_payment_session").with_timeout(external),
  ]);

  saga.on("authenticate", |ctx: StepContext<CheckoutCtxData>| async move {
    let (identity, token, limit) = ctx.with(|d| {
      (
        d.app_state.identity.clone(),
        d.bearer_token.clone(),
        d.app_state.config.external_call_timeout,
      )
    });
    let user_id = authenticate(identity.as_ref(), token.as_deref(), limit).await?;
    ctx.update(|d| d.user_id = Some(user_id));
    info!(%user_id, "Checkout caller authenticated.");
    Ok::<_, AppError>(Flow::Continue)
  });

  saga.on("decode_request", |ctx: StepContext<CheckoutCtxData>| async move {
    let request = ctx.with(|d| CheckoutRequest::decode(&d.raw_body, d.json_body));
    let request = request.map_err(|e| {
      warn!(error = %e, "Checkout body is not valid JSON.");
      AppError::Validation(format!("Invalid request body: {}", e))
    })?;
    ctx.update(|d| d.request = request);
    Ok::<_, AppError>(Flow::Continue)
  });

  saga.on("validate_cart", |ctx: StepContext<CheckoutCtxData>| async move {
    if ctx.with(|d| d.request.items.is_empty()) {
      return Err(AppError::Validation(CART_REQUIRED.to_string()));
    }
    Ok(Flow::Continue)
  });

  saga.on("validate_contact", |ctx: StepContext<CheckoutCtxData>| async move {
    let complete = ctx.with(|d| d.request.shipping.is_some() && d.request.contact_email().is_some());
    if !complete {
      return Err(AppError::Validation(CONTACT_REQUIRED.to_string()));
    }
    Ok(Flow::Continue)
  });

  // Any requested id missing from the catalog fails the whole checkout.
  saga.on("resolve_products", |ctx: StepContext<CheckoutCtxData>| async move {
    let (catalog, ids) = ctx.with(|d| (d.app_state.catalog.clone(), distinct_product_ids(&d.request.items)));
    let products: HashMap<String, Product> = catalog
      .find_products(&ids)
      .await?
      .into_iter()
      .map(|p| (p.id.clone(), p))
      .collect();

    if products.is_empty() || ids.iter().any(|id| !products.contains_key(id)) {
      warn!(requested = ids.len(), found = products.len(), "Cart references unknown products.");
      return Err(AppError::Validation(PRODUCTS_NOT_FOUND.to_string()));
    }
    ctx.update(|d| d.products = products);
    Ok(Flow::Continue)
  });

  saga.on("price_order", |ctx: StepContext<CheckoutCtxData>| async move {
    let (priced_lines, pricing) = ctx.with(|d| price_cart(&d.request.items, &d.products))?;
    info!(
      subtotal = pricing.subtotal,
      shipping_fee = pricing.shipping_fee,
      tax = pricing.tax,
      total = pricing.total,
      "Order priced."
    );
    ctx.update(|d| {
      d.priced_lines = priced_lines;
      d.pricing = Some(pricing);
    });
    Ok::<_, AppError>(Flow::Continue)
  });

  // Order row and item rows commit together or not at all.
  saga.on("persist_order", |ctx: StepContext<CheckoutCtxData>| async move {
    let prepared = ctx.with(|d| {
      let user_id = d.user_id.ok_or_else(|| missing_state("user id"))?;
      let pricing = d.pricing.ok_or_else(|| missing_state("pricing"))?;
      let shipping_address = d
        .request
        .shipping
        .as_ref()
        .map(ShippingForm::to_address)
        .ok_or_else(|| missing_state("shipping address"))?;
      let order = NewOrder {
        user_id,
        amount_subtotal: pricing.subtotal,
        amount_total: pricing.total,
        currency: d.app_state.config.currency.clone(),
        shipping_address,
      };
      let items: Vec<NewOrderItem> = d
        .priced_lines
        .iter()
        .map(|line| NewOrderItem {
          product_id: line.product_id.clone(),
          quantity: line.quantity,
          unit_price: line.unit_amount,
        })
        .collect();
      Ok::<_, AppError>((d.app_state.orders.clone(), order, items))
    });
    let (orders, order, items) = prepared?;

    let order_id = orders.create_order(order, items).await?;
    ctx.update(|d| d.order_id = Some(order_id));
    Ok::<_, AppError>(Flow::Continue)
  });

  saga.on("request_payment_session", |ctx: StepContext<CheckoutCtxData>| async move {
    let prepared = ctx.with(|d| {
      let order_id = d.order_id.ok_or_else(|| missing_state("order id"))?;
      let user_id = d.user_id.ok_or_else(|| missing_state("user id"))?;
      let pricing = d.pricing.ok_or_else(|| missing_state("pricing"))?;
      let customer_email = d
        .request
        .contact_email()
        .map(str::to_string)
        .ok_or_else(|| missing_state("customer email"))?;
      let config = &d.app_state.config;
      let request = SessionRequest {
        order_id,
        user_id,
        customer_email,
        currency: config.currency.clone(),
        success_url: config.success_url(),
        cancel_url: config.cancel_url(),
        line_items: session_line_items(&d.priced_lines, &pricing),
        allowed_countries: config.allowed_shipping_countries.clone(),
        allow_promotion_codes: true,
        automatic_tax: false,
      };
      Ok::<_, AppError>((d.app_state.gateway.clone(), request))
    });
    let (gateway, request) = prepared?;

    let session = gateway.create_checkout_session(&request).await?;
    info!(order_id = %request.order_id, session_id = %session.id, "Payment session opened.");
    ctx.update(|d| d.session_id = Some(session.id));
    Ok::<_, AppError>(Flow::Continue)
  });

  saga.on("link_payment_session", |ctx: StepContext<CheckoutCtxData>| async move {
    let (orders, order_id, session_id) = ctx.with(|d| (d.app_state.orders.clone(), d.order_id, d.session_id.clone()));
    let (Some(order_id), Some(session_id)) = (order_id, session_id) else {
      return Err(missing_state("payment session"));
    };
    orders.attach_payment_session(order_id, &session_id).await?;
    Ok(Flow::Continue)
  });

  saga
}

pub fn register_checkout_saga(registry: &SagaRegistry<AppError>, config: &AppConfig) {
  registry.register(checkout_saga(config));
  info!("Checkout saga registered.");
}

#[cfg(test)]
mod tests {
  use super::*;

  fn priced(id: &str, unit_amount: i64, quantity: i32) -> PricedLine {
    PricedLine {
      product_id: id.to_string(),
      name: format!("Product {}", id),
      image: None,
      unit_amount,
      quantity,
    }
  }

  #[test]
  fn gateway_charge_matches_order_total() {
    let lines = vec![priced("A", 2500, 2)];
    let pricing = PriceBreakdown::for_subtotal(5000);
    let items = session_line_items(&lines, &pricing);
    let charged: i64 = items.iter().map(|i| i.unit_amount * i64::from(i.quantity)).sum();
    assert_eq!(charged, pricing.total);
    assert_eq!(items.len(), 3);
    assert_eq!(items[1].name, "Shipping");
    assert_eq!(items[2].name, "Tax");
  }

  #[test]
  fn free_shipping_adds_no_shipping_line() {
    let lines = vec![priced("B", 4000, 3)];
    let pricing = PriceBreakdown::for_subtotal(12_000);
    let items = session_line_items(&lines, &pricing);
    assert!(items.iter().all(|i| i.name != "Shipping"));
    assert_eq!(items.iter().map(|i| i.unit_amount * i64::from(i.quantity)).sum::<i64>(), 12_960);
  }

  #[test]
  fn product_ids_are_deduplicated_in_cart_order() {
    let lines = vec![
      CartLine { product_id: "b".into(), quantity: 1 },
      CartLine { product_id: "a".into(), quantity: 1 },
      CartLine { product_id: "b".into(), quantity: 2 },
    ];
    assert_eq!(distinct_product_ids(&lines), vec!["b".to_string(), "a".to_string()]);
  }
}
