// storefront/src/web/handlers/order_handlers.rs

//! Read side for the order history and order confirmation pages.

use actix_web::{web, HttpResponse};
use tracing::{error, instrument};

use crate::errors::AppError;
use crate::services::bounded;
use crate::services::identity::authenticate;
use crate::state::AppState;
use crate::web::extractors::BearerToken;

const ORDERS_UNAVAILABLE: &str = "Unable to load orders";

fn unavailable(err: AppError) -> AppError {
  match err {
    AppError::Timeout { .. } => err,
    other => {
      error!(error = %other, "Order lookup failed.");
      AppError::Upstream(ORDERS_UNAVAILABLE.to_string())
    }
  }
}

#[instrument(name = "handler::list_orders", skip_all)]
pub async fn list_orders_handler(app_state: web::Data<AppState>, token: BearerToken) -> Result<HttpResponse, AppError> {
  let limit = app_state.config.external_call_timeout;
  let user_id = authenticate(app_state.identity.as_ref(), token.as_deref(), limit).await?;

  let orders = bounded("Order lookup", limit, app_state.orders.list_orders_for_user(user_id))
    .await
    .map_err(unavailable)?;
  Ok(HttpResponse::Ok().json(orders))
}

#[instrument(name = "handler::order_by_session", skip_all, fields(session_id = %session_id))]
pub async fn order_by_session_handler(
  app_state: web::Data<AppState>,
  token: BearerToken,
  session_id: web::Path<String>,
) -> Result<HttpResponse, AppError> {
  let limit = app_state.config.external_call_timeout;
  let user_id = authenticate(app_state.identity.as_ref(), token.as_deref(), limit).await?;

  let order = bounded(
    "Order lookup",
    limit,
    app_state.orders.find_order_by_session(user_id, session_id.as_str()),
  )
  .await
  .map_err(unavailable)?;

  match order {
    Some(order) => Ok(HttpResponse::Ok().json(order)),
    None => Err(AppError::NotFound("Order not found".to_string())),
  }
}
