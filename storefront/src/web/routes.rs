// storefront/src/web/routes.rs

use actix_web::{web, HttpResponse};
use chrono::{SecondsFormat, Utc};

use crate::web::handlers::{checkout_handlers, order_handlers, webhook_handlers};

async fn health_check_handler() -> HttpResponse {
  HttpResponse::Ok().json(serde_json::json!({
    "status": "ok",
    "time": Utc::now().to_rfc3339_opts(SecondsFormat::Millis, true),
  }))
}

/// Mounts every route. Called from `main.rs` and from the HTTP tests.
pub fn configure_app_routes(cfg: &mut web::ServiceConfig) {
  cfg
    .route("/health", web::get().to(health_check_handler))
    .service(
      web::scope("/api")
        .route(
          "/checkout/session",
          web::post().to(checkout_handlers::create_checkout_session_handler),
        )
        .route(
          "/webhooks/stripe",
          web::post().to(webhook_handlers::payment_webhook_handler),
        )
        .service(
          web::scope("/orders")
            .route("", web::get().to(order_handlers::list_orders_handler))
            .route(
              "/session/{session_id}",
              web::get().to(order_handlers::order_by_session_handler),
            ),
        ),
    );
}
