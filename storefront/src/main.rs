// storefront/src/main.rs

use storefront::config::AppConfig;
use storefront::services::stale_orders;
use storefront::state::{AppState, Collaborators};
use storefront::web::configure_app_routes;

use actix_cors::Cors;
use actix_web::{http::header, web as actix_data, App, HttpServer};
use sqlx::postgres::PgPoolOptions;
use std::sync::Arc;
use tracing_subscriber::fmt::format::FmtSpan;
use tracing_subscriber::EnvFilter;

fn init_tracing() {
  let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
  let json = std::env::var("LOG_FORMAT").is_ok_and(|v| v.eq_ignore_ascii_case("json"));
  let builder = tracing_subscriber::fmt()
    .with_env_filter(filter)
    .with_span_events(FmtSpan::CLOSE);
  if json {
    builder.json().init();
  } else {
    builder.init();
  }
}

fn build_cors(origins: &[String]) -> Cors {
  origins
    .iter()
    .fold(Cors::default(), |cors, origin| cors.allowed_origin(origin))
    .allowed_methods(vec!["GET", "POST"])
    .allowed_headers(vec![header::AUTHORIZATION, header::CONTENT_TYPE])
    .max_age(3600)
}

#[actix_web::main]
async fn main() -> std::io::Result<()> {
  dotenvy::dotenv().ok();
  init_tracing();
  tracing::info!("Starting storefront server...");

  let app_config = match AppConfig::from_env() {
    Ok(cfg) => Arc::new(cfg),
    Err(e) => {
      tracing::error!(error = %e, "Failed to load application configuration.");
      std::process::exit(1);
    }
  };

  let db_pool = match PgPoolOptions::new()
    .max_connections(10)
    .acquire_timeout(app_config.external_call_timeout)
    .connect(&app_config.database_url)
    .await
  {
    Ok(pool) => {
      tracing::info!("Successfully connected to the database.");
      pool
    }
    Err(e) => {
      tracing::error!(error = %e, "Failed to connect to the database.");
      std::process::exit(1);
    }
  };

  let collaborators = match Collaborators::connect(&app_config, db_pool) {
    Ok(c) => c,
    Err(e) => {
      tracing::error!(error = %e, "Failed to build external clients.");
      std::process::exit(1);
    }
  };
  let app_state = AppState::new(app_config.clone(), collaborators);

  if let Some(every) = app_config.stale_order_sweep_every {
    stale_orders::spawn_sweeper(app_state.orders.clone(), app_config.stale_order_after, every);
    tracing::info!(?every, older_than = ?app_config.stale_order_after, "Stale order sweeper started.");
  }

  let server_address = format!("{}:{}", app_config.server_host, app_config.server_port);
  tracing::info!("Binding server to {}...", server_address);

  let cors_origins = app_config.cors_origins.clone();
  HttpServer::new(move || {
    App::new()
      .app_data(actix_data::Data::new(app_state.clone()))
      .wrap(build_cors(&cors_origins))
      .wrap(tracing_actix_web::TracingLogger::default())
      .configure(configure_app_routes)
  })
  .bind(&server_address)?
  .run()
  .await
}
