// storefront/src/main.rs

use actix_web::{web as actix_data, App, HttpServer};
use std::sync::Arc;
use std::time::Duration;
use storefront::config::AppConfig;
use storefront::services::star_sync::StarSyncWorker;
use storefront::web::configure_app_routes;
use tokio_util::sync::CancellationToken;
use tracing::Level;
use tracing_subscriber::fmt::format::FmtSpan;

#[actix_web::main]
async fn main() -> std::io::Result<()> {
  tracing_subscriber::fmt()
    .with_max_level(Level::INFO)
    .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
    .with_span_events(FmtSpan::CLOSE)
    .init();

  tracing::info!("Starting storefront server...");

  let app_config = match AppConfig::from_env() {
    Ok(cfg) => cfg,
    Err(e) => {
      tracing::error!(error = %e, "Failed to load application configuration.");
      return Err(std::io::Error::new(std::io::ErrorKind::InvalidInput, e.to_string()));
    }
  };

  let store = match storefront::open_store(&app_config).await {
    Ok(store) => store,
    Err(e) => {
      tracing::error!(error = %e, "Failed to open the store.");
      return Err(std::io::Error::new(std::io::ErrorKind::Other, e.to_string()));
    }
  };

  let app_state = match storefront::build_state(app_config, store) {
    Ok(state) => state,
    Err(e) => {
      tracing::error!(error = %e, "Failed to build application state.");
      return Err(std::io::Error::new(std::io::ErrorKind::Other, e.to_string()));
    }
  };

  let shutdown = CancellationToken::new();
  let sync_handle = StarSyncWorker::new(
    app_state.store.clone(),
    Arc::clone(&app_state.stars),
    Duration::from_secs(app_state.config.star_sync_interval_secs),
    shutdown.clone(),
  )
  .spawn();

  let server_address = format!("{}:{}", app_state.config.server_host, app_state.config.server_port);
  tracing::info!("Attempting to bind server to {}...", server_address);

  let server_state = app_state.clone();
  let result = HttpServer::new(move || {
    App::new()
      .app_data(actix_data::Data::new(server_state.clone()))
      .app_data(actix_data::JsonConfig::default().limit(8 * 1024 * 1024))
      .wrap(tracing_actix_web::TracingLogger::default())
      .configure(configure_app_routes)
  })
  .bind(&server_address)?
  .run()
  .await;

  shutdown.cancel();
  if let Some(handle) = sync_handle {
    if let Err(e) = handle.await {
      tracing::warn!(error = %e, "Star sync worker ended abnormally.");
    }
  }
  tracing::info!("Server stopped.");
  result
}
