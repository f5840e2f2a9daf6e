// storefront/src/lib.rs

//! Merch storefront service: catalog, order placement with GitHub-star
//! discounts, payment verification, courier fulfillment and admin APIs.

pub mod config;
pub mod errors;
pub mod models;
pub mod pipelines;
pub mod services;
pub mod state;
pub mod store;
pub mod web;

use crate::config::{AppConfig, StoreBackend};
use crate::errors::{AppError, Result};
use crate::services::github::GithubClient;
use crate::services::shiprocket::ShiprocketClient;
use crate::state::AppState;
use crate::store::{MemoryStore, PgStore, SharedStore};
use std::sync::Arc;

/// Opens the configured store backend, running migrations when enabled.
pub async fn open_store(config: &AppConfig) -> Result<SharedStore> {
  match config.store_backend {
    StoreBackend::Memory => {
      tracing::warn!("Using in-memory store; data is lost on restart.");
      Ok(Arc::new(MemoryStore::new()))
    }
    StoreBackend::Postgres => {
      let url = config
        .database_url
        .as_deref()
        .ok_or_else(|| AppError::Config("DATABASE_URL is required for the postgres store".to_string()))?;
      let store = PgStore::connect(url).await?;
      tracing::info!("Successfully connected to the database.");
      if config.run_migrations {
        store.migrate().await?;
        tracing::info!("Database migrations applied.");
      }
      Ok(Arc::new(store))
    }
  }
}

/// Builds `AppState` with the real GitHub and Shiprocket clients.
pub fn build_state(config: AppConfig, store: SharedStore) -> Result<AppState> {
  let stars = Arc::new(GithubClient::new(&config.github)?);
  let fulfillment = Arc::new(ShiprocketClient::new(&config.shiprocket));
  Ok(AppState::new(store, config, fulfillment, stars))
}
