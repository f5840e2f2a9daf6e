// storefront/src/pipelines/mod.rs

//! Flows behind the order and payment endpoints.

use crate::errors::AppError;
use merch_flow::FlowRegistry;

pub mod contexts;
pub mod payment_pipeline;
pub mod place_order_pipeline;

/// Registers every flow on `registry`. Called once at startup.
pub fn register_all_flows(registry: &FlowRegistry<AppError>) {
  tracing::info!("Registering flows...");

  place_order_pipeline::register_place_order_flow(registry);
  payment_pipeline::register_verify_payment_flow(registry);

  tracing::info!("All flows registered.");
}
