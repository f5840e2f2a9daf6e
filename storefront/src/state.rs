// storefront/src/state.rs

use crate::config::AppConfig;
use crate::errors::AppError;
use crate::services::discount::DiscountPolicy;
use crate::services::github::StarChecker;
use crate::services::images::ImageStore;
use crate::services::pricing::PriceList;
use crate::services::shiprocket::Fulfillment;
use crate::store::SharedStore;
use merch_flow::FlowRegistry;
use std::sync::Arc;

/// Shared by every handler and cloned into each flow context.
#[derive(Clone)]
pub struct AppState {
  pub store: SharedStore,
  pub flows: Arc<FlowRegistry<AppError>>,
  pub config: Arc<AppConfig>,
  pub fulfillment: Arc<dyn Fulfillment>,
  pub stars: Arc<dyn StarChecker>,
  pub images: Arc<ImageStore>,
  pub prices: Arc<PriceList>,
  pub discount_policy: DiscountPolicy,
}

impl AppState {
  /// Wires shared state around the given store and outbound clients and
  /// registers every flow.
  pub fn new(
    store: SharedStore,
    config: AppConfig,
    fulfillment: Arc<dyn Fulfillment>,
    stars: Arc<dyn StarChecker>,
  ) -> Self {
    let flows = Arc::new(FlowRegistry::<AppError>::new());
    crate::pipelines::register_all_flows(&flows);

    Self {
      store,
      flows,
      images: Arc::new(ImageStore::from_config(&config)),
      prices: Arc::new(PriceList::from_config(&config)),
      config: Arc::new(config),
      fulfillment,
      stars,
      discount_policy: DiscountPolicy::default(),
    }
  }
}
