// storefront/src/store/mod.rs

//! Persistence seams. `PgStore` is the production backend; `MemoryStore`
//! backs local runs and tests. Both close the stock and partner-load races
//! with single conditional updates.

use crate::errors::Result;
use crate::models::{
  Dealer, DealerFilter, DeliveryPartner, DeliveryPartnerPatch, FulfillmentUpdate, NewDealer, NewDeliveryPartner,
  NewOrder, NewProduct, NewVerification, Order, OrderFilter, OrderPatch, PartnerFilter, PaymentUpdate, Product,
  ProductPatch, StockDecrement, UpsertOutcome, VerifiedGithubUser,
};
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use std::sync::Arc;
use uuid::Uuid;

pub mod memory;
pub mod postgres;

pub use memory::MemoryStore;
pub use postgres::PgStore;

pub const MAX_ORDER_LIST: i64 = 1000;

#[async_trait]
pub trait CatalogStore: Send + Sync {
  /// Newest first.
  async fn list_products(&self, active_only: bool) -> Result<Vec<Product>>;
  async fn get_product(&self, id: Uuid) -> Result<Option<Product>>;
  async fn create_product(&self, new: NewProduct) -> Result<Product>;
  async fn update_product(&self, id: Uuid, patch: ProductPatch) -> Result<Option<Product>>;
  async fn delete_product(&self, id: Uuid) -> Result<bool>;
  /// Decrements `stock[size]` by `quantity` only if enough units remain.
  async fn decrement_stock(&self, id: Uuid, size: &str, quantity: i32) -> Result<StockDecrement>;
}

#[async_trait]
pub trait OrderStore: Send + Sync {
  async fn insert_order(&self, new: NewOrder) -> Result<Order>;
  async fn get_order(&self, id: Uuid) -> Result<Option<Order>>;
  /// Newest first, at most `limit` rows.
  async fn list_orders(&self, filter: &OrderFilter, limit: i64) -> Result<Vec<Order>>;
  async fn count_orders(&self) -> Result<i64>;
  async fn patch_order(&self, id: Uuid, patch: OrderPatch) -> Result<Option<Order>>;
  async fn record_fulfillment(&self, id: Uuid, update: FulfillmentUpdate) -> Result<Option<Order>>;
  async fn update_payment(&self, id: Uuid, update: PaymentUpdate) -> Result<Option<Order>>;
  /// Orders marked paid whose status never left `pending`.
  async fn list_paid_pending(&self) -> Result<Vec<Order>>;
  async fn confirm_paid_pending(&self) -> Result<Vec<Order>>;
}

#[async_trait]
pub trait PartnerStore: Send + Sync {
  async fn list_partners(&self, filter: &PartnerFilter) -> Result<Vec<DeliveryPartner>>;
  async fn get_partner(&self, id: Uuid) -> Result<Option<DeliveryPartner>>;
  async fn create_partner(&self, new: NewDeliveryPartner) -> Result<DeliveryPartner>;
  async fn patch_partner(&self, id: Uuid, patch: DeliveryPartnerPatch) -> Result<Option<DeliveryPartner>>;
  async fn delete_partner(&self, id: Uuid) -> Result<bool>;
  /// Active partner with the fewest assigned orders; ties go to the oldest.
  async fn least_loaded_active(&self) -> Result<Option<DeliveryPartner>>;
  /// `assigned_orders_count = assigned_orders_count + 1`. False when the partner is gone.
  async fn increment_load(&self, id: Uuid) -> Result<bool>;
}

#[async_trait]
pub trait DealerStore: Send + Sync {
  async fn list_dealers(&self, filter: &DealerFilter) -> Result<Vec<Dealer>>;
  async fn create_dealer(&self, new: NewDealer) -> Result<Dealer>;
}

#[async_trait]
pub trait VerificationStore: Send + Sync {
  async fn find_by_username(&self, username: &str) -> Result<Option<VerifiedGithubUser>>;
  async fn find_by_email(&self, email: &str) -> Result<Option<VerifiedGithubUser>>;
  /// `None` when the username is already recorded.
  async fn insert_verification(&self, new: NewVerification) -> Result<Option<VerifiedGithubUser>>;
  async fn upsert_stargazer(
    &self,
    username: &str,
    starred_at: DateTime<Utc>,
    repo_owner: &str,
    repo_name: &str,
  ) -> Result<UpsertOutcome>;
  /// Most recently verified first.
  async fn recent_verifications(&self, limit: i64) -> Result<Vec<VerifiedGithubUser>>;
}

pub trait Store: CatalogStore + OrderStore + PartnerStore + DealerStore + VerificationStore {}

impl<T> Store for T where T: CatalogStore + OrderStore + PartnerStore + DealerStore + VerificationStore {}

pub type SharedStore = Arc<dyn Store>;
