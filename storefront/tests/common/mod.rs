// tests/common/mod.rs
#![allow(dead_code)]

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use once_cell::sync::Lazy;
use parking_lot::Mutex;
use rust_decimal::Decimal;
use serde_json::{json, Value};
use std::collections::HashSet;
use std::sync::Arc;
use storefront::config::AppConfig;
use storefront::errors::{AppError, Result};
use storefront::models::{
  Dealer, DealerFilter, DeliveryPartner, DeliveryPartnerPatch, FulfillmentUpdate, NewDealer, NewDeliveryPartner,
  NewOrder, NewProduct, NewVerification, Order, OrderFilter, OrderPatch, PartnerFilter, PaymentUpdate, Product,
  ProductPatch, StockDecrement, StockMap, UpsertOutcome, VerifiedGithubUser,
};
use storefront::services::github::{StarCheck, StarChecker, Stargazer, StargazerListing};
use storefront::services::shiprocket::{CreatedShipment, Fulfillment, OrdersQuery, ShipmentOrder};
use storefront::state::AppState;
use storefront::store::{CatalogStore, DealerStore, MemoryStore, OrderStore, PartnerStore, VerificationStore};
use tracing::Level;
use uuid::Uuid;

pub const REPO_OWNER: &str = "acme";
pub const REPO_NAME: &str = "widgets";

static TRACING_INIT: Lazy<()> = Lazy::new(|| {
  tracing_subscriber::fmt()
    .with_max_level(Level::DEBUG)
    .with_test_writer()
    .try_init()
    .ok();
});

pub fn setup_tracing() {
  Lazy::force(&TRACING_INIT);
}

/// Records shipments instead of calling a courier.
#[derive(Default)]
pub struct FakeFulfillment {
  pub configured: bool,
  pub fail_create: bool,
  pub fail_awb: bool,
  pub created: Mutex<Vec<ShipmentOrder>>,
}

impl FakeFulfillment {
  pub fn configured() -> Self {
    Self {
      configured: true,
      ..Default::default()
    }
  }

  pub fn created_count(&self) -> usize {
    self.created.lock().len()
  }
}

#[async_trait]
impl Fulfillment for FakeFulfillment {
  fn is_configured(&self) -> bool {
    self.configured
  }

  async fn create_order(&self, order: &ShipmentOrder) -> Result<CreatedShipment> {
    if self.fail_create {
      return Err(AppError::Upstream("courier unavailable".to_string()));
    }
    self.created.lock().push(order.clone());
    Ok(CreatedShipment {
      order_id: Some("SR-1001".to_string()),
      shipment_id: Some(42),
    })
  }

  async fn assign_awb(&self, _shipment_id: i64) -> Result<Option<String>> {
    if self.fail_awb {
      return Err(AppError::Upstream("no courier serviceable".to_string()));
    }
    Ok(Some("AWB123".to_string()))
  }

  async fn track_shipment(&self, shipment_id: i64) -> Result<Value> {
    Ok(json!({ "tracking_data": { "shipment_status": "IN TRANSIT", "shipment_id": shipment_id } }))
  }

  async fn track_awb(&self, awb: &str) -> Result<Value> {
    Ok(json!({ "tracking_data": { "awb": awb } }))
  }

  async fn shipping_rates(&self, pickup: &str, delivery: &str, weight: Decimal) -> Result<Value> {
    Ok(json!({ "pickup": pickup, "delivery": delivery, "weight": weight.to_string() }))
  }

  async fn list_orders(&self, query: &OrdersQuery) -> Result<Value> {
    Ok(json!({ "page": query.page, "orders": [] }))
  }

  async fn get_order(&self, shiprocket_order_id: &str) -> Result<Value> {
    if shiprocket_order_id == "missing" {
      return Err(AppError::NotFound("Order not found".to_string()));
    }
    Ok(json!({ "id": shiprocket_order_id }))
  }

  async fn get_shipment(&self, shipment_id: i64) -> Result<Value> {
    Ok(json!({ "id": shipment_id }))
  }

  async fn generate_pickup(&self, shipment_ids: &[i64]) -> Result<Value> {
    Ok(json!({ "pickup_scheduled": shipment_ids }))
  }

  async fn cancel_shipment(&self, shipment_id: i64, reason: &str) -> Result<Value> {
    Ok(json!({ "cancelled": shipment_id, "reason": reason }))
  }
}

/// Star checker backed by a fixed set of stargazers.
pub struct FakeStars {
  pub configured: bool,
  pub fail: bool,
  pub starred: HashSet<String>,
  /// Reported as the listing's early stop reason.
  pub stopped_early: Option<String>,
  pub calls: Mutex<usize>,
}

impl FakeStars {
  pub fn with_stargazers(names: &[&str]) -> Self {
    Self {
      configured: true,
      fail: false,
      starred: names.iter().map(|n| n.to_string()).collect(),
      stopped_early: None,
      calls: Mutex::new(0),
    }
  }

  pub fn unconfigured() -> Self {
    Self {
      configured: false,
      ..Self::with_stargazers(&[])
    }
  }

  pub fn call_count(&self) -> usize {
    *self.calls.lock()
  }
}

#[async_trait]
impl StarChecker for FakeStars {
  fn is_configured(&self) -> bool {
    self.configured
  }

  fn repo_owner(&self) -> &str {
    REPO_OWNER
  }

  fn repo_name(&self) -> &str {
    REPO_NAME
  }

  async fn has_starred(&self, username: &str) -> Result<StarCheck> {
    *self.calls.lock() += 1;
    if self.fail {
      return Ok(StarCheck::Failed("connection reset".to_string()));
    }
    if username == "ghost" {
      return Ok(StarCheck::UserNotFound);
    }
    if self.starred.contains(username) {
      Ok(StarCheck::Starred)
    } else {
      Ok(StarCheck::NotStarred)
    }
  }

  async fn stargazers(&self) -> Result<StargazerListing> {
    *self.calls.lock() += 1;
    let mut names: Vec<&String> = self.starred.iter().collect();
    names.sort();
    Ok(StargazerListing {
      stargazers: names
        .into_iter()
        .map(|n| Stargazer {
          login: n.clone(),
          starred_at: Some(Utc::now()),
        })
        .collect(),
      stopped_early: self.stopped_early.clone(),
    })
  }
}

pub struct TestApp {
  pub store: Arc<MemoryStore>,
  pub fulfillment: Arc<FakeFulfillment>,
  pub stars: Arc<FakeStars>,
  pub state: AppState,
}

pub fn test_app(fulfillment: FakeFulfillment, stars: FakeStars) -> TestApp {
  let store = Arc::new(MemoryStore::new());
  let fulfillment = Arc::new(fulfillment);
  let stars = Arc::new(stars);
  let state = AppState::new(
    store.clone(),
    AppConfig::local_defaults(),
    fulfillment.clone(),
    stars.clone(),
  );
  TestApp {
    store,
    fulfillment,
    stars,
    state,
  }
}

pub fn default_test_app() -> TestApp {
  test_app(FakeFulfillment::configured(), FakeStars::with_stargazers(&[]))
}

pub async fn seed_product(store: &MemoryStore, price: i64, stock: &[(&str, i32)]) -> Product {
  let stock: StockMap = stock.iter().map(|(s, n)| (s.to_string(), *n)).collect();
  store
    .create_product(NewProduct::new("Logo Tee", Decimal::from(price)).with_stock(stock))
    .await
    .expect("seed product")
}

pub async fn seed_partner(store: &MemoryStore, name: &str) -> storefront::models::DeliveryPartner {
  store
    .create_partner(NewDeliveryPartner {
      name: name.to_string(),
      email: format!("{}@couriers.test", name.to_lowercase()),
      phone: "9800000000".to_string(),
      location: "Noida".to_string(),
      service_type: "standard".to_string(),
      rating: 5.0,
    })
    .await
    .expect("seed partner")
}

pub async fn seed_verified(store: &MemoryStore, username: &str, email: Option<&str>) {
  store
    .insert_verification(NewVerification {
      github_username: username.to_string(),
      user_email: email.map(str::to_string),
      repo_owner: REPO_OWNER.to_string(),
      repo_name: REPO_NAME.to_string(),
      verified_at: Utc::now(),
    })
    .await
    .expect("seed verification");
}

pub fn order_body(product_id: uuid::Uuid, size: &str, quantity: i64, payment_status: &str) -> Value {
  let mut body = json!({
    "product_id": product_id.to_string(),
    "size": size,
    "quantity": quantity,
    "user_name": "Asha Verma",
    "user_email": "asha@example.com",
    "user_phone": "+91 98765 43210",
    "shipping_address": "12 MG Road, Sector 18, Noida, Uttar Pradesh, 201301",
    "payment_status": payment_status,
  });
  if payment_status == "paid" {
    body["payment_reference"] = json!("0xabc123");
  }
  body
}

/// Memory store whose conditional stock decrement always loses, as if a
/// concurrent order took the last units between the stock check and the write.
pub struct StockRaceStore {
  pub inner: Arc<MemoryStore>,
}

#[async_trait]
impl CatalogStore for StockRaceStore {
  async fn list_products(&self, active_only: bool) -> Result<Vec<Product>> {
    self.inner.list_products(active_only).await
  }
  async fn get_product(&self, id: Uuid) -> Result<Option<Product>> {
    self.inner.get_product(id).await
  }
  async fn create_product(&self, new: NewProduct) -> Result<Product> {
    self.inner.create_product(new).await
  }
  async fn update_product(&self, id: Uuid, patch: ProductPatch) -> Result<Option<Product>> {
    self.inner.update_product(id, patch).await
  }
  async fn delete_product(&self, id: Uuid) -> Result<bool> {
    self.inner.delete_product(id).await
  }
  async fn decrement_stock(&self, _id: Uuid, _size: &str, _quantity: i32) -> Result<StockDecrement> {
    Ok(StockDecrement::Insufficient)
  }
}

#[async_trait]
impl OrderStore for StockRaceStore {
  async fn insert_order(&self, new: NewOrder) -> Result<Order> {
    self.inner.insert_order(new).await
  }
  async fn get_order(&self, id: Uuid) -> Result<Option<Order>> {
    self.inner.get_order(id).await
  }
  async fn list_orders(&self, filter: &OrderFilter, limit: i64) -> Result<Vec<Order>> {
    self.inner.list_orders(filter, limit).await
  }
  async fn count_orders(&self) -> Result<i64> {
    self.inner.count_orders().await
  }
  async fn patch_order(&self, id: Uuid, patch: OrderPatch) -> Result<Option<Order>> {
    self.inner.patch_order(id, patch).await
  }
  async fn record_fulfillment(&self, id: Uuid, update: FulfillmentUpdate) -> Result<Option<Order>> {
    self.inner.record_fulfillment(id, update).await
  }
  async fn update_payment(&self, id: Uuid, update: PaymentUpdate) -> Result<Option<Order>> {
    self.inner.update_payment(id, update).await
  }
  async fn list_paid_pending(&self) -> Result<Vec<Order>> {
    self.inner.list_paid_pending().await
  }
  async fn confirm_paid_pending(&self) -> Result<Vec<Order>> {
    self.inner.confirm_paid_pending().await
  }
}

#[async_trait]
impl PartnerStore for StockRaceStore {
  async fn list_partners(&self, filter: &PartnerFilter) -> Result<Vec<DeliveryPartner>> {
    self.inner.list_partners(filter).await
  }
  async fn get_partner(&self, id: Uuid) -> Result<Option<DeliveryPartner>> {
    self.inner.get_partner(id).await
  }
  async fn create_partner(&self, new: NewDeliveryPartner) -> Result<DeliveryPartner> {
    self.inner.create_partner(new).await
  }
  async fn patch_partner(&self, id: Uuid, patch: DeliveryPartnerPatch) -> Result<Option<DeliveryPartner>> {
    self.inner.patch_partner(id, patch).await
  }
  async fn delete_partner(&self, id: Uuid) -> Result<bool> {
    self.inner.delete_partner(id).await
  }
  async fn least_loaded_active(&self) -> Result<Option<DeliveryPartner>> {
    self.inner.least_loaded_active().await
  }
  async fn increment_load(&self, id: Uuid) -> Result<bool> {
    self.inner.increment_load(id).await
  }
}

#[async_trait]
impl DealerStore for StockRaceStore {
  async fn list_dealers(&self, filter: &DealerFilter) -> Result<Vec<Dealer>> {
    self.inner.list_dealers(filter).await
  }
  async fn create_dealer(&self, new: NewDealer) -> Result<Dealer> {
    self.inner.create_dealer(new).await
  }
}

#[async_trait]
impl VerificationStore for StockRaceStore {
  async fn find_by_username(&self, username: &str) -> Result<Option<VerifiedGithubUser>> {
    self.inner.find_by_username(username).await
  }
  async fn find_by_email(&self, email: &str) -> Result<Option<VerifiedGithubUser>> {
    self.inner.find_by_email(email).await
  }
  async fn insert_verification(&self, new: NewVerification) -> Result<Option<VerifiedGithubUser>> {
    self.inner.insert_verification(new).await
  }
  async fn upsert_stargazer(
    &self,
    username: &str,
    starred_at: DateTime<Utc>,
    repo_owner: &str,
    repo_name: &str,
  ) -> Result<UpsertOutcome> {
    self.inner.upsert_stargazer(username, starred_at, repo_owner, repo_name).await
  }
  async fn recent_verifications(&self, limit: i64) -> Result<Vec<VerifiedGithubUser>> {
    self.inner.recent_verifications(limit).await
  }
}

/// App whose store loses every stock race; `store` is the backing memory store.
pub fn stock_race_app() -> TestApp {
  let store = Arc::new(MemoryStore::new());
  let fulfillment = Arc::new(FakeFulfillment::configured());
  let stars = Arc::new(FakeStars::with_stargazers(&[]));
  let state = AppState::new(
    Arc::new(StockRaceStore { inner: store.clone() }),
    AppConfig::local_defaults(),
    fulfillment.clone(),
    stars.clone(),
  );
  TestApp {
    store,
    fulfillment,
    stars,
    state,
  }
}
