// storefront/src/store/memory.rs

use super::{CatalogStore, DealerStore, OrderStore, PartnerStore, VerificationStore};
use crate::errors::Result;
use crate::models::{
  Dealer, DealerFilter, DeliveryPartner, DeliveryPartnerPatch, FulfillmentUpdate, NewDealer, NewDeliveryPartner,
  NewOrder, NewProduct, NewVerification, Order, OrderFilter, OrderPatch, OrderStatus, PartnerFilter, PaymentStatus,
  PaymentUpdate, Product, ProductPatch, StockDecrement, UpsertOutcome, VerifiedGithubUser,
};
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use parking_lot::RwLock;
use sqlx::types::Json;
use std::sync::Arc;
use uuid::Uuid;

#[derive(Default)]
struct Tables {
  products: Vec<Product>,
  orders: Vec<Order>,
  partners: Vec<DeliveryPartner>,
  dealers: Vec<Dealer>,
  verified: Vec<VerifiedGithubUser>,
}

/// Process-local store. Rows are kept in insertion order; every write takes
/// the single table lock, so conditional updates are atomic.
#[derive(Clone, Default)]
pub struct MemoryStore {
  tables: Arc<RwLock<Tables>>,
}

impl MemoryStore {
  pub fn new() -> Self {
    Self::default()
  }
}

fn contains_ci(haystack: &str, needle: &str) -> bool {
  haystack.to_lowercase().contains(&needle.to_lowercase())
}

#[async_trait]
impl CatalogStore for MemoryStore {
  async fn list_products(&self, active_only: bool) -> Result<Vec<Product>> {
    let tables = self.tables.read();
    let mut products: Vec<Product> = tables
      .products
      .iter()
      .filter(|p| !active_only || p.active)
      .cloned()
      .collect();
    products.reverse();
    Ok(products)
  }

  async fn get_product(&self, id: Uuid) -> Result<Option<Product>> {
    Ok(self.tables.read().products.iter().find(|p| p.id == id).cloned())
  }

  async fn create_product(&self, new: NewProduct) -> Result<Product> {
    let now = Utc::now();
    let product = Product {
      id: Uuid::new_v4(),
      name: new.name,
      description: new.description,
      price: new.price,
      image_url: new.image_url,
      product_type: new.product_type,
      sizes: new.sizes,
      stock: Json(new.stock),
      active: new.active,
      created_at: now,
      updated_at: now,
    };
    self.tables.write().products.push(product.clone());
    Ok(product)
  }

  async fn update_product(&self, id: Uuid, patch: ProductPatch) -> Result<Option<Product>> {
    let mut tables = self.tables.write();
    let Some(product) = tables.products.iter_mut().find(|p| p.id == id) else {
      return Ok(None);
    };
    if let Some(name) = patch.name {
      product.name = name;
    }
    if let Some(description) = patch.description {
      product.description = Some(description);
    }
    if let Some(price) = patch.price {
      product.price = price;
    }
    if let Some(image_url) = patch.image_url {
      product.image_url = Some(image_url);
    }
    if let Some(product_type) = patch.product_type {
      product.product_type = product_type;
    }
    if let Some(sizes) = patch.sizes {
      product.sizes = sizes;
    }
    if let Some(stock) = patch.stock {
      product.stock = Json(stock);
    }
    if let Some(active) = patch.active {
      product.active = active;
    }
    product.updated_at = Utc::now();
    Ok(Some(product.clone()))
  }

  async fn delete_product(&self, id: Uuid) -> Result<bool> {
    let mut tables = self.tables.write();
    let before = tables.products.len();
    tables.products.retain(|p| p.id != id);
    Ok(tables.products.len() < before)
  }

  async fn decrement_stock(&self, id: Uuid, size: &str, quantity: i32) -> Result<StockDecrement> {
    let mut tables = self.tables.write();
    let Some(product) = tables.products.iter_mut().find(|p| p.id == id) else {
      return Ok(StockDecrement::ProductMissing);
    };
    let available = product.stock_for(size);
    if available < quantity {
      return Ok(StockDecrement::Insufficient);
    }
    let remaining = available - quantity;
    product.stock.0.insert(size.to_string(), remaining);
    product.updated_at = Utc::now();
    Ok(StockDecrement::Applied { remaining })
  }
}

#[async_trait]
impl OrderStore for MemoryStore {
  async fn insert_order(&self, new: NewOrder) -> Result<Order> {
    let now = Utc::now();
    let order = Order {
      id: Uuid::new_v4(),
      product_id: new.product_id,
      size: new.size,
      quantity: new.quantity,
      status: new.status,
      payment_status: new.payment_status,
      payment_reference: new.payment_reference,
      payment_currency: new.payment_currency,
      user_name: new.user_name,
      user_email: new.user_email,
      user_phone: new.user_phone,
      shipping_address: new.shipping_address,
      shipping_cost: Some(new.shipping_cost),
      estimated_delivery_date: Some(new.estimated_delivery_date),
      service_type: Some(new.service_type),
      tracking_number: Some(new.tracking_number),
      awb_number: None,
      shiprocket_order_id: None,
      shiprocket_shipment_id: None,
      delivery_partner_id: new.delivery_partner_id,
      original_amount: new.original_amount,
      discount_percentage: new.discount_percentage,
      discount_amount: new.discount_amount,
      final_amount: new.final_amount,
      github_username: new.github_username,
      github_verified: new.github_verified,
      created_at: now,
      updated_at: now,
    };
    self.tables.write().orders.push(order.clone());
    Ok(order)
  }

  async fn get_order(&self, id: Uuid) -> Result<Option<Order>> {
    Ok(self.tables.read().orders.iter().find(|o| o.id == id).cloned())
  }

  async fn list_orders(&self, filter: &OrderFilter, limit: i64) -> Result<Vec<Order>> {
    let tables = self.tables.read();
    let orders = tables
      .orders
      .iter()
      .rev()
      .filter(|o| match &filter.tracking {
        Some(tracking) => o.tracking_number.as_deref() == Some(tracking.as_str()),
        None => true,
      })
      .filter(|o| match filter.delivery_partner_id {
        Some(partner) => o.delivery_partner_id == Some(partner),
        None => true,
      })
      .take(limit.max(0) as usize)
      .cloned()
      .collect();
    Ok(orders)
  }

  async fn count_orders(&self) -> Result<i64> {
    Ok(self.tables.read().orders.len() as i64)
  }

  async fn patch_order(&self, id: Uuid, patch: OrderPatch) -> Result<Option<Order>> {
    let mut tables = self.tables.write();
    let Some(order) = tables.orders.iter_mut().find(|o| o.id == id) else {
      return Ok(None);
    };
    if let Some(status) = patch.status {
      order.status = status;
    }
    if patch.tracking_number.is_some() {
      order.tracking_number = patch.tracking_number;
    }
    if patch.awb_number.is_some() {
      order.awb_number = patch.awb_number;
    }
    if patch.delivery_partner_id.is_some() {
      order.delivery_partner_id = patch.delivery_partner_id;
    }
    if patch.shipping_cost.is_some() {
      order.shipping_cost = patch.shipping_cost;
    }
    if patch.estimated_delivery_date.is_some() {
      order.estimated_delivery_date = patch.estimated_delivery_date;
    }
    if patch.service_type.is_some() {
      order.service_type = patch.service_type;
    }
    if patch.shiprocket_order_id.is_some() {
      order.shiprocket_order_id = patch.shiprocket_order_id;
    }
    if patch.shiprocket_shipment_id.is_some() {
      order.shiprocket_shipment_id = patch.shiprocket_shipment_id;
    }
    order.updated_at = Utc::now();
    Ok(Some(order.clone()))
  }

  async fn record_fulfillment(&self, id: Uuid, update: FulfillmentUpdate) -> Result<Option<Order>> {
    let mut tables = self.tables.write();
    let Some(order) = tables.orders.iter_mut().find(|o| o.id == id) else {
      return Ok(None);
    };
    order.shiprocket_order_id = update.shiprocket_order_id;
    order.shiprocket_shipment_id = update.shiprocket_shipment_id;
    order.awb_number = update.awb_number;
    order.tracking_number = Some(update.tracking_number);
    order.updated_at = Utc::now();
    Ok(Some(order.clone()))
  }

  async fn update_payment(&self, id: Uuid, update: PaymentUpdate) -> Result<Option<Order>> {
    let mut tables = self.tables.write();
    let Some(order) = tables.orders.iter_mut().find(|o| o.id == id) else {
      return Ok(None);
    };
    order.payment_status = update.payment_status;
    order.payment_reference = Some(update.payment_reference);
    if let Some(currency) = update.payment_currency {
      order.payment_currency = currency;
    }
    if let Some(status) = update.status {
      order.status = status;
    }
    order.updated_at = Utc::now();
    Ok(Some(order.clone()))
  }

  async fn list_paid_pending(&self) -> Result<Vec<Order>> {
    let tables = self.tables.read();
    Ok(
      tables
        .orders
        .iter()
        .rev()
        .filter(|o| o.payment_status == PaymentStatus::Paid && o.status == OrderStatus::Pending)
        .cloned()
        .collect(),
    )
  }

  async fn confirm_paid_pending(&self) -> Result<Vec<Order>> {
    let mut tables = self.tables.write();
    let now = Utc::now();
    let mut fixed = Vec::new();
    for order in tables.orders.iter_mut().rev() {
      if order.payment_status == PaymentStatus::Paid && order.status == OrderStatus::Pending {
        order.status = OrderStatus::Confirmed;
        order.updated_at = now;
        fixed.push(order.clone());
      }
    }
    Ok(fixed)
  }
}

#[async_trait]
impl PartnerStore for MemoryStore {
  async fn list_partners(&self, filter: &PartnerFilter) -> Result<Vec<DeliveryPartner>> {
    let tables = self.tables.read();
    let mut partners: Vec<DeliveryPartner> = tables
      .partners
      .iter()
      .filter(|p| !filter.active_only || p.active)
      .filter(|p| match &filter.location {
        Some(location) => contains_ci(&p.location, location),
        None => true,
      })
      .cloned()
      .collect();
    // Stable sort keeps creation order among equal loads.
    partners.sort_by_key(|p| p.assigned_orders_count);
    Ok(partners)
  }

  async fn get_partner(&self, id: Uuid) -> Result<Option<DeliveryPartner>> {
    Ok(self.tables.read().partners.iter().find(|p| p.id == id).cloned())
  }

  async fn create_partner(&self, new: NewDeliveryPartner) -> Result<DeliveryPartner> {
    let now = Utc::now();
    let partner = DeliveryPartner {
      id: Uuid::new_v4(),
      name: new.name,
      email: new.email,
      phone: new.phone,
      location: new.location,
      service_type: new.service_type,
      active: true,
      assigned_orders_count: 0,
      rating: new.rating,
      created_at: now,
      updated_at: now,
    };
    self.tables.write().partners.push(partner.clone());
    Ok(partner)
  }

  async fn patch_partner(&self, id: Uuid, patch: DeliveryPartnerPatch) -> Result<Option<DeliveryPartner>> {
    let mut tables = self.tables.write();
    let Some(partner) = tables.partners.iter_mut().find(|p| p.id == id) else {
      return Ok(None);
    };
    if let Some(name) = patch.name {
      partner.name = name;
    }
    if let Some(email) = patch.email {
      partner.email = email;
    }
    if let Some(phone) = patch.phone {
      partner.phone = phone;
    }
    if let Some(location) = patch.location {
      partner.location = location;
    }
    if let Some(service_type) = patch.service_type {
      partner.service_type = service_type;
    }
    if let Some(active) = patch.active {
      partner.active = active;
    }
    if let Some(rating) = patch.rating {
      partner.rating = rating;
    }
    partner.updated_at = Utc::now();
    Ok(Some(partner.clone()))
  }

  async fn delete_partner(&self, id: Uuid) -> Result<bool> {
    let mut tables = self.tables.write();
    let before = tables.partners.len();
    tables.partners.retain(|p| p.id != id);
    Ok(tables.partners.len() < before)
  }

  async fn least_loaded_active(&self) -> Result<Option<DeliveryPartner>> {
    let tables = self.tables.read();
    // min_by_key returns the first minimum, i.e. the oldest partner on ties.
    Ok(
      tables
        .partners
        .iter()
        .filter(|p| p.active)
        .min_by_key(|p| p.assigned_orders_count)
        .cloned(),
    )
  }

  async fn increment_load(&self, id: Uuid) -> Result<bool> {
    let mut tables = self.tables.write();
    match tables.partners.iter_mut().find(|p| p.id == id) {
      Some(partner) => {
        partner.assigned_orders_count += 1;
        partner.updated_at = Utc::now();
        Ok(true)
      }
      None => Ok(false),
    }
  }
}

#[async_trait]
impl DealerStore for MemoryStore {
  async fn list_dealers(&self, filter: &DealerFilter) -> Result<Vec<Dealer>> {
    let tables = self.tables.read();
    Ok(
      tables
        .dealers
        .iter()
        .rev()
        .filter(|d| filter.active.map_or(true, |active| d.active == active))
        .filter(|d| match &filter.location {
          Some(location) => contains_ci(&d.location, location),
          None => true,
        })
        .cloned()
        .collect(),
    )
  }

  async fn create_dealer(&self, new: NewDealer) -> Result<Dealer> {
    let now = Utc::now();
    let dealer = Dealer {
      id: Uuid::new_v4(),
      name: new.name,
      email: new.email,
      phone: new.phone,
      location: new.location,
      active: true,
      assigned_orders_count: 0,
      created_at: now,
      updated_at: now,
    };
    self.tables.write().dealers.push(dealer.clone());
    Ok(dealer)
  }
}

#[async_trait]
impl VerificationStore for MemoryStore {
  async fn find_by_username(&self, username: &str) -> Result<Option<VerifiedGithubUser>> {
    Ok(
      self
        .tables
        .read()
        .verified
        .iter()
        .find(|v| v.github_username == username)
        .cloned(),
    )
  }

  async fn find_by_email(&self, email: &str) -> Result<Option<VerifiedGithubUser>> {
    let tables = self.tables.read();
    Ok(
      tables
        .verified
        .iter()
        .filter(|v| v.user_email.as_deref() == Some(email))
        .max_by_key(|v| v.verified_at)
        .cloned(),
    )
  }

  async fn insert_verification(&self, new: NewVerification) -> Result<Option<VerifiedGithubUser>> {
    let mut tables = self.tables.write();
    if tables.verified.iter().any(|v| v.github_username == new.github_username) {
      return Ok(None);
    }
    let user = VerifiedGithubUser {
      id: Uuid::new_v4(),
      github_username: new.github_username,
      user_email: new.user_email,
      repo_owner: new.repo_owner,
      repo_name: new.repo_name,
      verified_at: new.verified_at,
      created_at: Utc::now(),
    };
    tables.verified.push(user.clone());
    Ok(Some(user))
  }

  async fn upsert_stargazer(
    &self,
    username: &str,
    starred_at: DateTime<Utc>,
    repo_owner: &str,
    repo_name: &str,
  ) -> Result<UpsertOutcome> {
    let mut tables = self.tables.write();
    if let Some(existing) = tables.verified.iter_mut().find(|v| v.github_username == username) {
      if existing.verified_at == starred_at {
        return Ok(UpsertOutcome::Unchanged);
      }
      existing.verified_at = starred_at;
      return Ok(UpsertOutcome::Updated);
    }
    tables.verified.push(VerifiedGithubUser {
      id: Uuid::new_v4(),
      github_username: username.to_string(),
      user_email: None,
      repo_owner: repo_owner.to_string(),
      repo_name: repo_name.to_string(),
      verified_at: starred_at,
      created_at: Utc::now(),
    });
    Ok(UpsertOutcome::Inserted)
  }

  async fn recent_verifications(&self, limit: i64) -> Result<Vec<VerifiedGithubUser>> {
    let mut users = self.tables.read().verified.clone();
    users.sort_by(|a, b| b.verified_at.cmp(&a.verified_at));
    users.truncate(limit.max(0) as usize);
    Ok(users)
  }
}

#[cfg(test)]
mod tests {
  use super::*;
  use crate::models::StockMap;
  use rust_decimal::Decimal;

  fn stock(pairs: &[(&str, i32)]) -> StockMap {
    pairs.iter().map(|(s, n)| (s.to_string(), *n)).collect()
  }

  #[tokio::test]
  async fn decrement_is_refused_when_stock_is_short() {
    let store = MemoryStore::new();
    let product = store
      .create_product(NewProduct::new("Tee", Decimal::new(10, 0)).with_stock(stock(&[("S", 5)])))
      .await
      .unwrap();

    assert_eq!(
      store.decrement_stock(product.id, "S", 2).await.unwrap(),
      StockDecrement::Applied { remaining: 3 }
    );
    assert_eq!(
      store.decrement_stock(product.id, "S", 4).await.unwrap(),
      StockDecrement::Insufficient
    );
    assert_eq!(
      store.decrement_stock(product.id, "XL", 1).await.unwrap(),
      StockDecrement::Insufficient
    );
    assert_eq!(
      store.decrement_stock(Uuid::new_v4(), "S", 1).await.unwrap(),
      StockDecrement::ProductMissing
    );
    let reloaded = store.get_product(product.id).await.unwrap().unwrap();
    assert_eq!(reloaded.stock_for("S"), 3);
  }

  #[tokio::test]
  async fn least_loaded_prefers_oldest_on_ties() {
    let store = MemoryStore::new();
    let new = |name: &str| NewDeliveryPartner {
      name: name.to_string(),
      email: format!("{name}@example.com"),
      phone: "9999999999".to_string(),
      location: "Noida".to_string(),
      service_type: "standard".to_string(),
      rating: 5.0,
    };
    let first = store.create_partner(new("first")).await.unwrap();
    let second = store.create_partner(new("second")).await.unwrap();

    assert_eq!(store.least_loaded_active().await.unwrap().unwrap().id, first.id);
    assert!(store.increment_load(first.id).await.unwrap());
    assert_eq!(store.least_loaded_active().await.unwrap().unwrap().id, second.id);

    store
      .patch_partner(
        second.id,
        DeliveryPartnerPatch {
          active: Some(false),
          ..Default::default()
        },
      )
      .await
      .unwrap();
    assert_eq!(store.least_loaded_active().await.unwrap().unwrap().id, first.id);
  }

  #[tokio::test]
  async fn stargazer_upsert_reports_what_changed() {
    let store = MemoryStore::new();
    let t1 = Utc::now();
    let t2 = t1 + chrono::Duration::seconds(60);

    assert_eq!(
      store.upsert_stargazer("octocat", t1, "o", "r").await.unwrap(),
      UpsertOutcome::Inserted
    );
    assert_eq!(
      store.upsert_stargazer("octocat", t1, "o", "r").await.unwrap(),
      UpsertOutcome::Unchanged
    );
    assert_eq!(
      store.upsert_stargazer("octocat", t2, "o", "r").await.unwrap(),
      UpsertOutcome::Updated
    );
  }
}
