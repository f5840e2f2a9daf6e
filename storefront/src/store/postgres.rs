// storefront/src/store/postgres.rs

use super::{CatalogStore, DealerStore, OrderStore, PartnerStore, VerificationStore};
use crate::errors::Result;
use crate::models::{
  Dealer, DealerFilter, DeliveryPartner, DeliveryPartnerPatch, FulfillmentUpdate, NewDealer, NewDeliveryPartner,
  NewOrder, NewProduct, NewVerification, Order, OrderFilter, OrderPatch, OrderStatus, PartnerFilter, PaymentStatus,
  PaymentUpdate, Product, ProductPatch, StockDecrement, UpsertOutcome, VerifiedGithubUser,
};
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::types::Json;
use sqlx::PgPool;
use tracing::{debug, instrument};
use uuid::Uuid;

const PRODUCT_COLUMNS: &str =
  "id, name, description, price, image_url, product_type, sizes, stock, active, created_at, updated_at";

const ORDER_COLUMNS: &str = "id, product_id, size, quantity, status, payment_status, payment_reference, \
  payment_currency, user_name, user_email, user_phone, shipping_address, shipping_cost, estimated_delivery_date, \
  service_type, tracking_number, awb_number, shiprocket_order_id, shiprocket_shipment_id, delivery_partner_id, \
  original_amount, discount_percentage, discount_amount, final_amount, github_username, github_verified, \
  created_at, updated_at";

const PARTNER_COLUMNS: &str = "id, name, email, phone, location, service_type, active, assigned_orders_count, \
  rating, created_at, updated_at";

const DEALER_COLUMNS: &str = "id, name, email, phone, location, active, assigned_orders_count, created_at, updated_at";

const VERIFIED_COLUMNS: &str = "id, github_username, user_email, repo_owner, repo_name, verified_at, created_at";

#[derive(Clone)]
pub struct PgStore {
  pool: PgPool,
}

impl PgStore {
  pub async fn connect(database_url: &str) -> Result<Self> {
    let pool = PgPool::connect(database_url).await?;
    Ok(Self { pool })
  }

  pub async fn migrate(&self) -> Result<()> {
    sqlx::migrate!("./migrations")
      .run(&self.pool)
      .await
      .map_err(|e| sqlx::Error::Migrate(Box::new(e)))?;
    Ok(())
  }
}

#[async_trait]
impl CatalogStore for PgStore {
  async fn list_products(&self, active_only: bool) -> Result<Vec<Product>> {
    let products = sqlx::query_as::<_, Product>(&format!(
      "SELECT {PRODUCT_COLUMNS} FROM products WHERE ($1 = FALSE OR active = TRUE) ORDER BY created_at DESC"
    ))
    .bind(active_only)
    .fetch_all(&self.pool)
    .await?;
    Ok(products)
  }

  async fn get_product(&self, id: Uuid) -> Result<Option<Product>> {
    let product = sqlx::query_as::<_, Product>(&format!("SELECT {PRODUCT_COLUMNS} FROM products WHERE id = $1"))
      .bind(id)
      .fetch_optional(&self.pool)
      .await?;
    Ok(product)
  }

  async fn create_product(&self, new: NewProduct) -> Result<Product> {
    let product = sqlx::query_as::<_, Product>(&format!(
      "INSERT INTO products (id, name, description, price, image_url, product_type, sizes, stock, active) \
       VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9) RETURNING {PRODUCT_COLUMNS}"
    ))
    .bind(Uuid::new_v4())
    .bind(&new.name)
    .bind(&new.description)
    .bind(new.price)
    .bind(&new.image_url)
    .bind(&new.product_type)
    .bind(&new.sizes)
    .bind(Json(&new.stock))
    .bind(new.active)
    .fetch_one(&self.pool)
    .await?;
    Ok(product)
  }

  async fn update_product(&self, id: Uuid, patch: ProductPatch) -> Result<Option<Product>> {
    let product = sqlx::query_as::<_, Product>(&format!(
      "UPDATE products SET \
         name = COALESCE($2, name), \
         description = COALESCE($3, description), \
         price = COALESCE($4, price), \
         image_url = COALESCE($5, image_url), \
         product_type = COALESCE($6, product_type), \
         sizes = COALESCE($7, sizes), \
         stock = COALESCE($8, stock), \
         active = COALESCE($9, active), \
         updated_at = NOW() \
       WHERE id = $1 RETURNING {PRODUCT_COLUMNS}"
    ))
    .bind(id)
    .bind(patch.name)
    .bind(patch.description)
    .bind(patch.price)
    .bind(patch.image_url)
    .bind(patch.product_type)
    .bind(patch.sizes)
    .bind(patch.stock.map(Json))
    .bind(patch.active)
    .fetch_optional(&self.pool)
    .await?;
    Ok(product)
  }

  async fn delete_product(&self, id: Uuid) -> Result<bool> {
    let result = sqlx::query("DELETE FROM products WHERE id = $1")
      .bind(id)
      .execute(&self.pool)
      .await?;
    Ok(result.rows_affected() > 0)
  }

  #[instrument(name = "PgStore::decrement_stock", skip(self))]
  async fn decrement_stock(&self, id: Uuid, size: &str, quantity: i32) -> Result<StockDecrement> {
    let remaining: Option<i32> = sqlx::query_scalar(
      "UPDATE products SET \
         stock = jsonb_set(stock, ARRAY[$2::text], to_jsonb(COALESCE((stock->>$2::text)::int, 0) - $3)), \
         updated_at = NOW() \
       WHERE id = $1 AND COALESCE((stock->>$2::text)::int, 0) >= $3 \
       RETURNING (stock->>$2::text)::int",
    )
    .bind(id)
    .bind(size)
    .bind(quantity)
    .fetch_optional(&self.pool)
    .await?;

    if let Some(remaining) = remaining {
      return Ok(StockDecrement::Applied { remaining });
    }

    let exists: bool = sqlx::query_scalar("SELECT EXISTS(SELECT 1 FROM products WHERE id = $1)")
      .bind(id)
      .fetch_one(&self.pool)
      .await?;
    debug!(exists, "Conditional stock decrement matched no row.");
    Ok(if exists {
      StockDecrement::Insufficient
    } else {
      StockDecrement::ProductMissing
    })
  }
}

#[async_trait]
impl OrderStore for PgStore {
  #[instrument(name = "PgStore::insert_order", skip_all, fields(product_id = %new.product_id))]
  async fn insert_order(&self, new: NewOrder) -> Result<Order> {
    let order = sqlx::query_as::<_, Order>(&format!(
      "INSERT INTO orders (id, product_id, size, quantity, status, payment_status, payment_reference, \
         payment_currency, user_name, user_email, user_phone, shipping_address, shipping_cost, \
         estimated_delivery_date, service_type, tracking_number, delivery_partner_id, original_amount, \
         discount_percentage, discount_amount, final_amount, github_username, github_verified) \
       VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12, $13, $14, $15, $16, $17, $18, $19, $20, $21, $22, $23) \
       RETURNING {ORDER_COLUMNS}"
    ))
    .bind(Uuid::new_v4())
    .bind(new.product_id)
    .bind(&new.size)
    .bind(new.quantity)
    .bind(new.status)
    .bind(new.payment_status)
    .bind(&new.payment_reference)
    .bind(new.payment_currency)
    .bind(&new.user_name)
    .bind(&new.user_email)
    .bind(&new.user_phone)
    .bind(&new.shipping_address)
    .bind(new.shipping_cost)
    .bind(new.estimated_delivery_date)
    .bind(&new.service_type)
    .bind(&new.tracking_number)
    .bind(new.delivery_partner_id)
    .bind(new.original_amount)
    .bind(new.discount_percentage)
    .bind(new.discount_amount)
    .bind(new.final_amount)
    .bind(&new.github_username)
    .bind(new.github_verified)
    .fetch_one(&self.pool)
    .await?;
    Ok(order)
  }

  async fn get_order(&self, id: Uuid) -> Result<Option<Order>> {
    let order = sqlx::query_as::<_, Order>(&format!("SELECT {ORDER_COLUMNS} FROM orders WHERE id = $1"))
      .bind(id)
      .fetch_optional(&self.pool)
      .await?;
    Ok(order)
  }

  async fn list_orders(&self, filter: &OrderFilter, limit: i64) -> Result<Vec<Order>> {
    let orders = sqlx::query_as::<_, Order>(&format!(
      "SELECT {ORDER_COLUMNS} FROM orders \
       WHERE ($1::text IS NULL OR tracking_number = $1) \
         AND ($2::uuid IS NULL OR delivery_partner_id = $2) \
       ORDER BY created_at DESC LIMIT $3"
    ))
    .bind(&filter.tracking)
    .bind(filter.delivery_partner_id)
    .bind(limit)
    .fetch_all(&self.pool)
    .await?;
    Ok(orders)
  }

  async fn count_orders(&self) -> Result<i64> {
    let count: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM orders")
      .fetch_one(&self.pool)
      .await?;
    Ok(count)
  }

  async fn patch_order(&self, id: Uuid, patch: OrderPatch) -> Result<Option<Order>> {
    let order = sqlx::query_as::<_, Order>(&format!(
      "UPDATE orders SET \
         status = COALESCE($2, status), \
         tracking_number = COALESCE($3, tracking_number), \
         awb_number = COALESCE($4, awb_number), \
         delivery_partner_id = COALESCE($5, delivery_partner_id), \
         shipping_cost = COALESCE($6, shipping_cost), \
         estimated_delivery_date = COALESCE($7, estimated_delivery_date), \
         service_type = COALESCE($8, service_type), \
         shiprocket_order_id = COALESCE($9, shiprocket_order_id), \
         shiprocket_shipment_id = COALESCE($10, shiprocket_shipment_id), \
         updated_at = NOW() \
       WHERE id = $1 RETURNING {ORDER_COLUMNS}"
    ))
    .bind(id)
    .bind(patch.status)
    .bind(patch.tracking_number)
    .bind(patch.awb_number)
    .bind(patch.delivery_partner_id)
    .bind(patch.shipping_cost)
    .bind(patch.estimated_delivery_date)
    .bind(patch.service_type)
    .bind(patch.shiprocket_order_id)
    .bind(patch.shiprocket_shipment_id)
    .fetch_optional(&self.pool)
    .await?;
    Ok(order)
  }

  async fn record_fulfillment(&self, id: Uuid, update: FulfillmentUpdate) -> Result<Option<Order>> {
    let order = sqlx::query_as::<_, Order>(&format!(
      "UPDATE orders SET \
         shiprocket_order_id = $2, \
         shiprocket_shipment_id = $3, \
         awb_number = $4, \
         tracking_number = $5, \
         updated_at = NOW() \
       WHERE id = $1 RETURNING {ORDER_COLUMNS}"
    ))
    .bind(id)
    .bind(update.shiprocket_order_id)
    .bind(update.shiprocket_shipment_id)
    .bind(update.awb_number)
    .bind(update.tracking_number)
    .fetch_optional(&self.pool)
    .await?;
    Ok(order)
  }

  async fn update_payment(&self, id: Uuid, update: PaymentUpdate) -> Result<Option<Order>> {
    let order = sqlx::query_as::<_, Order>(&format!(
      "UPDATE orders SET \
         payment_status = $2, \
         payment_reference = $3, \
         payment_currency = COALESCE($4, payment_currency), \
         status = COALESCE($5, status), \
         updated_at = NOW() \
       WHERE id = $1 RETURNING {ORDER_COLUMNS}"
    ))
    .bind(id)
    .bind(update.payment_status)
    .bind(update.payment_reference)
    .bind(update.payment_currency)
    .bind(update.status)
    .fetch_optional(&self.pool)
    .await?;
    Ok(order)
  }

  async fn list_paid_pending(&self) -> Result<Vec<Order>> {
    let orders = sqlx::query_as::<_, Order>(&format!(
      "SELECT {ORDER_COLUMNS} FROM orders WHERE payment_status = $1 AND status = $2 ORDER BY created_at DESC"
    ))
    .bind(PaymentStatus::Paid)
    .bind(OrderStatus::Pending)
    .fetch_all(&self.pool)
    .await?;
    Ok(orders)
  }

  async fn confirm_paid_pending(&self) -> Result<Vec<Order>> {
    let orders = sqlx::query_as::<_, Order>(&format!(
      "UPDATE orders SET status = $3, updated_at = NOW() \
       WHERE payment_status = $1 AND status = $2 RETURNING {ORDER_COLUMNS}"
    ))
    .bind(PaymentStatus::Paid)
    .bind(OrderStatus::Pending)
    .bind(OrderStatus::Confirmed)
    .fetch_all(&self.pool)
    .await?;
    Ok(orders)
  }
}

#[async_trait]
impl PartnerStore for PgStore {
  async fn list_partners(&self, filter: &PartnerFilter) -> Result<Vec<DeliveryPartner>> {
    let partners = sqlx::query_as::<_, DeliveryPartner>(&format!(
      "SELECT {PARTNER_COLUMNS} FROM delivery_partners \
       WHERE ($1 = FALSE OR active = TRUE) \
         AND ($2::text IS NULL OR location ILIKE '%' || $2 || '%') \
       ORDER BY assigned_orders_count ASC, created_at ASC"
    ))
    .bind(filter.active_only)
    .bind(&filter.location)
    .fetch_all(&self.pool)
    .await?;
    Ok(partners)
  }

  async fn get_partner(&self, id: Uuid) -> Result<Option<DeliveryPartner>> {
    let partner =
      sqlx::query_as::<_, DeliveryPartner>(&format!("SELECT {PARTNER_COLUMNS} FROM delivery_partners WHERE id = $1"))
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;
    Ok(partner)
  }

  async fn create_partner(&self, new: NewDeliveryPartner) -> Result<DeliveryPartner> {
    let partner = sqlx::query_as::<_, DeliveryPartner>(&format!(
      "INSERT INTO delivery_partners (id, name, email, phone, location, service_type, rating) \
       VALUES ($1, $2, $3, $4, $5, $6, $7) RETURNING {PARTNER_COLUMNS}"
    ))
    .bind(Uuid::new_v4())
    .bind(&new.name)
    .bind(&new.email)
    .bind(&new.phone)
    .bind(&new.location)
    .bind(&new.service_type)
    .bind(new.rating)
    .fetch_one(&self.pool)
    .await?;
    Ok(partner)
  }

  async fn patch_partner(&self, id: Uuid, patch: DeliveryPartnerPatch) -> Result<Option<DeliveryPartner>> {
    let partner = sqlx::query_as::<_, DeliveryPartner>(&format!(
      "UPDATE delivery_partners SET \
         name = COALESCE($2, name), \
         email = COALESCE($3, email), \
         phone = COALESCE($4, phone), \
         location = COALESCE($5, location), \
         service_type = COALESCE($6, service_type), \
         active = COALESCE($7, active), \
         rating = COALESCE($8, rating), \
         updated_at = NOW() \
       WHERE id = $1 RETURNING {PARTNER_COLUMNS}"
    ))
    .bind(id)
    .bind(patch.name)
    .bind(patch.email)
    .bind(patch.phone)
    .bind(patch.location)
    .bind(patch.service_type)
    .bind(patch.active)
    .bind(patch.rating)
    .fetch_optional(&self.pool)
    .await?;
    Ok(partner)
  }

  async fn delete_partner(&self, id: Uuid) -> Result<bool> {
    let result = sqlx::query("DELETE FROM delivery_partners WHERE id = $1")
      .bind(id)
      .execute(&self.pool)
      .await?;
    Ok(result.rows_affected() > 0)
  }

  async fn least_loaded_active(&self) -> Result<Option<DeliveryPartner>> {
    let partner = sqlx::query_as::<_, DeliveryPartner>(&format!(
      "SELECT {PARTNER_COLUMNS} FROM delivery_partners WHERE active = TRUE \
       ORDER BY assigned_orders_count ASC, created_at ASC LIMIT 1"
    ))
    .fetch_optional(&self.pool)
    .await?;
    Ok(partner)
  }

  async fn increment_load(&self, id: Uuid) -> Result<bool> {
    let result = sqlx::query(
      "UPDATE delivery_partners SET assigned_orders_count = assigned_orders_count + 1, updated_at = NOW() \
       WHERE id = $1",
    )
    .bind(id)
    .execute(&self.pool)
    .await?;
    Ok(result.rows_affected() > 0)
  }
}

#[async_trait]
impl DealerStore for PgStore {
  async fn list_dealers(&self, filter: &DealerFilter) -> Result<Vec<Dealer>> {
    let dealers = sqlx::query_as::<_, Dealer>(&format!(
      "SELECT {DEALER_COLUMNS} FROM dealers \
       WHERE ($1::bool IS NULL OR active = $1) \
         AND ($2::text IS NULL OR location ILIKE '%' || $2 || '%') \
       ORDER BY created_at DESC"
    ))
    .bind(filter.active)
    .bind(&filter.location)
    .fetch_all(&self.pool)
    .await?;
    Ok(dealers)
  }

  async fn create_dealer(&self, new: NewDealer) -> Result<Dealer> {
    let dealer = sqlx::query_as::<_, Dealer>(&format!(
      "INSERT INTO dealers (id, name, email, phone, location) VALUES ($1, $2, $3, $4, $5) RETURNING {DEALER_COLUMNS}"
    ))
    .bind(Uuid::new_v4())
    .bind(&new.name)
    .bind(&new.email)
    .bind(&new.phone)
    .bind(&new.location)
    .fetch_one(&self.pool)
    .await?;
    Ok(dealer)
  }
}

#[async_trait]
impl VerificationStore for PgStore {
  async fn find_by_username(&self, username: &str) -> Result<Option<VerifiedGithubUser>> {
    let user = sqlx::query_as::<_, VerifiedGithubUser>(&format!(
      "SELECT {VERIFIED_COLUMNS} FROM verified_github_users WHERE github_username = $1"
    ))
    .bind(username)
    .fetch_optional(&self.pool)
    .await?;
    Ok(user)
  }

  async fn find_by_email(&self, email: &str) -> Result<Option<VerifiedGithubUser>> {
    let user = sqlx::query_as::<_, VerifiedGithubUser>(&format!(
      "SELECT {VERIFIED_COLUMNS} FROM verified_github_users WHERE user_email = $1 \
       ORDER BY verified_at DESC LIMIT 1"
    ))
    .bind(email)
    .fetch_optional(&self.pool)
    .await?;
    Ok(user)
  }

  async fn insert_verification(&self, new: NewVerification) -> Result<Option<VerifiedGithubUser>> {
    let user = sqlx::query_as::<_, VerifiedGithubUser>(&format!(
      "INSERT INTO verified_github_users (id, github_username, user_email, repo_owner, repo_name, verified_at) \
       VALUES ($1, $2, $3, $4, $5, $6) \
       ON CONFLICT (github_username) DO NOTHING RETURNING {VERIFIED_COLUMNS}"
    ))
    .bind(Uuid::new_v4())
    .bind(&new.github_username)
    .bind(&new.user_email)
    .bind(&new.repo_owner)
    .bind(&new.repo_name)
    .bind(new.verified_at)
    .fetch_optional(&self.pool)
    .await?;
    Ok(user)
  }

  async fn upsert_stargazer(
    &self,
    username: &str,
    starred_at: DateTime<Utc>,
    repo_owner: &str,
    repo_name: &str,
  ) -> Result<UpsertOutcome> {
    // xmax = 0 only for freshly inserted tuples.
    let inserted: Option<bool> = sqlx::query_scalar(
      "INSERT INTO verified_github_users (id, github_username, user_email, repo_owner, repo_name, verified_at) \
       VALUES ($1, $2, NULL, $3, $4, $5) \
       ON CONFLICT (github_username) DO UPDATE SET verified_at = EXCLUDED.verified_at \
         WHERE verified_github_users.verified_at IS DISTINCT FROM EXCLUDED.verified_at \
       RETURNING (xmax = 0)",
    )
    .bind(Uuid::new_v4())
    .bind(username)
    .bind(repo_owner)
    .bind(repo_name)
    .bind(starred_at)
    .fetch_optional(&self.pool)
    .await?;

    Ok(match inserted {
      Some(true) => UpsertOutcome::Inserted,
      Some(false) => UpsertOutcome::Updated,
      None => UpsertOutcome::Unchanged,
    })
  }

  async fn recent_verifications(&self, limit: i64) -> Result<Vec<VerifiedGithubUser>> {
    let users = sqlx::query_as::<_, VerifiedGithubUser>(&format!(
      "SELECT {VERIFIED_COLUMNS} FROM verified_github_users ORDER BY verified_at DESC LIMIT $1"
    ))
    .bind(limit)
    .fetch_all(&self.pool)
    .await?;
    Ok(users)
  }
}
