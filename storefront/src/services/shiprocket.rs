// storefront/src/services/shiprocket.rs

//! Shiprocket carrier API: authenticated client, shipment payloads and the
//! `Fulfillment` seam the order flow depends on.

use crate::config::ShiprocketConfig;
use crate::errors::{AppError, Result};
use crate::models::{Order, Product};
use crate::services::address::{normalize_phone, split_billing_address, split_name};
use crate::services::endpoint;
use async_trait::async_trait;
use chrono::{DateTime, Duration, Utc};
use reqwest::{Method, RequestBuilder, StatusCode};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};
use tokio::sync::Mutex;
use tracing::{debug, info, instrument, warn};

pub const TOKEN_VALIDITY_HOURS: i64 = 240;
pub const DEFAULT_PICKUP_LOCATION: &str = "Home";
const PACKAGE_LENGTH_CM: u32 = 15;
const PACKAGE_BREADTH_CM: u32 = 10;
const PACKAGE_HEIGHT_CM: u32 = 2;

fn package_weight_kg() -> Decimal {
  Decimal::new(2, 1)
}

/// Bearer token plus the instant it stops being usable.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AuthToken {
  pub token: String,
  pub expires_at: DateTime<Utc>,
}

impl AuthToken {
  pub fn is_valid_at(&self, now: DateTime<Utc>) -> bool {
    now < self.expires_at
  }
}

#[derive(Debug, Clone, Serialize)]
pub struct ShipmentItem {
  pub name: String,
  pub sku: String,
  pub units: i32,
  pub selling_price: Decimal,
}

/// Body of `POST /orders/create/adhoc`.
#[derive(Debug, Clone, Serialize)]
pub struct ShipmentOrder {
  pub order_id: String,
  pub order_date: String,
  pub pickup_location: String,
  pub billing_customer_name: String,
  pub billing_last_name: String,
  pub billing_address: String,
  pub billing_address_2: String,
  pub billing_city: String,
  pub billing_pincode: String,
  pub billing_state: String,
  pub billing_country: String,
  pub billing_email: String,
  pub billing_phone: String,
  pub shipping_is_billing: bool,
  pub shipping_customer_name: String,
  pub shipping_last_name: String,
  pub shipping_address: String,
  pub shipping_address_2: String,
  pub shipping_city: String,
  pub shipping_pincode: String,
  pub shipping_state: String,
  pub shipping_country: String,
  pub shipping_email: String,
  pub shipping_phone: String,
  pub order_items: Vec<ShipmentItem>,
  pub payment_method: String,
  pub sub_total: Decimal,
  pub length: u32,
  pub breadth: u32,
  pub height: u32,
  pub weight: Decimal,
}

/// Configured pickup name unless it looks like an address or the placeholder `Primary`.
pub fn pickup_location_name(configured: &str) -> String {
  let configured = configured.trim();
  if configured.is_empty() || configured.contains(',') || configured == "Primary" {
    DEFAULT_PICKUP_LOCATION.to_string()
  } else {
    configured.to_string()
  }
}

impl ShipmentOrder {
  /// Prepaid single-item shipment for a persisted order. Billing and shipping
  /// addresses are the same parsed customer address.
  pub fn for_order(order: &Order, product: &Product, pickup_location: &str) -> Self {
    let billing = split_billing_address(&order.shipping_address);
    let (first_name, last_name) = split_name(&order.user_name);
    let phone = normalize_phone(&order.user_phone);

    Self {
      order_id: order.id.to_string(),
      order_date: order.created_at.format("%Y-%m-%d").to_string(),
      pickup_location: pickup_location_name(pickup_location),
      billing_customer_name: first_name.clone(),
      billing_last_name: last_name.clone(),
      billing_address: billing.address.clone(),
      billing_address_2: String::new(),
      billing_city: billing.city.clone(),
      billing_pincode: billing.pincode.clone(),
      billing_state: billing.state.clone(),
      billing_country: "India".to_string(),
      billing_email: order.user_email.clone(),
      billing_phone: phone.clone(),
      shipping_is_billing: true,
      shipping_customer_name: first_name,
      shipping_last_name: last_name,
      shipping_address: billing.address,
      shipping_address_2: String::new(),
      shipping_city: billing.city,
      shipping_pincode: billing.pincode,
      shipping_state: billing.state,
      shipping_country: "India".to_string(),
      shipping_email: order.user_email.clone(),
      shipping_phone: phone,
      order_items: vec![ShipmentItem {
        name: product.name.clone(),
        sku: format!("{}-{}", product.id, order.size),
        units: order.quantity,
        selling_price: product.price,
      }],
      payment_method: "Prepaid".to_string(),
      sub_total: order.final_amount.round_dp(2),
      length: PACKAGE_LENGTH_CM,
      breadth: PACKAGE_BREADTH_CM,
      height: PACKAGE_HEIGHT_CM,
      weight: package_weight_kg(),
    }
  }
}

#[derive(Debug, Clone, Default, Serialize)]
pub struct CreatedShipment {
  pub order_id: Option<String>,
  pub shipment_id: Option<i64>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct OrdersQuery {
  #[serde(default = "default_page")]
  pub page: u32,
  #[serde(default = "default_per_page")]
  pub per_page: u32,
  pub order_id: Option<String>,
  pub status: Option<String>,
}

fn default_page() -> u32 {
  1
}

fn default_per_page() -> u32 {
  100
}

impl Default for OrdersQuery {
  fn default() -> Self {
    Self {
      page: default_page(),
      per_page: default_per_page(),
      order_id: None,
      status: None,
    }
  }
}

/// Carrier operations used by the order flow and the admin proxy endpoints.
#[async_trait]
pub trait Fulfillment: Send + Sync {
  /// False when API credentials are missing; every call would fail.
  fn is_configured(&self) -> bool;
  async fn create_order(&self, order: &ShipmentOrder) -> Result<CreatedShipment>;
  /// AWB code assigned to the shipment, if the carrier returned one.
  async fn assign_awb(&self, shipment_id: i64) -> Result<Option<String>>;
  async fn track_shipment(&self, shipment_id: i64) -> Result<Value>;
  async fn track_awb(&self, awb: &str) -> Result<Value>;
  async fn shipping_rates(&self, pickup_pincode: &str, delivery_pincode: &str, weight: Decimal) -> Result<Value>;
  async fn list_orders(&self, query: &OrdersQuery) -> Result<Value>;
  async fn get_order(&self, shiprocket_order_id: &str) -> Result<Value>;
  async fn get_shipment(&self, shipment_id: i64) -> Result<Value>;
  async fn generate_pickup(&self, shipment_ids: &[i64]) -> Result<Value>;
  async fn cancel_shipment(&self, shipment_id: i64, reason: &str) -> Result<Value>;
}

fn value_as_string(v: &Value) -> Option<String> {
  match v {
    Value::String(s) if !s.is_empty() => Some(s.clone()),
    Value::Number(n) => Some(n.to_string()),
    _ => None,
  }
}

fn value_as_i64(v: &Value) -> Option<i64> {
  match v {
    Value::Number(n) => n.as_i64(),
    Value::String(s) => s.trim().parse().ok(),
    _ => None,
  }
}

/// First of `body[key]`, then each nested path, that holds a usable value.
fn lookup<'a>(body: &'a Value, paths: &[&[&str]]) -> Option<&'a Value> {
  paths.iter().find_map(|path| {
    let v = path.iter().try_fold(body, |acc, key| acc.get(*key))?;
    if v.is_null() {
      None
    } else {
      Some(v)
    }
  })
}

pub fn parse_created_shipment(body: &Value) -> CreatedShipment {
  CreatedShipment {
    order_id: lookup(body, &[&["order_id"], &["orderId"], &["data", "order_id"]]).and_then(value_as_string),
    shipment_id: lookup(body, &[&["shipment_id"], &["shipmentId"], &["data", "shipment_id"]]).and_then(value_as_i64),
  }
}

pub fn parse_awb_code(body: &Value) -> Option<String> {
  lookup(
    body,
    &[&["awb_code"], &["response", "data", "awb_code"], &["data", "awb_code"]],
  )
  .and_then(value_as_string)
}

/// Best human-readable message from an error body.
pub fn error_message(body: &str, fallback: &str) -> String {
  match serde_json::from_str::<Value>(body) {
    Ok(parsed) => {
      let mut message = ["message", "error"]
        .iter()
        .find_map(|key| parsed.get(*key).and_then(value_as_string))
        .unwrap_or_else(|| fallback.to_string());
      if let Some(locations) = parsed.pointer("/data/data").and_then(Value::as_array) {
        let names: Vec<&str> = locations
          .iter()
          .filter_map(|loc| loc.get("pickup_location").and_then(Value::as_str))
          .collect();
        if !names.is_empty() {
          message.push_str(&format!(". Available pickup locations: {}", names.join(", ")));
        }
      }
      message
    }
    Err(_) if !body.trim().is_empty() => body.trim().to_string(),
    Err(_) => fallback.to_string(),
  }
}

#[derive(Deserialize)]
struct LoginResponse {
  token: String,
  expires_at: Option<String>,
}

pub struct ShiprocketClient {
  http: reqwest::Client,
  base_url: String,
  email: Option<String>,
  password: Option<String>,
  token: Mutex<Option<AuthToken>>,
}

impl ShiprocketClient {
  pub fn new(config: &ShiprocketConfig) -> Self {
    Self {
      http: reqwest::Client::new(),
      base_url: config.api_base_url.trim_end_matches('/').to_string(),
      email: config.email.clone(),
      password: config.password.clone(),
      token: Mutex::new(None),
    }
  }

  /// Cached token while valid; otherwise one login, shared by concurrent callers.
  pub async fn auth_token(&self) -> Result<String> {
    let mut cached = self.token.lock().await;
    if let Some(current) = cached.as_ref() {
      if current.is_valid_at(Utc::now()) {
        return Ok(current.token.clone());
      }
    }
    let fresh = self.login().await?;
    let token = fresh.token.clone();
    *cached = Some(fresh);
    Ok(token)
  }

  async fn invalidate_token(&self) {
    *self.token.lock().await = None;
  }

  #[instrument(name = "ShiprocketClient::login", skip(self))]
  async fn login(&self) -> Result<AuthToken> {
    let (Some(email), Some(password)) = (self.email.as_deref(), self.password.as_deref()) else {
      return Err(AppError::Config(
        "Shiprocket API user credentials not configured (SHIPROCKET_EMAIL, SHIPROCKET_PASSWORD)".to_string(),
      ));
    };

    let response = self
      .http
      .post(endpoint(&self.base_url, &["auth", "login"])?)
      .json(&json!({ "email": email, "password": password }))
      .send()
      .await?;
    let status = response.status();
    if !status.is_success() {
      let body = response.text().await.unwrap_or_default();
      let message = error_message(&body, "Shiprocket authentication failed");
      if status == StatusCode::UNAUTHORIZED || status == StatusCode::FORBIDDEN {
        return Err(AppError::Upstream(format!(
          "Shiprocket rejected the API user credentials: {}",
          message
        )));
      }
      return Err(AppError::Upstream(message));
    }

    let login: LoginResponse = response.json().await?;
    let expires_at = login
      .expires_at
      .as_deref()
      .and_then(|raw| DateTime::parse_from_rfc3339(raw).ok())
      .map(|dt| dt.with_timezone(&Utc))
      .unwrap_or_else(|| Utc::now() + Duration::hours(TOKEN_VALIDITY_HOURS));
    info!(%expires_at, "Shiprocket login succeeded.");
    Ok(AuthToken {
      token: login.token,
      expires_at,
    })
  }

  async fn request(&self, method: Method, path: &[&str]) -> Result<RequestBuilder> {
    let url = endpoint(&self.base_url, path)?;
    let token = self.auth_token().await?;
    Ok(self.http.request(method, url).bearer_auth(token))
  }

  async fn send(&self, request: RequestBuilder, failure: &str) -> Result<Value> {
    let response = request.send().await?;
    let status = response.status();
    let body = response.text().await?;
    if !status.is_success() {
      if status == StatusCode::UNAUTHORIZED {
        self.invalidate_token().await;
      }
      let message = error_message(&body, failure);
      warn!(%status, %message, "Shiprocket call failed.");
      if status == StatusCode::NOT_FOUND {
        return Err(AppError::NotFound(message));
      }
      return Err(AppError::Upstream(message));
    }
    serde_json::from_str(&body).map_err(|_| AppError::Upstream("Invalid JSON response from Shiprocket".to_string()))
  }
}

#[async_trait]
impl Fulfillment for ShiprocketClient {
  fn is_configured(&self) -> bool {
    self.email.is_some() && self.password.is_some()
  }

  #[instrument(name = "ShiprocketClient::create_order", skip_all, fields(order_id = %order.order_id))]
  async fn create_order(&self, order: &ShipmentOrder) -> Result<CreatedShipment> {
    let request = self.request(Method::POST, &["orders", "create", "adhoc"]).await?.json(order);
    let body = self.send(request, "Failed to create Shiprocket order").await?;
    let created = parse_created_shipment(&body);
    if created.order_id.is_none() {
      warn!("Shiprocket response carried no order_id.");
    }
    debug!(?created, "Shiprocket order created.");
    Ok(created)
  }

  #[instrument(name = "ShiprocketClient::assign_awb", skip(self))]
  async fn assign_awb(&self, shipment_id: i64) -> Result<Option<String>> {
    let request = self
      .request(Method::POST, &["courier", "assign", "awb"])
      .await?
      .json(&json!({ "shipment_id": shipment_id }));
    let body = self.send(request, "Failed to assign AWB").await?;
    Ok(parse_awb_code(&body))
  }

  async fn track_shipment(&self, shipment_id: i64) -> Result<Value> {
    let id = shipment_id.to_string();
    let request = self.request(Method::GET, &["courier", "track", "shipment", id.as_str()]).await?;
    self.send(request, "Failed to track shipment").await
  }

  async fn track_awb(&self, awb: &str) -> Result<Value> {
    let request = self.request(Method::GET, &["courier", "track", "awb", awb]).await?;
    self.send(request, "Failed to track by AWB").await
  }

  async fn shipping_rates(&self, pickup_pincode: &str, delivery_pincode: &str, weight: Decimal) -> Result<Value> {
    let request = self.request(Method::GET, &["courier", "serviceability", ""]).await?.query(&[
      ("pickup_postcode", pickup_pincode.to_string()),
      ("delivery_postcode", delivery_pincode.to_string()),
      ("weight", weight.to_string()),
      ("cod", "0".to_string()),
    ]);
    self.send(request, "Failed to get shipping rates").await
  }

  async fn list_orders(&self, query: &OrdersQuery) -> Result<Value> {
    let mut params = vec![
      ("page", query.page.to_string()),
      ("per_page", query.per_page.to_string()),
    ];
    if let Some(order_id) = &query.order_id {
      params.push(("order_id", order_id.clone()));
    }
    if let Some(status) = &query.status {
      params.push(("status", status.clone()));
    }
    let request = self.request(Method::GET, &["orders"]).await?.query(&params);
    self.send(request, "Failed to get orders from Shiprocket").await
  }

  async fn get_order(&self, shiprocket_order_id: &str) -> Result<Value> {
    let request = self
      .request(Method::GET, &["orders", "show", shiprocket_order_id])
      .await?;
    self.send(request, "Failed to get order from Shiprocket").await
  }

  async fn get_shipment(&self, shipment_id: i64) -> Result<Value> {
    let id = shipment_id.to_string();
    let request = self.request(Method::GET, &["orders", "show", "shipment", id.as_str()]).await?;
    self.send(request, "Failed to get shipment from Shiprocket").await
  }

  async fn generate_pickup(&self, shipment_ids: &[i64]) -> Result<Value> {
    let request = self
      .request(Method::POST, &["courier", "generate", "pickup"])
      .await?
      .json(&json!({ "shipment_id": shipment_ids }));
    self.send(request, "Failed to generate pickup").await
  }

  async fn cancel_shipment(&self, shipment_id: i64, reason: &str) -> Result<Value> {
    let id = shipment_id.to_string();
    let request = self
      .request(Method::POST, &["orders", "cancel", "shipment", id.as_str()])
      .await?
      .json(&json!({ "reason": reason }));
    self.send(request, "Failed to cancel shipment").await
  }
}
