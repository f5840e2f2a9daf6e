// storefront/src/models/delivery_partner.rs

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use uuid::Uuid;

pub const DEFAULT_SERVICE_TYPE: &str = "standard";
pub const DEFAULT_RATING: f64 = 5.0;

#[derive(Debug, Clone, Serialize, FromRow)]
pub struct DeliveryPartner {
  pub id: Uuid,
  pub name: String,
  pub email: String,
  pub phone: String,
  pub location: String,
  pub service_type: String,
  pub active: bool,
  pub assigned_orders_count: i32,
  pub rating: f64,
  pub created_at: DateTime<Utc>,
  pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone)]
pub struct NewDeliveryPartner {
  pub name: String,
  pub email: String,
  pub phone: String,
  pub location: String,
  pub service_type: String,
  pub rating: f64,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct DeliveryPartnerPatch {
  pub name: Option<String>,
  pub email: Option<String>,
  pub phone: Option<String>,
  pub location: Option<String>,
  pub service_type: Option<String>,
  pub active: Option<bool>,
  pub rating: Option<f64>,
}

#[derive(Debug, Clone)]
pub struct PartnerFilter {
  pub active_only: bool,
  /// Case-insensitive substring match on `location`.
  pub location: Option<String>,
}

impl Default for PartnerFilter {
  fn default() -> Self {
    Self {
      active_only: true,
      location: None,
    }
  }
}
