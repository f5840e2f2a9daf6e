// storefront/src/models/dealer.rs

use chrono::{DateTime, Utc};
use serde::Serialize;
use sqlx::FromRow;
use uuid::Uuid;

#[derive(Debug, Clone, Serialize, FromRow)]
pub struct Dealer {
  pub id: Uuid,
  pub name: String,
  pub email: String,
  pub phone: String,
  pub location: String,
  pub active: bool,
  pub assigned_orders_count: i32,
  pub created_at: DateTime<Utc>,
  pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone)]
pub struct NewDealer {
  pub name: String,
  pub email: String,
  pub phone: String,
  pub location: String,
}

#[derive(Debug, Clone, Default)]
pub struct DealerFilter {
  pub active: Option<bool>,
  pub location: Option<String>,
}
