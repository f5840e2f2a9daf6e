// storefront/src/models/product.rs

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use sqlx::types::Json;
use sqlx::FromRow;
use std::collections::BTreeMap;
use uuid::Uuid;

pub const DEFAULT_SIZES: [&str; 5] = ["S", "M", "L", "XL", "XXL"];
pub const DEFAULT_PRODUCT_TYPE: &str = "t-shirt";

/// Size label to units on hand.
pub type StockMap = BTreeMap<String, i32>;

#[derive(Debug, Clone, Serialize, FromRow)]
pub struct Product {
  pub id: Uuid,
  pub name: String,
  pub description: Option<String>,
  pub price: Decimal,
  pub image_url: Option<String>,
  pub product_type: String,
  pub sizes: Vec<String>,
  pub stock: Json<StockMap>,
  pub active: bool,
  pub created_at: DateTime<Utc>,
  pub updated_at: DateTime<Utc>,
}

impl Product {
  /// Units on hand for `size`; unknown sizes count as zero.
  pub fn stock_for(&self, size: &str) -> i32 {
    self.stock.get(size).copied().unwrap_or(0)
  }
}

pub fn default_sizes() -> Vec<String> {
  DEFAULT_SIZES.iter().map(|s| s.to_string()).collect()
}

pub fn zeroed_stock() -> StockMap {
  DEFAULT_SIZES.iter().map(|s| (s.to_string(), 0)).collect()
}

#[derive(Debug, Clone)]
pub struct NewProduct {
  pub name: String,
  pub description: Option<String>,
  pub price: Decimal,
  pub image_url: Option<String>,
  pub product_type: String,
  pub sizes: Vec<String>,
  pub stock: StockMap,
  pub active: bool,
}

impl NewProduct {
  pub fn new(name: impl Into<String>, price: Decimal) -> Self {
    Self {
      name: name.into(),
      description: None,
      price,
      image_url: None,
      product_type: DEFAULT_PRODUCT_TYPE.to_string(),
      sizes: default_sizes(),
      stock: zeroed_stock(),
      active: true,
    }
  }

  pub fn with_stock(mut self, stock: StockMap) -> Self {
    self.stock = stock;
    self
  }
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct ProductPatch {
  pub name: Option<String>,
  pub description: Option<String>,
  pub price: Option<Decimal>,
  pub image_url: Option<String>,
  pub product_type: Option<String>,
  pub sizes: Option<Vec<String>>,
  pub stock: Option<StockMap>,
  pub active: Option<bool>,
}

/// Result of the conditional stock decrement.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StockDecrement {
  Applied { remaining: i32 },
  Insufficient,
  ProductMissing,
}
