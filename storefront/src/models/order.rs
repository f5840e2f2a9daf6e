// storefront/src/models/order.rs

use crate::errors::AppError;
use chrono::{DateTime, NaiveDate, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use sqlx::{FromRow, Type as SqlxType};
use std::fmt;
use std::str::FromStr;
use uuid::Uuid;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, SqlxType)]
#[sqlx(type_name = "order_status", rename_all = "lowercase")]
#[serde(rename_all = "lowercase")]
pub enum OrderStatus {
  Pending,
  Confirmed,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, SqlxType)]
#[sqlx(type_name = "payment_status", rename_all = "lowercase")]
#[serde(rename_all = "lowercase")]
pub enum PaymentStatus {
  Pending,
  Paid,
  Failed,
}

#[allow(clippy::upper_case_acronyms)]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize, SqlxType)]
#[sqlx(type_name = "payment_currency")]
pub enum PaymentCurrency {
  #[default]
  FET,
  USDC,
}

impl FromStr for PaymentStatus {
  type Err = AppError;

  fn from_str(s: &str) -> Result<Self, Self::Err> {
    match s {
      "pending" => Ok(PaymentStatus::Pending),
      "paid" => Ok(PaymentStatus::Paid),
      "failed" => Ok(PaymentStatus::Failed),
      _ => Err(AppError::Validation(
        "Invalid payment status. Use pending, paid, or failed.".to_string(),
      )),
    }
  }
}

impl FromStr for PaymentCurrency {
  type Err = AppError;

  fn from_str(s: &str) -> Result<Self, Self::Err> {
    match s {
      "FET" => Ok(PaymentCurrency::FET),
      "USDC" => Ok(PaymentCurrency::USDC),
      _ => Err(AppError::Validation("Invalid payment currency. Use FET or USDC.".to_string())),
    }
  }
}

impl FromStr for OrderStatus {
  type Err = AppError;

  fn from_str(s: &str) -> Result<Self, Self::Err> {
    match s {
      "pending" => Ok(OrderStatus::Pending),
      "confirmed" => Ok(OrderStatus::Confirmed),
      _ => Err(AppError::Validation("Invalid order status. Use pending or confirmed.".to_string())),
    }
  }
}

impl fmt::Display for PaymentStatus {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    let s = match self {
      PaymentStatus::Pending => "pending",
      PaymentStatus::Paid => "paid",
      PaymentStatus::Failed => "failed",
    };
    f.write_str(s)
  }
}

impl fmt::Display for PaymentCurrency {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    match self {
      PaymentCurrency::FET => f.write_str("FET"),
      PaymentCurrency::USDC => f.write_str("USDC"),
    }
  }
}

impl OrderStatus {
  /// Status an order takes on for a given payment status.
  pub fn for_payment(payment: PaymentStatus) -> Self {
    if payment == PaymentStatus::Paid {
      OrderStatus::Confirmed
    } else {
      OrderStatus::Pending
    }
  }
}

#[derive(Debug, Clone, Serialize, FromRow)]
pub struct Order {
  pub id: Uuid,
  pub product_id: Uuid,
  pub size: String,
  pub quantity: i32,
  pub status: OrderStatus,
  pub payment_status: PaymentStatus,
  pub payment_reference: Option<String>,
  pub payment_currency: PaymentCurrency,
  pub user_name: String,
  pub user_email: String,
  pub user_phone: String,
  pub shipping_address: String,
  pub shipping_cost: Option<Decimal>,
  pub estimated_delivery_date: Option<NaiveDate>,
  pub service_type: Option<String>,
  pub tracking_number: Option<String>,
  pub awb_number: Option<String>,
  pub shiprocket_order_id: Option<String>,
  pub shiprocket_shipment_id: Option<i64>,
  pub delivery_partner_id: Option<Uuid>,
  pub original_amount: Decimal,
  pub discount_percentage: Decimal,
  pub discount_amount: Decimal,
  pub final_amount: Decimal,
  pub github_username: Option<String>,
  pub github_verified: bool,
  pub created_at: DateTime<Utc>,
  pub updated_at: DateTime<Utc>,
}

/// The one insert shape used for every new order.
#[derive(Debug, Clone)]
pub struct NewOrder {
  pub product_id: Uuid,
  pub size: String,
  pub quantity: i32,
  pub status: OrderStatus,
  pub payment_status: PaymentStatus,
  pub payment_reference: Option<String>,
  pub payment_currency: PaymentCurrency,
  pub user_name: String,
  pub user_email: String,
  pub user_phone: String,
  pub shipping_address: String,
  pub shipping_cost: Decimal,
  pub estimated_delivery_date: NaiveDate,
  pub service_type: String,
  pub tracking_number: String,
  pub delivery_partner_id: Option<Uuid>,
  pub original_amount: Decimal,
  pub discount_percentage: Decimal,
  pub discount_amount: Decimal,
  pub final_amount: Decimal,
  pub github_username: Option<String>,
  pub github_verified: bool,
}

/// Admin edits. Absent fields are left untouched.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct OrderPatch {
  pub status: Option<OrderStatus>,
  pub tracking_number: Option<String>,
  pub awb_number: Option<String>,
  pub delivery_partner_id: Option<Uuid>,
  pub shipping_cost: Option<Decimal>,
  pub estimated_delivery_date: Option<NaiveDate>,
  pub service_type: Option<String>,
  pub shiprocket_order_id: Option<String>,
  pub shiprocket_shipment_id: Option<i64>,
}

#[derive(Debug, Clone, Default)]
pub struct FulfillmentUpdate {
  pub shiprocket_order_id: Option<String>,
  pub shiprocket_shipment_id: Option<i64>,
  pub awb_number: Option<String>,
  pub tracking_number: String,
}

#[derive(Debug, Clone)]
pub struct PaymentUpdate {
  pub payment_status: PaymentStatus,
  pub payment_reference: String,
  /// `None` keeps the stored currency.
  pub payment_currency: Option<PaymentCurrency>,
  /// `Some` when the payment flips the order status.
  pub status: Option<OrderStatus>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct OrderFilter {
  pub tracking: Option<String>,
  pub delivery_partner_id: Option<Uuid>,
}
