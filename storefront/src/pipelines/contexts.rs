// storefront/src/pipelines/contexts.rs

//! Data structs the flows run over. Handlers receive them wrapped in
//! `merch_flow::FlowContext`.

use crate::models::{DeliveryPartner, Order, PaymentCurrency, PaymentStatus, PaymentUpdate, Product};
use crate::services::discount::DiscountBreakdown;
use crate::services::shipping::ShippingQuote;
use crate::state::AppState;
use serde::Deserialize;
use uuid::Uuid;

// --- Place order ---

/// Raw `POST /orders` body. Everything is optional so that validation can
/// report missing fields with the API's own messages.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct PlaceOrderRequest {
  pub product_id: Option<String>,
  pub size: Option<String>,
  pub quantity: Option<i64>,
  pub user_name: Option<String>,
  pub user_email: Option<String>,
  pub user_phone: Option<String>,
  pub shipping_address: Option<String>,
  pub payment_status: Option<String>,
  pub payment_reference: Option<String>,
  pub payment_currency: Option<String>,
  pub github_username: Option<String>,
}

#[derive(Debug, Clone)]
pub struct ValidatedOrder {
  pub product_id: Uuid,
  pub size: String,
  pub quantity: i32,
  pub user_name: String,
  pub user_email: String,
  pub user_phone: String,
  pub shipping_address: String,
  pub payment_status: PaymentStatus,
  pub payment_reference: Option<String>,
  pub payment_currency: PaymentCurrency,
  /// Normalized handle as supplied, verified or not.
  pub github_username: Option<String>,
}

#[derive(Debug, Clone, Default)]
pub struct ShipmentRecord {
  pub shiprocket_order_id: Option<String>,
  pub shiprocket_shipment_id: Option<i64>,
  pub awb_number: Option<String>,
}

#[derive(Clone)]
pub struct PlaceOrderCtxData {
  pub app_state: AppState,
  pub request: PlaceOrderRequest,
  pub input: Option<ValidatedOrder>,
  pub product: Option<Product>,
  pub discount: Option<DiscountBreakdown>,
  pub partner: Option<DeliveryPartner>,
  pub shipping: Option<ShippingQuote>,
  pub tracking_code: Option<String>,
  pub order: Option<Order>,
  pub shipment: Option<ShipmentRecord>,
  pub remaining_stock: Option<i32>,
}

impl PlaceOrderCtxData {
  pub fn new(app_state: AppState, request: PlaceOrderRequest) -> Self {
    Self {
      app_state,
      request,
      input: None,
      product: None,
      discount: None,
      partner: None,
      shipping: None,
      tracking_code: None,
      order: None,
      shipment: None,
      remaining_stock: None,
    }
  }

  pub fn is_paid(&self) -> bool {
    self
      .input
      .as_ref()
      .is_some_and(|i| i.payment_status == PaymentStatus::Paid)
  }
}

// --- Payment verification ---

#[derive(Debug, Clone, Default, Deserialize)]
pub struct VerifyPaymentRequest {
  pub order_id: Option<String>,
  pub payment_reference: Option<String>,
  pub payment_status: Option<String>,
  pub payment_currency: Option<String>,
}

#[derive(Clone)]
pub struct VerifyPaymentCtxData {
  pub app_state: AppState,
  pub request: VerifyPaymentRequest,
  pub order_id: Option<Uuid>,
  pub update: Option<PaymentUpdate>,
  pub order: Option<Order>,
}

impl VerifyPaymentCtxData {
  pub fn new(app_state: AppState, request: VerifyPaymentRequest) -> Self {
    Self {
      app_state,
      request,
      order_id: None,
      update: None,
      order: None,
    }
  }
}
