// storefront/src/web/handlers/order_handlers.rs

use actix_web::{web, HttpResponse};
use chrono::{Duration, Utc};
use merch_flow::FlowContext;
use rust_decimal::Decimal;
use serde::Serialize;
use serde_json::json;
use tracing::{info, instrument, warn};
use uuid::Uuid;

use super::parse_id;
use crate::errors::AppError;
use crate::models::{Order, OrderFilter, OrderPatch, PaymentStatus};
use crate::pipelines::contexts::{PlaceOrderCtxData, PlaceOrderRequest};
use crate::services::shipping;
use crate::state::AppState;
use crate::store::MAX_ORDER_LIST;

const SHIPROCKET_DASHBOARD_BASE: &str = "https://app.shiprocket.in/orders";

#[derive(Serialize, Debug)]
struct ProductSummary {
  name: String,
  price: Decimal,
  image_url: Option<String>,
  description: Option<String>,
}

#[derive(Serialize, Debug)]
struct PartnerSummary {
  name: String,
  email: String,
  phone: String,
  location: String,
  service_type: String,
  rating: f64,
}

#[derive(Serialize, Debug)]
struct OrderDetail {
  #[serde(flatten)]
  order: Order,
  products: Option<ProductSummary>,
  delivery_partners: Option<PartnerSummary>,
}

#[instrument(name = "handler::create_order", skip_all)]
pub async fn create_order_handler(
  app_state: web::Data<AppState>,
  body: web::Json<PlaceOrderRequest>,
) -> Result<HttpResponse, AppError> {
  let ctx = FlowContext::new(PlaceOrderCtxData::new(app_state.get_ref().clone(), body.into_inner()));

  let report = app_state.flows.run(ctx.clone()).await.map_err(|e| {
    warn!(error = %e, "Order flow failed.");
    e
  })?;

  let guard = ctx.read();
  let order = guard.order.clone().ok_or_else(|| {
    AppError::Internal("Order flow completed but no order was recorded.".to_string())
  })?;
  let discount = guard.discount.clone();
  let quote = guard.shipping.clone().unwrap_or_else(shipping::fallback_quote);
  let shipment = guard.shipment.clone().unwrap_or_default();
  drop(guard);

  let paid = order.payment_status == PaymentStatus::Paid;
  let degraded_steps = report.degraded_step_names();
  if report.is_degraded() {
    warn!(order_id = %order.id, ?degraded_steps, "Order placed with degraded steps.");
  }
  info!(order_id = %order.id, paid, "Order placed.");

  let (message, mut response) = if paid {
    ("Order placed successfully!", HttpResponse::Created())
  } else {
    ("Order saved. Awaiting payment confirmation.", HttpResponse::Accepted())
  };
  let estimated_delivery_date = order
    .estimated_delivery_date
    .unwrap_or_else(|| (Utc::now() + Duration::days(quote.estimated_days)).date_naive());
  let dashboard_url = shipment
    .shiprocket_order_id
    .as_ref()
    .map(|id| format!("{}/{}", SHIPROCKET_DASHBOARD_BASE, id));

  Ok(response.json(json!({
    "message": message,
    "tracking_number": order.tracking_number,
    "awb_number": order.awb_number,
    "shiprocket_order_id": order.shiprocket_order_id,
    "shiprocket_shipment_id": order.shiprocket_shipment_id,
    "shiprocket_success": shipment.shiprocket_order_id.is_some(),
    "shiprocket_dashboard_url": dashboard_url,
    "delivery_partner_assigned": order.delivery_partner_id.is_some(),
    "shipping_cost": order.shipping_cost.unwrap_or(quote.shipping_cost),
    "estimated_delivery_date": estimated_delivery_date,
    "estimated_days": quote.estimated_days,
    "payment_status": order.payment_status,
    "payment_reference": order.payment_reference,
    "payment_currency": order.payment_currency,
    "original_amount": order.original_amount,
    "discount_percentage": order.discount_percentage,
    "discount_amount": order.discount_amount,
    "final_amount": order.final_amount,
    "github_verified": discount.as_ref().is_some_and(|d| d.github_verified),
    "github_username": order.github_username,
    "degraded_steps": degraded_steps,
    "order": order,
  })))
}

#[instrument(name = "handler::list_orders", skip(app_state))]
pub async fn list_orders_handler(
  app_state: web::Data<AppState>,
  query: web::Query<OrderFilter>,
) -> Result<HttpResponse, AppError> {
  let orders = app_state.store.list_orders(&query, MAX_ORDER_LIST).await?;
  info!(count = orders.len(), "Orders fetched.");
  Ok(HttpResponse::Ok().json(json!({ "orders": orders })))
}

#[instrument(name = "handler::count_orders", skip(app_state))]
pub async fn count_orders_handler(app_state: web::Data<AppState>) -> Result<HttpResponse, AppError> {
  let count = app_state.store.count_orders().await?;
  Ok(HttpResponse::Ok().json(json!({ "count": count })))
}

#[instrument(name = "handler::get_order", skip(app_state))]
pub async fn get_order_handler(
  app_state: web::Data<AppState>,
  path: web::Path<String>,
) -> Result<HttpResponse, AppError> {
  let order_id = parse_id(&path, "order_id")?;
  let order = app_state
    .store
    .get_order(order_id)
    .await?
    .ok_or_else(|| AppError::NotFound("Order not found".to_string()))?;

  let products = app_state.store.get_product(order.product_id).await?.map(|p| ProductSummary {
    name: p.name,
    price: p.price,
    image_url: p.image_url,
    description: p.description,
  });
  let delivery_partners = match order.delivery_partner_id {
    Some(partner_id) => app_state.store.get_partner(partner_id).await?.map(|p| PartnerSummary {
      name: p.name,
      email: p.email,
      phone: p.phone,
      location: p.location,
      service_type: p.service_type,
      rating: p.rating,
    }),
    None => None,
  };

  Ok(HttpResponse::Ok().json(json!({
    "order": OrderDetail {
      order,
      products,
      delivery_partners,
    }
  })))
}

#[instrument(name = "handler::update_order", skip(app_state, body))]
pub async fn update_order_handler(
  app_state: web::Data<AppState>,
  path: web::Path<String>,
  body: web::Json<OrderPatch>,
) -> Result<HttpResponse, AppError> {
  let order_id = parse_id(&path, "order_id")?;
  let patch = body.into_inner();

  if let Some(partner_id) = patch.delivery_partner_id {
    ensure_partner_exists(&app_state, partner_id).await?;
  }

  let order = app_state
    .store
    .patch_order(order_id, patch)
    .await?
    .ok_or_else(|| AppError::NotFound("Order not found".to_string()))?;
  info!(%order_id, status = ?order.status, "Order updated.");
  Ok(HttpResponse::Ok().json(json!({ "order": order })))
}

async fn ensure_partner_exists(app_state: &AppState, partner_id: Uuid) -> Result<(), AppError> {
  match app_state.store.get_partner(partner_id).await? {
    Some(_) => Ok(()),
    None => Err(AppError::NotFound("Delivery partner not found".to_string())),
  }
}

/// Lists orders marked paid that are still pending.
#[instrument(name = "handler::list_unconfirmed_paid_orders", skip(app_state))]
pub async fn list_unconfirmed_paid_handler(app_state: web::Data<AppState>) -> Result<HttpResponse, AppError> {
  let orders = app_state.store.list_paid_pending().await?;
  Ok(HttpResponse::Ok().json(json!({ "count": orders.len(), "orders": orders })))
}

/// Confirms every paid order that is still pending.
#[instrument(name = "handler::fix_payment_status", skip(app_state))]
pub async fn fix_payment_status_handler(app_state: web::Data<AppState>) -> Result<HttpResponse, AppError> {
  let fixed = app_state.store.confirm_paid_pending().await?;
  if fixed.is_empty() {
    return Ok(HttpResponse::Ok().json(json!({
      "success": true,
      "message": "No orders need fixing",
      "fixed_count": 0,
    })));
  }

  info!(fixed = fixed.len(), "Confirmed paid orders left pending.");
  let summary: Vec<_> = fixed
    .iter()
    .map(|o| json!({ "id": o.id, "payment_status": o.payment_status, "status": o.status }))
    .collect();
  Ok(HttpResponse::Ok().json(json!({
    "success": true,
    "message": format!("Fixed {} orders", fixed.len()),
    "fixed_count": fixed.len(),
    "orders": summary,
  })))
}
