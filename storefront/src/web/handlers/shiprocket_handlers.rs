// storefront/src/web/handlers/shiprocket_handlers.rs

//! Thin admin proxies over the courier API.

use actix_web::{web, HttpResponse};
use rust_decimal::Decimal;
use serde::Deserialize;
use serde_json::{json, Value};
use tracing::instrument;

use super::non_blank;
use crate::errors::AppError;
use crate::services::shipping;
use crate::services::shiprocket::OrdersQuery;
use crate::state::AppState;

#[derive(Deserialize, Debug)]
pub struct TrackQuery {
  pub shipment_id: Option<String>,
  pub awb: Option<String>,
}

#[derive(Deserialize, Debug, Default)]
pub struct RatesRequest {
  pub pickup_pincode: Option<String>,
  pub delivery_pincode: Option<String>,
  pub weight: Option<Decimal>,
}

#[derive(Deserialize, Debug, Default)]
pub struct PickupRequest {
  #[serde(default)]
  pub shipment_ids: Vec<i64>,
}

#[derive(Deserialize, Debug, Default)]
pub struct CancelRequest {
  pub reason: Option<String>,
}

fn parse_shipment_id(raw: &str) -> Result<i64, AppError> {
  raw
    .trim()
    .parse::<i64>()
    .map_err(|_| AppError::Validation("shipment_id must be a number".to_string()))
}

fn found_or_missing(kind: &str, id: &str, result: Result<Value, AppError>) -> Result<HttpResponse, AppError> {
  match result {
    Ok(data) => Ok(HttpResponse::Ok().json(json!({
      "success": true,
      "found": true,
      "type": kind,
      "data": data,
    }))),
    Err(AppError::NotFound(_)) => Ok(HttpResponse::Ok().json(json!({
      "success": true,
      "found": false,
      "type": kind,
      "message": format!("{} {} not found in Shiprocket", if kind == "order" { "Order" } else { "Shipment" }, id),
    }))),
    Err(e) => Err(e),
  }
}

#[instrument(name = "handler::shiprocket_track", skip(app_state))]
pub async fn track_handler(
  app_state: web::Data<AppState>,
  query: web::Query<TrackQuery>,
) -> Result<HttpResponse, AppError> {
  let tracking = match (non_blank(&query.shipment_id), non_blank(&query.awb)) {
    (Some(shipment_id), _) => app_state.fulfillment.track_shipment(parse_shipment_id(&shipment_id)?).await?,
    (None, Some(awb)) => app_state.fulfillment.track_awb(&awb).await?,
    (None, None) => return Err(AppError::Validation("Either shipment_id or awb is required".to_string())),
  };
  let status = tracking
    .pointer("/tracking_data/shipment_status")
    .cloned()
    .unwrap_or_else(|| json!("unknown"));
  Ok(HttpResponse::Ok().json(json!({ "tracking": tracking, "status": status })))
}

#[instrument(name = "handler::shiprocket_rates", skip(app_state))]
pub async fn rates_handler(
  app_state: web::Data<AppState>,
  body: web::Json<RatesRequest>,
) -> Result<HttpResponse, AppError> {
  let pickup = non_blank(&body.pickup_pincode).unwrap_or_else(|| app_state.config.shiprocket.pickup_pincode.clone());
  let delivery = non_blank(&body.delivery_pincode)
    .ok_or_else(|| AppError::Validation("Pickup and delivery pincodes are required".to_string()))?;
  let weight = body.weight.unwrap_or_else(shipping::default_weight);

  let rates = app_state.fulfillment.shipping_rates(&pickup, &delivery, weight).await?;
  Ok(HttpResponse::Ok().json(json!({ "rates": rates })))
}

#[instrument(name = "handler::shiprocket_orders", skip(app_state))]
pub async fn list_orders_handler(
  app_state: web::Data<AppState>,
  query: web::Query<OrdersQuery>,
) -> Result<HttpResponse, AppError> {
  let data = app_state.fulfillment.list_orders(&query).await?;
  Ok(HttpResponse::Ok().json(json!({
    "success": true,
    "page": query.page,
    "per_page": query.per_page,
    "data": data,
  })))
}

#[instrument(name = "handler::shiprocket_order", skip(app_state))]
pub async fn get_order_handler(
  app_state: web::Data<AppState>,
  path: web::Path<String>,
) -> Result<HttpResponse, AppError> {
  let order_id = path.into_inner();
  let result = app_state.fulfillment.get_order(&order_id).await;
  found_or_missing("order", &order_id, result)
}

#[instrument(name = "handler::shiprocket_shipment", skip(app_state))]
pub async fn get_shipment_handler(
  app_state: web::Data<AppState>,
  path: web::Path<String>,
) -> Result<HttpResponse, AppError> {
  let raw = path.into_inner();
  let shipment_id = parse_shipment_id(&raw)?;
  let result = app_state.fulfillment.get_shipment(shipment_id).await;
  found_or_missing("shipment", &raw, result)
}

#[instrument(name = "handler::shiprocket_pickup", skip(app_state))]
pub async fn generate_pickup_handler(
  app_state: web::Data<AppState>,
  body: web::Json<PickupRequest>,
) -> Result<HttpResponse, AppError> {
  if body.shipment_ids.is_empty() {
    return Err(AppError::Validation("shipment_ids is required".to_string()));
  }
  let data = app_state.fulfillment.generate_pickup(&body.shipment_ids).await?;
  Ok(HttpResponse::Ok().json(json!({ "success": true, "data": data })))
}

#[instrument(name = "handler::shiprocket_cancel", skip(app_state))]
pub async fn cancel_shipment_handler(
  app_state: web::Data<AppState>,
  path: web::Path<String>,
  body: web::Json<CancelRequest>,
) -> Result<HttpResponse, AppError> {
  let shipment_id = parse_shipment_id(&path)?;
  let reason = non_blank(&body.reason).unwrap_or_else(|| "Cancelled by admin".to_string());
  let data = app_state.fulfillment.cancel_shipment(shipment_id, &reason).await?;
  Ok(HttpResponse::Ok().json(json!({ "success": true, "data": data })))
}
