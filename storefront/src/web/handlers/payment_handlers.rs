// storefront/src/web/handlers/payment_handlers.rs

use actix_web::{web, HttpResponse};
use merch_flow::FlowContext;
use serde::Deserialize;
use serde_json::json;
use tracing::{info, instrument};

use super::{non_blank, parse_id};
use crate::errors::AppError;
use crate::pipelines::contexts::{VerifyPaymentCtxData, VerifyPaymentRequest};
use crate::state::AppState;

#[derive(Deserialize, Debug)]
pub struct PaymentStatusQuery {
  pub order_id: Option<String>,
}

#[instrument(name = "handler::verify_payment", skip_all)]
pub async fn verify_payment_handler(
  app_state: web::Data<AppState>,
  body: web::Json<VerifyPaymentRequest>,
) -> Result<HttpResponse, AppError> {
  let ctx = FlowContext::new(VerifyPaymentCtxData::new(app_state.get_ref().clone(), body.into_inner()));
  app_state.flows.run(ctx.clone()).await?;

  let order = ctx
    .read()
    .order
    .clone()
    .ok_or_else(|| AppError::Internal("Payment flow completed without an order.".to_string()))?;

  info!(order_id = %order.id, payment_status = %order.payment_status, "Payment verified.");
  Ok(HttpResponse::Ok().json(json!({
    "success": true,
    "message": format!("Payment status updated to {}", order.payment_status),
    "payment_status": order.payment_status,
    "payment_reference": order.payment_reference,
    "payment_currency": order.payment_currency,
    "order": order,
  })))
}

#[instrument(name = "handler::payment_status", skip(app_state))]
pub async fn payment_status_handler(
  app_state: web::Data<AppState>,
  query: web::Query<PaymentStatusQuery>,
) -> Result<HttpResponse, AppError> {
  let raw = non_blank(&query.order_id)
    .ok_or_else(|| AppError::Validation("order_id query parameter is required".to_string()))?;
  let order_id = parse_id(&raw, "order_id")?;
  let order = app_state
    .store
    .get_order(order_id)
    .await?
    .ok_or_else(|| AppError::NotFound("Order not found".to_string()))?;

  Ok(HttpResponse::Ok().json(json!({
    "order_id": order.id,
    "payment_status": order.payment_status,
    "payment_reference": order.payment_reference,
    "payment_currency": order.payment_currency,
    "order_status": order.status,
    "created_at": order.created_at,
    "updated_at": order.updated_at,
  })))
}
