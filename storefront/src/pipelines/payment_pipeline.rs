// storefront/src/pipelines/payment_pipeline.rs

use crate::errors::{AppError, Result};
use crate::models::{non_blank, OrderStatus, PaymentCurrency, PaymentStatus, PaymentUpdate};
use crate::pipelines::contexts::{VerifyPaymentCtxData, VerifyPaymentRequest};
use merch_flow::{Flow, FlowContext, FlowControl, FlowRegistry, StepPolicy};
use tracing::info;
use uuid::Uuid;

pub const STEP_VALIDATE: &str = "validate_payment_input";
pub const STEP_LOAD_ORDER: &str = "load_order";
pub const STEP_APPLY: &str = "apply_payment_update";

/// Parses the request into the target order id and the update to apply.
/// `status` is left for the load step, which knows the current order status.
pub fn validate_payment_request(req: &VerifyPaymentRequest) -> Result<(Uuid, PaymentUpdate)> {
  let (Some(order_id), Some(payment_reference), Some(payment_status)) = (
    non_blank(&req.order_id),
    non_blank(&req.payment_reference),
    non_blank(&req.payment_status),
  ) else {
    return Err(AppError::Validation(
      "order_id, payment_reference, and payment_status are required".to_string(),
    ));
  };

  let order_id = Uuid::parse_str(&order_id).map_err(|_| AppError::Validation("Invalid order_id".to_string()))?;
  let payment_status = payment_status
    .parse::<PaymentStatus>()
    .map_err(|_| AppError::Validation("Invalid payment_status. Use pending, paid, or failed.".to_string()))?;
  let payment_currency = non_blank(&req.payment_currency)
    .map(|raw| raw.parse::<PaymentCurrency>())
    .transpose()?;

  Ok((
    order_id,
    PaymentUpdate {
      payment_status,
      payment_reference,
      payment_currency,
      status: None,
    },
  ))
}

pub fn register_verify_payment_flow(registry: &FlowRegistry<AppError>) {
  let mut flow = Flow::<VerifyPaymentCtxData, AppError>::new(&[
    (STEP_VALIDATE, StepPolicy::Required, None),
    (STEP_LOAD_ORDER, StepPolicy::Required, None),
    (STEP_APPLY, StepPolicy::Required, None),
  ])
  .named("verify_payment");

  flow.on_step(STEP_VALIDATE, |ctx: FlowContext<VerifyPaymentCtxData>| {
    Box::pin(async move {
      let (order_id, update) = validate_payment_request(&ctx.read().request)?;
      let mut guard = ctx.write();
      guard.order_id = Some(order_id);
      guard.update = Some(update);
      Ok(FlowControl::Continue)
    })
  });

  flow.on_step(STEP_LOAD_ORDER, |ctx: FlowContext<VerifyPaymentCtxData>| {
    Box::pin(async move {
      let (store, order_id) = {
        let guard = ctx.read();
        let order_id = guard
          .order_id
          .ok_or_else(|| AppError::Internal("payment flow state missing: order_id".to_string()))?;
        (guard.app_state.store.clone(), order_id)
      };
      let order = store
        .get_order(order_id)
        .await?
        .ok_or_else(|| AppError::NotFound("Order not found".to_string()))?;

      let mut guard = ctx.write();
      if let Some(update) = guard.update.as_mut() {
        // Paid confirms a pending order; anything else leaves status alone.
        if update.payment_status == PaymentStatus::Paid && order.status == OrderStatus::Pending {
          update.status = Some(OrderStatus::Confirmed);
        }
      }
      guard.order = Some(order);
      Ok(FlowControl::Continue)
    })
  });

  flow.on_step(STEP_APPLY, |ctx: FlowContext<VerifyPaymentCtxData>| {
    Box::pin(async move {
      let (store, order_id, update) = {
        let guard = ctx.read();
        let missing = || AppError::Internal("payment flow state missing".to_string());
        (
          guard.app_state.store.clone(),
          guard.order_id.ok_or_else(missing)?,
          guard.update.clone().ok_or_else(missing)?,
        )
      };
      let payment_status = update.payment_status;
      let updated = store
        .update_payment(order_id, update)
        .await?
        .ok_or_else(|| AppError::NotFound("Order not found".to_string()))?;
      info!(%order_id, %payment_status, status = ?updated.status, "Payment status recorded.");
      ctx.write().order = Some(updated);
      Ok(FlowControl::Continue)
    })
  });

  registry.register(flow);
}
