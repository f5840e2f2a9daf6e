// storefront/src/pipelines/place_order_pipeline.rs

use crate::errors::{AppError, Result};
use crate::models::{
  non_blank, FulfillmentUpdate, NewOrder, OrderStatus, PaymentCurrency, PaymentStatus, StockDecrement,
};
use crate::pipelines::contexts::{PlaceOrderCtxData, PlaceOrderRequest, ShipmentRecord, ValidatedOrder};
use crate::services::discount::{self, normalize_username, DiscountBreakdown};
use crate::services::shipping::{self, DEFAULT_SERVICE_TYPE};
use crate::services::shiprocket::ShipmentOrder;
use crate::services::tracking::generate_tracking_code;
use chrono::{Duration, Utc};
use merch_flow::{Flow, FlowContext, FlowControl, FlowRegistry, SkipCondition, StepPolicy};
use std::sync::Arc;
use tracing::{info, warn};
use uuid::Uuid;

pub const STEP_VALIDATE: &str = "validate_order_input";
pub const STEP_LOAD_PRODUCT: &str = "load_product";
pub const STEP_CHECK_STOCK: &str = "check_stock";
pub const STEP_DISCOUNT: &str = "compute_discount";
pub const STEP_ASSIGN_PARTNER: &str = "assign_delivery_partner";
pub const STEP_SHIPPING: &str = "estimate_shipping";
pub const STEP_TRACKING: &str = "issue_tracking_code";
pub const STEP_PERSIST: &str = "persist_order";
pub const STEP_SHIPMENT: &str = "create_shipment";
pub const STEP_DECREMENT_STOCK: &str = "decrement_stock";
pub const STEP_PARTNER_LOAD: &str = "increment_partner_load";

/// Field checks for `POST /orders`, applying the documented defaults.
pub fn validate_order_request(req: &PlaceOrderRequest) -> Result<ValidatedOrder> {
  let (Some(product_id), Some(size)) = (non_blank(&req.product_id), non_blank(&req.size)) else {
    return Err(AppError::Validation("Product ID and size are required".to_string()));
  };
  let product_id =
    Uuid::parse_str(&product_id).map_err(|_| AppError::Validation("Invalid product_id".to_string()))?;

  let (Some(user_name), Some(user_email), Some(user_phone), Some(shipping_address)) = (
    non_blank(&req.user_name),
    non_blank(&req.user_email),
    non_blank(&req.user_phone),
    non_blank(&req.shipping_address),
  ) else {
    return Err(AppError::Validation(
      "User details are required: name, email, phone, and shipping address".to_string(),
    ));
  };

  let quantity = req.quantity.unwrap_or(1);
  if quantity < 1 {
    return Err(AppError::Validation("Quantity must be at least 1".to_string()));
  }
  let quantity =
    i32::try_from(quantity).map_err(|_| AppError::Validation("Quantity is too large".to_string()))?;

  let payment_status = match non_blank(&req.payment_status) {
    Some(raw) => raw.parse::<PaymentStatus>()?,
    None => PaymentStatus::Pending,
  };
  let payment_reference = non_blank(&req.payment_reference);
  if payment_status == PaymentStatus::Paid && payment_reference.is_none() {
    return Err(AppError::Validation(
      "Payment reference is required when payment_status is \"paid\". Payment must be verified before order confirmation."
        .to_string(),
    ));
  }
  let payment_currency = match non_blank(&req.payment_currency) {
    Some(raw) => raw.parse::<PaymentCurrency>()?,
    None => PaymentCurrency::default(),
  };

  Ok(ValidatedOrder {
    product_id,
    size,
    quantity,
    user_name,
    user_email,
    user_phone,
    shipping_address,
    payment_status,
    payment_reference,
    payment_currency,
    github_username: req.github_username.as_deref().and_then(normalize_username),
  })
}

fn missing(what: &str) -> AppError {
  AppError::Internal(format!("order flow state missing: {}", what))
}

pub fn register_place_order_flow(registry: &FlowRegistry<AppError>) {
  let not_paid: SkipCondition<PlaceOrderCtxData> = Arc::new(|ctx: &FlowContext<PlaceOrderCtxData>| !ctx.read().is_paid());
  let no_discount_identity: SkipCondition<PlaceOrderCtxData> = Arc::new(|ctx: &FlowContext<PlaceOrderCtxData>| {
    let guard = ctx.read();
    guard
      .input
      .as_ref()
      .map_or(true, |i| i.github_username.is_none() && i.user_email.is_empty())
  });
  let no_partner_load: SkipCondition<PlaceOrderCtxData> = Arc::new(|ctx: &FlowContext<PlaceOrderCtxData>| {
    let guard = ctx.read();
    !guard.is_paid() || guard.partner.is_none()
  });

  let mut flow = Flow::<PlaceOrderCtxData, AppError>::new(&[
    (STEP_VALIDATE, StepPolicy::Required, None),
    (STEP_LOAD_PRODUCT, StepPolicy::Required, None),
    (STEP_CHECK_STOCK, StepPolicy::Required, None),
    (STEP_DISCOUNT, StepPolicy::BestEffort, Some(no_discount_identity)),
    (STEP_ASSIGN_PARTNER, StepPolicy::BestEffort, None),
    (STEP_SHIPPING, StepPolicy::BestEffort, None),
    (STEP_TRACKING, StepPolicy::Required, None),
    (STEP_PERSIST, StepPolicy::Required, None),
    (STEP_SHIPMENT, StepPolicy::BestEffort, Some(not_paid.clone())),
    (STEP_DECREMENT_STOCK, StepPolicy::Required, Some(not_paid)),
    (STEP_PARTNER_LOAD, StepPolicy::BestEffort, Some(no_partner_load)),
  ])
  .named("place_order");

  flow.on_step(STEP_VALIDATE, |ctx: FlowContext<PlaceOrderCtxData>| {
    Box::pin(async move {
      let validated = validate_order_request(&ctx.read().request)?;
      info!(
        product_id = %validated.product_id,
        size = %validated.size,
        quantity = validated.quantity,
        payment_status = %validated.payment_status,
        "Order input validated."
      );
      ctx.write().input = Some(validated);
      Ok(FlowControl::Continue)
    })
  });

  flow.on_step(STEP_LOAD_PRODUCT, |ctx: FlowContext<PlaceOrderCtxData>| {
    Box::pin(async move {
      let (store, product_id, quantity) = {
        let guard = ctx.read();
        let input = guard.input.as_ref().ok_or_else(|| missing("input"))?;
        (guard.app_state.store.clone(), input.product_id, input.quantity)
      };
      let product = store
        .get_product(product_id)
        .await?
        .ok_or_else(|| AppError::NotFound("Product not found".to_string()))?;

      let original_amount = product
        .price
        .checked_mul(rust_decimal::Decimal::from(quantity))
        .ok_or_else(|| AppError::Validation("order total is too large".to_string()))?;
      let mut guard = ctx.write();
      guard.discount = Some(DiscountBreakdown::none(original_amount));
      guard.product = Some(product);
      Ok(FlowControl::Continue)
    })
  });

  flow.on_step(STEP_CHECK_STOCK, |ctx: FlowContext<PlaceOrderCtxData>| {
    Box::pin(async move {
      let guard = ctx.read();
      let input = guard.input.as_ref().ok_or_else(|| missing("input"))?;
      let product = guard.product.as_ref().ok_or_else(|| missing("product"))?;
      let available = product.stock_for(&input.size);
      if available < input.quantity {
        return Err(AppError::InsufficientStock(format!(
          "Insufficient stock. Only {} available in size {}",
          available, input.size
        )));
      }
      Ok(FlowControl::Continue)
    })
  });

  flow.on_step(STEP_DISCOUNT, |ctx: FlowContext<PlaceOrderCtxData>| {
    Box::pin(async move {
      let (app_state, username, email, original_amount) = {
        let guard = ctx.read();
        let input = guard.input.as_ref().ok_or_else(|| missing("input"))?;
        let original = guard
          .discount
          .as_ref()
          .map(|d| d.original_amount)
          .ok_or_else(|| missing("original amount"))?;
        (
          guard.app_state.clone(),
          input.github_username.clone(),
          input.user_email.clone(),
          original,
        )
      };

      let breakdown = discount::evaluate(
        app_state.store.as_ref(),
        app_state.stars.as_ref(),
        &app_state.discount_policy,
        username.as_deref(),
        Some(email.as_str()),
        original_amount,
      )
      .await?;

      if breakdown.github_verified {
        info!(pct = %breakdown.discount_percentage, "GitHub star discount applied.");
      }
      ctx.write().discount = Some(breakdown);
      Ok(FlowControl::Continue)
    })
  });

  flow.on_step(STEP_ASSIGN_PARTNER, |ctx: FlowContext<PlaceOrderCtxData>| {
    Box::pin(async move {
      let store = ctx.read().app_state.store.clone();
      let partner = store.least_loaded_active().await?;
      match &partner {
        Some(p) => info!(partner_id = %p.id, load = p.assigned_orders_count, "Delivery partner selected."),
        None => info!("No active delivery partner available."),
      }
      ctx.write().partner = partner;
      Ok(FlowControl::Continue)
    })
  });

  flow.on_step(STEP_SHIPPING, |ctx: FlowContext<PlaceOrderCtxData>| {
    Box::pin(async move {
      let quote = shipping::quote(shipping::default_weight(), DEFAULT_SERVICE_TYPE)?;
      ctx.write().shipping = Some(quote);
      Ok(FlowControl::Continue)
    })
  });

  flow.on_step(STEP_TRACKING, |ctx: FlowContext<PlaceOrderCtxData>| {
    Box::pin(async move {
      ctx.write().tracking_code = Some(generate_tracking_code());
      Ok(FlowControl::Continue)
    })
  });

  flow.on_step(STEP_PERSIST, |ctx: FlowContext<PlaceOrderCtxData>| {
    Box::pin(async move {
      let (store, new_order) = {
        let guard = ctx.read();
        let input = guard.input.clone().ok_or_else(|| missing("input"))?;
        let discount = guard.discount.clone().ok_or_else(|| missing("discount"))?;
        let tracking_number = guard.tracking_code.clone().ok_or_else(|| missing("tracking code"))?;
        let quote = guard.shipping.clone().unwrap_or_else(shipping::fallback_quote);

        let new_order = NewOrder {
          product_id: input.product_id,
          size: input.size,
          quantity: input.quantity,
          status: OrderStatus::for_payment(input.payment_status),
          payment_status: input.payment_status,
          payment_reference: input.payment_reference,
          payment_currency: input.payment_currency,
          user_name: input.user_name,
          user_email: input.user_email,
          user_phone: input.user_phone,
          shipping_address: input.shipping_address,
          shipping_cost: quote.shipping_cost,
          estimated_delivery_date: (Utc::now() + Duration::days(quote.estimated_days)).date_naive(),
          service_type: DEFAULT_SERVICE_TYPE.to_string(),
          tracking_number,
          delivery_partner_id: guard.partner.as_ref().map(|p| p.id),
          original_amount: discount.original_amount,
          discount_percentage: discount.discount_percentage,
          discount_amount: discount.discount_amount,
          final_amount: discount.final_amount,
          github_username: input.github_username,
          github_verified: discount.github_verified,
        };
        (guard.app_state.store.clone(), new_order)
      };

      let order = store
        .insert_order(new_order)
        .await
        .map_err(|e| AppError::Persistence(format!("Failed to create order: {}", e)))?;
      info!(order_id = %order.id, status = ?order.status, "Order persisted.");
      ctx.write().order = Some(order);
      Ok(FlowControl::Continue)
    })
  });

  flow.on_step(STEP_SHIPMENT, |ctx: FlowContext<PlaceOrderCtxData>| {
    Box::pin(async move {
      let (app_state, order, product) = {
        let guard = ctx.read();
        (
          guard.app_state.clone(),
          guard.order.clone().ok_or_else(|| missing("order"))?,
          guard.product.clone().ok_or_else(|| missing("product"))?,
        )
      };

      if !app_state.fulfillment.is_configured() {
        return Err(AppError::Config("Shiprocket credentials not configured".to_string()));
      }

      let payload = ShipmentOrder::for_order(&order, &product, &app_state.config.shiprocket.pickup_location);
      let created = app_state.fulfillment.create_order(&payload).await?;

      let awb_number = match created.shipment_id {
        Some(shipment_id) => match app_state.fulfillment.assign_awb(shipment_id).await {
          Ok(awb) => awb,
          Err(e) => {
            warn!(order_id = %order.id, shipment_id, error = %e, "AWB assignment failed; keeping shipment.");
            None
          }
        },
        None => None,
      };

      let local_code = order.tracking_number.clone().unwrap_or_default();
      let update = FulfillmentUpdate {
        shiprocket_order_id: created.order_id.clone(),
        shiprocket_shipment_id: created.shipment_id,
        awb_number: awb_number.clone(),
        tracking_number: awb_number.clone().unwrap_or(local_code),
      };
      let updated = app_state.store.record_fulfillment(order.id, update).await?;
      info!(
        order_id = %order.id,
        shiprocket_order_id = ?created.order_id,
        awb = ?awb_number,
        "Shipment created."
      );

      let mut guard = ctx.write();
      if let Some(updated) = updated {
        guard.order = Some(updated);
      }
      guard.shipment = Some(ShipmentRecord {
        shiprocket_order_id: created.order_id,
        shiprocket_shipment_id: created.shipment_id,
        awb_number,
      });
      Ok(FlowControl::Continue)
    })
  });

  flow.on_step(STEP_DECREMENT_STOCK, |ctx: FlowContext<PlaceOrderCtxData>| {
    Box::pin(async move {
      let (store, order_id, product_id, size, quantity) = {
        let guard = ctx.read();
        let order = guard.order.as_ref().ok_or_else(|| missing("order"))?;
        (
          guard.app_state.store.clone(),
          order.id,
          order.product_id,
          order.size.clone(),
          order.quantity,
        )
      };

      let lost_race = || AppError::Persistence(format!("Order {} recorded but stock update failed", order_id));
      match store.decrement_stock(product_id, &size, quantity).await {
        Ok(StockDecrement::Applied { remaining }) => {
          info!(%order_id, %size, remaining, "Stock decremented.");
          ctx.write().remaining_stock = Some(remaining);
          Ok(FlowControl::Continue)
        }
        Ok(outcome) => {
          warn!(%order_id, ?outcome, "Conditional stock decrement refused after order insert.");
          Err(lost_race())
        }
        Err(e) => {
          warn!(%order_id, error = %e, "Stock decrement failed after order insert.");
          Err(lost_race())
        }
      }
    })
  });

  flow.on_step(STEP_PARTNER_LOAD, |ctx: FlowContext<PlaceOrderCtxData>| {
    Box::pin(async move {
      let (store, partner_id) = {
        let guard = ctx.read();
        let partner = guard.partner.as_ref().ok_or_else(|| missing("partner"))?;
        (guard.app_state.store.clone(), partner.id)
      };
      if !store.increment_load(partner_id).await? {
        warn!(%partner_id, "Assigned delivery partner no longer exists.");
      }
      Ok(FlowControl::Continue)
    })
  });

  registry.register(flow);
}
