// storefront/src/services/shipping.rs

use crate::errors::{AppError, Result};
use rust_decimal::{Decimal, RoundingStrategy};
use serde::Serialize;

pub const DEFAULT_SERVICE_TYPE: &str = "standard";

/// Default package weight in kilograms.
pub fn default_weight() -> Decimal {
  Decimal::new(2, 1)
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ShippingQuote {
  pub shipping_cost: Decimal,
  pub estimated_days: i64,
  pub service_type: String,
}

fn service_terms(service_type: &str) -> (Decimal, i64) {
  match service_type {
    "express" => (Decimal::new(15, 1), 2),
    "same_day" => (Decimal::new(25, 1), 1),
    _ => (Decimal::ONE, 5),
  }
}

/// `round2((5 + weight * 2) * multiplier)`. Unknown service types are priced
/// as `standard` but keep their name in the quote.
pub fn quote(weight: Decimal, service_type: &str) -> Result<ShippingQuote> {
  if weight.is_sign_negative() && !weight.is_zero() {
    return Err(AppError::Validation("product_weight must not be negative".to_string()));
  }
  let (multiplier, estimated_days) = service_terms(service_type);
  let raw = weight
    .checked_mul(Decimal::from(2))
    .and_then(|w| w.checked_add(Decimal::from(5)))
    .and_then(|base| base.checked_mul(multiplier))
    .ok_or_else(|| AppError::Validation("product_weight is too large".to_string()))?;
  Ok(ShippingQuote {
    shipping_cost: raw.round_dp_with_strategy(2, RoundingStrategy::MidpointAwayFromZero),
    estimated_days,
    service_type: service_type.to_string(),
  })
}

/// Used by the order flow when no quote could be produced.
pub fn fallback_quote() -> ShippingQuote {
  ShippingQuote {
    shipping_cost: Decimal::from(5),
    estimated_days: 5,
    service_type: DEFAULT_SERVICE_TYPE.to_string(),
  }
}
