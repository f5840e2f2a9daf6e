// storefront/src/web/handlers/mod.rs

use crate::errors::{AppError, Result};
use uuid::Uuid;

pub(crate) use crate::models::non_blank;

pub mod agent_handlers;
pub mod dealer_handlers;
pub mod discount_handlers;
pub mod github_handlers;
pub mod order_handlers;
pub mod partner_handlers;
pub mod payment_handlers;
pub mod price_handlers;
pub mod product_handlers;
pub mod shipping_handlers;
pub mod shiprocket_handlers;
pub mod upload_handlers;

/// Parses an id taken from the path or query; malformed ids are a 400.
pub(crate) fn parse_id(raw: &str, field: &str) -> Result<Uuid> {
  Uuid::parse_str(raw.trim()).map_err(|_| AppError::Validation(format!("Invalid {}", field)))
}
