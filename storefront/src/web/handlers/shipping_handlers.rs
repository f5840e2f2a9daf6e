// storefront/src/web/handlers/shipping_handlers.rs

use actix_web::{web, HttpResponse};
use rust_decimal::Decimal;
use serde::Deserialize;
use serde_json::json;
use tracing::instrument;

use super::non_blank;
use crate::errors::AppError;
use crate::services::shipping::{self, DEFAULT_SERVICE_TYPE};

#[derive(Deserialize, Debug, Default)]
pub struct ShippingRequest {
  pub shipping_address: Option<String>,
  pub product_weight: Option<Decimal>,
  pub service_type: Option<String>,
}

#[instrument(name = "handler::calculate_shipping", skip_all)]
pub async fn calculate_shipping_handler(body: web::Json<ShippingRequest>) -> Result<HttpResponse, AppError> {
  if non_blank(&body.shipping_address).is_none() {
    return Err(AppError::Validation("Shipping address is required".to_string()));
  }
  let weight = body.product_weight.unwrap_or_else(shipping::default_weight);
  let service_type = non_blank(&body.service_type).unwrap_or_else(|| DEFAULT_SERVICE_TYPE.to_string());

  let calculation = shipping::quote(weight, &service_type)?;
  Ok(HttpResponse::Ok().json(json!({ "calculation": calculation })))
}
