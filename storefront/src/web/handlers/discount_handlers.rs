// storefront/src/web/handlers/discount_handlers.rs

use actix_web::{web, HttpResponse};
use rust_decimal::Decimal;
use serde::Deserialize;
use tracing::instrument;

use crate::errors::AppError;
use crate::services::discount;
use crate::state::AppState;

#[derive(Deserialize, Debug, Default)]
pub struct DiscountRequest {
  pub github_username: Option<String>,
  pub user_email: Option<String>,
  pub original_amount: Option<Decimal>,
}

#[instrument(name = "handler::calculate_discount", skip(app_state))]
pub async fn calculate_discount_handler(
  app_state: web::Data<AppState>,
  body: web::Json<DiscountRequest>,
) -> Result<HttpResponse, AppError> {
  let original_amount = body
    .original_amount
    .filter(|a| *a > Decimal::ZERO)
    .ok_or_else(|| AppError::Validation("original_amount is required and must be greater than 0".to_string()))?;

  let breakdown = discount::evaluate(
    app_state.store.as_ref(),
    app_state.stars.as_ref(),
    &app_state.discount_policy,
    body.github_username.as_deref(),
    body.user_email.as_deref(),
    original_amount,
  )
  .await?;

  Ok(HttpResponse::Ok().json(breakdown))
}
