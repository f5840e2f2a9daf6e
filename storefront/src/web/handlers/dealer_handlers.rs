// storefront/src/web/handlers/dealer_handlers.rs

use actix_web::{web, HttpResponse};
use serde::Deserialize;
use serde_json::json;
use tracing::{info, instrument};

use super::non_blank;
use crate::errors::AppError;
use crate::models::{DealerFilter, NewDealer};
use crate::state::AppState;

#[derive(Deserialize, Debug)]
pub struct ListDealersQuery {
  pub active: Option<bool>,
  pub location: Option<String>,
}

#[derive(Deserialize, Debug, Default)]
pub struct CreateDealerRequest {
  pub name: Option<String>,
  pub email: Option<String>,
  pub phone: Option<String>,
  pub location: Option<String>,
}

#[instrument(name = "handler::list_dealers", skip(app_state))]
pub async fn list_dealers_handler(
  app_state: web::Data<AppState>,
  query: web::Query<ListDealersQuery>,
) -> Result<HttpResponse, AppError> {
  let filter = DealerFilter {
    active: query.active,
    location: non_blank(&query.location),
  };
  let dealers = app_state.store.list_dealers(&filter).await?;
  Ok(HttpResponse::Ok().json(json!({ "dealers": dealers })))
}

#[instrument(name = "handler::create_dealer", skip(app_state))]
pub async fn create_dealer_handler(
  app_state: web::Data<AppState>,
  body: web::Json<CreateDealerRequest>,
) -> Result<HttpResponse, AppError> {
  let (Some(name), Some(email), Some(phone), Some(location)) = (
    non_blank(&body.name),
    non_blank(&body.email),
    non_blank(&body.phone),
    non_blank(&body.location),
  ) else {
    return Err(AppError::Validation(
      "Missing required fields: name, email, phone, location".to_string(),
    ));
  };

  let dealer = app_state
    .store
    .create_dealer(NewDealer {
      name,
      email,
      phone,
      location,
    })
    .await
    .map_err(|e| AppError::Persistence(format!("Failed to create dealer: {}", e)))?;
  info!(dealer_id = %dealer.id, "Dealer created.");
  Ok(HttpResponse::Created().json(json!({ "dealer": dealer })))
}
