// storefront/src/web/handlers/partner_handlers.rs

use actix_web::{web, HttpResponse};
use serde::Deserialize;
use serde_json::json;
use tracing::{info, instrument};

use super::{non_blank, parse_id};
use crate::errors::AppError;
use crate::models::delivery_partner::{DEFAULT_RATING, DEFAULT_SERVICE_TYPE};
use crate::models::{DeliveryPartnerPatch, NewDeliveryPartner, PartnerFilter};
use crate::state::AppState;

#[derive(Deserialize, Debug)]
pub struct ListPartnersQuery {
  pub active: Option<bool>,
  pub location: Option<String>,
}

#[derive(Deserialize, Debug, Default)]
pub struct CreatePartnerRequest {
  pub name: Option<String>,
  pub email: Option<String>,
  pub phone: Option<String>,
  pub location: Option<String>,
  pub service_type: Option<String>,
  pub rating: Option<f64>,
}

fn not_found() -> AppError {
  AppError::NotFound("Delivery partner not found".to_string())
}

#[instrument(name = "handler::list_partners", skip(app_state))]
pub async fn list_partners_handler(
  app_state: web::Data<AppState>,
  query: web::Query<ListPartnersQuery>,
) -> Result<HttpResponse, AppError> {
  let filter = PartnerFilter {
    active_only: query.active.unwrap_or(true),
    location: non_blank(&query.location),
  };
  let partners = app_state.store.list_partners(&filter).await?;
  Ok(HttpResponse::Ok().json(json!({ "delivery_partners": partners })))
}

#[instrument(name = "handler::create_partner", skip(app_state))]
pub async fn create_partner_handler(
  app_state: web::Data<AppState>,
  body: web::Json<CreatePartnerRequest>,
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

  let partner = app_state
    .store
    .create_partner(NewDeliveryPartner {
      name,
      email,
      phone,
      location,
      service_type: non_blank(&body.service_type).unwrap_or_else(|| DEFAULT_SERVICE_TYPE.to_string()),
      rating: body.rating.unwrap_or(DEFAULT_RATING),
    })
    .await
    .map_err(|e| AppError::Persistence(format!("Failed to create delivery partner: {}", e)))?;

  info!(partner_id = %partner.id, "Delivery partner created.");
  Ok(HttpResponse::Created().json(json!({ "delivery_partner": partner })))
}

#[instrument(name = "handler::get_partner", skip(app_state))]
pub async fn get_partner_handler(
  app_state: web::Data<AppState>,
  path: web::Path<String>,
) -> Result<HttpResponse, AppError> {
  let partner_id = parse_id(&path, "delivery partner id")?;
  let partner = app_state.store.get_partner(partner_id).await?.ok_or_else(not_found)?;
  Ok(HttpResponse::Ok().json(json!({ "delivery_partner": partner })))
}

#[instrument(name = "handler::update_partner", skip(app_state, body))]
pub async fn update_partner_handler(
  app_state: web::Data<AppState>,
  path: web::Path<String>,
  body: web::Json<DeliveryPartnerPatch>,
) -> Result<HttpResponse, AppError> {
  let partner_id = parse_id(&path, "delivery partner id")?;
  let partner = app_state
    .store
    .patch_partner(partner_id, body.into_inner())
    .await?
    .ok_or_else(not_found)?;
  info!(%partner_id, active = partner.active, "Delivery partner updated.");
  Ok(HttpResponse::Ok().json(json!({ "delivery_partner": partner })))
}

#[instrument(name = "handler::delete_partner", skip(app_state))]
pub async fn delete_partner_handler(
  app_state: web::Data<AppState>,
  path: web::Path<String>,
) -> Result<HttpResponse, AppError> {
  let partner_id = parse_id(&path, "delivery partner id")?;
  if !app_state.store.delete_partner(partner_id).await? {
    return Err(not_found());
  }
  info!(%partner_id, "Delivery partner deleted.");
  Ok(HttpResponse::Ok().json(json!({ "message": "Delivery partner deleted successfully" })))
}
