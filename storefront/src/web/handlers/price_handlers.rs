// storefront/src/web/handlers/price_handlers.rs

use actix_web::{web, HttpResponse};
use serde_json::json;

use crate::state::AppState;

pub async fn list_prices_handler(app_state: web::Data<AppState>) -> HttpResponse {
  HttpResponse::Ok().json(json!({ "prices": app_state.prices.prices() }))
}
