// storefront/src/web/handlers/agent_handlers.rs

use actix_web::{web, HttpResponse};
use serde::Deserialize;
use serde_json::json;
use tracing::{info, instrument};

use super::non_blank;
use crate::errors::AppError;
use crate::services::product_search;
use crate::state::AppState;

#[derive(Deserialize, Debug, Default)]
pub struct AgentQueryRequest {
  pub query: Option<String>,
}

/// Product lookup for the shopping agent: keyword-ranked active products
/// with absolute image URLs.
#[instrument(name = "handler::agent_query", skip(app_state))]
pub async fn agent_query_handler(
  app_state: web::Data<AppState>,
  body: web::Json<AgentQueryRequest>,
) -> Result<HttpResponse, AppError> {
  let query = non_blank(&body.query).ok_or_else(|| AppError::Validation("Query is required".to_string()))?;

  let products = app_state.store.list_products(true).await?;
  let result = product_search::search(products, &query, &app_state.config.app_base_url);
  info!(matched = result.matched, returned = result.products.len(), "Agent query answered.");

  Ok(HttpResponse::Ok().json(json!({
    "message": result.message(),
    "products": result.products,
    "query": query,
  })))
}
