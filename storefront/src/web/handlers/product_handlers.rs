// storefront/src/web/handlers/product_handlers.rs

use actix_web::{web, HttpResponse};
use rust_decimal::Decimal;
use serde::Deserialize;
use serde_json::json;
use tracing::{info, instrument, warn};

use super::{non_blank, parse_id};
use crate::errors::AppError;
use crate::models::product::{default_sizes, zeroed_stock, DEFAULT_PRODUCT_TYPE};
use crate::models::{NewProduct, ProductPatch, StockMap};
use crate::state::AppState;

#[derive(Deserialize, Debug)]
pub struct ListProductsQuery {
  /// `false` lists inactive products too.
  pub active: Option<bool>,
}

#[derive(Deserialize, Debug, Default)]
pub struct CreateProductRequest {
  pub name: Option<String>,
  pub description: Option<String>,
  pub price: Option<Decimal>,
  pub image_url: Option<String>,
  pub product_type: Option<String>,
  pub sizes: Option<Vec<String>>,
  pub stock: Option<StockMap>,
  pub active: Option<bool>,
}

#[instrument(name = "handler::list_products", skip(app_state))]
pub async fn list_products_handler(
  app_state: web::Data<AppState>,
  query: web::Query<ListProductsQuery>,
) -> Result<HttpResponse, AppError> {
  let products = app_state.store.list_products(query.active.unwrap_or(true)).await?;
  info!(count = products.len(), "Products fetched.");
  Ok(HttpResponse::Ok().json(json!({ "products": products })))
}

#[instrument(name = "handler::get_product", skip(app_state))]
pub async fn get_product_handler(
  app_state: web::Data<AppState>,
  path: web::Path<String>,
) -> Result<HttpResponse, AppError> {
  let product_id = parse_id(&path, "product_id")?;
  let product = app_state.store.get_product(product_id).await?.ok_or_else(|| {
    warn!(%product_id, "Product not found.");
    AppError::NotFound("Product not found".to_string())
  })?;
  Ok(HttpResponse::Ok().json(json!({ "product": product })))
}

#[instrument(name = "handler::create_product", skip_all)]
pub async fn create_product_handler(
  app_state: web::Data<AppState>,
  body: web::Json<CreateProductRequest>,
) -> Result<HttpResponse, AppError> {
  let req = body.into_inner();
  let (Some(name), Some(description), Some(price), Some(image_url)) = (
    non_blank(&req.name),
    non_blank(&req.description),
    req.price.filter(|p| *p > Decimal::ZERO),
    non_blank(&req.image_url),
  ) else {
    return Err(AppError::Validation("Missing required fields".to_string()));
  };

  let image_url = app_state.images.resolve_image_url(&image_url).await?;
  let mut stock = zeroed_stock();
  if let Some(given) = req.stock {
    stock.extend(given);
  }

  let product = app_state
    .store
    .create_product(NewProduct {
      name,
      description: Some(description),
      price,
      image_url: Some(image_url),
      product_type: non_blank(&req.product_type).unwrap_or_else(|| DEFAULT_PRODUCT_TYPE.to_string()),
      sizes: req.sizes.filter(|s| !s.is_empty()).unwrap_or_else(default_sizes),
      stock,
      active: req.active.unwrap_or(true),
    })
    .await
    .map_err(|e| AppError::Persistence(format!("Failed to create product: {}", e)))?;

  info!(product_id = %product.id, "Product created.");
  Ok(HttpResponse::Created().json(json!({ "product": product })))
}

#[instrument(name = "handler::update_product", skip(app_state, body))]
pub async fn update_product_handler(
  app_state: web::Data<AppState>,
  path: web::Path<String>,
  body: web::Json<ProductPatch>,
) -> Result<HttpResponse, AppError> {
  let product_id = parse_id(&path, "product_id")?;
  let mut patch = body.into_inner();

  if patch.price.is_some_and(|p| p <= Decimal::ZERO) {
    return Err(AppError::Validation("price must be greater than 0".to_string()));
  }
  if let Some(raw) = patch.image_url.take() {
    patch.image_url = Some(app_state.images.resolve_image_url(&raw).await?);
  }

  let product = app_state
    .store
    .update_product(product_id, patch)
    .await?
    .ok_or_else(|| AppError::NotFound("Product not found".to_string()))?;
  info!(%product_id, "Product updated.");
  Ok(HttpResponse::Ok().json(json!({ "product": product })))
}

#[instrument(name = "handler::delete_product", skip(app_state))]
pub async fn delete_product_handler(
  app_state: web::Data<AppState>,
  path: web::Path<String>,
) -> Result<HttpResponse, AppError> {
  let product_id = parse_id(&path, "product_id")?;
  if !app_state.store.delete_product(product_id).await? {
    return Err(AppError::NotFound("Product not found".to_string()));
  }
  info!(%product_id, "Product deleted.");
  Ok(HttpResponse::Ok().json(json!({ "message": "Product deleted successfully" })))
}
