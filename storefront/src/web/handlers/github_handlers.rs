// storefront/src/web/handlers/github_handlers.rs

use actix_web::{web, HttpResponse};
use serde::Deserialize;
use serde_json::json;
use tracing::{info, instrument};

use crate::errors::AppError;
use crate::services::discount::github_login;
use crate::services::star_sync::sync_stargazers;
use crate::services::star_verification::verify_star;
use crate::state::AppState;

const RECENT_VERIFIED_LIMIT: i64 = 10;

#[derive(Deserialize, Debug, Default)]
pub struct VerifyStarRequest {
  pub github_username: Option<String>,
  pub user_email: Option<String>,
}

#[derive(Deserialize, Debug)]
pub struct VerifyStarQuery {
  pub github_username: Option<String>,
}

#[instrument(name = "handler::verify_star", skip(app_state))]
pub async fn verify_star_handler(
  app_state: web::Data<AppState>,
  body: web::Json<VerifyStarRequest>,
) -> Result<HttpResponse, AppError> {
  let raw = body.github_username.as_deref().unwrap_or_default();
  let outcome = verify_star(
    app_state.store.as_ref(),
    app_state.stars.as_ref(),
    raw,
    body.user_email.as_deref(),
  )
  .await?;
  Ok(HttpResponse::Ok().json(outcome))
}

/// Reports a stored verification without calling GitHub.
#[instrument(name = "handler::star_status", skip(app_state))]
pub async fn star_status_handler(
  app_state: web::Data<AppState>,
  query: web::Query<VerifyStarQuery>,
) -> Result<HttpResponse, AppError> {
  let username = github_login(query.github_username.as_deref())?;

  let body = match app_state.store.find_by_username(&username).await? {
    Some(record) => json!({
      "verified": true,
      "github_username": record.github_username,
      "verified_at": record.verified_at,
    }),
    None => json!({
      "verified": false,
      "github_username": username,
      "message": "No star verification on record",
    }),
  };
  Ok(HttpResponse::Ok().json(body))
}

#[instrument(name = "handler::sync_stars", skip(app_state))]
pub async fn sync_stars_handler(app_state: web::Data<AppState>) -> Result<HttpResponse, AppError> {
  if !app_state.stars.is_configured() {
    return Err(AppError::Config("GitHub token not configured".to_string()));
  }

  let summary = sync_stargazers(app_state.store.as_ref(), app_state.stars.as_ref()).await?;
  let message = if summary.total_stargazers == 0 {
    "No stargazers found"
  } else {
    "Stars synced successfully"
  };
  info!(total = summary.total_stargazers, new = summary.new_users, "Manual star sync finished.");

  Ok(HttpResponse::Ok().json(json!({
    "success": true,
    "message": message,
    "total_stargazers": summary.total_stargazers,
    "new_users": summary.new_users,
    "updated_users": summary.updated_users,
    "errors": summary.errors,
    "stopped_early": summary.stopped_early,
  })))
}

#[instrument(name = "handler::recent_verified_users", skip(app_state))]
pub async fn recent_verified_handler(app_state: web::Data<AppState>) -> Result<HttpResponse, AppError> {
  let users = app_state.store.recent_verifications(RECENT_VERIFIED_LIMIT).await?;
  Ok(HttpResponse::Ok().json(json!({
    "total_verified": users.len(),
    "recent_users": users,
  })))
}
