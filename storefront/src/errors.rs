// storefront/src/errors.rs

use actix_web::{http::StatusCode, HttpResponse, ResponseError};
use merch_flow::FlowError;
use serde_json::json;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum AppError {
  #[error("Validation Error: {0}")]
  Validation(String),

  #[error("Resource Not Found: {0}")]
  NotFound(String),

  #[error("Insufficient stock: {0}")]
  InsufficientStock(String),

  /// A write that should have succeeded did not (insert failure, lost stock race).
  #[error("Persistence Error: {0}")]
  Persistence(String),

  #[error("Upstream Service Error: {0}")]
  Upstream(String),

  #[error("Configuration Error: {0}")]
  Config(String),

  #[error("Database Error: {0}")]
  Sqlx(#[from] sqlx::Error),

  #[error("Flow Error: {source}")]
  Flow {
    #[from]
    source: FlowError,
  },

  #[error("Internal Server Error: {0}")]
  Internal(String),
}

impl From<anyhow::Error> for AppError {
  fn from(err: anyhow::Error) -> Self {
    match err.downcast::<sqlx::Error>() {
      Ok(sqlx_err) => AppError::Sqlx(sqlx_err),
      Err(other) => AppError::Internal(other.to_string()),
    }
  }
}

impl From<reqwest::Error> for AppError {
  fn from(err: reqwest::Error) -> Self {
    AppError::Upstream(err.to_string())
  }
}

impl From<std::io::Error> for AppError {
  fn from(err: std::io::Error) -> Self {
    AppError::Internal(format!("I/O error: {}", err))
  }
}

impl ResponseError for AppError {
  fn status_code(&self) -> StatusCode {
    match self {
      AppError::Validation(_) | AppError::InsufficientStock(_) => StatusCode::BAD_REQUEST,
      AppError::NotFound(_) => StatusCode::NOT_FOUND,
      AppError::Upstream(_) => StatusCode::BAD_GATEWAY,
      AppError::Persistence(_)
      | AppError::Config(_)
      | AppError::Sqlx(_)
      | AppError::Flow { .. }
      | AppError::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
    }
  }

  fn error_response(&self) -> HttpResponse {
    let status = self.status_code();
    if status.is_server_error() {
      tracing::error!(application_error = %self, "Responding with error");
    } else {
      tracing::warn!(application_error = %self, "Responding with client error");
    }
    match self {
      AppError::Validation(m)
      | AppError::NotFound(m)
      | AppError::InsufficientStock(m)
      | AppError::Persistence(m)
      | AppError::Upstream(m)
      | AppError::Config(m) => HttpResponse::build(status).json(json!({ "error": m })),
      AppError::Sqlx(_) => HttpResponse::build(status).json(json!({ "error": "Database operation failed" })),
      AppError::Flow { source } => {
        HttpResponse::build(status).json(json!({ "error": "Workflow processing error", "detail": source.to_string() }))
      }
      AppError::Internal(m) => {
        HttpResponse::build(status).json(json!({ "error": "An internal error occurred", "detail": m }))
      }
    }
  }
}

pub type Result<T, E = AppError> = std::result::Result<T, E>;
