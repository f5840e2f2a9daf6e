// storefront/src/config.rs

use crate::errors::{AppError, Result};
use dotenvy::dotenv;
use rust_decimal::Decimal;
use std::env;
use std::path::PathBuf;
use std::str::FromStr;

pub const DEFAULT_SHIPROCKET_BASE_URL: &str = "https://apiv2.shiprocket.in/v1/external";
pub const DEFAULT_GITHUB_BASE_URL: &str = "https://api.github.com";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StoreBackend {
  Postgres,
  Memory,
}

impl FromStr for StoreBackend {
  type Err = AppError;

  fn from_str(s: &str) -> Result<Self> {
    match s.trim().to_ascii_lowercase().as_str() {
      "postgres" | "pg" => Ok(StoreBackend::Postgres),
      "memory" | "mem" => Ok(StoreBackend::Memory),
      other => Err(AppError::Config(format!(
        "Invalid STORE_BACKEND '{}': use postgres or memory",
        other
      ))),
    }
  }
}

#[derive(Debug, Clone)]
pub struct GithubConfig {
  pub api_base_url: String,
  pub token: Option<String>,
  pub repo_owner: String,
  pub repo_name: String,
}

#[derive(Debug, Clone)]
pub struct ShiprocketConfig {
  pub api_base_url: String,
  pub email: Option<String>,
  pub password: Option<String>,
  pub pickup_location: String,
  pub pickup_pincode: String,
}

impl ShiprocketConfig {
  pub fn has_credentials(&self) -> bool {
    self.email.is_some() && self.password.is_some()
  }
}

#[derive(Debug, Clone)]
pub struct AppConfig {
  pub server_host: String,
  pub server_port: u16,
  pub app_base_url: String,

  pub store_backend: StoreBackend,
  pub database_url: Option<String>,
  pub run_migrations: bool,

  pub github: GithubConfig,
  /// 0 disables the background stargazer sync.
  pub star_sync_interval_secs: u64,

  pub shiprocket: ShiprocketConfig,

  pub upload_dir: PathBuf,
  pub upload_public_base_url: String,

  pub price_fet: Decimal,
  pub price_usdc: Decimal,
}

impl AppConfig {
  pub fn from_env() -> Result<Self> {
    dotenv().ok();

    let get_env = |var_name: &str| {
      env::var(var_name)
        .ok()
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
        .ok_or_else(|| AppError::Config(format!("Missing environment variable '{}'", var_name)))
    };

    let server_host = get_env("SERVER_HOST").unwrap_or_else(|_| "127.0.0.1".to_string());
    let server_port = get_env("SERVER_PORT")
      .unwrap_or_else(|_| "8080".to_string())
      .parse::<u16>()
      .map_err(|e| AppError::Config(format!("Invalid SERVER_PORT: {}", e)))?;
    let app_base_url = get_env("APP_BASE_URL").unwrap_or_else(|_| format!("http://{}:{}", server_host, server_port));

    let store_backend = get_env("STORE_BACKEND")
      .unwrap_or_else(|_| "postgres".to_string())
      .parse::<StoreBackend>()?;
    let database_url = match store_backend {
      StoreBackend::Postgres => Some(get_env("DATABASE_URL")?),
      StoreBackend::Memory => get_env("DATABASE_URL").ok(),
    };
    let run_migrations = get_env("RUN_MIGRATIONS")
      .unwrap_or_else(|_| "true".to_string())
      .parse::<bool>()
      .map_err(|e| AppError::Config(format!("Invalid RUN_MIGRATIONS value: {}", e)))?;

    let github = GithubConfig {
      api_base_url: get_env("GITHUB_API_BASE_URL").unwrap_or_else(|_| DEFAULT_GITHUB_BASE_URL.to_string()),
      token: get_env("GITHUB_TOKEN").ok(),
      repo_owner: get_env("GITHUB_REPO_OWNER").unwrap_or_else(|_| "gautammanak1".to_string()),
      repo_name: get_env("GITHUB_REPO_NAME").unwrap_or_else(|_| "package-download-stat".to_string()),
    };
    let star_sync_interval_secs = get_env("STAR_SYNC_INTERVAL_SECS")
      .unwrap_or_else(|_| "300".to_string())
      .parse::<u64>()
      .map_err(|e| AppError::Config(format!("Invalid STAR_SYNC_INTERVAL_SECS: {}", e)))?;

    let shiprocket = ShiprocketConfig {
      api_base_url: get_env("SHIPROCKET_API_BASE_URL").unwrap_or_else(|_| DEFAULT_SHIPROCKET_BASE_URL.to_string()),
      email: get_env("SHIPROCKET_EMAIL").ok(),
      password: get_env("SHIPROCKET_PASSWORD").ok(),
      pickup_location: get_env("SHIPROCKET_PICKUP_LOCATION").unwrap_or_else(|_| "Home".to_string()),
      pickup_pincode: get_env("SHIPROCKET_PICKUP_PINCODE").unwrap_or_else(|_| "201301".to_string()),
    };

    let upload_dir = PathBuf::from(get_env("UPLOAD_DIR").unwrap_or_else(|_| "./uploads".to_string()));
    let upload_public_base_url =
      get_env("UPLOAD_PUBLIC_BASE_URL").unwrap_or_else(|_| format!("{}/uploads", app_base_url.trim_end_matches('/')));

    let parse_price = |var_name: &str, default: &str| {
      let raw = get_env(var_name).unwrap_or_else(|_| default.to_string());
      Decimal::from_str(&raw).map_err(|e| AppError::Config(format!("Invalid {}: {}", var_name, e)))
    };
    let price_fet = parse_price("PRICE_FET", "0.1")?;
    let price_usdc = parse_price("PRICE_USDC", "0.01")?;

    tracing::info!(
      backend = ?store_backend,
      github_token_configured = github.token.is_some(),
      shiprocket_configured = shiprocket.has_credentials(),
      "Application configuration loaded successfully."
    );

    Ok(Self {
      server_host,
      server_port,
      app_base_url,
      store_backend,
      database_url,
      run_migrations,
      github,
      star_sync_interval_secs,
      shiprocket,
      upload_dir,
      upload_public_base_url,
      price_fet,
      price_usdc,
    })
  }

  /// Configuration for local runs and tests: memory store, no secrets, sync disabled.
  pub fn local_defaults() -> Self {
    Self {
      server_host: "127.0.0.1".to_string(),
      server_port: 8080,
      app_base_url: "http://127.0.0.1:8080".to_string(),
      store_backend: StoreBackend::Memory,
      database_url: None,
      run_migrations: false,
      github: GithubConfig {
        api_base_url: DEFAULT_GITHUB_BASE_URL.to_string(),
        token: None,
        repo_owner: "gautammanak1".to_string(),
        repo_name: "package-download-stat".to_string(),
      },
      star_sync_interval_secs: 0,
      shiprocket: ShiprocketConfig {
        api_base_url: DEFAULT_SHIPROCKET_BASE_URL.to_string(),
        email: None,
        password: None,
        pickup_location: "Home".to_string(),
        pickup_pincode: "201301".to_string(),
      },
      upload_dir: env::temp_dir().join("storefront-uploads"),
      upload_public_base_url: "http://127.0.0.1:8080/uploads".to_string(),
      price_fet: Decimal::new(1, 1),
      price_usdc: Decimal::new(1, 2),
    }
  }
}
