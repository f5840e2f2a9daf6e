// storefront/src/services/mod.rs

pub mod address;
pub mod discount;
pub mod github;
pub mod images;
pub mod pricing;
pub mod product_search;
pub mod shipping;
pub mod shiprocket;
pub mod star_sync;
pub mod star_verification;
pub mod tracking;

use crate::errors::{AppError, Result};
use reqwest::Url;

/// `base` with each segment percent-encoded and appended to its path.
pub(crate) fn endpoint(base: &str, segments: &[&str]) -> Result<Url> {
  let mut url = Url::parse(base).map_err(|e| AppError::Config(format!("Invalid API base URL {}: {}", base, e)))?;
  {
    let mut path = url
      .path_segments_mut()
      .map_err(|_| AppError::Config(format!("API base URL {} cannot carry a path", base)))?;
    path.pop_if_empty().extend(segments);
  }
  Ok(url)
}
