// storefront/src/services/images.rs

//! Product image storage in a local directory served under a public base URL.

use crate::config::AppConfig;
use crate::errors::{AppError, Result};
use crate::services::tracking::random_base36;
use base64::engine::general_purpose::STANDARD;
use base64::Engine;
use chrono::Utc;
use serde::Serialize;
use std::path::{Path, PathBuf};
use tracing::{info, instrument};

pub const MAX_IMAGE_BYTES: usize = 5 * 1024 * 1024;
const IMAGE_PREFIX: &str = "products";
/// Raster formats accepted for upload. Anything scriptable (SVG, HTML) is refused.
pub const ALLOWED_EXTENSIONS: [&str; 5] = ["png", "jpg", "jpeg", "gif", "webp"];

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct StoredImage {
  pub url: String,
  pub path: String,
}

#[derive(Debug, Clone)]
pub struct ImageStore {
  root: PathBuf,
  public_base_url: String,
}

fn sanitize_extension(raw: &str) -> Option<String> {
  let ext: String = raw
    .chars()
    .filter(|c| c.is_ascii_alphanumeric())
    .collect::<String>()
    .to_ascii_lowercase();
  if ext.is_empty() {
    None
  } else {
    Some(ext)
  }
}

/// Extension from the file name, then the content type's subtype. Only
/// `ALLOWED_EXTENSIONS` pass.
pub fn pick_extension(file_name: Option<&str>, content_type: Option<&str>) -> Result<String> {
  let ext = file_name
    .and_then(|name| name.rsplit_once('.').map(|(_, ext)| ext))
    .and_then(sanitize_extension)
    .or_else(|| {
      content_type
        .and_then(|ct| ct.split(';').next())
        .and_then(|ct| ct.rsplit('/').next())
        .and_then(sanitize_extension)
    });
  match ext {
    Some(ext) if ALLOWED_EXTENSIONS.contains(&ext.as_str()) => Ok(ext),
    Some(ext) => Err(AppError::Validation(format!(
      "Unsupported image type: {}. Allowed: {}",
      ext,
      ALLOWED_EXTENSIONS.join(", ")
    ))),
    None => Err(AppError::Validation("Could not determine the image type".to_string())),
  }
}

/// Splits `data:<mime>;base64,<payload>` into its content type and bytes.
pub fn decode_data_uri(uri: &str) -> Result<(Option<String>, Vec<u8>)> {
  let invalid = || AppError::Validation("Invalid data URI image".to_string());
  let rest = uri.strip_prefix("data:").ok_or_else(invalid)?;
  let (meta, payload) = rest.split_once(',').ok_or_else(invalid)?;
  let mime = meta.strip_suffix(";base64").ok_or_else(invalid)?;
  let bytes = STANDARD.decode(payload.trim()).map_err(|_| invalid())?;
  let content_type = if mime.is_empty() { None } else { Some(mime.to_string()) };
  Ok((content_type, bytes))
}

impl ImageStore {
  pub fn new(root: impl Into<PathBuf>, public_base_url: impl Into<String>) -> Self {
    Self {
      root: root.into(),
      public_base_url: public_base_url.into().trim_end_matches('/').to_string(),
    }
  }

  pub fn from_config(config: &AppConfig) -> Self {
    Self::new(config.upload_dir.clone(), config.upload_public_base_url.clone())
  }

  pub fn root(&self) -> &Path {
    &self.root
  }

  #[instrument(name = "ImageStore::save", skip(self, bytes), fields(size = bytes.len()))]
  pub async fn save(&self, bytes: &[u8], file_name: Option<&str>, content_type: Option<&str>) -> Result<StoredImage> {
    if bytes.is_empty() {
      return Err(AppError::Validation("file is required".to_string()));
    }
    if bytes.len() > MAX_IMAGE_BYTES {
      return Err(AppError::Validation("File exceeds the 5 MiB upload limit".to_string()));
    }

    let ext = pick_extension(file_name, content_type)?;
    let name = format!(
      "{}-{}.{}",
      Utc::now().timestamp_millis(),
      random_base36(6).to_ascii_lowercase(),
      ext
    );
    let relative = format!("{}/{}", IMAGE_PREFIX, name);

    let dir = self.root.join(IMAGE_PREFIX);
    tokio::fs::create_dir_all(&dir).await?;
    tokio::fs::write(dir.join(&name), bytes).await?;

    info!(path = %relative, "Stored product image.");
    Ok(StoredImage {
      url: format!("{}/{}", self.public_base_url, relative),
      path: relative,
    })
  }

  pub async fn save_data_uri(&self, uri: &str) -> Result<StoredImage> {
    let (content_type, bytes) = decode_data_uri(uri)?;
    self.save(&bytes, None, content_type.as_deref()).await
  }

  /// Replaces a `data:` URI with the public URL of the stored file; other
  /// values pass through.
  pub async fn resolve_image_url(&self, image_url: &str) -> Result<String> {
    if image_url.starts_with("data:") {
      Ok(self.save_data_uri(image_url).await?.url)
    } else {
      Ok(image_url.to_string())
    }
  }
}
