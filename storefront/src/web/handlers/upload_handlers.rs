// storefront/src/web/handlers/upload_handlers.rs

use actix_multipart::Multipart;
use actix_web::http::header;
use actix_web::{web, HttpRequest, HttpResponse};
use futures_util::TryStreamExt;
use serde::Deserialize;
use tracing::{instrument, warn};

use crate::errors::AppError;
use crate::services::images::MAX_IMAGE_BYTES;
use crate::state::AppState;

/// JSON alternative to multipart: `{"file": "data:image/png;base64,..."}`.
#[derive(Deserialize)]
struct DataUriUpload {
  file: Option<String>,
}

fn too_large() -> AppError {
  AppError::Validation("File exceeds the 5 MiB upload limit".to_string())
}

fn push_chunk(buf: &mut Vec<u8>, chunk: &[u8], limit: usize) -> Result<(), AppError> {
  if buf.len() + chunk.len() > limit {
    return Err(too_large());
  }
  buf.extend_from_slice(chunk);
  Ok(())
}

#[instrument(name = "handler::upload_image", skip_all)]
pub async fn upload_image_handler(
  app_state: web::Data<AppState>,
  req: HttpRequest,
  payload: web::Payload,
) -> Result<HttpResponse, AppError> {
  let is_json = req
    .headers()
    .get(header::CONTENT_TYPE)
    .and_then(|v| v.to_str().ok())
    .is_some_and(|v| v.starts_with("application/json"));

  let stored = if is_json {
    // base64 inflates by a third
    let limit = MAX_IMAGE_BYTES * 4 / 3 + 1024;
    let mut payload = payload;
    let mut body = Vec::new();
    while let Some(chunk) = payload
      .try_next()
      .await
      .map_err(|e| AppError::Validation(format!("Invalid request body: {}", e)))?
    {
      push_chunk(&mut body, &chunk, limit)?;
    }
    let upload: DataUriUpload =
      serde_json::from_slice(&body).map_err(|e| AppError::Validation(format!("Invalid JSON body: {}", e)))?;
    let uri = upload
      .file
      .filter(|f| !f.trim().is_empty())
      .ok_or_else(|| AppError::Validation("file is required".to_string()))?;
    app_state.images.save_data_uri(&uri).await?
  } else {
    let mut multipart = Multipart::new(req.headers(), payload);
    let mut found = None;
    while let Some(mut field) = multipart
      .try_next()
      .await
      .map_err(|e| AppError::Validation(format!("Invalid multipart body: {}", e)))?
    {
      if field.name() != Some("file") {
        continue;
      }
      let file_name = field
        .content_disposition()
        .and_then(|cd| cd.get_filename())
        .map(str::to_string);
      let content_type = field.content_type().map(|m| m.to_string());

      let mut bytes = Vec::new();
      while let Some(chunk) = field
        .try_next()
        .await
        .map_err(|e| AppError::Validation(format!("Invalid multipart body: {}", e)))?
      {
        push_chunk(&mut bytes, &chunk, MAX_IMAGE_BYTES)?;
      }
      found = Some((bytes, file_name, content_type));
      break;
    }

    let (bytes, file_name, content_type) =
      found.ok_or_else(|| AppError::Validation("file is required".to_string()))?;
    app_state
      .images
      .save(&bytes, file_name.as_deref(), content_type.as_deref())
      .await?
  };

  Ok(HttpResponse::Ok().json(stored))
}

fn content_type_for(path: &str) -> &'static str {
  match path.rsplit('.').next().map(|e| e.to_ascii_lowercase()).as_deref() {
    Some("png") => "image/png",
    Some("jpg") | Some("jpeg") => "image/jpeg",
    Some("gif") => "image/gif",
    Some("webp") => "image/webp",
    _ => "application/octet-stream",
  }
}

/// Serves files written by the image store.
#[instrument(name = "handler::serve_upload", skip(app_state))]
pub async fn serve_upload_handler(
  app_state: web::Data<AppState>,
  path: web::Path<String>,
) -> Result<HttpResponse, AppError> {
  let relative = path.into_inner();
  if relative.split('/').any(|part| part.is_empty() || part == "." || part == "..") {
    return Err(AppError::NotFound("File not found".to_string()));
  }

  match tokio::fs::read(app_state.images.root().join(&relative)).await {
    Ok(bytes) => Ok(
      HttpResponse::Ok()
        .content_type(content_type_for(&relative))
        .insert_header((header::X_CONTENT_TYPE_OPTIONS, "nosniff"))
        .body(bytes),
    ),
    Err(e) if e.kind() == std::io::ErrorKind::NotFound => Err(AppError::NotFound("File not found".to_string())),
    Err(e) => {
      warn!(error = %e, path = %relative, "Failed to read uploaded file.");
      Err(e.into())
    }
  }
}
