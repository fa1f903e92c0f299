//! Multipart image upload handlers

use actix_multipart::{Field, Multipart};
use actix_web::{web, HttpResponse};
use bytes::BytesMut;
use futures::StreamExt;
use serde::{Deserialize, Serialize};
use tracing::warn;
use utoipa::ToSchema;

use crate::api::error::{ApiError, ErrorResponse};
use crate::images::{UploadFile, UploadOutcome, UploadRequest};
use crate::images::resolver::parse_product_id;
use crate::AppState;

/// Form fields accepted by `POST /api/upload`
#[derive(Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
#[allow(dead_code)]
pub struct UploadForm {
    #[schema(value_type = String, format = Binary)]
    pub file: Vec<u8>,
    /// Attach to this product instead of creating a placeholder
    pub product_id: Option<i32>,
}

#[derive(Debug, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct UploadResult {
    pub product_id: i32,
    /// API path serving the image
    pub url: String,
    /// Externally reachable URL, for object storage uploads
    pub image_url: Option<String>,
    pub content_type: String,
    pub size: usize,
}

impl From<UploadOutcome> for UploadResult {
    fn from(outcome: UploadOutcome) -> Self {
        UploadResult {
            product_id: outcome.product.id,
            url: outcome.url,
            image_url: outcome.image_url,
            content_type: outcome.content_type,
            size: outcome.size,
        }
    }
}

#[derive(Debug, Serialize, ToSchema)]
pub struct UploadResponse {
    pub success: bool,
    pub message: String,
    pub data: UploadResult,
}

/// Read a file part; bytes past `max` are counted but not kept
async fn read_file(field: &mut Field, max: usize) -> Result<UploadFile, ApiError> {
    let content_type = field
        .content_type()
        .map(|mime| mime.essence_str().to_string())
        .unwrap_or_default();
    let filename = field
        .content_disposition()
        .and_then(|cd| cd.get_filename())
        .map(String::from);

    let mut data = BytesMut::new();
    let mut size = 0usize;
    while let Some(chunk) = field.next().await {
        let chunk = chunk.map_err(|e| ApiError::Validation(format!("Malformed upload: {}", e)))?;
        size += chunk.len();
        if size <= max {
            data.extend_from_slice(&chunk);
        }
    }

    Ok(UploadFile {
        data: data.freeze(),
        size,
        content_type,
        filename,
    })
}

/// Upper bound for a text form field such as `productId`
const MAX_TEXT_FIELD_BYTES: usize = 64;

async fn read_text(field: &mut Field) -> Result<String, ApiError> {
    let mut data = BytesMut::new();
    while let Some(chunk) = field.next().await {
        let chunk = chunk.map_err(|e| ApiError::Validation(format!("Malformed upload: {}", e)))?;
        if data.len() + chunk.len() > MAX_TEXT_FIELD_BYTES {
            return Err(ApiError::Validation(format!(
                "Form field exceeds {} bytes",
                MAX_TEXT_FIELD_BYTES
            )));
        }
        data.extend_from_slice(&chunk);
    }
    String::from_utf8(data.to_vec()).map_err(|_| ApiError::Validation("Form field is not valid UTF-8".to_string()))
}

/// Collect the upload request from a multipart body
///
/// The first part named in `file_fields` is the file; `productId` is optional.
async fn read_form(
    mut payload: Multipart,
    file_fields: &[&str],
    max: usize,
) -> Result<UploadRequest, ApiError> {
    let mut request = UploadRequest::default();

    while let Some(item) = payload.next().await {
        let mut field = item.map_err(|e| ApiError::Validation(format!("Malformed upload: {}", e)))?;
        let name = field.name().unwrap_or_default().to_string();

        if file_fields.contains(&name.as_str()) && request.file.is_none() {
            request.file = Some(read_file(&mut field, max).await?);
        } else if name == "productId" {
            let raw = read_text(&mut field).await?;
            if !raw.trim().is_empty() {
                let id = parse_product_id(&raw)
                    .ok_or_else(|| ApiError::Validation("productId must be a positive integer".to_string()))?;
                request.product_id = Some(id);
            }
        } else {
            // Drain unknown parts so the stream can advance
            while let Some(chunk) = field.next().await {
                chunk.map_err(|e| ApiError::Validation(format!("Malformed upload: {}", e)))?;
            }
        }
    }

    Ok(request)
}

fn uploaded(outcome: UploadOutcome) -> HttpResponse {
    HttpResponse::Ok().json(UploadResponse {
        success: true,
        message: "Image uploaded successfully".to_string(),
        data: outcome.into(),
    })
}

/// POST /api/upload - Upload an image
///
/// Without `productId` a placeholder product is created to own the image.
#[utoipa::path(
    post,
    path = "/api/upload",
    tag = "images",
    request_body(content = UploadForm, content_type = "multipart/form-data"),
    responses(
        (status = 200, description = "Image stored", body = UploadResponse),
        (status = 400, description = "Missing file or not an image", body = ErrorResponse),
        (status = 404, description = "Target product not found", body = ErrorResponse),
        (status = 413, description = "File too large", body = ErrorResponse),
        (status = 500, description = "Storage write failed", body = ErrorResponse)
    )
)]
pub async fn upload_image(state: web::Data<AppState>, payload: Multipart) -> Result<HttpResponse, ApiError> {
    let request = read_form(payload, &["file"], state.uploader.max_upload_size()).await?;
    let outcome = state.uploader.upload(request).await.map_err(|e| {
        warn!(error = %e, "Upload rejected");
        ApiError::from(e)
    })?;
    Ok(uploaded(outcome))
}

/// POST /api/products/{id}/image - Upload an image for an existing product
#[utoipa::path(
    post,
    path = "/api/products/{id}/image",
    tag = "products",
    params(("id" = i32, Path, description = "Product id")),
    request_body(content = UploadForm, content_type = "multipart/form-data"),
    responses(
        (status = 200, description = "Image stored", body = UploadResponse),
        (status = 400, description = "Missing file or not an image", body = ErrorResponse),
        (status = 404, description = "Product not found", body = ErrorResponse),
        (status = 413, description = "File too large", body = ErrorResponse)
    )
)]
pub async fn upload_product_image(
    state: web::Data<AppState>,
    path: web::Path<String>,
    payload: Multipart,
) -> Result<HttpResponse, ApiError> {
    let id = parse_product_id(&path).ok_or_else(|| ApiError::NotFound(format!("Product '{}' not found", path)))?;

    let mut request = read_form(payload, &["image", "file"], state.uploader.max_upload_size()).await?;
    request.product_id = Some(id);

    let outcome = state.uploader.upload(request).await.map_err(|e| {
        warn!(product_id = id, error = %e, "Upload rejected");
        ApiError::from(e)
    })?;
    Ok(uploaded(outcome))
}
