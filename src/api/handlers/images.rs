//! Image serving and migration handlers

use actix_web::{
    http::header::{self, HeaderValue},
    web, HttpRequest, HttpResponse,
};
use serde::Serialize;
use tracing::info;
use utoipa::ToSchema;

use crate::api::error::{ApiError, ErrorResponse};
use crate::images::{CachePolicy, MigrationReport, ResolvedImage, ServedImage};
use crate::AppState;

#[derive(Debug, Serialize, ToSchema)]
pub struct MigrationResponse {
    pub success: bool,
    pub data: MigrationReport,
}

/// True when an `If-None-Match` header matches the entity tag
fn etag_matches(if_none_match: Option<&HeaderValue>, etag: &str) -> bool {
    let Some(value) = if_none_match.and_then(|v| v.to_str().ok()) else {
        return false;
    };
    value
        .split(',')
        .map(|tag| tag.trim())
        .any(|tag| tag == "*" || tag.trim_start_matches("W/") == etag)
}

/// Stored images are client-supplied; scripts inside SVGs must never run
/// against this origin
const IMAGE_CSP: &str = "default-src 'none'; sandbox";

fn image_response(req: &HttpRequest, image: ServedImage) -> HttpResponse {
    let not_modified = etag_matches(req.headers().get(header::IF_NONE_MATCH), &image.etag);
    let mut response = if not_modified {
        HttpResponse::NotModified()
    } else {
        HttpResponse::Ok()
    };

    response
        .insert_header((header::ETAG, image.etag))
        .insert_header((header::CACHE_CONTROL, image.cache.header_value()))
        .insert_header((header::X_CONTENT_TYPE_OPTIONS, "nosniff"))
        .insert_header((header::CONTENT_SECURITY_POLICY, IMAGE_CSP));

    if not_modified {
        response.finish()
    } else {
        response.content_type(image.content_type).body(image.data)
    }
}

/// GET /api/images/{id} - Serve a product image
///
/// Falls back to the placeholder asset when the product has no readable image.
#[utoipa::path(
    get,
    path = "/api/images/{id}",
    tag = "images",
    params(("id" = String, Path, description = "Product id")),
    responses(
        (status = 200, description = "Image bytes"),
        (status = 302, description = "Image hosted at an external URL"),
        (status = 304, description = "Client copy is current"),
        (status = 404, description = "No product or image", body = ErrorResponse),
        (status = 500, description = "Store or storage unavailable", body = ErrorResponse)
    )
)]
pub async fn get_image(
    req: HttpRequest,
    state: web::Data<AppState>,
    path: web::Path<String>,
) -> Result<HttpResponse, ApiError> {
    match state.resolver.resolve(&path).await? {
        ResolvedImage::Bytes(image) => Ok(image_response(&req, image)),
        ResolvedImage::Redirect { url } => Ok(HttpResponse::Found()
            .insert_header((header::LOCATION, url))
            .insert_header((header::CACHE_CONTROL, CachePolicy::ShortLived.header_value()))
            .finish()),
    }
}

/// POST /api/images/migrate - Move legacy images into the configured backend
#[utoipa::path(
    post,
    path = "/api/images/migrate",
    tag = "images",
    responses(
        (status = 200, description = "Migration finished", body = MigrationResponse),
        (status = 500, description = "Store unavailable", body = ErrorResponse)
    )
)]
pub async fn migrate_images(state: web::Data<AppState>) -> Result<HttpResponse, ApiError> {
    let report = state.migrator.run().await?;
    info!(migrated = report.migrated, failed = report.failed, "Migration requested via API");

    Ok(HttpResponse::Ok().json(MigrationResponse {
        success: true,
        data: report,
    }))
}
