//! Health check endpoint

use actix_web::{web, HttpResponse};
use serde::Serialize;
use tracing::warn;
use utoipa::ToSchema;

use crate::AppState;

#[derive(Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct HealthResponse {
    /// `healthy`, or `degraded` when the product store cannot be reached
    pub status: &'static str,
    pub version: &'static str,
    pub storage_backend: &'static str,
    /// `connected`, `unavailable` or `memory`
    pub database: &'static str,
    pub product_count: Option<i64>,
    pub placeholder_loaded: bool,
}

/// GET /health - Health check endpoint
#[utoipa::path(
    get,
    path = "/health",
    tag = "system",
    responses(
        (status = 200, description = "Service status", body = HealthResponse)
    )
)]
pub async fn health_check(state: web::Data<AppState>) -> HttpResponse {
    let database = match &state.db_pool {
        Some(pool) => match pool.test_connection().await {
            Ok(()) => "connected",
            Err(e) => {
                warn!(error = %e, "Health check: database unreachable");
                "unavailable"
            }
        },
        None => state.store.name(),
    };

    let product_count = match state.store.count().await {
        Ok(count) => Some(count),
        Err(e) => {
            warn!(error = %e, "Health check: product count failed");
            None
        }
    };

    let response = HealthResponse {
        status: if product_count.is_some() { "healthy" } else { "degraded" },
        version: env!("CARGO_PKG_VERSION"),
        storage_backend: state.stores.backend().as_str(),
        database,
        product_count,
        placeholder_loaded: state.resolver.has_placeholder(),
    };

    HttpResponse::Ok().json(response)
}
