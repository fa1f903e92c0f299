//! API module - HTTP routes and handlers

pub mod error;
pub mod handlers;
pub mod openapi;

use actix_web::web;
use utoipa::OpenApi;
use utoipa_swagger_ui::SwaggerUi;

use crate::api::error::ApiError;
use crate::api::openapi::ApiDoc;

/// Render body parse failures in the standard error envelope
fn json_config() -> web::JsonConfig {
    web::JsonConfig::default()
        .limit(64 * 1024)
        .error_handler(|err, _req| ApiError::Validation(format!("Invalid request body: {}", err)).into())
}

/// Configure all API routes
pub fn configure_routes(cfg: &mut web::ServiceConfig) {
    cfg.service(
        web::scope("/api")
            .app_data(json_config())
            .service(
                web::scope("/products")
                    .route("", web::get().to(handlers::products::list_products))
                    .route("", web::post().to(handlers::products::create_product))
                    .route("/{id}", web::get().to(handlers::products::get_product))
                    .route("/{id}", web::put().to(handlers::products::update_product))
                    .route("/{id}", web::delete().to(handlers::products::delete_product))
                    .route("/{id}/image", web::post().to(handlers::upload::upload_product_image))
            )
            .service(
                web::scope("/images")
                    .route("/migrate", web::post().to(handlers::images::migrate_images))
                    .route("/{id}", web::get().to(handlers::images::get_image))
            )
            .route("/upload", web::post().to(handlers::upload::upload_image))
    )
    .route("/health", web::get().to(handlers::health::health_check))
    // Swagger UI and OpenAPI spec
    .service(
        SwaggerUi::new("/swagger-ui/{_:.*}")
            .url("/api-docs/openapi.json", ApiDoc::openapi())
    );
}
