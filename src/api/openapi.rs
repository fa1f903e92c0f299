//! OpenAPI 3.0 specification definition

use utoipa::OpenApi;

use crate::api::error::ErrorResponse;
use crate::api::handlers::{
    health::HealthResponse,
    images::MigrationResponse,
    products::{
        CreateProductRequest, DeleteProductResponse, PriceInput, ProductDto, ProductListResponse,
        ProductResponse, ProductSummaryDto, UpdateProductRequest,
    },
    upload::{UploadForm, UploadResponse, UploadResult},
};
use crate::images::MigrationReport;

#[derive(OpenApi)]
#[openapi(
    info(
        title = "Storefront API",
        version = "0.3.0",
        description = "Product catalogue and image service for the storefront admin panel",
        license(
            name = "MIT",
            url = "https://opensource.org/licenses/MIT"
        )
    ),
    servers(
        (url = "/", description = "Current server")
    ),
    tags(
        (name = "system", description = "System health and status endpoints"),
        (name = "products", description = "Product CRUD endpoints"),
        (name = "images", description = "Image upload, serving and migration endpoints")
    ),
    paths(
        crate::api::handlers::health::health_check,
        crate::api::handlers::products::list_products,
        crate::api::handlers::products::get_product,
        crate::api::handlers::products::create_product,
        crate::api::handlers::products::update_product,
        crate::api::handlers::products::delete_product,
        crate::api::handlers::images::get_image,
        crate::api::handlers::images::migrate_images,
        crate::api::handlers::upload::upload_image,
        crate::api::handlers::upload::upload_product_image,
    ),
    components(
        schemas(
            HealthResponse,
            ErrorResponse,
            // Product schemas
            PriceInput,
            CreateProductRequest,
            UpdateProductRequest,
            ProductSummaryDto,
            ProductDto,
            ProductListResponse,
            ProductResponse,
            DeleteProductResponse,
            // Image schemas
            UploadForm,
            UploadResult,
            UploadResponse,
            MigrationReport,
            MigrationResponse,
        )
    )
)]
pub struct ApiDoc;
