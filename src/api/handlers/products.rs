//! Product CRUD handlers

use actix_web::{web, HttpResponse};
use base64::Engine;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tracing::{info, warn};
use utoipa::ToSchema;

use crate::api::error::{ApiError, ErrorResponse};
use crate::domain::{
    image_api_path, validate_name, ImageReference, NewProduct, Price, Product, ProductPatch, ProductSummary,
    ValidationError,
};
use crate::images::resolver::parse_product_id;
use crate::AppState;

// ============================================================================
// Request types
// ============================================================================

/// Price as sent by clients: `"9.99"` or `9.99`
#[derive(Debug, Clone, Deserialize, ToSchema)]
#[serde(untagged)]
pub enum PriceInput {
    Text(String),
    Number(f64),
}

impl PriceInput {
    fn parse(&self) -> Result<Price, ApiError> {
        let price = match self {
            PriceInput::Text(text) => Price::parse(text)?,
            PriceInput::Number(number) => Price::parse(&number.to_string())?,
        };
        Ok(price)
    }
}

#[derive(Debug, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct CreateProductRequest {
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub price: Option<PriceInput>,
    #[serde(default)]
    pub description: Option<String>,
    /// `http(s)://` URL or a path under the local asset root
    #[serde(default)]
    pub image: Option<String>,
    /// Copy the image of an earlier upload's record
    #[serde(default)]
    pub image_id: Option<i32>,
}

/// Partial update; absent fields are left unchanged
#[derive(Debug, Default, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct UpdateProductRequest {
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub price: Option<PriceInput>,
    /// An empty string clears the description
    #[serde(default)]
    pub description: Option<String>,
    /// An empty string removes the image
    #[serde(default)]
    pub image: Option<String>,
}

impl UpdateProductRequest {
    fn into_patch(self) -> Result<ProductPatch, ApiError> {
        let patch = ProductPatch {
            name: self.name.as_deref().map(validate_name).transpose()?,
            price: self.price.as_ref().map(PriceInput::parse).transpose()?,
            description: self.description.map(|d| {
                let trimmed = d.trim();
                if trimmed.is_empty() { None } else { Some(trimmed.to_string()) }
            }),
            image: self.image.as_deref().map(ImageReference::from_client_value),
        };
        Ok(patch)
    }
}

// ============================================================================
// Response types
// ============================================================================

/// Product as listed; never carries image bytes
#[derive(Debug, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct ProductSummaryDto {
    pub id: i32,
    pub name: String,
    #[schema(example = "9.99")]
    pub price: String,
    pub description: Option<String>,
    pub has_image: bool,
    /// API path serving the image
    pub image_url: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl From<ProductSummary> for ProductSummaryDto {
    fn from(summary: ProductSummary) -> Self {
        ProductSummaryDto {
            image_url: image_api_path(summary.id),
            id: summary.id,
            name: summary.name,
            price: summary.price.to_string(),
            description: summary.description,
            has_image: summary.has_image,
            created_at: summary.created_at,
            updated_at: summary.updated_at,
        }
    }
}

/// Full product record
#[derive(Debug, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct ProductDto {
    pub id: i32,
    pub name: String,
    #[schema(example = "9.99")]
    pub price: String,
    pub description: Option<String>,
    pub has_image: bool,
    /// Where to load the image: the external URL, or the API path
    pub image_url: Option<String>,
    /// Path under the local asset root, for local images
    pub image_path: Option<String>,
    pub image_type: Option<String>,
    /// Base64 payload, for images stored in the product row
    pub image_data: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl From<Product> for ProductDto {
    fn from(product: Product) -> Self {
        let image_type = product.image.content_type().map(String::from);
        let (image_url, image_path, image_data) = match &product.image {
            ImageReference::None => (None, None, None),
            ImageReference::External { url, .. } => (Some(url.clone()), None, None),
            ImageReference::LocalPath { path, .. } => (Some(image_api_path(product.id)), Some(path.clone()), None),
            ImageReference::Inline { data, .. } => (
                Some(image_api_path(product.id)),
                None,
                Some(base64::engine::general_purpose::STANDARD.encode(data)),
            ),
        };

        ProductDto {
            id: product.id,
            name: product.name,
            price: product.price.to_string(),
            description: product.description,
            has_image: product.image.is_present(),
            image_url,
            image_path,
            image_type,
            image_data,
            created_at: product.created_at,
            updated_at: product.updated_at,
        }
    }
}

#[derive(Debug, Serialize, ToSchema)]
pub struct ProductListResponse {
    pub success: bool,
    pub data: Vec<ProductSummaryDto>,
    pub count: usize,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct ProductResponse {
    pub success: bool,
    pub data: ProductDto,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct DeleteProductResponse {
    pub success: bool,
    pub message: String,
    pub data: ProductDto,
}

fn product_id(raw: &str) -> Result<i32, ApiError> {
    parse_product_id(raw).ok_or_else(|| ApiError::NotFound(format!("Product '{}' not found", raw)))
}

// ============================================================================
// Handlers
// ============================================================================

/// GET /api/products - List products, newest first
#[utoipa::path(
    get,
    path = "/api/products",
    tag = "products",
    responses(
        (status = 200, description = "All products", body = ProductListResponse),
        (status = 500, description = "Store unavailable", body = ErrorResponse)
    )
)]
pub async fn list_products(state: web::Data<AppState>) -> Result<HttpResponse, ApiError> {
    let products: Vec<ProductSummaryDto> = state.store
        .list()
        .await?
        .into_iter()
        .map(ProductSummaryDto::from)
        .collect();

    Ok(HttpResponse::Ok().json(ProductListResponse {
        success: true,
        count: products.len(),
        data: products,
    }))
}

/// GET /api/products/{id} - Get a single product
#[utoipa::path(
    get,
    path = "/api/products/{id}",
    tag = "products",
    params(("id" = i32, Path, description = "Product id")),
    responses(
        (status = 200, description = "Product found", body = ProductResponse),
        (status = 404, description = "Product not found", body = ErrorResponse)
    )
)]
pub async fn get_product(state: web::Data<AppState>, path: web::Path<String>) -> Result<HttpResponse, ApiError> {
    let id = product_id(&path)?;
    let product = state.store.get(id).await?.ok_or_else(|| ApiError::product_not_found(id))?;

    Ok(HttpResponse::Ok().json(ProductResponse {
        success: true,
        data: product.into(),
    }))
}

/// POST /api/products - Create a product
#[utoipa::path(
    post,
    path = "/api/products",
    tag = "products",
    request_body = CreateProductRequest,
    responses(
        (status = 201, description = "Product created", body = ProductResponse),
        (status = 400, description = "Invalid name, price or image", body = ErrorResponse)
    )
)]
pub async fn create_product(
    state: web::Data<AppState>,
    body: web::Json<CreateProductRequest>,
) -> Result<HttpResponse, ApiError> {
    let body = body.into_inner();

    let name = validate_name(body.name.as_deref().unwrap_or(""))?;
    let price = body.price
        .as_ref()
        .map(PriceInput::parse)
        .transpose()?
        .ok_or(ValidationError::PriceRequired)?;
    let mut product = NewProduct::new(&name, price.as_str(), body.description)?;

    let mut image_source = None;
    if let Some(image_id) = body.image_id {
        let source = state.store
            .get(image_id)
            .await?
            .filter(|p| p.image.is_present())
            .ok_or_else(|| ApiError::Validation(format!("imageId {} has no image", image_id)))?;
        product = product.with_image(source.image.clone());
        image_source = Some(source);
    } else if let Some(image) = body.image.as_deref() {
        product = product.with_image(ImageReference::from_client_value(image));
    }

    let created = state.store.create(product).await?;
    info!(product_id = created.id, name = %created.name, "Product created");

    // The upload's placeholder record has served its purpose once its image
    // is attached to a real product
    if let Some(source) = image_source.filter(Product::is_upload_placeholder) {
        match state.store.delete(source.id).await {
            Ok(_) => info!(product_id = source.id, "Removed upload placeholder"),
            Err(e) => warn!(product_id = source.id, error = %e, "Failed to remove upload placeholder"),
        }
    }

    Ok(HttpResponse::Created().json(ProductResponse {
        success: true,
        data: created.into(),
    }))
}

/// PUT /api/products/{id} - Update a product
#[utoipa::path(
    put,
    path = "/api/products/{id}",
    tag = "products",
    params(("id" = i32, Path, description = "Product id")),
    request_body = UpdateProductRequest,
    responses(
        (status = 200, description = "Product updated", body = ProductResponse),
        (status = 400, description = "Invalid field", body = ErrorResponse),
        (status = 404, description = "Product not found", body = ErrorResponse)
    )
)]
pub async fn update_product(
    state: web::Data<AppState>,
    path: web::Path<String>,
    body: web::Json<UpdateProductRequest>,
) -> Result<HttpResponse, ApiError> {
    let id = product_id(&path)?;
    let patch = body.into_inner().into_patch()?;
    if patch.is_empty() {
        return Err(ApiError::Validation("No fields to update".to_string()));
    }

    let updated = state.store.update(id, patch).await?.ok_or_else(|| ApiError::product_not_found(id))?;
    info!(product_id = id, "Product updated");

    Ok(HttpResponse::Ok().json(ProductResponse {
        success: true,
        data: updated.into(),
    }))
}

/// DELETE /api/products/{id} - Delete a product
#[utoipa::path(
    delete,
    path = "/api/products/{id}",
    tag = "products",
    params(("id" = i32, Path, description = "Product id")),
    responses(
        (status = 200, description = "Product deleted", body = DeleteProductResponse),
        (status = 404, description = "Product not found", body = ErrorResponse)
    )
)]
pub async fn delete_product(state: web::Data<AppState>, path: web::Path<String>) -> Result<HttpResponse, ApiError> {
    let id = product_id(&path)?;
    let deleted = state.store.delete(id).await?.ok_or_else(|| ApiError::product_not_found(id))?;
    info!(product_id = id, "Product deleted");

    Ok(HttpResponse::Ok().json(DeleteProductResponse {
        success: true,
        message: "Product deleted successfully".to_string(),
        data: deleted.into(),
    }))
}
