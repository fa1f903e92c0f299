//! Product store abstraction
//!
//! Handlers talk to products through [`ProductStore`] so the same code runs
//! against PostgreSQL or the in-memory store.

use async_trait::async_trait;

use super::pool::DbError;
use crate::domain::{ImageReference, NewProduct, Product, ProductPatch, ProductSummary};

/// Result type for store operations
pub type StoreResult<T> = Result<T, DbError>;

/// Product persistence contract
///
/// Every write touches a single row; `Ok(None)` means the id does not exist.
#[async_trait]
pub trait ProductStore: Send + Sync {
    /// Short name for logs and the health endpoint
    fn name(&self) -> &'static str;

    /// All products, newest first, without image payloads
    async fn list(&self) -> StoreResult<Vec<ProductSummary>>;

    async fn get(&self, id: i32) -> StoreResult<Option<Product>>;

    /// Only the image fields of a product
    async fn image(&self, id: i32) -> StoreResult<Option<ImageReference>>;

    async fn create(&self, product: NewProduct) -> StoreResult<Product>;

    async fn update(&self, id: i32, patch: ProductPatch) -> StoreResult<Option<Product>>;

    async fn delete(&self, id: i32) -> StoreResult<Option<Product>>;

    async fn count(&self) -> StoreResult<i64>;

    /// True when some product still records the object key or local path
    /// behind `image`
    async fn image_in_use(&self, image: &ImageReference) -> StoreResult<bool>;

    /// Replace the image reference, clearing every other representation
    async fn set_image(&self, id: i32, image: ImageReference) -> StoreResult<Option<Product>> {
        self.update(
            id,
            ProductPatch {
                image: Some(image),
                ..Default::default()
            },
        )
        .await
    }
}
