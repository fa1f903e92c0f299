//! Product store doubles for failure-path tests

use async_trait::async_trait;

use super::memory::MemoryProductStore;
use super::pool::DbError;
use super::store::{ProductStore, StoreResult};
use crate::domain::{ImageReference, NewProduct, Product, ProductPatch, ProductSummary};

fn unavailable<T>() -> StoreResult<T> {
    Err(DbError::Config("database unreachable".to_string()))
}

/// Fails every call, like a database that went away
pub struct UnavailableStore;

#[async_trait]
impl ProductStore for UnavailableStore {
    fn name(&self) -> &'static str {
        "unavailable"
    }

    async fn list(&self) -> StoreResult<Vec<ProductSummary>> {
        unavailable()
    }

    async fn get(&self, _id: i32) -> StoreResult<Option<Product>> {
        unavailable()
    }

    async fn image(&self, _id: i32) -> StoreResult<Option<ImageReference>> {
        unavailable()
    }

    async fn create(&self, _product: NewProduct) -> StoreResult<Product> {
        unavailable()
    }

    async fn update(&self, _id: i32, _patch: ProductPatch) -> StoreResult<Option<Product>> {
        unavailable()
    }

    async fn delete(&self, _id: i32) -> StoreResult<Option<Product>> {
        unavailable()
    }

    async fn count(&self) -> StoreResult<i64> {
        unavailable()
    }

    async fn image_in_use(&self, _image: &ImageReference) -> StoreResult<bool> {
        unavailable()
    }
}

/// Serves reads from an inner store and fails every write
pub struct ReadOnlyStore(pub MemoryProductStore);

#[async_trait]
impl ProductStore for ReadOnlyStore {
    fn name(&self) -> &'static str {
        "read-only"
    }

    async fn list(&self) -> StoreResult<Vec<ProductSummary>> {
        self.0.list().await
    }

    async fn get(&self, id: i32) -> StoreResult<Option<Product>> {
        self.0.get(id).await
    }

    async fn image(&self, id: i32) -> StoreResult<Option<ImageReference>> {
        self.0.image(id).await
    }

    async fn create(&self, _product: NewProduct) -> StoreResult<Product> {
        unavailable()
    }

    async fn update(&self, _id: i32, _patch: ProductPatch) -> StoreResult<Option<Product>> {
        unavailable()
    }

    async fn delete(&self, _id: i32) -> StoreResult<Option<Product>> {
        unavailable()
    }

    async fn count(&self) -> StoreResult<i64> {
        self.0.count().await
    }

    async fn image_in_use(&self, image: &ImageReference) -> StoreResult<bool> {
        self.0.image_in_use(image).await
    }
}
