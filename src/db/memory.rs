//! In-memory product store
//!
//! Used when no database URL is configured and throughout the test suite.
//! Ids are assigned sequentially starting at 1, like a SERIAL column.

use async_trait::async_trait;
use chrono::Utc;
use parking_lot::RwLock;
use std::collections::BTreeMap;

use super::store::{ProductStore, StoreResult};
use crate::domain::{ImageReference, NewProduct, Product, ProductPatch, ProductSummary};

#[derive(Default)]
struct Inner {
    next_id: i32,
    products: BTreeMap<i32, Product>,
}

/// Product store backed by a `BTreeMap`
#[derive(Default)]
pub struct MemoryProductStore {
    inner: RwLock<Inner>,
}

impl MemoryProductStore {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl ProductStore for MemoryProductStore {
    fn name(&self) -> &'static str {
        "memory"
    }

    async fn list(&self) -> StoreResult<Vec<ProductSummary>> {
        let inner = self.inner.read();
        let mut products: Vec<ProductSummary> = inner.products.values().map(Product::summary).collect();
        products.sort_by(|a, b| b.created_at.cmp(&a.created_at).then(b.id.cmp(&a.id)));
        Ok(products)
    }

    async fn get(&self, id: i32) -> StoreResult<Option<Product>> {
        Ok(self.inner.read().products.get(&id).cloned())
    }

    async fn image(&self, id: i32) -> StoreResult<Option<ImageReference>> {
        Ok(self.inner.read().products.get(&id).map(|p| p.image.clone()))
    }

    async fn create(&self, product: NewProduct) -> StoreResult<Product> {
        let mut inner = self.inner.write();
        inner.next_id += 1;

        let now = Utc::now();
        let created = Product {
            id: inner.next_id,
            name: product.name,
            price: product.price,
            description: product.description,
            image: product.image,
            created_at: now,
            updated_at: now,
        };
        inner.products.insert(created.id, created.clone());
        Ok(created)
    }

    async fn update(&self, id: i32, patch: ProductPatch) -> StoreResult<Option<Product>> {
        let mut inner = self.inner.write();
        Ok(inner.products.get_mut(&id).map(|product| {
            patch.apply(product, Utc::now());
            product.clone()
        }))
    }

    async fn delete(&self, id: i32) -> StoreResult<Option<Product>> {
        Ok(self.inner.write().products.remove(&id))
    }

    async fn count(&self) -> StoreResult<i64> {
        Ok(self.inner.read().products.len() as i64)
    }

    async fn image_in_use(&self, image: &ImageReference) -> StoreResult<bool> {
        let inner = self.inner.read();
        Ok(inner.products.values().any(|p| match (&p.image, image) {
            (ImageReference::External { key: Some(a), .. }, ImageReference::External { key: Some(b), .. }) => a == b,
            (ImageReference::LocalPath { path: a, .. }, ImageReference::LocalPath { path: b, .. }) => a == b,
            _ => false,
        }))
    }
}
