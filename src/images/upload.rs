//! Upload path: validate, store, then link to a product
//!
//! The product record is only written after the storage backend accepted
//! the bytes, so a failed upload never leaves a dangling reference.

use bytes::Bytes;
use std::sync::Arc;
use thiserror::Error;
use tracing::{debug, error, info, warn};
use uuid::Uuid;

use crate::db::{DbError, ProductStore};
use crate::domain::media::{extension_for, is_image_mime, MAX_CONTENT_TYPE_LENGTH};
use crate::domain::{image_api_path, ImageReference, NewProduct, Product};
use crate::storage::{ImageStores, StorageError};

/// Errors from the upload path
#[derive(Debug, Error)]
pub enum UploadError {
    #[error("No file provided")]
    MissingFile,
    #[error("Only image files are allowed, got '{0}'")]
    UnsupportedType(String),
    #[error("File is {size} bytes, the limit is {max} bytes")]
    TooLarge { size: usize, max: usize },
    #[error("Product {0} not found")]
    ProductNotFound(i32),
    #[error("Storage error: {0}")]
    Storage(#[from] StorageError),
    #[error("Product store error: {0}")]
    Store(#[from] DbError),
}

/// A file received from a client
#[derive(Debug, Clone)]
pub struct UploadFile {
    /// Received bytes; truncated once `size` passes the upload ceiling
    pub data: Bytes,
    /// Total bytes the client sent
    pub size: usize,
    pub content_type: String,
    pub filename: Option<String>,
}

impl UploadFile {
    pub fn new(data: Bytes, content_type: impl Into<String>, filename: Option<String>) -> Self {
        UploadFile {
            size: data.len(),
            data,
            content_type: content_type.into(),
            filename,
        }
    }
}

/// Upload input: the file and an optional target product
#[derive(Debug, Clone, Default)]
pub struct UploadRequest {
    pub file: Option<UploadFile>,
    pub product_id: Option<i32>,
}

/// What a successful upload produced
#[derive(Debug, Clone)]
pub struct UploadOutcome {
    pub product: Product,
    /// API path serving the image
    pub url: String,
    /// Externally reachable URL, for object storage uploads
    pub image_url: Option<String>,
    pub content_type: String,
    pub size: usize,
}

/// Object key for a new upload; the client filename only contributes its extension
pub fn object_key(filename: Option<&str>, content_type: &str) -> String {
    format!("products/{}.{}", Uuid::new_v4(), extension_for(filename, content_type))
}

/// Type and size rules every stored image must pass
pub fn validate_image(content_type: &str, size: usize, max_size: usize) -> Result<(), UploadError> {
    if !is_image_mime(content_type) || content_type.len() > MAX_CONTENT_TYPE_LENGTH {
        return Err(UploadError::UnsupportedType(content_type.to_string()));
    }
    if size > max_size {
        return Err(UploadError::TooLarge { size, max: max_size });
    }
    Ok(())
}

/// Delete the object behind a replaced reference unless another product
/// still records it
pub(crate) async fn release_replaced(store: &dyn ProductStore, stores: &ImageStores, image: &ImageReference) {
    match store.image_in_use(image).await {
        Ok(false) => stores.release(image).await,
        Ok(true) => debug!(kind = image.kind(), "Replaced image still referenced, keeping it"),
        Err(e) => warn!(error = %e, "Could not check image references, keeping replaced image"),
    }
}

/// Write-side image service
pub struct UploadService {
    store: Arc<dyn ProductStore>,
    stores: ImageStores,
    max_upload_size: usize,
}

impl UploadService {
    pub fn new(store: Arc<dyn ProductStore>, stores: ImageStores, max_upload_size: usize) -> Self {
        Self { store, stores, max_upload_size }
    }

    pub fn max_upload_size(&self) -> usize {
        self.max_upload_size
    }

    /// Check a file before anything is written
    pub fn validate(&self, file: Option<UploadFile>) -> Result<UploadFile, UploadError> {
        let file = file.filter(|f| f.size > 0).ok_or(UploadError::MissingFile)?;
        validate_image(&file.content_type, file.size, self.max_upload_size)?;
        Ok(file)
    }

    /// Validate, store and link an uploaded image
    pub async fn upload(&self, request: UploadRequest) -> Result<UploadOutcome, UploadError> {
        let file = self.validate(request.file)?;

        let previous = match request.product_id {
            Some(id) => Some(self.store.image(id).await?.ok_or(UploadError::ProductNotFound(id))?),
            None => None,
        };

        let key = object_key(file.filename.as_deref(), &file.content_type);
        let size = file.size;
        let content_type = file.content_type.to_ascii_lowercase();

        let reference = self.stores
            .primary
            .put(&key, file.data, &content_type)
            .await
            .map_err(|e| {
                error!(error = %e, key = %key, product_id = ?request.product_id, "Storage write failed");
                UploadError::Storage(e)
            })?;

        let image_url = match &reference {
            ImageReference::External { url, .. } => Some(url.clone()),
            _ => None,
        };

        let linked = match request.product_id {
            Some(id) => match self.store.set_image(id, reference.clone()).await {
                Ok(updated) => updated.ok_or(UploadError::ProductNotFound(id)),
                Err(e) => Err(e.into()),
            },
            // Placeholder record and its image land in a single insert
            None => self.store.create(NewProduct::placeholder(reference.clone())).await.map_err(UploadError::from),
        };

        let product = match linked {
            Ok(product) => product,
            Err(e) => {
                error!(error = %e, key = %key, product_id = ?request.product_id, "Linking stored image failed");
                self.stores.release(&reference).await;
                return Err(e);
            }
        };

        if let Some(previous) = previous.filter(|p| p.is_present() && *p != reference) {
            release_replaced(self.store.as_ref(), &self.stores, &previous).await;
        }

        info!(
            product_id = product.id,
            key = %key,
            size = size,
            backend = self.stores.backend().as_str(),
            "Image uploaded"
        );

        Ok(UploadOutcome {
            url: image_api_path(product.id),
            product,
            image_url,
            content_type,
            size,
        })
    }
}
