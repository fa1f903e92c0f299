//! Image storage backends
//!
//! Uploads go to exactly one backend, chosen by configuration. Reads may hit
//! any backend because older products still point at local files or URLs.
//!
//! ```text
//!                   ┌────────────────────┐
//!                   │ ImageStorage trait │
//!                   └─────────┬──────────┘
//!          ┌──────────────────┼──────────────────┐
//!   ┌──────┴──────┐    ┌──────┴──────┐    ┌──────┴──────┐
//!   │ObjectStorage│    │LocalStorage │    │InlineStorage│
//!   │  (S3 / R2)  │    │ (local_root)│    │ (image_data)│
//!   └─────────────┘    └─────────────┘    └─────────────┘
//! ```

mod inline;
mod local;
mod r2;

use async_trait::async_trait;
use bytes::Bytes;
use std::sync::Arc;
use thiserror::Error;
use tracing::{debug, info, warn};

pub use inline::InlineStorage;
pub use local::LocalStorage;
pub use r2::ObjectStorage;

use crate::config::{StorageBackend, StorageSettings};
use crate::domain::ImageReference;

/// Errors that can occur during storage operations
#[derive(Error, Debug)]
pub enum StorageError {
    #[error("Storage backend not configured: {0}")]
    NotConfigured(String),

    #[error("Upload failed: {0}")]
    UploadFailed(String),

    #[error("Download failed: {0}")]
    DownloadFailed(String),

    #[error("Delete failed: {0}")]
    DeleteFailed(String),

    #[error("Object not found: {0}")]
    NotFound(String),

    #[error("Invalid path: {0}")]
    InvalidPath(String),

    #[error("Operation not supported by the {0} backend")]
    Unsupported(&'static str),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

/// A storage backend for product images
#[async_trait]
pub trait ImageStorage: Send + Sync {
    fn backend(&self) -> StorageBackend;

    /// Write `data` under `key` and return the reference to record on the product
    async fn put(&self, key: &str, data: Bytes, content_type: &str) -> Result<ImageReference, StorageError>;

    /// Read back an object by the location recorded on the product
    async fn get(&self, location: &str) -> Result<Bytes, StorageError>;

    /// Remove an object this backend wrote; a missing object is not an error
    async fn delete(&self, location: &str) -> Result<(), StorageError>;
}

/// The set of backends the service can read from and write to
#[derive(Clone)]
pub struct ImageStores {
    /// Receives new uploads
    pub primary: Arc<dyn ImageStorage>,
    /// Serves local and legacy paths
    pub local: Arc<dyn ImageStorage>,
    /// Serves object-storage keys, when configured
    pub objects: Option<Arc<dyn ImageStorage>>,
}

impl ImageStores {
    /// Build the backends described by the storage settings
    pub async fn from_settings(settings: &StorageSettings) -> Result<Self, StorageError> {
        let local: Arc<dyn ImageStorage> = Arc::new(LocalStorage::new(
            settings.local_root.clone(),
            settings.public_path_prefix.clone(),
        ));

        let objects: Option<Arc<dyn ImageStorage>> = if settings.object.is_configured() {
            Some(Arc::new(ObjectStorage::new(&settings.object).await?))
        } else {
            None
        };

        let primary = match settings.backend {
            StorageBackend::Object => objects.clone().ok_or_else(|| {
                StorageError::NotConfigured(
                    "object storage selected but endpoint or credentials are missing".to_string(),
                )
            })?,
            StorageBackend::Local => local.clone(),
            StorageBackend::Inline => Arc::new(InlineStorage),
        };

        if settings.backend != StorageBackend::Object && objects.is_none() {
            warn!("Object storage not configured; keyed external images will be served by redirect");
        }
        info!(backend = settings.backend.as_str(), "Image storage initialized");

        Ok(ImageStores { primary, local, objects })
    }

    /// Delete the object behind a reference that no product points at anymore
    ///
    /// Failures are logged and swallowed; an orphaned object is preferable to
    /// failing a write that already succeeded.
    pub async fn release(&self, image: &ImageReference) {
        let result = match image {
            ImageReference::External { key: Some(key), .. } => match &self.objects {
                Some(objects) => objects.delete(key).await,
                None => return,
            },
            ImageReference::LocalPath { path, .. } => self.local.delete(path).await,
            _ => return,
        };

        match result {
            Ok(()) => debug!(kind = image.kind(), "Released stored image"),
            Err(e) => warn!(error = %e, kind = image.kind(), "Failed to release stored image"),
        }
    }

    /// Same backend for everything
    #[cfg(test)]
    pub fn single(storage: Arc<dyn ImageStorage>, local: Arc<dyn ImageStorage>) -> Self {
        let objects = match storage.backend() {
            StorageBackend::Object => Some(storage.clone()),
            _ => None,
        };
        ImageStores { primary: storage, local, objects }
    }

    pub fn backend(&self) -> StorageBackend {
        self.primary.backend()
    }
}
