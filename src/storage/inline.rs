//! Inline storage: the bytes travel with the product row

use async_trait::async_trait;
use bytes::Bytes;

use super::{ImageStorage, StorageError};
use crate::config::StorageBackend;
use crate::domain::ImageReference;

/// Keeps image bytes in the `image_data` column
#[derive(Debug, Clone, Copy, Default)]
pub struct InlineStorage;

#[async_trait]
impl ImageStorage for InlineStorage {
    fn backend(&self) -> StorageBackend {
        StorageBackend::Inline
    }

    async fn put(&self, _key: &str, data: Bytes, content_type: &str) -> Result<ImageReference, StorageError> {
        Ok(ImageReference::Inline {
            data,
            content_type: Some(content_type.to_string()),
        })
    }

    // Inline payloads are read straight off the product record
    async fn get(&self, _location: &str) -> Result<Bytes, StorageError> {
        Err(StorageError::Unsupported("inline"))
    }

    // Cleared together with the row
    async fn delete(&self, _location: &str) -> Result<(), StorageError> {
        Ok(())
    }
}
