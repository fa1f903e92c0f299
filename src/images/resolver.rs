//! Image resolution: product id → servable bytes
//!
//! First match wins:
//! 1. inline payload
//! 2. external URL (read from object storage when keyed, otherwise redirect)
//! 3. local path under the asset root
//! 4. placeholder asset
//! 5. not found

use bytes::Bytes;
use sha2::{Digest, Sha256};
use std::path::Path;
use std::sync::Arc;
use thiserror::Error;
use tracing::{debug, warn};

use crate::db::{DbError, ProductStore};
use crate::domain::media::{decode_legacy_inline, mime_from_path, DEFAULT_IMAGE_MIME};
use crate::domain::ImageReference;
use crate::storage::{ImageStores, StorageError};

/// Errors from image resolution
#[derive(Debug, Error)]
pub enum ResolveError {
    #[error("Image not found: {0}")]
    NotFound(String),
    #[error("Product store error: {0}")]
    Store(#[from] DbError),
    #[error("Storage error: {0}")]
    Storage(#[from] StorageError),
}

/// How long clients may cache a response
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CachePolicy {
    /// Product images: the id is stable, so cache for a year
    Immutable,
    /// Placeholder and redirects: the product may gain an image later
    ShortLived,
}

impl CachePolicy {
    pub fn header_value(&self) -> &'static str {
        match self {
            CachePolicy::Immutable => "public, max-age=31536000, immutable",
            CachePolicy::ShortLived => "public, max-age=86400",
        }
    }
}

/// Image bytes ready to be written to a response
#[derive(Debug, Clone)]
pub struct ServedImage {
    pub data: Bytes,
    pub content_type: String,
    pub cache: CachePolicy,
    /// Strong validator over the body, already quoted
    pub etag: String,
}

impl ServedImage {
    fn new(data: Bytes, content_type: String, cache: CachePolicy) -> Self {
        let etag = format!("\"{}\"", hex::encode(Sha256::digest(&data)));
        ServedImage { data, content_type, cache, etag }
    }
}

/// Outcome of resolving a product image
#[derive(Debug, Clone)]
pub enum ResolvedImage {
    Bytes(ServedImage),
    /// Image hosted elsewhere; send the client there
    Redirect { url: String },
}

/// Fallback image served for products without one
#[derive(Debug, Clone)]
pub struct Placeholder {
    pub data: Bytes,
    pub content_type: String,
}

impl Placeholder {
    /// Read the placeholder asset from disk
    pub async fn load(path: &Path) -> std::io::Result<Self> {
        let data = tokio::fs::read(path).await?;
        let content_type = path
            .to_str()
            .and_then(mime_from_path)
            .unwrap_or(DEFAULT_IMAGE_MIME)
            .to_string();
        Ok(Placeholder {
            data: Bytes::from(data),
            content_type,
        })
    }
}

/// Parse a product id from a path segment; only positive integers are ids
pub fn parse_product_id(raw: &str) -> Option<i32> {
    raw.trim().parse::<i32>().ok().filter(|id| *id > 0)
}

/// Read-side image service
pub struct ImageResolver {
    store: Arc<dyn ProductStore>,
    stores: ImageStores,
    placeholder: Option<Placeholder>,
}

impl ImageResolver {
    pub fn new(store: Arc<dyn ProductStore>, stores: ImageStores, placeholder: Option<Placeholder>) -> Self {
        Self { store, stores, placeholder }
    }

    pub fn has_placeholder(&self) -> bool {
        self.placeholder.is_some()
    }

    /// Resolve the image for a raw product id
    pub async fn resolve(&self, raw_id: &str) -> Result<ResolvedImage, ResolveError> {
        let id = parse_product_id(raw_id)
            .ok_or_else(|| ResolveError::NotFound(format!("invalid product id '{}'", raw_id)))?;

        let image = self.store
            .image(id)
            .await?
            .ok_or_else(|| ResolveError::NotFound(format!("product {} does not exist", id)))?;

        debug!(product_id = id, image = image.kind(), "Resolving product image");

        match image {
            ImageReference::Inline { data, content_type } => Ok(ResolvedImage::Bytes(ServedImage::new(
                decode_legacy_inline(data),
                content_type.unwrap_or_else(|| DEFAULT_IMAGE_MIME.to_string()),
                CachePolicy::Immutable,
            ))),
            ImageReference::External { url, key, content_type } => {
                match (key, &self.stores.objects) {
                    (Some(key), Some(objects)) => match objects.get(&key).await {
                        Ok(data) => {
                            let content_type = content_type
                                .or_else(|| mime_from_path(&key).map(String::from))
                                .unwrap_or_else(|| DEFAULT_IMAGE_MIME.to_string());
                            Ok(ResolvedImage::Bytes(ServedImage::new(data, content_type, CachePolicy::Immutable)))
                        }
                        Err(StorageError::NotFound(_)) => {
                            warn!(product_id = id, key = %key, "Stored object missing, serving placeholder");
                            self.placeholder_or_not_found(id)
                        }
                        Err(e) => Err(e.into()),
                    },
                    _ => Ok(ResolvedImage::Redirect { url }),
                }
            }
            ImageReference::LocalPath { path, content_type } => match self.stores.local.get(&path).await {
                Ok(data) => {
                    let content_type = content_type
                        .or_else(|| mime_from_path(&path).map(String::from))
                        .unwrap_or_else(|| DEFAULT_IMAGE_MIME.to_string());
                    Ok(ResolvedImage::Bytes(ServedImage::new(data, content_type, CachePolicy::Immutable)))
                }
                Err(StorageError::NotFound(_)) | Err(StorageError::InvalidPath(_)) => {
                    warn!(product_id = id, path = %path, "Local image unavailable, serving placeholder");
                    self.placeholder_or_not_found(id)
                }
                Err(e) => Err(e.into()),
            },
            ImageReference::None => self.placeholder_or_not_found(id),
        }
    }

    fn placeholder_or_not_found(&self, id: i32) -> Result<ResolvedImage, ResolveError> {
        match &self.placeholder {
            Some(placeholder) => Ok(ResolvedImage::Bytes(ServedImage::new(
                placeholder.data.clone(),
                placeholder.content_type.clone(),
                CachePolicy::ShortLived,
            ))),
            None => Err(ResolveError::NotFound(format!("product {} has no image", id))),
        }
    }
}
