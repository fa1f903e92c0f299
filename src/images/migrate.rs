//! Image migration
//!
//! Moves images recorded in an older representation (legacy file path,
//! external URL, inline column) into the configured storage backend, one
//! product at a time. A failure on one product never aborts the run.

use bytes::{Bytes, BytesMut};
use serde::Serialize;
use std::sync::Arc;
use std::time::{Duration, Instant};
use thiserror::Error;
use tracing::{debug, info, warn};
use utoipa::ToSchema;

use super::upload::{object_key, release_replaced, validate_image, UploadError};
use crate::config::StorageBackend;
use crate::db::{DbError, ProductStore};
use crate::domain::media::{decode_legacy_inline, mime_from_path, DEFAULT_IMAGE_MIME};
use crate::domain::ImageReference;
use crate::storage::{ImageStores, StorageError};

/// Errors that abort a migration run
#[derive(Debug, Error)]
pub enum MigrationError {
    #[error("Product store error: {0}")]
    Store(#[from] DbError),
}

/// Errors for a single product, counted and logged
#[derive(Debug, Error)]
enum ItemError {
    #[error("source image missing: {0}")]
    Missing(String),
    #[error("storage error: {0}")]
    Storage(#[from] StorageError),
    #[error("download failed: {0}")]
    Download(String),
    #[error("rejected: {0}")]
    Rejected(#[from] UploadError),
    #[error("product store error: {0}")]
    Store(#[from] DbError),
}

impl From<reqwest::Error> for ItemError {
    fn from(err: reqwest::Error) -> Self {
        ItemError::Download(err.to_string())
    }
}

/// Summary of a migration run
#[derive(Debug, Clone, Default, PartialEq, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct MigrationReport {
    pub backend: String,
    /// Products with any image reference
    pub scanned: usize,
    pub migrated: usize,
    /// Already stored in the target backend
    pub skipped: usize,
    /// Source file or object no longer exists
    pub missing: usize,
    pub failed: usize,
    pub duration_ms: u64,
}

enum ItemOutcome {
    Migrated,
    Skipped,
}

/// Re-homes legacy image representations into the primary backend
pub struct ImageMigrator {
    store: Arc<dyn ProductStore>,
    stores: ImageStores,
    http_client: reqwest::Client,
    /// Same ceiling uploads are held to
    max_size: usize,
}

impl ImageMigrator {
    pub fn new(store: Arc<dyn ProductStore>, stores: ImageStores, max_size: usize) -> Self {
        let http_client = reqwest::Client::builder()
            .timeout(Duration::from_secs(30))
            .user_agent(concat!("storefront/", env!("CARGO_PKG_VERSION")))
            .build()
            .unwrap_or_default();

        Self { store, stores, http_client, max_size }
    }

    /// True when the reference already lives in the target backend
    fn is_native(backend: StorageBackend, image: &ImageReference) -> bool {
        match (backend, image) {
            (_, ImageReference::None) => true,
            (StorageBackend::Inline, ImageReference::Inline { .. }) => true,
            (StorageBackend::Local, ImageReference::LocalPath { .. }) => true,
            (StorageBackend::Object, ImageReference::External { key: Some(_), .. }) => true,
            _ => false,
        }
    }

    /// Migrate every product whose image is not in the configured backend
    pub async fn run(&self) -> Result<MigrationReport, MigrationError> {
        let start = Instant::now();
        let backend = self.stores.backend();
        let mut report = MigrationReport {
            backend: backend.as_str().to_string(),
            ..Default::default()
        };

        let products = self.store.list().await?;
        info!(products = products.len(), backend = backend.as_str(), "Starting image migration");

        for product in products.iter().filter(|p| p.has_image) {
            report.scanned += 1;

            match self.migrate_one(product.id, backend).await {
                Ok(ItemOutcome::Migrated) => report.migrated += 1,
                Ok(ItemOutcome::Skipped) => report.skipped += 1,
                Err(ItemError::Missing(source)) => {
                    warn!(product_id = product.id, source = %source, "Image source missing, left unchanged");
                    report.missing += 1;
                }
                Err(e) => {
                    warn!(product_id = product.id, error = %e, "Image migration failed");
                    report.failed += 1;
                }
            }
        }

        report.duration_ms = start.elapsed().as_millis() as u64;
        info!(
            scanned = report.scanned,
            migrated = report.migrated,
            skipped = report.skipped,
            missing = report.missing,
            failed = report.failed,
            duration_ms = report.duration_ms,
            "Image migration completed"
        );
        Ok(report)
    }

    async fn migrate_one(&self, id: i32, backend: StorageBackend) -> Result<ItemOutcome, ItemError> {
        // Deleted since the listing
        let Some(image) = self.store.image(id).await? else {
            return Ok(ItemOutcome::Skipped);
        };
        if Self::is_native(backend, &image) {
            return Ok(ItemOutcome::Skipped);
        }

        let (data, content_type, source_name) = self.read_source(&image).await?;
        validate_image(&content_type, data.len(), self.max_size)?;

        let key = object_key(source_name.as_deref(), &content_type);
        let reference = self.stores.primary.put(&key, data, &content_type).await?;

        let updated = match self.store.set_image(id, reference.clone()).await {
            Ok(updated) => updated,
            Err(e) => {
                self.stores.release(&reference).await;
                return Err(e.into());
            }
        };

        match updated {
            Some(_) => {
                debug!(product_id = id, from = image.kind(), key = %key, "Migrated product image");
                release_replaced(self.store.as_ref(), &self.stores, &image).await;
                Ok(ItemOutcome::Migrated)
            }
            None => {
                self.stores.release(&reference).await;
                Ok(ItemOutcome::Skipped)
            }
        }
    }

    /// Load bytes, MIME type and a name hint from the current representation
    async fn read_source(&self, image: &ImageReference) -> Result<(Bytes, String, Option<String>), ItemError> {
        match image {
            ImageReference::None => Err(ItemError::Missing("no image".to_string())),
            ImageReference::Inline { data, content_type } => Ok((
                decode_legacy_inline(data.clone()),
                content_type.clone().unwrap_or_else(|| DEFAULT_IMAGE_MIME.to_string()),
                None,
            )),
            ImageReference::LocalPath { path, content_type } => {
                let data = self.stores.local.get(path).await.map_err(|e| match e {
                    StorageError::NotFound(p) | StorageError::InvalidPath(p) => ItemError::Missing(p),
                    other => ItemError::Storage(other),
                })?;
                let content_type = content_type
                    .clone()
                    .or_else(|| mime_from_path(path).map(String::from))
                    .unwrap_or_else(|| DEFAULT_IMAGE_MIME.to_string());
                Ok((data, content_type, Some(path.clone())))
            }
            ImageReference::External { url, key: Some(key), content_type } if self.stores.objects.is_some() => {
                let objects = self.stores.objects.as_ref().ok_or_else(|| ItemError::Missing(key.clone()))?;
                let data = objects.get(key).await.map_err(|e| match e {
                    StorageError::NotFound(k) => ItemError::Missing(k),
                    other => ItemError::Storage(other),
                })?;
                let content_type = content_type
                    .clone()
                    .or_else(|| mime_from_path(key).map(String::from))
                    .unwrap_or_else(|| DEFAULT_IMAGE_MIME.to_string());
                debug!(url = %url, "Read image from object storage");
                Ok((data, content_type, Some(key.clone())))
            }
            ImageReference::External { url, content_type, .. } => {
                let mut response = self.http_client.get(url).send().await?;
                if response.status() == reqwest::StatusCode::NOT_FOUND {
                    return Err(ItemError::Missing(url.clone()));
                }
                if !response.status().is_success() {
                    return Err(ItemError::Download(format!("HTTP {} from {}", response.status(), url)));
                }

                let header_type = response
                    .headers()
                    .get(reqwest::header::CONTENT_TYPE)
                    .and_then(|v| v.to_str().ok())
                    .map(|v| v.split(';').next().unwrap_or(v).trim().to_string());
                let content_type = content_type
                    .clone()
                    .or(header_type)
                    .or_else(|| mime_from_path(url).map(String::from))
                    .unwrap_or_else(|| DEFAULT_IMAGE_MIME.to_string());

                validate_image(&content_type, 0, self.max_size)?;
                if let Some(length) = response.content_length() {
                    validate_image(&content_type, length as usize, self.max_size)?;
                }

                // Stop reading as soon as the body passes the ceiling
                let mut data = BytesMut::new();
                while let Some(chunk) = response.chunk().await? {
                    validate_image(&content_type, data.len() + chunk.len(), self.max_size)?;
                    data.extend_from_slice(&chunk);
                }
                Ok((data.freeze(), content_type, Some(url.clone())))
            }
        }
    }
}
