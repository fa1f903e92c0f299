//! S3-compatible object storage for product images
//!
//! Production runs against Cloudflare R2, which speaks the S3 API, so we use
//! aws-sdk-s3 with a custom endpoint.
//!
//! ## Key layout
//! ```text
//! storefront-product-images/
//! └── products/
//!     └── {uuid}.{ext}
//! ```

use async_trait::async_trait;
use aws_config::BehaviorVersion;
use aws_sdk_s3::{
    Client as S3Client,
    config::{Builder, Credentials, Region},
    error::SdkError,
    operation::get_object::GetObjectError,
    primitives::ByteStream,
};
use bytes::Bytes;
use tracing::{debug, info, instrument};

use super::{ImageStorage, StorageError};
use crate::config::{ObjectStoreSettings, StorageBackend};
use crate::domain::ImageReference;

/// Object storage client for product images
#[derive(Clone)]
pub struct ObjectStorage {
    client: S3Client,
    bucket: String,
    endpoint: String,
    public_url_prefix: Option<String>,
}

impl ObjectStorage {
    /// Create a new client from settings
    pub async fn new(settings: &ObjectStoreSettings) -> Result<Self, StorageError> {
        let endpoint = settings.endpoint_url().ok_or_else(|| {
            StorageError::NotConfigured("object storage endpoint or account id missing".to_string())
        })?;

        debug!("Creating object storage client with endpoint: {}", endpoint);

        let credentials = Credentials::new(
            &settings.access_key_id,
            &settings.secret_access_key,
            None, // session token
            None, // expiry
            "storefront-static-credentials",
        );

        let config = Builder::new()
            .behavior_version(BehaviorVersion::latest())
            .endpoint_url(&endpoint)
            .region(Region::new(settings.region.clone())) // R2 uses "auto"
            .credentials_provider(credentials)
            .force_path_style(true) // Required for R2
            .build();

        Ok(Self {
            client: S3Client::from_conf(config),
            bucket: settings.bucket_name.clone(),
            endpoint,
            public_url_prefix: settings.public_url_prefix.clone(),
        })
    }

    /// Get the bucket name
    #[cfg(test)]
    pub fn bucket(&self) -> &str {
        &self.bucket
    }

    /// Public URL for a key
    ///
    /// Falls back to the path-style endpoint URL when no public prefix is set.
    pub fn public_url(&self, key: &str) -> String {
        match &self.public_url_prefix {
            Some(prefix) if !prefix.is_empty() => format!("{}/{}", prefix.trim_end_matches('/'), key),
            _ => format!("{}/{}/{}", self.endpoint, self.bucket, key),
        }
    }

    /// Upload bytes
    #[instrument(skip(self, data), fields(size = data.len()))]
    pub async fn upload(&self, key: &str, data: Bytes, content_type: &str) -> Result<(), StorageError> {
        debug!("Uploading {} bytes to object storage: {}", data.len(), key);
        let size = data.len();

        self.client
            .put_object()
            .bucket(&self.bucket)
            .key(key)
            .body(ByteStream::from(data))
            .content_type(content_type)
            .send()
            .await
            .map_err(|e| StorageError::UploadFailed(format!("{:?}", e)))?;

        info!("Uploaded to object storage: {} ({} bytes)", key, size);
        Ok(())
    }

    /// Download an object
    #[instrument(skip(self))]
    pub async fn download(&self, key: &str) -> Result<Bytes, StorageError> {
        debug!("Downloading from object storage: {}", key);

        let result = self.client
            .get_object()
            .bucket(&self.bucket)
            .key(key)
            .send()
            .await
            .map_err(|e| {
                if is_not_found_error(&e) {
                    StorageError::NotFound(key.to_string())
                } else {
                    StorageError::DownloadFailed(format!("{:?}", e))
                }
            })?;

        let data = result.body
            .collect()
            .await
            .map_err(|e| StorageError::DownloadFailed(format!("Failed to read body: {:?}", e)))?
            .into_bytes();

        debug!("Downloaded {} bytes from object storage: {}", data.len(), key);
        Ok(data)
    }

    /// Delete an object; S3 reports success for keys that do not exist
    #[instrument(skip(self))]
    pub async fn remove(&self, key: &str) -> Result<(), StorageError> {
        self.client
            .delete_object()
            .bucket(&self.bucket)
            .key(key)
            .send()
            .await
            .map_err(|e| StorageError::DeleteFailed(format!("{:?}", e)))?;

        info!("Deleted from object storage: {}", key);
        Ok(())
    }
}

#[async_trait]
impl ImageStorage for ObjectStorage {
    fn backend(&self) -> StorageBackend {
        StorageBackend::Object
    }

    async fn put(&self, key: &str, data: Bytes, content_type: &str) -> Result<ImageReference, StorageError> {
        self.upload(key, data, content_type).await?;
        Ok(ImageReference::External {
            url: self.public_url(key),
            key: Some(key.to_string()),
            content_type: Some(content_type.to_string()),
        })
    }

    async fn get(&self, location: &str) -> Result<Bytes, StorageError> {
        self.download(location).await
    }

    async fn delete(&self, location: &str) -> Result<(), StorageError> {
        self.remove(location).await
    }
}

/// Helper to check if a GetObject error is a missing key
fn is_not_found_error(err: &SdkError<GetObjectError>) -> bool {
    if let Some(service_err) = err.as_service_error() {
        return service_err.is_no_such_key();
    }
    err.raw_response()
        .map(|response| response.status().as_u16() == 404)
        .unwrap_or(false)
}
