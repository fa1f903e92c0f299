//! Local filesystem storage
//!
//! Files live under `root`. Product records store the public path
//! (`{public_prefix}/{key}`), which is also how legacy images such as
//! `/products/mic.jpg` were recorded, so one reader serves both.

use async_trait::async_trait;
use bytes::Bytes;
use std::path::{Component, Path, PathBuf};
use tracing::{debug, info, instrument};

use super::{ImageStorage, StorageError};
use crate::config::StorageBackend;
use crate::domain::ImageReference;

/// Filesystem-backed image storage
#[derive(Debug, Clone)]
pub struct LocalStorage {
    root: PathBuf,
    public_prefix: String,
}

impl LocalStorage {
    pub fn new(root: PathBuf, public_prefix: String) -> Self {
        let public_prefix = format!("/{}", public_prefix.trim_matches('/'));
        Self { root, public_prefix }
    }

    #[cfg(test)]
    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Map a recorded path onto the filesystem, refusing anything that would
    /// escape the root
    pub fn resolve(&self, location: &str) -> Result<PathBuf, StorageError> {
        let relative = Path::new(location.trim_start_matches('/'));
        if relative.as_os_str().is_empty() {
            return Err(StorageError::InvalidPath(location.to_string()));
        }

        for component in relative.components() {
            match component {
                Component::Normal(_) => {}
                _ => return Err(StorageError::InvalidPath(location.to_string())),
            }
        }

        Ok(self.root.join(relative))
    }

    /// True for paths written by [`ImageStorage::put`], as opposed to legacy
    /// assets that ship with the site
    fn is_managed(&self, location: &str) -> bool {
        let location = format!("/{}", location.trim_start_matches('/'));
        self.public_prefix != "/" && location.starts_with(&format!("{}/", self.public_prefix))
    }

    fn public_path(&self, key: &str) -> String {
        if self.public_prefix == "/" {
            format!("/{}", key)
        } else {
            format!("{}/{}", self.public_prefix, key)
        }
    }
}

#[async_trait]
impl ImageStorage for LocalStorage {
    fn backend(&self) -> StorageBackend {
        StorageBackend::Local
    }

    #[instrument(skip(self, data), fields(size = data.len()))]
    async fn put(&self, key: &str, data: Bytes, content_type: &str) -> Result<ImageReference, StorageError> {
        let public_path = self.public_path(key);
        let target = self.resolve(&public_path)?;

        if let Some(parent) = target.parent() {
            tokio::fs::create_dir_all(parent).await?;
        }

        // Write then rename so a failed write never leaves a truncated image
        let staging = target.with_extension("partial");
        tokio::fs::write(&staging, &data).await?;
        if let Err(e) = tokio::fs::rename(&staging, &target).await {
            let _ = tokio::fs::remove_file(&staging).await;
            return Err(e.into());
        }

        info!(path = %target.display(), size = data.len(), "Stored image on local disk");

        Ok(ImageReference::LocalPath {
            path: public_path,
            content_type: Some(content_type.to_string()),
        })
    }

    async fn get(&self, location: &str) -> Result<Bytes, StorageError> {
        let path = self.resolve(location)?;
        debug!(path = %path.display(), "Reading local image");

        match tokio::fs::read(&path).await {
            Ok(data) => Ok(Bytes::from(data)),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                Err(StorageError::NotFound(location.to_string()))
            }
            Err(e) => Err(e.into()),
        }
    }

    async fn delete(&self, location: &str) -> Result<(), StorageError> {
        if !self.is_managed(location) {
            debug!(location = %location, "Leaving unmanaged local image in place");
            return Ok(());
        }

        let path = self.resolve(location)?;
        match tokio::fs::remove_file(&path).await {
            Ok(()) => {
                info!(path = %path.display(), "Deleted local image");
                Ok(())
            }
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(()),
            Err(e) => Err(e.into()),
        }
    }
}
