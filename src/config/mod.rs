//! Configuration module for the storefront service

use serde::Deserialize;
use config::{Config, ConfigError, Environment, File};
use std::path::PathBuf;

/// Default upload ceiling: 1 MiB
pub const DEFAULT_MAX_UPLOAD_SIZE_BYTES: usize = 1024 * 1024;

/// Main application settings
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct Settings {
    pub server: ServerSettings,
    pub database: DatabaseSettings,
    pub storage: StorageSettings,
}

/// HTTP server configuration
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct ServerSettings {
    pub host: String,
    pub port: u16,
    pub workers: Option<usize>,
}

/// Database configuration for PostgreSQL
///
/// An empty `url` runs the service on the in-memory product store.
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct DatabaseSettings {
    pub url: String,
    pub max_connections: Option<usize>,
    pub require_tls: bool,
}

/// Which backend receives new uploads
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum StorageBackend {
    /// S3-compatible object storage (Cloudflare R2 in production)
    Object,
    /// Files under `local_root`
    Local,
    /// Bytes kept in the `products.image_data` column
    Inline,
}

impl StorageBackend {
    pub fn as_str(&self) -> &'static str {
        match self {
            StorageBackend::Object => "object",
            StorageBackend::Local => "local",
            StorageBackend::Inline => "inline",
        }
    }
}

/// Image storage configuration
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct StorageSettings {
    pub backend: StorageBackend,
    pub max_upload_size_bytes: usize,
    /// Image served when a product has no image of its own
    pub placeholder_asset_path: PathBuf,
    /// Root directory for local uploads and legacy `/products/*.jpg` paths
    pub local_root: PathBuf,
    /// Prefix prepended to local upload paths stored on the product
    pub public_path_prefix: String,
    pub object: ObjectStoreSettings,
}

/// S3-compatible object storage credentials
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct ObjectStoreSettings {
    /// Full endpoint URL; takes precedence over `account_id`
    pub endpoint: Option<String>,
    /// Cloudflare account id, used to derive the R2 endpoint
    pub account_id: String,
    pub access_key_id: String,
    pub secret_access_key: String,
    pub bucket_name: String,
    pub public_url_prefix: Option<String>,
    pub region: String,
}

impl Settings {
    /// Load configuration from files and environment variables
    ///
    /// Configuration priority (highest to lowest):
    /// 1. Environment variables (prefixed with STOREFRONT_)
    /// 2. config/local.toml (gitignored)
    /// 3. config/default.toml
    pub fn load() -> Result<Self, ConfigError> {
        let config_dir = std::env::var("CONFIG_PATH")
            .map(PathBuf::from)
            .unwrap_or_else(|_| PathBuf::from("config"));

        let builder = Config::builder()
            .add_source(File::from(config_dir.join("default.toml")).required(false))
            .add_source(File::from(config_dir.join("local.toml")).required(false))
            // STOREFRONT_STORAGE__BACKEND, STOREFRONT_DATABASE__URL, etc.
            .add_source(
                Environment::with_prefix("STOREFRONT")
                    .separator("__")
                    .try_parsing(true)
            );

        builder.build()?.try_deserialize()
    }
}

impl Default for ServerSettings {
    fn default() -> Self {
        ServerSettings {
            host: "0.0.0.0".to_string(),
            port: 8080,
            workers: None,
        }
    }
}

impl Default for DatabaseSettings {
    fn default() -> Self {
        DatabaseSettings {
            url: String::new(),
            max_connections: Some(10),
            require_tls: false,
        }
    }
}

impl Default for StorageSettings {
    fn default() -> Self {
        StorageSettings {
            backend: StorageBackend::Object,
            max_upload_size_bytes: DEFAULT_MAX_UPLOAD_SIZE_BYTES,
            placeholder_asset_path: PathBuf::from("public/placeholder.png"),
            local_root: PathBuf::from("public"),
            public_path_prefix: "/uploads".to_string(),
            object: ObjectStoreSettings::default(),
        }
    }
}

impl Default for ObjectStoreSettings {
    fn default() -> Self {
        ObjectStoreSettings {
            endpoint: None,
            account_id: String::new(),
            access_key_id: String::new(),
            secret_access_key: String::new(),
            bucket_name: "storefront-product-images".to_string(),
            public_url_prefix: None,
            region: "auto".to_string(),
        }
    }
}

impl ObjectStoreSettings {
    /// Endpoint URL, derived from the account id when not set explicitly
    pub fn endpoint_url(&self) -> Option<String> {
        match &self.endpoint {
            Some(endpoint) if !endpoint.is_empty() => Some(endpoint.trim_end_matches('/').to_string()),
            _ if !self.account_id.is_empty() => {
                Some(format!("https://{}.r2.cloudflarestorage.com", self.account_id))
            }
            _ => None,
        }
    }

    pub fn is_configured(&self) -> bool {
        self.endpoint_url().is_some()
            && !self.access_key_id.is_empty()
            && !self.secret_access_key.is_empty()
            && !self.bucket_name.is_empty()
    }
}
