//! Product image services
//!
//! - `resolver`: read side, product id to image response
//! - `upload`: write side, validated upload to the configured backend
//! - `migrate`: moves legacy representations into the configured backend

pub mod migrate;
pub mod resolver;
pub mod upload;

pub use migrate::{ImageMigrator, MigrationReport};
pub use resolver::{CachePolicy, ImageResolver, Placeholder, ResolveError, ResolvedImage, ServedImage};
pub use upload::{UploadError, UploadFile, UploadOutcome, UploadRequest, UploadService};
