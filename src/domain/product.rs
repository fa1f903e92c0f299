//! Product domain model
//!
//! Products carry a price as canonical decimal text and at most one image
//! representation at a time.

use bytes::Bytes;
use chrono::{DateTime, Utc};
use serde::Serialize;
use thiserror::Error;

/// Maximum product name length, in characters
pub const MAX_NAME_LENGTH: usize = 255;

/// Price column is NUMERIC(10,2)
const MAX_PRICE_INTEGER_DIGITS: usize = 8;
const PRICE_SCALE: usize = 2;

/// Name used for records created by an upload without a target product
pub const PLACEHOLDER_PRODUCT_NAME: &str = "Untitled upload";

/// Validation errors for product input
#[derive(Debug, Clone, PartialEq, Error)]
pub enum ValidationError {
    #[error("Product name is required")]
    NameRequired,
    #[error("Product name must be at most 255 characters, got {0}")]
    NameTooLong(usize),
    #[error("Price is required")]
    PriceRequired,
    #[error("Invalid price: {0}")]
    InvalidPrice(String),
    #[error("Price must be greater than zero")]
    PriceNotPositive,
}

// ============================================================================
// Price
// ============================================================================

/// Decimal price kept as text to avoid floating point rounding
///
/// The canonical form always has exactly two fraction digits, matching what
/// PostgreSQL returns for a NUMERIC(10,2) column cast to text.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(transparent)]
pub struct Price(String);

impl Price {
    /// Parse and canonicalize a positive price
    pub fn parse(input: &str) -> Result<Self, ValidationError> {
        let raw = input.trim();
        if raw.is_empty() {
            return Err(ValidationError::PriceRequired);
        }

        let (int_part, frac_part) = match raw.split_once('.') {
            Some((int_part, frac_part)) => (int_part, frac_part),
            None => (raw, ""),
        };

        let all_digits = |s: &str| s.chars().all(|c| c.is_ascii_digit());
        if !all_digits(int_part) || !all_digits(frac_part) || (int_part.is_empty() && frac_part.is_empty()) {
            return Err(ValidationError::InvalidPrice(raw.to_string()));
        }
        if frac_part.len() > PRICE_SCALE {
            return Err(ValidationError::InvalidPrice(format!(
                "{} has more than {} decimal places",
                raw, PRICE_SCALE
            )));
        }

        let int_trimmed = int_part.trim_start_matches('0');
        if int_trimmed.len() > MAX_PRICE_INTEGER_DIGITS {
            return Err(ValidationError::InvalidPrice(format!("{} is out of range", raw)));
        }

        let int_canonical = if int_trimmed.is_empty() { "0" } else { int_trimmed };
        let canonical = format!("{}.{:0<width$}", int_canonical, frac_part, width = PRICE_SCALE);

        if canonical.chars().all(|c| c == '0' || c == '.') {
            return Err(ValidationError::PriceNotPositive);
        }

        Ok(Price(canonical))
    }

    /// Price of records created implicitly by an upload
    pub fn placeholder() -> Self {
        Price("0.00".to_string())
    }

    /// Wrap a value read back from the database
    pub fn from_db(value: String) -> Self {
        Price(value)
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl std::fmt::Display for Price {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}

/// Validate a product name, returning the trimmed value
pub fn validate_name(name: &str) -> Result<String, ValidationError> {
    let trimmed = name.trim();
    if trimmed.is_empty() {
        return Err(ValidationError::NameRequired);
    }
    let length = trimmed.chars().count();
    if length > MAX_NAME_LENGTH {
        return Err(ValidationError::NameTooLong(length));
    }
    Ok(trimmed.to_string())
}

// ============================================================================
// Image reference
// ============================================================================

/// Where a product's image lives
///
/// Only one representation is authoritative; writing one clears the others.
#[derive(Debug, Clone, PartialEq, Default)]
pub enum ImageReference {
    #[default]
    None,
    /// Absolute URL. `key` is set when the object lives in our object storage.
    External {
        url: String,
        key: Option<String>,
        content_type: Option<String>,
    },
    /// Path relative to the local asset root, e.g. `/products/mic.jpg`
    LocalPath {
        path: String,
        content_type: Option<String>,
    },
    /// Bytes stored in the product row
    Inline {
        data: Bytes,
        content_type: Option<String>,
    },
}

impl ImageReference {
    /// Interpret an image value supplied by an API client
    ///
    /// `http(s)://` values are external URLs, anything else is a local path.
    pub fn from_client_value(value: &str) -> Self {
        let value = value.trim();
        if value.is_empty() {
            ImageReference::None
        } else if value.starts_with("http://") || value.starts_with("https://") {
            ImageReference::External {
                url: value.to_string(),
                key: None,
                content_type: None,
            }
        } else {
            ImageReference::LocalPath {
                path: value.to_string(),
                content_type: None,
            }
        }
    }

    pub fn is_present(&self) -> bool {
        !matches!(self, ImageReference::None)
    }

    pub fn content_type(&self) -> Option<&str> {
        match self {
            ImageReference::None => None,
            ImageReference::External { content_type, .. }
            | ImageReference::LocalPath { content_type, .. }
            | ImageReference::Inline { content_type, .. } => content_type.as_deref(),
        }
    }

    pub fn kind(&self) -> &'static str {
        match self {
            ImageReference::None => "none",
            ImageReference::External { .. } => "external",
            ImageReference::LocalPath { .. } => "local",
            ImageReference::Inline { .. } => "inline",
        }
    }
}

/// API path serving a product's image
pub fn image_api_path(product_id: i32) -> String {
    format!("/api/images/{}", product_id)
}

// ============================================================================
// Records
// ============================================================================

/// A stored product
#[derive(Debug, Clone, PartialEq)]
pub struct Product {
    pub id: i32,
    pub name: String,
    pub price: Price,
    pub description: Option<String>,
    pub image: ImageReference,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Product {
    /// True for the record an upload without a product id creates, as long
    /// as nobody has edited it since
    pub fn is_upload_placeholder(&self) -> bool {
        self.name == PLACEHOLDER_PRODUCT_NAME && self.price == Price::placeholder() && self.description.is_none()
    }

    pub fn summary(&self) -> ProductSummary {
        let has_image = self.image.is_present();
        ProductSummary {
            id: self.id,
            name: self.name.clone(),
            price: self.price.clone(),
            description: self.description.clone(),
            has_image,
            created_at: self.created_at,
            updated_at: self.updated_at,
        }
    }
}

/// Listing row: everything but the image payload
#[derive(Debug, Clone, PartialEq)]
pub struct ProductSummary {
    pub id: i32,
    pub name: String,
    pub price: Price,
    pub description: Option<String>,
    pub has_image: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Validated input for a new product
#[derive(Debug, Clone)]
pub struct NewProduct {
    pub name: String,
    pub price: Price,
    pub description: Option<String>,
    pub image: ImageReference,
}

impl NewProduct {
    pub fn new(name: &str, price: &str, description: Option<String>) -> Result<Self, ValidationError> {
        Ok(NewProduct {
            name: validate_name(name)?,
            price: Price::parse(price)?,
            description: description.filter(|d| !d.trim().is_empty()),
            image: ImageReference::None,
        })
    }

    /// Record created when an upload arrives without a target product
    pub fn placeholder(image: ImageReference) -> Self {
        NewProduct {
            name: PLACEHOLDER_PRODUCT_NAME.to_string(),
            price: Price::placeholder(),
            description: None,
            image,
        }
    }

    pub fn with_image(mut self, image: ImageReference) -> Self {
        self.image = image;
        self
    }
}

/// Partial update; `None` leaves a field unchanged
#[derive(Debug, Clone, Default)]
pub struct ProductPatch {
    pub name: Option<String>,
    pub price: Option<Price>,
    /// `Some(None)` clears the description
    pub description: Option<Option<String>>,
    pub image: Option<ImageReference>,
}

impl ProductPatch {
    pub fn is_empty(&self) -> bool {
        self.name.is_none() && self.price.is_none() && self.description.is_none() && self.image.is_none()
    }

    /// Apply to an in-memory record
    pub fn apply(self, product: &mut Product, now: DateTime<Utc>) {
        if let Some(name) = self.name {
            product.name = name;
        }
        if let Some(price) = self.price {
            product.price = price;
        }
        if let Some(description) = self.description {
            product.description = description;
        }
        if let Some(image) = self.image {
            product.image = image;
        }
        product.updated_at = now;
    }
}
