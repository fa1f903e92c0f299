//! Row mapping between the `products` table and domain types

use bytes::Bytes;
use tokio_postgres::Row;

use crate::domain::media::decode_legacy_inline;
use crate::domain::{ImageReference, Price, Product, ProductSummary};

/// Column list for full product reads
pub const PRODUCT_COLUMNS: &str = r#"
    id, name, price::text AS price, description,
    image, image_url, image_key, image_data, image_type,
    created_at, updated_at
"#;

/// Column list for image-only reads
pub const IMAGE_COLUMNS: &str = "image, image_url, image_key, image_data, image_type";

/// Image reference flattened into the table's nullable columns
#[derive(Debug, Default)]
pub struct ImageColumns<'a> {
    pub path: Option<&'a str>,
    pub url: Option<&'a str>,
    pub key: Option<&'a str>,
    pub data: Option<&'a [u8]>,
    pub content_type: Option<&'a str>,
}

impl<'a> From<&'a ImageReference> for ImageColumns<'a> {
    fn from(image: &'a ImageReference) -> Self {
        match image {
            ImageReference::None => ImageColumns::default(),
            ImageReference::External { url, key, content_type } => ImageColumns {
                url: Some(url),
                key: key.as_deref(),
                content_type: content_type.as_deref(),
                ..Default::default()
            },
            ImageReference::LocalPath { path, content_type } => ImageColumns {
                path: Some(path),
                content_type: content_type.as_deref(),
                ..Default::default()
            },
            ImageReference::Inline { data, content_type } => ImageColumns {
                data: Some(data.as_ref()),
                content_type: content_type.as_deref(),
                ..Default::default()
            },
        }
    }
}

/// Read the image columns of a row
///
/// Rows written before the single-representation rule may have several
/// columns set; inline data wins, then the URL, then the legacy path.
pub fn image_from_row(row: &Row) -> ImageReference {
    let content_type: Option<String> = row.get("image_type");

    if let Some(data) = row.get::<_, Option<Vec<u8>>>("image_data") {
        return ImageReference::Inline {
            data: decode_legacy_inline(Bytes::from(data)),
            content_type,
        };
    }
    if let Some(url) = row.get::<_, Option<String>>("image_url") {
        return ImageReference::External {
            url,
            key: row.get("image_key"),
            content_type,
        };
    }
    if let Some(path) = row.get::<_, Option<String>>("image") {
        return ImageReference::LocalPath { path, content_type };
    }
    ImageReference::None
}

pub fn product_from_row(row: &Row) -> Product {
    Product {
        id: row.get("id"),
        name: row.get("name"),
        price: Price::from_db(row.get("price")),
        description: row.get("description"),
        image: image_from_row(row),
        created_at: row.get("created_at"),
        updated_at: row.get("updated_at"),
    }
}

pub fn summary_from_row(row: &Row) -> ProductSummary {
    ProductSummary {
        id: row.get("id"),
        name: row.get("name"),
        price: Price::from_db(row.get("price")),
        description: row.get("description"),
        has_image: row.get("has_image"),
        created_at: row.get("created_at"),
        updated_at: row.get("updated_at"),
    }
}
