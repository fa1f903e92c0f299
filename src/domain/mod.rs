//! Domain types and models

pub mod media;
mod product;

pub use product::{
    image_api_path, validate_name, ImageReference, NewProduct, Price, Product, ProductPatch,
    ProductSummary, ValidationError, PLACEHOLDER_PRODUCT_NAME,
};
