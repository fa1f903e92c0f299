//! PostgreSQL product repository

use async_trait::async_trait;
use tracing::info;

use super::models::{image_from_row, product_from_row, summary_from_row, ImageColumns, IMAGE_COLUMNS, PRODUCT_COLUMNS};
use super::pool::DbPool;
use super::store::{ProductStore, StoreResult};
use crate::domain::{ImageReference, NewProduct, Product, ProductPatch, ProductSummary};

/// Repository for product database operations
#[derive(Clone)]
pub struct ProductRepository {
    pool: DbPool,
}

impl ProductRepository {
    /// Create a new product repository
    pub fn new(pool: DbPool) -> Self {
        ProductRepository { pool }
    }
}

#[async_trait]
impl ProductStore for ProductRepository {
    fn name(&self) -> &'static str {
        "postgres"
    }

    async fn list(&self) -> StoreResult<Vec<ProductSummary>> {
        let client = self.pool.get().await?;

        let rows = client.query(
            r#"
            SELECT
                id, name, price::text AS price, description,
                (image_data IS NOT NULL OR image_url IS NOT NULL OR image IS NOT NULL) AS has_image,
                created_at, updated_at
            FROM products
            ORDER BY created_at DESC, id DESC
            "#,
            &[]
        ).await?;

        let products: Vec<ProductSummary> = rows.iter().map(summary_from_row).collect();

        info!("Loaded {} products from database", products.len());
        Ok(products)
    }

    async fn get(&self, id: i32) -> StoreResult<Option<Product>> {
        let client = self.pool.get().await?;

        let sql = format!("SELECT {} FROM products WHERE id = $1", PRODUCT_COLUMNS);
        let row = client.query_opt(sql.as_str(), &[&id]).await?;

        Ok(row.as_ref().map(product_from_row))
    }

    async fn image(&self, id: i32) -> StoreResult<Option<ImageReference>> {
        let client = self.pool.get().await?;

        let sql = format!("SELECT {} FROM products WHERE id = $1", IMAGE_COLUMNS);
        let row = client.query_opt(sql.as_str(), &[&id]).await?;

        Ok(row.as_ref().map(image_from_row))
    }

    async fn create(&self, product: NewProduct) -> StoreResult<Product> {
        let client = self.pool.get().await?;
        let image = ImageColumns::from(&product.image);

        let sql = format!(
            r#"
            INSERT INTO products (
                name, price, description,
                image, image_url, image_key, image_data, image_type
            ) VALUES ($1, $2::text::numeric, $3, $4, $5, $6, $7, $8)
            RETURNING {}
            "#,
            PRODUCT_COLUMNS
        );

        let row = client.query_one(
            sql.as_str(),
            &[
                &product.name,
                &product.price.as_str(),
                &product.description,
                &image.path,
                &image.url,
                &image.key,
                &image.data,
                &image.content_type,
            ]
        ).await?;

        let created = product_from_row(&row);
        info!(product_id = created.id, image = created.image.kind(), "Created product");
        Ok(created)
    }

    async fn update(&self, id: i32, patch: ProductPatch) -> StoreResult<Option<Product>> {
        let client = self.pool.get().await?;

        let price = patch.price.as_ref().map(|p| p.as_str());
        let set_description = patch.description.is_some();
        let description = patch.description.clone().flatten();
        let set_image = patch.image.is_some();
        let image = patch.image.as_ref().map(ImageColumns::from).unwrap_or_default();

        let sql = format!(
            r#"
            UPDATE products SET
                name = COALESCE($2, name),
                price = COALESCE($3::text::numeric, price),
                description = CASE WHEN $4 THEN $5 ELSE description END,
                image = CASE WHEN $6 THEN $7 ELSE image END,
                image_url = CASE WHEN $6 THEN $8 ELSE image_url END,
                image_key = CASE WHEN $6 THEN $9 ELSE image_key END,
                image_data = CASE WHEN $6 THEN $10 ELSE image_data END,
                image_type = CASE WHEN $6 THEN $11 ELSE image_type END,
                updated_at = NOW()
            WHERE id = $1
            RETURNING {}
            "#,
            PRODUCT_COLUMNS
        );

        let row = client.query_opt(
            sql.as_str(),
            &[
                &id,
                &patch.name,
                &price,
                &set_description,
                &description,
                &set_image,
                &image.path,
                &image.url,
                &image.key,
                &image.data,
                &image.content_type,
            ]
        ).await?;

        Ok(row.as_ref().map(product_from_row))
    }

    async fn delete(&self, id: i32) -> StoreResult<Option<Product>> {
        let client = self.pool.get().await?;

        let sql = format!("DELETE FROM products WHERE id = $1 RETURNING {}", PRODUCT_COLUMNS);
        let row = client.query_opt(sql.as_str(), &[&id]).await?;

        if row.is_some() {
            info!(product_id = id, "Deleted product");
        }
        Ok(row.as_ref().map(product_from_row))
    }

    async fn count(&self) -> StoreResult<i64> {
        let client = self.pool.get().await?;

        let row = client.query_one("SELECT COUNT(*) AS count FROM products", &[]).await?;
        Ok(row.get("count"))
    }

    async fn image_in_use(&self, image: &ImageReference) -> StoreResult<bool> {
        let columns = ImageColumns::from(image);
        if columns.key.is_none() && columns.path.is_none() {
            return Ok(false);
        }

        let client = self.pool.get().await?;
        let row = client.query_one(
            r#"
            SELECT EXISTS(
                SELECT 1 FROM products
                WHERE ($1::text IS NOT NULL AND image_key = $1)
                   OR ($2::text IS NOT NULL AND image = $2)
            ) AS found
            "#,
            &[&columns.key, &columns.path]
        ).await?;

        Ok(row.get("found"))
    }
}
