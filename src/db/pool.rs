//! Database connection pool management

use deadpool_postgres::{Config, ManagerConfig, Pool, PoolConfig, RecyclingMethod, Runtime};
use percent_encoding::percent_decode_str;
use std::sync::Arc;
use thiserror::Error;
use tokio_postgres::NoTls;
use tokio_postgres_rustls::MakeRustlsConnect;
use tracing::info;

use crate::config::DatabaseSettings;

/// Database-related errors
#[derive(Debug, Error)]
pub enum DbError {
    #[error("Pool error: {0}")]
    Pool(#[from] deadpool_postgres::CreatePoolError),
    #[error("Query error: {0}")]
    Query(#[from] tokio_postgres::Error),
    #[error("Pool get error: {0}")]
    PoolGet(#[from] deadpool_postgres::PoolError),
    #[error("Configuration error: {0}")]
    Config(String),
}

/// Idempotent schema setup, including the image columns added over time
///
/// Tables created by earlier releases stored timestamps without a time zone
/// and allowed them to be NULL; those are converted (as UTC) and backfilled.
const SCHEMA: &str = r#"
    CREATE TABLE IF NOT EXISTS products (
        id SERIAL PRIMARY KEY,
        name VARCHAR(255) NOT NULL,
        price NUMERIC(10, 2) NOT NULL,
        description TEXT,
        image VARCHAR(500),
        created_at TIMESTAMPTZ NOT NULL DEFAULT NOW(),
        updated_at TIMESTAMPTZ NOT NULL DEFAULT NOW()
    );
    ALTER TABLE products
        ADD COLUMN IF NOT EXISTS image_url TEXT,
        ADD COLUMN IF NOT EXISTS image_key TEXT,
        ADD COLUMN IF NOT EXISTS image_data BYTEA,
        ADD COLUMN IF NOT EXISTS image_type VARCHAR(100),
        ADD COLUMN IF NOT EXISTS created_at TIMESTAMPTZ,
        ADD COLUMN IF NOT EXISTS updated_at TIMESTAMPTZ;
    DO $$
    BEGIN
        IF EXISTS (
            SELECT 1 FROM information_schema.columns
            WHERE table_schema = current_schema() AND table_name = 'products'
              AND column_name = 'created_at' AND data_type = 'timestamp without time zone'
        ) THEN
            ALTER TABLE products ALTER COLUMN created_at TYPE TIMESTAMPTZ USING created_at AT TIME ZONE 'UTC';
        END IF;
        IF EXISTS (
            SELECT 1 FROM information_schema.columns
            WHERE table_schema = current_schema() AND table_name = 'products'
              AND column_name = 'updated_at' AND data_type = 'timestamp without time zone'
        ) THEN
            ALTER TABLE products ALTER COLUMN updated_at TYPE TIMESTAMPTZ USING updated_at AT TIME ZONE 'UTC';
        END IF;
    END
    $$;
    UPDATE products SET created_at = NOW() WHERE created_at IS NULL;
    UPDATE products SET updated_at = created_at WHERE updated_at IS NULL;
    ALTER TABLE products
        ALTER COLUMN created_at SET DEFAULT NOW(),
        ALTER COLUMN created_at SET NOT NULL,
        ALTER COLUMN updated_at SET DEFAULT NOW(),
        ALTER COLUMN updated_at SET NOT NULL;
    CREATE INDEX IF NOT EXISTS products_created_at_idx ON products (created_at DESC, id DESC);
"#;

/// Database connection pool wrapper
#[derive(Clone)]
pub struct DbPool {
    pool: Pool,
}

impl DbPool {
    /// Create a new database pool from the database settings
    pub fn new(settings: &DatabaseSettings) -> Result<Self, DbError> {
        let url = url::Url::parse(&settings.url)
            .map_err(|e| DbError::Config(format!("Invalid database URL: {}", e)))?;

        let host = url.host_str()
            .ok_or_else(|| DbError::Config("Missing host in database URL".to_string()))?;
        let port = url.port().unwrap_or(5432);
        let user = percent_decode_str(url.username()).decode_utf8_lossy().into_owned();
        let password = url.password()
            .map(|p| percent_decode_str(p).decode_utf8_lossy().into_owned())
            .unwrap_or_default();
        let dbname = url.path().trim_start_matches('/');

        // Hosted Postgres (Neon etc.) hands out URLs with sslmode=require
        let use_tls = settings.require_tls
            || url.query_pairs().any(|(k, v)| k == "sslmode" && v != "disable");

        let mut cfg = Config::new();
        cfg.host = Some(host.to_string());
        cfg.port = Some(port);
        cfg.user = Some(user);
        cfg.password = Some(password);
        cfg.dbname = Some(dbname.to_string());

        cfg.manager = Some(ManagerConfig {
            recycling_method: RecyclingMethod::Fast,
        });
        if let Some(max) = settings.max_connections {
            cfg.pool = Some(PoolConfig::new(max));
        }

        let pool = if use_tls {
            cfg.create_pool(Some(Runtime::Tokio1), tls_connector()?)?
        } else {
            cfg.create_pool(Some(Runtime::Tokio1), NoTls)?
        };

        info!(
            host = %host,
            port = %port,
            dbname = %dbname,
            tls = use_tls,
            "Database pool created"
        );

        Ok(DbPool { pool })
    }

    /// Get the underlying pool reference
    #[cfg(test)]
    pub fn pool(&self) -> &Pool {
        &self.pool
    }

    /// Get a connection from the pool
    pub async fn get(&self) -> Result<deadpool_postgres::Object, DbError> {
        Ok(self.pool.get().await?)
    }

    /// Test the database connection
    pub async fn test_connection(&self) -> Result<(), DbError> {
        let client = self.get().await?;
        client.query_one("SELECT 1", &[]).await?;
        info!("Database connection test successful");
        Ok(())
    }

    /// Create the products table and any missing image columns
    pub async fn ensure_schema(&self) -> Result<(), DbError> {
        let client = self.get().await?;
        client.batch_execute(SCHEMA).await?;
        info!("Database schema verified");
        Ok(())
    }
}

fn tls_connector() -> Result<MakeRustlsConnect, DbError> {
    let mut roots = rustls::RootCertStore::empty();
    roots.extend(webpki_roots::TLS_SERVER_ROOTS.iter().cloned());

    let provider = Arc::new(rustls::crypto::ring::default_provider());
    let tls_config = rustls::ClientConfig::builder_with_provider(provider)
        .with_safe_default_protocol_versions()
        .map_err(|e| DbError::Config(format!("TLS setup failed: {}", e)))?
        .with_root_certificates(roots)
        .with_no_client_auth();

    Ok(MakeRustlsConnect::new(tls_config))
}
