//! Storefront
//!
//! Product catalogue and image service behind the storefront admin panel.
//! Products live in PostgreSQL (or memory when no database is configured);
//! images go to object storage, the local disk or the product row.

use actix_web::{middleware, web, App, HttpServer};
use anyhow::Context;
use std::sync::Arc;
use tracing::{info, warn};
use tracing_actix_web::TracingLogger;

mod api;
mod config;
mod db;
mod domain;
mod images;
mod storage;

use crate::config::Settings;
use crate::db::{DbPool, MemoryProductStore, ProductRepository, ProductStore};
use crate::images::{ImageMigrator, ImageResolver, Placeholder, UploadService};
use crate::storage::ImageStores;

/// Application state shared across all handlers
pub struct AppState {
    pub store: Arc<dyn ProductStore>,
    pub db_pool: Option<DbPool>,
    pub stores: ImageStores,
    pub resolver: ImageResolver,
    pub uploader: UploadService,
    pub migrator: ImageMigrator,
}

impl AppState {
    pub fn new(
        settings: &Settings,
        store: Arc<dyn ProductStore>,
        db_pool: Option<DbPool>,
        stores: ImageStores,
        placeholder: Option<Placeholder>,
    ) -> Self {
        let resolver = ImageResolver::new(store.clone(), stores.clone(), placeholder);
        let uploader = UploadService::new(store.clone(), stores.clone(), settings.storage.max_upload_size_bytes);
        let migrator = ImageMigrator::new(store.clone(), stores.clone(), settings.storage.max_upload_size_bytes);

        AppState {
            store,
            db_pool,
            stores,
            resolver,
            uploader,
            migrator,
        }
    }
}

/// Connect to PostgreSQL, falling back to the in-memory store
async fn init_store(settings: &Settings) -> (Arc<dyn ProductStore>, Option<DbPool>) {
    if settings.database.url.is_empty() {
        info!("No database URL configured, using in-memory product store");
        return (Arc::new(MemoryProductStore::new()), None);
    }

    let pool = match DbPool::new(&settings.database) {
        Ok(pool) => pool,
        Err(e) => {
            warn!("Failed to create database pool: {}. Using in-memory product store.", e);
            return (Arc::new(MemoryProductStore::new()), None);
        }
    };

    if let Err(e) = pool.test_connection().await {
        warn!("Database connection test failed: {}. Using in-memory product store.", e);
        return (Arc::new(MemoryProductStore::new()), None);
    }
    if let Err(e) = pool.ensure_schema().await {
        warn!("Schema setup failed: {}. Using in-memory product store.", e);
        return (Arc::new(MemoryProductStore::new()), None);
    }

    info!("Database pool initialized successfully");
    (Arc::new(ProductRepository::new(pool.clone())), Some(pool))
}

#[actix_web::main]
async fn main() -> anyhow::Result<()> {
    // Load environment variables from .env file
    dotenvy::dotenv().ok();

    // Initialize tracing subscriber for structured logging
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::from_default_env()
                .add_directive("storefront=info".parse()?)
                .add_directive("actix_web=info".parse()?)
        )
        .json()
        .init();

    let settings = Settings::load().context("Failed to load configuration")?;
    let bind_addr = format!("{}:{}", settings.server.host, settings.server.port);

    info!(
        "Starting storefront v{} on {}",
        env!("CARGO_PKG_VERSION"),
        bind_addr
    );

    let (store, db_pool) = init_store(&settings).await;

    let stores = ImageStores::from_settings(&settings.storage)
        .await
        .context("Failed to initialize image storage")?;

    let placeholder = match Placeholder::load(&settings.storage.placeholder_asset_path).await {
        Ok(placeholder) => Some(placeholder),
        Err(e) => {
            warn!(
                path = %settings.storage.placeholder_asset_path.display(),
                error = %e,
                "Placeholder asset not loaded; products without images will return 404"
            );
            None
        }
    };

    // 2 workers per CPU for async I/O unless configured
    let workers = settings.server.workers.unwrap_or_else(|| num_cpus::get() * 2);

    let app_state = web::Data::new(AppState::new(&settings, store, db_pool, stores, placeholder));

    HttpServer::new(move || {
        App::new()
            .app_data(app_state.clone())
            .wrap(TracingLogger::default())
            .wrap(middleware::Compress::default())
            .wrap(
                middleware::DefaultHeaders::new()
                    .add(("X-Service", "storefront"))
                    .add(("X-Version", env!("CARGO_PKG_VERSION")))
            )
            .configure(api::configure_routes)
    })
    .workers(workers)
    .bind(&bind_addr)
    .with_context(|| format!("Failed to bind {}", bind_addr))?
    .run()
    .await
    .context("HTTP server error")
}
