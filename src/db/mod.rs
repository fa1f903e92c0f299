//! Database module
//!
//! Provides the PostgreSQL connection pool, the product repository and an
//! in-memory store, all behind the [`ProductStore`] trait.

pub mod pool;
pub mod models;
pub mod queries;
pub mod memory;
pub mod store;
#[cfg(test)]
pub mod testing;

pub use pool::{DbError, DbPool};
pub use queries::ProductRepository;
pub use memory::MemoryProductStore;
pub use store::ProductStore;
