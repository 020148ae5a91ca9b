//! Access to the document store the notification engine consumes.
//!
//! - [`DocumentStore`]: the read-only queries the engine needs.
//! - [`PgDocumentStore`]: PostgreSQL implementation over JSONB documents.
//! - [`ChangeRepo`] and [`ChangeOutbox`]: the change-capture outbox feeding
//!   the trigger handlers.
//! - [`MemoryStore`]: in-process store for tests and local tooling.

pub mod changes;
pub mod error;
pub mod memory;
pub mod postgres;
pub mod store;

use sqlx::postgres::PgPoolOptions;

pub use changes::{ChangeOutbox, ChangeRepo, ChangeRow, PgChangeOutbox, CHANGE_CHANNEL};
pub use error::StoreError;
pub use memory::MemoryStore;
pub use postgres::PgDocumentStore;
pub use store::DocumentStore;

pub type DbPool = sqlx::PgPool;

/// Create a connection pool from a database URL.
pub async fn create_pool(database_url: &str, max_connections: u32) -> Result<DbPool, sqlx::Error> {
    PgPoolOptions::new()
        .max_connections(max_connections)
        .connect(database_url)
        .await
}

/// Round-trip a trivial query to verify connectivity.
pub async fn health_check(pool: &DbPool) -> Result<(), sqlx::Error> {
    sqlx::query("SELECT 1").execute(pool).await?;
    Ok(())
}

/// Apply the embedded migrations from `db/migrations`.
pub async fn run_migrations(pool: &DbPool) -> Result<(), StoreError> {
    sqlx::migrate!("../../db/migrations").run(pool).await?;
    Ok(())
}
