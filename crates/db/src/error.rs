/// Error type for document store access.
#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    /// The database query itself failed (connection, timeout, SQL).
    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),

    /// A stored document did not match the expected shape.
    #[error("Malformed document at {path}: {source}")]
    Decode {
        path: String,
        #[source]
        source: serde_json::Error,
    },

    /// Applying migrations failed.
    #[error("Migration failed: {0}")]
    Migrate(#[from] sqlx::migrate::MigrateError),
}
