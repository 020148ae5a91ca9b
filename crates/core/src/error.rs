#[derive(Debug, thiserror::Error)]
pub enum CoreError {
    #[error("Invalid document path '{0}': expected non-empty collection/id segment pairs")]
    InvalidPath(String),

    #[error("Invalid hour {0}: must be within 0..=23")]
    InvalidHour(u8),

    #[error("Validation failed: {0}")]
    Validation(String),
}
