//! Error types for client construction and credential storage.
//!
//! Request failures are reported as [`mailsweep_core::ServiceError`] so the
//! workflow engine can react to them; this type covers everything else.

/// Result type alias for client operations.
pub type Result<T> = std::result::Result<T, Error>;

/// Client error types.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// Invalid configuration.
    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),

    /// URL parsing error.
    #[error("URL error: {0}")]
    Url(#[from] url::ParseError),

    /// HTTP client could not be built.
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    /// Keyring access failed.
    #[error("Keyring error: {0}")]
    Credential(#[from] keyring::Error),
}
