//! Error types for session construction.

use thiserror::Error;

/// Errors that can occur while building a service session.
#[derive(Debug, Error)]
pub enum SessionError {
    /// A URL could not be built or escaped its base.
    #[error("Invalid URL: {0}")]
    InvalidUrl(String),

    /// Circumvention is active but no fronting domain is configured.
    #[error("Circumvention is active but no fronting domain is configured")]
    NoFrontingDomain,

    /// The HTTP client could not be built.
    #[error("Failed to build HTTP client: {0}")]
    Build(String),
}

/// Result type for session operations.
pub type SessionResult<T> = Result<T, SessionError>;
