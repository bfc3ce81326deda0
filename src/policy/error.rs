//! Error types for the circumvention policy store.
//!
//! This module defines errors that can occur while validating or
//! persisting manual circumvention settings.

use thiserror::Error;

/// Error type for policy operations.
#[derive(Error, Debug)]
pub enum PolicyError {
    /// The manual fronting domain failed validation.
    #[error("Invalid circumvention domain: {0}")]
    InvalidDomain(String),

    /// The manual country code failed validation.
    #[error("Invalid circumvention country code: {0}")]
    InvalidCountryCode(String),

    /// Storage operation failed.
    #[error("Storage error: {0}")]
    Storage(String),

    /// Database error from `SQLite`.
    #[error("Database error: {0}")]
    Database(#[from] rusqlite::Error),

    /// A persisted value could not be decoded.
    #[error("Invalid stored data: {0}")]
    InvalidData(String),
}

impl PolicyError {
    /// Returns true if this error rejects user input rather than
    /// reporting a storage failure.
    #[must_use]
    pub const fn is_validation(&self) -> bool {
        matches!(self, Self::InvalidDomain(_) | Self::InvalidCountryCode(_))
    }
}

/// Result type alias for policy operations.
pub type Result<T> = std::result::Result<T, PolicyError>;
