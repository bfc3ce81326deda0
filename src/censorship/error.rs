//! Error types for censorship classification.
//!
//! This module defines errors raised while parsing phone numbers and
//! building censored-region tables.

use thiserror::Error;

/// Errors that can occur during censorship classification.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum CensorshipError {
    /// The phone number is not a valid E.164 number.
    #[error("Invalid phone number: {0}")]
    InvalidPhoneNumber(String),

    /// A calling code is not 1 to 3 digits.
    #[error("Invalid calling code: {0}")]
    InvalidCallingCode(String),

    /// A country code is not a two-letter ISO code.
    #[error("Invalid country code: {0}")]
    InvalidCountryCode(String),

    /// Two table entries share the same calling code.
    #[error("Duplicate calling code in censorship table: {0}")]
    DuplicateCallingCode(String),

    /// A region's fronting domain failed validation.
    #[error("Invalid fronting domain for region {country_code}: {reason}")]
    InvalidFrontingDomain {
        /// The region whose domain was rejected.
        country_code: String,
        /// Why the domain was rejected.
        reason: String,
    },
}

/// Result type for censorship operations.
pub type CensorshipResult<T> = Result<T, CensorshipError>;
