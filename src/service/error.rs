//! Error types for the routing service.
//!
//! Wraps the errors of the components the service coordinates, so callers
//! only deal with one error type.

use thiserror::Error;

use crate::censorship::CensorshipError;
use crate::config::ConfigError;
use crate::policy::PolicyError;
use crate::session::SessionError;

/// Errors that can occur during routing service operations.
#[derive(Debug, Error)]
pub enum ServiceError {
    /// Policy validation or persistence failed.
    #[error(transparent)]
    Policy(#[from] PolicyError),

    /// Phone number or censorship table was invalid.
    #[error(transparent)]
    Censorship(#[from] CensorshipError),

    /// A session could not be built for the requested state.
    #[error(transparent)]
    Session(#[from] SessionError),

    /// Configuration was invalid.
    #[error(transparent)]
    Config(#[from] ConfigError),

    /// The data directory could not be prepared.
    #[error("Storage error: {0}")]
    Storage(String),

    /// The service has been shut down.
    #[error("Routing service has been shut down")]
    ShutDown,
}

/// Result type for routing service operations.
pub type ServiceResult<T> = Result<T, ServiceError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn wrapped_errors_are_transparent() {
        let error: ServiceError = PolicyError::InvalidDomain("domain is empty".to_string()).into();
        assert_eq!(error.to_string(), "Invalid circumvention domain: domain is empty");

        let error: ServiceError = SessionError::NoFrontingDomain.into();
        assert_eq!(
            error.to_string(),
            "Circumvention is active but no fronting domain is configured"
        );

        let error: ServiceError = CensorshipError::InvalidPhoneNumber("x".to_string()).into();
        assert_eq!(error.to_string(), "Invalid phone number: x");
    }

    #[test]
    fn shut_down_error_display() {
        assert_eq!(
            ServiceError::ShutDown.to_string(),
            "Routing service has been shut down"
        );
    }

    #[test]
    fn storage_error_display() {
        let error = ServiceError::Storage("permission denied".to_string());
        assert_eq!(error.to_string(), "Storage error: permission denied");
    }
}
