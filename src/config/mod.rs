//! Routing configuration.
//!
//! Deployment settings for the routing layer: where the service lives,
//! which reflector fronted traffic is addressed to, and which regions get
//! circumvention automatically.
//!
//! # Example
//!
//! ```json
//! {
//!   "service_url": "https://service.example.org",
//!   "reflector_host": "reflector.example.net",
//!   "default_fronting_domain": "front.example.com",
//!   "censored_regions": [
//!     { "calling_code": "20", "country_code": "EG" }
//!   ]
//! }
//! ```
//!
//! No fronting domain is built in. With automatic circumvention on, every
//! censored region needs a `fronting_domain` unless
//! `default_fronting_domain` is set; validation rejects the configuration
//! otherwise.

mod error;

use std::path::Path;
use std::time::Duration;

use serde::{Deserialize, Serialize};
use url::Url;

pub use error::{ConfigError, ConfigResult};

use crate::censorship::{CensoredRegion, CensorshipTable};
use crate::policy::normalize_domain;

/// Default request timeout in seconds.
const DEFAULT_REQUEST_TIMEOUT_SECS: u64 = 30;

/// Default path prefix for fronted requests.
const DEFAULT_FRONTED_PATH_PREFIX: &str = "service";

/// Configuration for [`RoutingService`](crate::RoutingService).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RoutingConfig {
    /// Direct service endpoint (must be `https`).
    pub service_url: String,

    /// Host header sent on fronted requests.
    pub reflector_host: String,

    /// Path prefix on the fronting domain.
    #[serde(default = "default_fronted_path_prefix")]
    pub fronted_path_prefix: String,

    /// Fronting domain used when no manual or per-region domain applies.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub default_fronting_domain: Option<String>,

    /// Turn circumvention on automatically for censored phone numbers.
    #[serde(default = "default_true")]
    pub automatic_circumvention: bool,

    /// Request timeout in seconds.
    #[serde(default = "default_request_timeout_secs")]
    pub request_timeout_secs: u64,

    /// User agent for all requests.
    #[serde(default = "default_user_agent")]
    pub user_agent: String,

    /// Censored regions. `None` uses the built-in table.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub censored_regions: Option<Vec<CensoredRegion>>,
}

fn default_fronted_path_prefix() -> String {
    DEFAULT_FRONTED_PATH_PREFIX.to_string()
}

const fn default_true() -> bool {
    true
}

const fn default_request_timeout_secs() -> u64 {
    DEFAULT_REQUEST_TIMEOUT_SECS
}

fn default_user_agent() -> String {
    format!("fronting-core/{}", env!("CARGO_PKG_VERSION"))
}

impl RoutingConfig {
    /// Creates a configuration with defaults for everything but the two
    /// required endpoints.
    #[must_use]
    pub fn new(service_url: &str, reflector_host: &str) -> Self {
        Self {
            service_url: service_url.to_string(),
            reflector_host: reflector_host.to_string(),
            fronted_path_prefix: default_fronted_path_prefix(),
            default_fronting_domain: None,
            automatic_circumvention: true,
            request_timeout_secs: DEFAULT_REQUEST_TIMEOUT_SECS,
            user_agent: default_user_agent(),
            censored_regions: None,
        }
    }

    /// Sets the default fronting domain.
    #[must_use]
    pub fn with_default_fronting_domain(mut self, domain: &str) -> Self {
        self.default_fronting_domain = Some(domain.to_string());
        self
    }

    /// Replaces the censored-region list.
    #[must_use]
    pub fn with_censored_regions(mut self, regions: Vec<CensoredRegion>) -> Self {
        self.censored_regions = Some(regions);
        self
    }

    /// Parses and validates a JSON configuration.
    ///
    /// # Errors
    ///
    /// Returns an error if the JSON is malformed or a value is invalid.
    pub fn from_json_str(json: &str) -> ConfigResult<Self> {
        let config: Self = serde_json::from_str(json)?;
        config.validated()
    }

    /// Reads, parses and validates a JSON configuration file.
    ///
    /// # Errors
    ///
    /// Returns an error if the file cannot be read or is invalid.
    pub fn from_file(path: &Path) -> ConfigResult<Self> {
        let json = std::fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.display().to_string(),
            source,
        })?;
        Self::from_json_str(&json)
    }

    /// Validates the configuration and normalizes its domains.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::Invalid`] describing the first bad value.
    pub fn validated(mut self) -> ConfigResult<Self> {
        let service_url = Url::parse(&self.service_url)
            .map_err(|e| ConfigError::Invalid(format!("service_url {}: {e}", self.service_url)))?;
        if service_url.scheme() != "https" {
            return Err(ConfigError::Invalid(format!(
                "service_url must use https: {}",
                self.service_url
            )));
        }
        if service_url.host_str().is_none() {
            return Err(ConfigError::Invalid(format!(
                "service_url has no host: {}",
                self.service_url
            )));
        }

        self.reflector_host = normalize_domain(&self.reflector_host)
            .map_err(|e| ConfigError::Invalid(format!("reflector_host: {e}")))?;

        self.default_fronting_domain = self
            .default_fronting_domain
            .as_deref()
            .map(normalize_domain)
            .transpose()
            .map_err(|e| ConfigError::Invalid(format!("default_fronting_domain: {e}")))?;

        if self.request_timeout_secs == 0 {
            return Err(ConfigError::Invalid(
                "request_timeout_secs must be positive".to_string(),
            ));
        }

        if self.user_agent.trim().is_empty() {
            return Err(ConfigError::Invalid("user_agent is empty".to_string()));
        }

        let table = self.censorship_table()?;
        if self.censored_regions.is_some() {
            self.censored_regions = Some(table.regions().cloned().collect());
        }

        if self.automatic_circumvention && self.default_fronting_domain.is_none() {
            if let Some(region) = table
                .regions()
                .find(|region| region.fronting_domain.is_none())
            {
                return Err(ConfigError::Invalid(format!(
                    "censored region {} has no fronting_domain and default_fronting_domain is not set",
                    region.country_code
                )));
            }
        }

        Ok(self)
    }

    /// Builds the censorship table this configuration describes.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::Invalid`] if a region entry is malformed.
    pub fn censorship_table(&self) -> ConfigResult<CensorshipTable> {
        match &self.censored_regions {
            Some(regions) => CensorshipTable::new(regions.iter().cloned())
                .map_err(|e| ConfigError::Invalid(format!("censored_regions: {e}"))),
            None => Ok(CensorshipTable::builtin()),
        }
    }

    /// Returns the request timeout.
    #[must_use]
    pub const fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.request_timeout_secs)
    }
}
