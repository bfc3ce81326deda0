//! Session selection between direct and fronted routing.

use std::time::Duration;

use reqwest::Client;
use tracing::{debug, info};
use url::Url;

use super::error::{SessionError, SessionResult};
use super::types::{RoutingTarget, ServiceSession};
use crate::censorship::{CensorshipClassifier, PhoneNumber};
use crate::config::RoutingConfig;
use crate::policy::CircumventionPolicy;

/// Builds the routing target and HTTP client for the current state.
///
/// The selector holds no mutable state: the same inputs always produce
/// the same [`RoutingTarget`].
#[derive(Debug)]
pub struct SessionSelector {
    service_url: Url,
    reflector_host: String,
    fronted_path_prefix: String,
    default_fronting_domain: Option<String>,
    request_timeout: Duration,
    user_agent: String,
}

impl SessionSelector {
    /// Creates a selector from a validated configuration.
    ///
    /// # Errors
    ///
    /// Returns [`SessionError::InvalidUrl`] if the service URL cannot be
    /// parsed.
    pub fn new(config: &RoutingConfig) -> SessionResult<Self> {
        let service_url = with_trailing_slash(
            Url::parse(&config.service_url)
                .map_err(|e| SessionError::InvalidUrl(format!("{}: {e}", config.service_url)))?,
        );

        Ok(Self {
            service_url,
            reflector_host: config.reflector_host.clone(),
            fronted_path_prefix: config.fronted_path_prefix.trim_matches('/').to_string(),
            default_fronting_domain: config.default_fronting_domain.clone(),
            request_timeout: config.request_timeout(),
            user_agent: config.user_agent.clone(),
        })
    }

    /// Chooses the routing target.
    ///
    /// When circumvention is inactive the target is always direct. When
    /// active, the fronting domain is the first of:
    ///
    /// 1. the manual domain (manual activation only),
    /// 2. the configured domain of the manual country's region (manual
    ///    activation only),
    /// 3. the configured domain of the phone number's region,
    /// 4. the configured default fronting domain.
    ///
    /// # Errors
    ///
    /// Returns [`SessionError::NoFrontingDomain`] if circumvention is active
    /// and none of the above is set.
    pub fn resolve_target(
        &self,
        active: bool,
        policy: &CircumventionPolicy,
        classifier: &CensorshipClassifier,
        phone_number: Option<&PhoneNumber>,
    ) -> SessionResult<RoutingTarget> {
        if !active {
            return Ok(RoutingTarget::Direct {
                base_url: self.service_url.clone(),
            });
        }

        let manual = policy
            .manually_activated
            .then(|| {
                policy.manual_domain.clone().or_else(|| {
                    policy
                        .manual_country_code
                        .as_deref()
                        .and_then(|code| classifier.region_for_country(code))
                        .and_then(|region| region.fronting_domain.clone())
                })
            })
            .flatten();

        let front_domain = manual
            .or_else(|| {
                phone_number
                    .and_then(|number| classifier.classify(number))
                    .and_then(|region| region.fronting_domain.clone())
            })
            .or_else(|| self.default_fronting_domain.clone())
            .ok_or(SessionError::NoFrontingDomain)?;

        let base_url = self.fronted_base_url(&front_domain)?;
        Ok(RoutingTarget::Fronted {
            front_domain,
            base_url,
            host_header: self.reflector_host.clone(),
        })
    }

    /// Builds a new session for the target.
    ///
    /// # Errors
    ///
    /// Returns [`SessionError::Build`] if the HTTP client cannot be built.
    pub fn build(&self, target: RoutingTarget, generation: u64) -> SessionResult<ServiceSession> {
        let client = Client::builder()
            .user_agent(&self.user_agent)
            .timeout(self.request_timeout)
            .https_only(true)
            .build()
            .map_err(|e| SessionError::Build(e.to_string()))?;

        if target.is_fronted() {
            info!(
                generation,
                front_domain = target.front_domain().unwrap_or_default(),
                "Built fronted service session"
            );
        } else {
            debug!(generation, "Built direct service session");
        }

        Ok(ServiceSession::new(client, target, generation))
    }

    fn fronted_base_url(&self, front_domain: &str) -> SessionResult<Url> {
        let raw = if self.fronted_path_prefix.is_empty() {
            format!("https://{front_domain}/")
        } else {
            format!("https://{front_domain}/{}/", self.fronted_path_prefix)
        };
        Url::parse(&raw).map_err(|e| SessionError::InvalidUrl(format!("{raw}: {e}")))
    }
}

fn with_trailing_slash(mut url: Url) -> Url {
    if !url.path().ends_with('/') {
        let path = format!("{}/", url.path());
        url.set_path(&path);
    }
    url
}
