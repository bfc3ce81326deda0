//! Types for service sessions.

use reqwest::header::{HeaderValue, HOST};
use reqwest::{Client, Method, RequestBuilder};
use url::Url;

use super::error::{SessionError, SessionResult};

/// Where a session sends its requests.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RoutingTarget {
    /// Straight to the service endpoint.
    Direct {
        /// Service base URL, always ending in `/`.
        base_url: Url,
    },

    /// Through a fronting domain.
    ///
    /// The TLS connection is made to `front_domain`; the `Host` header
    /// names the reflector that forwards to the service.
    Fronted {
        /// Domain presented at the transport layer.
        front_domain: String,
        /// `https://<front_domain>/<prefix>/`.
        base_url: Url,
        /// Host header sent with every request.
        host_header: String,
    },
}

impl RoutingTarget {
    /// Returns the base URL requests are resolved against.
    #[must_use]
    pub const fn base_url(&self) -> &Url {
        match self {
            Self::Direct { base_url } | Self::Fronted { base_url, .. } => base_url,
        }
    }

    /// Returns true for a domain-fronted target.
    #[must_use]
    pub const fn is_fronted(&self) -> bool {
        matches!(self, Self::Fronted { .. })
    }

    /// Returns the fronting domain, if fronted.
    #[must_use]
    pub fn front_domain(&self) -> Option<&str> {
        match self {
            Self::Direct { .. } => None,
            Self::Fronted { front_domain, .. } => Some(front_domain),
        }
    }

    /// Resolves a request path against the base URL.
    ///
    /// Leading slashes are ignored so `"/v1/keys"` and `"v1/keys"` are the
    /// same request. Paths that would leave the base URL are rejected.
    ///
    /// # Errors
    ///
    /// Returns [`SessionError::InvalidUrl`] if the path cannot be joined or
    /// resolves outside the base URL.
    pub fn url_for(&self, path: &str) -> SessionResult<Url> {
        let base = self.base_url();
        let url = base
            .join(path.trim_start_matches('/'))
            .map_err(|e| SessionError::InvalidUrl(format!("{path}: {e}")))?;

        if url.scheme() != base.scheme()
            || url.host_str() != base.host_str()
            || url.port() != base.port()
            || !url.path().starts_with(base.path())
        {
            return Err(SessionError::InvalidUrl(format!(
                "{path}: resolves outside {base}"
            )));
        }

        Ok(url)
    }
}

/// The network session callers issue requests through.
///
/// A session is immutable. When the routing target changes, a new session
/// with a higher `generation` replaces it; callers holding the old one
/// keep a consistent (if outdated) target until they fetch the new one.
#[derive(Debug, Clone)]
pub struct ServiceSession {
    client: Client,
    target: RoutingTarget,
    generation: u64,
}

impl ServiceSession {
    pub(crate) const fn new(client: Client, target: RoutingTarget, generation: u64) -> Self {
        Self {
            client,
            target,
            generation,
        }
    }

    /// Returns the routing target.
    #[must_use]
    pub const fn target(&self) -> &RoutingTarget {
        &self.target
    }

    /// Returns true if requests are domain-fronted.
    #[must_use]
    pub const fn is_fronted(&self) -> bool {
        self.target.is_fronted()
    }

    /// Returns the session generation. Each rebuild increments it.
    #[must_use]
    pub const fn generation(&self) -> u64 {
        self.generation
    }

    /// Returns the underlying HTTP client.
    #[must_use]
    pub const fn client(&self) -> &Client {
        &self.client
    }

    /// Starts a request to `path` on the service.
    ///
    /// Fronted sessions add the reflector `Host` header.
    ///
    /// # Errors
    ///
    /// Returns an error if the path is invalid or the host header cannot be
    /// encoded.
    pub fn request(&self, method: Method, path: &str) -> SessionResult<RequestBuilder> {
        let url = self.target.url_for(path)?;
        let builder = self.client.request(method, url);

        match &self.target {
            RoutingTarget::Direct { .. } => Ok(builder),
            RoutingTarget::Fronted { host_header, .. } => {
                let value = HeaderValue::from_str(host_header)
                    .map_err(|e| SessionError::InvalidUrl(format!("{host_header}: {e}")))?;
                Ok(builder.header(HOST, value))
            }
        }
    }

    /// Shorthand for a `GET` request.
    ///
    /// # Errors
    ///
    /// See [`request`](Self::request).
    pub fn get(&self, path: &str) -> SessionResult<RequestBuilder> {
        self.request(Method::GET, path)
    }

    /// Shorthand for a `PUT` request.
    ///
    /// # Errors
    ///
    /// See [`request`](Self::request).
    pub fn put(&self, path: &str) -> SessionResult<RequestBuilder> {
        self.request(Method::PUT, path)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn direct() -> RoutingTarget {
        RoutingTarget::Direct {
            base_url: Url::parse("https://service.example.org/").unwrap(),
        }
    }

    fn fronted() -> RoutingTarget {
        RoutingTarget::Fronted {
            front_domain: "front.example.com".to_string(),
            base_url: Url::parse("https://front.example.com/service/").unwrap(),
            host_header: "reflector.example.net".to_string(),
        }
    }

    #[test]
    fn url_for_joins_paths() {
        let url = fronted().url_for("/v1/keys/").unwrap();
        assert_eq!(url.as_str(), "https://front.example.com/service/v1/keys/");

        let url = direct().url_for("v1/messages").unwrap();
        assert_eq!(url.as_str(), "https://service.example.org/v1/messages");
    }

    #[test]
    fn url_for_rejects_escaping_paths() {
        assert!(matches!(
            fronted().url_for("https://evil.example/"),
            Err(SessionError::InvalidUrl(_))
        ));
        assert!(matches!(
            fronted().url_for("../admin"),
            Err(SessionError::InvalidUrl(_))
        ));
        assert!(direct().url_for("//evil.example/x").is_ok());
    }

    #[test]
    fn front_domain_only_when_fronted() {
        assert_eq!(direct().front_domain(), None);
        assert_eq!(fronted().front_domain(), Some("front.example.com"));
        assert!(fronted().is_fronted());
        assert!(!direct().is_fronted());
    }

    #[test]
    fn fronted_request_sets_host_header() {
        let session = ServiceSession::new(Client::new(), fronted(), 3);
        let request = session.get("v1/keys").unwrap().build().unwrap();

        assert_eq!(
            request.url().as_str(),
            "https://front.example.com/service/v1/keys"
        );
        assert_eq!(
            request.headers().get(HOST).unwrap(),
            "reflector.example.net"
        );
        assert_eq!(session.generation(), 3);
    }

    #[test]
    fn direct_request_has_no_host_override() {
        let session = ServiceSession::new(Client::new(), direct(), 1);
        let request = session.put("v1/messages").unwrap().build().unwrap();

        assert_eq!(request.method(), Method::PUT);
        assert!(request.headers().get(HOST).is_none());
    }
}
