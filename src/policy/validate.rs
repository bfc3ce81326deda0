//! Input validation for manual circumvention settings.
//!
//! Domains and country codes are normalized before they are stored, so
//! that `"Example.COM "` and `"example.com"` are the same policy value.

use url::Host;

use super::error::{PolicyError, Result};

/// Maximum length of a DNS name in presentation format.
const MAX_DOMAIN_LEN: usize = 253;

/// Maximum length of a single DNS label.
const MAX_LABEL_LEN: usize = 63;

/// Validates and normalizes a fronting domain.
///
/// Accepts a bare host name such as `cdn.example.com`. Schemes, ports,
/// paths, user info, whitespace and IP literals are rejected. Returns the
/// lowercase ASCII form (IDNA-encoded when needed).
///
/// # Errors
///
/// Returns [`PolicyError::InvalidDomain`] if the input is not a host name.
///
/// # Examples
///
/// ```
/// use fronting_core::policy::normalize_domain;
///
/// assert_eq!(normalize_domain(" CDN.Example.com ").unwrap(), "cdn.example.com");
/// assert!(normalize_domain("").is_err());
/// assert!(normalize_domain("https://example.com").is_err());
/// ```
pub fn normalize_domain(input: &str) -> Result<String> {
    let trimmed = input.trim();
    if trimmed.is_empty() {
        return Err(PolicyError::InvalidDomain("domain is empty".to_string()));
    }

    if let Some(c) = trimmed
        .chars()
        .find(|c| c.is_whitespace() || matches!(c, '/' | ':' | '@' | '?' | '#' | '[' | ']'))
    {
        return Err(PolicyError::InvalidDomain(format!(
            "{trimmed}: unexpected character {c:?}"
        )));
    }

    let host = Host::parse(trimmed)
        .map_err(|e| PolicyError::InvalidDomain(format!("{trimmed}: {e}")))?;

    let domain = match host {
        Host::Domain(domain) => domain.to_ascii_lowercase(),
        Host::Ipv4(_) | Host::Ipv6(_) => {
            return Err(PolicyError::InvalidDomain(format!(
                "{trimmed}: IP addresses cannot be used for fronting"
            )))
        }
    };

    let domain = domain.strip_suffix('.').unwrap_or(&domain).to_string();

    if domain.len() > MAX_DOMAIN_LEN {
        return Err(PolicyError::InvalidDomain(format!(
            "{domain}: longer than {MAX_DOMAIN_LEN} characters"
        )));
    }

    let labels: Vec<&str> = domain.split('.').collect();
    if labels.len() < 2 {
        return Err(PolicyError::InvalidDomain(format!(
            "{domain}: expected at least two labels"
        )));
    }

    for label in labels {
        if label.is_empty() || label.len() > MAX_LABEL_LEN {
            return Err(PolicyError::InvalidDomain(format!(
                "{domain}: label length must be 1 to {MAX_LABEL_LEN}"
            )));
        }
        if label.starts_with('-') || label.ends_with('-') {
            return Err(PolicyError::InvalidDomain(format!(
                "{domain}: label {label:?} starts or ends with '-'"
            )));
        }
        if !label
            .bytes()
            .all(|b| b.is_ascii_lowercase() || b.is_ascii_digit() || b == b'-')
        {
            return Err(PolicyError::InvalidDomain(format!(
                "{domain}: label {label:?} has invalid characters"
            )));
        }
    }

    Ok(domain)
}

/// Validates and normalizes an ISO 3166-1 alpha-2 country code.
///
/// # Errors
///
/// Returns [`PolicyError::InvalidCountryCode`] unless the trimmed input is
/// exactly two ASCII letters.
///
/// # Examples
///
/// ```
/// use fronting_core::policy::normalize_country_code;
///
/// assert_eq!(normalize_country_code("eg").unwrap(), "EG");
/// assert!(normalize_country_code("EGY").is_err());
/// ```
pub fn normalize_country_code(input: &str) -> Result<String> {
    let trimmed = input.trim();
    if trimmed.len() != 2 || !trimmed.bytes().all(|b| b.is_ascii_alphabetic()) {
        return Err(PolicyError::InvalidCountryCode(format!(
            "{trimmed:?}: expected two ASCII letters"
        )));
    }
    Ok(trimmed.to_ascii_uppercase())
}
