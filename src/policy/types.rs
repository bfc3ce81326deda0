//! Types for the circumvention policy.

use serde::{Deserialize, Serialize};

/// Manual censorship-circumvention settings.
///
/// Unset values are `None`, never empty strings. Values held here have
/// already been normalized by [`normalize_domain`] and
/// [`normalize_country_code`].
///
/// [`normalize_domain`]: super::normalize_domain
/// [`normalize_country_code`]: super::normalize_country_code
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct CircumventionPolicy {
    /// Circumvention forced on regardless of the phone number.
    pub manually_activated: bool,

    /// Fronting domain chosen by the user.
    pub manual_domain: Option<String>,

    /// Country whose fronting setup the user picked.
    pub manual_country_code: Option<String>,
}

impl CircumventionPolicy {
    /// Returns a copy with the given change applied.
    #[must_use]
    pub fn with_change(&self, change: &PolicyChange) -> Self {
        let mut next = self.clone();
        match change {
            PolicyChange::ManualActivation(value) => next.manually_activated = *value,
            PolicyChange::ManualDomain(value) => next.manual_domain.clone_from(value),
            PolicyChange::ManualCountryCode(value) => next.manual_country_code.clone_from(value),
        }
        next
    }
}

/// A single committed change to the policy.
///
/// Published to subscribers of the policy store after the change has been
/// written to storage.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PolicyChange {
    /// Manual activation was switched.
    ManualActivation(bool),
    /// Manual domain was set or cleared.
    ManualDomain(Option<String>),
    /// Manual country code was set or cleared.
    ManualCountryCode(Option<String>),
}

impl PolicyChange {
    /// Returns the storage key this change writes to.
    #[must_use]
    pub const fn key(&self) -> PolicyKey {
        match self {
            Self::ManualActivation(_) => PolicyKey::ManuallyActivated,
            Self::ManualDomain(_) => PolicyKey::ManualDomain,
            Self::ManualCountryCode(_) => PolicyKey::ManualCountryCode,
        }
    }

    /// Returns the value to store, or `None` to delete the row.
    #[must_use]
    pub fn stored_value(&self) -> Option<String> {
        match self {
            Self::ManualActivation(value) => Some(value.to_string()),
            Self::ManualDomain(value) | Self::ManualCountryCode(value) => value.clone(),
        }
    }
}

/// Keys of the persisted policy rows.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum PolicyKey {
    /// `manually_activated`
    ManuallyActivated,
    /// `manual_domain`
    ManualDomain,
    /// `manual_country_code`
    ManualCountryCode,
}

impl PolicyKey {
    /// All keys, in load order.
    pub const ALL: [Self; 3] = [
        Self::ManuallyActivated,
        Self::ManualDomain,
        Self::ManualCountryCode,
    ];

    /// Returns the string stored in the `key` column.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::ManuallyActivated => "manually_activated",
            Self::ManualDomain => "manual_domain",
            Self::ManualCountryCode => "manual_country_code",
        }
    }

    /// Parses a `key` column value.
    #[must_use]
    pub fn parse(s: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|key| key.as_str() == s)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_policy_is_inactive_and_unset() {
        let policy = CircumventionPolicy::default();
        assert!(!policy.manually_activated);
        assert!(policy.manual_domain.is_none());
        assert!(policy.manual_country_code.is_none());
    }

    #[test]
    fn with_change_applies_only_that_field() {
        let policy = CircumventionPolicy {
            manually_activated: false,
            manual_domain: Some("front.example.com".to_string()),
            manual_country_code: Some("EG".to_string()),
        };

        let next = policy.with_change(&PolicyChange::ManualActivation(true));
        assert!(next.manually_activated);
        assert_eq!(next.manual_domain, policy.manual_domain);

        let next = policy.with_change(&PolicyChange::ManualDomain(None));
        assert!(next.manual_domain.is_none());
        assert_eq!(next.manual_country_code.as_deref(), Some("EG"));
    }

    #[test]
    fn stored_value_encodes_bool_as_text() {
        assert_eq!(
            PolicyChange::ManualActivation(true).stored_value().as_deref(),
            Some("true")
        );
        assert_eq!(PolicyChange::ManualDomain(None).stored_value(), None);
    }

    #[test]
    fn policy_key_roundtrip() {
        for key in PolicyKey::ALL {
            assert_eq!(PolicyKey::parse(key.as_str()), Some(key));
        }
        assert_eq!(PolicyKey::parse("unknown"), None);
    }

    #[test]
    fn change_key_matches_variant() {
        assert_eq!(
            PolicyChange::ManualCountryCode(None).key(),
            PolicyKey::ManualCountryCode
        );
    }
}
