//! Circumvention policy store.
//!
//! Wraps [`PolicyStorage`] with validation, an in-memory copy of the
//! current policy and change notifications.

use std::path::Path;

use tokio::sync::broadcast;
use tracing::{debug, warn};

use super::error::Result;
use super::storage::PolicyStorage;
use super::types::{CircumventionPolicy, PolicyChange};
use super::validate::{normalize_country_code, normalize_domain};

/// Capacity of the change notification channel.
const CHANGE_CHANNEL_CAPACITY: usize = 16;

/// Persisted manual circumvention settings.
///
/// Every setter validates its input, writes through to storage and only
/// then updates the in-memory policy and notifies subscribers. A rejected
/// or failed update leaves the policy exactly as it was. Setting a value
/// equal to the current one is a no-op and raises no notification.
///
/// # Example
///
/// ```
/// use fronting_core::policy::{PolicyChange, PolicyStore};
///
/// let dir = tempfile::tempdir().unwrap();
/// let mut store = PolicyStore::open(&dir.path().join("routing.db")).unwrap();
/// let mut changes = store.subscribe();
///
/// assert!(store.set_manually_activated(true).unwrap());
/// assert_eq!(changes.try_recv().unwrap(), PolicyChange::ManualActivation(true));
///
/// assert!(store.set_manual_domain("").is_err());
/// assert!(store.policy().manual_domain.is_none());
/// ```
pub struct PolicyStore {
    storage: PolicyStorage,
    policy: CircumventionPolicy,
    changes: broadcast::Sender<PolicyChange>,
}

impl PolicyStore {
    /// Opens the store backed by the database at `path` and loads the
    /// persisted policy.
    ///
    /// # Errors
    ///
    /// Returns an error if the database cannot be opened or holds invalid
    /// data.
    pub fn open(path: &Path) -> Result<Self> {
        Self::from_storage(PolicyStorage::new(path)?)
    }

    /// Creates a store over in-memory storage for testing.
    ///
    /// # Errors
    ///
    /// Returns an error if the database cannot be initialized.
    #[cfg(any(test, feature = "test-utils"))]
    pub fn in_memory() -> Result<Self> {
        Self::from_storage(PolicyStorage::in_memory()?)
    }

    /// Creates a store over existing storage, loading its policy.
    ///
    /// # Errors
    ///
    /// Returns an error if the stored policy cannot be loaded.
    pub fn from_storage(storage: PolicyStorage) -> Result<Self> {
        let policy = storage.load()?;
        debug!(
            manually_activated = policy.manually_activated,
            has_domain = policy.manual_domain.is_some(),
            has_country_code = policy.manual_country_code.is_some(),
            "Loaded circumvention policy"
        );
        let (changes, _) = broadcast::channel(CHANGE_CHANNEL_CAPACITY);
        Ok(Self {
            storage,
            policy,
            changes,
        })
    }

    /// Returns the current policy.
    #[must_use]
    pub const fn policy(&self) -> &CircumventionPolicy {
        &self.policy
    }

    /// Subscribes to committed policy changes.
    #[must_use]
    pub fn subscribe(&self) -> broadcast::Receiver<PolicyChange> {
        self.changes.subscribe()
    }

    /// Sets whether circumvention is manually activated.
    ///
    /// Returns `true` if the policy changed.
    ///
    /// # Errors
    ///
    /// Returns an error if the value cannot be persisted.
    pub fn set_manually_activated(&mut self, value: bool) -> Result<bool> {
        self.commit(PolicyChange::ManualActivation(value))
    }

    /// Sets the manual fronting domain.
    ///
    /// Returns `true` if the policy changed.
    ///
    /// # Errors
    ///
    /// Returns [`PolicyError::InvalidDomain`](super::PolicyError::InvalidDomain)
    /// for an empty or malformed domain, or a storage error.
    pub fn set_manual_domain(&mut self, domain: &str) -> Result<bool> {
        let change = Self::domain_change(domain)?;
        self.commit(change)
    }

    /// Clears the manual fronting domain.
    ///
    /// # Errors
    ///
    /// Returns an error if the change cannot be persisted.
    pub fn clear_manual_domain(&mut self) -> Result<bool> {
        self.commit(PolicyChange::ManualDomain(None))
    }

    /// Sets the manual country code.
    ///
    /// Returns `true` if the policy changed.
    ///
    /// # Errors
    ///
    /// Returns [`PolicyError::InvalidCountryCode`](super::PolicyError::InvalidCountryCode)
    /// for a malformed code, or a storage error.
    pub fn set_manual_country_code(&mut self, country_code: &str) -> Result<bool> {
        let change = Self::country_code_change(country_code)?;
        self.commit(change)
    }

    /// Clears the manual country code.
    ///
    /// # Errors
    ///
    /// Returns an error if the change cannot be persisted.
    pub fn clear_manual_country_code(&mut self) -> Result<bool> {
        self.commit(PolicyChange::ManualCountryCode(None))
    }

    /// Validates a domain and turns it into a change without applying it.
    ///
    /// # Errors
    ///
    /// Returns an error if the domain is empty or malformed.
    pub fn domain_change(domain: &str) -> Result<PolicyChange> {
        normalize_domain(domain)
            .map(|domain| PolicyChange::ManualDomain(Some(domain)))
            .inspect_err(|e| warn!(error = %e, "Rejected manual circumvention domain"))
    }

    /// Validates a country code and turns it into a change without
    /// applying it.
    ///
    /// # Errors
    ///
    /// Returns an error if the country code is malformed.
    pub fn country_code_change(country_code: &str) -> Result<PolicyChange> {
        normalize_country_code(country_code)
            .map(|code| PolicyChange::ManualCountryCode(Some(code)))
            .inspect_err(|e| warn!(error = %e, "Rejected manual circumvention country code"))
    }

    /// Validates and persists a change, then publishes it.
    ///
    /// Domains and country codes carried by the change are normalized
    /// again here, so a hand-built [`PolicyChange`] cannot bypass the
    /// setters' validation. Returns `false` without touching storage if the
    /// change would not alter the policy.
    ///
    /// # Errors
    ///
    /// Returns a validation error for a malformed value, or a storage
    /// error if the change cannot be persisted. The in-memory policy is
    /// left unchanged in both cases.
    pub fn commit(&mut self, change: PolicyChange) -> Result<bool> {
        let change = Self::normalized(change)?;
        let next = self.policy.with_change(&change);
        if next == self.policy {
            debug!(key = change.key().as_str(), "Policy unchanged, skipping write");
            return Ok(false);
        }

        self.storage.apply(&change)?;
        self.policy = next;
        debug!(key = change.key().as_str(), "Policy updated");

        // No receivers is fine; nobody is listening yet.
        let _ = self.changes.send(change);
        Ok(true)
    }

    fn normalized(change: PolicyChange) -> Result<PolicyChange> {
        match change {
            PolicyChange::ManualDomain(Some(domain)) => Self::domain_change(&domain),
            PolicyChange::ManualCountryCode(Some(code)) => Self::country_code_change(&code),
            other => Ok(other),
        }
    }
}
