//! Routing service.
//!
//! This module provides the [`RoutingService`], which ties the policy
//! store, the censorship classifier and the session selector together
//! behind a single lock.
//!
//! # Update Path
//!
//! Every write follows the same steps while holding the write lock:
//!
//! 1. Validate the input and compute the candidate policy / phone number /
//!    table.
//! 2. Derive the active flag and routing target from the candidate.
//! 3. Build a replacement session if the target changed.
//! 4. Persist (policy changes only).
//! 5. Commit the candidate, the active flag and the session together.
//! 6. Publish events.
//!
//! Any failure in steps 1-4 returns before anything is committed.

use std::path::Path;
use std::sync::{Arc, PoisonError, RwLock, RwLockReadGuard, RwLockWriteGuard};

use tokio::sync::broadcast;
use tracing::{debug, info, warn};

use super::error::{ServiceError, ServiceResult};
use super::types::{RoutingEvent, RoutingSnapshot};
use crate::censorship::{CensorshipClassifier, CensorshipTable, PhoneNumber};
use crate::config::RoutingConfig;
use crate::policy::{CircumventionPolicy, PolicyChange, PolicyStore, Result as PolicyResult};
use crate::session::{ServiceSession, SessionSelector};

/// Capacity of the event channel.
const EVENT_CHANNEL_CAPACITY: usize = 64;

/// File name of the policy database inside the data directory.
const POLICY_DB_FILE: &str = "routing.db";

/// Everything guarded by the service lock.
struct RoutingState {
    store: PolicyStore,
    classifier: CensorshipClassifier,
    selector: SessionSelector,
    phone_number: Option<PhoneNumber>,
    active: bool,
    session: Arc<ServiceSession>,
    shut_down: bool,
}

/// Derived state computed for a candidate update, not yet committed.
struct Transition {
    active: bool,
    session: Option<ServiceSession>,
}

/// Censorship-circumvention-aware routing for service requests.
///
/// Construct one per process with [`open`](Self::open) and share it via
/// `Arc`. Callers send requests through [`session`](Self::session) without
/// knowing which routing mode is active.
///
/// # Consistency
///
/// The active flag is always `manually_activated || (automatic &&
/// censored)`, and the live session is fronted exactly when the flag is
/// set. Readers never observe one without the other.
///
/// # Example
///
/// ```
/// use fronting_core::{RoutingConfig, RoutingService};
///
/// let dir = tempfile::tempdir().unwrap();
/// let config = RoutingConfig::new("https://service.example.org", "reflector.example.net")
///     .with_default_fronting_domain("front.example.com");
/// let service = RoutingService::open(config, dir.path(), Some("+15550109999")).unwrap();
///
/// assert!(!service.is_censorship_circumvention_active());
///
/// service.set_censorship_circumvention_manually_activated(true).unwrap();
/// assert!(service.is_censorship_circumvention_active());
/// assert!(service.session().is_fronted());
///
/// service.shutdown();
/// ```
pub struct RoutingService {
    state: RwLock<RoutingState>,
    automatic: bool,
    events: broadcast::Sender<RoutingEvent>,
}

impl RoutingService {
    /// Opens the service with policy stored under `data_dir`.
    ///
    /// Creates the directory if needed, loads the persisted policy and
    /// builds the initial session.
    ///
    /// # Arguments
    ///
    /// * `config` - Routing configuration (validated here)
    /// * `data_dir` - Directory for the policy database
    /// * `phone_number` - The account's phone number, if registered
    ///
    /// # Errors
    ///
    /// Returns an error if the configuration or phone number is invalid,
    /// storage cannot be opened, or the initial state needs a fronting
    /// domain that is not configured.
    pub fn open(
        config: RoutingConfig,
        data_dir: &Path,
        phone_number: Option<&str>,
    ) -> ServiceResult<Self> {
        std::fs::create_dir_all(data_dir)
            .map_err(|e| ServiceError::Storage(format!("Failed to create data directory: {e}")))?;

        let store = PolicyStore::open(&data_dir.join(POLICY_DB_FILE))?;
        Self::with_store(config, store, phone_number)
    }

    /// Opens the service over in-memory policy storage.
    ///
    /// # Errors
    ///
    /// See [`open`](Self::open).
    #[cfg(any(test, feature = "test-utils"))]
    pub fn in_memory(config: RoutingConfig, phone_number: Option<&str>) -> ServiceResult<Self> {
        Self::with_store(config, PolicyStore::in_memory()?, phone_number)
    }

    /// Opens the service over an existing policy store.
    ///
    /// # Errors
    ///
    /// See [`open`](Self::open).
    pub fn with_store(
        config: RoutingConfig,
        store: PolicyStore,
        phone_number: Option<&str>,
    ) -> ServiceResult<Self> {
        let config = config.validated()?;
        let classifier = CensorshipClassifier::new(config.censorship_table()?);
        let selector = SessionSelector::new(&config)?;
        let phone_number = phone_number.map(PhoneNumber::parse).transpose()?;
        let automatic = config.automatic_circumvention;

        let active = compute_active(
            automatic,
            store.policy(),
            &classifier,
            phone_number.as_ref(),
        );
        let target =
            selector.resolve_target(active, store.policy(), &classifier, phone_number.as_ref())?;
        let session = Arc::new(selector.build(target, 1)?);

        info!(
            active,
            automatic,
            phone = ?phone_number,
            "Routing service started"
        );

        let (events, _) = broadcast::channel(EVENT_CHANNEL_CAPACITY);
        Ok(Self {
            state: RwLock::new(RoutingState {
                store,
                classifier,
                selector,
                phone_number,
                active,
                session,
                shut_down: false,
            }),
            automatic,
            events,
        })
    }

    // ==================== Reads ====================

    /// Returns the live session.
    #[must_use]
    pub fn session(&self) -> Arc<ServiceSession> {
        Arc::clone(&self.read().session)
    }

    /// Returns whether censorship circumvention is active.
    #[must_use]
    pub fn is_censorship_circumvention_active(&self) -> bool {
        self.read().active
    }

    /// Returns whether the account's phone number is in a censored region.
    ///
    /// Computed against the current table on every call.
    #[must_use]
    pub fn has_censored_phone_number(&self) -> bool {
        let state = self.read();
        state
            .classifier
            .is_censored_account(state.phone_number.as_ref())
    }

    /// Returns whether circumvention is manually activated.
    #[must_use]
    pub fn is_censorship_circumvention_manually_activated(&self) -> bool {
        self.read().store.policy().manually_activated
    }

    /// Returns the manual fronting domain.
    #[must_use]
    pub fn manual_censorship_circumvention_domain(&self) -> Option<String> {
        self.read().store.policy().manual_domain.clone()
    }

    /// Returns the manual country code.
    #[must_use]
    pub fn manual_censorship_circumvention_country_code(&self) -> Option<String> {
        self.read().store.policy().manual_country_code.clone()
    }

    /// Returns the account's phone number.
    #[must_use]
    pub fn phone_number(&self) -> Option<PhoneNumber> {
        self.read().phone_number.clone()
    }

    /// Returns whether censored numbers turn circumvention on automatically.
    #[must_use]
    pub const fn is_automatic_circumvention_enabled(&self) -> bool {
        self.automatic
    }

    /// Returns a consistent view of the whole routing state.
    #[must_use]
    pub fn snapshot(&self) -> RoutingSnapshot {
        let state = self.read();
        RoutingSnapshot {
            policy: state.store.policy().clone(),
            phone_number: state.phone_number.clone(),
            has_censored_phone_number: state
                .classifier
                .is_censored_account(state.phone_number.as_ref()),
            is_active: state.active,
            session: Arc::clone(&state.session),
        }
    }

    /// Returns whether [`shutdown`](Self::shutdown) has been called.
    #[must_use]
    pub fn is_shut_down(&self) -> bool {
        self.read().shut_down
    }

    /// Subscribes to routing events.
    #[must_use]
    pub fn subscribe(&self) -> broadcast::Receiver<RoutingEvent> {
        self.events.subscribe()
    }

    // ==================== Writes ====================

    /// Sets whether circumvention is manually activated.
    ///
    /// Returns `true` if anything changed.
    ///
    /// # Errors
    ///
    /// Returns an error if activation needs a fronting domain that is not
    /// configured, persistence fails, or the service is shut down.
    pub fn set_censorship_circumvention_manually_activated(
        &self,
        value: bool,
    ) -> ServiceResult<bool> {
        self.update_policy(|| Ok(PolicyChange::ManualActivation(value)))
    }

    /// Sets the manual fronting domain.
    ///
    /// # Errors
    ///
    /// Returns an error for an empty or malformed domain, a persistence
    /// failure, or after shutdown. The previous domain is kept.
    pub fn set_manual_censorship_circumvention_domain(&self, domain: &str) -> ServiceResult<bool> {
        self.update_policy(|| PolicyStore::domain_change(domain))
    }

    /// Clears the manual fronting domain.
    ///
    /// # Errors
    ///
    /// Returns an error if the resulting state has no fronting domain,
    /// persistence fails, or the service is shut down.
    pub fn clear_manual_censorship_circumvention_domain(&self) -> ServiceResult<bool> {
        self.update_policy(|| Ok(PolicyChange::ManualDomain(None)))
    }

    /// Sets the manual country code.
    ///
    /// # Errors
    ///
    /// Returns an error for a malformed code, a persistence failure, or
    /// after shutdown. The previous code is kept.
    pub fn set_manual_censorship_circumvention_country_code(
        &self,
        country_code: &str,
    ) -> ServiceResult<bool> {
        self.update_policy(|| PolicyStore::country_code_change(country_code))
    }

    /// Clears the manual country code.
    ///
    /// # Errors
    ///
    /// Returns an error if the resulting state has no fronting domain,
    /// persistence fails, or the service is shut down.
    pub fn clear_manual_censorship_circumvention_country_code(&self) -> ServiceResult<bool> {
        self.update_policy(|| Ok(PolicyChange::ManualCountryCode(None)))
    }

    /// Sets (or clears) the account's phone number.
    ///
    /// # Errors
    ///
    /// Returns an error if the number is malformed, the resulting state has
    /// no fronting domain, or the service is shut down.
    pub fn set_phone_number(&self, phone_number: Option<&str>) -> ServiceResult<bool> {
        let mut state = self.write()?;
        let phone_number = phone_number.map(PhoneNumber::parse).transpose()?;
        if state.phone_number == phone_number {
            return Ok(false);
        }

        let transition = self.plan(
            &state,
            state.store.policy(),
            &state.classifier,
            phone_number.as_ref(),
        )?;

        debug!(
            phone = ?phone_number,
            "Account phone number updated"
        );
        state.phone_number = phone_number;
        self.apply(&mut state, transition);
        Ok(true)
    }

    /// Replaces the censored-region table.
    ///
    /// # Errors
    ///
    /// Returns an error if the resulting state has no fronting domain or
    /// the service is shut down.
    pub fn replace_censorship_table(&self, table: CensorshipTable) -> ServiceResult<bool> {
        let mut state = self.write()?;
        if state.classifier.table() == &table {
            return Ok(false);
        }

        let classifier = CensorshipClassifier::new(table);
        let transition = self.plan(
            &state,
            state.store.policy(),
            &classifier,
            state.phone_number.as_ref(),
        )?;

        debug!(regions = classifier.table().len(), "Censorship table replaced");
        state.classifier = classifier;
        self.apply(&mut state, transition);
        Ok(true)
    }

    /// Shuts the service down.
    ///
    /// Later writes fail with [`ServiceError::ShutDown`]; reads keep
    /// returning the last state. Calling this twice is a no-op.
    pub fn shutdown(&self) {
        let mut state = self.state.write().unwrap_or_else(PoisonError::into_inner);
        if state.shut_down {
            return;
        }
        state.shut_down = true;
        info!("Routing service shut down");
        self.publish(RoutingEvent::ShutDown);
    }

    // ==================== Internals ====================

    // State is only written after every fallible step, so a poisoned lock
    // still guards a consistent value.
    fn read(&self) -> RwLockReadGuard<'_, RoutingState> {
        self.state.read().unwrap_or_else(PoisonError::into_inner)
    }

    fn write(&self) -> ServiceResult<RwLockWriteGuard<'_, RoutingState>> {
        let state = self.state.write().unwrap_or_else(PoisonError::into_inner);
        if state.shut_down {
            return Err(ServiceError::ShutDown);
        }
        Ok(state)
    }

    fn update_policy(
        &self,
        change: impl FnOnce() -> PolicyResult<PolicyChange>,
    ) -> ServiceResult<bool> {
        let mut state = self.write()?;
        let change = change()?;

        let policy = state.store.policy().with_change(&change);
        if &policy == state.store.policy() {
            return Ok(false);
        }

        let transition = self.plan(
            &state,
            &policy,
            &state.classifier,
            state.phone_number.as_ref(),
        )?;

        state.store.commit(change)?;
        self.apply(&mut state, transition);
        Ok(true)
    }

    fn plan(
        &self,
        state: &RoutingState,
        policy: &CircumventionPolicy,
        classifier: &CensorshipClassifier,
        phone_number: Option<&PhoneNumber>,
    ) -> ServiceResult<Transition> {
        let active = compute_active(self.automatic, policy, classifier, phone_number);
        let target = state
            .selector
            .resolve_target(active, policy, classifier, phone_number)
            .inspect_err(|e| warn!(error = %e, active, "Rejected routing update"))?;

        let session = if &target == state.session.target() {
            None
        } else {
            Some(state.selector.build(target, state.session.generation() + 1)?)
        };

        Ok(Transition { active, session })
    }

    fn apply(&self, state: &mut RoutingState, transition: Transition) {
        if let Some(session) = transition.session {
            let event = RoutingEvent::SessionReplaced {
                generation: session.generation(),
                fronted: session.is_fronted(),
            };
            state.session = Arc::new(session);
            self.publish(event);
        }

        if transition.active != state.active {
            state.active = transition.active;
            info!(
                active = state.active,
                "Censorship circumvention active state changed"
            );
            self.publish(RoutingEvent::CircumventionActiveChanged {
                active: state.active,
            });
        }
    }

    fn publish(&self, event: RoutingEvent) {
        // No receivers is fine; nobody is listening yet.
        let _ = self.events.send(event);
    }
}

fn compute_active(
    automatic: bool,
    policy: &CircumventionPolicy,
    classifier: &CensorshipClassifier,
    phone_number: Option<&PhoneNumber>,
) -> bool {
    policy.manually_activated || (automatic && classifier.is_censored_account(phone_number))
}
