//! Types published by the routing service.

use std::sync::Arc;

use crate::censorship::PhoneNumber;
use crate::policy::CircumventionPolicy;
use crate::session::ServiceSession;

/// Notification published after a committed state change.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RoutingEvent {
    /// Whether circumvention is active flipped.
    CircumventionActiveChanged {
        /// The new value.
        active: bool,
    },

    /// A new session replaced the previous one.
    SessionReplaced {
        /// Generation of the new session.
        generation: u64,
        /// Whether the new session is domain-fronted.
        fronted: bool,
    },

    /// The service was shut down.
    ShutDown,
}

/// A consistent view of the routing state.
///
/// All fields are read under one lock acquisition, so `is_active` always
/// agrees with `session`.
#[derive(Debug, Clone)]
pub struct RoutingSnapshot {
    /// Manual circumvention settings.
    pub policy: CircumventionPolicy,
    /// The account's phone number, if known.
    pub phone_number: Option<PhoneNumber>,
    /// Whether the phone number belongs to a censored region.
    pub has_censored_phone_number: bool,
    /// Whether circumvention is active.
    pub is_active: bool,
    /// The live session.
    pub session: Arc<ServiceSession>,
}

impl RoutingSnapshot {
    /// Returns true if the snapshot's fields agree with each other.
    ///
    /// `automatic` is the configured automatic-circumvention switch.
    #[must_use]
    pub fn is_consistent(&self, automatic: bool) -> bool {
        let expected = self.policy.manually_activated
            || (automatic && self.has_censored_phone_number);
        self.is_active == expected && self.session.is_fronted() == self.is_active
    }
}
