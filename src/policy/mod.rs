//! Circumvention policy store.
//!
//! Holds the user's manual censorship-circumvention settings:
//!
//! - whether circumvention is forced on,
//! - a manually chosen fronting domain,
//! - a manually chosen country code.
//!
//! Settings are persisted to `SQLite` on every change and loaded at
//! startup. Malformed input is rejected before anything is written.
//!
//! # Architecture
//!
//! ```text
//! PolicyStore (validation, notifications)
//!     └── PolicyStorage (SQLite key/value rows)
//! ```

mod error;
mod storage;
mod store;
mod types;
mod validate;

pub use error::{PolicyError, Result};
pub use storage::PolicyStorage;
pub use store::PolicyStore;
pub use types::{CircumventionPolicy, PolicyChange, PolicyKey};
pub use validate::{normalize_country_code, normalize_domain};
