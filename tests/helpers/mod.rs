//! Reusable test helpers for routing integration tests.
//!
//! Services are opened over real `SQLite` files in unique temporary
//! directories so persistence is exercised end to end.

#![allow(dead_code)]

use std::env;
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicU64, Ordering};

use fronting_core::{RoutingConfig, RoutingService};

/// Atomic counter for unique test directory names.
static HELPER_COUNTER: AtomicU64 = AtomicU64::new(0);

/// A phone number outside every censored region.
pub const UNCENSORED_NUMBER: &str = "+15550109999";

/// A phone number in a built-in censored region (Egypt).
pub const CENSORED_NUMBER: &str = "+201012345678";

/// Default fronting domain used by [`test_config`].
pub const FRONT_DOMAIN: &str = "front.example.com";

/// Creates a unique temporary directory for test isolation.
///
/// Each call produces a distinct path by combining the prefix, process ID,
/// and an atomic counter.
pub fn unique_temp_dir(prefix: &str) -> PathBuf {
    let id = HELPER_COUNTER.fetch_add(1, Ordering::SeqCst);
    env::temp_dir().join(format!(
        "fronting_test_{}_{}_{}",
        prefix,
        std::process::id(),
        id
    ))
}

/// Removes a temporary test directory. Ignores errors silently.
pub fn cleanup_dir(dir: &Path) {
    let _ = std::fs::remove_dir_all(dir);
}

/// Installs a tracing subscriber honoring `RUST_LOG`. Safe to call from
/// every test.
pub fn init_tracing() {
    let _ = tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .with_test_writer()
        .try_init();
}

/// Configuration with a default fronting domain.
pub fn test_config() -> RoutingConfig {
    RoutingConfig::new("https://service.example.org", "reflector.example.net")
        .with_default_fronting_domain(FRONT_DOMAIN)
}

/// Configuration with automatic mode off and no fronting domain at all.
pub fn manual_only_config() -> RoutingConfig {
    let mut config = RoutingConfig::new("https://service.example.org", "reflector.example.net");
    config.automatic_circumvention = false;
    config
}

/// Opens a service backed by a database in `dir`.
pub fn open_service(dir: &Path, phone_number: Option<&str>) -> RoutingService {
    RoutingService::open(test_config(), dir, phone_number).expect("should open routing service")
}
