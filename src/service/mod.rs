//! Routing service.
//!
//! Owns the circumvention policy, the account's phone number, the
//! censorship table and the live session, and keeps them consistent.
//!
//! # Example
//!
//! ```no_run
//! use fronting_core::{RoutingConfig, RoutingService};
//! use std::path::Path;
//!
//! let config = RoutingConfig::from_file(Path::new("/etc/app/routing.json"))?;
//! let service = RoutingService::open(config, Path::new("/var/lib/app"), Some("+201012345678"))?;
//!
//! let mut events = service.subscribe();
//! let session = service.session();
//! let request = session.get("v1/profile")?;
//! # let _ = (request, &mut events);
//! # Ok::<(), Box<dyn std::error::Error>>(())
//! ```

mod error;
mod manager;
mod types;

pub use error::{ServiceError, ServiceResult};
pub use manager::RoutingService;
pub use types::{RoutingEvent, RoutingSnapshot};
