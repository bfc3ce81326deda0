//! Fronting Core Library
//!
//! Censorship-circumvention-aware request routing for a messaging client.
//! This crate decides, per request, whether traffic goes straight to the
//! service endpoint or through a domain-fronted path, and keeps that
//! decision consistent with the persisted circumvention policy and the
//! account's phone number.
//!
//! # Architecture
//!
//! ```text
//! RoutingService (single point of mutation)
//!     ├── PolicyStore (SQLite-backed manual settings)
//!     ├── CensorshipClassifier (phone number → censored region)
//!     └── SessionSelector (builds the one live ServiceSession)
//! ```

#![warn(clippy::all)]
#![warn(clippy::pedantic)]
#![warn(clippy::nursery)]
#![deny(unsafe_code)]

pub mod censorship;
pub mod config;
pub mod policy;
pub mod service;
pub mod session;

pub use config::{ConfigError, RoutingConfig};
pub use service::{RoutingEvent, RoutingService, RoutingSnapshot, ServiceError};
pub use session::{RoutingTarget, ServiceSession};
