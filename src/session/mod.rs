//! Service sessions with censorship-aware routing.
//!
//! A [`ServiceSession`] is the one object callers send requests through.
//! It hides whether requests go directly to the service or through a
//! fronting domain.
//!
//! # Domain Fronting
//!
//! ```text
//! Direct:   TLS → service.example.org     Host: service.example.org
//! Fronted:  TLS → front.example.com       Host: reflector host
//!                     │
//!                     ▼
//!               reflector → service
//! ```
//!
//! A network observer only sees the fronting domain, which is chosen to be
//! too costly to block.

mod error;
mod selector;
mod types;

pub use error::{SessionError, SessionResult};
pub use selector::SessionSelector;
pub use types::{RoutingTarget, ServiceSession};
