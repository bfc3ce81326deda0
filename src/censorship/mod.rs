//! Phone-number censorship classification.
//!
//! Some regions block the service at the network level. Accounts whose
//! phone number belongs to one of those regions get censorship
//! circumvention switched on automatically.
//!
//! # Classification
//!
//! A phone number is censored when its calling code matches an entry in
//! the [`CensorshipTable`]. The longest matching calling code wins. The
//! table can be replaced at runtime (for example after a remote update),
//! so results are never cached.

mod classifier;
mod error;
mod phone;
mod table;

pub use classifier::CensorshipClassifier;
pub use error::{CensorshipError, CensorshipResult};
pub use phone::PhoneNumber;
pub use table::{CensoredRegion, CensorshipTable};
