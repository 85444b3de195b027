//! Domain types and pure decision logic for the masjid backend.
//!
//! Nothing in this crate performs I/O. The database, event, and HTTP crates
//! load data and call into these functions.

pub mod capabilities;
pub mod categories;
pub mod device;
pub mod error;
pub mod hashing;
pub mod lifecycle;
pub mod permissions;
pub mod preferences;
pub mod recipient;
pub mod roles;
pub mod types;
pub mod validation;
