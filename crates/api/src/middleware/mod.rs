//! Request extractors.
//!
//! - [`auth::AuthUser`] -- Extracts the authenticated user from a JWT Bearer token.
//! - [`auth::OptionalAuthUser`] -- Same, but tolerates a missing header.
//! - [`device::DeviceHeaders`] -- Anonymous device identity headers.

pub mod auth;
pub mod device;
