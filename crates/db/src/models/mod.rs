//! Row structs and DTOs, one module per table family.

pub mod announcement;
pub mod community_event;
pub mod masjid;
pub mod membership;
pub mod prayer_time;
pub mod question;
pub mod settings;
pub mod subscription;
pub mod user;
