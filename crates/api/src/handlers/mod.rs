pub mod admin;
pub mod announcement;
pub mod community_event;
pub mod masjid;
pub mod membership;
pub mod prayer_time;
pub mod preferences;
pub mod question;
pub mod subscription;
