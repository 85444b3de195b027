//! Repository layer.
//!
//! Each repository is a zero-sized struct providing async methods that
//! accept `&PgPool` as the first argument. Multi-statement mutations that
//! must be atomic open their own transaction.

pub mod announcement_repo;
pub mod community_event_repo;
pub mod masjid_repo;
pub mod membership_repo;
pub mod prayer_time_repo;
pub mod question_repo;
pub mod settings_repo;
pub mod subscription_repo;
pub mod user_repo;

pub use announcement_repo::AnnouncementRepo;
pub use community_event_repo::CommunityEventRepo;
pub use masjid_repo::MasjidRepo;
pub use membership_repo::MembershipRepo;
pub use prayer_time_repo::PrayerTimeRepo;
pub use question_repo::QuestionRepo;
pub use settings_repo::SettingsRepo;
pub use subscription_repo::SubscriptionRepo;
pub use user_repo::UserRepo;
