//! Notification fan-out: recipients, preferences, delivery, reconciliation.

pub mod config;
pub mod directory;
pub mod engine;
pub mod preferences;

pub use config::FanoutConfig;
pub use directory::{Candidate, PgSubscriberDirectory, StoredPreferences, SubscriberDirectory};
pub use engine::{FanoutEngine, FanoutError, FanoutMessage, FanoutReport};
pub use preferences::PreferenceResolver;
