//! Event bus and push-notification fan-out for the masjid backend.
//!
//! - [`EventBus`] is the in-process publish/subscribe hub backed by
//!   `tokio::sync::broadcast`. Handlers publish a [`DomainEvent`] after
//!   their mutation commits.
//! - [`NotificationDispatcher`] consumes the bus and runs each fan-out as a
//!   detached task.
//! - [`FanoutEngine`] resolves recipients, filters them by preference, sends
//!   through a [`PushGateway`], and deactivates dead tokens.

pub mod bus;
pub mod dispatcher;
pub mod fanout;
pub mod push;

pub use bus::{AnnouncementOrigin, DomainEvent, EventBus};
pub use dispatcher::{plan, DispatchPlan, NotificationDispatcher};
pub use fanout::{
    FanoutConfig, FanoutEngine, FanoutError, FanoutMessage, FanoutReport, PgSubscriberDirectory,
    SubscriberDirectory,
};
pub use push::{FcmConfig, FcmGateway, LoggingGateway, PushGateway};
