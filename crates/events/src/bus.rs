//! In-process event bus backed by a `tokio::sync::broadcast` channel.
//!
//! [`EventBus`] is the publish/subscribe hub for [`DomainEvent`]s. It is
//! shared via `Arc<EventBus>` across the application. Publishing never
//! fails the caller: with no subscriber the event is dropped.

use chrono::{NaiveDate, NaiveTime};
use masjid_core::categories::NotificationCategory;
use masjid_core::recipient::Recipient;
use masjid_core::types::{DbId, Timestamp};
use serde::{Deserialize, Serialize};
use tokio::sync::broadcast;

// ---------------------------------------------------------------------------
// DomainEvent
// ---------------------------------------------------------------------------

/// Which code path produced an announcement row.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AnnouncementOrigin {
    /// Created directly by a member through the announcements endpoint.
    Direct,
    /// Written as a side effect of a prayer-time change.
    PrayerTimeChange,
}

/// A committed mutation that may produce push notifications.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum DomainEvent {
    PrayerTimesChanged {
        masjid_id: DbId,
        prayer_name: String,
        adhan_time: NaiveTime,
        effective_date: NaiveDate,
    },
    QuestionCreated {
        masjid_id: DbId,
        question_id: DbId,
        title: String,
    },
    QuestionAnswered {
        masjid_id: DbId,
        question_id: DbId,
        title: String,
        /// `None` when the author's row was purged.
        author: Option<Recipient>,
    },
    AnnouncementCreated {
        masjid_id: DbId,
        announcement_id: DbId,
        category: NotificationCategory,
        title: String,
        body: String,
        origin: AnnouncementOrigin,
    },
    CommunityEventCreated {
        masjid_id: DbId,
        event_id: DbId,
        title: String,
        starts_at: Timestamp,
    },
}

impl DomainEvent {
    pub fn masjid_id(&self) -> DbId {
        match self {
            DomainEvent::PrayerTimesChanged { masjid_id, .. }
            | DomainEvent::QuestionCreated { masjid_id, .. }
            | DomainEvent::QuestionAnswered { masjid_id, .. }
            | DomainEvent::AnnouncementCreated { masjid_id, .. }
            | DomainEvent::CommunityEventCreated { masjid_id, .. } => *masjid_id,
        }
    }

    /// Short name used in logs.
    pub fn kind(&self) -> &'static str {
        match self {
            DomainEvent::PrayerTimesChanged { .. } => "prayer_times_changed",
            DomainEvent::QuestionCreated { .. } => "question_created",
            DomainEvent::QuestionAnswered { .. } => "question_answered",
            DomainEvent::AnnouncementCreated { .. } => "announcement_created",
            DomainEvent::CommunityEventCreated { .. } => "community_event_created",
        }
    }
}

// ---------------------------------------------------------------------------
// EventBus
// ---------------------------------------------------------------------------

/// Default buffer capacity for the broadcast channel.
const DEFAULT_CAPACITY: usize = 1024;

/// In-process fan-out event bus.
pub struct EventBus {
    sender: broadcast::Sender<DomainEvent>,
}

impl EventBus {
    /// Create a bus with a specific channel capacity.
    ///
    /// When the buffer is full, the oldest un-consumed messages are dropped
    /// and slow receivers observe `RecvError::Lagged`.
    pub fn new(capacity: usize) -> Self {
        let (sender, _) = broadcast::channel(capacity);
        Self { sender }
    }

    /// Publish an event to all current subscribers.
    pub fn publish(&self, event: DomainEvent) {
        // A SendError only means there are zero receivers.
        if self.sender.send(event).is_err() {
            tracing::debug!("Event published with no subscribers");
        }
    }

    /// Subscribe to all events published on this bus.
    pub fn subscribe(&self) -> broadcast::Receiver<DomainEvent> {
        self.sender.subscribe()
    }

    /// Number of live receivers, i.e. attached dispatchers.
    pub fn receiver_count(&self) -> usize {
        self.sender.receiver_count()
    }
}

impl Default for EventBus {
    fn default() -> Self {
        Self::new(DEFAULT_CAPACITY)
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
