//! Event-to-fan-out dispatch.
//!
//! [`NotificationDispatcher`] subscribes to the event bus and turns each
//! [`DomainEvent`] into a [`DispatchPlan`] via the pure [`plan`] function.
//! Every plan runs as its own task, so a slow or failing fan-out never
//! holds up the loop or other fan-outs.
//!
//! The bus is a bounded broadcast channel. If the dispatcher falls more than
//! its capacity behind, the oldest events are overwritten and their
//! notifications are never sent; the loop logs the number lost at `error`
//! and carries on with the newest events. Raise the bus capacity if that
//! shows up in the logs.

use std::sync::Arc;

use masjid_core::categories::{NotificationCategory, PreferenceCategory};
use masjid_core::recipient::Recipient;
use tokio::sync::broadcast;
use tokio_util::task::TaskTracker;

use crate::bus::{AnnouncementOrigin, DomainEvent};
use crate::fanout::{FanoutEngine, FanoutMessage};

/// What a single event should deliver.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DispatchPlan {
    /// Every eligible subscriber of the masjid.
    Broadcast(FanoutMessage),
    /// Only the author of a question.
    ReplyToAuthor {
        author: Recipient,
        message: FanoutMessage,
    },
}

/// Decide what, if anything, an event delivers.
///
/// A `Prayer Times` announcement written by the prayer-time flow returns
/// `None`: the matching [`DomainEvent::PrayerTimesChanged`] already covers it.
pub fn plan(event: &DomainEvent) -> Option<DispatchPlan> {
    match event {
        DomainEvent::PrayerTimesChanged {
            masjid_id,
            prayer_name,
            adhan_time,
            effective_date,
        } => Some(DispatchPlan::Broadcast(
            FanoutMessage::new(
                *masjid_id,
                PreferenceCategory::PrayerTimes,
                "Prayer time updated",
                format!(
                    "{} is now at {} on {}",
                    capitalize(prayer_name),
                    adhan_time.format("%H:%M"),
                    effective_date
                ),
            )
            .with_data("type", "prayer_time")
            .with_data("masjid_id", masjid_id)
            .with_data("prayer_name", prayer_name)
            .with_data("effective_date", effective_date),
        )),

        DomainEvent::QuestionCreated {
            masjid_id,
            question_id,
            title,
        } => Some(DispatchPlan::Broadcast(
            FanoutMessage::new(*masjid_id, PreferenceCategory::Questions, "New question", title)
                .with_data("type", "question")
                .with_data("masjid_id", masjid_id)
                .with_data("question_id", question_id),
        )),

        DomainEvent::QuestionAnswered {
            masjid_id,
            question_id,
            title,
            author,
        } => author.clone().map(|author| DispatchPlan::ReplyToAuthor {
            author,
            message: FanoutMessage::new(
                *masjid_id,
                PreferenceCategory::Questions,
                "Your question was answered",
                title,
            )
            .with_data("type", "question_answer")
            .with_data("masjid_id", masjid_id)
            .with_data("question_id", question_id),
        }),

        DomainEvent::AnnouncementCreated {
            origin: AnnouncementOrigin::PrayerTimeChange,
            category: NotificationCategory::PrayerTimes,
            ..
        } => None,

        DomainEvent::AnnouncementCreated {
            masjid_id,
            announcement_id,
            category,
            title,
            body,
            ..
        } => Some(DispatchPlan::Broadcast(
            FanoutMessage::new(*masjid_id, category.preference(), title, body)
                .with_data("type", "announcement")
                .with_data("masjid_id", masjid_id)
                .with_data("announcement_id", announcement_id)
                .with_data("category", category),
        )),

        DomainEvent::CommunityEventCreated {
            masjid_id,
            event_id,
            title,
            starts_at,
        } => Some(DispatchPlan::Broadcast(
            FanoutMessage::new(
                *masjid_id,
                NotificationCategory::Events.preference(),
                format!("New event: {title}"),
                format!("Starts {}", starts_at.format("%Y-%m-%d %H:%M UTC")),
            )
            .with_data("type", "event")
            .with_data("masjid_id", masjid_id)
            .with_data("event_id", event_id)
            .with_data("starts_at", starts_at.to_rfc3339()),
        )),
    }
}

fn capitalize(s: &str) -> String {
    let mut chars = s.chars();
    match chars.next() {
        Some(first) => first.to_uppercase().chain(chars).collect(),
        None => String::new(),
    }
}

// ---------------------------------------------------------------------------
// NotificationDispatcher
// ---------------------------------------------------------------------------

/// Consumes domain events and runs their fan-out in detached tasks.
pub struct NotificationDispatcher {
    engine: Arc<FanoutEngine>,
    tracker: TaskTracker,
}

impl NotificationDispatcher {
    pub fn new(engine: Arc<FanoutEngine>) -> Self {
        Self {
            engine,
            tracker: TaskTracker::new(),
        }
    }

    /// Run the dispatch loop.
    ///
    /// Exits when the channel closes (the [`EventBus`](crate::EventBus) is
    /// dropped), after every in-flight fan-out task has finished.
    pub async fn run(self, mut receiver: broadcast::Receiver<DomainEvent>) {
        loop {
            match receiver.recv().await {
                Ok(event) => self.dispatch(event),
                Err(broadcast::error::RecvError::Lagged(n)) => {
                    tracing::error!(
                        skipped = n,
                        "Notification dispatcher lagged, notifications for skipped events were dropped"
                    );
                }
                Err(broadcast::error::RecvError::Closed) => {
                    tracing::info!("Event bus closed, notification dispatcher shutting down");
                    break;
                }
            }
        }

        self.tracker.close();
        self.tracker.wait().await;
    }

    fn dispatch(&self, event: DomainEvent) {
        let kind = event.kind();
        let masjid_id = event.masjid_id();
        let Some(plan) = plan(&event) else {
            tracing::debug!(kind, masjid_id, "Event produces no notification");
            return;
        };

        let engine = Arc::clone(&self.engine);
        self.tracker.spawn(async move {
            let result = match &plan {
                DispatchPlan::Broadcast(message) => engine.broadcast(message).await,
                DispatchPlan::ReplyToAuthor { author, message } => {
                    engine.notify_question_author(author, message).await
                }
            };
            match result {
                Ok(report) => tracing::info!(
                    kind,
                    masjid_id,
                    total = report.total,
                    sent = report.sent,
                    failed = report.failed,
                    deactivated = report.deactivated,
                    "Fan-out complete"
                ),
                Err(e) => tracing::error!(kind, masjid_id, error = %e, "Fan-out aborted"),
            }
        });
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
