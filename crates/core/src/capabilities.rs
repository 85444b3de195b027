//! Fine-grained membership capabilities.
//!
//! Capabilities are stored per membership row and are independent of the
//! row's role. Role-based defaults are applied only when a row is created;
//! permission checks always read the stored bits.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::CoreError;
use crate::roles::Role;

/// One of the seven capability flags carried by a membership row.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Capability {
    #[serde(rename = "can_view_complaints")]
    ViewComplaints,
    #[serde(rename = "can_answer_complaints")]
    AnswerComplaints,
    #[serde(rename = "can_view_questions")]
    ViewQuestions,
    #[serde(rename = "can_answer_questions")]
    AnswerQuestions,
    #[serde(rename = "can_change_prayer_times")]
    ChangePrayerTimes,
    #[serde(rename = "can_create_events")]
    CreateEvents,
    #[serde(rename = "can_create_notifications")]
    CreateNotifications,
}

impl Capability {
    pub const ALL: [Capability; 7] = [
        Capability::ViewComplaints,
        Capability::AnswerComplaints,
        Capability::ViewQuestions,
        Capability::AnswerQuestions,
        Capability::ChangePrayerTimes,
        Capability::CreateEvents,
        Capability::CreateNotifications,
    ];

    /// Wire / column name of the capability.
    pub fn as_str(self) -> &'static str {
        match self {
            Capability::ViewComplaints => "can_view_complaints",
            Capability::AnswerComplaints => "can_answer_complaints",
            Capability::ViewQuestions => "can_view_questions",
            Capability::AnswerQuestions => "can_answer_questions",
            Capability::ChangePrayerTimes => "can_change_prayer_times",
            Capability::CreateEvents => "can_create_events",
            Capability::CreateNotifications => "can_create_notifications",
        }
    }
}

impl fmt::Display for Capability {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Capability {
    type Err = CoreError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Capability::ALL
            .into_iter()
            .find(|c| c.as_str() == s)
            .ok_or_else(|| CoreError::Validation(format!("Unknown capability '{s}'")))
    }
}

/// The full set of capability bits for one membership row.
///
/// Deliberately has no `Default` impl: every code path that creates a
/// membership must state its capability values, usually by starting from
/// [`Capabilities::defaults_for`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Capabilities {
    pub can_view_complaints: bool,
    pub can_answer_complaints: bool,
    pub can_view_questions: bool,
    pub can_answer_questions: bool,
    pub can_change_prayer_times: bool,
    pub can_create_events: bool,
    pub can_create_notifications: bool,
}

impl Capabilities {
    /// Capability bits seeded when a membership with `role` is created.
    ///
    /// Admins receive every capability. Imams receive every capability
    /// except answering complaints.
    pub fn defaults_for(role: Role) -> Self {
        let all = Self::uniform(true);
        match role {
            Role::Admin => all,
            Role::Imam => Self {
                can_answer_complaints: false,
                ..all
            },
        }
    }

    /// Every capability set to `value`.
    pub fn uniform(value: bool) -> Self {
        Self {
            can_view_complaints: value,
            can_answer_complaints: value,
            can_view_questions: value,
            can_answer_questions: value,
            can_change_prayer_times: value,
            can_create_events: value,
            can_create_notifications: value,
        }
    }

    pub fn has(&self, capability: Capability) -> bool {
        match capability {
            Capability::ViewComplaints => self.can_view_complaints,
            Capability::AnswerComplaints => self.can_answer_complaints,
            Capability::ViewQuestions => self.can_view_questions,
            Capability::AnswerQuestions => self.can_answer_questions,
            Capability::ChangePrayerTimes => self.can_change_prayer_times,
            Capability::CreateEvents => self.can_create_events,
            Capability::CreateNotifications => self.can_create_notifications,
        }
    }

    /// Apply the `Some` fields of `overrides` on top of `self`.
    pub fn with_overrides(self, overrides: &CapabilityOverrides) -> Self {
        Self {
            can_view_complaints: overrides
                .can_view_complaints
                .unwrap_or(self.can_view_complaints),
            can_answer_complaints: overrides
                .can_answer_complaints
                .unwrap_or(self.can_answer_complaints),
            can_view_questions: overrides
                .can_view_questions
                .unwrap_or(self.can_view_questions),
            can_answer_questions: overrides
                .can_answer_questions
                .unwrap_or(self.can_answer_questions),
            can_change_prayer_times: overrides
                .can_change_prayer_times
                .unwrap_or(self.can_change_prayer_times),
            can_create_events: overrides
                .can_create_events
                .unwrap_or(self.can_create_events),
            can_create_notifications: overrides
                .can_create_notifications
                .unwrap_or(self.can_create_notifications),
        }
    }
}

/// Partial capability update. `None` fields keep their current value.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct CapabilityOverrides {
    pub can_view_complaints: Option<bool>,
    pub can_answer_complaints: Option<bool>,
    pub can_view_questions: Option<bool>,
    pub can_answer_questions: Option<bool>,
    pub can_change_prayer_times: Option<bool>,
    pub can_create_events: Option<bool>,
    pub can_create_notifications: Option<bool>,
}
