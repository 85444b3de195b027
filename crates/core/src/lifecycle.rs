//! Lifecycle states for soft-deletable records.
//!
//! Community events move `active -> deleted` and never back. Users and
//! masjids use an `is_active` flag whose only normal-flow transition is
//! deactivation.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::CoreError;

pub const EVENT_STATUS_ACTIVE: &str = "active";
pub const EVENT_STATUS_DELETED: &str = "deleted";

/// Status of a community event row.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum EventStatus {
    Active,
    Deleted,
}

impl EventStatus {
    pub fn as_str(self) -> &'static str {
        match self {
            EventStatus::Active => EVENT_STATUS_ACTIVE,
            EventStatus::Deleted => EVENT_STATUS_DELETED,
        }
    }

    pub fn can_transition_to(self, next: EventStatus) -> bool {
        matches!((self, next), (EventStatus::Active, EventStatus::Deleted))
    }

    /// Validate a transition, returning the new status.
    pub fn transition_to(self, next: EventStatus) -> Result<EventStatus, CoreError> {
        if self.can_transition_to(next) {
            Ok(next)
        } else {
            Err(CoreError::Conflict(format!(
                "Event cannot move from '{self}' to '{next}'"
            )))
        }
    }
}

impl fmt::Display for EventStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for EventStatus {
    type Err = CoreError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            EVENT_STATUS_ACTIVE => Ok(EventStatus::Active),
            EVENT_STATUS_DELETED => Ok(EventStatus::Deleted),
            other => Err(CoreError::Validation(format!("Invalid event status '{other}'"))),
        }
    }
}

impl TryFrom<String> for EventStatus {
    type Error = CoreError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}
