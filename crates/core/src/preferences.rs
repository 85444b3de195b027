//! Per-recipient category preferences.
//!
//! Opt-out model: a recipient without a stored settings row has every
//! category enabled.

use serde::{Deserialize, Serialize};

use crate::categories::PreferenceCategory;

/// Resolved category toggles for one recipient.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct PreferenceSet {
    pub prayer_times: bool,
    pub events: bool,
    pub donations: bool,
    pub general: bool,
    pub questions: bool,
}

impl PreferenceSet {
    pub fn is_enabled(&self, category: PreferenceCategory) -> bool {
        match category {
            PreferenceCategory::PrayerTimes => self.prayer_times,
            PreferenceCategory::Events => self.events,
            PreferenceCategory::Donations => self.donations,
            PreferenceCategory::General => self.general,
            PreferenceCategory::Questions => self.questions,
        }
    }
}

impl Default for PreferenceSet {
    fn default() -> Self {
        Self {
            prayer_times: true,
            events: true,
            donations: true,
            general: true,
            questions: true,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_enables_every_category() {
        let prefs = PreferenceSet::default();
        assert!(PreferenceCategory::ALL.iter().all(|c| prefs.is_enabled(*c)));
    }

    #[test]
    fn disabling_one_category_leaves_the_rest() {
        let prefs = PreferenceSet {
            general: false,
            ..Default::default()
        };
        for category in PreferenceCategory::ALL {
            assert_eq!(prefs.is_enabled(category), category != PreferenceCategory::General);
        }
    }
}
