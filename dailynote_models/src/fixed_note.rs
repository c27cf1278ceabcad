use chrono::NaiveDateTime;

use crate::{alarm::AlarmTime, recurrence::RecurrenceRule};

pub type FixedNoteId = i64;

/// Recurring note. Fires on every date its rule matches, at `time`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FixedNote {
    pub id: FixedNoteId,
    pub title: String,
    pub content: String,
    pub alarm_enabled: bool,
    pub time: Option<AlarmTime>,
    pub rule: RecurrenceRule,
}

impl FixedNote {
    /// Disabled or time-less notes are never due, whatever the rule says.
    pub fn is_due(&self, now: &NaiveDateTime) -> bool {
        self.alarm_enabled
            && self.time == Some(AlarmTime::of(now))
            && self.rule.matches(now.date())
    }
}
