use std::{fmt, str::FromStr};

use chrono::{NaiveDateTime, NaiveTime, Timelike};

use crate::{
    error::ValidationError,
    note::{Note, NoteId},
};

/// Time of day an alarm rings at. Always minute-precise.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct AlarmTime(NaiveTime);

impl AlarmTime {
    pub fn new(inner: NaiveTime) -> Self {
        let normalized_time = inner
            .with_second(0)
            .and_then(|t| t.with_nanosecond(0))
            .expect("Zero seconds and nanoseconds are always valid.");
        Self(normalized_time)
    }

    pub fn from_hm(hour: u32, minute: u32) -> Result<Self, ValidationError> {
        NaiveTime::from_hms_opt(hour, minute, 0)
            .map(Self)
            .ok_or_else(|| ValidationError::InvalidTime(format!("{hour:02}:{minute:02}")))
    }

    /// Minute of `now`, the granularity every trigger comparison uses.
    pub fn of(now: &NaiveDateTime) -> Self {
        Self::new(now.time())
    }

    pub fn time(&self) -> &NaiveTime {
        &self.0
    }

    pub fn into_time(self) -> NaiveTime {
        self.0
    }
}

impl fmt::Display for AlarmTime {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0.format("%H:%M"))
    }
}

impl FromStr for AlarmTime {
    type Err = ValidationError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        NaiveTime::parse_from_str(s.trim(), "%H:%M")
            .map(Self::new)
            .map_err(|_| ValidationError::InvalidTime(s.to_owned()))
    }
}

pub const MAX_VOLUME: u8 = 100;
pub const DEFAULT_VOLUME: u8 = 80;
pub const DEFAULT_DURATION_SECS: u32 = 10;

/// Alarm attached to a one-time note. At most one per note.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Alarm {
    pub note_id: NoteId,
    pub sound: Option<String>,
    pub volume: u8,
    pub duration_secs: u32,
    pub time: AlarmTime,
}

impl Alarm {
    pub fn new(
        note_id: NoteId,
        sound: Option<String>,
        volume: u32,
        duration_secs: u32,
        time: AlarmTime,
    ) -> Result<Self, ValidationError> {
        let volume = u8::try_from(volume)
            .ok()
            .filter(|v| *v <= MAX_VOLUME)
            .ok_or(ValidationError::VolumeOutOfRange(volume))?;

        Ok(Self {
            note_id,
            sound: sound.filter(|s| !s.is_empty()),
            volume,
            duration_secs,
            time,
        })
    }
}

/// A one-time alarm together with the note it belongs to.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DueAlarm {
    pub note: Note,
    pub alarm: Alarm,
}
