use async_trait::async_trait;
use chrono::TimeDelta;
use dailynote_models::{
    alarm::{AlarmTime, DueAlarm},
    fixed_note::FixedNote,
    identity::AlarmIdentity,
    settings::RecurringAlarmSettings,
};

/// A reminder that is due right now, as handed to the presentation layer.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FireEvent {
    pub identity: AlarmIdentity,
    pub title: String,
    pub body: String,
    pub sound: Option<String>,
    pub volume: u8,
    pub duration_secs: u32,
}

impl FireEvent {
    pub fn recurring(note: FixedNote, alarm: &RecurringAlarmSettings) -> Self {
        Self {
            identity: AlarmIdentity::Recurring(note.id),
            title: note.title,
            body: note.content,
            sound: alarm.sound.clone(),
            volume: alarm.volume,
            duration_secs: alarm.duration_secs,
        }
    }

    pub fn ring_duration(&self) -> TimeDelta {
        TimeDelta::seconds(self.duration_secs.into())
    }
}

impl From<DueAlarm> for FireEvent {
    fn from(value: DueAlarm) -> Self {
        let DueAlarm { note, alarm } = value;
        Self {
            identity: AlarmIdentity::OneTime(note.id),
            title: note.title,
            body: note.content,
            sound: alarm.sound,
            volume: alarm.volume,
            duration_secs: alarm.duration_secs,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AlarmMessage {
    Fired(FireEvent),
    Snoozed {
        identity: AlarmIdentity,
        until: AlarmTime,
    },
    Dismissed(AlarmIdentity),
    /// Resolved without touching storage: window closed, zero-minute
    /// snooze, or a snoozed fixed note.
    Cleared(AlarmIdentity),
    /// Nobody answered within the ring duration; dismissed automatically.
    TimedOut(AlarmIdentity),
}

#[async_trait]
pub trait AlarmDeliveryChannel: Send + Sync + 'static {
    async fn send_alarm_notification(&self, message: AlarmMessage);
}
