use serde::Deserialize;

use crate::alarm::{DEFAULT_DURATION_SECS, DEFAULT_VOLUME};

#[derive(Deserialize, Debug, Clone)]
pub struct DatabaseSettings {
    #[serde(default = "default_database_url")]
    pub url: String,
}

impl Default for DatabaseSettings {
    fn default() -> Self {
        Self {
            url: default_database_url(),
        }
    }
}

#[derive(Deserialize, Debug, Clone)]
pub struct SchedulerSettings {
    /// IANA timezone used as the local wall clock.
    #[serde(default = "default_timezone")]
    pub timezone: String,
    #[serde(default = "default_tick_interval_ms")]
    pub tick_interval_ms: u64,
    /// Dismiss alarms nobody answered once their ring duration is over.
    #[serde(default = "default_true")]
    pub auto_dismiss: bool,
}

impl Default for SchedulerSettings {
    fn default() -> Self {
        Self {
            timezone: default_timezone(),
            tick_interval_ms: default_tick_interval_ms(),
            auto_dismiss: true,
        }
    }
}

/// Sound settings applied to fixed notes, which carry none of their own.
#[derive(Deserialize, Debug, Clone, PartialEq, Eq)]
pub struct RecurringAlarmSettings {
    #[serde(default)]
    pub sound: Option<String>,
    #[serde(default = "default_volume")]
    pub volume: u8,
    #[serde(default = "default_duration_secs")]
    pub duration_secs: u32,
}

impl Default for RecurringAlarmSettings {
    fn default() -> Self {
        Self {
            sound: None,
            volume: default_volume(),
            duration_secs: default_duration_secs(),
        }
    }
}

pub const MAX_SNOOZE_MINUTES: i64 = 180;

#[derive(Deserialize, Debug, Clone)]
pub struct SnoozeSettings {
    #[serde(default = "default_snooze_minutes")]
    pub default_minutes: i64,
}

impl Default for SnoozeSettings {
    fn default() -> Self {
        Self {
            default_minutes: default_snooze_minutes(),
        }
    }
}

#[derive(Deserialize, Debug, Clone, Default)]
pub struct Settings {
    #[serde(default)]
    pub database: DatabaseSettings,
    #[serde(default)]
    pub scheduler: SchedulerSettings,
    #[serde(default)]
    pub recurring_alarm: RecurringAlarmSettings,
    #[serde(default)]
    pub snooze: SnoozeSettings,
}

fn default_database_url() -> String {
    "sqlite://dailynote.db?mode=rwc".to_owned()
}

fn default_timezone() -> String {
    "UTC".to_owned()
}

fn default_tick_interval_ms() -> u64 {
    1000
}

fn default_true() -> bool {
    true
}

fn default_volume() -> u8 {
    DEFAULT_VOLUME
}

fn default_duration_secs() -> u32 {
    DEFAULT_DURATION_SECS
}

fn default_snooze_minutes() -> i64 {
    5
}
