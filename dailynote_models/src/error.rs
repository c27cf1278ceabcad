use thiserror::Error;

/// Rejected construction of a domain value.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ValidationError {
    #[error("Weekday {0} is out of range, expected 0 (Monday) to 6 (Sunday)")]
    WeekdayOutOfRange(u32),

    #[error("Invalid weekday {0:?}")]
    InvalidWeekday(String),

    #[error("Day of month {0} is out of range, expected 1 to 31")]
    DayOfMonthOutOfRange(u32),

    #[error("Month {0} is out of range, expected 1 to 12")]
    MonthOutOfRange(u32),

    #[error("Volume {0} is out of range, expected 0 to 100")]
    VolumeOutOfRange(u32),

    #[error("Invalid alarm time {0:?}, expected HH:MM")]
    InvalidTime(String),

    #[error("Unknown repeat type {0:?}")]
    UnknownRepeatType(String),

    #[error("Repeat type {repeat_type} requires {field}")]
    MissingField {
        repeat_type: &'static str,
        field: &'static str,
    },
}
