use dailynote_models::{
    alarm::{Alarm, AlarmTime, DEFAULT_DURATION_SECS, DEFAULT_VOLUME, DueAlarm},
    chrono::NaiveDate,
    error::ValidationError,
    fixed_note::FixedNote,
    note::Note,
    recurrence::{RecurrenceRule, WeekdaySet},
};

#[derive(sqlx::FromRow)]
pub struct NoteStorageModel {
    pub id: i64,
    pub title: String,
    pub content: Option<String>,
    pub date: NaiveDate,
}

impl From<NoteStorageModel> for Note {
    fn from(value: NoteStorageModel) -> Self {
        Self {
            id: value.id,
            title: value.title,
            content: value.content.unwrap_or_default(),
            date: value.date,
        }
    }
}

#[derive(sqlx::FromRow)]
pub struct AlarmStorageModel {
    pub note_id: i64,
    pub sound: Option<String>,
    pub volume: Option<i64>,
    pub duration: Option<i64>,
    pub time: Option<String>,
}

impl TryFrom<AlarmStorageModel> for Alarm {
    type Error = ValidationError;

    fn try_from(value: AlarmStorageModel) -> Result<Self, Self::Error> {
        let time = value.time.unwrap_or_default().parse::<AlarmTime>()?;
        let volume = value
            .volume
            .map_or(DEFAULT_VOLUME as u32, |v| u32::try_from(v).unwrap_or(u32::MAX));
        let duration_secs = value
            .duration
            .map_or(DEFAULT_DURATION_SECS, |d| u32::try_from(d).unwrap_or(0));

        Alarm::new(value.note_id, value.sound, volume, duration_secs, time)
    }
}

#[derive(sqlx::FromRow)]
pub struct DueAlarmStorageModel {
    pub id: i64,
    pub title: String,
    pub content: Option<String>,
    pub date: NaiveDate,
    pub sound: Option<String>,
    pub volume: Option<i64>,
    pub duration: Option<i64>,
    pub time: Option<String>,
}

impl TryFrom<DueAlarmStorageModel> for DueAlarm {
    type Error = ValidationError;

    fn try_from(value: DueAlarmStorageModel) -> Result<Self, Self::Error> {
        let alarm = AlarmStorageModel {
            note_id: value.id,
            sound: value.sound,
            volume: value.volume,
            duration: value.duration,
            time: value.time,
        }
        .try_into()?;
        let note = NoteStorageModel {
            id: value.id,
            title: value.title,
            content: value.content,
            date: value.date,
        }
        .into();

        Ok(DueAlarm { note, alarm })
    }
}

#[derive(sqlx::FromRow)]
pub struct FixedNoteStorageModel {
    pub id: i64,
    pub title: String,
    pub content: Option<String>,
    pub event_time: Option<String>,
    pub alarm_enabled: i64,
    pub alarm_days: Option<String>,
    pub repeat_type: Option<String>,
    pub repeat_day: Option<i64>,
    pub repeat_month: Option<i64>,
}

impl TryFrom<FixedNoteStorageModel> for FixedNote {
    type Error = ValidationError;

    fn try_from(value: FixedNoteStorageModel) -> Result<Self, Self::Error> {
        let time = match value.event_time.as_deref().map(str::trim) {
            None | Some("") => None,
            Some(time) => Some(time.parse()?),
        };
        let rule = parse_rule(&RuleColumns {
            repeat_type: value.repeat_type.unwrap_or_else(|| WEEKLY.to_owned()),
            alarm_days: value.alarm_days.unwrap_or_default(),
            repeat_day: value.repeat_day,
            repeat_month: value.repeat_month,
        })?;

        Ok(Self {
            id: value.id,
            title: value.title,
            content: value.content.unwrap_or_default(),
            alarm_enabled: value.alarm_enabled != 0,
            time,
            rule,
        })
    }
}

const WEEKLY: &str = "weekly";
const MONTHLY: &str = "monthly";
const YEARLY: &str = "yearly";

/// Persisted form of a recurrence rule: a type tag and nullable columns.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RuleColumns {
    pub repeat_type: String,
    pub alarm_days: String,
    pub repeat_day: Option<i64>,
    pub repeat_month: Option<i64>,
}

impl From<&RecurrenceRule> for RuleColumns {
    fn from(rule: &RecurrenceRule) -> Self {
        match *rule {
            RecurrenceRule::Weekly { days } => Self {
                repeat_type: WEEKLY.to_owned(),
                alarm_days: days
                    .numbers()
                    .map(|day| day.to_string())
                    .collect::<Vec<_>>()
                    .join(","),
                repeat_day: None,
                repeat_month: None,
            },
            RecurrenceRule::Monthly { day_of_month } => Self {
                repeat_type: MONTHLY.to_owned(),
                alarm_days: String::new(),
                repeat_day: Some(day_of_month.into()),
                repeat_month: None,
            },
            RecurrenceRule::Yearly {
                day_of_month,
                month,
            } => Self {
                repeat_type: YEARLY.to_owned(),
                alarm_days: String::new(),
                repeat_day: Some(day_of_month.into()),
                repeat_month: Some(month.into()),
            },
        }
    }
}

pub fn parse_rule(columns: &RuleColumns) -> Result<RecurrenceRule, ValidationError> {
    match columns.repeat_type.as_str() {
        WEEKLY => {
            let days = columns
                .alarm_days
                .split(',')
                .map(str::trim)
                .filter(|day| !day.is_empty())
                .map(|day| {
                    day.parse::<u32>()
                        .map_err(|_| ValidationError::InvalidWeekday(day.to_owned()))
                })
                .collect::<Result<Vec<_>, _>>()?;
            Ok(RecurrenceRule::weekly(WeekdaySet::from_numbers(days)?))
        }
        MONTHLY => {
            let day = required(columns.repeat_day, MONTHLY, "repeat_day")?;
            RecurrenceRule::monthly(day)
        }
        YEARLY => {
            let day = required(columns.repeat_day, YEARLY, "repeat_day")?;
            let month = required(columns.repeat_month, YEARLY, "repeat_month")?;
            RecurrenceRule::yearly(day, month)
        }
        other => Err(ValidationError::UnknownRepeatType(other.to_owned())),
    }
}

fn required(
    value: Option<i64>,
    repeat_type: &'static str,
    field: &'static str,
) -> Result<u32, ValidationError> {
    value
        .map(|v| u32::try_from(v).unwrap_or(u32::MAX))
        .ok_or(ValidationError::MissingField { repeat_type, field })
}
