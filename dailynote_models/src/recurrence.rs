//! Recurrence rules of fixed notes and the pure evaluator deciding whether a
//! rule is eligible on a calendar date.

use chrono::{Datelike, NaiveDate, Weekday};

use crate::error::ValidationError;

/// Set of weekdays, numbered 0 (Monday) to 6 (Sunday).
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash)]
pub struct WeekdaySet(u8);

impl WeekdaySet {
    pub const EMPTY: Self = Self(0);

    pub fn from_numbers(days: impl IntoIterator<Item = u32>) -> Result<Self, ValidationError> {
        days.into_iter().try_fold(Self::EMPTY, |set, day| {
            if day > 6 {
                return Err(ValidationError::WeekdayOutOfRange(day));
            }
            Ok(Self(set.0 | 1 << day))
        })
    }

    pub fn contains(&self, weekday: Weekday) -> bool {
        self.0 & (1 << weekday.num_days_from_monday()) != 0
    }

    /// Day numbers in ascending order.
    pub fn numbers(&self) -> impl Iterator<Item = u32> + '_ {
        (0..7).filter(|day| self.0 & (1 << day) != 0)
    }
}

impl FromIterator<Weekday> for WeekdaySet {
    fn from_iter<T: IntoIterator<Item = Weekday>>(iter: T) -> Self {
        Self(
            iter.into_iter()
                .fold(0, |bits, day| bits | 1 << day.num_days_from_monday()),
        )
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum RecurrenceRule {
    Weekly { days: WeekdaySet },
    Monthly { day_of_month: u32 },
    Yearly { day_of_month: u32, month: u32 },
}

impl RecurrenceRule {
    pub fn weekly(days: WeekdaySet) -> Self {
        Self::Weekly { days }
    }

    pub fn monthly(day_of_month: u32) -> Result<Self, ValidationError> {
        Ok(Self::Monthly {
            day_of_month: check_day_of_month(day_of_month)?,
        })
    }

    pub fn yearly(day_of_month: u32, month: u32) -> Result<Self, ValidationError> {
        if !(1..=12).contains(&month) {
            return Err(ValidationError::MonthOutOfRange(month));
        }
        Ok(Self::Yearly {
            day_of_month: check_day_of_month(day_of_month)?,
            month,
        })
    }

    /// Whether a fixed note with this rule is eligible to fire on `date`.
    ///
    /// A day of month the month does not have never matches; there is no
    /// clamping to the last day.
    pub fn matches(&self, date: NaiveDate) -> bool {
        match *self {
            Self::Weekly { days } => days.contains(date.weekday()),
            Self::Monthly { day_of_month } => date.day() == day_of_month,
            Self::Yearly {
                day_of_month,
                month,
            } => date.day() == day_of_month && date.month() == month,
        }
    }
}

fn check_day_of_month(day: u32) -> Result<u32, ValidationError> {
    if (1..=31).contains(&day) {
        Ok(day)
    } else {
        Err(ValidationError::DayOfMonthOutOfRange(day))
    }
}
