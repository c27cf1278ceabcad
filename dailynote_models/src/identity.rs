use std::{fmt, num::ParseIntError, str::FromStr};

use crate::{fixed_note::FixedNoteId, note::NoteId};

const RECURRING_PREFIX: &str = "recurring:";

/// Identity of something that can ring. One-time alarms and fixed notes live
/// in separate id spaces; ordering puts one-time identities first.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum AlarmIdentity {
    OneTime(NoteId),
    Recurring(FixedNoteId),
}

impl fmt::Display for AlarmIdentity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::OneTime(id) => write!(f, "{id}"),
            Self::Recurring(id) => write!(f, "{RECURRING_PREFIX}{id}"),
        }
    }
}

impl FromStr for AlarmIdentity {
    type Err = ParseIntError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let s = s.trim();
        match s.strip_prefix(RECURRING_PREFIX) {
            Some(id) => Ok(Self::Recurring(id.parse()?)),
            None => Ok(Self::OneTime(s.parse()?)),
        }
    }
}
