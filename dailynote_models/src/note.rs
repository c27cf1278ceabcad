use chrono::NaiveDate;

pub type NoteId = i64;

/// One-time dated note. Owns at most one alarm.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Note {
    pub id: NoteId,
    pub title: String,
    pub content: String,
    pub date: NaiveDate,
}
