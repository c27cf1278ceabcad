use async_trait::async_trait;
use dailynote_models::{
    alarm::{Alarm, AlarmTime, DueAlarm},
    chrono::NaiveDate,
    fixed_note::{FixedNote, FixedNoteId},
    note::{Note, NoteId},
    recurrence::RecurrenceRule,
};

use crate::StorageError;

pub struct NewNote {
    pub title: String,
    pub content: String,
    pub date: NaiveDate,
}

pub struct NewFixedNote {
    pub title: String,
    pub content: String,
    pub alarm_enabled: bool,
    pub time: Option<AlarmTime>,
    pub rule: RecurrenceRule,
}

/// What the scheduler needs from persistence.
///
/// Rows that fail validation are left out of the loaded sets instead of
/// failing the whole load.
#[async_trait]
pub trait AlarmStore: Send + Sync {
    /// Alarms of notes dated `date`, ordered by note id.
    async fn load_due_alarms(&self, date: NaiveDate) -> Result<Vec<DueAlarm>, StorageError>;
    /// All valid fixed notes, ordered by id.
    async fn load_fixed_notes(&self) -> Result<Vec<FixedNote>, StorageError>;
    async fn delete_alarm(&self, note_id: NoteId) -> Result<(), StorageError>;
    /// Atomic by note id: rewrites the time of an existing alarm, or creates
    /// one with default sound settings. Fails with `NoteNotFound` when the note
    /// is gone.
    async fn upsert_alarm_time(&self, note_id: NoteId, time: AlarmTime)
    -> Result<(), StorageError>;
}

/// Editing surface used by the presentation layer.
#[async_trait]
pub trait NoteStore: Send + Sync {
    async fn insert_note(&self, note: NewNote) -> Result<Note, StorageError>;
    async fn update_note(&self, note: Note) -> Result<Note, StorageError>;
    async fn get_note(&self, id: NoteId) -> Result<Option<Note>, StorageError>;
    async fn list_notes_on(&self, date: NaiveDate) -> Result<Vec<Note>, StorageError>;
    /// Deletes the note and its alarm.
    async fn delete_note(&self, id: NoteId) -> Result<(), StorageError>;

    /// Insert or replace the alarm of an existing note.
    async fn save_alarm(&self, alarm: Alarm) -> Result<(), StorageError>;
    async fn get_alarm(&self, note_id: NoteId) -> Result<Option<Alarm>, StorageError>;
    async fn list_alarms(&self) -> Result<Vec<Alarm>, StorageError>;

    async fn insert_fixed_note(&self, note: NewFixedNote) -> Result<FixedNote, StorageError>;
    async fn update_fixed_note(&self, note: FixedNote) -> Result<FixedNote, StorageError>;
    async fn set_fixed_alarm_enabled(
        &self,
        id: FixedNoteId,
        enabled: bool,
    ) -> Result<(), StorageError>;
    async fn delete_fixed_note(&self, id: FixedNoteId) -> Result<(), StorageError>;
}
