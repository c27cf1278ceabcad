use std::collections::BTreeMap;

use async_trait::async_trait;
use dailynote_models::{
    alarm::{Alarm, AlarmTime, DEFAULT_DURATION_SECS, DEFAULT_VOLUME, DueAlarm},
    chrono::NaiveDate,
    fixed_note::{FixedNote, FixedNoteId},
    note::{Note, NoteId},
};
use tokio::sync::RwLock;

use crate::{AlarmStore, NewFixedNote, NewNote, NoteStore, StorageError};

#[derive(Default)]
struct MemoryState {
    last_note_id: NoteId,
    notes: BTreeMap<NoteId, Note>,
    alarms: BTreeMap<NoteId, Alarm>,
    last_fixed_note_id: FixedNoteId,
    fixed_notes: BTreeMap<FixedNoteId, FixedNote>,
}

/// Store kept entirely in memory. Ids start at 1, like SQLite rowids.
#[derive(Default)]
pub struct InMemoryStore {
    store: RwLock<MemoryState>,
}

impl InMemoryStore {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl AlarmStore for InMemoryStore {
    async fn load_due_alarms(&self, date: NaiveDate) -> Result<Vec<DueAlarm>, StorageError> {
        let store = self.store.read().await;
        let due = store
            .alarms
            .values()
            .filter_map(|alarm| {
                store
                    .notes
                    .get(&alarm.note_id)
                    .filter(|note| note.date == date)
                    .map(|note| DueAlarm {
                        note: note.clone(),
                        alarm: alarm.clone(),
                    })
            })
            .collect();

        Ok(due)
    }

    async fn load_fixed_notes(&self) -> Result<Vec<FixedNote>, StorageError> {
        let store = self.store.read().await;
        Ok(store.fixed_notes.values().cloned().collect())
    }

    async fn delete_alarm(&self, note_id: NoteId) -> Result<(), StorageError> {
        self.store.write().await.alarms.remove(&note_id);
        Ok(())
    }

    async fn upsert_alarm_time(
        &self,
        note_id: NoteId,
        time: AlarmTime,
    ) -> Result<(), StorageError> {
        let mut store = self.store.write().await;
        if !store.notes.contains_key(&note_id) {
            return Err(StorageError::NoteNotFound(note_id));
        }
        store
            .alarms
            .entry(note_id)
            .and_modify(|alarm| alarm.time = time)
            .or_insert_with(|| Alarm {
                note_id,
                sound: None,
                volume: DEFAULT_VOLUME,
                duration_secs: DEFAULT_DURATION_SECS,
                time,
            });
        Ok(())
    }
}

#[async_trait]
impl NoteStore for InMemoryStore {
    async fn insert_note(&self, note: NewNote) -> Result<Note, StorageError> {
        let mut store = self.store.write().await;
        store.last_note_id += 1;
        let note = Note {
            id: store.last_note_id,
            title: note.title,
            content: note.content,
            date: note.date,
        };
        store.notes.insert(note.id, note.clone());
        Ok(note)
    }

    async fn update_note(&self, note: Note) -> Result<Note, StorageError> {
        let mut store = self.store.write().await;
        match store.notes.get_mut(&note.id) {
            Some(existing) => {
                *existing = note.clone();
                Ok(note)
            }
            None => Err(StorageError::NoteNotFound(note.id)),
        }
    }

    async fn get_note(&self, id: NoteId) -> Result<Option<Note>, StorageError> {
        Ok(self.store.read().await.notes.get(&id).cloned())
    }

    async fn list_notes_on(&self, date: NaiveDate) -> Result<Vec<Note>, StorageError> {
        let store = self.store.read().await;
        Ok(store
            .notes
            .values()
            .filter(|note| note.date == date)
            .cloned()
            .collect())
    }

    async fn delete_note(&self, id: NoteId) -> Result<(), StorageError> {
        let mut store = self.store.write().await;
        store.notes.remove(&id);
        store.alarms.remove(&id);
        Ok(())
    }

    async fn save_alarm(&self, alarm: Alarm) -> Result<(), StorageError> {
        let mut store = self.store.write().await;
        if !store.notes.contains_key(&alarm.note_id) {
            return Err(StorageError::NoteNotFound(alarm.note_id));
        }
        store.alarms.insert(alarm.note_id, alarm);
        Ok(())
    }

    async fn get_alarm(&self, note_id: NoteId) -> Result<Option<Alarm>, StorageError> {
        Ok(self.store.read().await.alarms.get(&note_id).cloned())
    }

    async fn list_alarms(&self) -> Result<Vec<Alarm>, StorageError> {
        Ok(self.store.read().await.alarms.values().cloned().collect())
    }

    async fn insert_fixed_note(&self, note: NewFixedNote) -> Result<FixedNote, StorageError> {
        let mut store = self.store.write().await;
        store.last_fixed_note_id += 1;
        let note = FixedNote {
            id: store.last_fixed_note_id,
            title: note.title,
            content: note.content,
            alarm_enabled: note.alarm_enabled,
            time: note.time,
            rule: note.rule,
        };
        store.fixed_notes.insert(note.id, note.clone());
        Ok(note)
    }

    async fn update_fixed_note(&self, note: FixedNote) -> Result<FixedNote, StorageError> {
        let mut store = self.store.write().await;
        match store.fixed_notes.get_mut(&note.id) {
            Some(existing) => {
                *existing = note.clone();
                Ok(note)
            }
            None => Err(StorageError::FixedNoteNotFound(note.id)),
        }
    }

    async fn set_fixed_alarm_enabled(
        &self,
        id: FixedNoteId,
        enabled: bool,
    ) -> Result<(), StorageError> {
        let mut store = self.store.write().await;
        let note = store
            .fixed_notes
            .get_mut(&id)
            .ok_or(StorageError::FixedNoteNotFound(id))?;
        note.alarm_enabled = enabled;
        Ok(())
    }

    async fn delete_fixed_note(&self, id: FixedNoteId) -> Result<(), StorageError> {
        self.store.write().await.fixed_notes.remove(&id);
        Ok(())
    }
}
