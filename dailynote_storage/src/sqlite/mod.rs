//! SQLite persistence over three tables: `notes`,
//! `alarms` keyed by note id, and `fixed_notes` with loose rule columns.

mod model;

use std::str::FromStr;

use async_trait::async_trait;
use dailynote_models::{
    alarm::{Alarm, AlarmTime, DEFAULT_DURATION_SECS, DEFAULT_VOLUME, DueAlarm},
    chrono::NaiveDate,
    fixed_note::{FixedNote, FixedNoteId},
    note::{Note, NoteId},
};
use sqlx::{
    SqlitePool,
    sqlite::{SqliteConnectOptions, SqlitePoolOptions},
};

use crate::{AlarmStore, NewFixedNote, NewNote, NoteStore, StorageError};
use model::{
    AlarmStorageModel, DueAlarmStorageModel, FixedNoteStorageModel, NoteStorageModel,
    RuleColumns,
};

const SCHEMA: [&str; 3] = [
    "CREATE TABLE IF NOT EXISTS notes (
        id INTEGER PRIMARY KEY AUTOINCREMENT,
        title TEXT NOT NULL,
        content TEXT,
        date TEXT NOT NULL
    )",
    "CREATE TABLE IF NOT EXISTS alarms (
        note_id INTEGER PRIMARY KEY,
        sound TEXT,
        volume INTEGER,
        duration INTEGER,
        time TEXT,
        FOREIGN KEY(note_id) REFERENCES notes(id)
    )",
    "CREATE TABLE IF NOT EXISTS fixed_notes (
        id INTEGER PRIMARY KEY AUTOINCREMENT,
        title TEXT NOT NULL,
        content TEXT,
        event_time TEXT,
        alarm_enabled INTEGER NOT NULL DEFAULT 0,
        alarm_days TEXT,
        sound TEXT,
        volume INTEGER,
        repeat_type TEXT DEFAULT 'weekly',
        repeat_day INTEGER,
        repeat_month INTEGER
    )",
];

const FIXED_NOTE_COLUMNS: &str = "id, title, content, event_time, alarm_enabled, alarm_days, repeat_type, repeat_day, repeat_month";

pub async fn connect(url: &str) -> Result<SqlitePool, StorageError> {
    let options = SqliteConnectOptions::from_str(url)?.create_if_missing(true);
    let pool = SqlitePoolOptions::new().connect_with(options).await?;
    migrate(&pool).await?;
    Ok(pool)
}

/// Single-connection pool over a private in-memory database.
pub async fn connect_in_memory() -> Result<SqlitePool, StorageError> {
    let pool = SqlitePoolOptions::new()
        .max_connections(1)
        .idle_timeout(None)
        .max_lifetime(None)
        .connect("sqlite::memory:")
        .await?;
    migrate(&pool).await?;
    Ok(pool)
}

pub async fn migrate(pool: &SqlitePool) -> Result<(), StorageError> {
    for statement in SCHEMA {
        sqlx::query(statement).execute(pool).await?;
    }
    Ok(())
}

pub struct SqliteStore {
    pool: SqlitePool,
}

impl SqliteStore {
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl AlarmStore for SqliteStore {
    async fn load_due_alarms(&self, date: NaiveDate) -> Result<Vec<DueAlarm>, StorageError> {
        let rows = sqlx::query_as::<_, DueAlarmStorageModel>(
            "
SELECT n.id, n.title, n.content, n.date, a.sound, a.volume, a.duration, a.time
FROM notes n
JOIN alarms a ON a.note_id = n.id
WHERE n.date = ?
ORDER BY n.id
",
        )
        .bind(date)
        .fetch_all(&self.pool)
        .await?;

        Ok(rows
            .into_iter()
            .filter_map(|row| {
                let id = row.id;
                DueAlarm::try_from(row)
                    .inspect_err(|e| log::warn!("Skipping alarm of note {id}: {e}"))
                    .ok()
            })
            .collect())
    }

    async fn load_fixed_notes(&self) -> Result<Vec<FixedNote>, StorageError> {
        let rows = sqlx::query_as::<_, FixedNoteStorageModel>(&format!(
            "SELECT {FIXED_NOTE_COLUMNS} FROM fixed_notes ORDER BY id"
        ))
        .fetch_all(&self.pool)
        .await?;

        Ok(rows
            .into_iter()
            .filter_map(|row| {
                let id = row.id;
                FixedNote::try_from(row)
                    .inspect_err(|e| log::warn!("Excluding fixed note {id} from scanning: {e}"))
                    .ok()
            })
            .collect())
    }

    async fn delete_alarm(&self, note_id: NoteId) -> Result<(), StorageError> {
        sqlx::query("DELETE FROM alarms WHERE note_id = ?")
            .bind(note_id)
            .execute(&self.pool)
            .await?;
        Ok(())
    }

    async fn upsert_alarm_time(
        &self,
        note_id: NoteId,
        time: AlarmTime,
    ) -> Result<(), StorageError> {
        let result = sqlx::query(
            "
INSERT INTO alarms (note_id, sound, volume, duration, time)
SELECT id, NULL, ?, ?, ? FROM notes WHERE id = ?
ON CONFLICT(note_id) DO UPDATE SET time = excluded.time
",
        )
        .bind(i64::from(DEFAULT_VOLUME))
        .bind(i64::from(DEFAULT_DURATION_SECS))
        .bind(time.to_string())
        .bind(note_id)
        .execute(&self.pool)
        .await?;

        if result.rows_affected() == 0 {
            return Err(StorageError::NoteNotFound(note_id));
        }
        Ok(())
    }
}

#[async_trait]
impl NoteStore for SqliteStore {
    async fn insert_note(&self, note: NewNote) -> Result<Note, StorageError> {
        let NewNote {
            title,
            content,
            date,
        } = note;
        let created = sqlx::query_as::<_, NoteStorageModel>(
            "INSERT INTO notes (title, content, date) VALUES (?, ?, ?) RETURNING id, title, content, date",
        )
        .bind(title)
        .bind(content)
        .bind(date)
        .fetch_one(&self.pool)
        .await?;

        Ok(created.into())
    }

    async fn update_note(&self, note: Note) -> Result<Note, StorageError> {
        let Note {
            id,
            title,
            content,
            date,
        } = note;
        let updated = sqlx::query_as::<_, NoteStorageModel>(
            "
UPDATE notes
SET title = ?,
    content = ?,
    date = ?
WHERE id = ?
RETURNING id, title, content, date
",
        )
        .bind(title)
        .bind(content)
        .bind(date)
        .bind(id)
        .fetch_optional(&self.pool)
        .await?
        .ok_or(StorageError::NoteNotFound(id))?;

        Ok(updated.into())
    }

    async fn get_note(&self, id: NoteId) -> Result<Option<Note>, StorageError> {
        let note = sqlx::query_as::<_, NoteStorageModel>(
            "SELECT id, title, content, date FROM notes WHERE id = ?",
        )
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;

        Ok(note.map(Into::into))
    }

    async fn list_notes_on(&self, date: NaiveDate) -> Result<Vec<Note>, StorageError> {
        let notes = sqlx::query_as::<_, NoteStorageModel>(
            "SELECT id, title, content, date FROM notes WHERE date = ? ORDER BY id",
        )
        .bind(date)
        .fetch_all(&self.pool)
        .await?;

        Ok(notes.into_iter().map(Into::into).collect())
    }

    async fn delete_note(&self, id: NoteId) -> Result<(), StorageError> {
        let mut tx = self.pool.begin().await?;
        sqlx::query("DELETE FROM alarms WHERE note_id = ?")
            .bind(id)
            .execute(&mut *tx)
            .await?;
        sqlx::query("DELETE FROM notes WHERE id = ?")
            .bind(id)
            .execute(&mut *tx)
            .await?;
        tx.commit().await?;
        Ok(())
    }

    async fn save_alarm(&self, alarm: Alarm) -> Result<(), StorageError> {
        if self.get_note(alarm.note_id).await?.is_none() {
            return Err(StorageError::NoteNotFound(alarm.note_id));
        }

        sqlx::query(
            "INSERT OR REPLACE INTO alarms (note_id, sound, volume, duration, time) VALUES (?, ?, ?, ?, ?)",
        )
        .bind(alarm.note_id)
        .bind(alarm.sound)
        .bind(i64::from(alarm.volume))
        .bind(i64::from(alarm.duration_secs))
        .bind(alarm.time.to_string())
        .execute(&self.pool)
        .await?;
        Ok(())
    }

    async fn get_alarm(&self, note_id: NoteId) -> Result<Option<Alarm>, StorageError> {
        let alarm = sqlx::query_as::<_, AlarmStorageModel>(
            "SELECT note_id, sound, volume, duration, time FROM alarms WHERE note_id = ?",
        )
        .bind(note_id)
        .fetch_optional(&self.pool)
        .await?;

        Ok(alarm.map(Alarm::try_from).transpose()?)
    }

    async fn list_alarms(&self) -> Result<Vec<Alarm>, StorageError> {
        let alarms = sqlx::query_as::<_, AlarmStorageModel>(
            "SELECT note_id, sound, volume, duration, time FROM alarms ORDER BY note_id",
        )
        .fetch_all(&self.pool)
        .await?;

        Ok(alarms
            .into_iter()
            .filter_map(|row| {
                let note_id = row.note_id;
                Alarm::try_from(row)
                    .inspect_err(|e| log::warn!("Skipping alarm of note {note_id}: {e}"))
                    .ok()
            })
            .collect())
    }

    async fn insert_fixed_note(&self, note: NewFixedNote) -> Result<FixedNote, StorageError> {
        let columns = RuleColumns::from(&note.rule);
        let created = sqlx::query_as::<_, FixedNoteStorageModel>(&format!(
            "
INSERT INTO fixed_notes (title, content, event_time, alarm_enabled, alarm_days, repeat_type, repeat_day, repeat_month)
VALUES (?, ?, ?, ?, ?, ?, ?, ?)
RETURNING {FIXED_NOTE_COLUMNS}
"
        ))
        .bind(note.title)
        .bind(note.content)
        .bind(note.time.map(|t| t.to_string()))
        .bind(note.alarm_enabled)
        .bind(columns.alarm_days)
        .bind(columns.repeat_type)
        .bind(columns.repeat_day)
        .bind(columns.repeat_month)
        .fetch_one(&self.pool)
        .await?;

        Ok(created.try_into()?)
    }

    async fn update_fixed_note(&self, note: FixedNote) -> Result<FixedNote, StorageError> {
        let columns = RuleColumns::from(&note.rule);
        let updated = sqlx::query_as::<_, FixedNoteStorageModel>(&format!(
            "
UPDATE fixed_notes
SET title = ?,
    content = ?,
    event_time = ?,
    alarm_enabled = ?,
    alarm_days = ?,
    repeat_type = ?,
    repeat_day = ?,
    repeat_month = ?
WHERE id = ?
RETURNING {FIXED_NOTE_COLUMNS}
"
        ))
        .bind(note.title)
        .bind(note.content)
        .bind(note.time.map(|t| t.to_string()))
        .bind(note.alarm_enabled)
        .bind(columns.alarm_days)
        .bind(columns.repeat_type)
        .bind(columns.repeat_day)
        .bind(columns.repeat_month)
        .bind(note.id)
        .fetch_optional(&self.pool)
        .await?
        .ok_or(StorageError::FixedNoteNotFound(note.id))?;

        Ok(updated.try_into()?)
    }

    async fn set_fixed_alarm_enabled(
        &self,
        id: FixedNoteId,
        enabled: bool,
    ) -> Result<(), StorageError> {
        let result = sqlx::query("UPDATE fixed_notes SET alarm_enabled = ? WHERE id = ?")
            .bind(enabled)
            .bind(id)
            .execute(&self.pool)
            .await?;

        if result.rows_affected() == 0 {
            return Err(StorageError::FixedNoteNotFound(id));
        }
        Ok(())
    }

    async fn delete_fixed_note(&self, id: FixedNoteId) -> Result<(), StorageError> {
        sqlx::query("DELETE FROM fixed_notes WHERE id = ?")
            .bind(id)
            .execute(&self.pool)
            .await?;
        Ok(())
    }
}
