use dailynote_models::{error::ValidationError, fixed_note::FixedNoteId, note::NoteId};
use thiserror::Error;

#[derive(Debug, Error)]
pub enum StorageError {
    #[error(transparent)]
    Sqlx(#[from] sqlx::Error),

    #[error(transparent)]
    Validation(#[from] ValidationError),

    #[error("Note {0} does not exist")]
    NoteNotFound(NoteId),

    #[error("Fixed note {0} does not exist")]
    FixedNoteNotFound(FixedNoteId),
}
