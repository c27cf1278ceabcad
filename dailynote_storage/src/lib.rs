mod error;
mod memory;
mod store;
pub mod sqlite;

pub use error::StorageError;
pub use memory::InMemoryStore;
pub use store::{AlarmStore, NewFixedNote, NewNote, NoteStore};
