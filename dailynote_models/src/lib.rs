pub use chrono;

pub mod alarm;
pub mod error;
pub mod fixed_note;
pub mod identity;
pub mod note;
pub mod recurrence;
pub mod settings;
