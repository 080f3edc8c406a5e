//! Persistence module split across logical submodules.

mod connection;
mod lessons;
pub mod migrations;

use thiserror::Error;
use uuid::Uuid;

pub use connection::{default_db_path, open_store, open_store_in_memory, DATA_DIR_NAME};
pub use lessons::{
    delete_lesson, fetch_all_lessons, fetch_lesson, fetch_lessons_for_day, insert_lesson,
    query_lessons, save_lesson,
};

pub type StoreResult<T> = Result<T, StoreError>;

/// Failures surfaced by the lesson store. None of them are fatal to the UI;
/// callers report them and keep running.
#[derive(Debug, Error)]
pub enum StoreError {
    #[error("database error: {0}")]
    Sqlite(#[from] rusqlite::Error),

    #[error("stored lesson has an invalid {field}: {value}")]
    InvalidRecord { field: &'static str, value: String },

    #[error("lesson {0} not found")]
    NotFound(Uuid),

    #[error("database schema version {db_version} is newer than supported {latest_supported}")]
    UnsupportedSchemaVersion {
        db_version: u32,
        latest_supported: u32,
    },

    #[error("could not locate home directory")]
    NoHomeDir,

    #[error("failed to create data directory: {0}")]
    DataDir(#[from] std::io::Error),
}
