//! Core library surface for the Lesson Check-In TUI: a weekly lesson
//! schedule with a per-lesson presence toggle and absence counter, persisted
//! in an embedded SQLite store.
pub mod config;
pub mod db;
pub mod logging;
pub mod models;
pub mod ui;

/// Persistence entry points used by `main.rs` and the integration tests.
pub use db::{
    default_db_path, delete_lesson, fetch_all_lessons, fetch_lesson, fetch_lessons_for_day,
    insert_lesson, open_store, open_store_in_memory, query_lessons, save_lesson, StoreError,
    StoreResult,
};

pub use config::Config;
pub use models::{day_name, lesson_day_for, lesson_day_from_calendar_index, Lesson};

/// The interactive application entry point and state container.
pub use ui::{run_app, App};
