use std::fs;
use std::path::{Path, PathBuf};
use std::time::Instant;

use directories::BaseDirs;
use log::{error, info};
use rusqlite::Connection;

use super::migrations::apply_migrations;
use super::{StoreError, StoreResult};

/// Folder name used beneath the user's home directory for application data.
pub const DATA_DIR_NAME: &str = ".lesson-check-in";
/// SQLite file name stored inside the application data directory.
const DB_FILE_NAME: &str = "lessons.sqlite";

/// Open (creating if needed) the lesson database at `path`, apply pending
/// migrations, and return a live connection. The connection is meant to stay
/// open for the whole process.
pub fn open_store(path: impl AsRef<Path>) -> StoreResult<Connection> {
    let path = path.as_ref();
    let started_at = Instant::now();
    info!(
        "event=db_open module=db status=start mode=file path={}",
        path.display()
    );

    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        fs::create_dir_all(parent)?;
    }

    let result = bootstrap(Connection::open(path));
    log_open("file", started_at, &result);
    result
}

/// Same as [`open_store`] but backed by memory. Used by tests.
pub fn open_store_in_memory() -> StoreResult<Connection> {
    let started_at = Instant::now();
    info!("event=db_open module=db status=start mode=memory");

    let result = bootstrap(Connection::open_in_memory());
    log_open("memory", started_at, &result);
    result
}

/// Resolve the default database location inside the user's home.
pub fn default_db_path() -> StoreResult<PathBuf> {
    let base_dirs = BaseDirs::new().ok_or(StoreError::NoHomeDir)?;
    Ok(base_dirs.home_dir().join(DATA_DIR_NAME).join(DB_FILE_NAME))
}

fn bootstrap(opened: rusqlite::Result<Connection>) -> StoreResult<Connection> {
    let mut conn = opened?;
    conn.execute_batch("PRAGMA foreign_keys = ON;")?;
    apply_migrations(&mut conn)?;
    Ok(conn)
}

fn log_open(mode: &str, started_at: Instant, result: &StoreResult<Connection>) {
    let duration_ms = started_at.elapsed().as_millis();
    match result {
        Ok(_) => info!("event=db_open module=db status=ok mode={mode} duration_ms={duration_ms}"),
        Err(err) => error!(
            "event=db_open module=db status=error mode={mode} duration_ms={duration_ms} error={err}"
        ),
    }
}
