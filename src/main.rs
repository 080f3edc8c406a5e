//! Binary entry point: load the configuration, start file logging, open the
//! lesson store, and drive the Ratatui event loop until the user exits.
use anyhow::Context;
use chrono::{Local, Timelike};
use lesson_check_in::logging::init_logging;
use lesson_check_in::{default_db_path, lesson_day_for, open_store, run_app, App, Config};
use log::info;

/// Start-up failures (unreadable config, unwritable data directory, broken
/// terminal) are the only errors that end the process; everything after that
/// is reported inside the UI.
fn main() -> anyhow::Result<()> {
    let config = Config::load().context("failed to load configuration")?;
    let log_dir = config.resolved_log_dir()?;
    let _logger = init_logging(&config.log_level, &log_dir)?;

    let db_path = match config.database.clone() {
        Some(path) => path,
        None => default_db_path()?,
    };
    let conn = open_store(&db_path)
        .with_context(|| format!("failed to open lesson store at {}", db_path.display()))?;

    let now = Local::now();
    let today = lesson_day_for(now.date_naive());
    let default_time = now
        .time()
        .with_second(0)
        .and_then(|time| time.with_nanosecond(0))
        .unwrap_or_else(|| now.time());
    info!("event=app_ready module=core status=ok today={today}");

    let mut app = App::new(conn, today).with_default_time(default_time);
    let result = run_app(&mut app);
    if let Err(err) = &result {
        log::error!("event=app_exit module=core status=error error={err:#}");
    }
    result
}
