//! Ratatui front-end: two list views (today, all lessons) and the modal
//! add / edit / delete dialogs layered on top of them.

mod app;
mod forms;
mod helpers;
mod screens;
mod terminal;

pub use app::App;
pub use terminal::run_app;
