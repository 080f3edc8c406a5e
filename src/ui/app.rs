use std::mem;

use anyhow::{anyhow, Context, Result};
use chrono::NaiveTime;
use crossterm::event::KeyCode;
use log::{error, warn};
use ratatui::layout::{Alignment, Constraint, Direction, Layout, Rect};
use ratatui::prelude::*;
use ratatui::text::{Line, Span};
use ratatui::widgets::{Block, Borders, Clear, Paragraph, Wrap};
use ratatui::Frame;
use rusqlite::Connection;
use uuid::Uuid;

use crate::db::{
    delete_lesson, fetch_all_lessons, fetch_lessons_for_day, insert_lesson, save_lesson,
};
use crate::models::{day_name, Lesson};

use super::forms::{ConfirmLessonDelete, LessonField, LessonForm};
use super::helpers::{centered_rect, lesson_card_lines, surface_error, visible_start, CardKind};
use super::screens::LessonList;

/// Footer space reserved for status messages and instructions.
const FOOTER_HEIGHT: u16 = 3;
/// Header space holding the view title.
const HEADER_HEIGHT: u16 = 3;
/// Card heights per view; the overview card carries two extra lines.
const TODAY_CARD_HEIGHT: u16 = 5;
const OVERVIEW_CARD_HEIGHT: u16 = 6;
/// Rows skipped by PageUp / PageDown.
const PAGE_STEP: isize = 5;

/// Pre-filled time of the add form when none is supplied.
fn default_form_time() -> NaiveTime {
    NaiveTime::from_hms_opt(9, 0, 0).unwrap_or(NaiveTime::MIN)
}

/// Parsed name, day and time from a lesson form.
type FormValues = (String, i64, NaiveTime);

/// Top-level views.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
enum Screen {
    Today,
    AllLessons,
}

/// Modal state layered over the current screen.
enum Mode {
    Normal,
    AddingLesson(LessonForm),
    EditingLesson { id: Uuid, form: LessonForm },
    ConfirmDelete(ConfirmLessonDelete),
}

/// Holds the footer message text plus its severity.
struct StatusMessage {
    text: String,
    kind: StatusKind,
}

/// Severity levels shown in the footer.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
enum StatusKind {
    Info,
    Error,
}

impl StatusKind {
    fn style(self) -> Style {
        match self {
            StatusKind::Info => Style::default().fg(Color::Green),
            StatusKind::Error => Style::default().fg(Color::Red),
        }
    }
}

/// Central application state. Owns the store connection for the lifetime of
/// the process; the two lists are views over it and are reloaded after every
/// mutation.
pub struct App {
    conn: Connection,
    today: i64,
    default_time: NaiveTime,
    today_lessons: LessonList,
    all_lessons: LessonList,
    screen: Screen,
    mode: Mode,
    status: Option<StatusMessage>,
}

impl App {
    /// Build the app and load both views. `today` is the lesson day (1 =
    /// Monday … 7 = Sunday) the "today" view filters on. A store that cannot
    /// be read starts the app with empty views and the error in the footer.
    pub fn new(conn: Connection, today: i64) -> Self {
        let mut app = Self {
            conn,
            today,
            default_time: default_form_time(),
            today_lessons: LessonList::default(),
            all_lessons: LessonList::default(),
            screen: Screen::Today,
            mode: Mode::Normal,
            status: None,
        };
        if let Err(err) = app.reload_lessons(None) {
            error!("event=lessons_load module=ui status=error error={err:#}");
            app.set_status(
                format!("Could not load lessons: {}", surface_error(&err)),
                StatusKind::Error,
            );
        }
        app
    }

    /// Time pre-filled in the add form.
    pub fn with_default_time(mut self, time: NaiveTime) -> Self {
        self.default_time = time;
        self
    }

    /// Dispatch a key press. Returns `true` when the user asked to quit.
    pub fn handle_key(&mut self, code: KeyCode) -> Result<bool> {
        let mut exit = false;
        let mode = mem::replace(&mut self.mode, Mode::Normal);

        self.mode = match mode {
            Mode::Normal => self.handle_normal_key(code, &mut exit),
            Mode::AddingLesson(form) => self.handle_add_lesson(code, form),
            Mode::EditingLesson { id, form } => self.handle_edit_lesson(code, id, form),
            Mode::ConfirmDelete(confirm) => self.handle_confirm_delete(code, confirm),
        };

        Ok(exit)
    }

    fn handle_normal_key(&mut self, code: KeyCode, exit: &mut bool) -> Mode {
        match (self.screen, code) {
            (_, KeyCode::Char('q')) => *exit = true,
            (_, KeyCode::Up) => self.current_list_mut().move_selection(-1),
            (_, KeyCode::Down) => self.current_list_mut().move_selection(1),
            (_, KeyCode::PageUp) => self.current_list_mut().move_selection(-PAGE_STEP),
            (_, KeyCode::PageDown) => self.current_list_mut().move_selection(PAGE_STEP),
            (_, KeyCode::Home) => self.current_list_mut().select_first(),
            (_, KeyCode::End) => self.current_list_mut().select_last(),
            (_, KeyCode::Char('+')) => {
                self.clear_status();
                return Mode::AddingLesson(LessonForm::new(self.default_time));
            }
            (Screen::Today, KeyCode::Char(' ') | KeyCode::Enter) => self.toggle_current(),
            (Screen::Today, KeyCode::Char('l') | KeyCode::Char('L')) => {
                self.clear_status();
                self.screen = Screen::AllLessons;
            }
            (Screen::AllLessons, KeyCode::Esc | KeyCode::Char('l') | KeyCode::Char('L')) => {
                self.clear_status();
                self.screen = Screen::Today;
            }
            (Screen::AllLessons, KeyCode::Enter | KeyCode::Char('e') | KeyCode::Char('E')) => {
                match self.all_lessons.current() {
                    Some(lesson) => {
                        let id = lesson.id;
                        let form = LessonForm::from_lesson(lesson);
                        self.clear_status();
                        return Mode::EditingLesson { id, form };
                    }
                    None => self.set_status("No lesson selected to edit.", StatusKind::Error),
                }
            }
            (Screen::AllLessons, KeyCode::Char('-') | KeyCode::Delete) => {
                match self.all_lessons.current() {
                    Some(lesson) => {
                        let confirm = ConfirmLessonDelete::from(lesson);
                        self.clear_status();
                        return Mode::ConfirmDelete(confirm);
                    }
                    None => self.set_status("No lesson selected to delete.", StatusKind::Error),
                }
            }
            _ => {}
        }
        Mode::Normal
    }

    fn handle_add_lesson(&mut self, code: KeyCode, mut form: LessonForm) -> Mode {
        match code {
            KeyCode::Esc => {
                self.set_status("Add lesson cancelled.", StatusKind::Info);
                return Mode::Normal;
            }
            KeyCode::Enter => match form.parse_inputs() {
                Ok(values) => match self.save_new_lesson(values) {
                    Ok(()) => return Mode::Normal,
                    Err(err) => self.report_form_error("add", &mut form, &err),
                },
                Err(err) => self.reject_input(&mut form, &err),
            },
            _ => edit_form(&mut form, code),
        }
        Mode::AddingLesson(form)
    }

    fn handle_edit_lesson(&mut self, code: KeyCode, id: Uuid, mut form: LessonForm) -> Mode {
        match code {
            KeyCode::Esc => {
                self.set_status("Edit cancelled.", StatusKind::Info);
                return Mode::Normal;
            }
            KeyCode::Enter => match form.parse_inputs() {
                Ok(values) => match self.save_existing_lesson(id, values) {
                    Ok(()) => return Mode::Normal,
                    Err(err) => self.report_form_error("edit", &mut form, &err),
                },
                Err(err) => self.reject_input(&mut form, &err),
            },
            _ => edit_form(&mut form, code),
        }
        Mode::EditingLesson { id, form }
    }

    fn handle_confirm_delete(&mut self, code: KeyCode, confirm: ConfirmLessonDelete) -> Mode {
        match code {
            KeyCode::Esc | KeyCode::Char('n') | KeyCode::Char('N') => {
                self.set_status("Deletion cancelled.", StatusKind::Info);
                Mode::Normal
            }
            KeyCode::Enter | KeyCode::Char('y') | KeyCode::Char('Y') => {
                match self.perform_delete(&confirm) {
                    Ok(()) => Mode::Normal,
                    Err(err) => {
                        self.report_error("delete", &err);
                        Mode::ConfirmDelete(confirm)
                    }
                }
            }
            _ => Mode::ConfirmDelete(confirm),
        }
    }

    /// Toggle presence on the selected lesson of today's view. The change is
    /// applied to a copy and only shows up after the store accepted it.
    fn toggle_current(&mut self) {
        let Some(mut lesson) = self.today_lessons.current().cloned() else {
            self.set_status("No lesson selected.", StatusKind::Error);
            return;
        };
        lesson.toggle_presence();

        match save_lesson(&self.conn, &lesson).context("failed to save attendance") {
            Ok(()) => {
                let (id, message) = (
                    lesson.id,
                    format!("{} marked {}.", lesson.name, lesson.presence_label()),
                );
                self.apply_saved(lesson);
                self.refresh_after_commit("toggle", Some(id), message);
            }
            Err(err) => self.report_error("toggle", &err),
        }
    }

    fn save_new_lesson(&mut self, (name, day, time): FormValues) -> Result<()> {
        let lesson = Lesson::new(name, day, time);
        insert_lesson(&self.conn, &lesson).context("failed to add lesson")?;
        let (id, message) = (
            lesson.id,
            format!("Added {} on {}.", lesson.name, day_name(lesson.day)),
        );
        self.apply_saved(lesson);
        self.refresh_after_commit("add", Some(id), message);
        Ok(())
    }

    /// Apply the form to a copy of the stored lesson and persist it. The lists
    /// keep showing the old values until the save succeeds.
    fn save_existing_lesson(&mut self, id: Uuid, (name, day, time): FormValues) -> Result<()> {
        let mut lesson = self
            .all_lessons
            .lessons
            .iter()
            .find(|lesson| lesson.id == id)
            .cloned()
            .ok_or_else(|| anyhow!("Lesson no longer exists."))?;
        lesson.update(name, day, time);
        save_lesson(&self.conn, &lesson).context("failed to save lesson")?;
        let message = format!("Updated {}.", lesson.name);
        self.apply_saved(lesson);
        self.refresh_after_commit("edit", Some(id), message);
        Ok(())
    }

    fn perform_delete(&mut self, confirm: &ConfirmLessonDelete) -> Result<()> {
        delete_lesson(&self.conn, confirm.id).context("failed to delete lesson")?;
        self.today_lessons.remove(confirm.id);
        self.all_lessons.remove(confirm.id);
        self.refresh_after_commit("delete", None, format!("Deleted {}.", confirm.name));
        Ok(())
    }

    /// Mirror a committed lesson into both views so they match the store even
    /// when the reload that follows fails.
    fn apply_saved(&mut self, lesson: Lesson) {
        if lesson.day == self.today {
            self.today_lessons.upsert(lesson.clone());
        } else {
            self.today_lessons.remove(lesson.id);
        }
        self.all_lessons.upsert(lesson);
    }

    /// Reload after a committed change. A failed reload does not undo the
    /// change, so the footer says it was saved.
    fn refresh_after_commit(&mut self, action: &str, focus: Option<Uuid>, message: String) {
        match self.reload_lessons(focus) {
            Ok(()) => self.set_status(message, StatusKind::Info),
            Err(err) => {
                warn!("event=lesson_{action} module=ui status=stale_view error={err:#}");
                self.set_status(
                    format!(
                        "{message} Saved, but the list could not be refreshed: {}",
                        surface_error(&err)
                    ),
                    StatusKind::Error,
                );
            }
        }
    }

    /// Re-query both views from the store.
    fn reload_lessons(&mut self, focus: Option<Uuid>) -> Result<()> {
        let today = fetch_lessons_for_day(&self.conn, self.today)
            .context("failed to load today's lessons")?;
        let all = fetch_all_lessons(&self.conn).context("failed to load lessons")?;
        self.today_lessons.set_lessons(today, focus);
        self.all_lessons.set_lessons(all, focus);
        Ok(())
    }

    /// Input that never reached the store: shown, not logged.
    fn reject_input(&mut self, form: &mut LessonForm, err: &anyhow::Error) {
        let message = surface_error(err);
        form.error = Some(message.clone());
        self.set_status(message, StatusKind::Error);
    }

    fn report_form_error(&mut self, action: &str, form: &mut LessonForm, err: &anyhow::Error) {
        let message = surface_error(err);
        form.error = Some(message);
        self.report_error(action, err);
    }

    /// Log a failed action and show it in the footer. Nothing is rolled back
    /// on screen because nothing was applied before the store answered.
    fn report_error(&mut self, action: &str, err: &anyhow::Error) {
        error!("event=lesson_{action} module=ui status=error error={err:#}");
        self.set_status(
            format!("Change may not be saved: {}", surface_error(err)),
            StatusKind::Error,
        );
    }

    fn current_list_mut(&mut self) -> &mut LessonList {
        match self.screen {
            Screen::Today => &mut self.today_lessons,
            Screen::AllLessons => &mut self.all_lessons,
        }
    }

    fn set_status<S: Into<String>>(&mut self, text: S, kind: StatusKind) {
        self.status = Some(StatusMessage {
            text: text.into(),
            kind,
        });
    }

    fn clear_status(&mut self) {
        self.status = None;
    }

    pub(crate) fn draw(&self, frame: &mut Frame) {
        let area = frame.area();
        let footer_height = FOOTER_HEIGHT.min(area.height);

        let (content_area, footer_area) = if area.height > footer_height {
            let chunks = Layout::default()
                .direction(Direction::Vertical)
                .constraints([Constraint::Min(0), Constraint::Length(footer_height)])
                .split(area);
            (chunks[0], chunks[1])
        } else {
            (area, area)
        };

        match self.screen {
            Screen::Today => self.draw_today(frame, content_area),
            Screen::AllLessons => self.draw_all_lessons(frame, content_area),
        }

        if area.height >= footer_height {
            self.draw_footer(frame, footer_area);
        }

        match &self.mode {
            Mode::AddingLesson(form) => self.draw_lesson_form(frame, area, "Add New Lesson", form),
            Mode::EditingLesson { form, .. } => {
                self.draw_lesson_form(frame, area, "Edit Lesson", form)
            }
            Mode::ConfirmDelete(confirm) => self.draw_confirm_delete(frame, area, confirm),
            Mode::Normal => {}
        }
    }

    fn draw_today(&self, frame: &mut Frame, area: Rect) {
        let [header, body] = split_header(area);
        let title = Paragraph::new(Line::from(vec![
            Span::styled("Today's Lessons", Style::default().add_modifier(Modifier::BOLD)),
            Span::raw(format!("  •  {}", day_name(self.today))),
        ]))
        .block(Block::default().borders(Borders::ALL));
        frame.render_widget(title, header);

        if self.today_lessons.is_empty() {
            let message = Paragraph::new("You don't have any lessons for today.")
                .alignment(Alignment::Center)
                .block(Block::default().borders(Borders::NONE));
            frame.render_widget(message, body);
            return;
        }

        self.render_lesson_cards(frame, body, &self.today_lessons, CardKind::Today);
    }

    fn draw_all_lessons(&self, frame: &mut Frame, area: Rect) {
        let [header, body] = split_header(area);
        let title = Paragraph::new(Line::from(vec![
            Span::styled("All Lessons", Style::default().add_modifier(Modifier::BOLD)),
            Span::raw(format!("  •  {} total", self.all_lessons.len())),
        ]))
        .block(Block::default().borders(Borders::ALL));
        frame.render_widget(title, header);

        if self.all_lessons.is_empty() {
            let message = Paragraph::new("Don't have any lessons, try to add one! Press '+'.")
                .alignment(Alignment::Center)
                .block(Block::default().borders(Borders::NONE));
            frame.render_widget(message, body);
            return;
        }

        self.render_lesson_cards(frame, body, &self.all_lessons, CardKind::Overview);
    }

    fn render_lesson_cards(
        &self,
        frame: &mut Frame,
        area: Rect,
        list: &LessonList,
        kind: CardKind,
    ) {
        if list.is_empty() || area.height == 0 {
            return;
        }

        let card_height = match kind {
            CardKind::Today => TODAY_CARD_HEIGHT,
            CardKind::Overview => OVERVIEW_CARD_HEIGHT,
        };
        let capacity = usize::from(area.height / card_height).max(1);
        let start = visible_start(list.selected, capacity, list.len());
        let visible = &list.lessons[start..list.len().min(start + capacity)];

        let rows = Layout::default()
            .direction(Direction::Vertical)
            .constraints(vec![Constraint::Length(card_height); visible.len()])
            .split(area);

        for (offset, (lesson, chunk)) in visible.iter().zip(rows.iter()).enumerate() {
            if chunk.height == 0 {
                continue;
            }
            let selected = start + offset == list.selected;
            let mut block = Block::default().borders(Borders::ALL);
            if selected {
                block = block.border_style(Style::default().fg(Color::Yellow));
            }
            let card = Paragraph::new(lesson_card_lines(lesson, kind, selected))
                .block(block)
                .alignment(Alignment::Left)
                .wrap(Wrap { trim: true });
            frame.render_widget(card, *chunk);
        }
    }

    fn draw_footer(&self, frame: &mut Frame, area: Rect) {
        let block = Block::default().borders(Borders::TOP);
        frame.render_widget(block.clone(), area);
        let inner = block.inner(area);

        let status_line = if let Some(status) = &self.status {
            Line::from(vec![Span::styled(status.text.clone(), status.kind.style())])
        } else {
            Line::from("")
        };

        let paragraph = Paragraph::new(vec![status_line, self.footer_instructions()])
            .wrap(Wrap { trim: true });
        frame.render_widget(paragraph, inner);
    }

    fn footer_instructions(&self) -> Line<'static> {
        let key_style = Style::default()
            .fg(Color::Cyan)
            .add_modifier(Modifier::BOLD);
        let hints: &[(&'static str, &'static str)] = match (&self.mode, self.screen) {
            (Mode::AddingLesson(_) | Mode::EditingLesson { .. }, _) => &[
                ("[Tab]", "Next Field"),
                ("[←→]", "Change Day"),
                ("[Enter]", "Save"),
                ("[Esc]", "Cancel"),
            ],
            (Mode::ConfirmDelete(_), _) => &[("[y]", "Delete"), ("[n]", "Keep")],
            (Mode::Normal, Screen::Today) => &[
                ("[↑↓]", "Select"),
                ("[Space]", "Toggle Presence"),
                ("[l]", "Lessons"),
                ("[+]", "Add Lesson"),
                ("[q]", "Quit"),
            ],
            (Mode::Normal, Screen::AllLessons) => &[
                ("[↑↓]", "Select"),
                ("[Enter]", "Edit"),
                ("[-]", "Delete"),
                ("[+]", "Add Lesson"),
                ("[Esc]", "Today"),
                ("[q]", "Quit"),
            ],
        };

        let mut spans = Vec::with_capacity(hints.len() * 2);
        for (key, label) in hints {
            spans.push(Span::styled(*key, key_style));
            spans.push(Span::raw(format!(" {label}   ")));
        }
        Line::from(spans)
    }

    fn draw_lesson_form(&self, frame: &mut Frame, area: Rect, title: &str, form: &LessonForm) {
        let popup_area = centered_rect(60, 40, area);
        frame.render_widget(Clear, popup_area);

        let block = Block::default().title(title.to_string()).borders(Borders::ALL);
        frame.render_widget(block.clone(), popup_area);
        let inner = block.inner(popup_area);

        let mut lines = vec![
            form.build_line("Lesson Name", LessonField::Name),
            form.build_line("Day of the Week", LessonField::Day),
            form.build_line("Time", LessonField::Time),
            Line::from(""),
        ];

        if let Some(error) = &form.error {
            lines.push(Line::from(Span::styled(
                error.clone(),
                Style::default().fg(Color::Red),
            )));
        } else {
            lines.push(Line::from(Span::styled(
                "Enter to save • Tab to switch • Esc to cancel",
                Style::default().fg(Color::Gray),
            )));
        }

        let paragraph = Paragraph::new(lines).wrap(Wrap { trim: true });
        frame.render_widget(paragraph, inner);

        let (prefix, row) = match form.active {
            LessonField::Name => ("Lesson Name: ", 0),
            LessonField::Day => ("Day of the Week: ", 1),
            LessonField::Time => ("Time: ", 2),
        };
        let offset = prefix.chars().count() + form.value_len(form.active);
        let cursor_x = inner
            .x
            .saturating_add(u16::try_from(offset).unwrap_or(u16::MAX))
            .min(inner.right().saturating_sub(1));
        frame.set_cursor_position((cursor_x, inner.y + row));
    }

    fn draw_confirm_delete(&self, frame: &mut Frame, area: Rect, confirm: &ConfirmLessonDelete) {
        let popup_area = centered_rect(60, 30, area);
        frame.render_widget(Clear, popup_area);

        let block = Block::default().title("Delete Lesson").borders(Borders::ALL);
        frame.render_widget(block.clone(), popup_area);
        let inner = block.inner(popup_area);

        let lines = vec![
            Line::from(format!(
                "Delete {} ({} {})?",
                confirm.name,
                day_name(confirm.day),
                confirm.time
            )),
            Line::from("Its absence count will be lost."),
            Line::from(""),
            Line::from(Span::styled(
                "Press Y to confirm or N / Esc to cancel.",
                Style::default().fg(Color::Gray),
            )),
        ];

        let paragraph = Paragraph::new(lines)
            .alignment(Alignment::Left)
            .wrap(Wrap { trim: true });
        frame.render_widget(paragraph, inner);
    }
}

/// Route a key press into the form fields.
fn edit_form(form: &mut LessonForm, code: KeyCode) {
    match code {
        KeyCode::Tab | KeyCode::Down => form.next_field(),
        KeyCode::BackTab | KeyCode::Up => form.previous_field(),
        KeyCode::Left if form.active == LessonField::Day => form.shift_day(-1),
        KeyCode::Right if form.active == LessonField::Day => form.shift_day(1),
        KeyCode::Backspace => form.backspace(),
        KeyCode::Char(ch) => {
            if form.push_char(ch) {
                form.error = None;
            }
        }
        _ => {}
    }
}

fn split_header(area: Rect) -> [Rect; 2] {
    let chunks = Layout::default()
        .direction(Direction::Vertical)
        .constraints([Constraint::Length(HEADER_HEIGHT), Constraint::Min(0)])
        .split(area);
    [chunks[0], chunks[1]]
}
