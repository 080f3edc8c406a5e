use anyhow::{anyhow, Result};
use chrono::NaiveTime;
use ratatui::style::{Color, Style};
use ratatui::text::{Line, Span};
use uuid::Uuid;

use crate::models::{day_name, Lesson, TIME_FORMAT};

const FIRST_DAY: i64 = 1;
const LAST_DAY: i64 = 7;
/// `HH:MM`
const TIME_INPUT_LEN: usize = 5;

/// Form state shared by the add and edit dialogs.
#[derive(Clone)]
pub(crate) struct LessonForm {
    pub(crate) name: String,
    pub(crate) day: i64,
    pub(crate) time: String,
    pub(crate) active: LessonField,
    pub(crate) error: Option<String>,
}

/// Fields available within the lesson form, in focus order.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Default)]
pub(crate) enum LessonField {
    #[default]
    Name,
    Day,
    Time,
}

impl LessonForm {
    /// Blank form for a new lesson: Monday at `time`.
    pub(crate) fn new(time: NaiveTime) -> Self {
        Self {
            name: String::new(),
            day: FIRST_DAY,
            time: time.format(TIME_FORMAT).to_string(),
            active: LessonField::Name,
            error: None,
        }
    }

    /// Populate the form from an existing lesson when editing.
    pub(crate) fn from_lesson(lesson: &Lesson) -> Self {
        Self {
            name: lesson.name.clone(),
            day: lesson.day.clamp(FIRST_DAY, LAST_DAY),
            time: lesson.formatted_time(),
            active: LessonField::Name,
            error: None,
        }
    }

    /// Cycle focus forward through name, day and time.
    pub(crate) fn next_field(&mut self) {
        self.active = match self.active {
            LessonField::Name => LessonField::Day,
            LessonField::Day => LessonField::Time,
            LessonField::Time => LessonField::Name,
        };
    }

    pub(crate) fn previous_field(&mut self) {
        self.active = match self.active {
            LessonField::Name => LessonField::Time,
            LessonField::Day => LessonField::Name,
            LessonField::Time => LessonField::Day,
        };
    }

    /// Step the day picker, wrapping Sunday back to Monday.
    pub(crate) fn shift_day(&mut self, offset: i64) {
        let zero_based = (self.day - FIRST_DAY + offset).rem_euclid(LAST_DAY);
        self.day = zero_based + FIRST_DAY;
    }

    /// Feed a typed character into the active field. Returns whether the
    /// character was accepted.
    pub(crate) fn push_char(&mut self, ch: char) -> bool {
        match self.active {
            LessonField::Name => {
                if ch.is_control() {
                    return false;
                }
                self.name.push(ch);
                true
            }
            LessonField::Day => match ch.to_digit(10).map(i64::from) {
                Some(day) if (FIRST_DAY..=LAST_DAY).contains(&day) => {
                    self.day = day;
                    true
                }
                _ => false,
            },
            LessonField::Time => {
                if !(ch.is_ascii_digit() || ch == ':') || self.time.len() >= TIME_INPUT_LEN {
                    return false;
                }
                self.time.push(ch);
                true
            }
        }
    }

    /// Remove the last character from the active field. The day picker has
    /// nothing to erase.
    pub(crate) fn backspace(&mut self) {
        match self.active {
            LessonField::Name => {
                self.name.pop();
            }
            LessonField::Day => {}
            LessonField::Time => {
                self.time.pop();
            }
        }
    }

    /// Typed values ready for the entity. Only the time has to parse; the
    /// name is taken as typed and the day is always in range.
    pub(crate) fn parse_inputs(&self) -> Result<(String, i64, NaiveTime)> {
        let time = NaiveTime::parse_from_str(self.time.trim(), TIME_FORMAT)
            .map_err(|_| anyhow!("Time must be HH:MM (24-hour)."))?;
        Ok((self.name.clone(), self.day, time))
    }

    /// Render a single line for the form widget.
    pub(crate) fn build_line(&self, field_name: &str, field: LessonField) -> Line<'static> {
        let is_active = self.active == field;
        let value = match field {
            LessonField::Name => self.name.clone(),
            LessonField::Day => format!("< {} >", day_name(self.day)),
            LessonField::Time => self.time.clone(),
        };

        let display = if value.is_empty() {
            match field {
                LessonField::Time => "<HH:MM>".to_string(),
                _ => "<empty>".to_string(),
            }
        } else {
            value.clone()
        };

        let style = if is_active {
            Style::default().fg(Color::Yellow)
        } else if value.is_empty() {
            Style::default().fg(Color::DarkGray)
        } else {
            Style::default()
        };

        Line::from(vec![
            Span::raw(format!("{field_name}: ")),
            Span::styled(display, style),
        ])
    }

    /// Character count of the requested field, used for cursor placement.
    pub(crate) fn value_len(&self, field: LessonField) -> usize {
        match field {
            LessonField::Name => self.name.chars().count(),
            LessonField::Day => day_name(self.day).chars().count() + 4,
            LessonField::Time => self.time.chars().count(),
        }
    }
}

/// State for confirming permanent lesson deletion.
#[derive(Clone)]
pub(crate) struct ConfirmLessonDelete {
    pub(crate) id: Uuid,
    pub(crate) name: String,
    pub(crate) day: i64,
    pub(crate) time: String,
}

impl From<&Lesson> for ConfirmLessonDelete {
    fn from(lesson: &Lesson) -> Self {
        Self {
            id: lesson.id,
            name: lesson.name.clone(),
            day: lesson.day,
            time: lesson.formatted_time(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn nine() -> NaiveTime {
        NaiveTime::from_hms_opt(9, 0, 0).unwrap()
    }

    #[test]
    fn new_form_defaults_to_monday_and_given_time() {
        let form = LessonForm::new(nine());
        assert_eq!(form.day, 1);
        assert_eq!(form.time, "09:00");
        assert_eq!(form.active, LessonField::Name);
    }

    #[test]
    fn shift_day_wraps_both_ways() {
        let mut form = LessonForm::new(nine());
        form.shift_day(-1);
        assert_eq!(form.day, 7);
        form.shift_day(1);
        assert_eq!(form.day, 1);
        form.shift_day(3);
        assert_eq!(form.day, 4);
    }

    #[test]
    fn day_field_accepts_only_week_digits() {
        let mut form = LessonForm::new(nine());
        form.next_field();
        assert!(form.push_char('5'));
        assert_eq!(form.day, 5);
        assert!(!form.push_char('8'));
        assert!(!form.push_char('0'));
        assert!(!form.push_char('x'));
        assert_eq!(form.day, 5);
    }

    #[test]
    fn time_field_limits_input() {
        let mut form = LessonForm::new(nine());
        form.previous_field();
        assert_eq!(form.active, LessonField::Time);
        for _ in 0..5 {
            form.backspace();
        }
        assert!(form.time.is_empty());
        for ch in "14:3".chars() {
            assert!(form.push_char(ch));
        }
        assert!(!form.push_char('a'));
        assert!(form.push_char('0'));
        assert!(!form.push_char('0'));
        assert_eq!(form.time, "14:30");
    }

    #[test]
    fn parse_inputs_accepts_empty_name() {
        let form = LessonForm::new(nine());
        let (name, day, time) = form.parse_inputs().unwrap();
        assert_eq!(name, "");
        assert_eq!(day, 1);
        assert_eq!(time, nine());
    }

    #[test]
    fn parse_inputs_rejects_malformed_time() {
        let mut form = LessonForm::new(nine());
        form.time = "25:00".to_string();
        assert!(form.parse_inputs().is_err());
        form.time = "9".to_string();
        assert!(form.parse_inputs().is_err());
    }

    #[test]
    fn from_lesson_copies_editable_fields() {
        let lesson = Lesson::new("Chemistry", 6, NaiveTime::from_hms_opt(13, 15, 0).unwrap());
        let form = LessonForm::from_lesson(&lesson);
        assert_eq!(form.name, "Chemistry");
        assert_eq!(form.day, 6);
        assert_eq!(form.time, "13:15");
    }
}
