//! Domain model for the attendance tracker. `Lesson` mirrors a row of the
//! `lessons` table and is handed to every view as a plain data holder; the
//! only behavior it carries is the presence toggle and its absence counter.

use chrono::{Datelike, NaiveDate, NaiveTime, Timelike};
use uuid::Uuid;

/// Display names indexed by `day - 1`.
const DAY_NAMES: [&str; 7] = [
    "Monday",
    "Tuesday",
    "Wednesday",
    "Thursday",
    "Friday",
    "Saturday",
    "Sunday",
];

/// Format used both for storage and for rendering a lesson time.
pub const TIME_FORMAT: &str = "%H:%M";

#[derive(Debug, Clone, PartialEq, Eq)]
/// A recurring weekly class. Identity is the generated `id`; every other field
/// may change through the edit form or the presence toggle.
pub struct Lesson {
    /// Generated once in [`Lesson::new`] and never reassigned.
    pub id: Uuid,
    /// Free text, accepted as typed (including empty).
    pub name: String,
    /// 1 = Monday through 7 = Sunday. The entity does not enforce the range;
    /// the form's day picker does.
    pub day: i64,
    /// Hour and minute of the lesson. Seconds are always zero.
    pub time: NaiveTime,
    /// Running total, never negative.
    pub absences: u32,
    pub is_present: bool,
}

impl Lesson {
    /// Build a fresh lesson marked present with no absences recorded.
    pub fn new(name: impl Into<String>, day: i64, time: NaiveTime) -> Self {
        Self {
            id: Uuid::new_v4(),
            name: name.into(),
            day,
            time: truncate_to_minute(time),
            absences: 0,
            is_present: true,
        }
    }

    /// Flip the presence flag and adjust the counter.
    ///
    /// Switching to present increments `absences`; switching back decrements
    /// it, never below zero. The pairing looks inverted against the field's
    /// name but matches how the counter has always been recorded.
    pub fn toggle_presence(&mut self) {
        self.is_present = !self.is_present;
        if self.is_present {
            self.increment_absence();
        } else {
            self.decrement_absence();
        }
    }

    pub fn increment_absence(&mut self) {
        self.absences = self.absences.saturating_add(1);
    }

    /// Decrease the counter, clamped at zero.
    pub fn decrement_absence(&mut self) {
        self.absences = self.absences.saturating_sub(1);
    }

    /// Overwrite the user-editable fields in place. Presence and the counter
    /// are left alone.
    pub fn update(&mut self, name: impl Into<String>, day: i64, time: NaiveTime) {
        self.name = name.into();
        self.day = day;
        self.time = truncate_to_minute(time);
    }

    /// `HH:MM` rendering used by every view.
    pub fn formatted_time(&self) -> String {
        self.time.format(TIME_FORMAT).to_string()
    }

    /// Label shown on the toggle button.
    pub fn presence_label(&self) -> &'static str {
        if self.is_present {
            "Present"
        } else {
            "Absent"
        }
    }
}

/// Name of a lesson day, or an empty string when `day` is outside 1–7.
pub fn day_name(day: i64) -> &'static str {
    usize::try_from(day)
        .ok()
        .and_then(|day| day.checked_sub(1))
        .and_then(|index| DAY_NAMES.get(index))
        .copied()
        .unwrap_or("")
}

/// Map a Sunday-first calendar weekday index (1 = Sunday … 7 = Saturday) onto
/// the Monday-first lesson day used by the store.
pub fn lesson_day_from_calendar_index(raw: u32) -> i64 {
    if raw == 1 {
        7
    } else {
        i64::from(raw) - 1
    }
}

/// Lesson day that falls on `date`.
pub fn lesson_day_for(date: NaiveDate) -> i64 {
    let calendar_index = date.weekday().num_days_from_sunday() + 1;
    lesson_day_from_calendar_index(calendar_index)
}

fn truncate_to_minute(time: NaiveTime) -> NaiveTime {
    NaiveTime::from_hms_opt(time.hour(), time.minute(), 0).unwrap_or(time)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn nine() -> NaiveTime {
        NaiveTime::from_hms_opt(9, 0, 0).unwrap()
    }

    #[test]
    fn new_lesson_starts_present_with_no_absences() {
        let lesson = Lesson::new("Math", 1, nine());
        assert!(lesson.is_present);
        assert_eq!(lesson.absences, 0);
        assert_eq!(lesson.name, "Math");
        assert_eq!(lesson.day, 1);
        assert_eq!(lesson.formatted_time(), "09:00");
    }

    #[test]
    fn new_lessons_get_distinct_ids() {
        let first = Lesson::new("Math", 1, nine());
        let second = Lesson::new("Math", 1, nine());
        assert_ne!(first.id, second.id);
    }

    #[test]
    fn single_toggle_marks_absent_and_keeps_counter_at_zero() {
        let mut lesson = Lesson::new("Math", 1, nine());
        lesson.toggle_presence();
        assert!(!lesson.is_present);
        assert_eq!(lesson.absences, 0);
        assert_eq!(lesson.presence_label(), "Absent");
    }

    #[test]
    fn toggling_back_to_present_increments_counter() {
        let mut lesson = Lesson::new("Math", 1, nine());
        lesson.toggle_presence();
        lesson.toggle_presence();
        assert!(lesson.is_present);
        assert_eq!(lesson.absences, 1);
    }

    #[test]
    fn counter_never_drops_below_zero() {
        let mut lesson = Lesson::new("Math", 1, nine());
        for _ in 0..5 {
            lesson.decrement_absence();
        }
        assert_eq!(lesson.absences, 0);

        lesson.increment_absence();
        for _ in 0..5 {
            lesson.decrement_absence();
        }
        assert_eq!(lesson.absences, 0);
    }

    #[test]
    fn arbitrary_toggle_sequences_track_the_present_transitions() {
        let mut lesson = Lesson::new("Math", 1, nine());
        let mut expected: u32 = 0;
        for _ in 0..11 {
            lesson.toggle_presence();
            if lesson.is_present {
                expected += 1;
            } else {
                expected = expected.saturating_sub(1);
            }
            assert_eq!(lesson.absences, expected);
        }
    }

    #[test]
    fn update_overwrites_editable_fields_only() {
        let mut lesson = Lesson::new("Math", 1, nine());
        lesson.toggle_presence();
        lesson.toggle_presence();
        let id = lesson.id;

        let later = NaiveTime::from_hms_opt(14, 30, 45).unwrap();
        lesson.update("Physics", 3, later);

        assert_eq!(lesson.id, id);
        assert_eq!(lesson.name, "Physics");
        assert_eq!(lesson.day, 3);
        assert_eq!(lesson.formatted_time(), "14:30");
        assert_eq!(lesson.time, NaiveTime::from_hms_opt(14, 30, 0).unwrap());
        assert_eq!(lesson.absences, 1);
        assert!(lesson.is_present);
    }

    #[test]
    fn day_names_cover_the_week_and_blank_out_of_range() {
        assert_eq!(day_name(1), "Monday");
        assert_eq!(day_name(7), "Sunday");
        assert_eq!(day_name(0), "");
        assert_eq!(day_name(8), "");
        assert_eq!(day_name(-3), "");
    }

    #[test]
    fn calendar_index_remaps_sunday_to_seven() {
        assert_eq!(lesson_day_from_calendar_index(1), 7);
        assert_eq!(lesson_day_from_calendar_index(2), 1);
        assert_eq!(lesson_day_from_calendar_index(3), 2);
        assert_eq!(lesson_day_from_calendar_index(7), 6);
    }

    #[test]
    fn lesson_day_for_known_dates() {
        // 2024-11-11 was a Monday, 2024-11-17 a Sunday.
        let monday = NaiveDate::from_ymd_opt(2024, 11, 11).unwrap();
        let sunday = NaiveDate::from_ymd_opt(2024, 11, 17).unwrap();
        let tuesday = NaiveDate::from_ymd_opt(2024, 11, 12).unwrap();
        assert_eq!(lesson_day_for(monday), 1);
        assert_eq!(lesson_day_for(tuesday), 2);
        assert_eq!(lesson_day_for(sunday), 7);
    }
}
