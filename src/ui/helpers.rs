use anyhow::Error;
use ratatui::layout::{Constraint, Direction, Layout, Rect};
use ratatui::style::{Color, Modifier, Style};
use ratatui::text::{Line, Span};

use crate::models::{day_name, Lesson};

/// Which details a lesson card shows.
#[derive(Copy, Clone, PartialEq, Eq)]
pub(crate) enum CardKind {
    /// Name, time and the presence button.
    Today,
    /// Name, day, time and the absence count.
    Overview,
}

/// Colored badge mirroring the presence button.
pub(crate) fn presence_badge(lesson: &Lesson) -> Span<'static> {
    let color = if lesson.is_present {
        Color::Green
    } else {
        Color::Red
    };
    Span::styled(
        format!(" {} ", lesson.presence_label()),
        Style::default()
            .fg(Color::White)
            .bg(color)
            .add_modifier(Modifier::BOLD),
    )
}

/// Text payload for a lesson card.
pub(crate) fn lesson_card_lines(
    lesson: &Lesson,
    kind: CardKind,
    selected: bool,
) -> Vec<Line<'static>> {
    let title = if selected {
        format!("▶ {}", lesson.name)
    } else {
        lesson.name.clone()
    };
    let mut lines = vec![Line::from(Span::styled(
        title,
        Style::default().add_modifier(Modifier::BOLD),
    ))];

    match kind {
        CardKind::Today => {
            lines.push(Line::from(Span::styled(
                format!("Time: {}", lesson.formatted_time()),
                Style::default().fg(Color::Gray),
            )));
            lines.push(Line::from(presence_badge(lesson)));
        }
        CardKind::Overview => {
            lines.push(Line::from(format!("Day: {}", day_name(lesson.day))));
            lines.push(Line::from(Span::styled(
                format!("Time: {}", lesson.formatted_time()),
                Style::default().fg(Color::Gray),
            )));
            lines.push(Line::from(format!("Absences: {}", lesson.absences)));
        }
    }

    lines
}

/// First row index to render so `selected` stays visible in a window of
/// `capacity` rows.
pub(crate) fn visible_start(selected: usize, capacity: usize, len: usize) -> usize {
    let capacity = capacity.max(1);
    let start = (selected + 1).saturating_sub(capacity);
    start.min(len.saturating_sub(capacity))
}

/// Produce a rectangle centered within `area` that spans the requested percent
/// of the width and height. Used for modal dialogs.
pub(crate) fn centered_rect(percent_x: u16, percent_y: u16, area: Rect) -> Rect {
    let horizontal = Layout::default()
        .direction(Direction::Horizontal)
        .constraints([
            Constraint::Percentage((100 - percent_x) / 2),
            Constraint::Percentage(percent_x),
            Constraint::Percentage((100 - percent_x) / 2),
        ])
        .split(area);

    let vertical = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Percentage((100 - percent_y) / 2),
            Constraint::Percentage(percent_y),
            Constraint::Percentage((100 - percent_y) / 2),
        ])
        .split(horizontal[1]);

    vertical[1]
}

/// Extract the most relevant error message from a chained error.
pub(crate) fn surface_error(err: &Error) -> String {
    err.chain()
        .last()
        .map(|cause| cause.to_string())
        .unwrap_or_else(|| err.to_string())
}

#[cfg(test)]
mod tests {
    use anyhow::{anyhow, Context};
    use chrono::NaiveTime;

    use super::*;

    #[test]
    fn visible_start_keeps_selection_in_window() {
        assert_eq!(visible_start(0, 3, 10), 0);
        assert_eq!(visible_start(2, 3, 10), 0);
        assert_eq!(visible_start(3, 3, 10), 1);
        assert_eq!(visible_start(9, 3, 10), 7);
        assert_eq!(visible_start(1, 5, 2), 0);
    }

    #[test]
    fn surface_error_prefers_root_cause() {
        let err = Err::<(), _>(anyhow!("disk full"))
            .context("failed to save lesson")
            .unwrap_err();
        assert_eq!(surface_error(&err), "disk full");
    }

    #[test]
    fn overview_card_lists_day_and_absences() {
        let mut lesson = Lesson::new("History", 5, NaiveTime::from_hms_opt(10, 45, 0).unwrap());
        lesson.increment_absence();
        let text: Vec<String> = lesson_card_lines(&lesson, CardKind::Overview, false)
            .iter()
            .map(|line| line.to_string())
            .collect();
        assert_eq!(
            text,
            vec!["History", "Day: Friday", "Time: 10:45", "Absences: 1"]
        );
    }

    #[test]
    fn today_card_marks_selection_and_presence() {
        let lesson = Lesson::new("Art", 2, NaiveTime::from_hms_opt(8, 5, 0).unwrap());
        let text: Vec<String> = lesson_card_lines(&lesson, CardKind::Today, true)
            .iter()
            .map(|line| line.to_string())
            .collect();
        assert_eq!(text, vec!["▶ Art", "Time: 08:05", " Present "]);
    }
}
