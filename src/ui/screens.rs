use uuid::Uuid;

use crate::models::Lesson;

/// A scrollable list of lessons with a single selection. Backs both the
/// "today" and "all lessons" views; each reload replaces the contents.
#[derive(Default)]
pub(crate) struct LessonList {
    pub(crate) lessons: Vec<Lesson>,
    pub(crate) selected: usize,
}

impl LessonList {
    /// Swap in freshly loaded lessons, keeping the selection on `focus` when it
    /// is still present.
    pub(crate) fn set_lessons(&mut self, lessons: Vec<Lesson>, focus: Option<Uuid>) {
        self.lessons = lessons;
        if let Some(id) = focus {
            if let Some(index) = self.lessons.iter().position(|lesson| lesson.id == id) {
                self.selected = index;
                return;
            }
        }
        self.ensure_in_bounds();
    }

    /// Write a committed lesson into the list in place, appending it when the
    /// list did not hold it yet. The selection follows the lesson.
    pub(crate) fn upsert(&mut self, lesson: Lesson) {
        match self.lessons.iter().position(|item| item.id == lesson.id) {
            Some(index) => {
                self.lessons[index] = lesson;
                self.selected = index;
            }
            None => {
                self.lessons.push(lesson);
                self.select_last();
            }
        }
    }

    pub(crate) fn remove(&mut self, id: Uuid) {
        self.lessons.retain(|lesson| lesson.id != id);
        self.ensure_in_bounds();
    }

    pub(crate) fn current(&self) -> Option<&Lesson> {
        self.lessons.get(self.selected)
    }

    pub(crate) fn is_empty(&self) -> bool {
        self.lessons.is_empty()
    }

    pub(crate) fn len(&self) -> usize {
        self.lessons.len()
    }

    pub(crate) fn move_selection(&mut self, offset: isize) {
        if self.lessons.is_empty() {
            return;
        }
        let last = self.lessons.len() - 1;
        self.selected = self.selected.saturating_add_signed(offset).min(last);
    }

    pub(crate) fn select_first(&mut self) {
        self.selected = 0;
    }

    pub(crate) fn select_last(&mut self) {
        self.selected = self.lessons.len().saturating_sub(1);
    }

    fn ensure_in_bounds(&mut self) {
        self.selected = self.selected.min(self.lessons.len().saturating_sub(1));
    }
}
