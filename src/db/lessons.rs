use chrono::NaiveTime;
use log::{debug, warn};
use rusqlite::{params, Connection, Row};
use uuid::Uuid;

use crate::models::{Lesson, TIME_FORMAT};

use super::{StoreError, StoreResult};

const LESSON_COLUMNS: &str = "id, name, day, time, absences, is_present";

/// Raw column values, converted to a [`Lesson`] once the statement is done so
/// parse failures surface as [`StoreError::InvalidRecord`].
struct LessonRow {
    id: String,
    name: String,
    day: i64,
    time: String,
    absences: u32,
    is_present: bool,
}

impl LessonRow {
    fn from_row(row: &Row<'_>) -> rusqlite::Result<Self> {
        Ok(Self {
            id: row.get(0)?,
            name: row.get(1)?,
            day: row.get(2)?,
            time: row.get(3)?,
            absences: row.get(4)?,
            is_present: row.get(5)?,
        })
    }

    fn into_lesson(self) -> StoreResult<Lesson> {
        let id = Uuid::parse_str(&self.id).map_err(|_| StoreError::InvalidRecord {
            field: "id",
            value: self.id.clone(),
        })?;
        let time =
            NaiveTime::parse_from_str(&self.time, TIME_FORMAT).map_err(|_| {
                StoreError::InvalidRecord {
                    field: "time",
                    value: self.time.clone(),
                }
            })?;
        Ok(Lesson {
            id,
            name: self.name,
            day: self.day,
            time,
            absences: self.absences,
            is_present: self.is_present,
        })
    }
}

fn collect_lessons(rows: Vec<LessonRow>) -> StoreResult<Vec<Lesson>> {
    rows.into_iter().map(LessonRow::into_lesson).collect()
}

/// Insert a freshly created lesson.
pub fn insert_lesson(conn: &Connection, lesson: &Lesson) -> StoreResult<()> {
    conn.execute(
        "INSERT INTO lessons (id, name, day, time, absences, is_present)
         VALUES (?1, ?2, ?3, ?4, ?5, ?6)",
        params![
            lesson.id.to_string(),
            lesson.name,
            lesson.day,
            lesson.formatted_time(),
            lesson.absences,
            lesson.is_present,
        ],
    )?;
    debug!(
        "event=lesson_insert module=db status=ok id={} day={}",
        lesson.id, lesson.day
    );
    Ok(())
}

/// Every lesson, ordered the way the "all lessons" view lists them.
pub fn fetch_all_lessons(conn: &Connection) -> StoreResult<Vec<Lesson>> {
    let mut stmt = conn.prepare(&format!(
        "SELECT {LESSON_COLUMNS} FROM lessons
         ORDER BY day, time, name COLLATE NOCASE"
    ))?;
    let rows = stmt
        .query_map([], LessonRow::from_row)?
        .collect::<Result<Vec<_>, _>>()?;
    collect_lessons(rows)
}

/// Lessons scheduled on `day`, earliest first. The caller supplies the day so
/// the query never reads the clock itself.
pub fn fetch_lessons_for_day(conn: &Connection, day: i64) -> StoreResult<Vec<Lesson>> {
    let mut stmt = conn.prepare(&format!(
        "SELECT {LESSON_COLUMNS} FROM lessons
         WHERE day = ?1
         ORDER BY time, name COLLATE NOCASE"
    ))?;
    let rows = stmt
        .query_map(params![day], LessonRow::from_row)?
        .collect::<Result<Vec<_>, _>>()?;
    collect_lessons(rows)
}

pub fn fetch_lesson(conn: &Connection, id: Uuid) -> StoreResult<Option<Lesson>> {
    let mut stmt = conn.prepare(&format!(
        "SELECT {LESSON_COLUMNS} FROM lessons WHERE id = ?1"
    ))?;
    let mut rows = stmt.query_map(params![id.to_string()], LessonRow::from_row)?;
    let first = rows.next().transpose()?;
    let lesson = first.map(LessonRow::into_lesson).transpose()?;
    Ok(lesson)
}

/// Lessons matching an arbitrary predicate, in [`fetch_all_lessons`] order.
pub fn query_lessons<P>(conn: &Connection, predicate: P) -> StoreResult<Vec<Lesson>>
where
    P: Fn(&Lesson) -> bool,
{
    Ok(fetch_all_lessons(conn)?
        .into_iter()
        .filter(|lesson| predicate(lesson))
        .collect())
}

/// Persist every mutable field of `lesson` as one unit of work. Returns
/// [`StoreError::NotFound`] when the row was deleted in the meantime.
pub fn save_lesson(conn: &Connection, lesson: &Lesson) -> StoreResult<()> {
    let tx = conn.unchecked_transaction()?;
    let updated = tx.execute(
        "UPDATE lessons
         SET name = ?1, day = ?2, time = ?3, absences = ?4, is_present = ?5
         WHERE id = ?6",
        params![
            lesson.name,
            lesson.day,
            lesson.formatted_time(),
            lesson.absences,
            lesson.is_present,
            lesson.id.to_string(),
        ],
    )?;

    if updated == 0 {
        warn!(
            "event=lesson_save module=db status=error error_code=not_found id={}",
            lesson.id
        );
        return Err(StoreError::NotFound(lesson.id));
    }

    tx.commit()?;
    debug!(
        "event=lesson_save module=db status=ok id={} present={} absences={}",
        lesson.id, lesson.is_present, lesson.absences
    );
    Ok(())
}

/// Remove a lesson permanently.
pub fn delete_lesson(conn: &Connection, id: Uuid) -> StoreResult<()> {
    let deleted = conn.execute(
        "DELETE FROM lessons WHERE id = ?1",
        params![id.to_string()],
    )?;

    if deleted == 0 {
        Err(StoreError::NotFound(id))
    } else {
        debug!("event=lesson_delete module=db status=ok id={id}");
        Ok(())
    }
}
