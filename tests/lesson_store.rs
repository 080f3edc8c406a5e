use chrono::NaiveTime;
use lesson_check_in::{
    delete_lesson, fetch_all_lessons, fetch_lesson, fetch_lessons_for_day, insert_lesson,
    open_store, open_store_in_memory, query_lessons, save_lesson, Lesson, StoreError,
};
use rusqlite::Connection;
use uuid::Uuid;

fn at(hour: u32, minute: u32) -> NaiveTime {
    NaiveTime::from_hms_opt(hour, minute, 0).unwrap()
}

fn seed(conn: &Connection) -> Vec<Lesson> {
    let lessons = vec![
        Lesson::new("Math", 1, at(9, 0)),
        Lesson::new("Art", 1, at(8, 0)),
        Lesson::new("Physics", 2, at(10, 30)),
        Lesson::new("Chemistry", 4, at(13, 0)),
        Lesson::new("Music", 7, at(18, 0)),
    ];
    for lesson in &lessons {
        insert_lesson(conn, lesson).unwrap();
    }
    lessons
}

fn ids(lessons: &[Lesson]) -> Vec<Uuid> {
    lessons.iter().map(|lesson| lesson.id).collect()
}

#[test]
fn fetch_by_day_returns_exactly_that_days_lessons() {
    let conn = open_store_in_memory().unwrap();
    let seeded = seed(&conn);

    for day in 1..=7 {
        let mut expected: Vec<&Lesson> = seeded.iter().filter(|l| l.day == day).collect();
        expected.sort_by_key(|l| l.time);

        let fetched = fetch_lessons_for_day(&conn, day).unwrap();
        let queried = query_lessons(&conn, |l| l.day == day).unwrap();

        assert_eq!(
            ids(&fetched),
            expected.iter().map(|l| l.id).collect::<Vec<_>>(),
            "day {day}"
        );
        let mut queried_ids = ids(&queried);
        let mut fetched_ids = ids(&fetched);
        queried_ids.sort();
        fetched_ids.sort();
        assert_eq!(queried_ids, fetched_ids, "day {day}");
    }
}

#[test]
fn all_lessons_are_ordered_by_day_then_time() {
    let conn = open_store_in_memory().unwrap();
    seed(&conn);

    let names: Vec<String> = fetch_all_lessons(&conn)
        .unwrap()
        .into_iter()
        .map(|l| l.name)
        .collect();
    assert_eq!(names, vec!["Art", "Math", "Physics", "Chemistry", "Music"]);
}

#[test]
fn new_lesson_round_trips_defaults() {
    let conn = open_store_in_memory().unwrap();
    let lesson = Lesson::new("", 3, at(7, 45));
    insert_lesson(&conn, &lesson).unwrap();

    let stored = fetch_lesson(&conn, lesson.id).unwrap().unwrap();
    assert_eq!(stored, lesson);
    assert!(stored.is_present);
    assert_eq!(stored.absences, 0);
    assert_eq!(stored.name, "");
}

#[test]
fn update_then_query_reflects_only_new_values() {
    let conn = open_store_in_memory().unwrap();
    let mut lesson = Lesson::new("Math", 1, at(9, 0));
    insert_lesson(&conn, &lesson).unwrap();

    lesson.update("Statistics", 5, at(15, 20));
    save_lesson(&conn, &lesson).unwrap();

    let all = fetch_all_lessons(&conn).unwrap();
    assert_eq!(all.len(), 1);
    assert_eq!(all[0].id, lesson.id);
    assert_eq!(all[0].name, "Statistics");
    assert_eq!(all[0].day, 5);
    assert_eq!(all[0].formatted_time(), "15:20");
    assert!(fetch_lessons_for_day(&conn, 1).unwrap().is_empty());
}

#[test]
fn toggles_persist_and_counter_stays_non_negative() {
    let conn = open_store_in_memory().unwrap();
    let mut lesson = Lesson::new("Math", 1, at(9, 0));
    insert_lesson(&conn, &lesson).unwrap();

    lesson.toggle_presence();
    save_lesson(&conn, &lesson).unwrap();
    let stored = fetch_lesson(&conn, lesson.id).unwrap().unwrap();
    assert!(!stored.is_present);
    assert_eq!(stored.absences, 0);

    for _ in 0..5 {
        lesson.toggle_presence();
        lesson.toggle_presence();
        save_lesson(&conn, &lesson).unwrap();
    }
    let stored = fetch_lesson(&conn, lesson.id).unwrap().unwrap();
    assert!(!stored.is_present);
    assert_eq!(stored.absences, 0);

    lesson.toggle_presence();
    save_lesson(&conn, &lesson).unwrap();
    assert_eq!(fetch_lesson(&conn, lesson.id).unwrap().unwrap().absences, 1);
}

#[test]
fn delete_removes_lesson_from_queries() {
    let conn = open_store_in_memory().unwrap();
    let seeded = seed(&conn);
    let victim = &seeded[2];

    delete_lesson(&conn, victim.id).unwrap();

    let remaining = fetch_all_lessons(&conn).unwrap();
    assert_eq!(remaining.len(), seeded.len() - 1);
    assert!(!ids(&remaining).contains(&victim.id));
    assert!(fetch_lesson(&conn, victim.id).unwrap().is_none());
}

#[test]
fn missing_lessons_report_not_found() {
    let conn = open_store_in_memory().unwrap();
    let ghost = Lesson::new("Ghost", 1, at(9, 0));

    assert!(matches!(
        save_lesson(&conn, &ghost),
        Err(StoreError::NotFound(id)) if id == ghost.id
    ));
    assert!(matches!(
        delete_lesson(&conn, ghost.id),
        Err(StoreError::NotFound(id)) if id == ghost.id
    ));
}

#[test]
fn corrupt_rows_surface_as_invalid_record() {
    let conn = open_store_in_memory().unwrap();
    conn.execute(
        "INSERT INTO lessons (id, name, day, time) VALUES ('not-a-uuid', 'Broken', 1, '09:00')",
        [],
    )
    .unwrap();

    let err = fetch_all_lessons(&conn).unwrap_err();
    assert!(matches!(err, StoreError::InvalidRecord { field: "id", .. }));
}

#[test]
fn negative_absences_are_rejected_by_schema() {
    let conn = open_store_in_memory().unwrap();
    let result = conn.execute(
        "INSERT INTO lessons (id, name, day, time, absences) VALUES (?1, 'Math', 1, '09:00', -1)",
        [Uuid::new_v4().to_string()],
    );
    assert!(result.is_err());
}

#[test]
fn lessons_survive_reopening_the_file() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("nested").join("lessons.sqlite");

    let mut lesson = Lesson::new("Math", 1, at(9, 0));
    {
        let conn = open_store(&path).unwrap();
        insert_lesson(&conn, &lesson).unwrap();
        lesson.toggle_presence();
        lesson.toggle_presence();
        save_lesson(&conn, &lesson).unwrap();
    }

    let conn = open_store(&path).unwrap();
    let stored = fetch_lesson(&conn, lesson.id).unwrap().unwrap();
    assert_eq!(stored, lesson);
    assert_eq!(stored.absences, 1);
}
