use chrono::NaiveDate;
use mindatlas_core::db::open_db_in_memory;
use mindatlas_core::model::habit::HabitValidationError;
use mindatlas_core::{
    DetectedPattern, Habit, HabitRepository, HabitService, HabitServiceError,
    SqliteHabitRepository,
};
use uuid::Uuid;

fn day(y: i32, m: u32, d: u32) -> NaiveDate {
    NaiveDate::from_ymd_opt(y, m, d).unwrap()
}

#[test]
fn completions_persist_and_cascade_with_habit() {
    let conn = open_db_in_memory().unwrap();
    let repo = SqliteHabitRepository::try_new(&conn).unwrap();

    let mut habit = Habit::new("walk after lunch");
    habit.completed_dates.insert(day(2024, 2, 28));
    let created = repo.create_habit(&habit).unwrap();
    assert!(created.is_completed_on(day(2024, 2, 28)));

    repo.set_completion(created.id, day(2024, 2, 29), true).unwrap();
    repo.set_completion(created.id, day(2024, 2, 29), true).unwrap();
    let loaded = repo.get_habit(created.id).unwrap().unwrap();
    assert_eq!(loaded.completed_dates.len(), 2);

    repo.delete_habit(created.id).unwrap();
    let rows: i64 = conn
        .query_row("SELECT COUNT(*) FROM habit_completions;", [], |row| {
            row.get(0)
        })
        .unwrap();
    assert_eq!(rows, 0);
    assert!(repo.get_habit(created.id).unwrap().is_none());
}

#[test]
fn toggle_twice_restores_original_state() {
    let conn = open_db_in_memory().unwrap();
    let service = HabitService::new(SqliteHabitRepository::try_new(&conn).unwrap());
    let habit = service.create_habit("stretch").unwrap();
    let today = day(2024, 3, 1);

    assert!(service.toggle_completion(habit.id, today).unwrap());
    assert!(!service.toggle_completion(habit.id, today).unwrap());

    let listed = service.list_habits(today).unwrap();
    assert_eq!(listed.len(), 1);
    assert!(listed[0].habit.completed_dates.is_empty());
    assert_eq!(listed[0].streak, 0);
}

#[test]
fn list_reports_streak_relative_to_today() {
    let conn = open_db_in_memory().unwrap();
    let service = HabitService::new(SqliteHabitRepository::try_new(&conn).unwrap());
    let habit = service.create_habit("journal").unwrap();

    for d in [day(2024, 2, 28), day(2024, 2, 29), day(2024, 3, 1)] {
        service.toggle_completion(habit.id, d).unwrap();
    }

    let listed = service.list_habits(day(2024, 3, 1)).unwrap();
    assert_eq!(listed[0].streak, 3);
    let later = service.list_habits(day(2024, 3, 2)).unwrap();
    assert_eq!(later[0].streak, 3);
    let stale = service.list_habits(day(2024, 3, 4)).unwrap();
    assert_eq!(stale[0].streak, 0);
}

#[test]
fn habit_from_pattern_requires_suggestion() {
    let conn = open_db_in_memory().unwrap();
    let service = HabitService::new(SqliteHabitRepository::try_new(&conn).unwrap());
    let mut pattern = DetectedPattern {
        from: "stress".to_string(),
        to: "insomnia".to_string(),
        explanation: "late work".to_string(),
        suggested_habit: None,
    };

    assert!(matches!(
        service.habit_from_pattern(&pattern),
        Err(HabitServiceError::NoSuggestedHabit)
    ));

    pattern.suggested_habit = Some("no screens after 22:00".to_string());
    let habit = service.habit_from_pattern(&pattern).unwrap();
    assert_eq!(habit.description, "no screens after 22:00");
}

#[test]
fn blank_description_and_unknown_ids_are_rejected() {
    let conn = open_db_in_memory().unwrap();
    let service = HabitService::new(SqliteHabitRepository::try_new(&conn).unwrap());

    assert!(matches!(
        service.create_habit("   "),
        Err(HabitServiceError::Validation(
            HabitValidationError::EmptyDescription
        ))
    ));
    assert!(matches!(
        service.toggle_completion(Uuid::new_v4(), day(2024, 1, 1)),
        Err(HabitServiceError::NotFound(_))
    ));
    assert!(matches!(
        service.delete_habit(Uuid::new_v4()),
        Err(HabitServiceError::NotFound(_))
    ));
}
