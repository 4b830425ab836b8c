//! End-to-end lesson planning and activity validation scenarios.

use std::io::Write;

use nelie_planner::activity::{validate_and_normalize, Activity, ActivityValidator};
use nelie_planner::budget::{distribute_minutes, resolve_lesson_minutes};
use nelie_planner::lesson::{LessonRequest, LessonTask, TaskBank, TaskBanks, TaskRole};
use nelie_planner::planner::LessonPlanner;
use nelie_planner::subject::{SubjectKey, SubjectWeights};

fn mcq(question: &str, minutes: f64) -> Activity {
    Activity::new("mcq", question)
        .with_choices(["a", "b", "c"], 0)
        .with_hint("h")
        .with_minutes(minutes)
}

#[test]
fn test_proportional_split_without_reconciliation() {
    let weights = SubjectWeights::new()
        .with(SubjectKey::Mathematics, 10.0)
        .with(SubjectKey::English, 5.0);

    let plan = distribute_minutes(&weights, resolve_lesson_minutes(None, None));

    assert_eq!(plan.minutes_for(SubjectKey::Mathematics), Some(100));
    assert_eq!(plan.minutes_for(SubjectKey::English), Some(50));
}

#[test]
fn test_equal_weights_reconcile_deterministically() {
    let weights = SubjectWeights::new()
        .with(SubjectKey::Mathematics, 1.0)
        .with(SubjectKey::English, 1.0)
        .with(SubjectKey::Science, 1.0);

    let first = distribute_minutes(&weights, 17);
    let second = distribute_minutes(&weights, 17);

    assert_eq!(first.total_minutes(), 17);
    assert_eq!(first, second);
    assert!(first.iter().all(|e| e.minutes >= 5));
}

#[test]
fn test_single_mcq_fills_lesson() {
    let activities = validate_and_normalize(vec![mcq("Q", 10.0)], 150);
    assert_eq!(activities.len(), 1);
    assert_eq!(activities[0].estimated_time_min, 150.0);
}

#[test]
fn test_validator_idempotent_after_normalization() {
    let validator = ActivityValidator::default();
    let input = vec![
        mcq("one", 12.0),
        Activity::new("open", "two")
            .with_rubric(["clear", "complete"])
            .with_hint("think")
            .with_minutes(4.0),
        mcq("three", 1.0),
    ];

    let once = validator.validate_with_report(input, 90);
    assert!((once.report.normalized_minutes - 90.0).abs() <= 5.0);

    let twice = validator.validate_with_report(once.activities.clone(), 90);
    assert_eq!(once.activities, twice.activities);
    assert_eq!(twice.report.applied_delta, None);
}

#[test]
fn test_lesson_from_yaml_file() {
    let mut file = tempfile::Builder::new().suffix(".yml").tempfile().unwrap();
    writeln!(
        file,
        r#"
schoolWeights:
  Mathematics: 4
  English: 4
subjectWeights:
  English: 2
calendarMinutes: 60
teacherMinutes: 200
taskBanks:
  Mathematics:
    core:
      - id: math-warmup
        estMinutes: 10
    extensions:
      - id: math-puzzle
        estMinutes: 15
      - id: math-challenge
        estMinutes: 15
      - id: math-bonus
  English:
    core:
      - id: eng-read
    extensions:
      - id: eng-write
        estMinutes: 12
"#
    )
    .unwrap();

    let request = LessonRequest::from_path(file.path()).unwrap();
    let lesson = LessonPlanner::default().plan(&request);

    // calendar wins over teacher
    assert_eq!(lesson.target_minutes, 60);
    // teacher override: Mathematics 4, English 2 -> 40 / 20
    assert_eq!(lesson.plan.minutes_for(SubjectKey::Mathematics), Some(40));
    assert_eq!(lesson.plan.minutes_for(SubjectKey::English), Some(20));

    let ids: Vec<&str> = lesson.task_ids().collect();
    assert_eq!(
        ids,
        vec!["math-warmup", "math-puzzle", "math-challenge", "eng-read", "eng-write"]
    );
    assert!((lesson.total_minutes - 60.0).abs() < f64::EPSILON);
}

#[test]
fn test_composer_orders_core_before_extensions_per_subject() {
    let mut banks = TaskBanks::new();
    for subject in [SubjectKey::Science, SubjectKey::Music] {
        banks.insert(
            subject,
            TaskBank::new(vec![
                LessonTask::new(format!("{}-core-1", subject)),
                LessonTask::new(format!("{}-core-2", subject)),
            ])
            .with_extensions(vec![
                LessonTask::new(format!("{}-ext-1", subject)),
                LessonTask::new(format!("{}-ext-2", subject)),
            ]),
        );
    }

    let request = LessonRequest::new(
        SubjectWeights::new()
            .with(SubjectKey::Music, 1.0)
            .with(SubjectKey::Science, 1.0),
    )
    .with_teacher_minutes(60.0)
    .with_task_banks(banks);

    let lesson = LessonPlanner::default().plan(&request);

    let subjects: Vec<SubjectKey> = lesson.tasks.iter().map(|t| t.subject).collect();
    let first_science = subjects
        .iter()
        .position(|s| *s == SubjectKey::Science)
        .unwrap();
    assert!(subjects[..first_science]
        .iter()
        .all(|s| *s == SubjectKey::Music));

    for subject in [SubjectKey::Music, SubjectKey::Science] {
        let roles: Vec<TaskRole> = lesson
            .tasks
            .iter()
            .filter(|t| t.subject == subject)
            .map(|t| t.role)
            .collect();
        let first_extension = roles
            .iter()
            .position(|r| *r == TaskRole::Extension)
            .unwrap_or(roles.len());
        assert!(roles[first_extension..]
            .iter()
            .all(|r| *r == TaskRole::Extension));
        assert_eq!(&roles[..2], &[TaskRole::Core, TaskRole::Core]);
    }
}

#[test]
fn test_planning_is_repeatable() {
    let mut banks = TaskBanks::new();
    banks.insert(
        SubjectKey::Mathematics,
        TaskBank::new(vec![LessonTask::new("m1")])
            .with_extensions(vec![LessonTask::new("m2"), LessonTask::new("m3")]),
    );
    let request = LessonRequest::new(SubjectWeights::new().with(SubjectKey::Mathematics, 3.0))
        .with_teacher_minutes(75.0)
        .with_task_banks(banks);

    let planner = LessonPlanner::default();
    let a = planner.plan(&request);
    let b = planner.plan(&request);

    assert_eq!(a.plan, b.plan);
    assert_eq!(a.tasks, b.tasks);
    assert_ne!(a.id, b.id);
}
