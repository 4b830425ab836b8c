//! Lesson orchestration.
//!
//! [`LessonPlanner`] runs the budgeting pipeline for one request:
//! weight merge, duration resolution, minute distribution, then task
//! composition.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::budget::{DurationResolver, MinuteDistributor, MinutePlan};
use crate::config::PlannerConfig;
use crate::error::ConfigError;
use crate::lesson::{LessonComposer, LessonRequest, ScheduledTask, SubjectTiming};
use crate::subject::{SubjectKey, SubjectWeights};

/// A fully planned lesson.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ComposedLesson {
    pub id: Uuid,
    pub generated_at: DateTime<Utc>,
    /// Resolved lesson length.
    pub target_minutes: u32,
    pub weights: SubjectWeights,
    pub plan: MinutePlan,
    pub tasks: Vec<ScheduledTask>,
    /// Sum of the scheduled tasks' minutes.
    pub total_minutes: f64,
    pub subjects: Vec<SubjectTiming>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub skipped_subjects: Vec<SubjectKey>,
}

impl ComposedLesson {
    /// Composed minutes minus target minutes.
    pub fn drift(&self) -> f64 {
        self.total_minutes - f64::from(self.target_minutes)
    }

    pub fn task_ids(&self) -> impl Iterator<Item = &str> {
        self.tasks.iter().map(|t| t.task.id.as_str())
    }
}

/// Plans lessons with a fixed configuration.
#[derive(Debug, Clone)]
pub struct LessonPlanner {
    config: PlannerConfig,
    resolver: DurationResolver,
    distributor: MinuteDistributor,
    composer: LessonComposer,
}

impl Default for LessonPlanner {
    fn default() -> Self {
        Self::build(PlannerConfig::default())
    }
}

impl LessonPlanner {
    /// Creates a planner after validating `config`.
    pub fn new(config: PlannerConfig) -> Result<Self, ConfigError> {
        config.validate()?;
        Ok(Self::build(config))
    }

    fn build(config: PlannerConfig) -> Self {
        Self {
            resolver: DurationResolver::from_config(&config),
            distributor: MinuteDistributor::from_config(&config),
            composer: LessonComposer::from_config(&config),
            config,
        }
    }

    pub fn config(&self) -> &PlannerConfig {
        &self.config
    }

    /// Lesson length for the request's hints.
    pub fn resolve_minutes(&self, request: &LessonRequest) -> u32 {
        self.resolver
            .resolve(request.teacher_minutes, request.calendar_minutes)
    }

    /// Effective subject weights after merging school and teacher layers.
    pub fn weights_for(&self, request: &LessonRequest) -> SubjectWeights {
        request
            .weight_settings()
            .merged(request.subjects_in_scope(), self.config.default_weight)
    }

    /// Plans a lesson. Never fails: missing inputs degrade to defaults and an
    /// empty subject set produces an empty lesson.
    pub fn plan(&self, request: &LessonRequest) -> ComposedLesson {
        let weights = self.weights_for(request);
        if !weights.is_empty() && !weights.has_positive() {
            tracing::debug!("no positive subject weight; subjects share the budget evenly");
        }

        let target_minutes = self.resolve_minutes(request);
        let plan = self.distributor.distribute(&weights, target_minutes);
        let composition = self.composer.compose(&plan, &request.task_banks);

        let lesson = ComposedLesson {
            id: Uuid::new_v4(),
            generated_at: Utc::now(),
            target_minutes,
            weights,
            plan,
            tasks: composition.tasks,
            total_minutes: composition.total_minutes,
            subjects: composition.subjects,
            skipped_subjects: composition.skipped,
        };

        tracing::info!(
            lesson_id = %lesson.id,
            target_minutes,
            subjects = lesson.plan.len(),
            tasks = lesson.tasks.len(),
            total_minutes = lesson.total_minutes,
            "planned lesson"
        );
        lesson
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::lesson::{LessonTask, TaskBank, TaskBanks};

    fn banks() -> TaskBanks {
        let mut banks = TaskBanks::new();
        banks.insert(
            SubjectKey::Mathematics,
            TaskBank::new(vec![LessonTask::new("m1").with_minutes(20.0)]).with_extensions(vec![
                LessonTask::new("m2").with_minutes(20.0),
                LessonTask::new("m3").with_minutes(20.0),
            ]),
        );
        banks.insert(
            SubjectKey::English,
            TaskBank::new(vec![LessonTask::new("e1").with_minutes(10.0)])
                .with_extensions(vec![LessonTask::new("e2").with_minutes(10.0)]),
        );
        banks
    }

    #[test]
    fn test_plan_runs_full_pipeline() {
        let request = LessonRequest::new(
            SubjectWeights::new()
                .with(SubjectKey::Mathematics, 2.0)
                .with(SubjectKey::English, 1.0),
        )
        .with_teacher_minutes(60.0)
        .with_task_banks(banks());

        let lesson = LessonPlanner::default().plan(&request);

        assert_eq!(lesson.target_minutes, 60);
        assert_eq!(lesson.plan.minutes_for(SubjectKey::Mathematics), Some(40));
        assert_eq!(lesson.plan.minutes_for(SubjectKey::English), Some(20));
        assert_eq!(lesson.task_ids().collect::<Vec<_>>(), vec!["m1", "m2", "e1", "e2"]);
        assert!((lesson.total_minutes - 60.0).abs() < f64::EPSILON);
        assert!(lesson.drift().abs() < f64::EPSILON);
    }

    #[test]
    fn test_unweighted_bank_subjects_get_default_weight() {
        let request = LessonRequest::default().with_task_banks(banks());
        let planner = LessonPlanner::default();

        let weights = planner.weights_for(&request);
        assert_eq!(weights.get(SubjectKey::Mathematics), Some(5.0));
        assert_eq!(weights.get(SubjectKey::English), Some(5.0));

        let lesson = planner.plan(&request);
        assert_eq!(lesson.target_minutes, 150);
        assert_eq!(lesson.plan.total_minutes(), 150);
    }

    #[test]
    fn test_empty_request_gives_empty_lesson() {
        let lesson = LessonPlanner::default().plan(&LessonRequest::default());
        assert!(lesson.plan.is_empty());
        assert!(lesson.tasks.is_empty());
        assert_eq!(lesson.total_minutes, 0.0);
    }

    #[test]
    fn test_weighted_subject_without_bank_is_skipped() {
        let request = LessonRequest::new(
            SubjectWeights::new()
                .with(SubjectKey::Music, 1.0)
                .with(SubjectKey::English, 1.0),
        )
        .with_task_banks(banks());

        let lesson = LessonPlanner::default().plan(&request);
        assert_eq!(lesson.skipped_subjects, vec![SubjectKey::Music]);
        assert!(lesson.task_ids().all(|id| id.starts_with('e') || id.starts_with('m')));
    }

    #[test]
    fn test_invalid_config_rejected() {
        let config = PlannerConfig::default().with_floor_minutes(0);
        assert!(LessonPlanner::new(config).is_err());
    }

    #[test]
    fn test_config_floor_used() {
        let config = PlannerConfig::default().with_floor_minutes(20);
        let planner = LessonPlanner::new(config).unwrap();
        let request = LessonRequest::new(
            SubjectWeights::new()
                .with(SubjectKey::Mathematics, 100.0)
                .with(SubjectKey::Music, 1.0),
        )
        .with_teacher_minutes(60.0);

        let lesson = planner.plan(&request);
        assert_eq!(lesson.plan.minutes_for(SubjectKey::Music), Some(20));
        assert_eq!(lesson.plan.minutes_for(SubjectKey::Mathematics), Some(40));
    }
}
