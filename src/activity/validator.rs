//! Post-generation validation and time normalization.
//!
//! Generated activities are filtered by a structural validity check, then
//! their time estimates are shifted so the set lands near the lesson target.
//! Invalid items are dropped, never repaired.

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::config::PlannerConfig;

use super::model::{distinct_kinds, total_minutes, Activity};

/// Default lesson target for generated activities.
pub const DEFAULT_TARGET_MINUTES: u32 = 150;

/// Gap between target and actual time tolerated without rescaling.
pub const DEFAULT_TIME_TOLERANCE: f64 = 5.0;

/// Minimum minutes any returned activity carries.
pub const DEFAULT_MIN_ACTIVITY_MINUTES: f64 = 3.0;

/// Distinct kinds a lesson should show before a variety warning.
pub const DEFAULT_MIN_DISTINCT_KINDS: usize = 3;

const MIN_CHOICE_OPTIONS: usize = 3;
const MIN_RUBRIC_ENTRIES: usize = 2;

/// Why an activity was dropped.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", content = "detail", rename_all = "snake_case")]
pub enum DropReason {
    /// Question missing or blank.
    MissingQuestion,
    /// Neither three options with a correct index nor a two-entry rubric.
    NoAnswerFormat,
    /// No hints.
    MissingHints,
    /// Entry could not be read as an activity.
    Malformed(String),
}

impl std::fmt::Display for DropReason {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            DropReason::MissingQuestion => write!(f, "missing question"),
            DropReason::NoAnswerFormat => write!(
                f,
                "needs {} options with a correct index or a rubric of {}",
                MIN_CHOICE_OPTIONS, MIN_RUBRIC_ENTRIES
            ),
            DropReason::MissingHints => write!(f, "missing hints"),
            DropReason::Malformed(detail) => write!(f, "malformed activity: {}", detail),
        }
    }
}

/// A dropped input entry.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DroppedActivity {
    /// Position in the input list.
    pub index: usize,
    pub reason: DropReason,
}

/// What the validator did to a batch of activities.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ValidationReport {
    pub target_minutes: u32,
    pub input_count: usize,
    pub retained_count: usize,
    pub dropped: Vec<DroppedActivity>,
    pub distinct_kinds: usize,
    pub variety_warning: bool,
    /// Retained minutes before normalization.
    pub original_minutes: f64,
    /// Retained minutes after normalization and the per-activity floor.
    pub normalized_minutes: f64,
    /// Per-activity shift, when normalization ran.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub applied_delta: Option<f64>,
}

impl ValidationReport {
    /// True when fewer than `min_activities` survived validation.
    pub fn is_sparse(&self, min_activities: usize) -> bool {
        self.retained_count < min_activities
    }

    pub fn dropped_count(&self) -> usize {
        self.dropped.len()
    }
}

/// Validated activities with the report describing how they were produced.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ValidatedActivities {
    pub activities: Vec<Activity>,
    pub report: ValidationReport,
}

/// Checks a single activity against the structural rules.
pub fn check_activity(activity: &Activity) -> Result<(), DropReason> {
    if !activity.has_question() {
        return Err(DropReason::MissingQuestion);
    }

    let choice_ok =
        activity.option_count() >= MIN_CHOICE_OPTIONS && activity.correct_index.is_some();
    let rubric_ok = activity.rubric_len() >= MIN_RUBRIC_ENTRIES;
    if !choice_ok && !rubric_ok {
        return Err(DropReason::NoAnswerFormat);
    }

    if activity.hint_count() == 0 {
        return Err(DropReason::MissingHints);
    }

    Ok(())
}

/// Filters and time-normalizes generated activities.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ActivityValidator {
    time_tolerance: f64,
    min_activity_minutes: f64,
    min_distinct_kinds: usize,
}

impl Default for ActivityValidator {
    fn default() -> Self {
        Self {
            time_tolerance: DEFAULT_TIME_TOLERANCE,
            min_activity_minutes: DEFAULT_MIN_ACTIVITY_MINUTES,
            min_distinct_kinds: DEFAULT_MIN_DISTINCT_KINDS,
        }
    }
}

impl ActivityValidator {
    pub fn new(time_tolerance: f64, min_activity_minutes: f64, min_distinct_kinds: usize) -> Self {
        Self {
            time_tolerance,
            min_activity_minutes,
            min_distinct_kinds,
        }
    }

    pub fn from_config(config: &PlannerConfig) -> Self {
        Self::new(
            config.time_tolerance_minutes,
            config.min_activity_minutes,
            config.min_distinct_kinds,
        )
    }

    /// Validates and normalizes, returning the activities and a report.
    ///
    /// 1. Activities failing [`check_activity`] are dropped with a warning.
    /// 2. Fewer distinct kinds than `min(min_distinct_kinds, retained)` sets
    ///    the variety warning. Nothing is dropped for it.
    /// 3. When the retained total differs from `target_minutes` by more than
    ///    the tolerance, every activity is shifted by
    ///    `trunc((target - total) / retained)`.
    ///
    /// Every returned activity then carries at least the per-activity floor,
    /// whether or not a shift happened.
    pub fn validate_with_report(
        &self,
        activities: Vec<Activity>,
        target_minutes: u32,
    ) -> ValidatedActivities {
        self.run(activities.into_iter().map(Ok).collect(), target_minutes)
    }

    /// Like [`validate_with_report`](Self::validate_with_report), for raw
    /// JSON. A non-array value yields no activities. Array entries that do
    /// not deserialize are dropped as malformed.
    pub fn validate_value(&self, value: &Value, target_minutes: u32) -> ValidatedActivities {
        let Some(items) = value.as_array() else {
            tracing::warn!("activity payload is not an array; nothing to validate");
            return ValidatedActivities {
                activities: Vec::new(),
                report: ValidationReport {
                    target_minutes,
                    ..ValidationReport::default()
                },
            };
        };

        let parsed = items
            .iter()
            .map(|item| {
                Activity::deserialize(item).map_err(|e| DropReason::Malformed(e.to_string()))
            })
            .collect();
        self.run(parsed, target_minutes)
    }

    /// Returns only the activities.
    pub fn validate_and_normalize(
        &self,
        activities: Vec<Activity>,
        target_minutes: u32,
    ) -> Vec<Activity> {
        self.validate_with_report(activities, target_minutes)
            .activities
    }

    fn run(
        &self,
        entries: Vec<Result<Activity, DropReason>>,
        target_minutes: u32,
    ) -> ValidatedActivities {
        let mut report = ValidationReport {
            target_minutes,
            input_count: entries.len(),
            ..ValidationReport::default()
        };

        let mut retained = Vec::with_capacity(entries.len());
        for (index, entry) in entries.into_iter().enumerate() {
            match entry.and_then(|a| check_activity(&a).map(|()| a)) {
                Ok(activity) => retained.push(activity),
                Err(reason) => {
                    tracing::warn!(index, reason = %reason, "dropping invalid activity");
                    report.dropped.push(DroppedActivity { index, reason });
                }
            }
        }

        report.retained_count = retained.len();
        report.distinct_kinds = distinct_kinds(&retained);
        let wanted_kinds = self.min_distinct_kinds.min(retained.len());
        if report.distinct_kinds < wanted_kinds {
            report.variety_warning = true;
            tracing::warn!(
                distinct_kinds = report.distinct_kinds,
                wanted = wanted_kinds,
                "generated activities lack variety"
            );
        }

        report.original_minutes = total_minutes(&retained);
        let target = f64::from(target_minutes);
        let gap = target - report.original_minutes;

        if !retained.is_empty() && gap.abs() > self.time_tolerance {
            let delta = (gap / retained.len() as f64).trunc();
            for activity in &mut retained {
                activity.estimated_time_min = activity.minutes() + delta;
            }
            report.applied_delta = Some(delta);
            tracing::debug!(
                delta,
                original_minutes = report.original_minutes,
                target_minutes,
                "normalized activity times"
            );
        }

        for activity in &mut retained {
            activity.estimated_time_min = activity.minutes().max(self.min_activity_minutes);
        }
        report.normalized_minutes = total_minutes(&retained);

        ValidatedActivities {
            activities: retained,
            report,
        }
    }
}

/// Validates and normalizes with default settings.
pub fn validate_and_normalize(activities: Vec<Activity>, target_minutes: u32) -> Vec<Activity> {
    ActivityValidator::default().validate_and_normalize(activities, target_minutes)
}
