//! Timed lesson composition.
//!
//! Walks a minute plan subject by subject and fills each subject's slot from
//! its task bank: all core tasks first, then extensions while the subject is
//! still under its allocation.

use serde::{Deserialize, Serialize};

use crate::budget::MinutePlan;
use crate::config::PlannerConfig;
use crate::subject::SubjectKey;

use super::task::{LessonTask, ScheduledTask, TaskBanks, TaskRole};

/// Fallback duration for a core task without an estimate.
pub const DEFAULT_CORE_TASK_MINUTES: f64 = 8.0;

/// Fallback duration for an extension task without an estimate.
pub const DEFAULT_EXTENSION_TASK_MINUTES: f64 = 5.0;

/// Planned versus composed time for one subject.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SubjectTiming {
    pub subject: SubjectKey,
    pub planned_minutes: u32,
    pub actual_minutes: f64,
    pub core_tasks: usize,
    pub extension_tasks: usize,
}

impl SubjectTiming {
    /// Positive when the subject runs over its allocation.
    pub fn drift(&self) -> f64 {
        self.actual_minutes - f64::from(self.planned_minutes)
    }
}

/// The ordered task list for a lesson.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Composition {
    pub tasks: Vec<ScheduledTask>,
    /// Sum of the scheduled tasks' effective minutes. May differ from the
    /// plan total.
    pub total_minutes: f64,
    pub subjects: Vec<SubjectTiming>,
    /// Plan subjects that had no task bank.
    pub skipped: Vec<SubjectKey>,
}

impl Composition {
    pub fn task_count(&self) -> usize {
        self.tasks.len()
    }

    pub fn is_empty(&self) -> bool {
        self.tasks.is_empty()
    }

    /// Lesson tasks in presentation order.
    pub fn lesson_tasks(&self) -> impl Iterator<Item = &LessonTask> {
        self.tasks.iter().map(|t| &t.task)
    }
}

/// Builds an ordered task list from a minute plan and task banks.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct LessonComposer {
    core_minutes: f64,
    extension_minutes: f64,
}

impl Default for LessonComposer {
    fn default() -> Self {
        Self::new(DEFAULT_CORE_TASK_MINUTES, DEFAULT_EXTENSION_TASK_MINUTES)
    }
}

impl LessonComposer {
    pub fn new(core_minutes: f64, extension_minutes: f64) -> Self {
        Self {
            core_minutes,
            extension_minutes,
        }
    }

    pub fn from_config(config: &PlannerConfig) -> Self {
        Self::new(config.core_task_minutes, config.extension_task_minutes)
    }

    /// Composes the lesson.
    ///
    /// For each plan entry in order, every core task in the subject's bank is
    /// scheduled. Extensions follow in bank order while the subject's running
    /// total is below its planned minutes, so the last extension may
    /// overshoot. Subjects without a bank are skipped and contribute nothing.
    /// Banks are only read.
    pub fn compose(&self, plan: &MinutePlan, banks: &TaskBanks) -> Composition {
        let mut composition = Composition::default();
        let mut clock = 0.0;

        for allocation in plan {
            let Some(bank) = banks.get(&allocation.subject) else {
                tracing::debug!(subject = %allocation.subject, "no task bank for subject, skipping");
                composition.skipped.push(allocation.subject);
                continue;
            };

            let planned = f64::from(allocation.minutes);
            let mut subject_total = 0.0;
            let mut timing = SubjectTiming {
                subject: allocation.subject,
                planned_minutes: allocation.minutes,
                actual_minutes: 0.0,
                core_tasks: 0,
                extension_tasks: 0,
            };

            for task in &bank.core {
                let minutes = task.minutes_or(self.core_minutes);
                composition.tasks.push(ScheduledTask {
                    subject: allocation.subject,
                    role: TaskRole::Core,
                    minutes,
                    starts_at_minute: clock,
                    task: task.clone(),
                });
                clock += minutes;
                subject_total += minutes;
                timing.core_tasks += 1;
            }

            let mut extensions = bank.extensions.iter();
            while subject_total < planned {
                let Some(task) = extensions.next() else {
                    break;
                };
                let minutes = task.minutes_or(self.extension_minutes);
                composition.tasks.push(ScheduledTask {
                    subject: allocation.subject,
                    role: TaskRole::Extension,
                    minutes,
                    starts_at_minute: clock,
                    task: task.clone(),
                });
                clock += minutes;
                subject_total += minutes;
                timing.extension_tasks += 1;
            }

            timing.actual_minutes = subject_total;
            if subject_total < planned {
                tracing::debug!(
                    subject = %allocation.subject,
                    planned,
                    actual = subject_total,
                    "task bank exhausted before subject allocation was filled"
                );
            }
            composition.subjects.push(timing);
        }

        composition.total_minutes = clock;
        composition
    }
}

/// Composes a lesson with the default task durations.
pub fn compose_lesson(plan: &MinutePlan, banks: &TaskBanks) -> Composition {
    LessonComposer::default().compose(plan, banks)
}
