//! Lesson tasks and per-subject task banks.
//!
//! Banks are read-only templates supplied by the curriculum store. The
//! composer copies tasks out of them and never writes back.

use indexmap::IndexMap;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use crate::subject::SubjectKey;

/// One atomic unit of work presented to a learner.
///
/// Only the fields the planner reads are typed. Everything else the bank
/// carries (instructions, options, media) is kept in `extra` and passed
/// through untouched.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LessonTask {
    pub id: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub subject: Option<SubjectKey>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub est_minutes: Option<f64>,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl LessonTask {
    pub fn new(id: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            subject: None,
            est_minutes: None,
            extra: Map::new(),
        }
    }

    pub fn with_minutes(mut self, minutes: f64) -> Self {
        self.est_minutes = Some(minutes);
        self
    }

    pub fn with_subject(mut self, subject: SubjectKey) -> Self {
        self.subject = Some(subject);
        self
    }

    pub fn with_extra(mut self, key: impl Into<String>, value: impl Into<Value>) -> Self {
        self.extra.insert(key.into(), value.into());
        self
    }

    /// The task's estimate, or `fallback` when it is missing, negative or
    /// not a number.
    pub fn minutes_or(&self, fallback: f64) -> f64 {
        match self.est_minutes {
            Some(m) if m.is_finite() && m >= 0.0 => m,
            _ => fallback,
        }
    }
}

/// Required and optional tasks for one subject.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct TaskBank {
    #[serde(default)]
    pub core: Vec<LessonTask>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub extensions: Vec<LessonTask>,
}

impl TaskBank {
    pub fn new(core: Vec<LessonTask>) -> Self {
        Self {
            core,
            extensions: Vec::new(),
        }
    }

    pub fn with_extensions(mut self, extensions: Vec<LessonTask>) -> Self {
        self.extensions = extensions;
        self
    }

    pub fn is_empty(&self) -> bool {
        self.core.is_empty() && self.extensions.is_empty()
    }
}

/// Task banks keyed by subject, in curriculum order.
pub type TaskBanks = IndexMap<SubjectKey, TaskBank>;

/// Whether a scheduled task came from a bank's core or extension list.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TaskRole {
    Core,
    Extension,
}

/// A task placed into a composed lesson.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ScheduledTask {
    pub subject: SubjectKey,
    pub role: TaskRole,
    /// Effective duration after defaults were applied.
    pub minutes: f64,
    /// Offset from the start of the lesson.
    pub starts_at_minute: f64,
    pub task: LessonTask,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_minutes_fallback() {
        assert_eq!(LessonTask::new("a").minutes_or(8.0), 8.0);
        assert_eq!(LessonTask::new("a").with_minutes(12.0).minutes_or(8.0), 12.0);
        assert_eq!(LessonTask::new("a").with_minutes(-3.0).minutes_or(8.0), 8.0);
        assert_eq!(LessonTask::new("a").with_minutes(f64::NAN).minutes_or(5.0), 5.0);
        assert_eq!(LessonTask::new("a").with_minutes(0.0).minutes_or(5.0), 0.0);
    }

    #[test]
    fn test_extra_fields_survive_round_trip() {
        let json = r#"{
            "id": "math-1",
            "estMinutes": 10,
            "instructions": "Add the fractions",
            "options": ["1/2", "3/4"]
        }"#;

        let task: LessonTask = serde_json::from_str(json).unwrap();
        assert_eq!(task.id, "math-1");
        assert_eq!(task.est_minutes, Some(10.0));
        assert_eq!(task.extra["instructions"], "Add the fractions");

        let back = serde_json::to_value(&task).unwrap();
        assert_eq!(back["options"][1], "3/4");
        assert_eq!(back["estMinutes"], 10.0);
        assert!(back.get("subject").is_none());
    }

    #[test]
    fn test_bank_extensions_optional() {
        let bank: TaskBank = serde_json::from_str(r#"{"core": [{"id": "c1"}]}"#).unwrap();
        assert_eq!(bank.core.len(), 1);
        assert!(bank.extensions.is_empty());
        assert!(!bank.is_empty());
    }
}
