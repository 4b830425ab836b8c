//! Lesson planning requests and file loading.

use std::path::Path;

use indexmap::IndexSet;
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};

use crate::error::RequestError;
use crate::settings::WeightSettings;
use crate::subject::{SubjectKey, SubjectWeights};

use super::task::TaskBanks;

/// Everything the planner needs to build one lesson.
///
/// `subjectWeights` is the teacher layer and `schoolWeights` the school
/// layer. When `subjects` is empty the lesson covers every subject named by
/// either weight layer or by a task bank.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct LessonRequest {
    pub subject_weights: SubjectWeights,
    pub school_weights: SubjectWeights,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub subjects: Vec<SubjectKey>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub teacher_minutes: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub calendar_minutes: Option<f64>,
    pub task_banks: TaskBanks,
}

impl LessonRequest {
    pub fn new(subject_weights: SubjectWeights) -> Self {
        Self {
            subject_weights,
            ..Self::default()
        }
    }

    pub fn with_teacher_minutes(mut self, minutes: f64) -> Self {
        self.teacher_minutes = Some(minutes);
        self
    }

    pub fn with_calendar_minutes(mut self, minutes: f64) -> Self {
        self.calendar_minutes = Some(minutes);
        self
    }

    pub fn with_school_weights(mut self, weights: SubjectWeights) -> Self {
        self.school_weights = weights;
        self
    }

    pub fn with_task_banks(mut self, banks: TaskBanks) -> Self {
        self.task_banks = banks;
        self
    }

    pub fn weight_settings(&self) -> WeightSettings {
        WeightSettings::new(self.school_weights.clone(), self.subject_weights.clone())
    }

    /// Subjects the lesson covers, in planning order.
    pub fn subjects_in_scope(&self) -> Vec<SubjectKey> {
        if !self.subjects.is_empty() {
            return self.subjects.clone();
        }

        let mut subjects: IndexSet<SubjectKey> =
            self.weight_settings().configured_subjects().collect();
        subjects.extend(self.task_banks.keys().copied());
        subjects.into_iter().collect()
    }

    /// Reads a request from a `.json`, `.yaml` or `.yml` file.
    pub fn from_path(path: impl AsRef<Path>) -> Result<Self, RequestError> {
        load_document(path)
    }
}

/// Deserializes a JSON or YAML document, picking the format from the file
/// extension.
pub fn load_document<T: DeserializeOwned>(path: impl AsRef<Path>) -> Result<T, RequestError> {
    let path = path.as_ref();
    let extension = path
        .extension()
        .and_then(|e| e.to_str())
        .map(str::to_ascii_lowercase)
        .unwrap_or_default();

    let content = std::fs::read_to_string(path)?;
    let document = match extension.as_str() {
        "json" => serde_json::from_str(&content)?,
        "yaml" | "yml" => serde_yaml::from_str(&content)?,
        _ => return Err(RequestError::UnsupportedFormat(path.display().to_string())),
    };

    tracing::debug!(path = %path.display(), "loaded document");
    Ok(document)
}
