//! Layered subject weight settings.
//!
//! A school leader sets baseline weights; a teacher may override any of
//! them. Subjects neither layer mentions fall back to a default weight.

use indexmap::IndexSet;
use serde::{Deserialize, Serialize};

use crate::subject::{SubjectKey, SubjectWeights, DEFAULT_SUBJECT_WEIGHT};

/// School and teacher weight layers.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct WeightSettings {
    pub school: SubjectWeights,
    pub teacher: SubjectWeights,
}

impl WeightSettings {
    pub fn new(school: SubjectWeights, teacher: SubjectWeights) -> Self {
        Self { school, teacher }
    }

    /// Teacher-only settings.
    pub fn teacher(weights: SubjectWeights) -> Self {
        Self {
            school: SubjectWeights::new(),
            teacher: weights,
        }
    }

    pub fn is_empty(&self) -> bool {
        self.school.is_empty() && self.teacher.is_empty()
    }

    /// Weight for one subject: teacher, then school, then `default_weight`.
    pub fn weight_for(&self, subject: SubjectKey, default_weight: f64) -> f64 {
        self.teacher
            .get(subject)
            .or_else(|| self.school.get(subject))
            .unwrap_or(default_weight)
    }

    /// Subjects either layer mentions, school order first.
    pub fn configured_subjects(&self) -> impl Iterator<Item = SubjectKey> + '_ {
        let mut seen = IndexSet::new();
        seen.extend(self.school.subjects());
        seen.extend(self.teacher.subjects());
        seen.into_iter()
    }

    /// Builds the effective weight map for `subjects`, in the order given.
    /// Duplicates keep their first position.
    pub fn merged(
        &self,
        subjects: impl IntoIterator<Item = SubjectKey>,
        default_weight: f64,
    ) -> SubjectWeights {
        let mut merged = SubjectWeights::new();
        for subject in subjects {
            if merged.get(subject).is_none() {
                merged.insert(subject, self.weight_for(subject, default_weight));
            }
        }
        merged
    }

    /// Effective weights for every subject either layer mentions.
    pub fn merged_configured(&self) -> SubjectWeights {
        self.merged(self.configured_subjects(), DEFAULT_SUBJECT_WEIGHT)
    }
}
