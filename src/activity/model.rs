//! Generated learning activities.

use std::collections::HashSet;

use serde::{Deserialize, Deserializer, Serialize};
use serde_json::{Map, Value};

/// One AI-generated learning item (quiz question, open prompt, ...).
///
/// Fields the validator does not read stay in `extra` and are written back
/// unchanged.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Activity {
    #[serde(default, deserialize_with = "lenient_string")]
    pub kind: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub question: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub options: Option<Vec<Value>>,
    #[serde(
        default,
        deserialize_with = "lenient_index",
        skip_serializing_if = "Option::is_none"
    )]
    pub correct_index: Option<i64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub rubric: Option<Vec<Value>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub hints: Option<Vec<String>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub explanation: Option<String>,
    #[serde(default, deserialize_with = "lenient_minutes")]
    pub estimated_time_min: f64,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl Activity {
    pub fn new(kind: impl Into<String>, question: impl Into<String>) -> Self {
        Self {
            kind: kind.into(),
            question: Some(question.into()),
            ..Self::default()
        }
    }

    /// Multiple-choice builder: sets the options and the correct index.
    pub fn with_choices<I, S>(mut self, options: I, correct_index: i64) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.options = Some(
            options
                .into_iter()
                .map(|o| Value::String(o.into()))
                .collect(),
        );
        self.correct_index = Some(correct_index);
        self
    }

    pub fn with_rubric<I, S>(mut self, criteria: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.rubric = Some(
            criteria
                .into_iter()
                .map(|c| Value::String(c.into()))
                .collect(),
        );
        self
    }

    pub fn with_hint(mut self, hint: impl Into<String>) -> Self {
        self.hints.get_or_insert_with(Vec::new).push(hint.into());
        self
    }

    pub fn with_minutes(mut self, minutes: f64) -> Self {
        self.estimated_time_min = minutes;
        self
    }

    /// Estimated minutes, with non-finite values read as 0.
    pub fn minutes(&self) -> f64 {
        if self.estimated_time_min.is_finite() {
            self.estimated_time_min
        } else {
            0.0
        }
    }

    pub fn has_question(&self) -> bool {
        self.question
            .as_deref()
            .is_some_and(|q| !q.trim().is_empty())
    }

    pub fn option_count(&self) -> usize {
        self.options.as_ref().map_or(0, Vec::len)
    }

    pub fn rubric_len(&self) -> usize {
        self.rubric.as_ref().map_or(0, Vec::len)
    }

    pub fn hint_count(&self) -> usize {
        self.hints.as_ref().map_or(0, Vec::len)
    }
}

// Optional fields from generator output degrade to defaults instead of
// failing the whole activity.

fn lenient_string<'de, D: Deserializer<'de>>(deserializer: D) -> Result<String, D::Error> {
    Ok(match Value::deserialize(deserializer)? {
        Value::String(s) => s,
        _ => String::new(),
    })
}

fn lenient_minutes<'de, D: Deserializer<'de>>(deserializer: D) -> Result<f64, D::Error> {
    let minutes = match Value::deserialize(deserializer)? {
        Value::Number(n) => n.as_f64(),
        Value::String(s) => s.trim().parse::<f64>().ok(),
        _ => None,
    };
    Ok(minutes.filter(|m| m.is_finite()).unwrap_or(0.0))
}

fn lenient_index<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Option<i64>, D::Error> {
    Ok(match Value::deserialize(deserializer)? {
        Value::Number(n) => n.as_i64().or_else(|| {
            n.as_f64()
                .filter(|f| f.fract() == 0.0 && f.abs() <= i64::MAX as f64)
                .map(|f| f as i64)
        }),
        _ => None,
    })
}

/// Number of distinct `kind` values in a set of activities.
pub fn distinct_kinds(activities: &[Activity]) -> usize {
    activities
        .iter()
        .map(|a| a.kind.as_str())
        .collect::<HashSet<_>>()
        .len()
}

/// Total estimated minutes.
pub fn total_minutes(activities: &[Activity]) -> f64 {
    activities.iter().map(Activity::minutes).sum()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_deserialize_camel_case() {
        let json = r#"{
            "kind": "mcq",
            "question": "2 + 2?",
            "options": ["3", "4", "5"],
            "correctIndex": 1,
            "hints": ["Count on your fingers"],
            "estimatedTimeMin": 4,
            "imageUrl": "https://example.org/apples.png"
        }"#;

        let activity: Activity = serde_json::from_str(json).unwrap();
        assert_eq!(activity.kind, "mcq");
        assert_eq!(activity.option_count(), 3);
        assert_eq!(activity.correct_index, Some(1));
        assert_eq!(activity.hint_count(), 1);
        assert!((activity.minutes() - 4.0).abs() < f64::EPSILON);
        assert_eq!(activity.extra["imageUrl"], "https://example.org/apples.png");

        let back = serde_json::to_value(&activity).unwrap();
        assert_eq!(back["correctIndex"], 1);
        assert_eq!(back["imageUrl"], "https://example.org/apples.png");
        assert!(back.get("rubric").is_none());
    }

    #[test]
    fn test_missing_time_defaults_to_zero() {
        let activity: Activity = serde_json::from_str(r#"{"kind": "open"}"#).unwrap();
        assert_eq!(activity.minutes(), 0.0);
        assert!(!activity.has_question());
    }

    #[test]
    fn test_null_and_odd_optional_fields_fall_back() {
        let json = r#"{
            "kind": null,
            "question": "Pick one",
            "correctIndex": 1.0,
            "estimatedTimeMin": "about five"
        }"#;

        let activity: Activity = serde_json::from_str(json).unwrap();
        assert_eq!(activity.kind, "");
        assert_eq!(activity.correct_index, Some(1));
        assert_eq!(activity.minutes(), 0.0);

        let activity: Activity =
            serde_json::from_str(r#"{"estimatedTimeMin": "12", "correctIndex": 0.5}"#).unwrap();
        assert_eq!(activity.minutes(), 12.0);
        assert_eq!(activity.correct_index, None);
    }

    #[test]
    fn test_blank_question_is_not_a_question() {
        let activity = Activity::new("mcq", "   ");
        assert!(!activity.has_question());
    }

    #[test]
    fn test_distinct_kinds() {
        let activities = vec![
            Activity::new("mcq", "a"),
            Activity::new("mcq", "b"),
            Activity::new("open", "c"),
        ];
        assert_eq!(distinct_kinds(&activities), 2);
        assert_eq!(distinct_kinds(&[]), 0);
    }
}
