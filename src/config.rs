//! Planner configuration.
//!
//! Holds the numeric policy the budgeting pipeline runs with: duration
//! bounds, per-subject floor, task time fallbacks and validator tolerances.
//! Values can come from defaults, a YAML file, or `NELIE_*` environment
//! variables.

use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::error::ConfigError;
use crate::subject::DEFAULT_SUBJECT_WEIGHT;

/// Configuration for the lesson planner and activity validator.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct PlannerConfig {
    // Duration settings
    /// Lesson length used when neither calendar nor teacher supplies one.
    pub default_lesson_minutes: u32,
    /// Shortest lesson the resolver will return.
    pub min_lesson_minutes: u32,
    /// Longest lesson the resolver will return.
    pub max_lesson_minutes: u32,

    // Distribution settings
    /// Minimum minutes every listed subject starts with.
    pub floor_minutes: u32,
    /// Weight given to subjects no configuration layer mentions.
    pub default_weight: f64,

    // Composition settings
    /// Fallback duration for core tasks without an estimate.
    pub core_task_minutes: f64,
    /// Fallback duration for extension tasks without an estimate.
    pub extension_task_minutes: f64,

    // Validation settings
    /// Target total for generated activities when the caller gives none.
    pub activity_target_minutes: u32,
    /// Allowed gap between target and actual activity time before rescaling.
    pub time_tolerance_minutes: f64,
    /// Floor applied to every activity after normalization.
    pub min_activity_minutes: f64,
    /// Number of distinct activity kinds a lesson should show.
    pub min_distinct_kinds: usize,

    // Cache settings
    /// Maximum number of generated responses kept in memory.
    pub response_cache_capacity: usize,
}

impl Default for PlannerConfig {
    fn default() -> Self {
        Self {
            default_lesson_minutes: 150,
            min_lesson_minutes: 60,
            max_lesson_minutes: 360,

            floor_minutes: 5,
            default_weight: DEFAULT_SUBJECT_WEIGHT,

            core_task_minutes: 8.0,
            extension_task_minutes: 5.0,

            activity_target_minutes: 150,
            time_tolerance_minutes: 5.0,
            min_activity_minutes: 3.0,
            min_distinct_kinds: 3,

            response_cache_capacity: 128,
        }
    }
}

impl PlannerConfig {
    /// Creates a new configuration with default values.
    pub fn new() -> Self {
        Self::default()
    }

    /// Loads configuration from a YAML file. Missing fields keep their
    /// defaults.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError` if the file cannot be read, does not parse, or
    /// fails validation.
    pub fn from_yaml_file(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path.as_ref())?;
        let config: Self = serde_yaml::from_str(&content)?;
        config.validate()?;
        tracing::debug!(path = %path.as_ref().display(), "planner config loaded");
        Ok(config)
    }

    /// Creates configuration from environment variables.
    ///
    /// # Environment Variables
    ///
    /// - `NELIE_DEFAULT_LESSON_MINUTES` (default: 150)
    /// - `NELIE_MIN_LESSON_MINUTES` (default: 60)
    /// - `NELIE_MAX_LESSON_MINUTES` (default: 360)
    /// - `NELIE_FLOOR_MINUTES` (default: 5)
    /// - `NELIE_DEFAULT_WEIGHT` (default: 5.0)
    /// - `NELIE_CORE_TASK_MINUTES` (default: 8.0)
    /// - `NELIE_EXTENSION_TASK_MINUTES` (default: 5.0)
    /// - `NELIE_ACTIVITY_TARGET_MINUTES` (default: 150)
    /// - `NELIE_TIME_TOLERANCE_MINUTES` (default: 5.0)
    /// - `NELIE_MIN_ACTIVITY_MINUTES` (default: 3.0)
    /// - `NELIE_MIN_DISTINCT_KINDS` (default: 3)
    /// - `NELIE_RESPONSE_CACHE_CAPACITY` (default: 128)
    ///
    /// # Errors
    ///
    /// Returns `ConfigError` if a variable has an invalid value.
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::default().apply_env()
    }

    /// Overrides fields from `NELIE_*` environment variables that are set.
    pub fn apply_env(mut self) -> Result<Self, ConfigError> {
        if let Some(v) = env_value("NELIE_DEFAULT_LESSON_MINUTES")? {
            self.default_lesson_minutes = v;
        }
        if let Some(v) = env_value("NELIE_MIN_LESSON_MINUTES")? {
            self.min_lesson_minutes = v;
        }
        if let Some(v) = env_value("NELIE_MAX_LESSON_MINUTES")? {
            self.max_lesson_minutes = v;
        }
        if let Some(v) = env_value("NELIE_FLOOR_MINUTES")? {
            self.floor_minutes = v;
        }
        if let Some(v) = env_value("NELIE_DEFAULT_WEIGHT")? {
            self.default_weight = v;
        }
        if let Some(v) = env_value("NELIE_CORE_TASK_MINUTES")? {
            self.core_task_minutes = v;
        }
        if let Some(v) = env_value("NELIE_EXTENSION_TASK_MINUTES")? {
            self.extension_task_minutes = v;
        }
        if let Some(v) = env_value("NELIE_ACTIVITY_TARGET_MINUTES")? {
            self.activity_target_minutes = v;
        }
        if let Some(v) = env_value("NELIE_TIME_TOLERANCE_MINUTES")? {
            self.time_tolerance_minutes = v;
        }
        if let Some(v) = env_value("NELIE_MIN_ACTIVITY_MINUTES")? {
            self.min_activity_minutes = v;
        }
        if let Some(v) = env_value("NELIE_MIN_DISTINCT_KINDS")? {
            self.min_distinct_kinds = v;
        }
        if let Some(v) = env_value("NELIE_RESPONSE_CACHE_CAPACITY")? {
            self.response_cache_capacity = v;
        }

        self.validate()?;
        Ok(self)
    }

    /// Validates the configuration values.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError::ValidationFailed` if any values are invalid.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.min_lesson_minutes == 0 {
            return Err(ConfigError::ValidationFailed(
                "min_lesson_minutes must be greater than 0".to_string(),
            ));
        }

        if self.min_lesson_minutes > self.max_lesson_minutes {
            return Err(ConfigError::ValidationFailed(
                "min_lesson_minutes cannot exceed max_lesson_minutes".to_string(),
            ));
        }

        if !(self.min_lesson_minutes..=self.max_lesson_minutes)
            .contains(&self.default_lesson_minutes)
        {
            return Err(ConfigError::ValidationFailed(
                "default_lesson_minutes must lie between min_lesson_minutes and max_lesson_minutes"
                    .to_string(),
            ));
        }

        if self.floor_minutes == 0 {
            return Err(ConfigError::ValidationFailed(
                "floor_minutes must be greater than 0".to_string(),
            ));
        }

        if !self.default_weight.is_finite() || self.default_weight < 0.0 {
            return Err(ConfigError::ValidationFailed(
                "default_weight must be a non-negative number".to_string(),
            ));
        }

        if !(self.core_task_minutes > 0.0) || !(self.extension_task_minutes > 0.0) {
            return Err(ConfigError::ValidationFailed(
                "core_task_minutes and extension_task_minutes must be greater than 0".to_string(),
            ));
        }

        if self.activity_target_minutes == 0 {
            return Err(ConfigError::ValidationFailed(
                "activity_target_minutes must be greater than 0".to_string(),
            ));
        }

        if !self.time_tolerance_minutes.is_finite() || self.time_tolerance_minutes < 0.0 {
            return Err(ConfigError::ValidationFailed(
                "time_tolerance_minutes cannot be negative".to_string(),
            ));
        }

        if !self.min_activity_minutes.is_finite() || self.min_activity_minutes < 0.0 {
            return Err(ConfigError::ValidationFailed(
                "min_activity_minutes cannot be negative".to_string(),
            ));
        }

        if self.response_cache_capacity == 0 {
            return Err(ConfigError::ValidationFailed(
                "response_cache_capacity must be greater than 0".to_string(),
            ));
        }

        Ok(())
    }

    /// Builder method to set the fallback lesson length.
    pub fn with_default_lesson_minutes(mut self, minutes: u32) -> Self {
        self.default_lesson_minutes = minutes;
        self
    }

    /// Builder method to set the allowed lesson range.
    pub fn with_lesson_bounds(mut self, min: u32, max: u32) -> Self {
        self.min_lesson_minutes = min;
        self.max_lesson_minutes = max;
        self
    }

    /// Builder method to set the per-subject floor.
    pub fn with_floor_minutes(mut self, floor: u32) -> Self {
        self.floor_minutes = floor;
        self
    }

    /// Builder method to set the default subject weight.
    pub fn with_default_weight(mut self, weight: f64) -> Self {
        self.default_weight = weight;
        self
    }

    /// Builder method to set task time fallbacks.
    pub fn with_task_defaults(mut self, core: f64, extension: f64) -> Self {
        self.core_task_minutes = core;
        self.extension_task_minutes = extension;
        self
    }

    /// Builder method to set the validator's default target.
    pub fn with_activity_target_minutes(mut self, minutes: u32) -> Self {
        self.activity_target_minutes = minutes;
        self
    }

    /// Builder method to set the normalization tolerance.
    pub fn with_time_tolerance(mut self, minutes: f64) -> Self {
        self.time_tolerance_minutes = minutes;
        self
    }

    /// Builder method to set the per-activity floor.
    pub fn with_min_activity_minutes(mut self, minutes: f64) -> Self {
        self.min_activity_minutes = minutes;
        self
    }

    /// Builder method to set the variety target.
    pub fn with_min_distinct_kinds(mut self, kinds: usize) -> Self {
        self.min_distinct_kinds = kinds;
        self
    }

    /// Builder method to set the response cache capacity.
    pub fn with_response_cache_capacity(mut self, capacity: usize) -> Self {
        self.response_cache_capacity = capacity;
        self
    }
}

/// Reads and parses an environment variable if it is set.
fn env_value<T: std::str::FromStr>(key: &str) -> Result<Option<T>, ConfigError> {
    match std::env::var(key) {
        Ok(value) => parse_env_value(&value, key).map(Some),
        Err(_) => Ok(None),
    }
}

/// Parse an environment variable value into a type.
fn parse_env_value<T: std::str::FromStr>(value: &str, key: &str) -> Result<T, ConfigError> {
    value.trim().parse().map_err(|_| ConfigError::InvalidValue {
        key: key.to_string(),
        message: format!("could not parse '{}'", value),
    })
}
