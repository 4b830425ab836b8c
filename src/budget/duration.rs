//! Lesson duration resolution.
//!
//! Picks the lesson length from the school calendar or the teacher's
//! setting and clamps it into the allowed range.

use crate::config::PlannerConfig;

/// Default lesson length in minutes.
pub const DEFAULT_LESSON_MINUTES: u32 = 150;

/// Shortest lesson the resolver will return.
pub const MIN_LESSON_MINUTES: u32 = 60;

/// Longest lesson the resolver will return.
pub const MAX_LESSON_MINUTES: u32 = 360;

/// Resolves the target lesson length.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DurationResolver {
    default_minutes: u32,
    min_minutes: u32,
    max_minutes: u32,
}

impl Default for DurationResolver {
    fn default() -> Self {
        Self {
            default_minutes: DEFAULT_LESSON_MINUTES,
            min_minutes: MIN_LESSON_MINUTES,
            max_minutes: MAX_LESSON_MINUTES,
        }
    }
}

impl DurationResolver {
    /// Creates a resolver with explicit bounds. `max` is raised to `min` if
    /// the two are inverted.
    pub fn new(default_minutes: u32, min_minutes: u32, max_minutes: u32) -> Self {
        Self {
            default_minutes,
            min_minutes,
            max_minutes: max_minutes.max(min_minutes),
        }
    }

    pub fn from_config(config: &PlannerConfig) -> Self {
        Self::new(
            config.default_lesson_minutes,
            config.min_lesson_minutes,
            config.max_lesson_minutes,
        )
    }

    /// Returns the lesson length in whole minutes.
    ///
    /// The calendar wins over the teacher; with neither the default applies.
    /// Non-finite hints count as absent. The result is always inside
    /// `[min, max]`.
    pub fn resolve(&self, teacher_minutes: Option<f64>, calendar_minutes: Option<f64>) -> u32 {
        let candidate = calendar_minutes
            .filter(|m| m.is_finite())
            .or_else(|| teacher_minutes.filter(|m| m.is_finite()))
            .unwrap_or(f64::from(self.default_minutes));

        let clamped = candidate
            .round()
            .clamp(f64::from(self.min_minutes), f64::from(self.max_minutes));

        // Clamped into u32 bounds above.
        clamped as u32
    }

    pub fn bounds(&self) -> (u32, u32) {
        (self.min_minutes, self.max_minutes)
    }
}

/// Resolves a lesson length with the default bounds.
pub fn resolve_lesson_minutes(teacher_minutes: Option<f64>, calendar_minutes: Option<f64>) -> u32 {
    DurationResolver::default().resolve(teacher_minutes, calendar_minutes)
}
