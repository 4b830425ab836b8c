//! Lesson time budgeting.
//!
//! Two pure stages feed the lesson composer:
//!
//! 1. [`DurationResolver`] turns calendar/teacher hints into a lesson length.
//! 2. [`MinuteDistributor`] splits that length across weighted subjects.
//!
//! ```
//! use nelie_planner::budget::{distribute_minutes, resolve_lesson_minutes};
//! use nelie_planner::subject::{SubjectKey, SubjectWeights};
//!
//! let total = resolve_lesson_minutes(None, None);
//! let weights = SubjectWeights::new()
//!     .with(SubjectKey::Mathematics, 10.0)
//!     .with(SubjectKey::English, 5.0);
//! let plan = distribute_minutes(&weights, total);
//! assert_eq!(plan.total_minutes(), 150);
//! ```

pub mod distributor;
pub mod duration;

pub use distributor::{
    distribute_minutes, MinuteAllocation, MinuteDistributor, MinutePlan, DEFAULT_FLOOR_MINUTES,
};
pub use duration::{
    resolve_lesson_minutes, DurationResolver, DEFAULT_LESSON_MINUTES, MAX_LESSON_MINUTES,
    MIN_LESSON_MINUTES,
};
