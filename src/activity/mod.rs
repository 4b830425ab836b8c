//! AI-generated activities: model, JSON extraction and validation.
//!
//! ```
//! use nelie_planner::activity::{validate_and_normalize, Activity};
//!
//! let quiz = Activity::new("mcq", "What is 7 x 6?")
//!     .with_choices(["36", "42", "48"], 1)
//!     .with_hint("Seven sixes")
//!     .with_minutes(10.0);
//!
//! let activities = validate_and_normalize(vec![quiz], 150);
//! assert_eq!(activities[0].estimated_time_min, 150.0);
//! ```

pub mod extract;
pub mod model;
pub mod validator;

pub use extract::{extract_activity_payload, extract_json_value};
pub use model::{distinct_kinds, total_minutes, Activity};
pub use validator::{
    check_activity, validate_and_normalize, ActivityValidator, DropReason, DroppedActivity,
    ValidatedActivities, ValidationReport, DEFAULT_MIN_ACTIVITY_MINUTES,
    DEFAULT_MIN_DISTINCT_KINDS, DEFAULT_TARGET_MINUTES, DEFAULT_TIME_TOLERANCE,
};
