//! nelie-planner: lesson time budgeting for NELIE.
//!
//! This library turns subject weights and a lesson length into a timed task
//! list, and validates AI-generated activities against a time budget.

// Core modules
pub mod activity;
pub mod budget;
pub mod cache;
pub mod cli;
pub mod config;
pub mod error;
pub mod generation;
pub mod lesson;
pub mod planner;
pub mod settings;
pub mod subject;

// Re-export commonly used types
pub use activity::{validate_and_normalize, Activity, ActivityValidator, ValidationReport};
pub use budget::{distribute_minutes, resolve_lesson_minutes, MinutePlan};
pub use config::PlannerConfig;
pub use error::{ConfigError, GenerationError, RequestError};
pub use generation::{ActivityGenerator, GenerationRequest, GenerationService};
pub use lesson::{compose_lesson, LessonRequest, LessonTask, TaskBank};
pub use planner::{ComposedLesson, LessonPlanner};
pub use settings::WeightSettings;
pub use subject::{SubjectKey, SubjectWeights};
