//! Lesson tasks, requests and timed composition.

pub mod composer;
pub mod request;
pub mod task;

pub use composer::{
    compose_lesson, Composition, LessonComposer, SubjectTiming, DEFAULT_CORE_TASK_MINUTES,
    DEFAULT_EXTENSION_TASK_MINUTES,
};
pub use request::{load_document, LessonRequest};
pub use task::{LessonTask, ScheduledTask, TaskBank, TaskBanks, TaskRole};
