//! Command-line interface for nelie-planner.
//!
//! Provides commands for lesson planning, activity validation and duration
//! resolution.

mod commands;

pub use commands::{parse_cli, run, run_with_cli, Cli, Commands};
