//! CLI command definitions for nelie-planner.
//!
//! Each command reads its input file, runs one pipeline stage and prints
//! pretty JSON to stdout or to `--output`.

use std::fs;
use std::path::{Path, PathBuf};

use anyhow::Context;
use clap::Parser;
use serde::Serialize;
use tracing::info;

use crate::activity::{extract_activity_payload, ActivityValidator};
use crate::budget::DurationResolver;
use crate::config::PlannerConfig;
use crate::lesson::LessonRequest;
use crate::planner::LessonPlanner;

/// Lesson time budgeting and activity normalization.
#[derive(Parser)]
#[command(name = "nelie-planner")]
#[command(about = "Plan timed lessons and normalize generated activities")]
#[command(version)]
#[command(
    long_about = "nelie-planner splits a lesson's minutes across weighted subjects, fills each subject from its task bank, and validates AI-generated activities.\n\nExample usage:\n  nelie-planner plan --input lesson.yaml\n  nelie-planner validate --input reply.json --target 90"
)]
pub struct Cli {
    /// The subcommand to execute.
    #[command(subcommand)]
    pub command: Commands,

    /// Log level (trace, debug, info, warn, error).
    #[arg(short, long, default_value = "info", global = true)]
    pub log_level: String,

    /// Planner configuration file (YAML). NELIE_* variables override it.
    #[arg(short, long, env = "NELIE_CONFIG", global = true)]
    pub config: Option<PathBuf>,
}

/// Available CLI subcommands.
#[derive(clap::Subcommand)]
pub enum Commands {
    /// Plan a lesson from a request file.
    Plan(PlanArgs),

    /// Validate and time-normalize generated activities.
    Validate(ValidateArgs),

    /// Show the lesson length the resolver picks.
    Resolve(ResolveArgs),
}

/// Arguments for `nelie-planner plan`.
#[derive(Parser, Debug)]
pub struct PlanArgs {
    /// Lesson request (.json, .yaml or .yml).
    #[arg(short, long)]
    pub input: PathBuf,

    /// Write the lesson here instead of stdout.
    #[arg(short, long)]
    pub output: Option<PathBuf>,
}

/// Arguments for `nelie-planner validate`.
#[derive(Parser, Debug)]
pub struct ValidateArgs {
    /// Generated activities: a JSON file or a raw model reply.
    #[arg(short, long)]
    pub input: PathBuf,

    /// Target lesson minutes. Defaults to the configured activity target.
    #[arg(short, long)]
    pub target: Option<u32>,

    /// Print the validation report alongside the activities.
    #[arg(long)]
    pub report: bool,

    /// Write the result here instead of stdout.
    #[arg(short, long)]
    pub output: Option<PathBuf>,
}

/// Arguments for `nelie-planner resolve`.
#[derive(Parser, Debug)]
pub struct ResolveArgs {
    /// Minutes requested by the teacher.
    #[arg(long)]
    pub teacher: Option<f64>,

    /// Minutes set by the school calendar.
    #[arg(long)]
    pub calendar: Option<f64>,
}

/// Parse CLI arguments and return the Cli struct.
///
/// This allows main.rs to read the log level before running commands.
pub fn parse_cli() -> Cli {
    Cli::parse()
}

/// Run the CLI by parsing arguments and executing the command.
pub fn run() -> anyhow::Result<()> {
    run_with_cli(parse_cli())
}

/// Run the CLI with the parsed arguments.
pub fn run_with_cli(cli: Cli) -> anyhow::Result<()> {
    let config = load_config(cli.config.as_deref())?;
    match cli.command {
        Commands::Plan(args) => run_plan_command(args, config),
        Commands::Validate(args) => run_validate_command(args, &config),
        Commands::Resolve(args) => run_resolve_command(args, &config),
    }
}

/// Defaults, then the config file if given, then `NELIE_*` overrides.
fn load_config(path: Option<&Path>) -> anyhow::Result<PlannerConfig> {
    let base = match path {
        Some(path) => PlannerConfig::from_yaml_file(path)
            .with_context(|| format!("Failed to load config from {}", path.display()))?,
        None => PlannerConfig::default(),
    };
    base.apply_env()
        .context("Invalid NELIE_* environment configuration")
}

fn run_plan_command(args: PlanArgs, config: PlannerConfig) -> anyhow::Result<()> {
    let request = LessonRequest::from_path(&args.input)
        .with_context(|| format!("Failed to read lesson request {}", args.input.display()))?;

    let planner = LessonPlanner::new(config)?;
    let lesson = planner.plan(&request);

    info!(
        tasks = lesson.tasks.len(),
        target_minutes = lesson.target_minutes,
        drift = lesson.drift(),
        "lesson planned"
    );
    emit(&lesson, args.output.as_deref())
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct ResolveOutput {
    minutes: u32,
    min_minutes: u32,
    max_minutes: u32,
}

fn run_resolve_command(args: ResolveArgs, config: &PlannerConfig) -> anyhow::Result<()> {
    let resolver = DurationResolver::from_config(config);
    let (min_minutes, max_minutes) = resolver.bounds();
    let output = ResolveOutput {
        minutes: resolver.resolve(args.teacher, args.calendar),
        min_minutes,
        max_minutes,
    };
    emit(&output, None)
}

fn run_validate_command(args: ValidateArgs, config: &PlannerConfig) -> anyhow::Result<()> {
    let raw = fs::read_to_string(&args.input)
        .with_context(|| format!("Failed to read {}", args.input.display()))?;
    let payload = extract_activity_payload(&raw)
        .with_context(|| format!("No activity JSON in {}", args.input.display()))?;

    let target = args.target.unwrap_or(config.activity_target_minutes);
    let validated = ActivityValidator::from_config(config).validate_value(&payload, target);

    info!(
        retained = validated.report.retained_count,
        dropped = validated.report.dropped_count(),
        normalized_minutes = validated.report.normalized_minutes,
        "activities validated"
    );

    if args.report {
        emit(&validated, args.output.as_deref())
    } else {
        emit(&validated.activities, args.output.as_deref())
    }
}

fn emit<T: Serialize>(value: &T, output: Option<&Path>) -> anyhow::Result<()> {
    let json = serde_json::to_string_pretty(value)?;
    match output {
        Some(path) => {
            fs::write(path, json).with_context(|| format!("Failed to write {}", path.display()))?;
            info!(path = %path.display(), "output written");
        }
        None => println!("{}", json),
    }
    Ok(())
}
