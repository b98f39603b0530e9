//! Lifeflow CLI - Command-line interface for the Lifeflow engine
//!
//! Commands:
//! - insights: Compute the full insights report for a snapshot
//! - score: Score a single check-in
//! - recalculate: Refresh every stored score in a snapshot
//! - export: Write a snapshot as CSV or JSON
//! - validate: Check a snapshot for contract violations
//! - doctor: Diagnose configuration and environment

use clap::{Parser, Subcommand, ValueEnum};
use std::fs;
use std::io::{self, Read};
use std::path::{Path, PathBuf};
use std::process::ExitCode;

use chrono::{NaiveDate, Utc};
use tracing::{debug, info};
use tracing_subscriber::EnvFilter;

use lifeflow_engine::config::{EngineConfig, DEFAULT_CONFIG_FILE};
use lifeflow_engine::dates::{format_date_key, parse_date_key, today, TimePeriod};
use lifeflow_engine::export::{export_csv, export_json};
use lifeflow_engine::pipeline::{parse_snapshot, score_checkin, InsightsProcessor};
use lifeflow_engine::scoring::{wellbeing_score, HabitImpactMap};
use lifeflow_engine::store::LifeflowStore;
use lifeflow_engine::types::{DailyEntry, HabitCompletion, Snapshot};
use lifeflow_engine::validation::validate_snapshot;
use lifeflow_engine::{ComputeError, ENGINE_VERSION, PRODUCER_NAME};

/// Lifeflow - habit and mood insights engine
#[derive(Parser)]
#[command(name = "lifeflow")]
#[command(author = "Lifeflow Contributors")]
#[command(version = ENGINE_VERSION)]
#[command(about = "Compute consistency scores, streaks and correlations", long_about = None)]
struct Cli {
    /// Configuration file (defaults to ./lifeflow.toml when present)
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    /// Enable debug logging
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Compute the insights report for a snapshot
    Insights {
        /// Snapshot or export file (use - for stdin)
        #[arg(short, long)]
        input: PathBuf,

        /// Output file path (use - for stdout)
        #[arg(short, long, default_value = "-")]
        output: PathBuf,

        /// Reference date (YYYY-MM-DD), defaults to the local date
        #[arg(long)]
        today: Option<String>,

        /// Lookback period for trends and habit rates
        #[arg(long)]
        period: Option<TimePeriod>,

        /// Pretty-print the report
        #[arg(long)]
        pretty: bool,
    },

    /// Score a single check-in
    Score {
        #[arg(long)]
        mood: f64,

        #[arg(long)]
        energy: f64,

        #[arg(long)]
        sleep: f64,

        /// Snapshot providing the habit definitions
        #[arg(short, long)]
        input: Option<PathBuf>,

        /// Habit ids completed today
        #[arg(long, value_delimiter = ',')]
        done: Vec<String>,

        /// Habit ids tracked but not completed today
        #[arg(long, value_delimiter = ',')]
        skipped: Vec<String>,
    },

    /// Recompute every stored score with the current habits
    Recalculate {
        /// Input file path (use - for stdin)
        #[arg(short, long)]
        input: PathBuf,

        /// Output file path (use - for stdout)
        #[arg(short, long)]
        output: PathBuf,
    },

    /// Export a snapshot as CSV or JSON
    Export {
        /// Input file path (use - for stdin)
        #[arg(short, long)]
        input: PathBuf,

        /// Output file path (use - for stdout)
        #[arg(short, long, default_value = "-")]
        output: PathBuf,

        /// Export format
        #[arg(long, default_value = "csv")]
        format: ExportFormat,
    },

    /// Check a snapshot for contract violations
    Validate {
        /// Input file path (use - for stdin)
        #[arg(short, long)]
        input: PathBuf,

        /// Output validation report as JSON
        #[arg(long)]
        json: bool,
    },

    /// Diagnose configuration and environment
    Doctor {
        /// Output as JSON
        #[arg(long)]
        json: bool,
    },
}

#[derive(Clone, ValueEnum)]
enum ExportFormat {
    /// Spreadsheet-friendly, one column per active habit
    Csv,
    /// Full export document
    Json,
}

fn main() -> ExitCode {
    let cli = Cli::parse();
    let config = EngineConfig::load_or_default(cli.config.as_deref());
    init_logging(cli.verbose, config.as_ref().ok());

    match run(cli, config) {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!(
                "{}",
                serde_json::to_string(&CliError::from(e))
                    .unwrap_or_else(|_| "Unknown error".to_string())
            );
            ExitCode::FAILURE
        }
    }
}

/// `RUST_LOG` wins, then `--verbose`, then the configured level
fn init_logging(verbose: bool, config: Option<&EngineConfig>) {
    let level = if verbose {
        "debug"
    } else {
        config.map_or("info", |c| c.logging.level.as_str())
    };
    let filter = EnvFilter::try_from_default_env()
        .or_else(|_| EnvFilter::try_new(level))
        .unwrap_or_else(|_| EnvFilter::new("info"));

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(io::stderr)
        .init();
}

fn run(cli: Cli, config: Result<EngineConfig, ComputeError>) -> Result<(), LifeflowCliError> {
    match cli.command {
        Commands::Insights {
            input,
            output,
            today,
            period,
            pretty,
        } => cmd_insights(&input, &output, today.as_deref(), period, pretty, config?),

        Commands::Score {
            mood,
            energy,
            sleep,
            input,
            done,
            skipped,
        } => cmd_score(mood, energy, sleep, input.as_deref(), &done, &skipped),

        Commands::Recalculate { input, output } => cmd_recalculate(&input, &output),

        Commands::Export {
            input,
            output,
            format,
        } => cmd_export(&input, &output, format),

        Commands::Validate { input, json } => cmd_validate(&input, json),

        Commands::Doctor { json } => cmd_doctor(cli.config.as_deref(), config, json),
    }
}

fn read_input(input: &Path) -> Result<String, LifeflowCliError> {
    if input.to_string_lossy() == "-" {
        let mut buffer = String::new();
        io::stdin().read_to_string(&mut buffer)?;
        Ok(buffer)
    } else {
        Ok(fs::read_to_string(input)?)
    }
}

fn write_output(output: &Path, data: &str) -> Result<(), LifeflowCliError> {
    if output.to_string_lossy() == "-" {
        print!("{}", data);
        if !data.ends_with('\n') {
            println!();
        }
    } else {
        fs::write(output, data)?;
        info!(path = %output.display(), bytes = data.len(), "wrote output");
    }
    Ok(())
}

fn read_snapshot(input: &Path) -> Result<Snapshot, LifeflowCliError> {
    Ok(parse_snapshot(&read_input(input)?)?)
}

fn cmd_insights(
    input: &Path,
    output: &Path,
    today_arg: Option<&str>,
    period: Option<TimePeriod>,
    pretty: bool,
    mut config: EngineConfig,
) -> Result<(), LifeflowCliError> {
    let reference: NaiveDate = match today_arg {
        Some(key) => parse_date_key(key)?,
        None => today(),
    };

    // Flags override the config file
    if let Some(period) = period {
        config.insights.period = period;
    }
    if pretty {
        config.output.pretty = true;
    }

    let snapshot = read_snapshot(input)?;
    debug!(
        habits = snapshot.habits.len(),
        entries = snapshot.entries.len(),
        today = %reference,
        period = %config.insights.period,
        "computing insights"
    );

    let processor = InsightsProcessor::with_config(config);
    let report = processor.process(&snapshot, reference);
    let data = if processor.config().output.pretty {
        serde_json::to_string_pretty(&report)?
    } else {
        serde_json::to_string(&report)?
    };

    write_output(output, &data)
}

fn cmd_score(
    mood: f64,
    energy: f64,
    sleep: f64,
    input: Option<&Path>,
    done: &[String],
    skipped: &[String],
) -> Result<(), LifeflowCliError> {
    let habits = match input {
        Some(path) => read_snapshot(path)?.habits,
        None => Vec::new(),
    };
    let impacts = HabitImpactMap::from_habits(&habits);

    let completions: Vec<HabitCompletion> = done
        .iter()
        .map(|id| HabitCompletion::new(id.clone(), true))
        .chain(skipped.iter().map(|id| HabitCompletion::new(id.clone(), false)))
        .collect();
    let entry =
        DailyEntry::new(format_date_key(today()), mood, energy, sleep).with_completions(completions);

    let result = ScoreReport {
        health_score: score_checkin(&entry, &habits)?,
        wellbeing_score: wellbeing_score(&entry),
        habits_counted: entry
            .habit_completions
            .iter()
            .filter(|c| impacts.get(&c.habit_id).is_some())
            .count(),
    };

    println!("{}", serde_json::to_string_pretty(&result)?);
    Ok(())
}

fn cmd_recalculate(input: &Path, output: &Path) -> Result<(), LifeflowCliError> {
    let mut store = LifeflowStore::from_snapshot(read_snapshot(input)?);
    let changed = store.recalculate_scores();
    info!(changed, entries = store.entries().len(), "recalculated scores");

    let data = export_json(store.snapshot(), Utc::now())?;
    write_output(output, &data)
}

fn cmd_export(input: &Path, output: &Path, format: ExportFormat) -> Result<(), LifeflowCliError> {
    let snapshot = read_snapshot(input)?;

    let data = match format {
        ExportFormat::Csv => export_csv(&snapshot)?,
        ExportFormat::Json => export_json(&snapshot, Utc::now())?,
    };

    write_output(output, &data)
}

fn cmd_validate(input: &Path, json: bool) -> Result<(), LifeflowCliError> {
    let snapshot = read_snapshot(input)?;
    let findings = validate_snapshot(&snapshot);

    let report = ValidationReport {
        total_habits: snapshot.habits.len(),
        total_wishes: snapshot.wishes.len(),
        total_entries: snapshot.entries.len(),
        findings: findings
            .iter()
            .map(|f| ValidationFindingDetail {
                location: f.location.clone(),
                error: f.error.to_string(),
            })
            .collect(),
    };

    if json {
        println!("{}", serde_json::to_string_pretty(&report)?);
    } else {
        println!("Validation Report");
        println!("=================");
        println!("Habits:   {}", report.total_habits);
        println!("Wishes:   {}", report.total_wishes);
        println!("Entries:  {}", report.total_entries);
        println!("Findings: {}", report.findings.len());

        if !report.findings.is_empty() {
            println!("\nFindings:");
            for finding in &report.findings {
                println!("  - {}: {}", finding.location, finding.error);
            }
        }
    }

    if report.findings.is_empty() {
        Ok(())
    } else {
        Err(LifeflowCliError::ValidationFailed(report.findings.len()))
    }
}

fn cmd_doctor(
    config_path: Option<&Path>,
    config: Result<EngineConfig, ComputeError>,
    json: bool,
) -> Result<(), LifeflowCliError> {
    let mut checks: Vec<DoctorCheck> = Vec::new();

    checks.push(DoctorCheck {
        name: "engine_version".to_string(),
        status: CheckStatus::Ok,
        message: format!("Lifeflow engine {}", ENGINE_VERSION),
    });

    let path = config_path.unwrap_or_else(|| Path::new(DEFAULT_CONFIG_FILE));
    match config {
        Ok(config) if path.exists() => checks.push(DoctorCheck {
            name: "config".to_string(),
            status: CheckStatus::Ok,
            message: format!(
                "{} valid (period {}, rolling window {})",
                path.display(),
                config.insights.period,
                config.insights.rolling_window
            ),
        }),
        Ok(_) => checks.push(DoctorCheck {
            name: "config".to_string(),
            status: CheckStatus::Warning,
            message: format!("{} not found, using defaults", path.display()),
        }),
        Err(e) => checks.push(DoctorCheck {
            name: "config".to_string(),
            status: CheckStatus::Error,
            message: e.to_string(),
        }),
    }

    checks.push(DoctorCheck {
        name: "today".to_string(),
        status: CheckStatus::Ok,
        message: format!("Local date is {}", today()),
    });

    // stdin can feed -i -
    let stdin_check = if atty::is(atty::Stream::Stdin) {
        DoctorCheck {
            name: "stdin".to_string(),
            status: CheckStatus::Ok,
            message: "stdin is a TTY (interactive mode)".to_string(),
        }
    } else {
        DoctorCheck {
            name: "stdin".to_string(),
            status: CheckStatus::Ok,
            message: "stdin is a pipe (ready for -i -)".to_string(),
        }
    };
    checks.push(stdin_check);

    let report = DoctorReport {
        producer: PRODUCER_NAME.to_string(),
        version: ENGINE_VERSION.to_string(),
        checks,
    };

    if json {
        println!("{}", serde_json::to_string_pretty(&report)?);
    } else {
        println!("Lifeflow Doctor Report");
        println!("======================");
        println!("Producer: {}", report.producer);
        println!("Version:  {}", report.version);
        println!("\nChecks:");

        for check in &report.checks {
            let status_icon = match check.status {
                CheckStatus::Ok => "[OK]",
                CheckStatus::Warning => "[WARN]",
                CheckStatus::Error => "[ERR]",
            };
            println!("  {} {}: {}", status_icon, check.name, check.message);
        }
    }

    let has_errors = report
        .checks
        .iter()
        .any(|c| matches!(c.status, CheckStatus::Error));
    if has_errors {
        Err(LifeflowCliError::DoctorFailed)
    } else {
        Ok(())
    }
}

// Error types

#[derive(Debug)]
enum LifeflowCliError {
    Io(io::Error),
    Compute(ComputeError),
    Json(serde_json::Error),
    ValidationFailed(usize),
    DoctorFailed,
}

impl From<io::Error> for LifeflowCliError {
    fn from(e: io::Error) -> Self {
        LifeflowCliError::Io(e)
    }
}

impl From<ComputeError> for LifeflowCliError {
    fn from(e: ComputeError) -> Self {
        LifeflowCliError::Compute(e)
    }
}

impl From<serde_json::Error> for LifeflowCliError {
    fn from(e: serde_json::Error) -> Self {
        LifeflowCliError::Json(e)
    }
}

#[derive(serde::Serialize)]
struct CliError {
    code: String,
    message: String,
    hint: Option<String>,
}

impl From<LifeflowCliError> for CliError {
    fn from(e: LifeflowCliError) -> Self {
        match e {
            LifeflowCliError::Io(e) => CliError {
                code: "IO_ERROR".to_string(),
                message: e.to_string(),
                hint: Some("Check file paths and permissions".to_string()),
            },
            LifeflowCliError::Compute(e) => {
                let (code, hint) = match &e {
                    ComputeError::InvalidDate(_) => ("INVALID_DATE", "Dates use YYYY-MM-DD"),
                    ComputeError::ConfigError(_) => {
                        ("CONFIG_ERROR", "Run 'lifeflow doctor' to check the config file")
                    }
                    ComputeError::JsonError(_) | ComputeError::ParseError(_) => {
                        ("PARSE_ERROR", "Ensure input is a snapshot or export document")
                    }
                    ComputeError::Validation(_) => {
                        ("VALIDATION_ERROR", "Run 'lifeflow validate' for details")
                    }
                    ComputeError::Io(_) => ("IO_ERROR", "Check file paths and permissions"),
                    _ => ("COMPUTE_ERROR", "Check input data"),
                };
                CliError {
                    code: code.to_string(),
                    message: e.to_string(),
                    hint: Some(hint.to_string()),
                }
            }
            LifeflowCliError::Json(e) => CliError {
                code: "JSON_ERROR".to_string(),
                message: e.to_string(),
                hint: Some("Check JSON syntax".to_string()),
            },
            LifeflowCliError::ValidationFailed(count) => CliError {
                code: "VALIDATION_FAILED".to_string(),
                message: format!("{} validation findings", count),
                hint: Some("Fix the findings, or run 'lifeflow recalculate' for stale scores".to_string()),
            },
            LifeflowCliError::DoctorFailed => CliError {
                code: "DOCTOR_FAILED".to_string(),
                message: "One or more health checks failed".to_string(),
                hint: Some("Review the doctor report for details".to_string()),
            },
        }
    }
}

// Report types

#[derive(serde::Serialize)]
#[serde(rename_all = "camelCase")]
struct ScoreReport {
    health_score: f64,
    wellbeing_score: f64,
    habits_counted: usize,
}

#[derive(serde::Serialize)]
struct ValidationReport {
    total_habits: usize,
    total_wishes: usize,
    total_entries: usize,
    findings: Vec<ValidationFindingDetail>,
}

#[derive(serde::Serialize)]
struct ValidationFindingDetail {
    location: String,
    error: String,
}

#[derive(serde::Serialize)]
struct DoctorReport {
    producer: String,
    version: String,
    checks: Vec<DoctorCheck>,
}

#[derive(serde::Serialize)]
struct DoctorCheck {
    name: String,
    status: CheckStatus,
    message: String,
}

#[derive(serde::Serialize)]
enum CheckStatus {
    Ok,
    Warning,
    Error,
}
