#![warn(missing_docs)]
//! tplbench CLI Library
//!
//! Benchmarks template-engine adapters (one subprocess per language) over a
//! shared set of template scenarios and fixture data, and keeps their rendered
//! output honest with snapshots.
//!
//! The binary is a thin wrapper around [`run`]:
//!
//! ```ignore
//! fn main() -> std::process::ExitCode {
//!     tplbench_cli::run()
//! }
//! ```

mod adapters;
mod config;
mod environment;
mod error;
mod executor;
mod planner;
mod scenarios;
mod supervisor;

pub use adapters::{AdapterConfig, AdapterName, AdapterRegistry};
pub use config::*;
pub use environment::RuntimeChecker;
pub use error::{AdapterError, AdapterErrorKind, BenchError, STDERR_LIMIT, stderr_tail};
pub use executor::{
    BenchOrchestrator, RunOptions, SnapshotMode, apply_snapshot_mode, build_report_meta,
};
pub use planner::{ScenarioPlan, build_plan};
pub use scenarios::{Scale, ScenarioInfo, ScenarioLoader};
pub use supervisor::{AdapterRun, AdapterRunner};

use clap::{Args, Parser, Subcommand};
use regex::Regex;
use serde::Serialize;
use std::path::{Path, PathBuf};
use std::process::ExitCode;
use tplbench_report::{
    ErrorPayload, OutputFormat, Report, RunMode, format_error_human, format_error_json,
    format_human_output, generate_json_report,
};
use tracing::debug;
use tracing_subscriber::EnvFilter;

/// tplbench CLI arguments
#[derive(Parser, Debug)]
#[command(name = "tplbench")]
#[command(
    author,
    version,
    about = "tplbench - benchmark template engines across language runtimes"
)]
pub struct Cli {
    /// Subcommand to execute
    #[command(subcommand)]
    pub command: Commands,

    /// Configuration file (default: tplbench.toml discovered upwards from the working directory)
    #[arg(long, global = true)]
    pub config: Option<PathBuf>,

    /// Verbose output
    #[arg(short, long, global = true)]
    pub verbose: bool,

    /// Output format: human, json
    #[arg(long, global = true, default_value = "human")]
    pub format: String,

    /// Output file (stdout if not specified)
    #[arg(short, long, global = true)]
    pub output: Option<PathBuf>,
}

/// CLI subcommands
#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Run one adapter against one scenario
    Run {
        /// Adapter to run
        #[arg(long, value_enum)]
        adapter: AdapterName,
        /// Scenario path, e.g. `filters/escape`
        #[arg(long)]
        scenario: String,
        /// Shared run options
        #[command(flatten)]
        common: RunArgs,
    },
    /// Run every adapter against every scenario
    All {
        /// Only run scenarios whose path matches this regex
        #[arg(long)]
        filter: Option<String>,
        /// Restrict to these adapters (repeatable)
        #[arg(long = "adapter", value_enum)]
        adapters: Vec<AdapterName>,
        /// Shared run options
        #[command(flatten)]
        common: RunArgs,
    },
    /// List discovered scenarios and adapter exclusions
    List {
        /// Only show exclusions for this adapter
        #[arg(long, value_enum)]
        adapter: Option<AdapterName>,
    },
    /// Print the default configuration
    Config,
}

/// Options shared by `run` and `all`; unset values fall back to `tplbench.toml`
#[derive(Args, Debug, Clone, Default)]
pub struct RunArgs {
    /// Fixture data scale
    #[arg(long, value_enum)]
    pub scale: Option<Scale>,

    /// Measured iterations per benchmark
    #[arg(long, short = 'n')]
    pub iterations: Option<u32>,

    /// Warmup iterations per benchmark
    #[arg(long)]
    pub warmup: Option<u32>,

    /// Timeout per adapter invocation (e.g. "30s", "500ms")
    #[arg(long)]
    pub timeout: Option<String>,

    /// Overwrite snapshots with the current rendered output
    #[arg(long, conflicts_with_all = ["verify", "compare_against", "against_baseline"])]
    pub update_snapshots: bool,

    /// Compare rendered output with the adapter's own snapshot
    #[arg(long)]
    pub verify: bool,

    /// Compare rendered output with another adapter's snapshot (implies --verify)
    #[arg(long, value_enum, conflicts_with = "against_baseline")]
    pub compare_against: Option<AdapterName>,

    /// Compare with the configured baseline adapter's snapshot (implies --verify)
    #[arg(long)]
    pub against_baseline: bool,
}

impl RunArgs {
    /// Snapshot handling selected by the flags
    pub fn snapshot_mode(&self, config: &BenchConfig) -> SnapshotMode {
        if self.update_snapshots {
            return SnapshotMode::Update;
        }
        let compare_against = if self.against_baseline {
            Some(config.verification.baseline)
        } else {
            self.compare_against
        };
        if self.verify || compare_against.is_some() {
            SnapshotMode::Verify { compare_against }
        } else {
            SnapshotMode::Off
        }
    }

    /// Layer the flags over the configuration file values
    pub fn to_options(&self, config: &BenchConfig) -> Result<RunOptions, BenchError> {
        let timeout = match &self.timeout {
            Some(value) => BenchConfig::parse_duration(value)
                .map_err(|e| BenchError::Config(format!("--timeout: {}", e)))?,
            None => config
                .timeout()
                .map_err(|e| BenchError::Config(format!("runner.timeout: {}", e)))?,
        };

        let options = RunOptions {
            scale: self.scale.unwrap_or(config.runner.scale),
            iterations: self.iterations.unwrap_or(config.runner.iterations),
            warmup: self.warmup.unwrap_or(config.runner.warmup),
            timeout,
            snapshots: self.snapshot_mode(config),
            filter: None,
            adapters: Vec::new(),
        };
        options.validate()?;
        Ok(options)
    }
}

/// Run the tplbench CLI with process arguments
pub fn run() -> ExitCode {
    let cli = Cli::parse();
    run_with_cli(cli)
}

/// Run the tplbench CLI with pre-parsed arguments
pub fn run_with_cli(cli: Cli) -> ExitCode {
    init_logging(cli.verbose);

    let format = match cli.format.parse::<OutputFormat>() {
        Ok(format) => format,
        Err(e) => {
            print_error(&BenchError::Config(e).to_payload(), OutputFormat::Human);
            return ExitCode::FAILURE;
        }
    };

    match dispatch(&cli, format) {
        Ok(0) => ExitCode::SUCCESS,
        Ok(_) => ExitCode::FAILURE,
        Err(e) => {
            print_error(&error_payload(&e), format);
            ExitCode::FAILURE
        }
    }
}

/// Install the stderr log subscriber; `RUST_LOG` overrides the default filter
fn init_logging(verbose: bool) {
    let default = if verbose {
        "tplbench=debug"
    } else {
        "tplbench=info"
    };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default));
    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .try_init();
}

/// Execute the subcommand, returning the process exit code
fn dispatch(cli: &Cli, format: OutputFormat) -> anyhow::Result<i32> {
    if let Commands::Config = cli.command {
        print!("{}", BenchConfig::default_toml());
        return Ok(0);
    }

    let config = load_config(cli.config.as_deref())?;
    let orchestrator = BenchOrchestrator::from_config(&config)?;

    match &cli.command {
        Commands::Run {
            adapter,
            scenario,
            common,
        } => {
            let options = common.to_options(&config)?;
            let runtime = build_runtime()?;
            let report = runtime.block_on(orchestrator.run_single(*adapter, scenario, &options))?;
            write_report(&report, format, cli.output.as_deref())?;
            report_single_failure(&report);
            Ok(report.exit_code())
        }
        Commands::All {
            filter,
            adapters,
            common,
        } => {
            let filter = filter
                .as_deref()
                .map(Regex::new)
                .transpose()
                .map_err(|e| BenchError::Config(format!("--filter: {}", e)))?;
            let options = RunOptions {
                filter,
                adapters: adapters.clone(),
                ..common.to_options(&config)?
            };
            let progress = matches!(format, OutputFormat::Human);
            let runtime = build_runtime()?;
            let report = runtime.block_on(orchestrator.run_all(&options, progress))?;
            write_report(&report, format, cli.output.as_deref())?;
            if report.exit_code() != 0 {
                eprintln!(
                    "\n{} snapshot verification(s) failed",
                    report.summary.verification.failed
                );
            }
            Ok(report.exit_code())
        }
        Commands::List { adapter } => {
            let scenarios = orchestrator.scenarios().list_all()?;
            let listing = scenario_listing(&scenarios, orchestrator.registry(), *adapter);
            let content = match format {
                OutputFormat::Json => serde_json::to_string_pretty(&listing)?,
                OutputFormat::Human => format_scenario_list(&listing, orchestrator.scenarios()),
            };
            emit(&content, cli.output.as_deref())?;
            Ok(0)
        }
        Commands::Config => Ok(0),
    }
}

/// `--config`, else discovery, else built-in defaults rooted at the working directory
fn load_config(path: Option<&Path>) -> Result<BenchConfig, BenchError> {
    let loaded = match path {
        Some(path) => BenchConfig::load(path),
        None => BenchConfig::discover().and_then(|found| match found {
            Some(config) => Ok(config),
            None => Ok(BenchConfig::defaults_at(&std::env::current_dir()?)),
        }),
    };
    loaded.map_err(|e| BenchError::Config(format!("{:#}", e)))
}

fn build_runtime() -> anyhow::Result<tokio::runtime::Runtime> {
    tokio::runtime::Builder::new_current_thread()
        .enable_all()
        .build()
        .map_err(|e| anyhow::anyhow!("failed to start async runtime: {}", e))
}

fn write_report(report: &Report, format: OutputFormat, output: Option<&Path>) -> anyhow::Result<()> {
    let content = match format {
        OutputFormat::Json => generate_json_report(report)?,
        OutputFormat::Human => format_human_output(report),
    };
    emit(&content, output)?;
    Ok(())
}

fn emit(content: &str, output: Option<&Path>) -> Result<(), BenchError> {
    match output {
        Some(path) => {
            std::fs::write(path, content).map_err(|e| BenchError::io(path, e))?;
            println!("Report written to: {}", path.display());
        }
        None => {
            print!("{}", content);
            if !content.ends_with('\n') {
                println!();
            }
        }
    }
    Ok(())
}

/// Single mode signals failure with a one-line diagnostic on stderr
fn report_single_failure(report: &Report) {
    if report.meta.mode != RunMode::Single {
        return;
    }
    for result in &report.results {
        if let Some(error) = &result.error {
            print_error(error, OutputFormat::Human);
        }
        if result.verification_failed() {
            let scenario = result.scenario.clone();
            if let Ok(adapter) = result.adapter.parse::<AdapterName>() {
                let error = BenchError::VerificationFailed { adapter, scenario };
                print_error(&error.to_payload(), OutputFormat::Human);
            }
        }
    }
}

fn error_payload(error: &anyhow::Error) -> ErrorPayload {
    match error.downcast_ref::<BenchError>() {
        Some(bench) => bench.to_payload(),
        None => ErrorPayload {
            code: "INTERNAL_ERROR".to_string(),
            message: format!("{:#}", error),
            details: None,
            suggestion: None,
        },
    }
}

/// Machine-readable errors go to stdout, human ones to stderr as a single line
fn print_error(payload: &ErrorPayload, format: OutputFormat) {
    if let Some(suggestion) = &payload.suggestion {
        debug!(code = %payload.code, suggestion = %suggestion, "hint");
    }
    match format {
        OutputFormat::Json => match format_error_json(payload) {
            Ok(json) => println!("{}", json),
            Err(_) => eprintln!("{}", format_error_human(payload)),
        },
        OutputFormat::Human => eprintln!("{}", format_error_human(payload)),
    }
}

/// One `list` row
#[derive(Debug, Serialize)]
struct ListedScenario<'a> {
    #[serde(flatten)]
    info: &'a ScenarioInfo,
    excluded_by: Vec<AdapterName>,
}

fn scenario_listing<'a>(
    scenarios: &'a [ScenarioInfo],
    registry: &AdapterRegistry,
    adapter: Option<AdapterName>,
) -> Vec<ListedScenario<'a>> {
    scenarios
        .iter()
        .map(|info| ListedScenario {
            info,
            excluded_by: registry
                .iter()
                .filter(|config| adapter.is_none_or(|name| name == config.name))
                .filter(|config| config.excludes(&info.path))
                .map(|config| config.name)
                .collect(),
        })
        .collect()
}

fn format_scenario_list(listing: &[ListedScenario<'_>], loader: &ScenarioLoader) -> String {
    let mut output = format!("tplbench Scenarios ({}):\n", loader.root().display());

    let mut category: Option<&str> = None;
    for entry in listing {
        if category != Some(entry.info.category.as_str()) {
            category = Some(entry.info.category.as_str());
            let label = if entry.info.category.is_empty() {
                "(root)"
            } else {
                entry.info.category.as_str()
            };
            output.push_str(&format!("├── {}\n", label));
        }
        let excluded = if entry.excluded_by.is_empty() {
            String::new()
        } else {
            let names: Vec<&str> = entry.excluded_by.iter().map(|a| a.as_str()).collect();
            format!(" [excluded: {}]", names.join(", "))
        };
        output.push_str(&format!("│   ├── {}{}\n", entry.info.path, excluded));
    }

    output.push_str(&format!("{} scenarios found.\n", listing.len()));
    output
}
