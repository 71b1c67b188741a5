#![warn(missing_docs)]
//! # tplbench
//!
//! Benchmarks one template language across several runtime implementations
//! (PHP and Ruby ports of Liquid) and verifies that they render the same output.
//!
//! - **Subprocess adapters**: each implementation runs as a child process speaking
//!   a one-shot JSON protocol over stdin/stdout, with a hard per-invocation deadline
//! - **Phase timings**: parse and render are measured separately by the adapter;
//!   mean, population stddev, min, max and median are derived here
//! - **Snapshots**: rendered output is stored per scenario, scale and adapter, and
//!   later runs are verified against it (optionally against another adapter's snapshot)
//!
//! ## Quick Start
//!
//! ```ignore
//! use tplbench::{BenchConfig, BenchOrchestrator, RunOptions, AdapterName};
//!
//! let config = BenchConfig::discover()?.unwrap_or_default();
//! let orchestrator = BenchOrchestrator::from_config(&config)?;
//! let report = orchestrator
//!     .run_single(AdapterName::Ruby, "filters/escape", &RunOptions::default())
//!     .await?;
//! println!("{}", tplbench::format_human_output(&report));
//! ```

// Re-export orchestration
pub use tplbench_cli::{
    AdapterConfig, AdapterError, AdapterErrorKind, AdapterName, AdapterRegistry, AdapterRun,
    AdapterRunner, BenchConfig, BenchError, BenchOrchestrator, RunOptions, RuntimeChecker, Scale,
    ScenarioInfo, ScenarioLoader, SnapshotMode,
};

// Re-export protocol
pub use tplbench_ipc::{AdapterInput, AdapterOutput, Lang, OutputValidator, RawTimings};

// Re-export report types
pub use tplbench_report::{
    BenchResult, ErrorPayload, OutputFormat, Report, RunMode, RunSummary, SkipReason,
    SkippedEntry, format_error_human, format_error_json, format_human_output,
    generate_json_report,
};

// Re-export stats
pub use tplbench_stats::{PhaseMetrics, TimingMetrics, calculate_timing_metrics};

// Re-export verification
pub use tplbench_verify::{
    SnapshotStore, VerificationEngine, VerificationSummary, VerifyResult, VerifyStatus,
};

/// Run the tplbench CLI.
///
/// ```ignore
/// fn main() -> std::process::ExitCode {
///     tplbench::run()
/// }
/// ```
pub use tplbench_cli::run;
