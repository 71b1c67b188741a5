//! Benchmark Execution
//!
//! Two orchestration modes over the adapter registry:
//!
//! - **Single** (`run_single`): one adapter, one scenario. Readiness, scenario
//!   and fixture failures are fatal and returned as `Err`.
//! - **All** (`run_all`): every selected adapter against every planned
//!   scenario, adapters outer and scenarios inner. Benchmarks run one at a
//!   time so that concurrent interpreters do not skew each other's timings.
//!   Failures are recorded per benchmark and the run continues.
//!
//! ```text
//! AdapterConfig + scenario template + fixture data
//!        │
//!        ▼
//!   AdapterRunner (subprocess, deadline)
//!        │
//!        ▼
//!   TimingMetrics ──► snapshot step ──► BenchResult
//! ```

use super::metadata::build_report_meta;
use super::verification::apply_snapshot_mode;
use crate::adapters::{AdapterConfig, AdapterName, AdapterRegistry};
use crate::config::BenchConfig;
use crate::environment::RuntimeChecker;
use crate::error::{AdapterError, BenchError};
use crate::planner::{ScenarioPlan, build_plan};
use crate::scenarios::{Scale, ScenarioLoader};
use crate::supervisor::AdapterRunner;
use indicatif::{ProgressBar, ProgressStyle};
use regex::Regex;
use serde_json::{Map, Value};
use std::sync::Arc;
use std::time::{Duration, Instant};
use tplbench_ipc::{AdapterInput, MAX_ITERATIONS, MAX_WARMUP, OutputValidator, ProtocolError};
use tplbench_report::{
    BenchResult, LibraryInfo, Report, RunMode, RunSummary, SkipReason, SkippedEntry,
};
use tplbench_stats::calculate_timing_metrics;
use tplbench_verify::{SnapshotStore, VerificationEngine, scenario_key};
use tracing::{debug, info, warn};

/// What to do with rendered output after a successful run
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum SnapshotMode {
    /// Ignore rendered output
    #[default]
    Off,
    /// Overwrite snapshots with the current output
    Update,
    /// Compare with the snapshot of `compare_against`, or the adapter's own
    Verify {
        /// Cross-adapter comparison target
        compare_against: Option<AdapterName>,
    },
}

impl SnapshotMode {
    /// Short label for report metadata
    pub fn label(&self) -> &'static str {
        match self {
            SnapshotMode::Off => "off",
            SnapshotMode::Update => "update",
            SnapshotMode::Verify { .. } => "verify",
        }
    }
}

/// Options shared by both modes
#[derive(Debug, Clone)]
pub struct RunOptions {
    /// Fixture scale
    pub scale: Scale,
    /// Measured iterations per benchmark
    pub iterations: u32,
    /// Warmup iterations per benchmark
    pub warmup: u32,
    /// Deadline for each adapter invocation
    pub timeout: Duration,
    /// Snapshot handling
    pub snapshots: SnapshotMode,
    /// Scenario path filter (all mode)
    pub filter: Option<Regex>,
    /// Adapter subset (all mode); empty means every adapter
    pub adapters: Vec<AdapterName>,
}

impl Default for RunOptions {
    fn default() -> Self {
        Self {
            scale: Scale::Small,
            iterations: 100,
            warmup: 10,
            timeout: Duration::from_secs(60),
            snapshots: SnapshotMode::Off,
            filter: None,
            adapters: Vec::new(),
        }
    }
}

impl RunOptions {
    /// Reject counts the adapter protocol does not accept
    pub fn validate(&self) -> Result<(), BenchError> {
        if !(1..=MAX_ITERATIONS).contains(&self.iterations) {
            return Err(BenchError::Config(format!(
                "iterations must be between 1 and {}, got {}",
                MAX_ITERATIONS, self.iterations
            )));
        }
        if self.warmup > MAX_WARMUP {
            return Err(BenchError::Config(format!(
                "warmup must be between 0 and {}, got {}",
                MAX_WARMUP, self.warmup
            )));
        }
        if self.timeout.is_zero() {
            return Err(BenchError::Config("timeout must be positive".to_string()));
        }
        Ok(())
    }

    /// Selected adapters in execution order, without duplicates
    pub fn selected_adapters(&self) -> Vec<AdapterName> {
        AdapterName::ALL
            .into_iter()
            .filter(|name| self.adapters.is_empty() || self.adapters.contains(name))
            .collect()
    }
}

/// Runs benchmarks and assembles reports
#[derive(Debug, Clone)]
pub struct BenchOrchestrator {
    registry: AdapterRegistry,
    scenarios: ScenarioLoader,
    runner: AdapterRunner,
    checker: RuntimeChecker,
    verifier: VerificationEngine,
}

impl BenchOrchestrator {
    /// Assemble from parts
    pub fn new(
        registry: AdapterRegistry,
        scenarios: ScenarioLoader,
        runner: AdapterRunner,
        checker: RuntimeChecker,
        verifier: VerificationEngine,
    ) -> Self {
        Self {
            registry,
            scenarios,
            runner,
            checker,
            verifier,
        }
    }

    /// Build every component from a loaded configuration
    pub fn from_config(config: &BenchConfig) -> Result<Self, BenchError> {
        let validator =
            OutputValidator::new().map_err(|e| BenchError::Config(e.to_string()))?;
        let checker = RuntimeChecker::new().map_err(|e| BenchError::Config(e.to_string()))?;

        Ok(Self::new(
            AdapterRegistry::from_config(config)?,
            ScenarioLoader::new(
                config.scenarios_dir(),
                config.data_dir(),
                config.paths.template_extension.clone(),
            ),
            AdapterRunner::new(Arc::new(validator)),
            checker,
            VerificationEngine::new(SnapshotStore::new(config.snapshots_dir())),
        ))
    }

    /// Adapter settings
    pub fn registry(&self) -> &AdapterRegistry {
        &self.registry
    }

    /// Scenario source
    pub fn scenarios(&self) -> &ScenarioLoader {
        &self.scenarios
    }

    /// Run one adapter against one scenario
    pub async fn run_single(
        &self,
        adapter: AdapterName,
        scenario: &str,
        options: &RunOptions,
    ) -> Result<Report, BenchError> {
        options.validate()?;
        let started = Instant::now();
        let config = self.registry.get(adapter);

        self.checker.ensure_ready(config).await?;
        let template = self.scenarios.load_scenario(scenario)?;
        let data = self.scenarios.load_data(options.scale)?;
        if config.excludes(scenario) {
            warn!(adapter = %adapter, scenario, "scenario is excluded for this adapter, running anyway");
        }

        let result = self
            .execute(config, scenario, template, &data, options)
            .await;

        let mut summary = RunSummary::default();
        summary.record(&result);
        summary.total_duration_ms = started.elapsed().as_secs_f64() * 1000.0;

        Ok(Report {
            meta: build_report_meta(RunMode::Single, options),
            results: vec![result],
            skipped: Vec::new(),
            summary,
        })
    }

    /// Run every selected adapter against every planned scenario
    pub async fn run_all(&self, options: &RunOptions, progress: bool) -> Result<Report, BenchError> {
        options.validate()?;
        let started = Instant::now();

        let data = self.scenarios.load_data(options.scale)?;
        let discovered = self.scenarios.list_all()?;

        let plans: Vec<(&AdapterConfig, ScenarioPlan)> = options
            .selected_adapters()
            .into_iter()
            .map(|name| {
                let config = self.registry.get(name);
                let plan = build_plan(&discovered, options.filter.as_ref(), &config.exclude);
                (config, plan)
            })
            .collect();

        let total: usize = plans.iter().map(|(_, plan)| plan.runnable.len()).sum();
        info!(
            scenarios = discovered.len(),
            benchmarks = total,
            scale = %options.scale,
            "starting run"
        );

        let pb = if progress {
            ProgressBar::new(total as u64)
        } else {
            ProgressBar::hidden()
        };
        pb.set_style(
            ProgressStyle::default_bar()
                .template(
                    "{spinner:.green} [{elapsed_precise}] [{bar:40.cyan/blue}] {pos}/{len} {msg}",
                )
                .unwrap_or_else(|_| ProgressStyle::default_bar())
                .progress_chars("#>-"),
        );

        let mut results = Vec::with_capacity(total);
        let mut skipped = Vec::new();
        let mut summary = RunSummary::default();

        for (config, plan) in &plans {
            if plan.is_empty() {
                debug!(adapter = %config.name, "no scenarios matched for adapter");
                continue;
            }
            for scenario in &plan.excluded {
                info!(adapter = %config.name, scenario = %scenario.path, "scenario excluded");
                skipped.push(SkippedEntry {
                    adapter: config.name.to_string(),
                    scenario: scenario.path.clone(),
                    reason: SkipReason::Excluded,
                });
            }
            if plan.runnable.is_empty() {
                continue;
            }

            match self.checker.ensure_ready(config).await {
                Ok(()) => {}
                Err(BenchError::EnvironmentNotReady { message, .. }) => {
                    warn!(adapter = %config.name, error = %message, "adapter not ready, skipping its scenarios");
                    for scenario in &plan.runnable {
                        skipped.push(SkippedEntry {
                            adapter: config.name.to_string(),
                            scenario: scenario.path.clone(),
                            reason: SkipReason::EnvironmentNotReady {
                                message: message.clone(),
                            },
                        });
                    }
                    pb.inc(plan.runnable.len() as u64);
                    continue;
                }
                Err(e) => {
                    pb.abandon();
                    return Err(e);
                }
            }

            for scenario in &plan.runnable {
                pb.set_message(format!("{}/{}", config.name, scenario.path));
                let result = match self.scenarios.load_scenario(&scenario.path) {
                    Ok(template) => {
                        self.execute(config, &scenario.path, template, &data, options)
                            .await
                    }
                    Err(e) => BenchResult::failed(
                        config.name.as_str(),
                        &scenario.path,
                        options.scale.as_str(),
                        e.to_payload(),
                    ),
                };
                summary.record(&result);
                results.push(result);
                pb.inc(1);
            }
        }

        pb.finish_with_message("Complete");

        summary.skipped = skipped.len();
        summary.total_duration_ms = started.elapsed().as_secs_f64() * 1000.0;
        info!(
            completed = summary.completed,
            failed = summary.failed,
            skipped = summary.skipped,
            verified = summary.verification.total_compared(),
            "run finished"
        );

        Ok(Report {
            meta: build_report_meta(RunMode::All, options),
            results,
            skipped,
            summary,
        })
    }

    /// One benchmark; every failure ends up in the returned result
    async fn execute(
        &self,
        config: &AdapterConfig,
        scenario: &str,
        template: String,
        data: &Map<String, Value>,
        options: &RunOptions,
    ) -> BenchResult {
        let adapter = config.name;
        let scale = options.scale.as_str();
        let fail = |e: BenchError| {
            warn!(adapter = %adapter, scenario, code = e.code(), error = %e, "benchmark failed");
            BenchResult::failed(adapter.as_str(), scenario, scale, e.to_payload())
        };

        let input =
            match AdapterInput::new(template, data.clone(), options.iterations, options.warmup) {
                Ok(input) => input,
                Err(ProtocolError::InvalidInput(message)) => {
                    return fail(BenchError::InvalidInput(message));
                }
                Err(e) => return fail(BenchError::InvalidInput(e.to_string())),
            };

        debug!(adapter = %adapter, scenario, "running benchmark");
        let run = match self.runner.run(config, &input, options.timeout).await {
            Ok(run) => run,
            Err(e) => return fail(e.into()),
        };
        let output = run.output;
        if output.lang != adapter.lang() {
            warn!(adapter = %adapter, reported = %output.lang, "adapter reported a different lang");
        }

        let metrics =
            match calculate_timing_metrics(&output.timings.parse_ms, &output.timings.render_ms) {
                Ok(metrics) => metrics,
                Err(e) => return fail(AdapterError::invalid(adapter, vec![e.to_string()]).into()),
            };

        let mut result = BenchResult {
            success: true,
            adapter: adapter.to_string(),
            scenario: scenario.to_string(),
            scale: scale.to_string(),
            library: Some(LibraryInfo {
                library: output.library.clone(),
                version: output.version.clone(),
                lang: output.lang.to_string(),
                runtime_version: output.runtime_version.clone(),
            }),
            metrics: Some(metrics),
            error: None,
            verification: None,
            execution_time_ms: Some(run.execution_time_ms),
        };

        let key = scenario_key(scenario, scale);
        match apply_snapshot_mode(
            &self.verifier,
            &options.snapshots,
            &key,
            adapter,
            output.rendered_output.as_deref(),
        ) {
            Ok(verification) => result.verification = verification,
            Err(e) => {
                let e = BenchError::from(e);
                warn!(adapter = %adapter, scenario, error = %e, "snapshot step failed");
                result.success = false;
                result.error = Some(e.to_payload());
            }
        }

        result
    }
}
