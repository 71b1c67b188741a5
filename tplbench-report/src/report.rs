//! Report Data Structures

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use tplbench_stats::TimingMetrics;
use tplbench_verify::{VerificationSummary, VerifyResult};

/// Complete run report
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Report {
    /// Run configuration and host
    pub meta: ReportMeta,
    /// Executed benchmarks, in execution order
    pub results: Vec<BenchResult>,
    /// Planned executions that did not run
    pub skipped: Vec<SkippedEntry>,
    /// Totals over `results` and `skipped`
    pub summary: RunSummary,
}

impl Report {
    /// Process exit code for this run
    pub fn exit_code(&self) -> i32 {
        self.summary.exit_code(self.meta.mode)
    }
}

/// Orchestrator mode that produced a report
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RunMode {
    /// One adapter, one scenario
    Single,
    /// Every adapter against every non-excluded scenario
    All,
}

/// Report metadata
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ReportMeta {
    /// tplbench version that produced the report
    pub version: String,
    /// Run start time
    pub timestamp: DateTime<Utc>,
    /// Single or all mode
    pub mode: RunMode,
    /// Data scale name (`small`, `medium`, `large`)
    pub scale: String,
    /// Measured iterations per benchmark
    pub iterations: u32,
    /// Unmeasured warmup iterations per benchmark
    pub warmup: u32,
    /// Snapshot mode name (`off`, `verify`, `update`)
    pub snapshot_mode: String,
    /// Host the run executed on
    pub system: SystemInfo,
}

/// Host information
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SystemInfo {
    /// Operating system family
    pub os: String,
    /// CPU architecture
    pub arch: String,
    /// CPU model name, `Unknown` when unavailable
    pub cpu: String,
    /// Logical cores
    pub cpu_cores: u32,
}

/// Library metadata reported by an adapter
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LibraryInfo {
    /// Template library name
    pub library: String,
    /// Library version
    pub version: String,
    /// Adapter language
    pub lang: String,
    /// Interpreter version, when the adapter reports one
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub runtime_version: Option<String>,
}

/// Outcome of one (adapter, scenario) execution
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BenchResult {
    /// Whether the adapter produced valid timings
    pub success: bool,
    /// Adapter name
    pub adapter: String,
    /// Scenario path, e.g. `tags/for`
    pub scenario: String,
    /// Data scale name
    pub scale: String,
    /// Library metadata, present on success
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub library: Option<LibraryInfo>,
    /// Timing statistics, present on success
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub metrics: Option<TimingMetrics>,
    /// Failure details, present on failure
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<ErrorPayload>,
    /// Snapshot verdict, absent when snapshots are off
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub verification: Option<VerifyResult>,
    /// Wall-clock time of the adapter subprocess (diagnostics only)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub execution_time_ms: Option<f64>,
}

impl BenchResult {
    /// A failed execution carrying `error`
    pub fn failed(adapter: &str, scenario: &str, scale: &str, error: ErrorPayload) -> Self {
        Self {
            success: false,
            adapter: adapter.to_string(),
            scenario: scenario.to_string(),
            scale: scale.to_string(),
            library: None,
            metrics: None,
            error: Some(error),
            verification: None,
            execution_time_ms: None,
        }
    }

    /// Whether snapshot verification reported divergence
    pub fn verification_failed(&self) -> bool {
        self.verification.as_ref().is_some_and(VerifyResult::is_fail)
    }
}

/// Machine-readable error
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ErrorPayload {
    /// Stable error code, e.g. `ADAPTER_TIMEOUT`
    pub code: String,
    /// Human-readable description
    pub message: String,
    /// Structured context, e.g. schema violations
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub details: Option<Value>,
    /// Remediation hint
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub suggestion: Option<String>,
}

/// A planned execution that did not run
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SkippedEntry {
    /// Adapter name
    pub adapter: String,
    /// Scenario path
    pub scenario: String,
    /// Why it did not run
    pub reason: SkipReason,
}

/// Why an execution was skipped
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum SkipReason {
    /// Listed in the adapter's exclusion list
    Excluded,
    /// The adapter's runtime or dependencies are unavailable
    EnvironmentNotReady {
        /// Readiness check diagnostic
        message: String,
    },
}

impl SkipReason {
    /// Short description for tables
    pub fn describe(&self) -> String {
        match self {
            SkipReason::Excluded => "excluded".to_string(),
            SkipReason::EnvironmentNotReady { message } => {
                format!("environment not ready: {}", message)
            }
        }
    }
}

/// Run totals
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct RunSummary {
    /// Executions that succeeded
    pub completed: usize,
    /// Executions that failed
    pub failed: usize,
    /// Planned executions that did not run
    pub skipped: usize,
    /// Snapshot verdict totals
    pub verification: VerificationSummary,
    /// Wall-clock duration of the whole run
    pub total_duration_ms: f64,
}

impl RunSummary {
    /// Count one execution result
    pub fn record(&mut self, result: &BenchResult) {
        if result.success {
            self.completed += 1;
        } else {
            self.failed += 1;
        }
        if let Some(verification) = &result.verification {
            self.verification.record(verification);
        }
    }

    /// Executions that were attempted
    pub fn total_executed(&self) -> usize {
        self.completed + self.failed
    }

    /// Exit code for a run.
    ///
    /// A diverged snapshot always fails the run. In single mode a failed
    /// benchmark fails it too; in all mode per-benchmark errors are reported
    /// but do not change the exit code.
    pub fn exit_code(&self, mode: RunMode) -> i32 {
        let failed = match mode {
            RunMode::Single => self.verification.should_fail() || self.failed > 0,
            RunMode::All => self.verification.should_fail(),
        };
        i32::from(failed)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tplbench_verify::VerifyStatus;

    fn ok_result(verification: Option<VerifyStatus>) -> BenchResult {
        BenchResult {
            success: true,
            adapter: "ruby".to_string(),
            scenario: "basic/vars".to_string(),
            scale: "small".to_string(),
            library: None,
            metrics: None,
            error: None,
            verification: verification.map(|status| VerifyResult {
                status,
                compared_against: None,
            }),
            execution_time_ms: Some(12.0),
        }
    }

    fn error() -> ErrorPayload {
        ErrorPayload {
            code: "ADAPTER_CRASHED".to_string(),
            message: "boom".to_string(),
            details: None,
            suggestion: None,
        }
    }

    #[test]
    fn test_summary_counts() {
        let mut summary = RunSummary::default();
        summary.record(&ok_result(Some(VerifyStatus::Pass)));
        summary.record(&ok_result(Some(VerifyStatus::Missing)));
        summary.record(&ok_result(None));
        summary.record(&BenchResult::failed("php", "x", "small", error()));

        assert_eq!(summary.completed, 3);
        assert_eq!(summary.failed, 1);
        assert_eq!(summary.total_executed(), 4);
        assert_eq!(summary.verification.passed, 1);
        assert_eq!(summary.verification.missing, 1);
    }

    #[test]
    fn test_all_mode_exit_code_only_tracks_verification() {
        let mut summary = RunSummary::default();
        summary.record(&BenchResult::failed("php", "x", "small", error()));
        summary.record(&ok_result(Some(VerifyStatus::Missing)));
        assert_eq!(summary.exit_code(RunMode::All), 0);

        summary.record(&ok_result(Some(VerifyStatus::Fail {
            diff: "d".to_string(),
        })));
        assert_eq!(summary.exit_code(RunMode::All), 1);
    }

    #[test]
    fn test_single_mode_exit_code() {
        let mut ok = RunSummary::default();
        ok.record(&ok_result(Some(VerifyStatus::Pass)));
        assert_eq!(ok.exit_code(RunMode::Single), 0);

        let mut failed = RunSummary::default();
        failed.record(&BenchResult::failed("php", "x", "small", error()));
        assert_eq!(failed.exit_code(RunMode::Single), 1);

        let mut diverged = RunSummary::default();
        diverged.record(&ok_result(Some(VerifyStatus::Fail {
            diff: "d".to_string(),
        })));
        assert_eq!(diverged.exit_code(RunMode::Single), 1);
    }

    #[test]
    fn test_skip_reason_json() {
        let entry = SkippedEntry {
            adapter: "php".to_string(),
            scenario: "tags/raw".to_string(),
            reason: SkipReason::EnvironmentNotReady {
                message: "runtime `php` not found".to_string(),
            },
        };
        let json = serde_json::to_value(&entry).unwrap();
        assert_eq!(json["reason"]["kind"], "environment_not_ready");
        assert_eq!(SkipReason::Excluded.describe(), "excluded");
    }
}
