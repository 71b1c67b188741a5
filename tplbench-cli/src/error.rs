//! Error Taxonomy
//!
//! [`AdapterError`] describes one failed adapter invocation and carries a
//! [`AdapterErrorKind`] discriminant; callers match on `kind`.
//! [`BenchError`] is the orchestrator-level error. Every variant maps to a
//! stable machine code and renders as an [`ErrorPayload`].

use crate::adapters::AdapterName;
use crate::scenarios::Scale;
use serde_json::{Value, json};
use std::io;
use std::path::PathBuf;
use std::time::Duration;
use thiserror::Error;
use tplbench_report::ErrorPayload;
use tplbench_verify::SnapshotError;

/// Bytes of adapter stderr kept for diagnostics
pub const STDERR_LIMIT: usize = 4096;

/// How an adapter invocation failed
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AdapterErrorKind {
    /// Deadline exceeded; the process was killed
    Timeout,
    /// Non-zero exit or killed by a signal
    Crashed,
    /// Exit 0 but stdout is not JSON
    MalformedOutput,
    /// Exit 0, valid JSON, but the document violates the output schema
    InvalidOutput,
    /// The process could not be started or its pipes failed
    SpawnFailed,
}

impl AdapterErrorKind {
    /// Stable machine code
    pub fn code(self) -> &'static str {
        match self {
            AdapterErrorKind::Timeout => "ADAPTER_TIMEOUT",
            AdapterErrorKind::Crashed => "ADAPTER_CRASHED",
            AdapterErrorKind::MalformedOutput => "ADAPTER_MALFORMED_OUTPUT",
            AdapterErrorKind::InvalidOutput => "ADAPTER_INVALID_OUTPUT",
            AdapterErrorKind::SpawnFailed => "ADAPTER_SPAWN_FAILED",
        }
    }
}

/// A failed adapter invocation
#[derive(Debug, Clone, Error)]
#[error("{adapter} adapter: {message}")]
pub struct AdapterError {
    /// Failure class
    pub kind: AdapterErrorKind,
    /// Adapter that failed
    pub adapter: AdapterName,
    /// Human-readable summary
    pub message: String,
    /// Process exit code, when the process exited normally
    pub exit_code: Option<i32>,
    /// Tail of captured stderr
    pub stderr: Option<String>,
    /// Deadline that was exceeded
    pub timeout_ms: Option<u64>,
    /// Validator messages for [`AdapterErrorKind::InvalidOutput`]
    pub details: Vec<String>,
}

impl AdapterError {
    fn new(kind: AdapterErrorKind, adapter: AdapterName, message: String) -> Self {
        Self {
            kind,
            adapter,
            message,
            exit_code: None,
            stderr: None,
            timeout_ms: None,
            details: Vec::new(),
        }
    }

    /// Deadline exceeded
    pub fn timeout(adapter: AdapterName, timeout: Duration) -> Self {
        let timeout_ms = u64::try_from(timeout.as_millis()).unwrap_or(u64::MAX);
        let mut err = Self::new(
            AdapterErrorKind::Timeout,
            adapter,
            format!("timed out after {} ms", timeout_ms),
        );
        err.timeout_ms = Some(timeout_ms);
        err
    }

    /// Non-zero exit; `exit_code` is `None` when killed by a signal
    pub fn crashed(adapter: AdapterName, exit_code: Option<i32>, stderr: &[u8]) -> Self {
        let message = match exit_code {
            Some(code) => format!("exited with code {}", code),
            None => "terminated by signal".to_string(),
        };
        let mut err = Self::new(AdapterErrorKind::Crashed, adapter, message);
        err.exit_code = exit_code;
        err.stderr = Some(stderr_tail(stderr));
        err
    }

    /// Stdout could not be parsed
    pub fn malformed(adapter: AdapterName, reason: impl std::fmt::Display) -> Self {
        Self::new(
            AdapterErrorKind::MalformedOutput,
            adapter,
            reason.to_string(),
        )
    }

    /// Output failed schema validation
    pub fn invalid(adapter: AdapterName, details: Vec<String>) -> Self {
        let mut err = Self::new(
            AdapterErrorKind::InvalidOutput,
            adapter,
            format!("invalid output: {}", details.join("; ")),
        );
        err.details = details;
        err
    }

    /// Spawn or pipe failure
    pub fn spawn_failed(adapter: AdapterName, what: &str, source: &io::Error) -> Self {
        Self::new(
            AdapterErrorKind::SpawnFailed,
            adapter,
            format!("{}: {}", what, source),
        )
    }

    fn details_json(&self) -> Value {
        let mut details = json!({ "adapter": self.adapter.as_str() });
        if let Some(code) = self.exit_code {
            details["exit_code"] = json!(code);
        }
        if let Some(stderr) = &self.stderr {
            details["stderr"] = json!(stderr);
        }
        if let Some(ms) = self.timeout_ms {
            details["timeout_ms"] = json!(ms);
        }
        if !self.details.is_empty() {
            details["errors"] = json!(self.details);
        }
        details
    }
}

/// Keep the last [`STDERR_LIMIT`] bytes of `stderr`, on a char boundary
pub fn stderr_tail(stderr: &[u8]) -> String {
    let text = String::from_utf8_lossy(stderr);
    if text.len() <= STDERR_LIMIT {
        return text.into_owned();
    }
    let mut start = text.len() - STDERR_LIMIT;
    while !text.is_char_boundary(start) {
        start += 1;
    }
    format!("...{}", &text[start..])
}

/// Orchestrator and CLI errors
#[derive(Debug, Error)]
pub enum BenchError {
    /// An adapter invocation failed
    #[error(transparent)]
    Adapter(#[from] AdapterError),

    /// Runtime missing, too old, or dependencies not installed
    #[error("{adapter} environment not ready: {message}")]
    EnvironmentNotReady {
        /// Adapter that cannot run
        adapter: AdapterName,
        /// What is missing
        message: String,
        /// How to fix it
        suggestion: Option<String>,
    },

    /// No template file for the scenario path
    #[error("scenario `{0}` not found")]
    ScenarioNotFound(String),

    /// No fixture data for the scale
    #[error("fixture data for scale `{scale}` not found at {}", path.display())]
    DataNotFound {
        /// Requested scale
        scale: Scale,
        /// Expected file
        path: PathBuf,
    },

    /// Rendered output diverged from its snapshot
    #[error("snapshot verification failed for {adapter}/{scenario}")]
    VerificationFailed {
        /// Adapter under test
        adapter: AdapterName,
        /// Scenario path
        scenario: String,
    },

    /// Adapter request could not be built
    #[error("{0}")]
    InvalidInput(String),

    /// Snapshot read or write failed
    #[error(transparent)]
    Snapshot(#[from] SnapshotError),

    /// Configuration or command-line options are invalid
    #[error("invalid configuration: {0}")]
    Config(String),

    /// File-system failure outside the snapshot store
    #[error("I/O error at {}: {source}", path.display())]
    Io {
        /// Path involved
        path: PathBuf,
        /// Underlying error
        #[source]
        source: io::Error,
    },
}

impl BenchError {
    /// I/O failure at `path`
    pub fn io(path: impl Into<PathBuf>, source: io::Error) -> Self {
        BenchError::Io {
            path: path.into(),
            source,
        }
    }

    /// Stable machine code
    pub fn code(&self) -> &'static str {
        match self {
            BenchError::Adapter(e) => e.kind.code(),
            BenchError::EnvironmentNotReady { .. } => "ENVIRONMENT_NOT_READY",
            BenchError::ScenarioNotFound(_) => "SCENARIO_NOT_FOUND",
            BenchError::DataNotFound { .. } => "DATA_NOT_FOUND",
            BenchError::VerificationFailed { .. } => "VERIFICATION_FAILED",
            BenchError::InvalidInput(_) => "INVALID_INPUT",
            BenchError::Snapshot(_) => "SNAPSHOT_IO",
            BenchError::Config(_) => "CONFIG_INVALID",
            BenchError::Io { .. } => "IO_ERROR",
        }
    }

    /// Remediation hint, if there is one
    pub fn suggestion(&self) -> Option<String> {
        match self {
            BenchError::Adapter(e) => match e.kind {
                AdapterErrorKind::Timeout => {
                    Some("raise --timeout or lower --iterations".to_string())
                }
                AdapterErrorKind::SpawnFailed => {
                    Some(format!("check adapters.{}.command", e.adapter))
                }
                _ => None,
            },
            BenchError::EnvironmentNotReady { suggestion, .. } => suggestion.clone(),
            BenchError::ScenarioNotFound(_) => {
                Some("run `tplbench list` to see available scenarios".to_string())
            }
            BenchError::DataNotFound { .. } => {
                Some("generate fixture data for this scale first".to_string())
            }
            BenchError::VerificationFailed { .. } => Some(
                "inspect the diff, then re-run with --update-snapshots if the change is intended"
                    .to_string(),
            ),
            _ => None,
        }
    }

    /// Structured context
    pub fn details(&self) -> Option<Value> {
        match self {
            BenchError::Adapter(e) => Some(e.details_json()),
            BenchError::EnvironmentNotReady { adapter, .. } => {
                Some(json!({ "adapter": adapter.as_str() }))
            }
            BenchError::ScenarioNotFound(scenario) => Some(json!({ "scenario": scenario })),
            BenchError::DataNotFound { scale, path } => Some(json!({
                "scale": scale.as_str(),
                "path": path.display().to_string(),
            })),
            BenchError::VerificationFailed { adapter, scenario } => Some(json!({
                "adapter": adapter.as_str(),
                "scenario": scenario,
            })),
            BenchError::Io { path, .. } => Some(json!({ "path": path.display().to_string() })),
            BenchError::Snapshot(SnapshotError::Io { path, .. }) => {
                Some(json!({ "path": path.display().to_string() }))
            }
            BenchError::InvalidInput(_) | BenchError::Config(_) => None,
        }
    }

    /// Machine-readable rendering
    pub fn to_payload(&self) -> ErrorPayload {
        ErrorPayload {
            code: self.code().to_string(),
            message: self.to_string(),
            details: self.details(),
            suggestion: self.suggestion(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_adapter_codes() {
        let timeout = AdapterError::timeout(AdapterName::Ruby, Duration::from_millis(1500));
        assert_eq!(timeout.kind, AdapterErrorKind::Timeout);
        assert_eq!(timeout.timeout_ms, Some(1500));

        let err = BenchError::from(timeout);
        assert_eq!(err.code(), "ADAPTER_TIMEOUT");
        assert!(err.suggestion().is_some());
        let payload = err.to_payload();
        assert_eq!(payload.details.unwrap()["timeout_ms"], 1500);
    }

    #[test]
    fn test_crashed_keeps_stderr() {
        let err = AdapterError::crashed(AdapterName::Php, Some(1), b"parse error\n");
        assert_eq!(err.exit_code, Some(1));
        assert!(err.stderr.as_deref().unwrap().contains("parse error"));
        assert_eq!(err.to_string(), "php adapter: exited with code 1");

        let signalled = AdapterError::crashed(AdapterName::Php, None, b"");
        assert!(signalled.message.contains("signal"));
    }

    #[test]
    fn test_stderr_tail_truncation() {
        let short = stderr_tail(b"boom");
        assert_eq!(short, "boom");

        let mut long = vec![b'a'; STDERR_LIMIT * 2];
        long.extend_from_slice(b"FATAL");
        let tail = stderr_tail(&long);
        assert!(tail.starts_with("..."));
        assert!(tail.ends_with("FATAL"));
        assert_eq!(tail.len(), STDERR_LIMIT + 3);
    }

    #[test]
    fn test_stderr_tail_char_boundary() {
        // Multi-byte chars straddling the cut must not split.
        let text = "é".repeat(STDERR_LIMIT);
        let tail = stderr_tail(text.as_bytes());
        assert!(tail.starts_with("..."));
        assert!(tail[3..].chars().all(|c| c == 'é'));
    }

    #[test]
    fn test_invalid_output_details() {
        let err = AdapterError::invalid(
            AdapterName::Ruby,
            vec!["/version: expected semver".to_string()],
        );
        let payload = BenchError::from(err).to_payload();
        assert_eq!(payload.code, "ADAPTER_INVALID_OUTPUT");
        assert_eq!(
            payload.details.unwrap()["errors"][0],
            "/version: expected semver"
        );
    }

    #[test]
    fn test_error_payload_codes() {
        let cases = [
            (
                BenchError::ScenarioNotFound("x".to_string()),
                "SCENARIO_NOT_FOUND",
            ),
            (
                BenchError::DataNotFound {
                    scale: Scale::Large,
                    path: PathBuf::from("data/large.json"),
                },
                "DATA_NOT_FOUND",
            ),
            (
                BenchError::EnvironmentNotReady {
                    adapter: AdapterName::Php,
                    message: "runtime `php` not found".to_string(),
                    suggestion: None,
                },
                "ENVIRONMENT_NOT_READY",
            ),
            (
                BenchError::VerificationFailed {
                    adapter: AdapterName::Php,
                    scenario: "a/b".to_string(),
                },
                "VERIFICATION_FAILED",
            ),
            (BenchError::Config("bad".to_string()), "CONFIG_INVALID"),
            (
                BenchError::io("out.json", io::Error::other("disk full")),
                "IO_ERROR",
            ),
        ];
        for (err, code) in cases {
            assert_eq!(err.to_payload().code, code);
        }
    }
}
