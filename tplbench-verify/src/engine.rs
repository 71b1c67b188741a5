//! Verification Engine
//!
//! Two operations over the snapshot store:
//! - `update_snapshot`: the only path that creates or changes a snapshot
//! - `verify_snapshot`: read-only comparison producing pass, fail or missing
//!
//! Verification targets the adapter's OWN previous output unless a different
//! adapter is named explicitly. Different engines are not expected to agree
//! byte-for-byte even when both are correct, so cross-adapter comparison is an
//! opt-in runtime choice rather than a storage structure.

use crate::comparator::compare_snapshots;
use crate::store::{SnapshotError, SnapshotStore};
use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use tracing::{debug, info};

/// Verdict of one snapshot verification
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "status", rename_all = "lowercase")]
pub enum VerifyStatus {
    /// Output matches the snapshot exactly
    Pass,
    /// Output differs from the snapshot
    Fail {
        /// Line diff between snapshot and output
        diff: String,
    },
    /// No snapshot exists to compare against
    Missing,
}

/// Verification outcome plus the adapter whose snapshot was used, when that
/// differs from the adapter under test.
///
/// Self-verification and "no special baseline" share one shape: both leave
/// `compared_against` empty.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct VerifyResult {
    /// Verdict
    #[serde(flatten)]
    pub status: VerifyStatus,
    /// Adapter whose snapshot was the comparison target
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub compared_against: Option<String>,
}

impl VerifyResult {
    /// Whether the output matched
    pub fn is_pass(&self) -> bool {
        matches!(self.status, VerifyStatus::Pass)
    }

    /// Whether the output diverged from its snapshot
    pub fn is_fail(&self) -> bool {
        matches!(self.status, VerifyStatus::Fail { .. })
    }

    /// Whether there was nothing to compare against
    pub fn is_missing(&self) -> bool {
        matches!(self.status, VerifyStatus::Missing)
    }

    /// Diff, for failed verifications
    pub fn diff(&self) -> Option<&str> {
        match &self.status {
            VerifyStatus::Fail { diff } => Some(diff),
            _ => None,
        }
    }

    /// Short lowercase label: `pass`, `fail` or `missing`
    pub fn label(&self) -> &'static str {
        match self.status {
            VerifyStatus::Pass => "pass",
            VerifyStatus::Fail { .. } => "fail",
            VerifyStatus::Missing => "missing",
        }
    }
}

/// Snapshot update and verification over a [`SnapshotStore`]
#[derive(Debug, Clone)]
pub struct VerificationEngine {
    store: SnapshotStore,
}

impl VerificationEngine {
    /// Create an engine over `store`
    pub fn new(store: SnapshotStore) -> Self {
        Self { store }
    }

    /// Underlying store
    pub fn store(&self) -> &SnapshotStore {
        &self.store
    }

    /// Unconditionally persist `content` as the snapshot for `scenario_key` / `adapter`
    pub fn update_snapshot(
        &self,
        scenario_key: &str,
        adapter: &str,
        content: &str,
    ) -> Result<PathBuf, SnapshotError> {
        let path = self.store.save(scenario_key, adapter, content)?;
        info!(
            scenario = scenario_key,
            adapter,
            path = %path.display(),
            "snapshot updated"
        );
        Ok(path)
    }

    /// Compare `actual_output` against the snapshot of `compare_against`
    /// (defaults to `adapter` itself). Never writes.
    pub fn verify_snapshot(
        &self,
        scenario_key: &str,
        adapter: &str,
        actual_output: &str,
        compare_against: Option<&str>,
    ) -> Result<VerifyResult, SnapshotError> {
        let target = compare_against.unwrap_or(adapter);
        let compared_against = (target != adapter).then(|| target.to_string());

        let status = match self.store.load(scenario_key, target)? {
            None => VerifyStatus::Missing,
            Some(expected) => {
                let comparison = compare_snapshots(&expected, actual_output);
                match comparison.diff {
                    None => VerifyStatus::Pass,
                    Some(diff) => VerifyStatus::Fail { diff },
                }
            }
        };

        let result = VerifyResult {
            status,
            compared_against,
        };
        debug!(
            scenario = scenario_key,
            adapter,
            target,
            status = result.label(),
            "snapshot verified"
        );

        Ok(result)
    }
}

/// Running verification totals for a run
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct VerificationSummary {
    /// Outputs matching their snapshot
    pub passed: usize,
    /// Outputs that diverged
    pub failed: usize,
    /// Outputs with no snapshot to compare against
    pub missing: usize,
}

impl VerificationSummary {
    /// Count one verdict
    pub fn record(&mut self, result: &VerifyResult) {
        match result.status {
            VerifyStatus::Pass => self.passed += 1,
            VerifyStatus::Fail { .. } => self.failed += 1,
            VerifyStatus::Missing => self.missing += 1,
        }
    }

    /// Divergence fails a run; missing snapshots never do
    pub fn should_fail(&self) -> bool {
        self.failed > 0
    }

    /// Verifications that had a snapshot to compare against
    pub fn total_compared(&self) -> usize {
        self.passed + self.failed
    }
}
