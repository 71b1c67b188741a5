//! Snapshot Step
//!
//! Applied to each successful adapter run according to the run's
//! [`SnapshotMode`]. Updating never reports a verdict; verifying never writes.

use super::execution::SnapshotMode;
use crate::adapters::AdapterName;
use tplbench_verify::{SnapshotError, VerificationEngine, VerifyResult};
use tracing::warn;

/// Update or verify the snapshot for `scenario_key` / `adapter`.
///
/// Returns `None` when snapshots are off, after an update, or when the
/// adapter reported no rendered output.
pub fn apply_snapshot_mode(
    engine: &VerificationEngine,
    mode: &SnapshotMode,
    scenario_key: &str,
    adapter: AdapterName,
    rendered_output: Option<&str>,
) -> Result<Option<VerifyResult>, SnapshotError> {
    if matches!(mode, SnapshotMode::Off) {
        return Ok(None);
    }
    let Some(rendered) = rendered_output else {
        warn!(
            adapter = %adapter,
            scenario = scenario_key,
            "adapter returned no rendered_output, snapshot step skipped"
        );
        return Ok(None);
    };

    match mode {
        SnapshotMode::Off => Ok(None),
        SnapshotMode::Update => {
            engine.update_snapshot(scenario_key, adapter.as_str(), rendered)?;
            Ok(None)
        }
        SnapshotMode::Verify { compare_against } => engine
            .verify_snapshot(
                scenario_key,
                adapter.as_str(),
                rendered,
                compare_against.map(AdapterName::as_str),
            )
            .map(Some),
    }
}
