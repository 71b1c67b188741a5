#![warn(missing_docs)]
//! tplbench Verify - Rendered Output Verification
//!
//! Detects behavioral drift in template engines by comparing what an adapter
//! rendered against a stored snapshot:
//! - [`SnapshotStore`]: one file per (scenario, scale, adapter)
//! - [`compare_snapshots`]: exact comparison with a line diff on mismatch
//! - [`VerificationEngine`]: explicit baseline updates and pass/fail/missing verdicts

mod comparator;
mod engine;
mod store;

pub use comparator::{SnapshotComparison, compare_snapshots};
pub use engine::{
    VerificationEngine, VerificationSummary, VerifyResult, VerifyStatus,
};
pub use store::{SNAPSHOT_EXTENSION, SnapshotError, SnapshotStore, scenario_key};
