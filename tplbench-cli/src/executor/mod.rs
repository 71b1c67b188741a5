//! Benchmark Executor
//!
//! Drives adapters over scenarios and collects results.
//!
//! ## Pipeline Overview
//!
//! ```text
//! (adapter, scenario)
//!       │
//!       ▼
//! ┌─────────────┐
//! │  execution  │  Readiness check, adapter run, timing metrics
//! └──────┬──────┘
//!        │
//!        ▼
//! ┌─────────────┐
//! │verification │  Snapshot update or verify
//! └──────┬──────┘
//!        │
//!        ▼
//! ┌─────────────┐
//! │  metadata   │  Report header (host, options)
//! └─────────────┘
//! ```
//!
//! ## Modules
//!
//! - [`execution`] - Single and all mode orchestration
//! - [`verification`] - Snapshot step applied to each successful run
//! - [`metadata`] - System metadata collection

mod execution;
mod metadata;
mod verification;

// Re-export public API
pub use execution::{BenchOrchestrator, RunOptions, SnapshotMode};
pub use metadata::build_report_meta;
pub use verification::apply_snapshot_mode;
