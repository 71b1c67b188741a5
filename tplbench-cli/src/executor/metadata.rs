//! System Metadata Collection
//!
//! Collects host information for report metadata: OS, architecture, CPU
//! model and core count, plus the options the run used.
//!
//! The CPU model is read from `/proc/cpuinfo` and degrades to "Unknown" on
//! other platforms.

use super::execution::RunOptions;
use chrono::Utc;
use tplbench_report::{ReportMeta, RunMode, SystemInfo};

/// Build report metadata for a run
pub fn build_report_meta(mode: RunMode, options: &RunOptions) -> ReportMeta {
    let system = SystemInfo {
        os: std::env::consts::OS.to_string(),
        arch: std::env::consts::ARCH.to_string(),
        cpu: get_cpu_model().unwrap_or_else(|| "Unknown".to_string()),
        cpu_cores: num_cpus(),
    };

    ReportMeta {
        version: env!("CARGO_PKG_VERSION").to_string(),
        timestamp: Utc::now(),
        mode,
        scale: options.scale.to_string(),
        iterations: options.iterations,
        warmup: options.warmup,
        snapshot_mode: options.snapshots.label().to_string(),
        system,
    }
}

/// Get CPU model name from /proc/cpuinfo (Linux only)
fn get_cpu_model() -> Option<String> {
    #[cfg(target_os = "linux")]
    {
        std::fs::read_to_string("/proc/cpuinfo")
            .ok()
            .and_then(|content| {
                content
                    .lines()
                    .find(|l| l.starts_with("model name"))
                    .and_then(|l| l.split(':').nth(1))
                    .map(|s| s.trim().to_string())
            })
    }
    #[cfg(not(target_os = "linux"))]
    {
        None
    }
}

/// Get number of available CPU cores
fn num_cpus() -> u32 {
    std::thread::available_parallelism()
        .map(|n| n.get() as u32)
        .unwrap_or(1)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::executor::SnapshotMode;

    #[test]
    fn test_meta_reflects_options() {
        let options = RunOptions {
            iterations: 7,
            warmup: 2,
            snapshots: SnapshotMode::Update,
            ..RunOptions::default()
        };
        let meta = build_report_meta(RunMode::Single, &options);

        assert_eq!(meta.mode, RunMode::Single);
        assert_eq!(meta.scale, "small");
        assert_eq!(meta.iterations, 7);
        assert_eq!(meta.warmup, 2);
        assert_eq!(meta.snapshot_mode, "update");
        assert_eq!(meta.system.os, std::env::consts::OS);
        assert!(meta.system.cpu_cores >= 1);
    }
}
