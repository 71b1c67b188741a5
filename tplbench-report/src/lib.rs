#![warn(missing_docs)]
//! tplbench Report - Result Records and Output
//!
//! Generates the outputs consumed after a run:
//! - JSON (machine-readable, full report or error payload)
//! - Human (aligned terminal table, one-line errors)

mod human;
mod json;
mod report;

pub use human::{format_error_human, format_human_output};
pub use json::{format_error_json, generate_json_report};
pub use report::{
    BenchResult, ErrorPayload, LibraryInfo, Report, ReportMeta, RunMode, RunSummary, SkipReason,
    SkippedEntry, SystemInfo,
};

/// Output format selection
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum OutputFormat {
    /// Pretty-printed JSON
    Json,
    /// Human-readable terminal output
    #[default]
    Human,
}

impl std::str::FromStr for OutputFormat {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "json" => Ok(OutputFormat::Json),
            "human" | "text" | "table" => Ok(OutputFormat::Human),
            other => Err(format!("Unknown output format: {}", other)),
        }
    }
}
