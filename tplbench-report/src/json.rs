//! JSON Output

use crate::report::{ErrorPayload, Report};
use serde::Serialize;

#[derive(Serialize)]
struct ErrorEnvelope<'a> {
    success: bool,
    error: &'a ErrorPayload,
}

/// Generate a prettified JSON report.
pub fn generate_json_report(report: &Report) -> Result<String, serde_json::Error> {
    serde_json::to_string_pretty(report)
}

/// Serialize a fatal error as `{"success": false, "error": {...}}`
pub fn format_error_json(error: &ErrorPayload) -> Result<String, serde_json::Error> {
    serde_json::to_string_pretty(&ErrorEnvelope {
        success: false,
        error,
    })
}
