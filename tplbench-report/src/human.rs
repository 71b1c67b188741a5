//! Human Output
//!
//! Terminal-friendly rendering of a [`Report`]:
//! - one aligned row per benchmark (parse, render, total mean and spread)
//! - failure messages and snapshot diffs below the table
//! - skipped executions and run totals

use crate::report::{BenchResult, ErrorPayload, Report};

const HEADERS: [&str; 7] = [
    "ADAPTER", "SCENARIO", "PARSE", "RENDER", "TOTAL", "STDDEV", "VERIFY",
];

/// Format a report for human-readable terminal display
pub fn format_human_output(report: &Report) -> String {
    let mut output = String::new();

    output.push('\n');
    output.push_str(&format!(
        "tplbench Results (scale: {}, iterations: {}, warmup: {})\n",
        report.meta.scale, report.meta.iterations, report.meta.warmup
    ));
    output.push_str(&"=".repeat(60));
    output.push_str("\n\n");

    if report.results.is_empty() {
        output.push_str("  No benchmarks executed.\n");
    } else {
        let rows: Vec<[String; 7]> = report.results.iter().map(row).collect();

        let mut widths = HEADERS.map(str::len);
        for r in &rows {
            for (width, cell) in widths.iter_mut().zip(r.iter()) {
                *width = (*width).max(cell.chars().count());
            }
        }

        push_row(&mut output, &HEADERS.map(String::from), &widths);
        for r in &rows {
            push_row(&mut output, r, &widths);
        }
    }

    // Failures
    let failures: Vec<_> = report
        .results
        .iter()
        .filter_map(|r| r.error.as_ref().map(|e| (r, e)))
        .collect();
    if !failures.is_empty() {
        output.push_str("\nErrors\n");
        output.push_str(&"-".repeat(60));
        output.push('\n');
        for (result, error) in failures {
            output.push_str(&format!(
                "  ✗ {}/{}: [{}] {}\n",
                result.adapter, result.scenario, error.code, error.message
            ));
            if let Some(suggestion) = &error.suggestion {
                output.push_str(&format!("      hint: {}\n", suggestion));
            }
        }
    }

    // Snapshot diffs
    let diverged: Vec<_> = report
        .results
        .iter()
        .filter_map(|r| {
            r.verification
                .as_ref()
                .and_then(|v| v.diff().map(|d| (r, v, d)))
        })
        .collect();
    if !diverged.is_empty() {
        output.push_str("\nSnapshot Differences\n");
        output.push_str(&"-".repeat(60));
        output.push('\n');
        for (result, verification, diff) in diverged {
            let target = verification
                .compared_against
                .as_deref()
                .unwrap_or(&result.adapter);
            output.push_str(&format!(
                "  {}/{} (against {}):\n",
                result.adapter, result.scenario, target
            ));
            for line in diff.lines() {
                output.push_str(&format!("    {}\n", line));
            }
        }
    }

    if !report.skipped.is_empty() {
        output.push_str("\nSkipped\n");
        output.push_str(&"-".repeat(60));
        output.push('\n');
        for entry in &report.skipped {
            output.push_str(&format!(
                "  ⊘ {}/{}: {}\n",
                entry.adapter,
                entry.scenario,
                entry.reason.describe()
            ));
        }
    }

    let summary = &report.summary;
    output.push_str("\nSummary\n");
    output.push_str(&"-".repeat(60));
    output.push('\n');
    output.push_str(&format!(
        "  Completed: {}  Failed: {}  Skipped: {}\n",
        summary.completed, summary.failed, summary.skipped
    ));
    output.push_str(&format!(
        "  Verification: {} passed  {} failed  {} missing\n",
        summary.verification.passed, summary.verification.failed, summary.verification.missing
    ));
    output.push_str(&format!("  Duration: {:.2} ms\n", summary.total_duration_ms));

    output
}

/// One-line error for terminal display; the suggestion is left to the caller
pub fn format_error_human(error: &ErrorPayload) -> String {
    format!("error: {}", error.message)
}

fn row(result: &BenchResult) -> [String; 7] {
    let verify = match &result.verification {
        Some(v) => v.label().to_string(),
        None => "-".to_string(),
    };

    match (&result.metrics, result.success) {
        (Some(m), true) => [
            result.adapter.clone(),
            result.scenario.clone(),
            format_ms(m.parse.mean_ms),
            format_ms(m.render.mean_ms),
            format_ms(m.total.mean_ms),
            format!("±{}", format_ms(m.total.stddev_ms)),
            verify,
        ],
        _ => {
            let code = result
                .error
                .as_ref()
                .map(|e| e.code.as_str())
                .unwrap_or("FAILED");
            [
                result.adapter.clone(),
                result.scenario.clone(),
                code.to_string(),
                "-".to_string(),
                "-".to_string(),
                "-".to_string(),
                verify,
            ]
        }
    }
}

fn push_row(output: &mut String, cells: &[String; 7], widths: &[usize; 7]) {
    output.push(' ');
    for (i, (cell, width)) in cells.iter().zip(widths).enumerate() {
        let pad = width.saturating_sub(cell.chars().count());
        output.push(' ');
        // Text columns left-aligned, numbers right-aligned.
        if i < 2 || i == 6 {
            output.push_str(cell);
            output.push_str(&" ".repeat(pad));
        } else {
            output.push_str(&" ".repeat(pad));
            output.push_str(cell);
        }
        output.push(' ');
    }
    let trimmed = output.trim_end_matches(' ').len();
    output.truncate(trimmed);
    output.push('\n');
}

fn format_ms(ms: f64) -> String {
    if ms >= 1000.0 {
        format!("{:.2} s", ms / 1000.0)
    } else if ms >= 1.0 {
        format!("{:.2} ms", ms)
    } else {
        format!("{:.1} µs", ms * 1000.0)
    }
}
