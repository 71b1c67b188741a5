//! Snapshot Comparison
//!
//! Exact string equality. On mismatch a line diff is built by walking both
//! contents index by index up to the longer length:
//!
//! ```text
//! --- expected
//! +++ actual
//!   unchanged line
//! - line only in (or changed from) the snapshot
//! + line only in (or changed to) the current output
//! ```
//!
//! Lines are split on `\n` only, so a `\r` or trailing space shows up as a change.

use std::fmt::Write;

/// Neutral prefix for unchanged lines
const UNCHANGED: &str = "  ";
/// Prefix for lines present in the stored snapshot only
const REMOVED: &str = "- ";
/// Prefix for lines present in the current output only
const ADDED: &str = "+ ";

/// Outcome of comparing a snapshot with current output
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SnapshotComparison {
    /// Contents are byte-identical
    pub matches: bool,
    /// Line diff, present only on mismatch
    pub diff: Option<String>,
}

/// Compare the stored `expected` snapshot with the `actual` output
pub fn compare_snapshots(expected: &str, actual: &str) -> SnapshotComparison {
    if expected == actual {
        return SnapshotComparison {
            matches: true,
            diff: None,
        };
    }

    SnapshotComparison {
        matches: false,
        diff: Some(line_diff(expected, actual)),
    }
}

fn line_diff(expected: &str, actual: &str) -> String {
    let expected_lines: Vec<&str> = expected.split('\n').collect();
    let actual_lines: Vec<&str> = actual.split('\n').collect();
    let len = expected_lines.len().max(actual_lines.len());

    let mut out = String::from("--- expected\n+++ actual\n");
    for i in 0..len {
        // Writing into a String cannot fail.
        let _ = match (expected_lines.get(i), actual_lines.get(i)) {
            (Some(e), Some(a)) if e == a => writeln!(out, "{}{}", UNCHANGED, e),
            (Some(e), Some(a)) => {
                writeln!(out, "{}{}", REMOVED, e).and_then(|_| writeln!(out, "{}{}", ADDED, a))
            }
            (Some(e), None) => writeln!(out, "{}{}", REMOVED, e),
            (None, Some(a)) => writeln!(out, "{}{}", ADDED, a),
            (None, None) => Ok(()),
        };
    }
    out
}
