//! Scenario Planner
//!
//! Builds an adapter's execution plan from the discovered scenarios.
//!
//! Filtering options:
//! - Regex pattern matching on scenario path
//! - Per-adapter exclusion list (excluded scenarios are reported as skipped)
//!
//! Ordering: scenarios are sorted by path for deterministic execution.

use crate::scenarios::ScenarioInfo;
use fxhash::FxHashSet;
use regex::Regex;

/// Execution plan for one adapter
#[derive(Debug, Clone, Default)]
pub struct ScenarioPlan {
    /// Scenarios to run, in order
    pub runnable: Vec<ScenarioInfo>,
    /// Scenarios matching the filter but on the exclusion list
    pub excluded: Vec<ScenarioInfo>,
}

impl ScenarioPlan {
    /// Whether the filter matched nothing
    pub fn is_empty(&self) -> bool {
        self.runnable.is_empty() && self.excluded.is_empty()
    }
}

/// Build execution plan from discovered scenarios
pub fn build_plan<'a>(
    scenarios: impl IntoIterator<Item = &'a ScenarioInfo>,
    filter: Option<&Regex>,
    exclude: &[String],
) -> ScenarioPlan {
    let excluded_paths: FxHashSet<&str> = exclude.iter().map(String::as_str).collect();

    let mut plan = ScenarioPlan::default();
    for scenario in scenarios {
        // Apply regex filter on scenario path
        if let Some(re) = filter {
            if !re.is_match(&scenario.path) {
                continue;
            }
        }

        if excluded_paths.contains(scenario.path.as_str()) {
            plan.excluded.push(scenario.clone());
        } else {
            plan.runnable.push(scenario.clone());
        }
    }

    plan.runnable.sort_by(|a, b| a.path.cmp(&b.path));
    plan.excluded.sort_by(|a, b| a.path.cmp(&b.path));
    plan
}
