//! Scenario and Fixture Loading
//!
//! A scenario is a template file below the scenario root. Its path is the
//! relative file path without extension, `/`-separated (`filters/escape`).
//! Fixture data lives in `<data>/<scale>.json` and must be a JSON object.

use crate::error::BenchError;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::fmt;
use std::io;
use std::path::{Component, Path, PathBuf};
use std::str::FromStr;
use walkdir::WalkDir;

/// Fixture data volume tier
#[derive(
    Debug,
    Clone,
    Copy,
    Default,
    PartialEq,
    Eq,
    Hash,
    Serialize,
    Deserialize,
    clap::ValueEnum,
)]
#[serde(rename_all = "lowercase")]
pub enum Scale {
    /// Small fixtures
    #[default]
    Small,
    /// Medium fixtures
    Medium,
    /// Large fixtures
    Large,
}

impl Scale {
    /// Lowercase name, as used in file names and snapshot keys
    pub fn as_str(self) -> &'static str {
        match self {
            Scale::Small => "small",
            Scale::Medium => "medium",
            Scale::Large => "large",
        }
    }
}

impl fmt::Display for Scale {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Scale {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "small" => Ok(Scale::Small),
            "medium" => Ok(Scale::Medium),
            "large" => Ok(Scale::Large),
            other => Err(format!("unknown scale `{}`", other)),
        }
    }
}

/// A discovered scenario
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ScenarioInfo {
    /// Relative path without extension, e.g. `filters/escape`
    pub path: String,
    /// Everything before the last segment; empty for top-level scenarios
    pub category: String,
    /// Last path segment
    pub name: String,
    /// Template file on disk
    pub file: PathBuf,
}

/// Reads templates and fixture data from disk
#[derive(Debug, Clone)]
pub struct ScenarioLoader {
    root: PathBuf,
    data_dir: PathBuf,
    extension: String,
}

impl ScenarioLoader {
    /// Loader over `root` templates with `extension`, and fixtures in `data_dir`
    pub fn new(
        root: impl Into<PathBuf>,
        data_dir: impl Into<PathBuf>,
        extension: impl Into<String>,
    ) -> Self {
        Self {
            root: root.into(),
            data_dir: data_dir.into(),
            extension: extension.into(),
        }
    }

    /// Scenario root
    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Every scenario below the root, sorted by path
    pub fn list_all(&self) -> Result<Vec<ScenarioInfo>, BenchError> {
        let mut scenarios = Vec::new();

        for entry in WalkDir::new(&self.root).follow_links(true) {
            let entry = entry.map_err(|e| {
                let path = e.path().unwrap_or(&self.root).to_path_buf();
                BenchError::io(path, io::Error::other(e.to_string()))
            })?;
            if !entry.file_type().is_file() {
                continue;
            }
            let file = entry.path();
            if file.extension().and_then(|e| e.to_str()) != Some(self.extension.as_str()) {
                continue;
            }
            let Ok(relative) = file.strip_prefix(&self.root) else {
                continue;
            };

            let segments: Vec<String> = relative
                .with_extension("")
                .components()
                .filter_map(|c| match c {
                    Component::Normal(s) => Some(s.to_string_lossy().into_owned()),
                    _ => None,
                })
                .collect();
            let Some((name, parents)) = segments.split_last() else {
                continue;
            };

            scenarios.push(ScenarioInfo {
                path: segments.join("/"),
                category: parents.join("/"),
                name: name.clone(),
                file: file.to_path_buf(),
            });
        }

        scenarios.sort_by(|a, b| a.path.cmp(&b.path));
        Ok(scenarios)
    }

    /// Template file for `scenario`, or `None` when the path escapes the root
    pub fn template_path(&self, scenario: &str) -> Option<PathBuf> {
        let relative = Path::new(scenario);
        let safe = !scenario.is_empty()
            && relative
                .components()
                .all(|c| matches!(c, Component::Normal(_)));
        safe.then(|| {
            self.root
                .join(format!("{}.{}", scenario, self.extension))
        })
    }

    /// Template source for `scenario`
    pub fn load_scenario(&self, scenario: &str) -> Result<String, BenchError> {
        let path = self
            .template_path(scenario)
            .ok_or_else(|| BenchError::ScenarioNotFound(scenario.to_string()))?;

        std::fs::read_to_string(&path).map_err(|e| match e.kind() {
            io::ErrorKind::NotFound => BenchError::ScenarioNotFound(scenario.to_string()),
            _ => BenchError::io(path, e),
        })
    }

    /// Fixture file for `scale`
    pub fn data_path(&self, scale: Scale) -> PathBuf {
        self.data_dir.join(format!("{}.json", scale))
    }

    /// Fixture data for `scale`
    pub fn load_data(&self, scale: Scale) -> Result<Map<String, Value>, BenchError> {
        let path = self.data_path(scale);
        let content = std::fs::read_to_string(&path).map_err(|e| match e.kind() {
            io::ErrorKind::NotFound => BenchError::DataNotFound {
                scale,
                path: path.clone(),
            },
            _ => BenchError::io(&path, e),
        })?;

        match serde_json::from_str::<Value>(&content) {
            Ok(Value::Object(map)) => Ok(map),
            Ok(_) => Err(BenchError::io(
                path,
                io::Error::new(
                    io::ErrorKind::InvalidData,
                    "fixture data must be a JSON object",
                ),
            )),
            Err(e) => Err(BenchError::io(
                path,
                io::Error::new(io::ErrorKind::InvalidData, e),
            )),
        }
    }
}
