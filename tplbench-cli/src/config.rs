//! Configuration loading from tplbench.toml
//!
//! tplbench configuration can be specified in a `tplbench.toml` file in the project root.
//! The configuration is automatically discovered by walking up from the current directory.
//! Relative paths inside the file are resolved against the directory containing it.

use crate::adapters::AdapterName;
use crate::scenarios::Scale;
use anyhow::Context;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use std::time::Duration;

/// Name of the configuration file looked up during discovery
pub const CONFIG_FILE_NAME: &str = "tplbench.toml";

/// tplbench configuration
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct BenchConfig {
    /// Scenario, fixture and snapshot locations
    #[serde(default)]
    pub paths: PathsConfig,
    /// Runner defaults
    #[serde(default)]
    pub runner: RunnerConfig,
    /// Snapshot verification settings
    #[serde(default)]
    pub verification: VerificationConfig,
    /// Per-adapter overrides
    #[serde(default)]
    pub adapters: BTreeMap<AdapterName, AdapterSection>,
    /// Directory relative paths are resolved against
    #[serde(skip)]
    root: PathBuf,
}

/// File-system layout
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PathsConfig {
    /// Template scenario root
    #[serde(default = "default_scenarios")]
    pub scenarios: PathBuf,
    /// Fixture data root, holding `<scale>.json`
    #[serde(default = "default_data")]
    pub data: PathBuf,
    /// Snapshot base directory
    #[serde(default = "default_snapshots")]
    pub snapshots: PathBuf,
    /// Extension of template files
    #[serde(default = "default_template_extension")]
    pub template_extension: String,
}

impl Default for PathsConfig {
    fn default() -> Self {
        Self {
            scenarios: default_scenarios(),
            data: default_data(),
            snapshots: default_snapshots(),
            template_extension: default_template_extension(),
        }
    }
}

fn default_scenarios() -> PathBuf {
    PathBuf::from("scenarios")
}
fn default_data() -> PathBuf {
    PathBuf::from("data")
}
fn default_snapshots() -> PathBuf {
    PathBuf::from("snapshots")
}
fn default_template_extension() -> String {
    "liquid".to_string()
}

/// Runner configuration for benchmark execution
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RunnerConfig {
    /// Timeout for a single adapter invocation (e.g., "60s", "500ms")
    #[serde(default = "default_timeout")]
    pub timeout: String,
    /// Measured iterations per benchmark
    #[serde(default = "default_iterations")]
    pub iterations: u32,
    /// Unmeasured warmup iterations per benchmark
    #[serde(default = "default_warmup")]
    pub warmup: u32,
    /// Fixture data scale
    #[serde(default)]
    pub scale: Scale,
}

impl Default for RunnerConfig {
    fn default() -> Self {
        Self {
            timeout: default_timeout(),
            iterations: default_iterations(),
            warmup: default_warmup(),
            scale: Scale::default(),
        }
    }
}

fn default_timeout() -> String {
    "60s".to_string()
}
fn default_iterations() -> u32 {
    100
}
fn default_warmup() -> u32 {
    10
}

/// Snapshot verification configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct VerificationConfig {
    /// Adapter whose snapshots `--against-baseline` compares with
    #[serde(default = "default_baseline")]
    pub baseline: AdapterName,
}

impl Default for VerificationConfig {
    fn default() -> Self {
        Self {
            baseline: default_baseline(),
        }
    }
}

fn default_baseline() -> AdapterName {
    AdapterName::Ruby
}

/// `[adapters.<name>]` table; unset fields keep the built-in defaults
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct AdapterSection {
    /// Template library name
    pub library: Option<String>,
    /// Program and arguments
    pub command: Option<Vec<String>>,
    /// Working directory, relative to the config file
    pub working_dir: Option<PathBuf>,
    /// Extra environment variables
    #[serde(default)]
    pub env: BTreeMap<String, String>,
    /// Interpreter binary; empty disables the probe
    pub runtime: Option<String>,
    /// Version probe arguments
    pub version_args: Option<Vec<String>>,
    /// Minimum runtime version; empty disables the check
    pub min_version: Option<String>,
    /// Paths that must exist
    pub requires: Option<Vec<PathBuf>>,
    /// Remediation for missing requirements
    pub install_hint: Option<String>,
    /// Unsupported scenarios
    pub exclude: Option<Vec<String>>,
}

impl BenchConfig {
    /// Load configuration from a TOML file
    pub fn load(path: impl AsRef<Path>) -> anyhow::Result<Self> {
        let path = path.as_ref();
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("failed to read {}", path.display()))?;
        let root = path
            .parent()
            .filter(|p| !p.as_os_str().is_empty())
            .unwrap_or_else(|| Path::new("."));
        Self::from_toml_str(&content, root)
            .with_context(|| format!("failed to parse {}", path.display()))
    }

    /// Parse configuration text, resolving relative paths against `root`
    pub fn from_toml_str(content: &str, root: &Path) -> anyhow::Result<Self> {
        let mut config: Self = toml::from_str(content)?;
        config.root = root.to_path_buf();
        Ok(config)
    }

    /// Try to discover and load configuration by walking up from current directory
    pub fn discover() -> anyhow::Result<Option<Self>> {
        let dir = std::env::current_dir()?;
        Self::discover_from(&dir)
    }

    /// Walk up from `start` looking for [`CONFIG_FILE_NAME`]
    pub fn discover_from(start: &Path) -> anyhow::Result<Option<Self>> {
        let mut dir = start.to_path_buf();
        loop {
            let config_path = dir.join(CONFIG_FILE_NAME);
            if config_path.is_file() {
                return Self::load(&config_path).map(Some);
            }
            if !dir.pop() {
                break;
            }
        }
        Ok(None)
    }

    /// Built-in defaults rooted at `root`
    pub fn defaults_at(root: &Path) -> Self {
        Self {
            root: root.to_path_buf(),
            ..Self::default()
        }
    }

    /// Directory relative paths are resolved against
    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Absolute (or root-relative) scenario directory
    pub fn scenarios_dir(&self) -> PathBuf {
        self.root.join(&self.paths.scenarios)
    }

    /// Fixture data directory
    pub fn data_dir(&self) -> PathBuf {
        self.root.join(&self.paths.data)
    }

    /// Snapshot base directory
    pub fn snapshots_dir(&self) -> PathBuf {
        self.root.join(&self.paths.snapshots)
    }

    /// Configured per-invocation timeout
    pub fn timeout(&self) -> anyhow::Result<Duration> {
        Self::parse_duration(&self.runner.timeout)
    }

    /// Generate a default configuration as TOML string
    pub fn default_toml() -> String {
        r#"# tplbench Configuration

[paths]
# Template scenarios, one file per scenario
scenarios = "scenarios"
# Fixture data, one <scale>.json per scale
data = "data"
# Snapshot base directory
snapshots = "snapshots"
# Template file extension
template_extension = "liquid"

[runner]
# Timeout for a single adapter invocation
timeout = "60s"
# Measured iterations per benchmark (1-10000)
iterations = 100
# Warmup iterations per benchmark (0-1000)
warmup = 10
# Fixture scale: small, medium or large
scale = "small"

[verification]
# Adapter used by --against-baseline
baseline = "ruby"

# Adapter overrides (uncomment to change the built-in settings)
# [adapters.php]
# command = ["php", "adapters/php/adapter.php"]
# runtime = "php"
# min_version = "8.1"
# requires = ["adapters/php/vendor/autoload.php"]
# install_hint = "cd adapters/php && composer install"
# exclude = []
#
# [adapters.ruby]
# command = ["ruby", "adapters/ruby/adapter.rb"]
# runtime = "ruby"
# min_version = "3.0"
# requires = ["adapters/ruby/Gemfile.lock"]
# install_hint = "cd adapters/ruby && bundle install"
# exclude = []
"#
        .to_string()
    }

    /// Parse duration string (e.g., "3s", "500ms", "2m")
    pub fn parse_duration(s: &str) -> anyhow::Result<Duration> {
        let s = s.trim();
        if s.is_empty() {
            return Err(anyhow::anyhow!("Empty duration string"));
        }

        // Find where the number ends and unit begins
        let (num_part, unit_part) = s
            .char_indices()
            .find(|(_, c)| c.is_alphabetic())
            .map(|(i, _)| s.split_at(i))
            .unwrap_or((s, "s"));

        let value: f64 = num_part
            .trim()
            .parse()
            .map_err(|_| anyhow::anyhow!("Invalid duration number: {}", num_part))?;
        if !value.is_finite() || value < 0.0 {
            return Err(anyhow::anyhow!("Invalid duration number: {}", num_part));
        }

        let millis_per_unit = match unit_part.to_lowercase().as_str() {
            "ms" => 1.0,
            "s" | "" => 1_000.0,
            "m" | "min" => 60_000.0,
            _ => return Err(anyhow::anyhow!("Unknown duration unit: {}", unit_part)),
        };

        Ok(Duration::from_secs_f64(value * millis_per_unit / 1_000.0))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        let config = BenchConfig::default();
        assert_eq!(config.runner.timeout, "60s");
        assert_eq!(config.runner.iterations, 100);
        assert_eq!(config.runner.warmup, 10);
        assert_eq!(config.runner.scale, Scale::Small);
        assert_eq!(config.paths.template_extension, "liquid");
        assert_eq!(config.verification.baseline, AdapterName::Ruby);
        assert!(config.adapters.is_empty());
    }

    #[test]
    fn test_parse_duration() {
        assert_eq!(
            BenchConfig::parse_duration("3s").unwrap(),
            Duration::from_secs(3)
        );
        assert_eq!(
            BenchConfig::parse_duration("500ms").unwrap(),
            Duration::from_millis(500)
        );
        assert_eq!(
            BenchConfig::parse_duration("2m").unwrap(),
            Duration::from_secs(120)
        );
        assert_eq!(
            BenchConfig::parse_duration("1.5s").unwrap(),
            Duration::from_millis(1500)
        );
        assert_eq!(
            BenchConfig::parse_duration("10").unwrap(),
            Duration::from_secs(10)
        );
        assert!(BenchConfig::parse_duration("").is_err());
        assert!(BenchConfig::parse_duration("5h").is_err());
        assert!(BenchConfig::parse_duration("-1s").is_err());
    }

    #[test]
    fn test_parse_toml() {
        let toml_str = r#"
            [runner]
            iterations = 5
            scale = "large"

            [verification]
            baseline = "php"
        "#;

        let config = BenchConfig::from_toml_str(toml_str, Path::new("/work")).unwrap();
        assert_eq!(config.runner.iterations, 5);
        assert_eq!(config.runner.scale, Scale::Large);
        assert_eq!(config.verification.baseline, AdapterName::Php);
        // Defaults should still apply
        assert_eq!(config.runner.warmup, 10);
        assert_eq!(config.snapshots_dir(), PathBuf::from("/work/snapshots"));
    }

    #[test]
    fn test_unknown_adapter_rejected() {
        let toml_str = r#"
            [adapters.python]
            command = ["python3", "adapter.py"]
        "#;
        assert!(BenchConfig::from_toml_str(toml_str, Path::new(".")).is_err());
    }

    #[test]
    fn test_default_toml_parses() {
        let default_toml = BenchConfig::default_toml();
        let config = BenchConfig::from_toml_str(&default_toml, Path::new(".")).unwrap();
        let defaults = BenchConfig::default();
        assert_eq!(config.runner.timeout, defaults.runner.timeout);
        assert_eq!(config.runner.iterations, defaults.runner.iterations);
        assert_eq!(config.runner.warmup, defaults.runner.warmup);
        assert_eq!(config.runner.scale, defaults.runner.scale);
        assert_eq!(config.paths.scenarios, defaults.paths.scenarios);
        assert_eq!(config.paths.snapshots, defaults.paths.snapshots);
        assert_eq!(config.verification.baseline, defaults.verification.baseline);
        assert!(config.adapters.is_empty());
    }

    #[test]
    fn test_discover_walks_up() {
        let dir = tempfile::tempdir().unwrap();
        let nested = dir.path().join("a/b");
        std::fs::create_dir_all(&nested).unwrap();
        std::fs::write(
            dir.path().join(CONFIG_FILE_NAME),
            "[runner]\niterations = 7\n",
        )
        .unwrap();

        let config = BenchConfig::discover_from(&nested).unwrap().unwrap();
        assert_eq!(config.runner.iterations, 7);
        assert_eq!(config.root(), dir.path());
    }

    #[test]
    fn test_invalid_file_is_an_error() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(dir.path().join(CONFIG_FILE_NAME), "[runner\n").unwrap();
        assert!(BenchConfig::discover_from(dir.path()).is_err());
    }
}
