//! Adapter Registry
//!
//! Closed set of template-engine adapters. Each [`AdapterName`] resolves to
//! exactly one [`AdapterConfig`]; adding an adapter means adding a variant and
//! its default entry in [`AdapterConfig::defaults`].

use crate::config::{AdapterSection, BenchConfig};
use crate::error::BenchError;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;
use std::path::{Path, PathBuf};
use std::str::FromStr;
use tplbench_ipc::Lang;

/// Known adapters
#[derive(
    Debug,
    Clone,
    Copy,
    PartialEq,
    Eq,
    PartialOrd,
    Ord,
    Hash,
    Serialize,
    Deserialize,
    clap::ValueEnum,
)]
#[serde(rename_all = "lowercase")]
pub enum AdapterName {
    /// PHP Liquid port
    Php,
    /// Reference Ruby Liquid
    Ruby,
}

impl AdapterName {
    /// All adapters, in execution order
    pub const ALL: [AdapterName; 2] = [AdapterName::Php, AdapterName::Ruby];

    /// Stable lowercase name, used in snapshot paths and reports
    pub fn as_str(self) -> &'static str {
        match self {
            AdapterName::Php => "php",
            AdapterName::Ruby => "ruby",
        }
    }

    /// Language the adapter reports on the wire
    pub fn lang(self) -> Lang {
        match self {
            AdapterName::Php => Lang::Php,
            AdapterName::Ruby => Lang::Ruby,
        }
    }
}

impl fmt::Display for AdapterName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for AdapterName {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "php" => Ok(AdapterName::Php),
            "ruby" => Ok(AdapterName::Ruby),
            other => Err(format!(
                "unknown adapter `{}` (expected one of: php, ruby)",
                other
            )),
        }
    }
}

/// Fully resolved adapter settings
#[derive(Debug, Clone, PartialEq)]
pub struct AdapterConfig {
    /// Adapter identity
    pub name: AdapterName,
    /// Template library the adapter wraps
    pub library: String,
    /// Program and arguments; the first element is the executable
    pub command: Vec<String>,
    /// Working directory for the subprocess
    pub working_dir: PathBuf,
    /// Environment overrides on top of the inherited environment
    pub env: BTreeMap<String, String>,
    /// Interpreter probed by the readiness check
    pub runtime: Option<String>,
    /// Arguments that make the runtime print its version
    pub version_args: Vec<String>,
    /// Lowest accepted runtime version (`major.minor[.patch]`)
    pub min_version: Option<String>,
    /// Paths, relative to `working_dir`, that must exist before running
    pub requires: Vec<PathBuf>,
    /// Remediation shown when `requires` is not satisfied
    pub install_hint: Option<String>,
    /// Scenario paths this adapter does not support
    pub exclude: Vec<String>,
}

impl AdapterConfig {
    /// Built-in settings for `name`, relative to `root`
    pub fn defaults(name: AdapterName, root: &Path) -> Self {
        let (library, command, min_version, requires, install_hint) = match name {
            AdapterName::Php => (
                "liquid/liquid",
                vec!["php", "adapters/php/adapter.php"],
                "8.1",
                vec!["adapters/php/vendor/autoload.php"],
                "cd adapters/php && composer install",
            ),
            AdapterName::Ruby => (
                "liquid",
                vec!["ruby", "adapters/ruby/adapter.rb"],
                "3.0",
                vec!["adapters/ruby/Gemfile.lock"],
                "cd adapters/ruby && bundle install",
            ),
        };

        Self {
            name,
            library: library.to_string(),
            command: command.into_iter().map(String::from).collect(),
            working_dir: root.to_path_buf(),
            env: BTreeMap::new(),
            runtime: Some(name.as_str().to_string()),
            version_args: vec!["--version".to_string()],
            min_version: Some(min_version.to_string()),
            requires: requires.into_iter().map(PathBuf::from).collect(),
            install_hint: Some(install_hint.to_string()),
            exclude: Vec::new(),
        }
    }

    /// Overlay a `[adapters.<name>]` table onto these settings
    fn apply(&mut self, section: &AdapterSection, root: &Path) {
        if let Some(library) = &section.library {
            self.library = library.clone();
        }
        if let Some(command) = &section.command {
            self.command = command.clone();
        }
        if let Some(dir) = &section.working_dir {
            self.working_dir = root.join(dir);
        }
        self.env.extend(section.env.clone());
        if let Some(runtime) = &section.runtime {
            // An empty runtime disables the version probe.
            self.runtime = (!runtime.is_empty()).then(|| runtime.clone());
        }
        if let Some(args) = &section.version_args {
            self.version_args = args.clone();
        }
        if let Some(min) = &section.min_version {
            self.min_version = (!min.is_empty()).then(|| min.clone());
        }
        if let Some(requires) = &section.requires {
            self.requires = requires.clone();
        }
        if let Some(hint) = &section.install_hint {
            self.install_hint = Some(hint.clone());
        }
        if let Some(exclude) = &section.exclude {
            self.exclude = exclude.clone();
        }
    }

    /// Whether `scenario` is on this adapter's exclusion list
    pub fn excludes(&self, scenario: &str) -> bool {
        self.exclude.iter().any(|e| e == scenario)
    }
}

/// Name to settings lookup for every known adapter
#[derive(Debug, Clone)]
pub struct AdapterRegistry {
    php: AdapterConfig,
    ruby: AdapterConfig,
}

impl AdapterRegistry {
    /// Built-in settings only
    pub fn with_defaults(root: &Path) -> Self {
        Self {
            php: AdapterConfig::defaults(AdapterName::Php, root),
            ruby: AdapterConfig::defaults(AdapterName::Ruby, root),
        }
    }

    /// Built-in settings overlaid with the configuration file
    pub fn from_config(config: &BenchConfig) -> Result<Self, BenchError> {
        let root = config.root();
        let mut registry = Self::with_defaults(root);
        for (name, section) in &config.adapters {
            let mut entry = registry.get(*name).clone();
            entry.apply(section, root);
            registry.insert(entry)?;
        }
        Ok(registry)
    }

    /// Replace the entry for `config.name`
    pub fn insert(&mut self, config: AdapterConfig) -> Result<(), BenchError> {
        if config.command.first().is_none_or(|program| program.is_empty()) {
            return Err(BenchError::Config(format!(
                "adapters.{}.command must name a program",
                config.name
            )));
        }
        match config.name {
            AdapterName::Php => self.php = config,
            AdapterName::Ruby => self.ruby = config,
        }
        Ok(())
    }

    /// Settings for `name`
    pub fn get(&self, name: AdapterName) -> &AdapterConfig {
        match name {
            AdapterName::Php => &self.php,
            AdapterName::Ruby => &self.ruby,
        }
    }

    /// Entries in execution order
    pub fn iter(&self) -> impl Iterator<Item = &AdapterConfig> {
        AdapterName::ALL.into_iter().map(|name| self.get(name))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_name_round_trip() {
        for name in AdapterName::ALL {
            assert_eq!(name.as_str().parse::<AdapterName>(), Ok(name));
            assert_eq!(name.lang().as_str(), name.as_str());
        }
        assert_eq!("RUBY".parse::<AdapterName>(), Ok(AdapterName::Ruby));
        assert!("python".parse::<AdapterName>().is_err());
    }

    #[test]
    fn test_defaults_cover_every_adapter() {
        let registry = AdapterRegistry::with_defaults(Path::new("/bench"));
        let names: Vec<_> = registry.iter().map(|c| c.name).collect();
        assert_eq!(names, AdapterName::ALL.to_vec());

        let ruby = registry.get(AdapterName::Ruby);
        assert_eq!(ruby.command[0], "ruby");
        assert_eq!(ruby.working_dir, PathBuf::from("/bench"));
        assert_eq!(ruby.version_args, vec!["--version".to_string()]);
    }

    #[test]
    fn test_config_overlay() {
        let config = BenchConfig::from_toml_str(
            r#"
            [adapters.php]
            command = ["sh", "fake.sh"]
            runtime = ""
            exclude = ["tags/raw"]

            [adapters.php.env]
            APP_ENV = "bench"
            "#,
            Path::new("/bench"),
        )
        .unwrap();

        let registry = AdapterRegistry::from_config(&config).unwrap();
        let php = registry.get(AdapterName::Php);
        assert_eq!(php.command, vec!["sh".to_string(), "fake.sh".to_string()]);
        assert!(php.runtime.is_none());
        assert!(php.excludes("tags/raw"));
        assert!(!php.excludes("tags/for"));
        assert_eq!(php.env.get("APP_ENV").map(String::as_str), Some("bench"));
        // Untouched fields keep their defaults.
        assert_eq!(php.library, "liquid/liquid");
        assert_eq!(registry.get(AdapterName::Ruby).command[0], "ruby");
    }

    #[test]
    fn test_empty_command_rejected() {
        let config = BenchConfig::from_toml_str(
            r#"
            [adapters.ruby]
            command = []
            "#,
            Path::new("/bench"),
        )
        .unwrap();

        let err = AdapterRegistry::from_config(&config).unwrap_err();
        assert_eq!(err.code(), "CONFIG_INVALID");
    }
}
