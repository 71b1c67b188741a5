//! Environment Readiness
//!
//! Before an adapter runs, its runtime must be installed, new enough, and its
//! dependencies present. Failing any check yields
//! [`BenchError::EnvironmentNotReady`]; the orchestrator then skips the adapter.

use crate::adapters::AdapterConfig;
use crate::error::BenchError;
use regex::Regex;
use std::process::Stdio;
use std::time::Duration;
use tokio::process::Command;
use tracing::debug;

/// Deadline for the runtime version probe
pub const VERSION_PROBE_TIMEOUT: Duration = Duration::from_secs(10);

/// Numeric `major.minor.patch` triple
type Version = (u64, u64, u64);

/// Probes adapter runtimes and dependencies
#[derive(Debug, Clone)]
pub struct RuntimeChecker {
    version_re: Regex,
    timeout: Duration,
}

impl RuntimeChecker {
    /// Checker with the default probe deadline
    pub fn new() -> Result<Self, regex::Error> {
        Ok(Self {
            version_re: Regex::new(r"(\d+)\.(\d+)(?:\.(\d+))?")?,
            timeout: VERSION_PROBE_TIMEOUT,
        })
    }

    /// Succeeds when `config` can be executed
    pub async fn ensure_ready(&self, config: &AdapterConfig) -> Result<(), BenchError> {
        let not_ready = |message: String, suggestion: Option<String>| {
            BenchError::EnvironmentNotReady {
                adapter: config.name,
                message,
                suggestion,
            }
        };

        if let Some(runtime) = &config.runtime {
            let output = self.probe(config, runtime).await.ok_or_else(|| {
                not_ready(
                    format!("runtime `{}` not found", runtime),
                    Some(format!("install {} and make sure it is on PATH", runtime)),
                )
            })?;

            if let Some(min) = &config.min_version {
                let required = self.parse_version(min).ok_or_else(|| {
                    BenchError::Config(format!(
                        "adapters.{}.min_version `{}` is not a version",
                        config.name, min
                    ))
                })?;
                let found = self.parse_version(&output).ok_or_else(|| {
                    not_ready(
                        format!("could not determine `{}` version", runtime),
                        None,
                    )
                })?;
                debug!(adapter = %config.name, runtime, ?found, ?required, "runtime version");
                if found < required {
                    return Err(not_ready(
                        format!(
                            "{} {}.{}.{} is older than required {}",
                            runtime, found.0, found.1, found.2, min
                        ),
                        Some(format!("upgrade {} to {} or newer", runtime, min)),
                    ));
                }
            }
        }

        for required in &config.requires {
            let path = config.working_dir.join(required);
            if !path.exists() {
                return Err(not_ready(
                    format!("dependencies not installed ({} is missing)", path.display()),
                    config.install_hint.clone(),
                ));
            }
        }

        Ok(())
    }

    /// Run `<runtime> <version_args>`; `None` on spawn failure, non-zero exit or timeout
    async fn probe(&self, config: &AdapterConfig, runtime: &str) -> Option<String> {
        let child = Command::new(runtime)
            .args(&config.version_args)
            .current_dir(&config.working_dir)
            .envs(&config.env)
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .kill_on_drop(true)
            .output();

        let output = match tokio::time::timeout(self.timeout, child).await {
            Ok(Ok(output)) => output,
            Ok(Err(e)) => {
                debug!(adapter = %config.name, runtime, error = %e, "runtime probe failed");
                return None;
            }
            Err(_) => {
                debug!(adapter = %config.name, runtime, "runtime probe timed out");
                return None;
            }
        };
        if !output.status.success() {
            return None;
        }

        // Some runtimes print their version on stderr.
        let mut text = String::from_utf8_lossy(&output.stdout).into_owned();
        text.push_str(&String::from_utf8_lossy(&output.stderr));
        Some(text)
    }

    /// First `N.N[.N]` in `text`
    fn parse_version(&self, text: &str) -> Option<Version> {
        let caps = self.version_re.captures(text)?;
        let part = |i: usize| {
            caps.get(i)
                .map_or(Some(0), |m| m.as_str().parse::<u64>().ok())
        };
        Some((part(1)?, part(2)?, part(3)?))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::adapters::AdapterName;
    use std::path::Path;

    fn config(dir: &Path) -> AdapterConfig {
        let mut config = AdapterConfig::defaults(AdapterName::Ruby, dir);
        config.runtime = None;
        config.min_version = None;
        config.requires = Vec::new();
        config
    }

    #[test]
    fn test_parse_version() {
        let checker = RuntimeChecker::new().unwrap();
        assert_eq!(
            checker.parse_version("ruby 3.2.2 (2023-03-30 revision e51014f9c0)"),
            Some((3, 2, 2))
        );
        assert_eq!(
            checker.parse_version("PHP 8.3.1 (cli) (built: Dec 21 2023)"),
            Some((8, 3, 1))
        );
        assert_eq!(checker.parse_version("8.1"), Some((8, 1, 0)));
        assert_eq!(checker.parse_version("no digits"), None);
    }

    #[tokio::test]
    async fn test_no_checks_is_ready() {
        let dir = tempfile::tempdir().unwrap();
        let checker = RuntimeChecker::new().unwrap();
        checker.ensure_ready(&config(dir.path())).await.unwrap();
    }

    #[tokio::test]
    async fn test_missing_runtime() {
        let dir = tempfile::tempdir().unwrap();
        let mut config = config(dir.path());
        config.runtime = Some("tplbench-no-such-runtime".to_string());

        let err = RuntimeChecker::new()
            .unwrap()
            .ensure_ready(&config)
            .await
            .unwrap_err();
        assert_eq!(err.code(), "ENVIRONMENT_NOT_READY");
        assert!(err.to_string().contains("not found"));
    }

    #[tokio::test]
    async fn test_missing_dependency_uses_install_hint() {
        let dir = tempfile::tempdir().unwrap();
        let mut config = config(dir.path());
        config.requires = vec!["vendor/autoload.php".into()];
        config.install_hint = Some("composer install".to_string());

        let checker = RuntimeChecker::new().unwrap();
        let err = checker.ensure_ready(&config).await.unwrap_err();
        assert_eq!(err.suggestion().as_deref(), Some("composer install"));

        std::fs::create_dir_all(dir.path().join("vendor")).unwrap();
        std::fs::write(dir.path().join("vendor/autoload.php"), "<?php").unwrap();
        checker.ensure_ready(&config).await.unwrap();
    }

    #[cfg(unix)]
    #[tokio::test]
    async fn test_version_gate() {
        let dir = tempfile::tempdir().unwrap();
        let mut config = config(dir.path());
        config.runtime = Some("sh".to_string());
        config.version_args = vec!["-c".to_string(), "echo fake 2.7.1".to_string()];
        config.min_version = Some("3.0".to_string());

        let checker = RuntimeChecker::new().unwrap();
        let err = checker.ensure_ready(&config).await.unwrap_err();
        assert!(err.to_string().contains("2.7.1 is older than required 3.0"));

        config.min_version = Some("2.7".to_string());
        checker.ensure_ready(&config).await.unwrap();
    }
}
