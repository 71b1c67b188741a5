//! Integration tests for tplbench
//!
//! End-to-end runs against `sh` scripts standing in for the PHP and Ruby
//! adapters, driven through the same configuration file the CLI reads.

#![cfg(unix)]

use std::path::{Path, PathBuf};
use std::time::{Duration, Instant};
use tplbench::{
    AdapterName, BenchConfig, BenchOrchestrator, BenchError, Report, RunMode, RunOptions,
    SkipReason, SnapshotMode, format_error_json, format_human_output, generate_json_report,
};

/// Well-behaved adapter: reads the request, reports three iterations
const WELL_BEHAVED: &str = r#"cat > "$REQUEST_LOG"
printf '{"library":"liquid","version":"5.4.0","lang":"%s","runtime_version":"test","timings":{"parse_ms":[0.25,0.5,0.125],"render_ms":[1.0,0.75,1.5]},"rendered_output":"%s"}' "$ADAPTER_LANG" "${RENDERED:-Hello World}"
"#;

/// Never exits; records its pid first
const HANGING: &str = r#"echo $$ > "$PID_FILE"
exec sleep 60
"#;

/// Fails the way a template parse error would
const CRASHING: &str = r#"cat > /dev/null
echo 'Liquid::SyntaxError: parse error' >&2
exit 1
"#;

struct Workspace {
    dir: tempfile::TempDir,
}

impl Workspace {
    fn new() -> Self {
        let dir = tempfile::tempdir().unwrap();
        let root = dir.path();

        for (path, template) in [
            ("scenarios/basic/variable.liquid", "{{ name }}"),
            ("scenarios/filters/upcase.liquid", "{{ name | upcase }}"),
            ("scenarios/tags/raw.liquid", "{% raw %}{{ name }}{% endraw %}"),
        ] {
            let path = root.join(path);
            std::fs::create_dir_all(path.parent().unwrap()).unwrap();
            std::fs::write(path, template).unwrap();
        }
        std::fs::create_dir_all(root.join("data")).unwrap();
        std::fs::write(root.join("data/small.json"), r#"{"name": "World"}"#).unwrap();

        std::fs::create_dir_all(root.join("adapters")).unwrap();
        std::fs::write(root.join("adapters/good.sh"), WELL_BEHAVED).unwrap();
        std::fs::write(root.join("adapters/hang.sh"), HANGING).unwrap();
        std::fs::write(root.join("adapters/crash.sh"), CRASHING).unwrap();

        let ws = Self { dir };
        ws.configure("good.sh", "good.sh", "");
        ws
    }

    fn root(&self) -> &Path {
        self.dir.path()
    }

    fn path(&self, relative: &str) -> PathBuf {
        self.root().join(relative)
    }

    /// Write `tplbench.toml` with the given scripts; `php_extra` goes into `[adapters.php]`
    fn configure(&self, php_script: &str, ruby_script: &str, php_extra: &str) {
        let config = format!(
            r#"
[runner]
timeout = "10s"
iterations = 3
warmup = 1

[verification]
baseline = "ruby"

[adapters.ruby]
command = ["sh", "adapters/{ruby_script}"]
runtime = ""
requires = ["adapters/{ruby_script}"]
env = {{ ADAPTER_LANG = "ruby", REQUEST_LOG = "ruby-request.json", PID_FILE = "ruby.pid" }}

[adapters.php]
command = ["sh", "adapters/{php_script}"]
runtime = ""
requires = ["adapters/{php_script}"]
env = {{ ADAPTER_LANG = "php", REQUEST_LOG = "php-request.json", PID_FILE = "php.pid" }}
{php_extra}
"#
        );
        std::fs::write(self.path("tplbench.toml"), config).unwrap();
    }

    fn orchestrator(&self) -> (BenchConfig, BenchOrchestrator) {
        let config = BenchConfig::load(self.path("tplbench.toml")).unwrap();
        let orchestrator = BenchOrchestrator::from_config(&config).unwrap();
        (config, orchestrator)
    }

    fn options(&self, snapshots: SnapshotMode) -> RunOptions {
        let (config, _) = self.orchestrator();
        RunOptions {
            scale: config.runner.scale,
            iterations: config.runner.iterations,
            warmup: config.runner.warmup,
            timeout: config.timeout().unwrap(),
            snapshots,
            ..RunOptions::default()
        }
    }
}

fn verify_self() -> SnapshotMode {
    SnapshotMode::Verify {
        compare_against: None,
    }
}

async fn single(ws: &Workspace, adapter: AdapterName, options: &RunOptions) -> Report {
    let (_, orchestrator) = ws.orchestrator();
    orchestrator
        .run_single(adapter, "basic/variable", options)
        .await
        .unwrap()
}

#[tokio::test]
async fn test_well_behaved_adapter_end_to_end() {
    let ws = Workspace::new();
    let report = single(&ws, AdapterName::Ruby, &ws.options(SnapshotMode::Off)).await;

    // The adapter saw exactly the documented request.
    let request: serde_json::Value =
        serde_json::from_str(&std::fs::read_to_string(ws.path("ruby-request.json")).unwrap())
            .unwrap();
    assert_eq!(request["template"], "{{ name }}");
    assert_eq!(request["data"], serde_json::json!({"name": "World"}));
    assert_eq!(request["iterations"], 3);
    assert_eq!(request["warmup"], 1);

    let result = &report.results[0];
    assert!(result.success, "{:?}", result.error);
    let metrics = result.metrics.unwrap();
    for phase in [metrics.parse, metrics.render, metrics.total] {
        assert!(phase.min_ms >= 0.0);
        assert!(phase.min_ms <= phase.mean_ms && phase.mean_ms <= phase.max_ms);
        assert!(phase.min_ms <= phase.median_ms && phase.median_ms <= phase.max_ms);
    }
    assert_eq!(metrics.parse.min_ms, 0.125);
    assert_eq!(metrics.render.max_ms, 1.5);
    // total = parse + render per iteration: [1.25, 1.25, 1.625]
    assert_eq!(metrics.total.median_ms, 1.25);

    let library = result.library.as_ref().unwrap();
    assert_eq!(library.library, "liquid");
    assert_eq!(library.lang, "ruby");
    assert_eq!(report.meta.mode, RunMode::Single);
    assert_eq!(report.exit_code(), 0);

    let json: serde_json::Value =
        serde_json::from_str(&generate_json_report(&report).unwrap()).unwrap();
    assert_eq!(json["meta"]["mode"], "single");
    assert_eq!(json["results"][0]["metrics"]["parse"]["min_ms"], 0.125);
}

#[tokio::test]
async fn test_hanging_adapter_times_out_and_is_killed() {
    let ws = Workspace::new();
    ws.configure("good.sh", "hang.sh", "");
    let options = RunOptions {
        timeout: Duration::from_millis(500),
        ..ws.options(SnapshotMode::Off)
    };

    let started = Instant::now();
    let report = single(&ws, AdapterName::Ruby, &options).await;
    let elapsed = started.elapsed();

    let error = report.results[0].error.as_ref().unwrap();
    assert_eq!(error.code, "ADAPTER_TIMEOUT");
    assert_eq!(error.details.as_ref().unwrap()["timeout_ms"], 500);
    assert!(elapsed < Duration::from_millis(500) + Duration::from_secs(2), "{:?}", elapsed);
    assert_eq!(report.exit_code(), 1);

    #[cfg(target_os = "linux")]
    {
        let pid = std::fs::read_to_string(ws.path("ruby.pid")).unwrap();
        assert!(!Path::new(&format!("/proc/{}", pid.trim())).exists());
    }
}

#[tokio::test]
async fn test_crashing_adapter_reports_stderr() {
    let ws = Workspace::new();
    ws.configure("crash.sh", "good.sh", "");

    let report = single(&ws, AdapterName::Php, &ws.options(SnapshotMode::Off)).await;

    let result = &report.results[0];
    assert!(!result.success);
    assert!(result.metrics.is_none());
    let error = result.error.as_ref().unwrap();
    assert_eq!(error.code, "ADAPTER_CRASHED");
    let details = error.details.as_ref().unwrap();
    assert_eq!(details["exit_code"], 1);
    assert!(details["stderr"].as_str().unwrap().contains("parse error"));
    assert_eq!(report.summary.failed, 1);
    assert_eq!(report.exit_code(), 1);
}

#[tokio::test]
async fn test_tampered_snapshot_fails_verification() {
    let ws = Workspace::new();

    let update = single(&ws, AdapterName::Ruby, &ws.options(SnapshotMode::Update)).await;
    assert!(update.results[0].verification.is_none());
    let snapshot = ws.path("snapshots/basic/variable/small/ruby.snap");
    assert_eq!(std::fs::read_to_string(&snapshot).unwrap(), "Hello World");

    let clean = single(&ws, AdapterName::Ruby, &ws.options(verify_self())).await;
    assert!(clean.results[0].verification.as_ref().unwrap().is_pass());
    assert_eq!(clean.exit_code(), 0);

    std::fs::write(&snapshot, "Hello Mars").unwrap();
    let tampered = single(&ws, AdapterName::Ruby, &ws.options(verify_self())).await;

    let verification = tampered.results[0].verification.as_ref().unwrap();
    assert!(verification.is_fail());
    let diff = verification.diff().unwrap();
    assert!(diff.contains("Hello Mars"));
    assert!(diff.contains("Hello World"));
    assert_eq!(tampered.summary.verification.failed, 1);
    assert_eq!(tampered.exit_code(), 1);

    let human = format_human_output(&tampered);
    assert!(human.contains("Snapshot Differences"));
    assert!(human.contains("ruby/basic/variable (against ruby):"));
}

#[tokio::test]
async fn test_cross_adapter_verification_against_baseline() {
    let ws = Workspace::new();
    let (config, orchestrator) = ws.orchestrator();

    let update = RunOptions {
        adapters: vec![config.verification.baseline],
        ..ws.options(SnapshotMode::Update)
    };
    orchestrator.run_all(&update, false).await.unwrap();

    let against_baseline = RunOptions {
        adapters: vec![AdapterName::Php],
        ..ws.options(SnapshotMode::Verify {
            compare_against: Some(config.verification.baseline),
        })
    };
    let report = orchestrator.run_all(&against_baseline, false).await.unwrap();
    assert_eq!(report.summary.verification.passed, 3);
    assert!(
        report
            .results
            .iter()
            .all(|r| r.verification.as_ref().unwrap().compared_against.as_deref() == Some("ruby"))
    );

    // php renders differently now
    let config_text = std::fs::read_to_string(ws.path("tplbench.toml")).unwrap();
    std::fs::write(
        ws.path("tplbench.toml"),
        config_text.replace(
            "ADAPTER_LANG = \"php\",",
            "ADAPTER_LANG = \"php\", RENDERED = \"Hello, World\",",
        ),
    )
    .unwrap();
    let (_, orchestrator) = ws.orchestrator();
    let report = orchestrator.run_all(&against_baseline, false).await.unwrap();
    assert_eq!(report.summary.verification.failed, 3);
    assert_eq!(report.exit_code(), 1);
}

#[tokio::test]
async fn test_all_mode_exclusions_readiness_and_exit_code() {
    let ws = Workspace::new();
    ws.configure("good.sh", "good.sh", r#"exclude = ["tags/raw"]"#);
    let (_, orchestrator) = ws.orchestrator();

    let report = orchestrator
        .run_all(&ws.options(verify_self()), false)
        .await
        .unwrap();
    assert_eq!(report.meta.mode, RunMode::All);
    assert_eq!(report.summary.completed, 5);
    assert_eq!(report.summary.skipped, 1);
    assert_eq!(report.skipped[0].adapter, "php");
    assert_eq!(report.skipped[0].scenario, "tags/raw");
    assert_eq!(report.skipped[0].reason, SkipReason::Excluded);
    // No snapshots yet: everything is missing, which is not a failure.
    assert_eq!(report.summary.verification.missing, 5);
    assert_eq!(report.exit_code(), 0);

    // Remove the ruby adapter's declared requirement: it is skipped as a whole.
    std::fs::remove_file(ws.path("adapters/good.sh")).unwrap();
    std::fs::write(ws.path("adapters/other.sh"), WELL_BEHAVED).unwrap();
    ws.configure("other.sh", "good.sh", "");
    let (_, orchestrator) = ws.orchestrator();
    let report = orchestrator
        .run_all(&ws.options(SnapshotMode::Off), false)
        .await
        .unwrap();
    assert_eq!(report.summary.completed, 3);
    assert_eq!(report.summary.failed, 0);
    assert_eq!(report.summary.skipped, 3);
    assert!(report.skipped.iter().all(|s| s.adapter == "ruby"
        && matches!(&s.reason, SkipReason::EnvironmentNotReady { message } if message.contains("dependencies not installed"))));
    assert_eq!(report.exit_code(), 0);
}

#[tokio::test]
async fn test_all_mode_continues_after_adapter_failure() {
    let ws = Workspace::new();
    ws.configure("crash.sh", "good.sh", "");
    let (_, orchestrator) = ws.orchestrator();

    let report = orchestrator
        .run_all(&ws.options(SnapshotMode::Off), false)
        .await
        .unwrap();
    assert_eq!(report.summary.failed, 3);
    assert_eq!(report.summary.completed, 3);
    assert_eq!(report.summary.total_executed(), 6);
    // Benchmark errors are reported but only verification failures fail an all-mode run.
    assert_eq!(report.exit_code(), 0);
}

#[tokio::test]
async fn test_single_mode_fatal_errors() {
    let ws = Workspace::new();
    let (_, orchestrator) = ws.orchestrator();
    let options = ws.options(SnapshotMode::Off);

    let err = orchestrator
        .run_single(AdapterName::Ruby, "basic/missing", &options)
        .await
        .unwrap_err();
    assert!(matches!(err, BenchError::ScenarioNotFound(_)));

    let json: serde_json::Value =
        serde_json::from_str(&format_error_json(&err.to_payload()).unwrap()).unwrap();
    assert_eq!(json["success"], false);
    assert_eq!(json["error"]["code"], "SCENARIO_NOT_FOUND");
    assert_eq!(json["error"]["details"]["scenario"], "basic/missing");

    let medium = RunOptions {
        scale: tplbench::Scale::Medium,
        ..options
    };
    let err = orchestrator
        .run_single(AdapterName::Ruby, "basic/variable", &medium)
        .await
        .unwrap_err();
    assert_eq!(err.code(), "DATA_NOT_FOUND");
}
