//! Adapter Supervisor
//!
//! Runs one adapter subprocess per benchmark:
//!
//! ```text
//! spawn ──► write request, close stdin ─┐
//!           drain stdout               ├─ joined ──► classify exit
//!           drain stderr               │
//!           wait for exit ─────────────┘
//!                    ▲
//!   deadline ────────┴── first to finish wins; on timeout the child is killed
//! ```
//!
//! The pipes are drained while waiting for exit: an adapter that fills its
//! stdout pipe would otherwise block forever while we block on `wait`.

use crate::adapters::AdapterConfig;
use crate::error::AdapterError;
use std::io;
use std::process::{ExitStatus, Stdio};
use std::sync::Arc;
use std::time::{Duration, Instant};
use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::process::{Child, ChildStderr, ChildStdin, ChildStdout, Command};
use tplbench_ipc::{AdapterInput, AdapterOutput, OutputValidator, decode_response, encode_request};
use tracing::{debug, warn};

/// Successful adapter invocation
#[derive(Debug, Clone)]
pub struct AdapterRun {
    /// Validated response
    pub output: AdapterOutput,
    /// Wall-clock time from spawn to exit (diagnostics only)
    pub execution_time_ms: f64,
}

/// Runs adapters under a deadline and validates their output
#[derive(Debug, Clone)]
pub struct AdapterRunner {
    validator: Arc<OutputValidator>,
}

impl AdapterRunner {
    /// Runner sharing `validator`
    pub fn new(validator: Arc<OutputValidator>) -> Self {
        Self { validator }
    }

    /// Execute `config` with `input`, killing it after `timeout`
    pub async fn run(
        &self,
        config: &AdapterConfig,
        input: &AdapterInput,
        timeout: Duration,
    ) -> Result<AdapterRun, AdapterError> {
        let name = config.name;
        let request = encode_request(input).map_err(|e| {
            AdapterError::spawn_failed(name, "failed to encode request", &io::Error::other(e))
        })?;

        let (program, args) = config.command.split_first().ok_or_else(|| {
            AdapterError::spawn_failed(
                name,
                "no command configured",
                &io::Error::from(io::ErrorKind::NotFound),
            )
        })?;

        let started = Instant::now();
        let mut child = Command::new(program)
            .args(args)
            .current_dir(&config.working_dir)
            .envs(&config.env)
            .stdin(Stdio::piped())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .kill_on_drop(true)
            .spawn()
            .map_err(|e| {
                AdapterError::spawn_failed(name, &format!("failed to spawn `{}`", program), &e)
            })?;
        debug!(adapter = %name, pid = ?child.id(), program = %program, "adapter spawned");

        let pipes = (child.stdin.take(), child.stdout.take(), child.stderr.take());
        let (Some(stdin), Some(stdout), Some(stderr)) = pipes else {
            return Err(AdapterError::spawn_failed(
                name,
                "failed to open adapter pipes",
                &io::Error::from(io::ErrorKind::BrokenPipe),
            ));
        };

        // The exchange borrows `child`; it is dropped at the end of this block
        // so the timeout path can kill the process.
        let outcome = {
            let exchange = exchange(&mut child, stdin, stdout, stderr, &request);
            tokio::select! {
                result = exchange => Some(result),
                _ = tokio::time::sleep(timeout) => None,
            }
        };

        let (status, stdout, stderr) = match outcome {
            Some(Ok(collected)) => collected,
            Some(Err(e)) => {
                return Err(AdapterError::spawn_failed(name, "adapter I/O failed", &e));
            }
            None => {
                warn!(
                    adapter = %name,
                    timeout_ms = timeout.as_millis() as u64,
                    "adapter timed out, killing"
                );
                if let Err(e) = child.kill().await {
                    warn!(adapter = %name, error = %e, "failed to kill adapter");
                }
                return Err(AdapterError::timeout(name, timeout));
            }
        };
        let execution_time_ms = started.elapsed().as_secs_f64() * 1000.0;
        debug!(adapter = %name, %status, execution_time_ms, "adapter exited");

        if !status.success() {
            return Err(AdapterError::crashed(name, status.code(), &stderr));
        }
        if !stderr.is_empty() {
            debug!(adapter = %name, stderr = %String::from_utf8_lossy(&stderr), "adapter stderr");
        }

        let raw = decode_response(&stdout).map_err(|e| AdapterError::malformed(name, e))?;
        let output = self
            .validator
            .validate(&raw)
            .map_err(|errors| AdapterError::invalid(name, errors.0))?;

        let expected = input.iterations() as usize;
        let reported = output.timings.iterations();
        if reported != Some(expected) {
            return Err(AdapterError::invalid(
                name,
                vec![format!(
                    "/timings: expected {} iterations, got {}",
                    expected,
                    output.timings.parse_ms.len()
                )],
            ));
        }

        Ok(AdapterRun {
            output,
            execution_time_ms,
        })
    }
}

/// Feed the request, drain both output pipes and wait for exit, concurrently
async fn exchange(
    child: &mut Child,
    mut stdin: ChildStdin,
    mut stdout: ChildStdout,
    mut stderr: ChildStderr,
    request: &[u8],
) -> io::Result<(ExitStatus, Vec<u8>, Vec<u8>)> {
    let feed = async move {
        // An adapter may exit without reading its input; its exit code decides.
        match stdin.write_all(request).await {
            Err(e) if e.kind() != io::ErrorKind::BrokenPipe => return Err(e),
            _ => {}
        }
        match stdin.shutdown().await {
            Err(e) if e.kind() != io::ErrorKind::BrokenPipe => Err(e),
            _ => Ok(()),
        }
    };
    let drain_stdout = async move {
        let mut buf = Vec::new();
        stdout.read_to_end(&mut buf).await.map(|_| buf)
    };
    let drain_stderr = async move {
        let mut buf = Vec::new();
        stderr.read_to_end(&mut buf).await.map(|_| buf)
    };

    let (fed, out, err, status) = tokio::join!(feed, drain_stdout, drain_stderr, child.wait());
    fed?;
    Ok((status?, out?, err?))
}
