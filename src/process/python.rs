//! Python interpreter sandbox: one process per snippet, bounded in time.

use std::{io::Write, process::Stdio, time::Duration};

use futures::future::BoxFuture;
use tokio::{process::Command, time::timeout};
use tracing::debug;

use super::{CodeRunner, Outcome};

#[derive(Debug, Clone)]
pub struct PythonSandbox {
    python: String,
    timeout: Duration,
}

impl PythonSandbox {
    pub fn new(python: impl Into<String>, timeout: Duration) -> Self {
        Self {
            python: python.into(),
            timeout,
        }
    }

    async fn execute(&self, code: &str) -> Outcome {
        let mut script = match tempfile::Builder::new().prefix("figcap-").suffix(".py").tempfile() {
            Ok(f) => f,
            Err(e) => return Outcome::Spawn(format!("cannot create script file: {e}")),
        };
        if let Err(e) = script.write_all(code.as_bytes()).and_then(|_| script.flush()) {
            return Outcome::Spawn(format!("cannot write script file: {e}"));
        }

        let mut cmd = Command::new(&self.python);
        cmd.arg(script.path())
            .env("MPLBACKEND", "Agg")
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .kill_on_drop(true);

        // Dropping the output future on timeout kills the child.
        match timeout(self.timeout, cmd.output()).await {
            Err(_) => Outcome::TimedOut(self.timeout),
            Ok(Err(e)) => Outcome::Spawn(format!("failed to start {}: {}", self.python, e)),
            Ok(Ok(output)) if output.status.success() => Outcome::Runnable,
            Ok(Ok(output)) => {
                let stderr = String::from_utf8_lossy(&output.stderr);
                debug!("interpreter stderr:\n{}", stderr);
                Outcome::Raised(last_error_line(&stderr).unwrap_or_else(|| {
                    format!("exited with status {}", output.status.code().unwrap_or(-1))
                }))
            }
        }
    }
}

impl CodeRunner for PythonSandbox {
    fn run<'a>(&'a self, code: &'a str) -> BoxFuture<'a, Outcome> {
        Box::pin(self.execute(code))
    }
}

/// The final traceback line carries the exception type and message.
fn last_error_line(stderr: &str) -> Option<String> {
    stderr
        .lines()
        .rev()
        .map(str::trim)
        .find(|l| !l.is_empty())
        .map(str::to_string)
}

/// True when the interpreter can be started; used by tests to skip.
pub fn is_available(python: &str) -> bool {
    std::process::Command::new(python)
        .arg("--version")
        .stdout(Stdio::null())
        .stderr(Stdio::null())
        .status()
        .map(|s| s.success())
        .unwrap_or(false)
}
