// Subprocess command runner
// reason: tokio::process for async waits with a wall-clock timeout
use async_trait::async_trait;
use std::process::Stdio;
use std::time::{Duration, Instant};
use tokio::process::Command;
use tokio::time::timeout;
use tracing::{debug, warn};

use hostspec_core::port::{CommandOutput, CommandRunner, ExecutionError};

/// Variables passed through from the parent environment
pub const DEFAULT_ENV_ALLOWLIST: &[&str] = &["PATH", "HOME", "USER", "TERM"];

/// Runs host tools as child processes with a scrubbed environment
pub struct SubprocessRunner {
    timeout: Duration,
    env_allowlist: Vec<String>,
}

impl SubprocessRunner {
    /// # Example
    /// ```ignore
    /// let runner = SubprocessRunner::new(Duration::from_secs(10));
    /// let out = runner.run("rpm", &["-q", "bash"]).await?;
    /// ```
    pub fn new(timeout: Duration) -> Self {
        Self {
            timeout,
            env_allowlist: DEFAULT_ENV_ALLOWLIST.iter().map(|s| s.to_string()).collect(),
        }
    }

    pub fn with_env_allowlist(mut self, env_allowlist: Vec<String>) -> Self {
        self.env_allowlist = env_allowlist;
        self
    }

    fn filtered_env(&self) -> Vec<(String, String)> {
        self.env_allowlist
            .iter()
            .filter_map(|k| std::env::var(k).ok().map(|v| (k.clone(), v)))
            .collect()
    }
}

#[async_trait]
impl CommandRunner for SubprocessRunner {
    async fn run(&self, program: &str, args: &[&str]) -> Result<CommandOutput, ExecutionError> {
        let started = Instant::now();

        // Tool output is parsed, so the locale is pinned
        let child = Command::new(program)
            .args(args)
            .env_clear()
            .envs(self.filtered_env())
            .env("LC_ALL", "C")
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .kill_on_drop(true)
            .spawn()
            .map_err(|e| ExecutionError::SpawnFailed(format!("{}: {}", program, e)))?;

        let output = match timeout(self.timeout, child.wait_with_output()).await {
            Ok(Ok(output)) => output,
            Ok(Err(e)) => return Err(ExecutionError::IoError(e.to_string())),
            Err(_) => {
                let timeout_ms = self.timeout.as_millis() as u64;
                warn!(program = %program, args = ?args, timeout_ms = timeout_ms, "Command timed out");
                return Err(ExecutionError::Timeout(timeout_ms));
            }
        };

        let result = CommandOutput {
            exit_code: output.status.code(),
            stdout: String::from_utf8_lossy(&output.stdout).into_owned(),
            stderr: String::from_utf8_lossy(&output.stderr).into_owned(),
        };

        debug!(
            program = %program,
            args = ?args,
            exit_code = ?result.exit_code,
            duration_ms = started.elapsed().as_millis() as u64,
            "Command finished"
        );

        Ok(result)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_run_captures_output_and_exit() {
        let runner = SubprocessRunner::new(Duration::from_secs(5));

        let out = runner.run("sh", &["-c", "echo hello; echo oops >&2"]).await.unwrap();
        assert!(out.success());
        assert_eq!(out.stdout, "hello\n");
        assert_eq!(out.stderr, "oops\n");

        let out = runner.run("sh", &["-c", "exit 3"]).await.unwrap();
        assert_eq!(out.exit_code, Some(3));
        assert!(!out.success());
    }

    #[tokio::test]
    async fn test_run_timeout() {
        let runner = SubprocessRunner::new(Duration::from_millis(100));
        let result = runner.run("sleep", &["10"]).await;
        assert_eq!(result, Err(ExecutionError::Timeout(100)));
    }

    #[tokio::test]
    async fn test_spawn_failure() {
        let runner = SubprocessRunner::new(Duration::from_secs(1));
        let result = runner.run("/nonexistent/hostspec-tool", &[]).await;
        assert!(matches!(result, Err(ExecutionError::SpawnFailed(_))));
    }

    #[tokio::test]
    async fn test_environment_is_scrubbed() {
        std::env::set_var("HOSTSPEC_TEST_BLOCKED", "secret");
        let runner = SubprocessRunner::new(Duration::from_secs(5));

        let out = runner
            .run("sh", &["-c", "echo \"${HOSTSPEC_TEST_BLOCKED:-unset} $LC_ALL\""])
            .await
            .unwrap();
        assert_eq!(out.stdout, "unset C\n");
    }
}
