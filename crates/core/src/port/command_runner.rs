// Command Runner Port
// Abstraction for running host tools (rpm, dpkg-query, service, sh)

use async_trait::async_trait;
use serde::Serialize;
use thiserror::Error;

/// Captured output of a finished command
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct CommandOutput {
    /// None when the process was terminated by a signal
    pub exit_code: Option<i32>,
    pub stdout: String,
    pub stderr: String,
}

impl CommandOutput {
    pub fn success(&self) -> bool {
        self.exit_code == Some(0)
    }
}

/// Execution errors
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ExecutionError {
    #[error("Spawn failed: {0}")]
    SpawnFailed(String),

    #[error("Process timeout after {0}ms")]
    Timeout(u64),

    #[error("IO error: {0}")]
    IoError(String),
}

/// Command Runner trait
///
/// A non-zero exit is NOT an error; callers inspect `exit_code`.
#[async_trait]
pub trait CommandRunner: Send + Sync {
    /// Run `program` with `args` and wait for it to finish
    ///
    /// # Errors
    /// - ExecutionError::SpawnFailed if the program cannot be started
    /// - ExecutionError::Timeout if it runs longer than the runner allows
    async fn run(&self, program: &str, args: &[&str]) -> Result<CommandOutput, ExecutionError>;
}

// ============================================================================
// Mock Implementations for Testing
// ============================================================================

pub mod mocks {
    use super::*;
    use std::collections::HashMap;
    use std::sync::Mutex;

    /// Runner answering from a script keyed by the joined command line
    ///
    /// Unscripted commands fail to spawn, like a missing binary would.
    #[derive(Default)]
    pub struct ScriptedCommandRunner {
        script: HashMap<String, CommandOutput>,
        calls: Mutex<Vec<String>>,
    }

    impl ScriptedCommandRunner {
        pub fn new() -> Self {
            Self::default()
        }

        pub fn on(mut self, command_line: &str, exit_code: i32, stdout: &str) -> Self {
            self.script.insert(
                command_line.to_string(),
                CommandOutput {
                    exit_code: Some(exit_code),
                    stdout: stdout.to_string(),
                    stderr: String::new(),
                },
            );
            self
        }

        pub fn calls(&self) -> Vec<String> {
            self.calls.lock().unwrap().clone()
        }
    }

    #[async_trait]
    impl CommandRunner for ScriptedCommandRunner {
        async fn run(&self, program: &str, args: &[&str]) -> Result<CommandOutput, ExecutionError> {
            let mut line = program.to_string();
            for arg in args {
                line.push(' ');
                line.push_str(arg);
            }
            self.calls.lock().unwrap().push(line.clone());

            self.script
                .get(&line)
                .cloned()
                .ok_or_else(|| ExecutionError::SpawnFailed(format!("unscripted command: {}", line)))
        }
    }
}
