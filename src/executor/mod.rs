//! # Command Execution
//!
//! Every external tool the provisioner touches (`pct`, `ethtool`, and through
//! `pct exec` also `tailscale`, `systemctl` and `sysctl`) runs through the
//! [`CommandExecutor`] trait.
//!
//! - **[`ExecutionCommand`]**: program, arguments, optional stdin and timeout
//! - **[`ExecutionResult`]**: stdout, stderr, exit code and duration
//! - **[`HostExecutor`]**: spawns real processes with `tokio::process::Command`
//!
//! ```rust,no_run
//! use lxc_subnet_router::executor::{CommandExecutor, ExecutionCommand, HostExecutor};
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let executor = HostExecutor::new();
//!     let result = executor
//!         .execute(ExecutionCommand::new("pct", vec!["status".into(), "100".into()]))
//!         .await?;
//!     println!("{}", result.stdout);
//!     Ok(())
//! }
//! ```

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::time::Duration;

/// Host-based command execution.
pub mod host;

pub use host::HostExecutor;

/// Result of command execution
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ExecutionResult {
    /// Standard output from the command
    pub stdout: String,
    /// Standard error from the command
    pub stderr: String,
    /// Exit code (0 = success, non-zero = failure)
    pub exit_code: i32,
    /// Duration of command execution
    pub duration: Duration,
}

impl ExecutionResult {
    /// Check if the command executed successfully (exit code 0)
    pub fn success(&self) -> bool {
        self.exit_code == 0
    }
}

/// Command to execute
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ExecutionCommand {
    /// Program name or path to execute
    pub program: String,
    /// Command line arguments
    pub args: Vec<String>,
    /// Standard input to provide to the command
    pub stdin: Option<String>,
    /// Maximum execution time (None = no timeout)
    pub timeout: Option<Duration>,
    /// Attach the command to the terminal instead of capturing its output
    pub interactive: bool,
}

impl ExecutionCommand {
    /// Create a new command with just program and args
    pub fn new(program: impl Into<String>, args: Vec<String>) -> Self {
        Self {
            program: program.into(),
            args,
            stdin: None,
            timeout: None,
            interactive: false,
        }
    }

    /// Set standard input
    pub fn with_stdin(mut self, stdin: impl Into<String>) -> Self {
        self.stdin = Some(stdin.into());
        self
    }

    /// Set execution timeout
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = Some(timeout);
        self
    }

    /// Inherit the terminal's stdio so prompts and login URLs reach the user
    pub fn interactive(mut self) -> Self {
        self.interactive = true;
        self
    }

    /// Program and arguments joined for log output
    pub fn command_line(&self) -> String {
        std::iter::once(self.program.as_str())
            .chain(self.args.iter().map(String::as_str))
            .collect::<Vec<_>>()
            .join(" ")
    }
}

/// Errors during command execution
#[derive(Debug, thiserror::Error)]
pub enum ExecutorError {
    /// Command could not be started
    #[error("Execution failed: {0}")]
    ExecutionFailed(String),

    /// Command execution timed out
    #[error("Timeout after {0:?}")]
    Timeout(Duration),

    /// I/O error
    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),
}

/// Runs commands somewhere
#[async_trait]
pub trait CommandExecutor: Send + Sync {
    /// Execute a command and return the result
    ///
    /// # Errors
    ///
    /// Returns an error if the command cannot be spawned or times out. A
    /// non-zero exit status is not an error at this level.
    async fn execute(&self, command: ExecutionCommand) -> Result<ExecutionResult, ExecutorError>;

    /// Check whether `program` can be run at all
    fn is_available(&self, program: &str) -> bool;

    /// Executor type name for logging
    fn executor_type(&self) -> &'static str;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_command_builder() {
        let cmd = ExecutionCommand::new("pct", vec!["status".to_string(), "100".to_string()])
            .with_stdin("data")
            .with_timeout(Duration::from_secs(5));

        assert_eq!(cmd.command_line(), "pct status 100");
        assert_eq!(cmd.stdin.as_deref(), Some("data"));
        assert_eq!(cmd.timeout, Some(Duration::from_secs(5)));
        assert!(!cmd.interactive);
        assert!(cmd.interactive().interactive);
    }

    #[test]
    fn test_result_success() {
        let result = ExecutionResult {
            stdout: String::new(),
            stderr: String::new(),
            exit_code: 2,
            duration: Duration::ZERO,
        };
        assert!(!result.success());
    }
}
