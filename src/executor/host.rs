//! Native host command execution.
//!
//! Executes commands directly on the Proxmox host using `tokio::process::Command`.

use super::{CommandExecutor, ExecutionCommand, ExecutionResult, ExecutorError};
use async_trait::async_trait;
use std::process::Stdio;
use std::time::Instant;
use tokio::io::AsyncWriteExt;
use tokio::process::Command;
use tracing::debug;

/// Executes commands directly on the host system
#[derive(Debug, Clone)]
pub struct HostExecutor;

impl HostExecutor {
    /// Create a new host executor
    pub fn new() -> Self {
        Self
    }
}

impl Default for HostExecutor {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl CommandExecutor for HostExecutor {
    async fn execute(&self, cmd: ExecutionCommand) -> Result<ExecutionResult, ExecutorError> {
        debug!("Executing command on host: {}", cmd.command_line());

        let start = Instant::now();

        let mut command = Command::new(&cmd.program);
        command.args(&cmd.args).kill_on_drop(true);

        if cmd.stdin.is_some() {
            command.stdin(Stdio::piped());
        } else if !cmd.interactive {
            command.stdin(Stdio::null());
        }

        if cmd.interactive {
            command.stdout(Stdio::inherit()).stderr(Stdio::inherit());
        } else {
            command.stdout(Stdio::piped()).stderr(Stdio::piped());
        }

        let mut child = command
            .spawn()
            .map_err(|e| ExecutorError::ExecutionFailed(format!("{}: {}", cmd.program, e)))?;

        // Feed stdin while the output is drained, so a child that echoes its
        // input cannot fill the stdout pipe and stall
        let writer = match (cmd.stdin.clone(), child.stdin.take()) {
            (Some(input), Some(mut stdin)) => Some(tokio::spawn(async move {
                stdin.write_all(input.as_bytes()).await
                // dropping closes the pipe so the child sees EOF
            })),
            _ => None,
        };

        // Execute command with optional timeout
        let output = if let Some(timeout) = cmd.timeout {
            match tokio::time::timeout(timeout, child.wait_with_output()).await {
                Ok(result) => result?,
                Err(_) => {
                    return Err(ExecutorError::Timeout(timeout));
                }
            }
        } else {
            child.wait_with_output().await?
        };

        if let Some(writer) = writer {
            match writer
                .await
                .map_err(|e| ExecutorError::ExecutionFailed(format!("{}: {}", cmd.program, e)))?
            {
                // the child exited without reading all of its input
                Err(e) if e.kind() == std::io::ErrorKind::BrokenPipe => {}
                other => other?,
            }
        }

        let duration = start.elapsed();

        Ok(ExecutionResult {
            stdout: String::from_utf8_lossy(&output.stdout).to_string(),
            stderr: String::from_utf8_lossy(&output.stderr).to_string(),
            exit_code: output.status.code().unwrap_or(-1),
            duration,
        })
    }

    fn is_available(&self, program: &str) -> bool {
        which::which(program).is_ok()
    }

    fn executor_type(&self) -> &'static str {
        "host"
    }
}
