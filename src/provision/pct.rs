//! Thin wrapper over the Proxmox `pct` CLI.

use super::ProvisionError;
use crate::env;
use crate::executor::{CommandExecutor, ExecutionCommand, ExecutionResult};
use crate::router::ContainerId;
use std::time::Duration;
use tracing::debug;

/// State reported by `pct status`
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ContainerStatus {
    Running,
    Stopped,
}

impl ContainerStatus {
    /// Parse `pct status` output such as `status: running`
    pub fn parse(output: &str) -> Option<Self> {
        let state = output.trim().strip_prefix("status:")?.trim();
        match state {
            "running" => Some(Self::Running),
            "stopped" => Some(Self::Stopped),
            _ => None,
        }
    }
}

/// `pct` commands against one container
pub struct Pct<'a, E: CommandExecutor + ?Sized> {
    executor: &'a E,
    container_id: &'a ContainerId,
    timeout: Duration,
}

impl<'a, E: CommandExecutor + ?Sized> Pct<'a, E> {
    pub fn new(executor: &'a E, container_id: &'a ContainerId, timeout: Duration) -> Self {
        Self {
            executor,
            container_id,
            timeout,
        }
    }

    fn command(&self, subcommand: &str, extra: &[String]) -> ExecutionCommand {
        let args = [subcommand.to_string(), self.container_id.to_string()]
            .into_iter()
            .chain(extra.iter().cloned())
            .collect();
        ExecutionCommand::new(env::host::PCT, args).with_timeout(self.timeout)
    }

    fn exec_command(&self, argv: &[&str]) -> ExecutionCommand {
        let extra: Vec<String> = std::iter::once("--")
            .chain(argv.iter().copied())
            .map(str::to_string)
            .collect();
        self.command("exec", &extra)
    }

    /// Current state, or `ContainerNotFound` when `pct` does not know the id
    pub async fn status(&self) -> Result<ContainerStatus, ProvisionError> {
        let result = self.executor.execute(self.command("status", &[])).await?;
        if !result.success() {
            debug!("pct status failed: {}", result.stderr.trim());
            return Err(ProvisionError::ContainerNotFound(self.container_id.to_string()));
        }
        ContainerStatus::parse(&result.stdout)
            .ok_or_else(|| ProvisionError::ContainerNotFound(self.container_id.to_string()))
    }

    pub async fn start(&self) -> Result<(), ProvisionError> {
        let result = self.executor.execute(self.command("start", &[])).await?;
        check("start container", result).map(|_| ())
    }

    pub async fn stop(&self) -> Result<(), ProvisionError> {
        let result = self.executor.execute(self.command("stop", &[])).await?;
        check("stop container", result).map(|_| ())
    }

    /// Run `argv` inside the container, failing on a non-zero exit
    pub async fn exec(
        &self,
        step: &'static str,
        argv: &[&str],
    ) -> Result<ExecutionResult, ProvisionError> {
        let result = self.executor.execute(self.exec_command(argv)).await?;
        check(step, result)
    }

    /// Like [`Pct::exec`], attached to the terminal
    pub async fn exec_interactive(
        &self,
        step: &'static str,
        argv: &[&str],
    ) -> Result<ExecutionResult, ProvisionError> {
        let result = self
            .executor
            .execute(self.exec_command(argv).interactive())
            .await?;
        check(step, result)
    }

    /// Write `content` to `path` inside the container
    pub async fn write_file(
        &self,
        step: &'static str,
        path: &str,
        content: &str,
    ) -> Result<(), ProvisionError> {
        let command = self.exec_command(&["tee", path]).with_stdin(content);
        let result = self.executor.execute(command).await?;
        check(step, result).map(|_| ())
    }
}

/// Turn a non-zero exit into `StepFailed`
pub fn check(step: &'static str, result: ExecutionResult) -> Result<ExecutionResult, ProvisionError> {
    if result.success() {
        Ok(result)
    } else {
        Err(ProvisionError::StepFailed {
            step,
            exit_code: result.exit_code,
            stderr: result.stderr.trim().to_string(),
        })
    }
}
