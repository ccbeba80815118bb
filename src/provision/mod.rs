//! # Container Provisioning
//!
//! Runs the fixed sequence that turns a Proxmox LXC container into a
//! Tailscale subnet router. Steps run strictly in order and the first failure
//! aborts the run. Nothing is rolled back; the LXC config backup is the only
//! recovery artifact.
//!
//! ```text
//! pct status ─► start if stopped ─► resolve target ─► install tailscale
//!     ─► ip forwarding ─► patch <id>.conf ─► tune bridge ─► restart
//!     ─► enable tailscaled ─► tailscale up ─► boot service ─► report
//! ```
//!
//! The privilege check lives in [`privileges::ensure_root`] and is called by
//! the binary before a [`Provisioner`] is created.

pub mod detect;
pub mod pct;
pub mod privileges;
pub mod templates;

pub use pct::{ContainerStatus, Pct};
pub use privileges::ensure_root;

use crate::cli::RouterSettings;
use crate::env;
use crate::executor::{CommandExecutor, ExecutionCommand, ExecutorError};
use crate::router::{Cidr, ContainerId, RouterConfig, ValidationError};
use chrono::Local;
use serde::Serialize;
use std::path::{Path, PathBuf};
use tracing::{debug, info, warn};

#[derive(Debug, thiserror::Error)]
pub enum ProvisionError {
    #[error("This tool must be run as root")]
    NotRoot,

    #[error("Container {0} does not exist")]
    ContainerNotFound(String),

    #[error("Required tool '{0}' was not found in PATH")]
    ToolUnavailable(String),

    #[error("Step '{step}' failed with exit code {exit_code}: {stderr}")]
    StepFailed {
        step: &'static str,
        exit_code: i32,
        stderr: String,
    },

    #[error(transparent)]
    Validation(#[from] ValidationError),

    #[error(transparent)]
    Executor(#[from] ExecutorError),

    #[error("Failed to access {path:?}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

impl ProvisionError {
    fn io(path: &Path) -> impl FnOnce(std::io::Error) -> Self + '_ {
        move |source| Self::Io {
            path: path.to_path_buf(),
            source,
        }
    }
}

/// Outcome of a successful run
#[derive(Debug, Clone, Serialize)]
pub struct ProvisionReport {
    pub container_id: ContainerId,
    pub advertised: Cidr,
    pub auto_detected: bool,
    /// Whether the container was already running before the run
    pub was_running: bool,
    /// Backup of the LXC config, taken before it was patched
    pub config_backup: Option<PathBuf>,
    /// `BackendState` reported by tailscale at the end, when readable
    pub backend_state: Option<String>,
}

/// Drives the provisioning sequence through a [`CommandExecutor`]
pub struct Provisioner<E: CommandExecutor> {
    executor: E,
    settings: RouterSettings,
}

impl<E: CommandExecutor> Provisioner<E> {
    pub fn new(executor: E, settings: RouterSettings) -> Self {
        Self { executor, settings }
    }

    pub fn executor(&self) -> &E {
        &self.executor
    }

    pub fn settings(&self) -> &RouterSettings {
        &self.settings
    }

    fn pct<'a>(&'a self, container_id: &'a ContainerId) -> Pct<'a, E> {
        Pct::new(&self.executor, container_id, self.settings.command_timeout())
    }

    /// Run every step for `config`
    pub async fn run(&self, config: &RouterConfig) -> Result<ProvisionReport, ProvisionError> {
        let container_id = config.container_id();
        let pct = self.pct(container_id);
        info!(
            "Provisioning container {} using the {} executor",
            container_id,
            self.executor.executor_type()
        );

        self.check_tools()?;

        let was_running = self.ensure_running(&pct).await?;
        let advertised = self.resolve_target(&pct, config).await?;
        info!("Subnet to advertise: {}", advertised);

        self.install_tailscale(&pct).await?;
        self.enable_forwarding(&pct).await?;
        let config_backup = self.patch_lxc_config(container_id).await?;
        self.tune_bridge().await?;
        self.restart(&pct).await?;
        self.enable_daemon(&pct).await?;
        self.advertise(&pct, &advertised).await?;
        self.install_boot_service(&pct, &advertised).await?;
        let backend_state = self.backend_state(&pct).await;

        info!("Container {} is configured as a subnet router", container_id);

        Ok(ProvisionReport {
            container_id: container_id.clone(),
            advertised,
            auto_detected: config.auto_detect(),
            was_running,
            config_backup,
            backend_state,
        })
    }

    fn check_tools(&self) -> Result<(), ProvisionError> {
        if !self.executor.is_available(env::host::PCT) {
            return Err(ProvisionError::ToolUnavailable(env::host::PCT.to_string()));
        }
        Ok(())
    }

    /// Start the container when stopped; returns whether it was already running
    async fn ensure_running(&self, pct: &Pct<'_, E>) -> Result<bool, ProvisionError> {
        match pct.status().await? {
            ContainerStatus::Running => {
                debug!("Container already running");
                Ok(true)
            }
            ContainerStatus::Stopped => {
                info!("Container is stopped, starting it");
                pct.start().await?;
                tokio::time::sleep(self.settings.boot_wait()).await;
                Ok(false)
            }
        }
    }

    async fn resolve_target(
        &self,
        pct: &Pct<'_, E>,
        config: &RouterConfig,
    ) -> Result<Cidr, ProvisionError> {
        if !config.auto_detect() {
            return Ok(config.resolve_target(None)?);
        }

        info!("No subnet given, detecting the container's address");
        let result = pct.exec("detect address", &detect::GLOBAL_IPV4_ARGV).await?;
        let detected = detect::first_global_ipv4(&result.stdout);
        debug!("Detected address: {:?}", detected);
        Ok(config.resolve_target(detected)?)
    }

    async fn install_tailscale(&self, pct: &Pct<'_, E>) -> Result<(), ProvisionError> {
        info!("Installing Tailscale");
        let script = templates::install_script(&self.settings.tailscale_install_url);
        pct.exec("install tailscale", &["sh", "-c", script.as_str()])
            .await?;
        Ok(())
    }

    async fn enable_forwarding(&self, pct: &Pct<'_, E>) -> Result<(), ProvisionError> {
        info!("Enabling IP forwarding");
        pct.write_file(
            "write sysctl config",
            env::container::SYSCTL_CONF_PATH,
            &templates::sysctl_conf(),
        )
        .await?;
        pct.exec(
            "apply sysctl config",
            &["sysctl", "-p", env::container::SYSCTL_CONF_PATH],
        )
        .await?;
        Ok(())
    }

    /// Back up `<id>.conf` and add the tun entries it lacks
    async fn patch_lxc_config(
        &self,
        container_id: &ContainerId,
    ) -> Result<Option<PathBuf>, ProvisionError> {
        let dir = &self.settings.lxc_config_dir;
        let path = env::lxc_config_path(dir, container_id.as_str());
        info!("Patching LXC config {:?}", path);

        let existing = tokio::fs::read_to_string(&path)
            .await
            .map_err(ProvisionError::io(&path))?;

        let Some(patched) = templates::patch_lxc_config(&existing) else {
            info!("LXC config already grants /dev/net/tun");
            return Ok(None);
        };

        let stamp = Local::now().format("%Y%m%dT%H%M%S").to_string();
        let backup = env::lxc_config_backup_path(dir, container_id.as_str(), &stamp);
        tokio::fs::write(&backup, &existing)
            .await
            .map_err(ProvisionError::io(&backup))?;
        info!("Backed up LXC config to {:?}", backup);

        tokio::fs::write(&path, patched)
            .await
            .map_err(ProvisionError::io(&path))?;
        Ok(Some(backup))
    }

    async fn tune_bridge(&self) -> Result<(), ProvisionError> {
        let bridge = &self.settings.bridge_interface;
        info!("Tuning UDP offload on bridge {}", bridge);

        let command = ExecutionCommand::new("ethtool", templates::bridge_tuning_args(bridge))
            .with_timeout(self.settings.command_timeout());
        let result = self.executor.execute(command).await?;
        pct::check("tune bridge", result)?;

        let hook = &self.settings.bridge_hook_path;
        let script = templates::bridge_hook_script(bridge);
        if tokio::fs::read_to_string(hook).await.ok().as_deref() == Some(script.as_str()) {
            debug!("Bridge hook {:?} is up to date", hook);
            return Ok(());
        }

        if let Some(parent) = hook.parent() {
            tokio::fs::create_dir_all(parent)
                .await
                .map_err(ProvisionError::io(parent))?;
        }
        tokio::fs::write(hook, script)
            .await
            .map_err(ProvisionError::io(hook))?;
        set_executable(hook).await?;
        info!("Installed bridge hook {:?}", hook);
        Ok(())
    }

    async fn restart(&self, pct: &Pct<'_, E>) -> Result<(), ProvisionError> {
        info!("Restarting container to apply the LXC config");
        pct.stop().await?;
        pct.start().await?;
        tokio::time::sleep(self.settings.boot_wait()).await;
        Ok(())
    }

    async fn enable_daemon(&self, pct: &Pct<'_, E>) -> Result<(), ProvisionError> {
        info!("Enabling tailscaled");
        pct.exec(
            "enable tailscaled",
            &["systemctl", "enable", "--now", env::container::TAILSCALED_SERVICE],
        )
        .await?;
        tokio::time::sleep(self.settings.daemon_wait()).await;
        Ok(())
    }

    async fn advertise(&self, pct: &Pct<'_, E>, cidr: &Cidr) -> Result<(), ProvisionError> {
        info!("Advertising {} (follow the login link if one is shown)", cidr);
        let args = templates::advertise_args(cidr);
        let argv: Vec<&str> = std::iter::once("tailscale")
            .chain(args.iter().map(String::as_str))
            .collect();
        pct.exec_interactive("advertise routes", &argv).await?;
        Ok(())
    }

    async fn install_boot_service(
        &self,
        pct: &Pct<'_, E>,
        cidr: &Cidr,
    ) -> Result<(), ProvisionError> {
        info!("Installing boot-time route service");
        let script_path = env::container::STARTUP_SCRIPT_PATH;
        let unit_path = env::service_unit_path();
        let unit_path = unit_path.to_string_lossy();

        pct.write_file(
            "write startup script",
            script_path,
            &templates::startup_script(cidr),
        )
        .await?;
        pct.exec("chmod startup script", &["chmod", "755", script_path])
            .await?;
        pct.write_file("write service unit", &unit_path, &templates::service_unit())
            .await?;
        pct.exec("reload systemd", &["systemctl", "daemon-reload"])
            .await?;
        pct.exec(
            "enable boot service",
            &["systemctl", "enable", env::container::SERVICE_NAME],
        )
        .await?;
        Ok(())
    }

    /// Best effort: a failure here does not fail the run
    async fn backend_state(&self, pct: &Pct<'_, E>) -> Option<String> {
        let state = match pct
            .exec("read tailscale status", &["tailscale", "status", "--json"])
            .await
        {
            Ok(result) => detect::backend_state(&result.stdout).ok(),
            Err(e) => {
                debug!("Could not read tailscale status: {}", e);
                None
            }
        };

        match state.as_deref() {
            Some(env::tailscale::RUNNING_STATE) => info!("Tailscale backend is running"),
            Some(other) => warn!(
                "Tailscale backend state is {}; approve the routes once the node is logged in",
                other
            ),
            None => warn!("Tailscale backend state is unknown"),
        }
        state
    }
}

#[cfg(unix)]
async fn set_executable(path: &Path) -> Result<(), ProvisionError> {
    use std::os::unix::fs::PermissionsExt;
    tokio::fs::set_permissions(path, std::fs::Permissions::from_mode(0o755))
        .await
        .map_err(ProvisionError::io(path))
}

#[cfg(not(unix))]
async fn set_executable(_path: &Path) -> Result<(), ProvisionError> {
    Ok(())
}
