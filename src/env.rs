//! Environment constants and path utilities for the subnet router.
//!
//! This module centralizes all hardcoded paths and file names used throughout
//! the application, both on the Proxmox host and inside the container.

use std::path::{Path, PathBuf};

/// Application directory name (hidden directory like .git, .vscode)
pub const APP_DIR_NAME: &str = ".lxc-subnet-router";

/// Configuration file name inside the application directory
pub const CONFIG_FILE_NAME: &str = "config.toml";

/// Configuration file name when placed directly in the working directory
pub const LOCAL_CONFIG_FILE_NAME: &str = "lxc-subnet-router.toml";

/// System-wide configuration file
pub const SYSTEM_CONFIG_FILE: &str = "/etc/lxc-subnet-router/config.toml";

/// Container id used when `--container` is not given
pub const DEFAULT_CONTAINER_ID: &str = "100";

/// Proxmox host side paths and names
pub mod host {
    /// Directory holding `<vmid>.conf` files for LXC containers
    pub const LXC_CONFIG_DIR: &str = "/etc/pve/lxc";

    /// Default Linux bridge carrying container traffic
    pub const BRIDGE_INTERFACE: &str = "vmbr0";

    /// ifupdown hook re-applying the bridge offload settings
    pub const BRIDGE_HOOK_PATH: &str = "/etc/network/if-up.d/tailscale-gro";

    /// Container runtime CLI
    pub const PCT: &str = "pct";

    /// Suffix prepended to the timestamp of a config backup
    pub const BACKUP_SUFFIX: &str = "bak";
}

/// Paths and names inside the container
pub mod container {
    /// sysctl drop-in enabling forwarding
    pub const SYSCTL_CONF_PATH: &str = "/etc/sysctl.d/99-tailscale.conf";

    /// Boot-time route re-assertion script
    pub const STARTUP_SCRIPT_PATH: &str = "/usr/local/bin/tailscale-subnet-routes.sh";

    /// systemd unit name for the boot-time service
    pub const SERVICE_NAME: &str = "tailscale-subnet-routes.service";

    /// Directory systemd loads local units from
    pub const SYSTEMD_UNIT_DIR: &str = "/etc/systemd/system";

    /// Tailscale daemon unit
    pub const TAILSCALED_SERVICE: &str = "tailscaled";
}

/// Tailscale endpoints
pub mod tailscale {
    /// Official installer script
    pub const INSTALL_URL: &str = "https://tailscale.com/install.sh";

    /// Backend state reported once the node is authenticated and connected
    pub const RUNNING_STATE: &str = "Running";
}

/// Build the LXC config file path for a container
pub fn lxc_config_path(config_dir: &Path, container_id: &str) -> PathBuf {
    config_dir.join(format!("{}.conf", container_id))
}

/// Build the backup path for an LXC config file, tagged with a timestamp
pub fn lxc_config_backup_path(config_dir: &Path, container_id: &str, stamp: &str) -> PathBuf {
    config_dir.join(format!(
        "{}.conf.{}-{}",
        container_id,
        host::BACKUP_SUFFIX,
        stamp
    ))
}

/// Build the systemd unit path for the boot-time service
pub fn service_unit_path() -> PathBuf {
    Path::new(container::SYSTEMD_UNIT_DIR).join(container::SERVICE_NAME)
}

/// Build config directory path in user's home directory
pub fn user_config_dir_path(home_dir: &Path) -> PathBuf {
    home_dir.join(APP_DIR_NAME)
}

/// Build config file path in user's home directory
pub fn user_config_file_path(home_dir: &Path) -> PathBuf {
    user_config_dir_path(home_dir).join(CONFIG_FILE_NAME)
}

/// Build local config file path in current directory
pub fn local_config_file_path(current_dir: &Path) -> PathBuf {
    current_dir.join(APP_DIR_NAME).join(CONFIG_FILE_NAME)
}
