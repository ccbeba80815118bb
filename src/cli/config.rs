//! Configuration discovery and loading
//!
//! Host-specific settings that are not worth a command line flag live in a
//! TOML file. Discovery hierarchy:
//! 1. Current directory: ./lxc-subnet-router.toml or ./.lxc-subnet-router/config.toml
//! 2. User config: ~/.lxc-subnet-router/config.toml
//! 3. System config: /etc/lxc-subnet-router/config.toml
//! 4. Built-in defaults

use crate::env;
use serde::{Deserialize, Serialize};
use std::env as std_env;
use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;
use tracing::{debug, info};

#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Failed to read config file {path:?}: {source}")]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Failed to parse config file {path:?}: {source}")]
    Parse {
        path: PathBuf,
        #[source]
        source: toml::de::Error,
    },

    #[error("Failed to write config file: {0}")]
    Write(#[from] std::io::Error),

    #[error("Failed to serialize config: {0}")]
    Serialize(#[from] toml::ser::Error),
}

/// Host-side knobs for the provisioning sequence
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RouterSettings {
    /// Directory with the `<id>.conf` LXC files
    #[serde(default = "default_lxc_config_dir")]
    pub lxc_config_dir: PathBuf,

    /// Bridge whose UDP offload settings are tuned
    #[serde(default = "default_bridge_interface")]
    pub bridge_interface: String,

    /// Where the bridge tuning hook is installed
    #[serde(default = "default_bridge_hook_path")]
    pub bridge_hook_path: PathBuf,

    #[serde(default = "default_install_url")]
    pub tailscale_install_url: String,

    /// Wait after starting the container
    #[serde(default = "default_boot_wait_secs")]
    pub boot_wait_secs: u64,

    /// Wait after starting tailscaled
    #[serde(default = "default_daemon_wait_secs")]
    pub daemon_wait_secs: u64,

    /// Upper bound for any single command
    #[serde(default = "default_command_timeout_secs")]
    pub command_timeout_secs: u64,
}

fn default_lxc_config_dir() -> PathBuf {
    PathBuf::from(env::host::LXC_CONFIG_DIR)
}

fn default_bridge_interface() -> String {
    env::host::BRIDGE_INTERFACE.to_string()
}

fn default_bridge_hook_path() -> PathBuf {
    PathBuf::from(env::host::BRIDGE_HOOK_PATH)
}

fn default_install_url() -> String {
    env::tailscale::INSTALL_URL.to_string()
}

fn default_boot_wait_secs() -> u64 {
    10
}

fn default_daemon_wait_secs() -> u64 {
    5
}

fn default_command_timeout_secs() -> u64 {
    600
}

impl Default for RouterSettings {
    fn default() -> Self {
        Self {
            lxc_config_dir: default_lxc_config_dir(),
            bridge_interface: default_bridge_interface(),
            bridge_hook_path: default_bridge_hook_path(),
            tailscale_install_url: default_install_url(),
            boot_wait_secs: default_boot_wait_secs(),
            daemon_wait_secs: default_daemon_wait_secs(),
            command_timeout_secs: default_command_timeout_secs(),
        }
    }
}

impl RouterSettings {
    pub fn boot_wait(&self) -> Duration {
        Duration::from_secs(self.boot_wait_secs)
    }

    pub fn daemon_wait(&self) -> Duration {
        Duration::from_secs(self.daemon_wait_secs)
    }

    pub fn command_timeout(&self) -> Duration {
        Duration::from_secs(self.command_timeout_secs)
    }

    /// Load from TOML file
    pub fn from_toml_file<P: AsRef<Path>>(path: P) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        let content = fs::read_to_string(path).map_err(|source| ConfigError::Read {
            path: path.to_path_buf(),
            source,
        })?;
        toml::from_str(&content).map_err(|source| ConfigError::Parse {
            path: path.to_path_buf(),
            source,
        })
    }

    /// Save to TOML file
    pub fn to_toml_file<P: AsRef<Path>>(&self, path: P) -> Result<(), ConfigError> {
        let content = toml::to_string_pretty(self)?;
        fs::write(path, content)?;
        Ok(())
    }
}

/// Configuration discovery system
pub struct ConfigDiscovery;

impl ConfigDiscovery {
    /// Discover and load settings using the hierarchy
    pub fn discover_settings() -> Result<RouterSettings, ConfigError> {
        if let Some(config_path) = Self::find_config_file() {
            info!("Loading configuration from: {:?}", config_path);
            return RouterSettings::from_toml_file(config_path);
        }

        info!("No configuration file found, using defaults");
        Ok(RouterSettings::default())
    }

    /// Find configuration file using discovery hierarchy
    pub fn find_config_file() -> Option<PathBuf> {
        Self::get_config_candidates()
            .into_iter()
            .inspect(|candidate| debug!("Checking for config file: {:?}", candidate))
            .find(|candidate| candidate.is_file())
    }

    /// Get list of configuration file candidates in priority order
    fn get_config_candidates() -> Vec<PathBuf> {
        let mut candidates = Vec::new();

        if let Ok(current_dir) = std_env::current_dir() {
            candidates.push(current_dir.join(env::LOCAL_CONFIG_FILE_NAME));
            candidates.push(env::local_config_file_path(&current_dir));
        }

        if let Some(home_dir) = std_env::var_os("HOME").map(PathBuf::from) {
            candidates.push(env::user_config_file_path(&home_dir));
        }

        candidates.push(PathBuf::from(env::SYSTEM_CONFIG_FILE));

        candidates
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_defaults() {
        let settings = RouterSettings::default();
        assert_eq!(settings.lxc_config_dir, PathBuf::from("/etc/pve/lxc"));
        assert_eq!(settings.bridge_interface, "vmbr0");
        assert_eq!(settings.boot_wait(), Duration::from_secs(10));
        assert_eq!(settings.daemon_wait(), Duration::from_secs(5));
    }

    #[test]
    fn test_partial_file_falls_back_to_defaults() {
        let settings: RouterSettings =
            toml::from_str("bridge_interface = \"vmbr1\"\nboot_wait_secs = 3\n").unwrap();

        assert_eq!(settings.bridge_interface, "vmbr1");
        assert_eq!(settings.boot_wait_secs, 3);
        assert_eq!(settings.tailscale_install_url, "https://tailscale.com/install.sh");
        assert_eq!(settings.command_timeout_secs, 600);
    }

    #[test]
    fn test_config_file_operations() {
        let temp_dir = TempDir::new().unwrap();
        let config_path = temp_dir.path().join("config.toml");

        let original = RouterSettings {
            bridge_interface: "vmbr2".to_string(),
            ..Default::default()
        };
        original.to_toml_file(&config_path).unwrap();

        let loaded = RouterSettings::from_toml_file(&config_path).unwrap();
        assert_eq!(original, loaded);
    }

    #[test]
    fn test_invalid_file_is_an_error() {
        let temp_dir = TempDir::new().unwrap();
        let config_path = temp_dir.path().join("config.toml");
        fs::write(&config_path, "boot_wait_secs = \"soon\"").unwrap();

        let err = RouterSettings::from_toml_file(&config_path).unwrap_err();
        assert!(matches!(err, ConfigError::Parse { .. }));
    }

    #[test]
    fn test_missing_file_is_an_error() {
        let err = RouterSettings::from_toml_file("/nonexistent/config.toml").unwrap_err();
        assert!(matches!(err, ConfigError::Read { .. }));
    }

    #[test]
    fn test_config_candidates() {
        let candidates = ConfigDiscovery::get_config_candidates();

        assert!(!candidates.is_empty());
        assert_eq!(
            candidates[0].file_name().unwrap(),
            "lxc-subnet-router.toml"
        );
        assert_eq!(
            candidates.last().unwrap(),
            &PathBuf::from("/etc/lxc-subnet-router/config.toml")
        );
    }
}
