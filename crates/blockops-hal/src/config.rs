//! Facade configuration, loadable from TOML.

use crate::{DeviceError, DeviceResult};
use serde::Deserialize;
use std::fs;
use std::path::Path;
use std::time::Duration;

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct DeviceOpsConfig {
    /// Prefix for privileged commands, split on whitespace (`"sudo -n"`).
    /// Empty runs them directly.
    pub escalation: String,
    pub mkfs_program: String,
    pub mount_dir_mode: u32,
    /// Log destructive operations instead of running them.
    pub dry_run: bool,
    pub query_timeout_secs: u64,
    pub mount_timeout_secs: u64,
    pub format_timeout_secs: u64,
    /// Recursive chown walks whole filesystems.
    pub chown_timeout_secs: u64,
}

impl Default for DeviceOpsConfig {
    fn default() -> Self {
        Self {
            escalation: "sudo".to_string(),
            mkfs_program: "mkfs.ext4".to_string(),
            mount_dir_mode: 0o755,
            dry_run: false,
            query_timeout_secs: 10,
            mount_timeout_secs: 60,
            format_timeout_secs: 10 * 60,
            chown_timeout_secs: 6 * 60 * 60,
        }
    }
}

impl DeviceOpsConfig {
    pub fn from_toml_str(content: &str) -> DeviceResult<Self> {
        toml::from_str(content).map_err(|e| DeviceError::Config(e.to_string()))
    }

    pub fn load(path: &Path) -> DeviceResult<Self> {
        let content = fs::read_to_string(path).map_err(|e| {
            DeviceError::Config(format!("failed to read {}: {}", path.display(), e))
        })?;
        Self::from_toml_str(&content)
    }

    pub fn escalation(&self) -> Option<&str> {
        Some(self.escalation.as_str()).filter(|e| !e.trim().is_empty())
    }

    pub fn query_timeout(&self) -> Duration {
        Duration::from_secs(self.query_timeout_secs)
    }

    pub fn mount_timeout(&self) -> Duration {
        Duration::from_secs(self.mount_timeout_secs)
    }

    pub fn format_timeout(&self) -> Duration {
        Duration::from_secs(self.format_timeout_secs)
    }

    pub fn chown_timeout(&self) -> Duration {
        Duration::from_secs(self.chown_timeout_secs)
    }
}
