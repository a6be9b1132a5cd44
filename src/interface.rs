//! Linux network management provider
//!
//! Enumerates adapters and reads their state from sysfs, and performs
//! transitions with the `ip` command.

use crate::error::{ToggleError, ToggleResult};
use crate::provider::{AdapterRecord, AdapterState, NetworkProvider};
use crate::validation;
use async_trait::async_trait;
use std::path::{Path, PathBuf};
use tokio::fs;
use tokio::process::Command;
use tracing::debug;

/// `IFF_UP` from `<net/if.h>`
const IFF_UP: u32 = 0x1;

/// Provider backed by `/sys/class/net` and `ip link`
pub struct LinuxProvider {
    sysfs_root: PathBuf,
}

impl LinuxProvider {
    pub fn new() -> Self {
        Self::with_sysfs_root("/sys/class/net")
    }

    /// Read adapters from another directory laid out like `/sys/class/net`
    pub fn with_sysfs_root(root: impl Into<PathBuf>) -> Self {
        Self {
            sysfs_root: root.into(),
        }
    }

    fn adapter_path(&self, id: &str) -> PathBuf {
        self.sysfs_root.join(id)
    }

    /// Short description of the adapter kind for display
    async fn describe(&self, id: &str) -> String {
        let base = self.adapter_path(id);
        let kind = if fs::metadata(base.join("wireless")).await.is_ok()
            || fs::metadata(base.join("phy80211")).await.is_ok()
        {
            "wireless"
        } else if fs::metadata(base.join("bridge")).await.is_ok() {
            "bridge"
        } else if fs::metadata(base.join("device")).await.is_ok() {
            "ethernet"
        } else if id == "lo" {
            "loopback"
        } else {
            "virtual"
        };
        format!("{} ({})", id, kind)
    }

    async fn read_sysfs_string(&self, id: &str, file: &str) -> Option<String> {
        let path = self.adapter_path(id).join(file);
        fs::read_to_string(path).await.ok().map(|s| s.trim().to_string())
    }

    async fn read_flags(&self, id: &str) -> Option<u32> {
        let raw = self.read_sysfs_string(id, "flags").await?;
        u32::from_str_radix(raw.trim_start_matches("0x"), 16).ok()
    }

    async fn run_ip(&self, args: &[&str]) -> ToggleResult<()> {
        let cmd_str = format!("ip {}", args.join(" "));
        debug!("Running {}", cmd_str);
        let output = Command::new("ip")
            .args(args)
            .output()
            .await
            .map_err(|e| ToggleError::CommandFailed {
                cmd: cmd_str.clone(),
                code: None,
                stderr: e.to_string(),
            })?;

        if !output.status.success() {
            let stderr = String::from_utf8_lossy(&output.stderr).trim().to_string();
            return Err(ToggleError::CommandFailed {
                cmd: cmd_str,
                code: output.status.code(),
                stderr,
            });
        }

        Ok(())
    }

    async fn set_link(&self, id: &str, up: bool) -> ToggleResult<()> {
        validation::validate_interface_name(id)?;
        if !Path::new(&self.adapter_path(id)).exists() {
            return Err(ToggleError::AdapterNotFound(id.to_string()));
        }

        let state = if up { "up" } else { "down" };
        self.run_ip(&["link", "set", "dev", id, state])
            .await
            .map_err(|e| ToggleError::provider(id, e))
    }
}

impl Default for LinuxProvider {
    fn default() -> Self {
        Self::new()
    }
}

/// Map sysfs `flags` and `operstate` to an adapter state
///
/// Admin-down is Disabled. Admin-up with operstate "up" is Connected,
/// any other admin-up adapter is Enabled.
pub fn classify(flags: Option<u32>, operstate: Option<&str>) -> AdapterState {
    match flags {
        Some(flags) if flags & IFF_UP == 0 => AdapterState::Disabled,
        Some(_) => match operstate.map(|s| s.to_ascii_lowercase()) {
            Some(s) if s == "up" => AdapterState::Connected,
            _ => AdapterState::Enabled,
        },
        None => AdapterState::Unknown,
    }
}

#[async_trait]
impl NetworkProvider for LinuxProvider {
    async fn list_adapters(&self) -> ToggleResult<Vec<AdapterRecord>> {
        if !self.sysfs_root.exists() {
            return Err(ToggleError::NotSupported(format!(
                "{} not available",
                self.sysfs_root.display()
            )));
        }

        let mut entries = fs::read_dir(&self.sysfs_root).await?;
        let mut ids = Vec::new();

        while let Some(entry) = entries.next_entry().await? {
            if let Some(name) = entry.file_name().to_str() {
                if validation::validate_interface_name(name).is_ok() {
                    ids.push(name.to_string());
                } else {
                    debug!("Skipping adapter with unusable name {:?}", name);
                }
            }
        }

        ids.sort();

        let mut adapters = Vec::with_capacity(ids.len());
        for id in ids {
            let name = self.describe(&id).await;
            adapters.push(AdapterRecord { id, name });
        }
        Ok(adapters)
    }

    async fn get_state(&self, id: &str) -> ToggleResult<AdapterState> {
        validation::validate_interface_name(id)?;
        if !self.adapter_path(id).exists() {
            return Err(ToggleError::AdapterNotFound(id.to_string()));
        }

        // operstate: up, down, unknown, notpresent, lowerlayerdown, testing, dormant
        let flags = self.read_flags(id).await;
        let operstate = self.read_sysfs_string(id, "operstate").await;
        Ok(classify(flags, operstate.as_deref()))
    }

    async fn enable(&self, id: &str) -> ToggleResult<()> {
        self.set_link(id, true).await
    }

    async fn disable(&self, id: &str) -> ToggleResult<()> {
        self.set_link(id, false).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn fake_adapter(root: &Path, id: &str, flags: &str, operstate: &str, kind_dir: Option<&str>) {
        let dir = root.join(id);
        std::fs::create_dir_all(&dir).unwrap();
        std::fs::write(dir.join("flags"), format!("{}\n", flags)).unwrap();
        std::fs::write(dir.join("operstate"), format!("{}\n", operstate)).unwrap();
        if let Some(kind) = kind_dir {
            std::fs::create_dir_all(dir.join(kind)).unwrap();
        }
    }

    #[test]
    fn test_classify() {
        assert_eq!(classify(Some(0x1002), Some("down")), AdapterState::Disabled);
        assert_eq!(classify(Some(0x1003), Some("up")), AdapterState::Connected);
        assert_eq!(classify(Some(0x1003), Some("down")), AdapterState::Enabled);
        assert_eq!(classify(Some(0x1003), Some("lowerlayerdown")), AdapterState::Enabled);
        assert_eq!(classify(Some(0x1003), None), AdapterState::Enabled);
        assert_eq!(classify(None, Some("up")), AdapterState::Unknown);
    }

    #[tokio::test]
    async fn test_list_and_state_from_sysfs() {
        let root = TempDir::new().unwrap();
        fake_adapter(root.path(), "eth0", "0x1003", "up", Some("device"));
        fake_adapter(root.path(), "wlan0", "0x1002", "down", Some("wireless"));
        fake_adapter(root.path(), "lo", "0x9", "unknown", None);

        let provider = LinuxProvider::with_sysfs_root(root.path());
        let adapters = provider.list_adapters().await.unwrap();

        let ids: Vec<_> = adapters.iter().map(|a| a.id.as_str()).collect();
        assert_eq!(ids, vec!["eth0", "lo", "wlan0"]);
        assert_eq!(adapters[0].name, "eth0 (ethernet)");
        assert_eq!(adapters[1].name, "lo (loopback)");
        assert_eq!(adapters[2].name, "wlan0 (wireless)");

        assert_eq!(provider.get_state("eth0").await.unwrap(), AdapterState::Connected);
        assert_eq!(provider.get_state("wlan0").await.unwrap(), AdapterState::Disabled);
        assert_eq!(provider.get_state("lo").await.unwrap(), AdapterState::Enabled);
    }

    #[tokio::test]
    async fn test_missing_adapter_and_bad_names() {
        let root = TempDir::new().unwrap();
        let provider = LinuxProvider::with_sysfs_root(root.path());

        assert!(provider.list_adapters().await.unwrap().is_empty());
        assert!(matches!(
            provider.get_state("eth9").await,
            Err(ToggleError::AdapterNotFound(_))
        ));
        assert!(matches!(
            provider.disable("eth0; reboot").await,
            Err(ToggleError::Validation(_))
        ));
        assert!(matches!(
            provider.enable("eth9").await,
            Err(ToggleError::AdapterNotFound(_))
        ));
    }

    #[tokio::test]
    async fn test_missing_sysfs_root() {
        let provider = LinuxProvider::with_sysfs_root("/nonexistent/sys/class/net");
        assert!(matches!(
            provider.list_adapters().await,
            Err(ToggleError::NotSupported(_))
        ));
    }
}
