use std::{
    fs,
    path::{Path, PathBuf},
};

use serde::{Deserialize, Serialize};

use crate::{error::GuardError, policy::BlockList};

#[derive(Debug, Deserialize, Serialize, Default)]
pub struct ConfigFile {
    #[serde(default)]
    pub block: BlockConfig,
    #[serde(default)]
    pub monitor: MonitorConfig,
    #[serde(default)]
    pub paths: PathsConfig,
    #[serde(default)]
    pub privilege: PrivilegeConfig,
}

#[derive(Debug, Deserialize, Serialize, Default)]
pub struct BlockConfig {
    /// Domains to redirect to loopback
    #[serde(default)]
    pub domains: Vec<String>,
    /// App names to force-quit
    #[serde(default)]
    pub apps: Vec<String>,
    /// Include the built-in distraction list
    #[serde(default)]
    pub use_defaults: bool,
}

#[derive(Debug, Deserialize, Serialize, Default)]
pub struct MonitorConfig {
    pub interval_secs: Option<u64>,
}

#[derive(Debug, Deserialize, Serialize, Default)]
pub struct PathsConfig {
    pub hosts: Option<PathBuf>,
    pub helper: Option<PathBuf>,
    pub sudoers: Option<PathBuf>,
}

/// How hosts file updates obtain root
#[derive(Debug, Deserialize, Serialize, Default, Clone, Copy, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum PrivilegeMode {
    /// Bootstrapped helper through `sudo -n`, prompting only until installed
    #[default]
    Helper,
    /// Write the hosts file directly; the process must already be allowed to
    Direct,
}

#[derive(Debug, Deserialize, Serialize, Default)]
pub struct PrivilegeConfig {
    #[serde(default)]
    pub mode: PrivilegeMode,
    pub elevation_timeout_secs: Option<u64>,
}

impl ConfigFile {
    /// Load configuration file
    pub fn load(path: &Path) -> Result<Self, GuardError> {
        let content = fs::read_to_string(path)?;
        toml::from_str(&content).map_err(|source| GuardError::ConfigParse {
            path: PathBuf::from(path),
            source,
        })
    }

    /// Block list described by the `[block]` section
    pub fn to_block_list(&self) -> BlockList {
        let mut list = BlockList::from_entries(&self.block.domains, &self.block.apps);
        if self.block.use_defaults {
            list.merge(BlockList::defaults());
        }
        list
    }
}
