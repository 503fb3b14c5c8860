use std::{path::PathBuf, time::Duration};

use crate::{
    error::GuardError,
    hosts::DEFAULT_HOSTS_PATH,
    monitor::DEFAULT_POLL_INTERVAL,
    policy::BlockList,
    privilege::{PrivilegePaths, elevate::DEFAULT_ELEVATION_TIMEOUT},
};

use super::{
    args::{Args, Command},
    config::{ConfigFile, PrivilegeMode},
};

/// Everything the binary needs, after merging config file and flags
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Settings {
    pub block: BlockList,
    /// Session length for `block`; `None` runs until interrupted
    pub duration: Option<Duration>,
    pub poll_interval: Duration,
    pub hosts_path: PathBuf,
    pub privilege_paths: PrivilegePaths,
    pub mode: PrivilegeMode,
    pub elevation_timeout: Duration,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            block: BlockList::new(),
            duration: None,
            poll_interval: DEFAULT_POLL_INTERVAL,
            hosts_path: PathBuf::from(DEFAULT_HOSTS_PATH),
            privilege_paths: PrivilegePaths::default(),
            mode: PrivilegeMode::default(),
            elevation_timeout: DEFAULT_ELEVATION_TIMEOUT,
        }
    }
}

/// Load and merge settings from command line arguments and config file
pub struct SettingsLoader;

impl SettingsLoader {
    pub fn load(args: &Args) -> Result<Settings, GuardError> {
        let config = match args.config.as_ref() {
            Some(path) => ConfigFile::load(path)?,
            None => ConfigFile::default(),
        };
        Ok(Self::merge(config, &args.command))
    }

    fn merge(config: ConfigFile, command: &Command) -> Settings {
        let defaults = Settings::default();
        let mut settings = Settings {
            block: config.to_block_list(),
            poll_interval: config
                .monitor
                .interval_secs
                .filter(|secs| *secs > 0)
                .map(Duration::from_secs)
                .unwrap_or(defaults.poll_interval),
            hosts_path: config.paths.hosts.unwrap_or(defaults.hosts_path),
            privilege_paths: PrivilegePaths {
                helper: config
                    .paths
                    .helper
                    .unwrap_or(defaults.privilege_paths.helper),
                sudoers: config
                    .paths
                    .sudoers
                    .unwrap_or(defaults.privilege_paths.sudoers),
            },
            mode: config.privilege.mode,
            elevation_timeout: config
                .privilege
                .elevation_timeout_secs
                .map(Duration::from_secs)
                .unwrap_or(defaults.elevation_timeout),
            duration: None,
        };

        // Flags add to the configured lists
        if let Command::Block(block) = command {
            settings
                .block
                .merge(BlockList::from_entries(&block.domains, &block.apps));
            if block.defaults {
                settings.block.merge(BlockList::defaults());
            }
            settings.duration = block
                .minutes
                .map(|m| Duration::from_secs(m.saturating_mul(60)));
        }

        settings
    }
}
