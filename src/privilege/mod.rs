pub mod bootstrap;
pub mod elevate;
pub mod helper;

use std::{
    path::PathBuf,
    sync::{
        Arc,
        atomic::{AtomicBool, Ordering},
    },
};

pub use bootstrap::{BootstrapOutcome, Bootstrapper};
pub use elevate::{Elevator, SystemElevator};

pub const DEFAULT_HELPER_PATH: &str = "/usr/local/bin/focusguard-hosts-helper";
pub const DEFAULT_SUDOERS_PATH: &str = "/etc/sudoers.d/focusguard";

/// Fixed locations of the bootstrap artifacts
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PrivilegePaths {
    /// Root-owned helper allowed to replace the hosts file
    pub helper: PathBuf,
    /// Sudoers fragment authorizing the current user to run `helper`
    pub sudoers: PathBuf,
}

impl Default for PrivilegePaths {
    fn default() -> Self {
        Self {
            helper: PathBuf::from(DEFAULT_HELPER_PATH),
            sudoers: PathBuf::from(DEFAULT_SUDOERS_PATH),
        }
    }
}

impl PrivilegePaths {
    pub fn is_installed(&self) -> bool {
        self.helper.exists() && self.sudoers.exists()
    }
}

/// Whether non-interactive elevation through the helper is available
///
/// Shared between the bootstrapper (writer), the hosts installer and the
/// session status (readers).
#[derive(Debug, Clone, Default)]
pub struct PrivilegeFlag(Arc<AtomicBool>);

impl PrivilegeFlag {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn is_ready(&self) -> bool {
        self.0.load(Ordering::SeqCst)
    }

    pub fn set_ready(&self, ready: bool) {
        self.0.store(ready, Ordering::SeqCst);
    }
}
