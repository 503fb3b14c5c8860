use serde::Serialize;

use crate::monitor::ProcessMonitor;

/// Live session state owned by the controller
pub(crate) struct BlockerState {
    pub active: bool,
    pub blocked_domains: Vec<String>,
    pub blocked_apps: Vec<String>,
    pub monitor: ProcessMonitor,
    pub last_error: Option<String>,
}

impl BlockerState {
    pub fn new(monitor: ProcessMonitor) -> Self {
        Self {
            active: false,
            blocked_domains: Vec::new(),
            blocked_apps: Vec::new(),
            monitor,
            last_error: None,
        }
    }

    /// Back to inactive; `last_error` is kept
    pub fn deactivate(&mut self) {
        self.monitor.stop();
        self.active = false;
        self.blocked_domains.clear();
        self.blocked_apps.clear();
    }
}

/// Snapshot of the blocker returned to callers
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct BlockerStatus {
    pub active: bool,
    pub blocked_domains: Vec<String>,
    pub blocked_apps: Vec<String>,
    /// Blocked apps found running during the latest monitor check
    pub detected_apps: Vec<String>,
    /// Whether hosts updates run without an authorization prompt
    pub privilege_ready: bool,
    pub last_error: Option<String>,
}
