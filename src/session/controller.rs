use std::{
    sync::{Mutex, MutexGuard, PoisonError},
    time::Duration,
};

use super::state::{BlockerState, BlockerStatus};
use crate::{
    error::{BlockError, BootstrapError},
    hosts::HostsEditor,
    monitor::{DEFAULT_POLL_INTERVAL, ProcessMonitor},
    policy::BlockList,
    privilege::{BootstrapOutcome, Bootstrapper, PrivilegeFlag},
    recovery::{self, SweepOutcome},
};

/// Phrase a user must type to confirm an emergency unlock
pub const UNLOCK_PHRASE: &str = "UNLOCK";

/// Exact, case-sensitive comparison against [`UNLOCK_PHRASE`]
pub fn confirm_unlock(input: &str) -> bool {
    input == UNLOCK_PHRASE
}

/// What happened during [`BlockingController::startup`]
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct StartupReport {
    /// Bootstrap artifacts from an earlier run were found
    pub already_bootstrapped: bool,
    /// `None` when the sweep failed
    pub sweep: Option<SweepOutcome>,
    /// `None` when the bootstrap failed or was declined
    pub bootstrap: Option<BootstrapOutcome>,
    pub errors: Vec<String>,
}

/// Owns the blocking session: hosts region, process monitor and status
///
/// `start_blocking`, `stop_blocking` and `startup` are serialized; `status`
/// never waits for them.
pub struct BlockingController {
    editor: HostsEditor,
    bootstrapper: Bootstrapper,
    flag: PrivilegeFlag,
    poll_interval: Duration,
    transition: tokio::sync::Mutex<()>,
    state: Mutex<BlockerState>,
}

impl BlockingController {
    pub fn new(
        editor: HostsEditor,
        bootstrapper: Bootstrapper,
        monitor: ProcessMonitor,
        flag: PrivilegeFlag,
    ) -> Self {
        Self {
            editor,
            bootstrapper,
            flag,
            poll_interval: DEFAULT_POLL_INTERVAL,
            transition: tokio::sync::Mutex::new(()),
            state: Mutex::new(BlockerState::new(monitor)),
        }
    }

    pub fn with_poll_interval(mut self, interval: Duration) -> Self {
        self.poll_interval = interval;
        self
    }

    pub fn editor(&self) -> &HostsEditor {
        &self.editor
    }

    pub fn bootstrapper(&self) -> &Bootstrapper {
        &self.bootstrapper
    }

    fn lock_state(&self) -> MutexGuard<'_, BlockerState> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    fn record_error(&self, message: String) {
        self.lock_state().last_error = Some(message);
    }

    /// Detect an earlier bootstrap, sweep leftovers, then make sure the
    /// bootstrap is installed. Failures are logged and reported, never fatal.
    pub async fn startup(&self) -> StartupReport {
        let _transition = self.transition.lock().await;
        let mut report = StartupReport {
            already_bootstrapped: self.bootstrapper.detect(),
            ..Default::default()
        };

        match recovery::sweep(&self.editor).await {
            Ok(outcome) => report.sweep = Some(outcome),
            Err(err) => {
                log::error!("startup sweep failed: {err}");
                report.errors.push(err.to_string());
            }
        }

        match self.bootstrapper.ensure_bootstrapped().await {
            Ok(outcome) => report.bootstrap = Some(outcome),
            Err(err) => {
                log::warn!("privilege bootstrap failed, each change will prompt: {err}");
                report.errors.push(err.to_string());
            }
        }

        if let Some(last) = report.errors.last() {
            self.record_error(last.clone());
        }
        report
    }

    /// Install the privilege helper if missing
    pub async fn bootstrap(&self) -> Result<BootstrapOutcome, BootstrapError> {
        self.bootstrapper
            .ensure_bootstrapped()
            .await
            .inspect_err(|err| self.record_error(err.to_string()))
    }

    /// Block `domains` and `apps`, replacing any running session
    ///
    /// On failure the previous state is kept and the error is recorded in
    /// [`BlockerStatus::last_error`].
    pub async fn start_blocking(&self, domains: &[String], apps: &[String]) -> Result<(), BlockError> {
        self.start_list(BlockList::from_entries(domains, apps)).await
    }

    pub async fn start_list(&self, list: BlockList) -> Result<(), BlockError> {
        let _transition = self.transition.lock().await;

        let region_written = !self.lock_state().blocked_domains.is_empty();
        // An empty domain list still has to remove a region written earlier
        if (!list.domains.is_empty() || region_written)
            && let Err(err) = self.editor.apply(&list.domains).await
        {
            log::error!("failed to start blocking: {err}");
            self.record_error(err.to_string());
            return Err(BlockError::Apply(err));
        }

        let mut state = self.lock_state();
        state.monitor.start(list.apps.clone(), self.poll_interval);
        state.active = true;
        state.blocked_domains = list.domains;
        state.blocked_apps = list.apps;
        state.last_error = None;
        log::info!(
            "blocking started: {} domain(s), {} app(s)",
            state.blocked_domains.len(),
            state.blocked_apps.len()
        );
        Ok(())
    }

    /// End the session; a no-op when nothing is active
    ///
    /// State is always cleared. A failure to clean the hosts file is still
    /// returned so the caller can tell the user.
    pub async fn stop_blocking(&self) -> Result<(), BlockError> {
        let _transition = self.transition.lock().await;

        let had_domains = {
            let mut state = self.lock_state();
            if !state.active {
                return Ok(());
            }
            let had_domains = !state.blocked_domains.is_empty();
            state.deactivate();
            had_domains
        };

        if had_domains && let Err(err) = self.editor.clear().await {
            log::error!("blocking stopped but hosts cleanup failed: {err}");
            self.record_error(err.to_string());
            return Err(BlockError::Cleanup(err));
        }

        self.lock_state().last_error = None;
        log::info!("blocking stopped");
        Ok(())
    }

    /// User-confirmed stop; gate it with [`confirm_unlock`]
    pub async fn emergency_unlock(&self) -> Result<(), BlockError> {
        log::warn!("emergency unlock requested");
        self.stop_blocking().await
    }

    /// Quit hook: never leave the hosts file modified on a clean exit
    pub async fn cleanup(&self) -> Result<(), BlockError> {
        if !self.lock_state().active {
            return Ok(());
        }
        log::info!("stopping active block before exit");
        self.stop_blocking().await
    }

    pub fn status(&self) -> BlockerStatus {
        let state = self.lock_state();
        BlockerStatus {
            active: state.active,
            blocked_domains: state.blocked_domains.clone(),
            blocked_apps: state.blocked_apps.clone(),
            detected_apps: state.monitor.detected(),
            privilege_ready: self.flag.is_ready(),
            last_error: state.last_error.clone(),
        }
    }
}
