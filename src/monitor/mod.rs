pub mod matcher;
pub mod notify;
mod sync;

use std::{
    sync::{Arc, Mutex, PoisonError},
    time::Duration,
};

use tokio::task::JoinHandle;

use crate::platform::Platform;

pub use notify::{DesktopNotifier, LogNotifier, Notification, Notifier, Urgency};
use sync::ShutdownSignal;

pub const DEFAULT_POLL_INTERVAL: Duration = Duration::from_secs(10);

struct RunningTask {
    signal: Arc<ShutdownSignal>,
    handle: JoinHandle<()>,
}

/// Periodically force-quits processes matching the configured app names
///
/// At most one polling task is alive per monitor. The first check runs as
/// soon as the task starts.
pub struct ProcessMonitor {
    platform: Arc<dyn Platform>,
    notifier: Arc<dyn Notifier>,
    detected: Arc<Mutex<Vec<String>>>,
    task: Option<RunningTask>,
}

impl ProcessMonitor {
    pub fn new(platform: Arc<dyn Platform>, notifier: Arc<dyn Notifier>) -> Self {
        Self {
            platform,
            notifier,
            detected: Arc::new(Mutex::new(Vec::new())),
            task: None,
        }
    }

    /// Start polling for `apps`, replacing any running task
    ///
    /// An empty `apps` list leaves the monitor stopped.
    pub fn start(&mut self, apps: Vec<String>, interval: Duration) {
        self.stop();
        if apps.is_empty() {
            return;
        }

        let signal = ShutdownSignal::new();
        let handle = spawn_monitor(
            apps,
            interval,
            Arc::clone(&self.platform),
            Arc::clone(&self.notifier),
            Arc::clone(&self.detected),
            Arc::clone(&signal),
        );
        self.task = Some(RunningTask { signal, handle });
    }

    /// Stop polling and forget detections
    ///
    /// Once this returns no in-flight check can publish detections.
    pub fn stop(&mut self) {
        if let Some(task) = self.task.take() {
            task.signal.shutdown();
            task.handle.abort();
            log::debug!("process monitor stopped");
        }
        self.detected
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clear();
    }

    pub fn is_running(&self) -> bool {
        self.task.is_some()
    }

    /// App names found running during the most recent check
    ///
    /// Empty when that check could not list processes.
    pub fn detected(&self) -> Vec<String> {
        self.detected
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }
}

impl Drop for ProcessMonitor {
    fn drop(&mut self) {
        self.stop();
    }
}

fn spawn_monitor(
    apps: Vec<String>,
    interval: Duration,
    platform: Arc<dyn Platform>,
    notifier: Arc<dyn Notifier>,
    detected: Arc<Mutex<Vec<String>>>,
    signal: Arc<ShutdownSignal>,
) -> JoinHandle<()> {
    log::info!(
        "monitoring {} app(s) every {}s",
        apps.len(),
        interval.as_secs()
    );
    tokio::spawn(async move {
        loop {
            if signal.is_shutdown() {
                return;
            }
            run_tick(&*platform, &*notifier, &apps, &detected, &signal).await;

            if signal.wait_timeout_or_shutdown(interval).await {
                return;
            }
        }
    })
}

/// One detection pass: snapshot, match, kill, publish, notify
async fn run_tick(
    platform: &dyn Platform,
    notifier: &dyn Notifier,
    apps: &[String],
    detected: &Mutex<Vec<String>>,
    signal: &ShutdownSignal,
) {
    // A failed listing publishes an empty detection set
    let found = match platform.list_processes().await {
        Ok(processes) => matcher::find_matches(apps, &processes, std::process::id()),
        Err(err) => {
            log::warn!("failed to list processes: {err}");
            matcher::Matches::default()
        }
    };
    for pid in &found.pids {
        match platform.terminate(*pid) {
            Ok(()) => log::info!("force-quit pid {pid}"),
            // Usually the process exited between snapshot and kill
            Err(err) => log::debug!("failed to terminate pid {pid}: {err}"),
        }
    }

    {
        let mut current = detected.lock().unwrap_or_else(PoisonError::into_inner);
        if signal.is_shutdown() {
            return;
        }
        *current = found.apps.clone();
    }

    if !found.apps.is_empty() {
        notifier
            .notify(&Notification::apps_blocked(&found.apps))
            .await;
    }
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;
    use crate::{error::PlatformError, platform::ProcessInfo};
    use async_trait::async_trait;
    use super::notify::MockNotifier;

    /// Process table where terminate actually removes the process
    #[derive(Default)]
    pub(crate) struct FakeProcesses {
        pub processes: Mutex<Vec<ProcessInfo>>,
        pub killed: Mutex<Vec<u32>>,
        pub list_calls: Mutex<usize>,
        /// Processes survive terminate, so every tick detects them again
        pub survive_kill: bool,
    }

    impl FakeProcesses {
        pub fn with(processes: &[(u32, &str)]) -> Self {
            let fake = Self::default();
            *fake.processes.lock().unwrap() = processes
                .iter()
                .map(|(pid, command)| ProcessInfo {
                    pid: *pid,
                    command: command.to_string(),
                })
                .collect();
            fake
        }

        pub fn surviving(processes: &[(u32, &str)]) -> Self {
            Self {
                survive_kill: true,
                ..Self::with(processes)
            }
        }
    }

    #[async_trait]
    impl Platform for FakeProcesses {
        async fn list_processes(&self) -> Result<Vec<ProcessInfo>, PlatformError> {
            *self.list_calls.lock().unwrap() += 1;
            Ok(self.processes.lock().unwrap().clone())
        }

        fn terminate(&self, pid: u32) -> Result<(), PlatformError> {
            if !self.survive_kill {
                self.processes.lock().unwrap().retain(|p| p.pid != pid);
            }
            self.killed.lock().unwrap().push(pid);
            Ok(())
        }

        async fn flush_dns_cache(&self) -> Result<(), PlatformError> {
            Ok(())
        }

        fn flush_script(&self) -> &'static str {
            "true"
        }

        fn admin_group(&self) -> &'static str {
            "root"
        }
    }

    fn apps(values: &[&str]) -> Vec<String> {
        values.iter().map(|v| v.to_string()).collect()
    }

    #[tokio::test]
    async fn test_check_kills_and_notifies_then_clears() {
        let platform = FakeProcesses::with(&[
            (400010, "/usr/bin/bash"),
            (400020, "/opt/NotesApp/notesapp --type=renderer"),
        ]);
        let mut notifier = MockNotifier::new();
        notifier
            .expect_notify()
            .withf(|n| n.title == "Distraction Blocked" && n.body.contains("NotesApp"))
            .times(1)
            .return_const(());
        let detected = Mutex::new(Vec::new());
        let signal = ShutdownSignal::new();
        let watched = apps(&["NotesApp"]);

        run_tick(&platform, &notifier, &watched, &detected, &signal).await;
        assert_eq!(*platform.killed.lock().unwrap(), vec![400020]);
        assert_eq!(*detected.lock().unwrap(), watched);

        // The killed process is gone: the next pass detects nothing
        run_tick(&platform, &notifier, &watched, &detected, &signal).await;
        assert!(detected.lock().unwrap().is_empty());
        assert_eq!(platform.killed.lock().unwrap().len(), 1);
    }

    #[tokio::test]
    async fn test_list_failure_clears_detections() {
        let mut platform = crate::platform::MockPlatform::new();
        platform.expect_list_processes().returning(|| {
            Err(PlatformError::CommandFailed {
                program: "ps".to_string(),
                status: Some(1),
                stderr: String::new(),
            })
        });
        platform.expect_terminate().times(0);
        let mut notifier = MockNotifier::new();
        notifier.expect_notify().times(0);
        let detected = Mutex::new(apps(&["NotesApp"]));

        run_tick(
            &platform,
            &notifier,
            &apps(&["NotesApp"]),
            &detected,
            &ShutdownSignal::new(),
        )
        .await;

        assert!(detected.lock().unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_check_after_shutdown_publishes_nothing() {
        let platform = FakeProcesses::with(&[(400020, "notesapp")]);
        let mut notifier = MockNotifier::new();
        notifier.expect_notify().times(0);
        let detected = Mutex::new(Vec::new());
        let signal = ShutdownSignal::new();
        signal.shutdown();

        run_tick(&platform, &notifier, &apps(&["notesapp"]), &detected, &signal).await;

        assert!(detected.lock().unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_start_with_empty_apps_is_noop() {
        let platform = Arc::new(FakeProcesses::default());
        let mut monitor = ProcessMonitor::new(platform.clone(), Arc::new(LogNotifier));

        monitor.start(Vec::new(), Duration::from_millis(1));

        assert!(!monitor.is_running());
        tokio::time::sleep(Duration::from_millis(20)).await;
        assert_eq!(*platform.list_calls.lock().unwrap(), 0);
    }

    #[tokio::test]
    async fn test_first_check_runs_immediately() {
        let platform = Arc::new(FakeProcesses::with(&[(400020, "notesapp")]));
        let mut monitor = ProcessMonitor::new(platform.clone(), Arc::new(LogNotifier));

        monitor.start(apps(&["notesapp"]), Duration::from_secs(3600));

        for _ in 0..100 {
            if !platform.killed.lock().unwrap().is_empty() {
                break;
            }
            tokio::time::sleep(Duration::from_millis(10)).await;
        }
        assert_eq!(*platform.killed.lock().unwrap(), vec![400020]);
        assert_eq!(monitor.detected(), apps(&["notesapp"]));

        monitor.stop();
        assert!(!monitor.is_running());
        assert!(monitor.detected().is_empty());
    }

    #[tokio::test]
    async fn test_restart_replaces_running_task() {
        let platform = Arc::new(FakeProcesses::default());
        let mut monitor = ProcessMonitor::new(platform.clone(), Arc::new(LogNotifier));

        monitor.start(apps(&["a"]), Duration::from_secs(3600));
        monitor.start(apps(&["b"]), Duration::from_secs(3600));
        assert!(monitor.is_running());

        monitor.start(Vec::new(), Duration::from_secs(3600));
        assert!(!monitor.is_running());
    }

    #[tokio::test]
    async fn test_periodic_checks_continue() {
        let platform = Arc::new(FakeProcesses::default());
        let mut monitor = ProcessMonitor::new(platform.clone(), Arc::new(LogNotifier));

        monitor.start(apps(&["notesapp"]), Duration::from_millis(5));
        tokio::time::sleep(Duration::from_millis(100)).await;
        monitor.stop();

        assert!(*platform.list_calls.lock().unwrap() >= 2);
    }
}
