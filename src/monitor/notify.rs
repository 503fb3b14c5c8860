use std::sync::Arc;

use async_trait::async_trait;

#[cfg(test)]
use mockall::automock;

use crate::platform::{CommandRunner, command::DEFAULT_COMMAND_TIMEOUT};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Urgency {
    Normal,
    Critical,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Notification {
    pub title: String,
    pub body: String,
    pub urgency: Urgency,
}

impl Notification {
    /// Notification sent after blocked apps were force-quit
    pub fn apps_blocked(apps: &[String]) -> Self {
        let plural = if apps.len() > 1 { "s" } else { "" };
        Self {
            title: "Distraction Blocked".to_string(),
            body: format!("Force-quit blocked app{}: {}", plural, apps.join(", ")),
            urgency: Urgency::Critical,
        }
    }
}

/// User-visible side channel for detection events
#[cfg_attr(test, automock)]
#[async_trait]
pub trait Notifier: Send + Sync + 'static {
    async fn notify(&self, notification: &Notification);
}

/// Writes notifications to the log only
#[derive(Debug, Default, Clone, Copy)]
pub struct LogNotifier;

#[async_trait]
impl Notifier for LogNotifier {
    async fn notify(&self, notification: &Notification) {
        log::warn!("{}: {}", notification.title, notification.body);
    }
}

/// Desktop notifications via `osascript` (macOS) or `notify-send` (freedesktop)
pub struct DesktopNotifier {
    runner: Arc<dyn CommandRunner>,
}

impl DesktopNotifier {
    pub fn new(runner: Arc<dyn CommandRunner>) -> Self {
        Self { runner }
    }

    fn command(notification: &Notification) -> (&'static str, Vec<String>) {
        if cfg!(target_os = "macos") {
            let quote = |s: &str| s.replace('\\', "\\\\").replace('"', "\\\"");
            (
                "osascript",
                vec![
                    "-e".to_string(),
                    format!(
                        "display notification \"{}\" with title \"{}\"",
                        quote(&notification.body),
                        quote(&notification.title)
                    ),
                ],
            )
        } else {
            let urgency = match notification.urgency {
                Urgency::Normal => "normal",
                Urgency::Critical => "critical",
            };
            (
                "notify-send",
                vec![
                    "-u".to_string(),
                    urgency.to_string(),
                    notification.title.clone(),
                    notification.body.clone(),
                ],
            )
        }
    }
}

#[async_trait]
impl Notifier for DesktopNotifier {
    async fn notify(&self, notification: &Notification) {
        log::info!("{}: {}", notification.title, notification.body);
        let (program, args) = Self::command(notification);
        match self.runner.run(program, args, DEFAULT_COMMAND_TIMEOUT).await {
            Ok(output) if output.success() => {}
            Ok(output) => log::warn!(
                "{} exited with {:?}: {}",
                program,
                output.status,
                output.stderr
            ),
            Err(err) => log::warn!("failed to show notification: {err}"),
        }
    }
}
