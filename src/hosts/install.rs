use std::{
    path::{Path, PathBuf},
    sync::Arc,
};

use async_trait::async_trait;

#[cfg(test)]
use mockall::automock;

use crate::{
    error::EditError,
    platform::{CommandRunner, Platform, command::DEFAULT_COMMAND_TIMEOUT},
    privilege::{
        Elevator, PrivilegeFlag,
        helper::{render_install_script, staging_sibling},
    },
};

/// Moves a fully staged hosts file into place
#[cfg_attr(test, automock)]
#[async_trait]
pub trait HostsInstaller: Send + Sync + 'static {
    /// Replace the hosts file with the content of `staged` in one step
    async fn install(&self, staged: &Path) -> Result<(), EditError>;

    /// Invalidate the OS name-resolution cache
    async fn flush_cache(&self) -> Result<(), EditError>;
}

/// Installs through the bootstrapped helper, or an elevation prompt per call
/// until the bootstrap has succeeded
pub struct PrivilegedInstaller {
    hosts_path: PathBuf,
    helper_path: PathBuf,
    flag: PrivilegeFlag,
    runner: Arc<dyn CommandRunner>,
    elevator: Arc<dyn Elevator>,
    platform: Arc<dyn Platform>,
}

impl PrivilegedInstaller {
    pub fn new(
        hosts_path: impl Into<PathBuf>,
        helper_path: impl Into<PathBuf>,
        flag: PrivilegeFlag,
        runner: Arc<dyn CommandRunner>,
        elevator: Arc<dyn Elevator>,
        platform: Arc<dyn Platform>,
    ) -> Self {
        Self {
            hosts_path: hosts_path.into(),
            helper_path: helper_path.into(),
            flag,
            runner,
            elevator,
            platform,
        }
    }

    async fn run_helper(&self, action: &'static str, input: Option<String>) -> Result<(), EditError> {
        let mut args = vec![
            "-n".to_string(),
            self.helper_path.display().to_string(),
            action.to_string(),
        ];

        let result = match input {
            Some(content) => {
                args.push(content.len().to_string());
                self.runner
                    .run_with_input("sudo", args, content.into_bytes(), DEFAULT_COMMAND_TIMEOUT)
                    .await
            }
            None => self.runner.run("sudo", args, DEFAULT_COMMAND_TIMEOUT).await,
        };
        let output = result.map_err(|source| EditError::HelperInvoke {
            helper: self.helper_path.clone(),
            source,
        })?;
        if output.success() {
            return Ok(());
        }
        Err(EditError::HelperFailed {
            helper: self.helper_path.clone(),
            action,
            status: output.status,
            stderr: output.stderr,
        })
    }
}

#[async_trait]
impl HostsInstaller for PrivilegedInstaller {
    async fn install(&self, staged: &Path) -> Result<(), EditError> {
        // Read once with user rights; root only ever sees the bytes
        let content = tokio::fs::read_to_string(staged)
            .await
            .map_err(|source| EditError::Stage {
                path: self.hosts_path.clone(),
                source,
            })?;
        if self.flag.is_ready() {
            return self.run_helper("install", Some(content)).await;
        }

        log::info!(
            "privileged helper not installed; asking for authorization to update {}",
            self.hosts_path.display()
        );
        let script = render_install_script(&content, &self.hosts_path);
        self.elevator
            .run_elevated(&script)
            .await
            .map_err(|source| EditError::Elevation {
                action: "hosts install",
                source,
            })
    }

    async fn flush_cache(&self) -> Result<(), EditError> {
        if self.flag.is_ready() {
            return self.run_helper("flush", None).await;
        }
        self.elevator
            .run_elevated(self.platform.flush_script())
            .await
            .map_err(|source| EditError::Elevation {
                action: "DNS cache flush",
                source,
            })
    }
}

/// Installs with the permissions of the current process
///
/// For hosts files the process may already write: running as root, or a
/// non-system hosts path.
pub struct DirectInstaller {
    hosts_path: PathBuf,
    platform: Arc<dyn Platform>,
}

impl DirectInstaller {
    pub fn new(hosts_path: impl Into<PathBuf>, platform: Arc<dyn Platform>) -> Self {
        Self {
            hosts_path: hosts_path.into(),
            platform,
        }
    }
}

#[async_trait]
impl HostsInstaller for DirectInstaller {
    async fn install(&self, staged: &Path) -> Result<(), EditError> {
        use std::os::unix::fs::PermissionsExt;

        let sibling = PathBuf::from(staging_sibling(&self.hosts_path));
        let install_err = |source| EditError::Install {
            path: self.hosts_path.clone(),
            source,
        };

        tokio::fs::copy(staged, &sibling).await.map_err(install_err)?;
        // The staged copy is private (0600); the hosts file must stay world-readable
        tokio::fs::set_permissions(&sibling, std::fs::Permissions::from_mode(0o644))
            .await
            .map_err(install_err)?;
        if let Err(source) = tokio::fs::rename(&sibling, &self.hosts_path).await {
            let _ = tokio::fs::remove_file(&sibling).await;
            return Err(install_err(source));
        }
        Ok(())
    }

    async fn flush_cache(&self) -> Result<(), EditError> {
        self.platform.flush_dns_cache().await.map_err(EditError::from)
    }
}
