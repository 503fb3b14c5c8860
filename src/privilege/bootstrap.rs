use std::{io::Write, path::PathBuf, sync::Arc};

use tempfile::NamedTempFile;

use super::{
    PrivilegeFlag, PrivilegePaths,
    elevate::Elevator,
    helper::{
        render_bootstrap_script, render_helper_script, render_sudoers_rule, validate_rule_path,
        validate_user_name,
    },
};
use crate::{error::BootstrapError, platform::Platform};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BootstrapOutcome {
    /// Artifacts were already in place, nothing was prompted
    AlreadyInstalled,
    /// The one-time elevated install ran and succeeded
    Installed,
}

/// One-time installer of the hosts helper and its sudoers rule
///
/// After a successful bootstrap the hosts file can be replaced through
/// `sudo -n <helper>` without any further prompt.
pub struct Bootstrapper {
    paths: PrivilegePaths,
    hosts_path: PathBuf,
    platform: Arc<dyn Platform>,
    elevator: Arc<dyn Elevator>,
    flag: PrivilegeFlag,
    user: Option<String>,
}

impl Bootstrapper {
    pub fn new(
        paths: PrivilegePaths,
        hosts_path: impl Into<PathBuf>,
        platform: Arc<dyn Platform>,
        elevator: Arc<dyn Elevator>,
        flag: PrivilegeFlag,
    ) -> Self {
        Self {
            paths,
            hosts_path: hosts_path.into(),
            platform,
            elevator,
            flag,
            user: None,
        }
    }

    /// Authorize `user` instead of the user owning this process
    pub fn with_user(mut self, user: impl Into<String>) -> Self {
        self.user = Some(user.into());
        self
    }

    pub fn paths(&self) -> &PrivilegePaths {
        &self.paths
    }

    pub fn is_installed(&self) -> bool {
        self.paths.is_installed()
    }

    /// Mark privilege as ready when a previous bootstrap left its artifacts; never prompts
    pub fn detect(&self) -> bool {
        let installed = self.is_installed();
        if installed {
            self.flag.set_ready(true);
        }
        installed
    }

    /// Install the helper and sudoers rule unless they already exist
    pub async fn ensure_bootstrapped(&self) -> Result<BootstrapOutcome, BootstrapError> {
        if self.detect() {
            log::debug!(
                "privileged helper already installed at {}",
                self.paths.helper.display()
            );
            return Ok(BootstrapOutcome::AlreadyInstalled);
        }

        validate_rule_path(&self.paths.helper)?;
        validate_rule_path(&self.paths.sudoers)?;
        let user = self.resolve_user()?;
        validate_user_name(&user)?;

        let helper_file = stage(
            "helper script",
            &render_helper_script(&self.hosts_path, self.platform.flush_script()),
        )?;
        let sudoers_file = stage(
            "sudoers rule",
            &render_sudoers_rule(&user, &self.paths.helper),
        )?;

        let script = render_bootstrap_script(
            helper_file.path(),
            &self.paths.helper,
            sudoers_file.path(),
            &self.paths.sudoers,
            self.platform.admin_group(),
        );

        log::info!(
            "installing {} and {} for user {}",
            self.paths.helper.display(),
            self.paths.sudoers.display(),
            user
        );
        self.elevator.run_elevated(&script).await.inspect_err(|err| {
            log::error!(
                "one-time privilege setup failed, falling back to per-change prompts: {err}"
            );
        })?;

        for path in [&self.paths.helper, &self.paths.sudoers] {
            if !path.exists() {
                return Err(BootstrapError::ArtifactMissing {
                    path: path.to_path_buf(),
                });
            }
        }

        self.flag.set_ready(true);
        log::info!("privileged helper installed");
        Ok(BootstrapOutcome::Installed)
    }

    fn resolve_user(&self) -> Result<String, BootstrapError> {
        if let Some(user) = &self.user {
            return Ok(user.clone());
        }
        // Real uid, not SUDO_USER
        nix::unistd::User::from_uid(nix::unistd::Uid::current())
            .ok()
            .flatten()
            .map(|user| user.name)
            .ok_or(BootstrapError::UnknownUser)
    }
}

fn stage(what: &'static str, content: &str) -> Result<NamedTempFile, BootstrapError> {
    let map_err = |source| BootstrapError::Stage { what, source };
    let mut file = tempfile::Builder::new()
        .prefix("focusguard-install-")
        .tempfile()
        .map_err(map_err)?;
    file.write_all(content.as_bytes()).map_err(map_err)?;
    file.flush().map_err(map_err)?;
    Ok(file)
}
