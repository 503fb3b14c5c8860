use std::{
    io::Write,
    path::{Path, PathBuf},
    sync::Arc,
};

use super::{install::HostsInstaller, region};
use crate::error::EditError;

pub const DEFAULT_HOSTS_PATH: &str = "/etc/hosts";

/// Read-modify-write access to the managed region of the hosts file
pub struct HostsEditor {
    hosts_path: PathBuf,
    installer: Arc<dyn HostsInstaller>,
}

impl HostsEditor {
    pub fn new(hosts_path: impl Into<PathBuf>, installer: Arc<dyn HostsInstaller>) -> Self {
        Self {
            hosts_path: hosts_path.into(),
            installer,
        }
    }

    pub fn hosts_path(&self) -> &Path {
        &self.hosts_path
    }

    pub async fn read(&self) -> Result<String, EditError> {
        tokio::fs::read_to_string(&self.hosts_path)
            .await
            .map_err(|source| EditError::Read {
                path: self.hosts_path.clone(),
                source,
            })
    }

    pub async fn has_managed_region(&self) -> Result<bool, EditError> {
        Ok(region::has_region(&self.read().await?))
    }

    /// Domains currently blocked on disk
    pub async fn managed_domains(&self) -> Result<Vec<String>, EditError> {
        Ok(region::managed_domains(&self.read().await?))
    }

    /// Block `domains`, replacing whatever managed region exists
    ///
    /// An empty list removes the region, like [`HostsEditor::clear`].
    pub async fn apply(&self, domains: &[String]) -> Result<(), EditError> {
        if domains.is_empty() {
            return self.clear().await;
        }
        for domain in domains {
            validate_domain(domain)?;
        }

        let current = self.read().await?;
        self.write(&region::with_region(&current, domains)).await?;
        log::info!(
            "blocked {} domain(s) in {}",
            domains.len(),
            self.hosts_path.display()
        );
        Ok(())
    }

    /// Remove the managed region
    pub async fn clear(&self) -> Result<(), EditError> {
        let current = self.read().await?;
        self.write(&region::strip_region(&current)).await?;
        log::info!("removed blocked domains from {}", self.hosts_path.display());
        Ok(())
    }

    /// Stage `content` privately, install it in one step, then flush the cache
    async fn write(&self, content: &str) -> Result<(), EditError> {
        let stage_err = |source| EditError::Stage {
            path: self.hosts_path.clone(),
            source,
        };
        let mut staged = tempfile::Builder::new()
            .prefix("focusguard-hosts-")
            .tempfile()
            .map_err(stage_err)?;
        staged.write_all(content.as_bytes()).map_err(stage_err)?;
        staged.flush().map_err(stage_err)?;

        self.installer
            .install(staged.path())
            .await
            .inspect_err(|err| {
                log::error!("failed to update {}: {err}", self.hosts_path.display());
            })?;

        if let Err(err) = self.installer.flush_cache().await {
            log::warn!("hosts file updated but DNS cache flush failed: {err}");
        }
        Ok(())
    }
}

/// A domain must stay a single field on a single hosts line
fn validate_domain(domain: &str) -> Result<(), EditError> {
    let invalid = |reason: &str| EditError::InvalidDomain {
        domain: domain.to_string(),
        reason: reason.to_string(),
    };
    if domain.is_empty() {
        return Err(invalid("empty"));
    }
    if domain
        .chars()
        .any(|c| c.is_whitespace() || c.is_control() || c == '#')
    {
        return Err(invalid("contains whitespace, control characters or '#'"));
    }
    Ok(())
}
