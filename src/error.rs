use thiserror::Error;

use std::{path::PathBuf, time::Duration};

/// Failure to run an external program at all.
#[derive(Debug, Error)]
pub enum CommandError {
    #[error("failed to spawn {program}: {source}")]
    Spawn {
        program: String,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to write input to {program}: {source}")]
    Input {
        program: String,
        #[source]
        source: std::io::Error,
    },

    #[error("{program} did not finish within {timeout:?}")]
    TimedOut { program: String, timeout: Duration },
}

#[derive(Debug, Error)]
pub enum PlatformError {
    #[error(transparent)]
    Command(#[from] CommandError),

    #[error("{program} exited with status {status:?}: {stderr}")]
    CommandFailed {
        program: String,
        status: Option<i32>,
        stderr: String,
    },

    #[error("failed to terminate process {pid}: {source}")]
    Terminate {
        pid: u32,
        #[source]
        source: nix::Error,
    },
}

#[derive(Debug, Error)]
pub enum ElevationError {
    #[error("administrator authorization was denied or dismissed")]
    Denied,

    #[error("no answer to the authorization prompt within {after:?}")]
    TimedOut { after: Duration },

    #[error("elevated command exited with status {status:?}: {stderr}")]
    Failed { status: Option<i32>, stderr: String },

    #[error(transparent)]
    Command(CommandError),
}

impl From<CommandError> for ElevationError {
    fn from(err: CommandError) -> Self {
        match err {
            CommandError::TimedOut { timeout, .. } => ElevationError::TimedOut { after: timeout },
            other => ElevationError::Command(other),
        }
    }
}

#[derive(Debug, Error)]
pub enum BootstrapError {
    #[error("could not determine the current user name")]
    UnknownUser,

    #[error("user name '{name}' cannot be written into a sudoers rule")]
    UnsafeUserName { name: String },

    #[error("refusing to authorize {path}: {reason}")]
    UnsafePath { path: PathBuf, reason: String },

    #[error("failed to stage {what} for installation: {source}")]
    Stage {
        what: &'static str,
        #[source]
        source: std::io::Error,
    },

    #[error("elevated install failed: {0}")]
    Elevation(#[from] ElevationError),

    #[error("install reported success but {path} is missing")]
    ArtifactMissing { path: PathBuf },
}

#[derive(Debug, Error)]
pub enum EditError {
    #[error("failed to read {path}: {source}")]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to stage new content for {path}: {source}")]
    Stage {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to install new content into {path}: {source}")]
    Install {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("invalid domain '{domain}': {reason}")]
    InvalidDomain { domain: String, reason: String },

    #[error("helper {helper} failed during {action}: status {status:?}: {stderr}")]
    HelperFailed {
        helper: PathBuf,
        action: &'static str,
        status: Option<i32>,
        stderr: String,
    },

    #[error("failed to invoke helper {helper}: {source}")]
    HelperInvoke {
        helper: PathBuf,
        #[source]
        source: CommandError,
    },

    #[error("elevated {action} failed: {source}")]
    Elevation {
        action: &'static str,
        #[source]
        source: ElevationError,
    },

    #[error("DNS cache flush failed: {0}")]
    Flush(#[from] PlatformError),
}

#[derive(Debug, Error)]
pub enum BlockError {
    #[error("blocking was not applied: {0}")]
    Apply(#[source] EditError),

    #[error("blocking stopped but the hosts file was not cleaned: {0}")]
    Cleanup(#[source] EditError),
}

#[derive(Debug, Error)]
pub enum SweepError {
    #[error("startup cleanup failed: {0}")]
    Edit(#[from] EditError),
}

/// Top-level error of the `focusguard` binary
#[derive(Debug, Error)]
pub enum GuardError {
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("failed to parse config {path}: {source}")]
    ConfigParse {
        path: PathBuf,
        #[source]
        source: toml::de::Error,
    },

    #[error(transparent)]
    Bootstrap(#[from] BootstrapError),

    #[error(transparent)]
    Edit(#[from] EditError),

    #[error(transparent)]
    Block(#[from] BlockError),

    #[error(transparent)]
    Sweep(#[from] SweepError),

    #[error("confirmation phrase did not match; type '{expected}' to unlock")]
    ConfirmationMismatch { expected: &'static str },
}
