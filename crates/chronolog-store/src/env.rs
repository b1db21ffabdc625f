//! Environment capability: where the remote repository, the asset tree, and
//! the local state live.

use std::path::PathBuf;

use anyhow::{Context, Result};

/// Deployment inputs consumed by the store.
///
/// `log_level` and `log_file` are carried for the logging collaborator that
/// wires up the subscriber; the engine itself never reads them.
pub trait Environment: Send + Sync {
    /// Path or URL of the remote event-log repository.
    fn event_log_repository(&self) -> PathBuf;

    /// Root directory of the asset tree.
    fn event_log_assets_directory(&self) -> PathBuf;

    /// Directory under which local mirrors live; the event-log working copy
    /// sits at the well-known name [`crate::WORK_DIR_NAME`] inside it.
    fn state_directory(&self) -> PathBuf;

    /// Requested log verbosity, if configured.
    fn log_level(&self) -> Option<String> {
        None
    }

    /// Log file destination, if configured.
    fn log_file(&self) -> Option<PathBuf> {
        None
    }
}

/// Environment backed by explicit values, with an environment-variable
/// constructor for deployments.
#[derive(Debug, Clone)]
pub struct LocalEnvironment {
    repository: PathBuf,
    assets_directory: PathBuf,
    state_directory: PathBuf,
    log_level: Option<String>,
    log_file: Option<PathBuf>,
}

impl LocalEnvironment {
    /// Build an environment from explicit paths.
    pub fn new(
        repository: impl Into<PathBuf>,
        assets_directory: impl Into<PathBuf>,
        state_directory: impl Into<PathBuf>,
    ) -> Self {
        Self {
            repository: repository.into(),
            assets_directory: assets_directory.into(),
            state_directory: state_directory.into(),
            log_level: None,
            log_file: None,
        }
    }

    /// Read the environment from `CHRONOLOG_*` variables.
    ///
    /// `CHRONOLOG_REPOSITORY`, `CHRONOLOG_ASSETS_DIRECTORY`, and
    /// `CHRONOLOG_STATE_DIRECTORY` are required; `CHRONOLOG_LOG_LEVEL` and
    /// `CHRONOLOG_LOG_FILE` are optional.
    pub fn from_env() -> Result<Self> {
        Ok(Self {
            repository: required_var("CHRONOLOG_REPOSITORY")?,
            assets_directory: required_var("CHRONOLOG_ASSETS_DIRECTORY")?,
            state_directory: required_var("CHRONOLOG_STATE_DIRECTORY")?,
            log_level: std::env::var("CHRONOLOG_LOG_LEVEL").ok(),
            log_file: std::env::var("CHRONOLOG_LOG_FILE").ok().map(PathBuf::from),
        })
    }
}

fn required_var(name: &str) -> Result<PathBuf> {
    std::env::var(name)
        .map(PathBuf::from)
        .with_context(|| format!("environment variable {name} is not set"))
}

impl Environment for LocalEnvironment {
    fn event_log_repository(&self) -> PathBuf {
        self.repository.clone()
    }

    fn event_log_assets_directory(&self) -> PathBuf {
        self.assets_directory.clone()
    }

    fn state_directory(&self) -> PathBuf {
        self.state_directory.clone()
    }

    fn log_level(&self) -> Option<String> {
        self.log_level.clone()
    }

    fn log_file(&self) -> Option<PathBuf> {
        self.log_file.clone()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn explicit_values_round_trip() {
        let env = LocalEnvironment::new("/srv/log.git", "/srv/assets", "/var/lib/chronolog");
        assert_eq!(env.event_log_repository(), PathBuf::from("/srv/log.git"));
        assert_eq!(env.event_log_assets_directory(), PathBuf::from("/srv/assets"));
        assert_eq!(env.state_directory(), PathBuf::from("/var/lib/chronolog"));
        assert_eq!(env.log_level(), None);
        assert_eq!(env.log_file(), None);
    }
}
