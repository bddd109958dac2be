use super::ConfigError;
use std::path::{Path, PathBuf};

pub const STATE_DIR: &str = ".opskit";
pub const STATE_ROOT_ENV: &str = "OPSKIT_HOME";
pub const GLOBAL_CONFIG_FILE_NAME: &str = "config.json";
pub const CONNECTIONS_FILE_NAME: &str = "connections.json";
pub const VENV_DIR_NAME: &str = ".venv";
pub const LOG_FILE_PATH: &str = "logs/opskit.log";
pub const WORKSPACE_DIR_NAME: &str = "ops";
pub const WORKSPACE_FILE_NAME: &str = "opskit.json";

/// Locations of every persisted document, built once and handed to components.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ConfigPaths {
    pub root: PathBuf,
    pub global_config: PathBuf,
    pub connections: PathBuf,
    pub venv_dir: PathBuf,
    pub log_file: PathBuf,
    working_dir: Option<PathBuf>,
}

impl ConfigPaths {
    pub fn at(root: impl Into<PathBuf>) -> Self {
        let root = root.into();
        Self {
            global_config: root.join(GLOBAL_CONFIG_FILE_NAME),
            connections: root.join(CONNECTIONS_FILE_NAME),
            venv_dir: root.join(VENV_DIR_NAME),
            log_file: root.join(LOG_FILE_PATH),
            root,
            working_dir: None,
        }
    }

    /// `$OPSKIT_HOME` when set, otherwise `$HOME/.opskit`.
    pub fn from_env() -> Result<Self, ConfigError> {
        if let Some(root) = std::env::var_os(STATE_ROOT_ENV).filter(|v| !v.is_empty()) {
            return Ok(Self::at(root));
        }
        let home = std::env::var_os("HOME")
            .or_else(|| std::env::var_os("USERPROFILE"))
            .ok_or(ConfigError::HomeDirectoryUnavailable)?;
        Ok(Self::at(PathBuf::from(home).join(STATE_DIR)))
    }

    /// Pins the workspace lookup to `dir` instead of the process cwd.
    pub fn with_working_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.working_dir = Some(dir.into());
        self
    }

    /// `<cwd>/ops/opskit.json`, with the cwd read at call time.
    pub fn workspace_config(&self) -> Result<PathBuf, ConfigError> {
        let dir = match &self.working_dir {
            Some(dir) => dir.clone(),
            None => std::env::current_dir().map_err(ConfigError::WorkingDirectory)?,
        };
        Ok(workspace_config_path_in(&dir))
    }

    pub fn venv_python(&self) -> PathBuf {
        if cfg!(windows) {
            self.venv_dir.join("Scripts").join("python.exe")
        } else {
            self.venv_dir.join("bin").join("python3")
        }
    }
}

pub fn workspace_config_path_in(dir: &Path) -> PathBuf {
    dir.join(WORKSPACE_DIR_NAME).join(WORKSPACE_FILE_NAME)
}
