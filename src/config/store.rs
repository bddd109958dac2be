use super::{ConfigError, ConfigPaths, Provider};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fs;
use std::path::{Path, PathBuf};

/// Field map for one provider + connection name. No schema is enforced.
pub type Connection = BTreeMap<String, String>;

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct GlobalConfig {
    #[serde(default)]
    pub defaults: BTreeMap<String, String>,
}

impl GlobalConfig {
    pub fn default_for(&self, provider: Provider) -> Option<&str> {
        self.defaults
            .get(provider.as_str())
            .map(String::as_str)
            .filter(|name| !name.is_empty())
    }

    pub fn set_default(&mut self, provider: Provider, name: &str) {
        self.defaults
            .insert(provider.as_str().to_string(), name.to_string());
    }

    pub fn clear_default(&mut self, provider: Provider) -> Option<String> {
        self.defaults.remove(provider.as_str())
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ConnectionStore {
    pub providers: BTreeMap<String, BTreeMap<String, Connection>>,
}

impl ConnectionStore {
    pub fn get(&self, provider: Provider, name: &str) -> Option<&Connection> {
        self.providers
            .get(provider.as_str())
            .and_then(|connections| connections.get(name))
    }

    pub fn contains(&self, provider: Provider, name: &str) -> bool {
        self.get(provider, name).is_some()
    }

    pub fn names(&self, provider: Provider) -> Vec<String> {
        self.providers
            .get(provider.as_str())
            .map(|connections| connections.keys().cloned().collect())
            .unwrap_or_default()
    }

    pub fn insert(&mut self, provider: Provider, name: &str, connection: Connection) {
        self.providers
            .entry(provider.as_str().to_string())
            .or_default()
            .insert(name.to_string(), connection);
    }

    pub fn remove(&mut self, provider: Provider, name: &str) -> Option<Connection> {
        let connections = self.providers.get_mut(provider.as_str())?;
        let removed = connections.remove(name);
        if connections.is_empty() {
            self.providers.remove(provider.as_str());
        }
        removed
    }

    pub fn is_empty(&self) -> bool {
        self.providers.values().all(BTreeMap::is_empty)
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct WorkspaceConfig {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub environment_url: Option<String>,
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub connections: BTreeMap<String, String>,
}

impl WorkspaceConfig {
    pub fn connection_for(&self, provider: Provider) -> Option<&str> {
        self.connections
            .get(provider.as_str())
            .map(String::as_str)
            .filter(|name| !name.is_empty())
    }

    pub fn environment_url(&self) -> Option<&str> {
        self.environment_url
            .as_deref()
            .filter(|url| !url.trim().is_empty())
    }

    pub fn is_empty(&self) -> bool {
        self.environment_url.is_none() && self.connections.is_empty()
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct WorkspaceUpdate {
    pub environment_url: Option<String>,
    pub connections: BTreeMap<Provider, String>,
}

/// Reads and writes the three JSON documents.
#[derive(Debug, Clone)]
pub struct PersistedStore {
    paths: ConfigPaths,
}

impl PersistedStore {
    pub fn new(paths: ConfigPaths) -> Self {
        Self { paths }
    }

    pub fn paths(&self) -> &ConfigPaths {
        &self.paths
    }

    pub fn load_global_config(&self) -> Result<GlobalConfig, ConfigError> {
        load_json(&self.paths.global_config)
    }

    pub fn save_global_config(&self, config: &GlobalConfig) -> Result<PathBuf, ConfigError> {
        save_json(&self.paths.global_config, config)?;
        Ok(self.paths.global_config.clone())
    }

    pub fn load_connections(&self) -> Result<ConnectionStore, ConfigError> {
        load_json(&self.paths.connections)
    }

    /// Writes the secret-bearing store and narrows it to owner read/write.
    pub fn save_connections(&self, store: &ConnectionStore) -> Result<PathBuf, ConfigError> {
        save_json(&self.paths.connections, store)?;
        restrict_to_owner(&self.paths.connections);
        Ok(self.paths.connections.clone())
    }

    pub fn load_workspace(&self) -> Result<WorkspaceConfig, ConfigError> {
        load_json(&self.paths.workspace_config()?)
    }

    pub fn save_workspace(&self, workspace: &WorkspaceConfig) -> Result<PathBuf, ConfigError> {
        let path = self.paths.workspace_config()?;
        save_json(&path, workspace)?;
        Ok(path)
    }

    /// Upserts a connection. The first connection saved for a provider with
    /// no recorded default becomes that default; returns whether it did.
    pub fn add_connection(
        &self,
        provider: Provider,
        name: &str,
        connection: Connection,
    ) -> Result<bool, ConfigError> {
        let mut store = self.load_connections()?;
        store.insert(provider, name, connection);
        self.save_connections(&store)?;

        let mut config = self.load_global_config()?;
        if config.default_for(provider).is_some() {
            return Ok(false);
        }
        config.set_default(provider, name);
        self.save_global_config(&config)?;
        Ok(true)
    }

    /// Removes a connection and clears the provider default when it pointed
    /// at it; returns whether the default was cleared.
    pub fn remove_connection(&self, provider: Provider, name: &str) -> Result<bool, ConfigError> {
        let mut store = self.load_connections()?;
        if store.remove(provider, name).is_none() {
            return Err(ConfigError::ConnectionNotFound {
                provider: provider.to_string(),
                name: name.to_string(),
            });
        }
        self.save_connections(&store)?;

        let mut config = self.load_global_config()?;
        if config.default_for(provider) != Some(name) {
            return Ok(false);
        }
        config.clear_default(provider);
        self.save_global_config(&config)?;
        Ok(true)
    }

    pub fn set_default(&self, provider: Provider, name: &str) -> Result<(), ConfigError> {
        let store = self.load_connections()?;
        if !store.contains(provider, name) {
            return Err(ConfigError::ConnectionNotFound {
                provider: provider.to_string(),
                name: name.to_string(),
            });
        }
        let mut config = self.load_global_config()?;
        config.set_default(provider, name);
        self.save_global_config(&config)?;
        Ok(())
    }

    /// Merges `update` into the workspace document of the current directory.
    pub fn init_workspace(
        &self,
        update: WorkspaceUpdate,
    ) -> Result<(PathBuf, WorkspaceConfig), ConfigError> {
        let mut workspace = self.load_workspace()?;
        if let Some(url) = update
            .environment_url
            .as_deref()
            .map(|url| url.trim().trim_end_matches('/'))
            .filter(|url| !url.is_empty())
        {
            workspace.environment_url = Some(url.to_string());
        }
        for (provider, name) in update.connections {
            if !name.trim().is_empty() {
                workspace
                    .connections
                    .insert(provider.as_str().to_string(), name.trim().to_string());
            }
        }
        if workspace.is_empty() {
            return Err(ConfigError::EmptyWorkspaceUpdate);
        }
        let path = self.save_workspace(&workspace)?;
        Ok((path, workspace))
    }
}

/// Missing files load as the type's empty default.
fn load_json<T: DeserializeOwned + Default>(path: &Path) -> Result<T, ConfigError> {
    if !path.exists() {
        return Ok(T::default());
    }
    let raw = fs::read_to_string(path).map_err(|source| ConfigError::Read {
        path: path.display().to_string(),
        source,
    })?;
    if raw.trim().is_empty() {
        return Ok(T::default());
    }
    serde_json::from_str(&raw).map_err(|source| ConfigError::Parse {
        path: path.display().to_string(),
        source,
    })
}

fn save_json<T: Serialize>(path: &Path, value: &T) -> Result<(), ConfigError> {
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent).map_err(|source| ConfigError::CreateDir {
            path: parent.display().to_string(),
            source,
        })?;
    }
    let mut body = serde_json::to_string_pretty(value).map_err(|source| ConfigError::Encode {
        path: path.display().to_string(),
        source,
    })?;
    body.push('\n');
    fs::write(path, body).map_err(|source| ConfigError::Write {
        path: path.display().to_string(),
        source,
    })
}

#[cfg(unix)]
fn restrict_to_owner(path: &Path) {
    use std::os::unix::fs::PermissionsExt;
    let _ = fs::set_permissions(path, fs::Permissions::from_mode(0o600));
}

#[cfg(not(unix))]
fn restrict_to_owner(_path: &Path) {}
