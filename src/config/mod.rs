pub mod connection;
pub mod error;
pub mod paths;
pub mod provider;
pub mod resolve;
pub mod store;

pub use connection::{
    build_connection, mask_connection, mask_secret, AdoConnection, DataverseConnection,
    EffectiveConnection, JiraConnection,
};
pub use error::ConfigError;
pub use paths::{
    workspace_config_path_in, ConfigPaths, CONNECTIONS_FILE_NAME, GLOBAL_CONFIG_FILE_NAME,
    STATE_DIR, STATE_ROOT_ENV, WORKSPACE_DIR_NAME, WORKSPACE_FILE_NAME,
};
pub use provider::{Provider, SECRET_FIELDS};
pub use resolve::{ConnectionResolver, EnvLookup, ProcessEnv};
pub use store::{
    Connection, ConnectionStore, GlobalConfig, PersistedStore, WorkspaceConfig, WorkspaceUpdate,
};
