#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("failed to read file {path}: {source}")]
    Read {
        path: String,
        #[source]
        source: std::io::Error,
    },
    #[error("invalid json in {path}: {source}")]
    Parse {
        path: String,
        #[source]
        source: serde_json::Error,
    },
    #[error("failed to create directory {path}: {source}")]
    CreateDir {
        path: String,
        #[source]
        source: std::io::Error,
    },
    #[error("failed to encode json for {path}: {source}")]
    Encode {
        path: String,
        #[source]
        source: serde_json::Error,
    },
    #[error("failed to write file {path}: {source}")]
    Write {
        path: String,
        #[source]
        source: std::io::Error,
    },
    #[error("failed to resolve home directory for opskit state root")]
    HomeDirectoryUnavailable,
    #[error("failed to resolve current working directory: {0}")]
    WorkingDirectory(#[source] std::io::Error),
    #[error("unknown provider `{0}` (expected one of: jira, ado, dataverse)")]
    UnknownProvider(String),
    #[error("connection '{name}' not found for {provider}")]
    ConnectionNotFound { provider: String, name: String },
    #[error("{0}")]
    IncompleteConnection(String),
    #[error("no workspace options provided; use --environment-url, --jira, --ado, --dataverse")]
    EmptyWorkspaceUpdate,
}
