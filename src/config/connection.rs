use super::provider::{
    FIELD_API_TOKEN, FIELD_CLIENT_ID, FIELD_CLIENT_SECRET, FIELD_EMAIL, FIELD_ENVIRONMENT_URL,
    FIELD_ORGANIZATION, FIELD_PROJECT, FIELD_SERVER, FIELD_TENANT_ID, SECRET_FIELDS,
};
use super::{ConfigError, Connection, Provider};

/// Resolved, non-persisted connection for a single invocation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EffectiveConnection {
    provider: Provider,
    fields: Connection,
}

impl EffectiveConnection {
    pub fn new(provider: Provider, fields: Connection) -> Self {
        Self { provider, fields }
    }

    pub fn provider(&self) -> Provider {
        self.provider
    }

    pub fn fields(&self) -> &Connection {
        &self.fields
    }

    /// Value of `field` when present and non-blank.
    pub fn get(&self, field: &str) -> Option<&str> {
        self.fields
            .get(field)
            .map(String::as_str)
            .filter(|value| !value.trim().is_empty())
    }

    pub fn has(&self, field: &str) -> bool {
        self.get(field).is_some()
    }

    pub fn missing_required(&self) -> Vec<&'static str> {
        self.provider
            .required_fields()
            .iter()
            .copied()
            .filter(|field| !self.has(field))
            .collect()
    }

    /// Copy of the fields with secret values masked for display.
    pub fn masked(&self) -> Connection {
        mask_connection(&self.fields)
    }

    /// Display fields read through the provider's typed view.
    pub fn summary(&self) -> Connection {
        let mut summary = Connection::new();
        let mut put = |field: &str, value: String| {
            summary.insert(field.to_string(), value);
        };
        match self.provider {
            Provider::Jira => {
                let view = JiraConnection::from(self);
                put(FIELD_SERVER, view.server);
                put(FIELD_EMAIL, view.email);
                put(FIELD_API_TOKEN, mask_secret(&view.api_token));
            }
            Provider::Ado => {
                let view = AdoConnection::from(self);
                put(FIELD_ORGANIZATION, view.organization);
                put(FIELD_PROJECT, view.project);
                if let Some(tenant_id) = view.tenant_id {
                    put(FIELD_TENANT_ID, tenant_id);
                }
            }
            Provider::Dataverse => {
                let view = DataverseConnection::from(self);
                let auth = if view.has_client_secret_auth() {
                    "client_secret"
                } else {
                    "azure_cli"
                };
                put("auth", auth.to_string());
                if let Some(tenant_id) = view.tenant_id {
                    put(FIELD_TENANT_ID, tenant_id);
                }
                if let Some(url) = view.environment_url {
                    put(FIELD_ENVIRONMENT_URL, url);
                }
            }
        }
        summary
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct JiraConnection {
    pub server: String,
    pub email: String,
    pub api_token: String,
}

impl From<&EffectiveConnection> for JiraConnection {
    fn from(conn: &EffectiveConnection) -> Self {
        Self {
            server: owned(conn, FIELD_SERVER).unwrap_or_default(),
            email: owned(conn, FIELD_EMAIL).unwrap_or_default(),
            api_token: owned(conn, FIELD_API_TOKEN).unwrap_or_default(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AdoConnection {
    pub organization: String,
    pub project: String,
    pub tenant_id: Option<String>,
}

impl From<&EffectiveConnection> for AdoConnection {
    fn from(conn: &EffectiveConnection) -> Self {
        Self {
            organization: owned(conn, FIELD_ORGANIZATION).unwrap_or_default(),
            project: owned(conn, FIELD_PROJECT).unwrap_or_default(),
            tenant_id: owned(conn, FIELD_TENANT_ID),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DataverseConnection {
    pub tenant_id: Option<String>,
    pub environment_url: Option<String>,
    pub client_id: Option<String>,
    pub client_secret: Option<String>,
}

impl DataverseConnection {
    /// Service-principal auth needs all three of tenant, client id and secret.
    pub fn has_client_secret_auth(&self) -> bool {
        self.tenant_id.is_some() && self.client_id.is_some() && self.client_secret.is_some()
    }
}

impl From<&EffectiveConnection> for DataverseConnection {
    fn from(conn: &EffectiveConnection) -> Self {
        Self {
            tenant_id: owned(conn, FIELD_TENANT_ID),
            environment_url: owned(conn, FIELD_ENVIRONMENT_URL),
            client_id: owned(conn, FIELD_CLIENT_ID),
            client_secret: owned(conn, FIELD_CLIENT_SECRET),
        }
    }
}

fn owned(conn: &EffectiveConnection, field: &str) -> Option<String> {
    conn.get(field).map(str::to_string)
}

/// Validates a field set supplied on the command line before it is stored.
pub fn build_connection(provider: Provider, flags: &Connection) -> Result<Connection, ConfigError> {
    let value = |field: &str| {
        flags
            .get(field)
            .map(|v| v.trim())
            .filter(|v| !v.is_empty())
            .map(str::to_string)
    };

    let mut connection = Connection::new();
    match provider {
        Provider::Jira => {
            let (Some(server), Some(email), Some(api_token)) = (
                value(FIELD_SERVER),
                value(FIELD_EMAIL),
                value(FIELD_API_TOKEN),
            ) else {
                return Err(ConfigError::IncompleteConnection(
                    "jira requires all of: --server, --email, --api-token".to_string(),
                ));
            };
            connection.insert(
                FIELD_SERVER.to_string(),
                server.trim_end_matches('/').to_string(),
            );
            connection.insert(FIELD_EMAIL.to_string(), email);
            connection.insert(FIELD_API_TOKEN.to_string(), api_token);
        }
        Provider::Ado => {
            let (Some(organization), Some(project)) =
                (value(FIELD_ORGANIZATION), value(FIELD_PROJECT))
            else {
                return Err(ConfigError::IncompleteConnection(
                    "ado requires both: --organization, --project".to_string(),
                ));
            };
            connection.insert(
                FIELD_ORGANIZATION.to_string(),
                organization.trim_end_matches('/').to_string(),
            );
            connection.insert(FIELD_PROJECT.to_string(), project);
            if let Some(tenant_id) = value(FIELD_TENANT_ID) {
                connection.insert(FIELD_TENANT_ID.to_string(), tenant_id);
            }
        }
        Provider::Dataverse => {
            let Some(tenant_id) = value(FIELD_TENANT_ID) else {
                return Err(ConfigError::IncompleteConnection(
                    "dataverse requires --tenant-id".to_string(),
                ));
            };
            connection.insert(FIELD_TENANT_ID.to_string(), tenant_id);
            for field in [FIELD_CLIENT_ID, FIELD_CLIENT_SECRET, FIELD_ENVIRONMENT_URL] {
                if let Some(v) = value(field) {
                    connection.insert(field.to_string(), v);
                }
            }
        }
    }
    Ok(connection)
}

/// First four characters followed by `***`; short values become `***`.
pub fn mask_secret(value: &str) -> String {
    if value.chars().count() > 4 {
        let prefix: String = value.chars().take(4).collect();
        format!("{prefix}***")
    } else {
        "***".to_string()
    }
}

pub fn mask_connection(connection: &Connection) -> Connection {
    connection
        .iter()
        .map(|(field, value)| {
            let shown = if SECRET_FIELDS.contains(&field.as_str()) && !value.is_empty() {
                mask_secret(value)
            } else {
                value.clone()
            };
            (field.clone(), shown)
        })
        .collect()
}
