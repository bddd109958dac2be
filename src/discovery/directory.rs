use super::credential::{scope_for, CredentialError, TokenCredential};
use super::{DiscoveredEnvironment, DiscoveryError};
use crate::shared::http::get_json;
use serde::Deserialize;
use serde_json::Value;
use std::collections::BTreeMap;

/// Admin API audience; distinct from the data-access audience.
pub const ADMIN_API_RESOURCE: &str = "https://api.bap.microsoft.com";
pub const ADMIN_API_BASE_ENV: &str = "OPSKIT_ADMIN_API_BASE";
pub const ADMIN_ENVIRONMENTS_PATH: &str =
    "/providers/Microsoft.BusinessAppPlatform/scopes/admin/environments?api-version=2020-10-01";

/// Lists every environment visible to the caller.
pub trait EnvironmentDirectory {
    fn list_environments(
        &self,
        credential: &dyn TokenCredential,
    ) -> Result<Vec<DiscoveredEnvironment>, DiscoveryError>;
}

#[derive(Debug, Clone)]
pub struct AdminEnvironmentDirectory {
    api_base: String,
}

#[derive(Debug, Deserialize)]
struct EnvironmentList {
    #[serde(default)]
    value: Vec<EnvironmentRecord>,
}

#[derive(Debug, Deserialize)]
struct EnvironmentRecord {
    #[serde(default)]
    name: String,
    #[serde(default)]
    location: Option<String>,
    #[serde(default)]
    properties: EnvironmentProperties,
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
struct EnvironmentProperties {
    #[serde(default)]
    display_name: Option<String>,
    #[serde(default)]
    azure_region: Option<String>,
    #[serde(default)]
    linked_environment_metadata: Option<LinkedEnvironmentMetadata>,
    #[serde(default)]
    runtime_endpoints: BTreeMap<String, Value>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
struct LinkedEnvironmentMetadata {
    #[serde(default)]
    instance_url: Option<String>,
}

impl AdminEnvironmentDirectory {
    pub fn new() -> Self {
        let api_base = std::env::var(ADMIN_API_BASE_ENV)
            .ok()
            .filter(|v| !v.trim().is_empty())
            .unwrap_or_else(|| ADMIN_API_RESOURCE.to_string());
        Self::with_api_base(api_base)
    }

    pub fn with_api_base(api_base: impl Into<String>) -> Self {
        Self {
            api_base: api_base.into(),
        }
    }

    fn endpoint(&self) -> String {
        format!(
            "{}{ADMIN_ENVIRONMENTS_PATH}",
            self.api_base.trim_end_matches('/')
        )
    }
}

impl Default for AdminEnvironmentDirectory {
    fn default() -> Self {
        Self::new()
    }
}

impl EnvironmentDirectory for AdminEnvironmentDirectory {
    fn list_environments(
        &self,
        credential: &dyn TokenCredential,
    ) -> Result<Vec<DiscoveredEnvironment>, DiscoveryError> {
        let token = credential
            .token(&scope_for(ADMIN_API_RESOURCE))
            .map_err(|err: CredentialError| DiscoveryError::Credential(err.to_string()))?;
        let body = get_json(&self.endpoint(), &token.token)?;
        parse_environment_list(body)
    }
}

/// Records without an instance URL are kept; the cache skips them.
pub fn parse_environment_list(body: Value) -> Result<Vec<DiscoveredEnvironment>, DiscoveryError> {
    let list: EnvironmentList =
        serde_json::from_value(body).map_err(|err| DiscoveryError::Decode(err.to_string()))?;
    Ok(list
        .value
        .into_iter()
        .map(|record| {
            let props = record.properties;
            DiscoveredEnvironment {
                id: record.name,
                display_name: props.display_name.unwrap_or_default(),
                location: props.azure_region.or(record.location),
                instance_url: props
                    .linked_environment_metadata
                    .and_then(|meta| meta.instance_url)
                    .unwrap_or_default(),
                runtime_endpoints: props
                    .runtime_endpoints
                    .into_iter()
                    .filter_map(|(capability, value)| {
                        value.as_str().map(|url| (capability, url.to_string()))
                    })
                    .collect(),
            }
        })
        .collect())
}
