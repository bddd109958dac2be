use crate::readiness::toolchain::{AZ_BIN_ENV, DEFAULT_AZ_BIN};
use crate::shared::subprocess::{run_with_timeout, CommandError, COMPANION_TIMEOUT};
use base64::Engine as _;
use serde::Deserialize;
use std::cell::RefCell;
use std::collections::HashMap;
use std::time::Duration;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AccessToken {
    pub token: String,
    pub expires_on: Option<String>,
}

#[derive(Debug, thiserror::Error)]
pub enum CredentialError {
    #[error("credential tool unavailable: {0}")]
    ToolUnavailable(#[from] CommandError),
    #[error("token request for {audience} was rejected: {reason}")]
    Rejected { audience: String, reason: String },
    #[error("unexpected token response for {audience}: {reason}")]
    InvalidResponse { audience: String, reason: String },
}

/// Audience-parameterized token acquisition. Audiences are resource URLs,
/// optionally with a `/.default` scope suffix.
pub trait TokenCredential {
    fn token(&self, audience: &str) -> Result<AccessToken, CredentialError>;
}

/// `<resource>/.default`, the scope form of a resource audience.
pub fn scope_for(resource: &str) -> String {
    format!("{}/.default", resource.trim_end_matches('/'))
}

fn resource_of(audience: &str) -> &str {
    audience
        .trim_end_matches("/.default")
        .trim_end_matches('/')
}

/// Tokens from the companion CLI's cached login. Each resource is fetched
/// once per credential.
#[derive(Debug, Clone)]
pub struct AzureCliCredential {
    az_binary: String,
    tenant_id: Option<String>,
    timeout: Duration,
    issued: RefCell<HashMap<String, AccessToken>>,
}

#[derive(Debug, Deserialize)]
struct CliTokenResponse {
    #[serde(rename = "accessToken")]
    access_token: String,
    #[serde(default, rename = "expiresOn")]
    expires_on: Option<String>,
}

impl AzureCliCredential {
    pub fn new() -> Self {
        let az_binary = std::env::var(AZ_BIN_ENV)
            .ok()
            .filter(|v| !v.trim().is_empty())
            .unwrap_or_else(|| DEFAULT_AZ_BIN.to_string());
        Self {
            az_binary,
            tenant_id: None,
            timeout: COMPANION_TIMEOUT,
            issued: RefCell::new(HashMap::new()),
        }
    }

    pub fn with_tenant(mut self, tenant_id: Option<String>) -> Self {
        self.tenant_id = tenant_id.filter(|t| !t.trim().is_empty());
        self
    }

    pub fn with_az_binary(mut self, binary: impl Into<String>) -> Self {
        self.az_binary = binary.into();
        self
    }
}

impl Default for AzureCliCredential {
    fn default() -> Self {
        Self::new()
    }
}

impl TokenCredential for AzureCliCredential {
    fn token(&self, audience: &str) -> Result<AccessToken, CredentialError> {
        let resource = resource_of(audience);
        if let Some(token) = self.issued.borrow().get(resource) {
            return Ok(token.clone());
        }
        let mut args = vec!["account", "get-access-token", "--resource", resource, "-o", "json"];
        if let Some(tenant) = self.tenant_id.as_deref() {
            args.extend(["--tenant", tenant]);
        }

        let output = run_with_timeout(&self.az_binary, &args, self.timeout)?;
        if !output.success {
            return Err(CredentialError::Rejected {
                audience: audience.to_string(),
                reason: output.stderr.trim().to_string(),
            });
        }
        let parsed: CliTokenResponse =
            serde_json::from_str(&output.stdout).map_err(|err| {
                CredentialError::InvalidResponse {
                    audience: audience.to_string(),
                    reason: err.to_string(),
                }
            })?;
        let token = AccessToken {
            token: parsed.access_token,
            expires_on: parsed.expires_on,
        };
        self.issued
            .borrow_mut()
            .insert(resource.to_string(), token.clone());
        Ok(token)
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TokenIdentity {
    pub username: String,
    pub tenant_id: String,
}

/// Reads the caller's identity from a JWT access token without verifying it.
pub fn token_identity(token: &AccessToken) -> Option<TokenIdentity> {
    let payload = token.token.split('.').nth(1)?;
    let decoded = base64::engine::general_purpose::URL_SAFE_NO_PAD
        .decode(payload.trim_end_matches('='))
        .ok()?;
    let claims: serde_json::Value = serde_json::from_slice(&decoded).ok()?;
    let claim = |key: &str| claims.get(key).and_then(|v| v.as_str()).map(str::to_string);
    Some(TokenIdentity {
        username: claim("upn")
            .or_else(|| claim("unique_name"))
            .unwrap_or_else(|| "unknown".to_string()),
        tenant_id: claim("tid").unwrap_or_else(|| "unknown".to_string()),
    })
}
