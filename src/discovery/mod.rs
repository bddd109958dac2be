pub mod credential;
pub mod directory;
pub mod region;

pub use credential::{
    scope_for, token_identity, AccessToken, AzureCliCredential, CredentialError, TokenCredential,
    TokenIdentity,
};
pub use directory::{AdminEnvironmentDirectory, EnvironmentDirectory, ADMIN_API_RESOURCE};
pub use region::{match_region, regional_flow_base, DEFAULT_FLOW_API_BASE, REGION_TABLE};

use crate::shared::http::HttpError;
use crate::shared::{DiagnosticLog, Resolution};
use std::collections::{BTreeMap, HashMap, HashSet};
use std::fmt;

/// Runtime endpoint key for the workflow service.
pub const FLOW_CAPABILITY: &str = "microsoft.Flow";

#[derive(Debug, thiserror::Error)]
pub enum DiscoveryError {
    #[error("admin token unavailable: {0}")]
    Credential(String),
    #[error("admin environment lookup failed: {0}")]
    Http(#[from] HttpError),
    #[error("unexpected admin environment payload: {0}")]
    Decode(String),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DiscoveredEnvironment {
    pub id: String,
    pub display_name: String,
    pub location: Option<String>,
    pub instance_url: String,
    pub runtime_endpoints: BTreeMap<String, String>,
}

impl DiscoveredEnvironment {
    pub fn endpoint(&self, capability: &str) -> Option<&str> {
        self.runtime_endpoints
            .get(capability)
            .map(String::as_str)
            .filter(|url| !url.trim().is_empty())
    }
}

/// Cache key form of an environment URL.
pub fn normalize_url(url: &str) -> String {
    url.trim().trim_end_matches('/').to_ascii_lowercase()
}

/// Environments indexed by normalized instance URL.
#[derive(Debug, Default)]
pub struct DiscoveryCache {
    entries: HashMap<String, DiscoveredEnvironment>,
}

impl DiscoveryCache {
    pub fn get(&self, url: &str) -> Option<&DiscoveredEnvironment> {
        self.entries.get(&normalize_url(url))
    }

    pub fn insert(&mut self, env: DiscoveredEnvironment) -> bool {
        let key = normalize_url(&env.instance_url);
        if key.is_empty() {
            return false;
        }
        self.entries.insert(key, env);
        true
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ApiBaseSource {
    Discovered,
    Heuristic {
        domain: &'static str,
        region: &'static str,
    },
    Default,
}

impl fmt::Display for ApiBaseSource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Discovered => f.write_str("discovered"),
            Self::Heuristic { domain, .. } => write!(f, "heuristic from {domain}"),
            Self::Default => f.write_str("default"),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ApiBase {
    pub url: String,
    pub source: ApiBaseSource,
}

impl fmt::Display for ApiBase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.url)
    }
}

#[derive(Debug, Clone, Copy)]
enum ApiBaseStrategy {
    Discovered,
    Heuristic,
}

const API_BASE_STRATEGIES: [ApiBaseStrategy; 2] =
    [ApiBaseStrategy::Discovered, ApiBaseStrategy::Heuristic];

/// One invocation's credential plus the environment topology learned so far.
pub struct Session {
    credential: Box<dyn TokenCredential>,
    directory: Box<dyn EnvironmentDirectory>,
    cache: DiscoveryCache,
    /// Normalized URLs already sent to the directory this session.
    attempted: HashSet<String>,
    log: DiagnosticLog,
}

impl Session {
    pub fn new(credential: impl TokenCredential + 'static, log: DiagnosticLog) -> Self {
        Self {
            credential: Box::new(credential),
            directory: Box::new(AdminEnvironmentDirectory::new()),
            cache: DiscoveryCache::default(),
            attempted: HashSet::new(),
            log,
        }
    }

    pub fn with_directory(mut self, directory: impl EnvironmentDirectory + 'static) -> Self {
        self.directory = Box::new(directory);
        self
    }

    pub fn credential(&self) -> &dyn TokenCredential {
        self.credential.as_ref()
    }

    pub fn log(&self) -> &DiagnosticLog {
        &self.log
    }

    pub fn cache(&self) -> &DiscoveryCache {
        &self.cache
    }

    /// Topology for `url`, from the memo or a fresh admin listing. Lookup
    /// failures are logged and yield `None`; the memo is left intact. A URL
    /// is listed at most once per session, so a miss or failure is final.
    pub fn discover(&mut self, url: &str) -> Option<DiscoveredEnvironment> {
        match self.lookup(url) {
            Resolution::Found(env) => Some(env),
            Resolution::NotFound => None,
            Resolution::Failed(reason) => {
                self.log.warn(
                    "discovery.lookup_failed",
                    format!("environment lookup failed: {reason}"),
                );
                None
            }
        }
    }

    fn lookup(&mut self, url: &str) -> Resolution<DiscoveredEnvironment> {
        if let Some(env) = self.cache.get(url) {
            return Resolution::Found(env.clone());
        }
        if !self.attempted.insert(normalize_url(url)) {
            return Resolution::NotFound;
        }

        let environments = match self.directory.list_environments(self.credential.as_ref()) {
            Ok(environments) => environments,
            Err(err) => return Resolution::Failed(err.to_string()),
        };
        let mut indexed = 0;
        for env in environments {
            if self.cache.insert(env) {
                indexed += 1;
            }
        }
        self.log.info(
            "discovery.indexed",
            format!("indexed {indexed} environment(s) from admin listing"),
        );

        Resolution::from_option(self.cache.get(url).cloned())
    }

    /// Workflow API base for `url`: discovered endpoint, then the regional
    /// host table, then the global default.
    pub fn discover_api_base(&mut self, url: &str) -> ApiBase {
        for strategy in API_BASE_STRATEGIES {
            if let Some(base) = self.try_api_base(strategy, url).found() {
                self.log.info(
                    "discovery.api_base",
                    format!("Flow API: {} ({})", base.url, base.source),
                );
                return base;
            }
        }

        let base = ApiBase {
            url: DEFAULT_FLOW_API_BASE.to_string(),
            source: ApiBaseSource::Default,
        };
        self.log.info(
            "discovery.api_base",
            format!("Flow API: {} ({})", base.url, base.source),
        );
        base
    }

    fn try_api_base(&mut self, strategy: ApiBaseStrategy, url: &str) -> Resolution<ApiBase> {
        match strategy {
            ApiBaseStrategy::Discovered => {
                let endpoint = self.discover(url).and_then(|env| {
                    env.endpoint(FLOW_CAPABILITY)
                        .map(|endpoint| endpoint.trim_end_matches('/').to_string())
                });
                Resolution::from_option(endpoint.map(|url| ApiBase {
                    url,
                    source: ApiBaseSource::Discovered,
                }))
            }
            ApiBaseStrategy::Heuristic => {
                let matched = region::host_of(url).and_then(|host| match_region(&host));
                Resolution::from_option(matched.map(|(domain, region)| ApiBase {
                    url: regional_flow_base(region),
                    source: ApiBaseSource::Heuristic { domain, region },
                }))
            }
        }
    }

    pub fn resolve_environment_id(&mut self, url: &str) -> Option<String> {
        self.discover(url).map(|env| env.id)
    }
}
