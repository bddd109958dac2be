use super::provider::FIELD_ENVIRONMENT_URL;
use super::{ConfigError, Connection, EffectiveConnection, PersistedStore, Provider};
use crate::shared::DiagnosticLog;
use std::collections::BTreeMap;

/// Source of environment variables for the lowest-precedence tier.
pub trait EnvLookup {
    fn var(&self, key: &str) -> Option<String>;
}

#[derive(Debug, Clone, Copy, Default)]
pub struct ProcessEnv;

impl EnvLookup for ProcessEnv {
    fn var(&self, key: &str) -> Option<String> {
        std::env::var(key).ok().filter(|v| !v.trim().is_empty())
    }
}

impl EnvLookup for BTreeMap<String, String> {
    fn var(&self, key: &str) -> Option<String> {
        self.get(key).filter(|v| !v.trim().is_empty()).cloned()
    }
}

/// Merges overrides, workspace, global default and environment into one
/// connection, field by field.
pub struct ConnectionResolver {
    store: PersistedStore,
    env: Box<dyn EnvLookup>,
    log: DiagnosticLog,
}

impl ConnectionResolver {
    pub fn new(store: PersistedStore, log: DiagnosticLog) -> Self {
        Self {
            store,
            env: Box::new(ProcessEnv),
            log,
        }
    }

    pub fn with_env(mut self, env: impl EnvLookup + 'static) -> Self {
        self.env = Box::new(env);
        self
    }

    pub fn store(&self) -> &PersistedStore {
        &self.store
    }

    /// Never fails: unreadable documents count as empty and unresolved
    /// fields stay empty. Judging completeness is the readiness check's job.
    pub fn resolve(&self, provider: Provider, overrides: Option<&Connection>) -> EffectiveConnection {
        let connections = self.or_empty("connection store", self.store.load_connections());
        let workspace = self.or_empty("workspace config", self.store.load_workspace());
        let config = self.or_empty("global config", self.store.load_global_config());

        let mut fields = Connection::new();
        if let Some(overrides) = overrides {
            for (field, value) in overrides {
                if !value.trim().is_empty() {
                    fields.insert(field.clone(), value.clone());
                }
            }
        }

        let named = [workspace.connection_for(provider), config.default_for(provider)];
        for name in named.into_iter().flatten() {
            if let Some(stored) = connections.get(provider, name) {
                for (field, value) in stored {
                    fill_if_unset(&mut fields, field, value);
                }
            }
        }

        if provider == Provider::Dataverse {
            if let Some(url) = workspace.environment_url() {
                fill_if_unset(&mut fields, FIELD_ENVIRONMENT_URL, url);
            }
        }

        for (var, field) in provider.env_fallbacks() {
            let value = self.env.var(var).unwrap_or_default();
            fill_if_unset(&mut fields, field, &value);
        }

        EffectiveConnection::new(provider, fields)
    }

    fn or_empty<T: Default>(&self, what: &str, loaded: Result<T, ConfigError>) -> T {
        loaded.unwrap_or_else(|err| {
            self.log
                .warn("config.load_failed", format!("ignoring {what}: {err}"));
            T::default()
        })
    }
}

fn fill_if_unset(fields: &mut Connection, field: &str, value: &str) {
    let slot = fields.entry(field.to_string()).or_default();
    if slot.trim().is_empty() {
        *slot = value.to_string();
    }
}
