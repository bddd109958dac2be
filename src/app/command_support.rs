use crate::config::{
    ConfigError, ConfigPaths, Connection, ConnectionResolver, PersistedStore, Provider,
};
use crate::readiness::{ReadinessChecker, SystemToolchain};
use crate::shared::DiagnosticLog;
use std::collections::BTreeMap;

pub fn map_config_err(err: ConfigError) -> String {
    err.to_string()
}

/// Paths and diagnostics shared by every command of one invocation.
#[derive(Debug, Clone)]
pub struct CommandContext {
    pub paths: ConfigPaths,
    pub log: DiagnosticLog,
}

impl CommandContext {
    pub fn from_env() -> Result<Self, String> {
        let paths = ConfigPaths::from_env().map_err(map_config_err)?;
        let log = DiagnosticLog::with_file(paths.log_file.clone());
        Ok(Self { paths, log })
    }

    pub fn store(&self) -> PersistedStore {
        PersistedStore::new(self.paths.clone())
    }

    pub fn resolver(&self) -> ConnectionResolver {
        ConnectionResolver::new(self.store(), self.log.clone())
    }

    pub fn readiness(&self) -> ReadinessChecker {
        ReadinessChecker::new(self.resolver(), SystemToolchain::new(&self.paths))
    }
}

pub fn parse_provider(raw: Option<&String>) -> Result<Provider, String> {
    let raw = raw.ok_or_else(|| {
        format!(
            "missing provider; expected one of: {}",
            Provider::ALL.map(Provider::as_str).join(", ")
        )
    })?;
    Provider::parse(raw).map_err(map_config_err)
}

/// Positional arguments plus `--flag value` pairs. Flag names are returned
/// with dashes turned into underscores; only names in `allowed` are accepted.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ParsedArgs {
    pub positionals: Vec<String>,
    pub flags: BTreeMap<String, String>,
}

pub fn parse_args(args: &[String], allowed: &[&str]) -> Result<ParsedArgs, String> {
    let mut parsed = ParsedArgs::default();
    let mut iter = args.iter();
    while let Some(arg) = iter.next() {
        let Some(flag) = arg.strip_prefix("--") else {
            parsed.positionals.push(arg.clone());
            continue;
        };
        let key = flag.replace('-', "_");
        if !allowed.contains(&key.as_str()) {
            return Err(format!("unknown option `{arg}`"));
        }
        let value = iter
            .next()
            .ok_or_else(|| format!("missing value for `{arg}`"))?;
        parsed.flags.insert(key, value.clone());
    }
    Ok(parsed)
}

pub fn positional<'a>(parsed: &'a ParsedArgs, index: usize, what: &str) -> Result<&'a str, String> {
    parsed
        .positionals
        .get(index)
        .map(String::as_str)
        .filter(|v| !v.trim().is_empty())
        .ok_or_else(|| format!("missing {what}"))
}

/// `key=value` lines in key order.
pub fn render_fields(fields: &Connection) -> String {
    fields
        .iter()
        .map(|(key, value)| format!("{key}={value}"))
        .collect::<Vec<_>>()
        .join("\n")
}
