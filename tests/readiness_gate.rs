use opskit::config::{ConfigPaths, Connection, ConnectionResolver, PersistedStore, Provider};
use opskit::readiness::toolchain::Toolchain;
use opskit::readiness::ReadinessChecker;
use opskit::shared::DiagnosticLog;
use std::collections::BTreeMap;
use std::fs;
use std::path::{Path, PathBuf};
use tempfile::tempdir;

struct LoggedInToolchain {
    interpreter: Option<PathBuf>,
}

impl Toolchain for LoggedInToolchain {
    fn cli_installed(&self) -> bool {
        true
    }

    fn devops_extension_installed(&self) -> bool {
        true
    }

    fn logged_in_account(&self) -> Option<String> {
        Some("ops@contoso.com".to_string())
    }

    fn interpreter(&self) -> Option<PathBuf> {
        self.interpreter.clone()
    }

    fn packages_importable(&self, _interpreter: &Path) -> bool {
        true
    }
}

fn checker(root: &Path, env: BTreeMap<String, String>, interpreter: Option<PathBuf>) -> ReadinessChecker {
    let paths = ConfigPaths::at(root.join("state")).with_working_dir(root.join("project"));
    let resolver = ConnectionResolver::new(PersistedStore::new(paths), DiagnosticLog::memory())
        .with_env(env);
    ReadinessChecker::new(resolver, LoggedInToolchain { interpreter })
}

#[test]
fn global_default_and_environment_merge_into_one_connection() {
    let dir = tempdir().expect("tempdir");
    let state = dir.path().join("state");
    fs::create_dir_all(&state).expect("state dir");
    fs::write(state.join("config.json"), r#"{"defaults":{"jira":"main"}}"#).expect("config");
    fs::write(
        state.join("connections.json"),
        r#"{"jira":{"main":{"server":"https://a.atlassian.net","email":"a@x.com"}}}"#,
    )
    .expect("connections");

    let env = BTreeMap::from([("JIRA_API_TOKEN".to_string(), "tok123".to_string())]);
    let connection = checker(dir.path(), env, None)
        .ensure_ready(Provider::Jira, None)
        .expect("jira ready");

    let expected = Connection::from([
        ("api_token".to_string(), "tok123".to_string()),
        ("email".to_string(), "a@x.com".to_string()),
        ("server".to_string(), "https://a.atlassian.net".to_string()),
    ]);
    assert_eq!(connection.fields(), &expected);
}

#[test]
fn dataverse_is_ready_without_tenant_or_environment_url() {
    let dir = tempdir().expect("tempdir");
    let status = checker(dir.path(), BTreeMap::new(), Some(dir.path().join("python3")))
        .check(Provider::Dataverse);

    assert!(status.ready);
    let names: Vec<&str> = status.checks.iter().map(|c| c.name.as_str()).collect();
    assert_eq!(
        names,
        vec![
            "Virtual environment",
            "Dataverse packages",
            "Azure CLI login",
            "Tenant ID",
            "Environment URL"
        ]
    );
    assert!(!status.checks[3].passed);
    assert!(!status.checks[4].passed);
}

#[test]
fn dataverse_without_interpreter_is_not_ready() {
    let dir = tempdir().expect("tempdir");
    let failure = checker(dir.path(), BTreeMap::new(), None)
        .ensure_ready(Provider::Dataverse, None)
        .expect_err("not ready");
    assert!(failure
        .diagnostics()
        .starts_with("ERROR: dataverse provider is not configured."));
}
