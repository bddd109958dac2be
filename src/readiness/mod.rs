pub mod gate;
pub mod remediation;
pub mod report;
pub mod toolchain;

use crate::config::provider::{
    FIELD_API_TOKEN, FIELD_EMAIL, FIELD_ENVIRONMENT_URL, FIELD_ORGANIZATION, FIELD_PROJECT,
    FIELD_SERVER, FIELD_TENANT_ID,
};
use crate::config::{ConnectionResolver, EffectiveConnection, Provider};
use remediation::Remediation;
use toolchain::{Toolchain, REQUIRED_PACKAGES_LABEL};

pub use gate::ReadinessFailure;
pub use report::render_status_report;
pub use toolchain::SystemToolchain;

pub const TOKEN_CREATE_URL: &str = "https://id.atlassian.com/manage-profile/security/api-tokens";
pub const AZ_INSTALL_URL: &str = "https://aka.ms/install-azure-cli";

pub const CHECK_AZ_LOGIN: &str = "Azure CLI login";
const NOT_CONFIGURED: &str = "not configured";

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Check {
    pub name: String,
    pub passed: bool,
    pub detail: String,
}

impl Check {
    pub fn new(name: impl Into<String>, passed: bool, detail: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            passed,
            detail: detail.into(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProviderStatus {
    pub provider: Provider,
    pub ready: bool,
    pub checks: Vec<Check>,
    pub instructions: String,
}

impl ProviderStatus {
    pub fn check(&self, name: &str) -> Option<&Check> {
        self.checks.iter().find(|check| check.name == name)
    }

    pub fn failed_checks(&self) -> impl Iterator<Item = &Check> {
        self.checks.iter().filter(|check| !check.passed)
    }
}

/// Runs the fixed, ordered check list for each provider.
pub struct ReadinessChecker {
    resolver: ConnectionResolver,
    toolchain: Box<dyn Toolchain>,
}

impl ReadinessChecker {
    pub fn new(resolver: ConnectionResolver, toolchain: impl Toolchain + 'static) -> Self {
        Self {
            resolver,
            toolchain: Box::new(toolchain),
        }
    }

    pub fn resolver(&self) -> &ConnectionResolver {
        &self.resolver
    }

    pub fn check(&self, provider: Provider) -> ProviderStatus {
        let conn = self.resolver.resolve(provider, None);
        match provider {
            Provider::Jira => check_jira(&conn),
            Provider::Ado => self.check_ado(&conn),
            Provider::Dataverse => self.check_dataverse(&conn),
        }
    }

    pub fn check_all(&self) -> Vec<ProviderStatus> {
        Provider::ALL
            .iter()
            .map(|provider| self.check(*provider))
            .collect()
    }

    fn check_ado(&self, conn: &EffectiveConnection) -> ProviderStatus {
        let az_found = self.toolchain.cli_installed();
        let ext_ok = self.toolchain.devops_extension_installed();
        let account = self.toolchain.logged_in_account();
        let org = conn.get(FIELD_ORGANIZATION);
        let project = conn.get(FIELD_PROJECT);

        let checks = vec![
            Check::new("Azure CLI", az_found, installed(az_found, "not found")),
            Check::new(
                "azure-devops extension",
                ext_ok,
                installed(ext_ok, "not installed"),
            ),
            login_check(account.as_deref()),
            field_check("Organization", org),
            field_check("Project", project),
        ];
        let ready = checks.iter().all(|check| check.passed);
        let instructions = if ready {
            String::new()
        } else {
            Remediation::new("To configure Azure DevOps:")
                .step_if(!az_found, format!("Install Azure CLI: {AZ_INSTALL_URL}"))
                .step_if(!ext_ok, "az extension add --name azure-devops")
                .step_if(account.is_none(), "az login")
                .step_if(
                    org.is_none() || project.is_none(),
                    "opskit add-connection ado <name> --organization <url> --project <name>",
                )
                .render()
        };

        ProviderStatus {
            provider: Provider::Ado,
            ready,
            checks,
            instructions,
        }
    }

    fn check_dataverse(&self, conn: &EffectiveConnection) -> ProviderStatus {
        let interpreter = self.toolchain.interpreter();
        let packages = interpreter
            .as_deref()
            .map(|path| self.toolchain.packages_importable(path))
            .unwrap_or(false);
        let account = self.toolchain.logged_in_account();
        let tenant = conn.get(FIELD_TENANT_ID);
        let env_url = conn.get(FIELD_ENVIRONMENT_URL);

        let checks = vec![
            Check::new(
                "Virtual environment",
                interpreter.is_some(),
                interpreter
                    .as_ref()
                    .map(|path| path.display().to_string())
                    .unwrap_or_else(|| "not created".to_string()),
            ),
            Check::new(
                "Dataverse packages",
                packages,
                if packages {
                    "installed".to_string()
                } else {
                    format!("missing ({REQUIRED_PACKAGES_LABEL})")
                },
            ),
            login_check(account.as_deref()),
            field_check("Tenant ID", tenant),
            Check::new(
                "Environment URL",
                env_url.is_some(),
                env_url.unwrap_or("set per workspace in ops/opskit.json"),
            ),
        ];
        // Only local prerequisites gate readiness; tenant and URL are reported.
        let ready = checks[..3].iter().all(|check| check.passed);
        let instructions = if ready {
            String::new()
        } else {
            Remediation::new("To configure Dataverse:")
                .step_if(
                    interpreter.is_none() || !packages,
                    format!(
                        "Create the virtual environment at {} with {REQUIRED_PACKAGES_LABEL} installed",
                        self.resolver.store().paths().venv_dir.display()
                    ),
                )
                .step_if(account.is_none(), "az login")
                .step_if(
                    tenant.is_none(),
                    "opskit add-connection dataverse <name> --tenant-id <id>",
                )
                .render()
        };

        ProviderStatus {
            provider: Provider::Dataverse,
            ready,
            checks,
            instructions,
        }
    }
}

fn check_jira(conn: &EffectiveConnection) -> ProviderStatus {
    let token_set = conn.has(FIELD_API_TOKEN);
    let checks = vec![
        field_check("Server URL", conn.get(FIELD_SERVER)),
        field_check("Email", conn.get(FIELD_EMAIL)),
        Check::new(
            "API token",
            token_set,
            if token_set { "configured" } else { NOT_CONFIGURED },
        ),
    ];
    let ready = checks.iter().all(|check| check.passed);
    let instructions = if ready {
        String::new()
    } else {
        Remediation::new("To configure Jira:")
            .step_if(
                true,
                "opskit add-connection jira <name> --server <url> --email <email> --api-token <token>",
            )
            .note("Or set environment variables:")
            .note("  JIRA_SERVER=https://yourcompany.atlassian.net")
            .note("  JIRA_EMAIL=you@company.com")
            .note("  JIRA_API_TOKEN=<token>")
            .note(format!("  Create a token at: {TOKEN_CREATE_URL}"))
            .render()
    };

    ProviderStatus {
        provider: Provider::Jira,
        ready,
        checks,
        instructions,
    }
}

fn field_check(name: &str, value: Option<&str>) -> Check {
    Check::new(name, value.is_some(), value.unwrap_or(NOT_CONFIGURED))
}

fn login_check(account: Option<&str>) -> Check {
    Check::new(CHECK_AZ_LOGIN, account.is_some(), account.unwrap_or("not logged in"))
}

fn installed(ok: bool, otherwise: &str) -> String {
    if ok { "installed" } else { otherwise }.to_string()
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;
    use crate::config::{ConfigPaths, PersistedStore};
    use crate::shared::DiagnosticLog;
    use std::collections::BTreeMap;
    use std::path::{Path, PathBuf};
    use tempfile::tempdir;

    #[derive(Debug, Clone, Default)]
    pub(crate) struct FakeToolchain {
        pub cli: bool,
        pub extension: bool,
        pub account: Option<String>,
        pub interpreter: Option<PathBuf>,
        pub packages: bool,
    }

    impl FakeToolchain {
        pub(crate) fn all_ok() -> Self {
            Self {
                cli: true,
                extension: true,
                account: Some("ops@contoso.com".to_string()),
                interpreter: Some(PathBuf::from("/opt/opskit/.venv/bin/python3")),
                packages: true,
            }
        }
    }

    impl Toolchain for FakeToolchain {
        fn cli_installed(&self) -> bool {
            self.cli
        }
        fn devops_extension_installed(&self) -> bool {
            self.extension
        }
        fn logged_in_account(&self) -> Option<String> {
            self.account.clone()
        }
        fn interpreter(&self) -> Option<PathBuf> {
            self.interpreter.clone()
        }
        fn packages_importable(&self, _interpreter: &Path) -> bool {
            self.packages
        }
    }

    fn checker(dir: &Path, toolchain: FakeToolchain, env: &[(&str, &str)]) -> ReadinessChecker {
        let store = PersistedStore::new(
            ConfigPaths::at(dir.join("state")).with_working_dir(dir.join("cwd")),
        );
        let env: BTreeMap<String, String> = env
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        let resolver = ConnectionResolver::new(store, DiagnosticLog::memory()).with_env(env);
        ReadinessChecker::new(resolver, toolchain)
    }

    #[test]
    fn jira_is_ready_only_with_all_three_fields() {
        let dir = tempdir().expect("tempdir");
        let status = checker(
            dir.path(),
            FakeToolchain::default(),
            &[
                ("JIRA_SERVER", "https://a.atlassian.net"),
                ("JIRA_EMAIL", "a@x.com"),
                ("JIRA_API_TOKEN", "tok"),
            ],
        )
        .check(Provider::Jira);
        assert!(status.ready);
        assert!(status.instructions.is_empty());
        assert_eq!(status.check("API token").map(|c| c.detail.as_str()), Some("configured"));

        let status = checker(
            dir.path(),
            FakeToolchain::default(),
            &[("JIRA_SERVER", "https://a.atlassian.net"), ("JIRA_EMAIL", "a@x.com")],
        )
        .check(Provider::Jira);
        assert!(!status.ready);
        assert_eq!(status.failed_checks().count(), 1);
        assert!(status.instructions.contains("JIRA_API_TOKEN=<token>"));
        assert!(status.instructions.contains(TOKEN_CREATE_URL));
    }

    #[test]
    fn ado_requires_all_five_checks() {
        let dir = tempdir().expect("tempdir");
        let checker = checker(dir.path(), FakeToolchain::all_ok(), &[]);
        let status = checker.check(Provider::Ado);

        let names: Vec<&str> = status.checks.iter().map(|c| c.name.as_str()).collect();
        assert_eq!(
            names,
            vec![
                "Azure CLI",
                "azure-devops extension",
                "Azure CLI login",
                "Organization",
                "Project"
            ]
        );
        assert!(!status.ready);
        assert_eq!(
            status.instructions,
            "To configure Azure DevOps:\n  1. opskit add-connection ado <name> --organization <url> --project <name>"
        );
    }

    #[test]
    fn ado_remediation_numbers_only_failed_prerequisites() {
        let dir = tempdir().expect("tempdir");
        let toolchain = FakeToolchain {
            cli: true,
            extension: false,
            account: None,
            ..FakeToolchain::default()
        };
        let status = checker(dir.path(), toolchain, &[]).check(Provider::Ado);
        assert_eq!(
            status.instructions.lines().collect::<Vec<_>>(),
            vec![
                "To configure Azure DevOps:",
                "  1. az extension add --name azure-devops",
                "  2. az login",
                "  3. opskit add-connection ado <name> --organization <url> --project <name>",
            ]
        );
    }

    #[test]
    fn dataverse_ready_without_tenant_or_environment_url() {
        let dir = tempdir().expect("tempdir");
        let status = checker(dir.path(), FakeToolchain::all_ok(), &[]).check(Provider::Dataverse);

        assert!(status.ready);
        assert!(!status.check("Tenant ID").expect("tenant").passed);
        assert!(!status.check("Environment URL").expect("env url").passed);
        assert_eq!(
            status.check("Environment URL").map(|c| c.detail.as_str()),
            Some("set per workspace in ops/opskit.json")
        );
    }

    #[test]
    fn dataverse_not_ready_without_packages_or_login() {
        let dir = tempdir().expect("tempdir");
        let toolchain = FakeToolchain {
            packages: false,
            ..FakeToolchain::all_ok()
        };
        let status = checker(dir.path(), toolchain, &[]).check(Provider::Dataverse);
        assert!(!status.ready);
        assert!(status.instructions.contains("1. Create the virtual environment"));
        assert!(status.instructions.contains("2. opskit add-connection dataverse"));

        let toolchain = FakeToolchain {
            account: None,
            ..FakeToolchain::all_ok()
        };
        let status = checker(dir.path(), toolchain, &[]).check(Provider::Dataverse);
        assert!(!status.ready);
        assert!(status.instructions.contains("1. az login"));
    }

    #[test]
    fn dataverse_packages_fail_when_interpreter_missing() {
        let dir = tempdir().expect("tempdir");
        let toolchain = FakeToolchain {
            interpreter: None,
            ..FakeToolchain::all_ok()
        };
        let status = checker(dir.path(), toolchain, &[]).check(Provider::Dataverse);
        assert!(!status.check("Dataverse packages").expect("packages").passed);
        assert_eq!(
            status.check("Virtual environment").map(|c| c.detail.as_str()),
            Some("not created")
        );
    }

    #[test]
    fn check_all_covers_every_provider_in_order() {
        let dir = tempdir().expect("tempdir");
        let statuses = checker(dir.path(), FakeToolchain::default(), &[]).check_all();
        let providers: Vec<Provider> = statuses.iter().map(|s| s.provider).collect();
        assert_eq!(providers, Provider::ALL.to_vec());
    }
}
