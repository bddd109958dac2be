use crate::config::ConfigPaths;
use crate::shared::subprocess::{is_binary_available, run_with_timeout, COMPANION_TIMEOUT};
use std::path::{Path, PathBuf};
use std::time::Duration;

pub const AZ_BIN_ENV: &str = "OPSKIT_AZ_BIN";
pub const DEFAULT_AZ_BIN: &str = "az";
pub const DEVOPS_EXTENSION: &str = "azure-devops";
pub const REQUIRED_PACKAGES_IMPORT: &str = "import azure.identity; import PowerPlatform.Dataverse";
pub const REQUIRED_PACKAGES_LABEL: &str = "azure-identity, PowerPlatform-Dataverse-Client";

/// Local prerequisites inspected by readiness checks. A check that cannot run
/// (missing binary, timeout) reports the negative answer.
pub trait Toolchain {
    fn cli_installed(&self) -> bool;
    fn devops_extension_installed(&self) -> bool;
    /// Account name of the active companion CLI login.
    fn logged_in_account(&self) -> Option<String>;
    /// Interpreter inside the isolated environment, when it exists.
    fn interpreter(&self) -> Option<PathBuf>;
    fn packages_importable(&self, interpreter: &Path) -> bool;
}

#[derive(Debug, Clone)]
pub struct SystemToolchain {
    az_binary: String,
    venv_python: PathBuf,
    timeout: Duration,
}

impl SystemToolchain {
    pub fn new(paths: &ConfigPaths) -> Self {
        let az_binary = std::env::var(AZ_BIN_ENV)
            .ok()
            .filter(|v| !v.trim().is_empty())
            .unwrap_or_else(|| DEFAULT_AZ_BIN.to_string());
        Self {
            az_binary,
            venv_python: paths.venv_python(),
            timeout: COMPANION_TIMEOUT,
        }
    }

    pub fn with_az_binary(mut self, binary: impl Into<String>) -> Self {
        self.az_binary = binary.into();
        self
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    pub fn az_binary(&self) -> &str {
        &self.az_binary
    }

    fn az(&self, args: &[&str]) -> Option<String> {
        if !self.cli_installed() {
            return None;
        }
        let output = run_with_timeout(&self.az_binary, args, self.timeout).ok()?;
        output.success.then(|| output.trimmed_stdout().to_string())
    }
}

impl Toolchain for SystemToolchain {
    fn cli_installed(&self) -> bool {
        is_binary_available(&self.az_binary)
    }

    fn devops_extension_installed(&self) -> bool {
        self.az(&["extension", "show", "--name", DEVOPS_EXTENSION, "-o", "json"])
            .is_some()
    }

    fn logged_in_account(&self) -> Option<String> {
        self.az(&["account", "show", "--query", "user.name", "-o", "tsv"])
            .filter(|account| !account.is_empty())
    }

    fn interpreter(&self) -> Option<PathBuf> {
        self.venv_python
            .exists()
            .then(|| self.venv_python.clone())
    }

    fn packages_importable(&self, interpreter: &Path) -> bool {
        let Some(binary) = interpreter.to_str() else {
            return false;
        };
        run_with_timeout(binary, &["-c", REQUIRED_PACKAGES_IMPORT], self.timeout)
            .map(|output| output.success)
            .unwrap_or(false)
    }
}

#[cfg(all(test, unix))]
mod tests {
    use super::*;
    use std::fs;
    use std::os::unix::fs::PermissionsExt;
    use std::time::Instant;
    use tempfile::tempdir;

    fn write_script(path: &Path, body: &str) {
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent).expect("parent");
        }
        fs::write(path, body).expect("write script");
        let mut perms = fs::metadata(path).expect("metadata").permissions();
        perms.set_mode(0o755);
        fs::set_permissions(path, perms).expect("chmod");
    }

    #[test]
    fn stub_az_reports_login_and_extension() {
        let dir = tempdir().expect("tempdir");
        let az = dir.path().join("az");
        write_script(
            &az,
            "#!/bin/sh\nif [ \"$1\" = account ]; then echo ops@contoso.com; exit 0; fi\nif [ \"$1\" = extension ]; then echo '{}'; exit 0; fi\nexit 1\n",
        );
        let toolchain = SystemToolchain::new(&ConfigPaths::at(dir.path()))
            .with_az_binary(az.display().to_string());

        assert!(toolchain.cli_installed());
        assert!(toolchain.devops_extension_installed());
        assert_eq!(toolchain.logged_in_account().as_deref(), Some("ops@contoso.com"));
    }

    #[test]
    fn logged_out_az_yields_no_account() {
        let dir = tempdir().expect("tempdir");
        let az = dir.path().join("az");
        write_script(&az, "#!/bin/sh\necho 'Please run az login' >&2\nexit 1\n");
        let toolchain = SystemToolchain::new(&ConfigPaths::at(dir.path()))
            .with_az_binary(az.display().to_string());

        assert!(toolchain.cli_installed());
        assert_eq!(toolchain.logged_in_account(), None);
        assert!(!toolchain.devops_extension_installed());
    }

    #[test]
    fn missing_az_is_treated_as_not_logged_in() {
        let dir = tempdir().expect("tempdir");
        let toolchain = SystemToolchain::new(&ConfigPaths::at(dir.path()))
            .with_az_binary(dir.path().join("missing-az").display().to_string());

        assert!(!toolchain.cli_installed());
        assert_eq!(toolchain.logged_in_account(), None);
    }

    #[test]
    fn hung_az_times_out_as_not_logged_in() {
        let dir = tempdir().expect("tempdir");
        let az = dir.path().join("az");
        // Wrapper that does not exec, like the real az script.
        write_script(&az, "#!/bin/sh\nsleep 4\ntrue\n");
        let toolchain = SystemToolchain::new(&ConfigPaths::at(dir.path()))
            .with_az_binary(az.display().to_string())
            .with_timeout(Duration::from_millis(100));

        let started = Instant::now();
        assert_eq!(toolchain.logged_in_account(), None);
        assert!(started.elapsed() < Duration::from_secs(2));
    }

    #[test]
    fn venv_interpreter_and_package_import() {
        let dir = tempdir().expect("tempdir");
        let paths = ConfigPaths::at(dir.path());
        let toolchain = SystemToolchain::new(&paths);
        assert_eq!(toolchain.interpreter(), None);

        write_script(&paths.venv_python(), "#!/bin/sh\nexit 0\n");
        let interpreter = toolchain.interpreter().expect("interpreter");
        assert!(toolchain.packages_importable(&interpreter));

        write_script(&paths.venv_python(), "#!/bin/sh\nexit 1\n");
        assert!(!toolchain.packages_importable(&interpreter));
    }
}
