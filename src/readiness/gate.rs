use super::{ProviderStatus, ReadinessChecker};
use crate::config::{Connection, EffectiveConnection, Provider};

#[derive(Debug, Clone, thiserror::Error)]
#[error("{} provider is not configured", .status.provider)]
pub struct ReadinessFailure {
    pub status: ProviderStatus,
}

impl ReadinessFailure {
    /// Itemized verdicts followed by remediation, as written to stderr.
    pub fn diagnostics(&self) -> String {
        let mut lines = vec![format!("ERROR: {self}."), String::new()];
        for check in &self.status.checks {
            let mark = if check.passed { "✓" } else { "✗" };
            lines.push(format!("  {mark} {}: {}", check.name, check.detail));
        }
        if !self.status.instructions.is_empty() {
            lines.push(String::new());
            lines.push(self.status.instructions.clone());
        }
        lines.join("\n")
    }
}

impl ReadinessChecker {
    /// Check, then resolve. Skills call this before any external request.
    pub fn ensure_ready(
        &self,
        provider: Provider,
        overrides: Option<&Connection>,
    ) -> Result<EffectiveConnection, ReadinessFailure> {
        let status = self.check(provider);
        if !status.ready {
            return Err(ReadinessFailure { status });
        }
        Ok(self.resolver().resolve(provider, overrides))
    }

    /// Like [`ReadinessChecker::ensure_ready`], but prints the diagnostics
    /// and exits with status 1 when the provider is not ready.
    pub fn require(&self, provider: Provider, overrides: Option<&Connection>) -> EffectiveConnection {
        match self.ensure_ready(provider, overrides) {
            Ok(conn) => conn,
            Err(failure) => {
                eprintln!("{}", failure.diagnostics());
                std::process::exit(1);
            }
        }
    }
}
