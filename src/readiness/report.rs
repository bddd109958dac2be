use super::{ProviderStatus, CHECK_AZ_LOGIN};
use crate::config::WorkspaceConfig;

/// Human status table for `opskit status` and `opskit check`.
pub fn render_status_report(statuses: &[ProviderStatus], workspace: Option<&WorkspaceConfig>) -> String {
    let mut lines = vec!["=== OpsKit Provider Status ===".to_string(), String::new()];

    for status in statuses {
        let mark = if status.ready { "✓" } else { "✗" };
        let state = if status.ready {
            "Ready".to_string()
        } else if status.check(CHECK_AZ_LOGIN).is_some_and(|check| check.passed) {
            "Not connected (az login: ✓)".to_string()
        } else {
            "Not configured".to_string()
        };

        let mut line = format!("{mark} {:<16} {state}", status.provider.label());
        let summary: Vec<&str> = status
            .checks
            .iter()
            .filter(|check| check.passed && !matches!(check.detail.as_str(), "installed" | "configured"))
            .map(|check| check.detail.as_str())
            .take(2)
            .collect();
        if status.ready && !summary.is_empty() {
            line.push_str(&format!(" ({})", summary.join(", ")));
        }
        lines.push(line);

        if !status.ready {
            for check in status.failed_checks() {
                lines.push(format!("    ✗ {}: {}", check.name, check.detail));
            }
            for instruction in status.instructions.lines() {
                lines.push(format!("    {instruction}"));
            }
        }
        lines.push(String::new());
    }

    match workspace.filter(|ws| !ws.is_empty()) {
        Some(ws) => {
            lines.push("--- Workspace (ops/opskit.json) ---".to_string());
            if let Some(url) = ws.environment_url() {
                lines.push(format!("  Environment URL: {url}"));
            }
            for (provider, name) in &ws.connections {
                lines.push(format!("  {provider} connection: {name}"));
            }
        }
        None => {
            lines.push("--- Workspace ---".to_string());
            lines.push("  No ops/opskit.json found in current directory.".to_string());
            lines.push(
                "  Create one to set environment URL and connection overrides.".to_string(),
            );
        }
    }

    lines.join("\n")
}
