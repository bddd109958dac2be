use crate::app::command_support::{map_config_err, parse_args, CommandContext};
use crate::config::provider::FIELD_ENVIRONMENT_URL;
use crate::config::{Provider, WorkspaceUpdate};

pub fn cmd_init_workspace(ctx: &CommandContext, args: &[String]) -> Result<String, String> {
    let parsed = parse_args(args, &[FIELD_ENVIRONMENT_URL, "jira", "ado", "dataverse"])?;
    if let Some(extra) = parsed.positionals.first() {
        return Err(format!("unexpected argument `{extra}`"));
    }

    let mut update = WorkspaceUpdate {
        environment_url: parsed.flags.get(FIELD_ENVIRONMENT_URL).cloned(),
        ..WorkspaceUpdate::default()
    };
    for provider in Provider::ALL {
        if let Some(name) = parsed.flags.get(provider.as_str()) {
            update.connections.insert(provider, name.clone());
        }
    }

    let (path, workspace) = ctx.store().init_workspace(update).map_err(map_config_err)?;
    let mut lines = vec![format!("workspace={}", path.display())];
    if let Some(url) = workspace.environment_url() {
        lines.push(format!("environment_url={url}"));
    }
    for (provider, name) in &workspace.connections {
        lines.push(format!("{provider}={name}"));
    }
    Ok(lines.join("\n"))
}
