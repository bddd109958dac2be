use crate::app::command_support::{parse_provider, render_fields, CommandContext};
use crate::readiness::render_status_report;

pub fn cmd_status(ctx: &CommandContext) -> Result<String, String> {
    let statuses = ctx.readiness().check_all();
    let workspace = match ctx.store().load_workspace() {
        Ok(workspace) => Some(workspace),
        Err(err) => {
            ctx.log
                .warn("config.load_failed", format!("workspace config unreadable: {err}"));
            None
        }
    };
    Ok(render_status_report(&statuses, workspace.as_ref()))
}

/// Exits with status 1 and remediation on stderr when the provider is not ready.
pub fn cmd_check(ctx: &CommandContext, args: &[String]) -> Result<String, String> {
    let provider = parse_provider(args.first())?;
    let connection = ctx.readiness().require(provider, None);
    Ok(format!(
        "{} is ready\n{}",
        provider.label(),
        render_fields(&connection.summary())
    ))
}
