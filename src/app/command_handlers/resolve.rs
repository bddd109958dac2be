use super::connections::CONNECTION_FLAGS;
use crate::app::command_support::{parse_args, parse_provider, render_fields, CommandContext};

/// Effective connection after every precedence tier, secrets masked.
pub fn cmd_resolve(ctx: &CommandContext, args: &[String]) -> Result<String, String> {
    let parsed = parse_args(args, CONNECTION_FLAGS)?;
    let provider = parse_provider(parsed.positionals.first())?;
    let overrides = (!parsed.flags.is_empty()).then_some(&parsed.flags);

    let connection = ctx.resolver().resolve(provider, overrides);
    let mut lines = vec![format!("provider={provider}")];
    let fields = render_fields(&connection.masked());
    if !fields.is_empty() {
        lines.push(fields);
    }
    let missing = connection.missing_required();
    if !missing.is_empty() {
        lines.push(format!("missing={}", missing.join(",")));
    }
    Ok(lines.join("\n"))
}
