use crate::app::cli::{help_text, parse_cli_verb, CliVerb};
use crate::app::command_support::CommandContext;

pub mod connections;
pub mod discover;
pub mod resolve;
pub mod status;
pub mod workspace;

pub fn run_cli(args: Vec<String>) -> Result<String, String> {
    if args.is_empty() {
        return Ok(help_text());
    }

    let verb = parse_cli_verb(args[0].as_str());
    match verb {
        CliVerb::Help => return Ok(help_text()),
        CliVerb::Unknown => {
            return Err(format!(
                "unknown command `{}`; run `opskit help` for usage",
                args[0]
            ))
        }
        _ => {}
    }

    let ctx = CommandContext::from_env()?;
    let rest = &args[1..];
    match verb {
        CliVerb::Status => status::cmd_status(&ctx),
        CliVerb::Check => status::cmd_check(&ctx, rest),
        CliVerb::AddConnection => connections::cmd_add_connection(&ctx, rest),
        CliVerb::RemoveConnection => connections::cmd_remove_connection(&ctx, rest),
        CliVerb::SetDefault => connections::cmd_set_default(&ctx, rest),
        CliVerb::ListConnections => connections::cmd_list_connections(&ctx),
        CliVerb::InitWorkspace => workspace::cmd_init_workspace(&ctx, rest),
        CliVerb::Resolve => resolve::cmd_resolve(&ctx, rest),
        CliVerb::Discover => discover::cmd_discover(&ctx, rest),
        CliVerb::Help | CliVerb::Unknown => Ok(help_text()),
    }
}
