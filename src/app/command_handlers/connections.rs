use crate::app::command_support::{
    map_config_err, parse_args, parse_provider, positional, CommandContext,
};
use crate::config::provider::{
    FIELD_API_TOKEN, FIELD_CLIENT_ID, FIELD_CLIENT_SECRET, FIELD_EMAIL, FIELD_ENVIRONMENT_URL,
    FIELD_ORGANIZATION, FIELD_PROJECT, FIELD_SERVER, FIELD_TENANT_ID,
};
use crate::config::{build_connection, mask_connection, Provider};

pub(crate) const CONNECTION_FLAGS: &[&str] = &[
    FIELD_SERVER,
    FIELD_EMAIL,
    FIELD_API_TOKEN,
    FIELD_ORGANIZATION,
    FIELD_PROJECT,
    FIELD_TENANT_ID,
    FIELD_ENVIRONMENT_URL,
    FIELD_CLIENT_ID,
    FIELD_CLIENT_SECRET,
];

pub fn cmd_add_connection(ctx: &CommandContext, args: &[String]) -> Result<String, String> {
    let parsed = parse_args(args, CONNECTION_FLAGS)?;
    let provider = parse_provider(parsed.positionals.first())?;
    let name = positional(&parsed, 1, "connection name")?;
    let connection = build_connection(provider, &parsed.flags).map_err(map_config_err)?;

    let became_default = ctx
        .store()
        .add_connection(provider, name, connection)
        .map_err(map_config_err)?;
    ctx.log.info(
        "connections.added",
        format!("saved {provider} connection '{name}'"),
    );
    Ok(format!(
        "connection={provider}/{name}\ndefault={became_default}\npath={}",
        ctx.paths.connections.display()
    ))
}

pub fn cmd_remove_connection(ctx: &CommandContext, args: &[String]) -> Result<String, String> {
    let parsed = parse_args(args, &[])?;
    let provider = parse_provider(parsed.positionals.first())?;
    let name = positional(&parsed, 1, "connection name")?;

    let cleared = ctx
        .store()
        .remove_connection(provider, name)
        .map_err(map_config_err)?;
    ctx.log.info(
        "connections.removed",
        format!("removed {provider} connection '{name}'"),
    );
    Ok(format!(
        "removed={provider}/{name}\ndefault_cleared={cleared}"
    ))
}

pub fn cmd_set_default(ctx: &CommandContext, args: &[String]) -> Result<String, String> {
    let parsed = parse_args(args, &[])?;
    let provider = parse_provider(parsed.positionals.first())?;
    let name = positional(&parsed, 1, "connection name")?;

    ctx.store()
        .set_default(provider, name)
        .map_err(map_config_err)?;
    Ok(format!("default.{provider}={name}"))
}

pub fn cmd_list_connections(ctx: &CommandContext) -> Result<String, String> {
    let store = ctx.store();
    let connections = store.load_connections().map_err(map_config_err)?;
    let config = store.load_global_config().map_err(map_config_err)?;
    if connections.is_empty() {
        return Ok("no connections configured; use `opskit add-connection`".to_string());
    }

    let mut lines = Vec::new();
    for provider in Provider::ALL {
        let names = connections.names(provider);
        if names.is_empty() {
            continue;
        }
        lines.push(format!("{provider}:"));
        for name in names {
            let marker = if config.default_for(provider) == Some(name.as_str()) {
                " (default)"
            } else {
                ""
            };
            lines.push(format!("  {name}{marker}"));
            if let Some(connection) = connections.get(provider, &name) {
                for (field, value) in mask_connection(connection) {
                    lines.push(format!("    {field}={value}"));
                }
            }
        }
    }
    Ok(lines.join("\n"))
}
