use crate::app::command_support::{parse_args, positional, CommandContext};
use crate::config::provider::{FIELD_ENVIRONMENT_URL, FIELD_TENANT_ID};
use crate::config::Provider;
use crate::discovery::{
    scope_for, token_identity, AzureCliCredential, Session, TokenCredential, ADMIN_API_RESOURCE,
};

/// Environment id and workflow API base for an environment URL, taken from
/// the argument or the resolved dataverse connection.
pub fn cmd_discover(ctx: &CommandContext, args: &[String]) -> Result<String, String> {
    let parsed = parse_args(args, &[FIELD_TENANT_ID])?;
    let connection = ctx.resolver().resolve(Provider::Dataverse, None);

    let url = match positional(&parsed, 0, "environment URL") {
        Ok(url) => url.to_string(),
        Err(_) => connection
            .get(FIELD_ENVIRONMENT_URL)
            .map(str::to_string)
            .ok_or_else(|| {
                "missing environment URL; pass one or run `opskit init-workspace --environment-url <url>`"
                    .to_string()
            })?,
    };
    let tenant_id = parsed
        .flags
        .get(FIELD_TENANT_ID)
        .cloned()
        .or_else(|| connection.get(FIELD_TENANT_ID).map(str::to_string));

    let credential = AzureCliCredential::new().with_tenant(tenant_id);
    match credential.token(&scope_for(ADMIN_API_RESOURCE)) {
        Ok(token) => {
            if let Some(identity) = token_identity(&token) {
                ctx.log.info(
                    "discovery.identity",
                    format!(
                        "connecting as {} (tenant {})",
                        identity.username, identity.tenant_id
                    ),
                );
            }
        }
        Err(err) => ctx.log.warn("discovery.identity", err.to_string()),
    }

    let mut session = Session::new(credential, ctx.log.clone());
    let environment = session.discover(&url);
    let api_base = session.discover_api_base(&url);

    let mut lines = vec![format!("environment_url={}", url.trim().trim_end_matches('/'))];
    match environment {
        Some(env) => {
            lines.push(format!("environment_id={}", env.id));
            lines.push(format!("display_name={}", env.display_name));
            if let Some(location) = env.location {
                lines.push(format!("location={location}"));
            }
        }
        None => lines.push("environment_id=unknown".to_string()),
    }
    lines.push(format!("api_base={api_base}"));
    lines.push(format!("source={}", api_base.source));
    Ok(lines.join("\n"))
}
