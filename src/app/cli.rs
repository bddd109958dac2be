#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CliVerb {
    Status,
    Check,
    AddConnection,
    RemoveConnection,
    SetDefault,
    ListConnections,
    InitWorkspace,
    Resolve,
    Discover,
    Help,
    Unknown,
}

pub fn parse_cli_verb(input: &str) -> CliVerb {
    match input {
        "status" => CliVerb::Status,
        "check" => CliVerb::Check,
        "add-connection" => CliVerb::AddConnection,
        "remove-connection" => CliVerb::RemoveConnection,
        "set-default" => CliVerb::SetDefault,
        "list-connections" => CliVerb::ListConnections,
        "init-workspace" => CliVerb::InitWorkspace,
        "resolve" => CliVerb::Resolve,
        "discover" => CliVerb::Discover,
        "help" | "--help" | "-h" => CliVerb::Help,
        _ => CliVerb::Unknown,
    }
}

pub fn cli_help_lines() -> Vec<String> {
    vec![
        "Commands:".to_string(),
        "  status                                   Show readiness of every provider".to_string(),
        "  check <provider>                         Check one provider; exits 1 when not ready"
            .to_string(),
        "  add-connection <provider> <name> [...]   Save a named connection".to_string(),
        "  remove-connection <provider> <name>      Delete a named connection".to_string(),
        "  set-default <provider> <name>            Make a connection the provider default"
            .to_string(),
        "  list-connections                         List connections with secrets masked"
            .to_string(),
        "  init-workspace [...]                     Write ops/opskit.json in this directory"
            .to_string(),
        "  resolve <provider> [--<field> <value>]   Print the effective connection".to_string(),
        "  discover [<environment-url>]             Resolve an environment's regional endpoints"
            .to_string(),
        "  help                                     Show this help".to_string(),
    ]
}

pub fn option_help_lines() -> Vec<String> {
    vec![
        "Connection options:".to_string(),
        "  jira       --server <url> --email <addr> --api-token <token>".to_string(),
        "  ado        --organization <url> --project <name> [--tenant-id <id>]".to_string(),
        "  dataverse  --tenant-id <id> [--environment-url <url>] [--client-id <id> --client-secret <secret>]"
            .to_string(),
        "Workspace options:".to_string(),
        "  --environment-url <url> --jira <name> --ado <name> --dataverse <name>".to_string(),
    ]
}

pub(crate) fn help_text() -> String {
    let mut lines = vec!["Usage: opskit <command> [args]".to_string(), String::new()];
    lines.extend(cli_help_lines());
    lines.push(String::new());
    lines.extend(option_help_lines());
    lines.join("\n")
}
