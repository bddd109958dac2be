use super::ConfigError;

pub const FIELD_SERVER: &str = "server";
pub const FIELD_EMAIL: &str = "email";
pub const FIELD_API_TOKEN: &str = "api_token";
pub const FIELD_ORGANIZATION: &str = "organization";
pub const FIELD_PROJECT: &str = "project";
pub const FIELD_TENANT_ID: &str = "tenant_id";
pub const FIELD_ENVIRONMENT_URL: &str = "environment_url";
pub const FIELD_CLIENT_ID: &str = "client_id";
pub const FIELD_CLIENT_SECRET: &str = "client_secret";

/// Fields whose values are masked whenever a connection is printed.
pub const SECRET_FIELDS: [&str; 2] = [FIELD_API_TOKEN, FIELD_CLIENT_SECRET];

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum Provider {
    Jira,
    Ado,
    Dataverse,
}

impl Provider {
    pub const ALL: [Provider; 3] = [Self::Jira, Self::Ado, Self::Dataverse];

    pub fn as_str(self) -> &'static str {
        match self {
            Self::Jira => "jira",
            Self::Ado => "ado",
            Self::Dataverse => "dataverse",
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            Self::Jira => "Jira",
            Self::Ado => "Azure DevOps",
            Self::Dataverse => "Dataverse",
        }
    }

    pub fn parse(raw: &str) -> Result<Self, ConfigError> {
        match raw.trim().to_ascii_lowercase().as_str() {
            "jira" => Ok(Self::Jira),
            "ado" => Ok(Self::Ado),
            "dataverse" => Ok(Self::Dataverse),
            _ => Err(ConfigError::UnknownProvider(raw.to_string())),
        }
    }

    /// Environment variables consulted as the lowest-precedence tier, as
    /// `(variable, field)` pairs. Only the ticketing provider defines any.
    pub fn env_fallbacks(self) -> &'static [(&'static str, &'static str)] {
        match self {
            Self::Jira => &[
                ("JIRA_SERVER", FIELD_SERVER),
                ("JIRA_EMAIL", FIELD_EMAIL),
                ("JIRA_API_TOKEN", FIELD_API_TOKEN),
            ],
            Self::Ado | Self::Dataverse => &[],
        }
    }

    pub fn required_fields(self) -> &'static [&'static str] {
        match self {
            Self::Jira => &[FIELD_SERVER, FIELD_EMAIL, FIELD_API_TOKEN],
            Self::Ado => &[FIELD_ORGANIZATION, FIELD_PROJECT],
            Self::Dataverse => &[FIELD_TENANT_ID],
        }
    }

    pub fn optional_fields(self) -> &'static [&'static str] {
        match self {
            Self::Jira => &[],
            Self::Ado => &[FIELD_TENANT_ID],
            Self::Dataverse => &[FIELD_ENVIRONMENT_URL, FIELD_CLIENT_ID, FIELD_CLIENT_SECRET],
        }
    }
}

impl std::fmt::Display for Provider {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parse_is_case_insensitive_and_trims() {
        assert_eq!(Provider::parse(" Jira ").expect("jira"), Provider::Jira);
        assert_eq!(Provider::parse("DATAVERSE").expect("dv"), Provider::Dataverse);
    }

    #[test]
    fn parse_rejects_unknown_ids_with_choices() {
        let err = Provider::parse("github").expect_err("unknown");
        assert!(err.to_string().contains("jira, ado, dataverse"));
    }

    #[test]
    fn only_jira_defines_env_fallbacks() {
        assert_eq!(Provider::Jira.env_fallbacks().len(), 3);
        assert!(Provider::Ado.env_fallbacks().is_empty());
        assert!(Provider::Dataverse.env_fallbacks().is_empty());
    }
}
