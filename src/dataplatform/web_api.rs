use super::{DataPlatformClient, DataPlatformError, RowPage, RowQuery};
use crate::discovery::{scope_for, TokenCredential};
use crate::shared::http::get_json_with_headers;
use serde_json::Value;

pub const WEB_API_PATH: &str = "/api/data/v9.2";

const ODATA_HEADERS: [(&str, &str); 2] = [("OData-MaxVersion", "4.0"), ("OData-Version", "4.0")];

/// Row reads over the environment's REST endpoint.
pub struct WebApiClient<'a> {
    environment_url: String,
    credential: &'a dyn TokenCredential,
}

impl<'a> WebApiClient<'a> {
    pub fn new(environment_url: &str, credential: &'a dyn TokenCredential) -> Self {
        Self {
            environment_url: environment_url.trim().trim_end_matches('/').to_string(),
            credential,
        }
    }

    pub fn environment_url(&self) -> &str {
        &self.environment_url
    }

    fn first_page_url(&self, query: &RowQuery) -> String {
        let base = format!("{}{WEB_API_PATH}/{}", self.environment_url, query.entity_set);
        match query.query_string() {
            qs if qs.is_empty() => base,
            qs => format!("{base}?{qs}"),
        }
    }
}

impl DataPlatformClient for WebApiClient<'_> {
    fn fetch_page(
        &self,
        query: &RowQuery,
        next_link: Option<&str>,
    ) -> Result<RowPage, DataPlatformError> {
        let token = self
            .credential
            .token(&scope_for(&self.environment_url))
            .map_err(|err| DataPlatformError::Credential(err.to_string()))?;
        let url = match next_link {
            Some(link) => link.to_string(),
            None => self.first_page_url(query),
        };
        let body = get_json_with_headers(&url, &token.token, &ODATA_HEADERS)?;
        parse_page(body)
    }
}

fn parse_page(body: Value) -> Result<RowPage, DataPlatformError> {
    let Some(values) = body.get("value").and_then(Value::as_array) else {
        return Err(DataPlatformError::Decode(
            "response has no `value` array".to_string(),
        ));
    };
    let rows = values
        .iter()
        .map(|row| {
            row.as_object()
                .cloned()
                .ok_or_else(|| DataPlatformError::Decode("row is not an object".to_string()))
        })
        .collect::<Result<Vec<_>, _>>()?;
    let next_link = body
        .get("@odata.nextLink")
        .and_then(Value::as_str)
        .map(str::to_string);
    Ok(RowPage { rows, next_link })
}
