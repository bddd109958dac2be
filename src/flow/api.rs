use super::FlowError;
use crate::discovery::{scope_for, TokenCredential};
use crate::shared::http::get_json;
use serde_json::Value;

pub const FLOW_API_RESOURCE: &str = "https://service.flow.microsoft.com";
pub const FLOW_API_VERSION: &str = "2016-11-01";

/// Workflow management API for one environment at one regional base.
pub struct FlowApiClient<'a> {
    api_base: String,
    environment_id: String,
    credential: &'a dyn TokenCredential,
}

impl<'a> FlowApiClient<'a> {
    pub fn new(api_base: &str, environment_id: &str, credential: &'a dyn TokenCredential) -> Self {
        Self {
            api_base: api_base.trim_end_matches('/').to_string(),
            environment_id: environment_id.to_string(),
            credential,
        }
    }

    fn flow_url(&self, resource_id: &str) -> String {
        format!(
            "{}/providers/Microsoft.ProcessSimple/environments/{}/flows/{}",
            self.api_base, self.environment_id, resource_id
        )
    }

    fn get(&self, url: &str) -> Result<Value, FlowError> {
        let token = self
            .credential
            .token(&scope_for(FLOW_API_RESOURCE))
            .map_err(|err| FlowError::Credential(err.to_string()))?;
        Ok(get_json(url, &token.token)?)
    }

    /// One run with per-action status, errors and input/output links.
    pub fn get_run_with_actions(&self, resource_id: &str, run_id: &str) -> Result<Value, FlowError> {
        let url = format!(
            "{}/runs/{}?$expand=properties/actions,properties/flow&api-version={FLOW_API_VERSION}&include=repetitionCount&isMigrationSource=false",
            self.flow_url(resource_id),
            urlencoding::encode(run_id)
        );
        self.get(&url)
    }

    pub fn list_runs(
        &self,
        resource_id: &str,
        top: usize,
        status: Option<&str>,
    ) -> Result<Vec<Value>, FlowError> {
        let mut url = format!(
            "{}/runs?api-version={FLOW_API_VERSION}&$top={top}",
            self.flow_url(resource_id)
        );
        if let Some(status) = status.filter(|s| !s.trim().is_empty()) {
            let filter = format!("status eq '{}'", status.replace('\'', "''"));
            url.push_str(&format!("&$filter={}", urlencoding::encode(&filter)));
        }

        let body = self.get(&url)?;
        Ok(body
            .get("value")
            .and_then(Value::as_array)
            .cloned()
            .unwrap_or_default())
    }

    /// Flow object whose `properties.definition` holds triggers and actions.
    pub fn get_definition(&self, resource_id: &str) -> Result<Value, FlowError> {
        let url = format!(
            "{}?api-version={FLOW_API_VERSION}&$expand=operationDefinition",
            self.flow_url(resource_id)
        );
        self.get(&url)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::discovery::tests::StaticCredential;
    use crate::shared::http::test_server::serve_once;

    const FLOW_PATH: &str =
        "/providers/Microsoft.ProcessSimple/environments/env-1/flows/res-1";

    #[test]
    fn run_request_expands_actions() {
        let (base, request) = serve_once("200 OK", r#"{"name":"run/1","properties":{"status":"Failed"}}"#);
        let credential = StaticCredential;
        let client = FlowApiClient::new(&base, "env-1", &credential);

        let run = client.get_run_with_actions("res-1", "run/1").expect("run");
        assert_eq!(run["properties"]["status"], "Failed");

        let request = request.join().expect("server thread");
        assert!(request.starts_with(&format!(
            "GET {FLOW_PATH}/runs/run%2F1?$expand=properties/actions,properties/flow&api-version=2016-11-01&include=repetitionCount&isMigrationSource=false "
        )));
        assert!(request.contains("authorization: Bearer token-for:https://service.flow.microsoft.com/.default"));
    }

    #[test]
    fn run_listing_applies_top_and_status_filter() {
        let (base, request) = serve_once("200 OK", r#"{"value":[{"name":"a"},{"name":"b"}]}"#);
        let credential = StaticCredential;
        let client = FlowApiClient::new(&format!("{base}/"), "env-1", &credential);

        let runs = client.list_runs("res-1", 5, Some("Failed")).expect("runs");
        assert_eq!(runs.len(), 2);

        let request = request.join().expect("server thread");
        assert!(request.starts_with(&format!(
            "GET {FLOW_PATH}/runs?api-version=2016-11-01&$top=5&$filter=status%20eq%20%27Failed%27 "
        )));
    }

    #[test]
    fn api_errors_surface_the_service_message() {
        let (base, _request) = serve_once(
            "404 Not Found",
            r#"{"error":{"code":"FlowNotFound","message":"The flow 'res-1' could not be found."}}"#,
        );
        let credential = StaticCredential;
        let client = FlowApiClient::new(&base, "env-1", &credential);

        let err = client.get_definition("res-1").expect_err("missing");
        assert!(err.to_string().contains("could not be found"));
    }
}
