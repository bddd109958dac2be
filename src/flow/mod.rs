pub mod api;

pub use api::{FlowApiClient, FLOW_API_RESOURCE, FLOW_API_VERSION};

use crate::dataplatform::{DataPlatformClient, DataPlatformError, Row, RowQuery};
use crate::discovery::Session;
use crate::shared::http::HttpError;
use crate::shared::Resolution;
use serde_json::Value;
use std::fmt;

pub const WORKFLOW_ENTITY_SET: &str = "workflows";
/// `category` value of cloud flows in the workflow table.
pub const CLOUD_FLOW_CATEGORY: u32 = 5;

#[derive(Debug, thiserror::Error)]
pub enum FlowError {
    #[error("{0}")]
    InvalidArgument(String),
    #[error("no cloud flow found matching filter: {filter}")]
    NotFound { filter: String },
    #[error("workflow lookup failed: {0}")]
    Lookup(#[from] DataPlatformError),
    #[error("flow API token unavailable: {0}")]
    Credential(String),
    #[error("flow API error: {0}")]
    Api(#[from] HttpError),
    #[error("definition for flow '{name}' is unavailable: {reasons}")]
    DefinitionUnavailable { name: String, reasons: String },
}

/// Exactly one way of naming a flow.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FlowSelector {
    Name(String),
    WorkflowId(String),
}

impl FlowSelector {
    pub fn from_parts(name: Option<&str>, workflow_id: Option<&str>) -> Result<Self, FlowError> {
        let name = name.map(str::trim).filter(|v| !v.is_empty());
        let workflow_id = workflow_id.map(str::trim).filter(|v| !v.is_empty());
        match (name, workflow_id) {
            (Some(name), None) => Ok(Self::Name(name.to_string())),
            (None, Some(id)) => {
                if !id.chars().all(|c| c.is_ascii_hexdigit() || c == '-') {
                    return Err(FlowError::InvalidArgument(format!(
                        "workflow id '{id}' is not a GUID"
                    )));
                }
                Ok(Self::WorkflowId(id.to_string()))
            }
            (None, None) => Err(FlowError::InvalidArgument(
                "either a flow name or a workflow id is required".to_string(),
            )),
            (Some(_), Some(_)) => Err(FlowError::InvalidArgument(
                "give a flow name or a workflow id, not both".to_string(),
            )),
        }
    }

    pub fn filter(&self) -> String {
        match self {
            Self::Name(name) => format!(
                "name eq '{}' and category eq {CLOUD_FLOW_CATEGORY}",
                name.replace('\'', "''")
            ),
            Self::WorkflowId(id) => {
                format!("workflowid eq {id} and category eq {CLOUD_FLOW_CATEGORY}")
            }
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FlowIdentity {
    pub workflow_id: String,
    pub resource_id: String,
    pub name: String,
}

fn text(row: &Row, column: &str) -> String {
    row.get(column)
        .and_then(Value::as_str)
        .unwrap_or_default()
        .to_string()
}

/// Maps a workflow-table selector onto the id the workflow API addresses.
pub fn resolve(
    client: &dyn DataPlatformClient,
    selector: &FlowSelector,
) -> Result<FlowIdentity, FlowError> {
    let filter = selector.filter();
    let query = RowQuery::new(WORKFLOW_ENTITY_SET)
        .select(&["workflowid", "resourceid", "name"])
        .filter(filter.clone())
        .top(1);
    let rows = client.fetch_rows(&query)?;
    let Some(row) = rows.first() else {
        return Err(FlowError::NotFound { filter });
    };
    Ok(FlowIdentity {
        workflow_id: text(row, "workflowid"),
        resource_id: text(row, "resourceid"),
        name: text(row, "name"),
    })
}

/// Definition stored on the workflow row itself. `None` when the row has no
/// `clientdata` or it is not valid JSON.
pub fn get_definition_fallback(
    client: &dyn DataPlatformClient,
    workflow_id: &str,
) -> Result<Option<Value>, FlowError> {
    let query = RowQuery::new(WORKFLOW_ENTITY_SET)
        .select(&["clientdata"])
        .filter(format!("workflowid eq {workflow_id}"))
        .top(1);
    let rows = client.fetch_rows(&query)?;
    Ok(rows
        .first()
        .and_then(|row| row.get("clientdata"))
        .and_then(Value::as_str)
        .filter(|data| !data.trim().is_empty())
        .and_then(|data| serde_json::from_str(data).ok()))
}

#[derive(Debug, Clone, Copy)]
enum DefinitionSource {
    RegionalApi,
    WorkflowRecord,
}

impl fmt::Display for DefinitionSource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::RegionalApi => f.write_str("regional flow API"),
            Self::WorkflowRecord => f.write_str("workflow record"),
        }
    }
}

const DEFINITION_SOURCES: [DefinitionSource; 2] =
    [DefinitionSource::RegionalApi, DefinitionSource::WorkflowRecord];

/// Definition from the regional API when the environment can be discovered,
/// otherwise from the workflow row.
pub fn fetch_definition(
    session: &mut Session,
    client: &dyn DataPlatformClient,
    environment_url: &str,
    flow: &FlowIdentity,
) -> Result<Value, FlowError> {
    let mut reasons = Vec::new();
    for source in DEFINITION_SOURCES {
        let outcome = match source {
            DefinitionSource::RegionalApi => definition_from_api(session, environment_url, flow),
            DefinitionSource::WorkflowRecord => {
                Resolution::from(get_definition_fallback(client, &flow.workflow_id))
            }
        };
        match outcome {
            Resolution::Found(definition) => {
                session.log().info(
                    "flow.definition_source",
                    format!("definition for '{}' read from {source}", flow.name),
                );
                return Ok(definition);
            }
            Resolution::NotFound => reasons.push(format!("{source}: no definition")),
            Resolution::Failed(reason) => {
                session.log().warn(
                    "flow.definition_strategy_failed",
                    format!("{source} failed: {reason}"),
                );
                reasons.push(format!("{source}: {reason}"));
            }
        }
    }

    Err(FlowError::DefinitionUnavailable {
        name: flow.name.clone(),
        reasons: reasons.join("; "),
    })
}

fn definition_from_api(
    session: &mut Session,
    environment_url: &str,
    flow: &FlowIdentity,
) -> Resolution<Value> {
    if flow.resource_id.is_empty() {
        return Resolution::Failed("flow has no resource id".to_string());
    }
    let Some(environment_id) = session.resolve_environment_id(environment_url) else {
        return Resolution::Failed("environment id could not be discovered".to_string());
    };
    let base = session.discover_api_base(environment_url);
    let client = FlowApiClient::new(&base.url, &environment_id, session.credential());
    match client.get_definition(&flow.resource_id) {
        Ok(definition) => Resolution::Found(definition),
        Err(err) => Resolution::Failed(err.to_string()),
    }
}
