pub mod web_api;

pub use web_api::{WebApiClient, WEB_API_PATH};

use crate::shared::http::HttpError;
use serde_json::{Map, Value};

pub type Row = Map<String, Value>;

#[derive(Debug, thiserror::Error)]
pub enum DataPlatformError {
    #[error("environment token unavailable: {0}")]
    Credential(String),
    #[error("row query failed: {0}")]
    Http(#[from] HttpError),
    #[error("unexpected row payload: {0}")]
    Decode(String),
}

/// Filtered read against one entity set.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RowQuery {
    pub entity_set: String,
    pub select: Vec<String>,
    pub filter: Option<String>,
    pub order_by: Vec<String>,
    pub top: Option<usize>,
}

impl RowQuery {
    pub fn new(entity_set: impl Into<String>) -> Self {
        Self {
            entity_set: entity_set.into(),
            ..Self::default()
        }
    }

    pub fn select(mut self, columns: &[&str]) -> Self {
        self.select = columns.iter().map(|c| c.to_string()).collect();
        self
    }

    pub fn filter(mut self, expr: impl Into<String>) -> Self {
        self.filter = Some(expr.into());
        self
    }

    pub fn order_by(mut self, expr: impl Into<String>) -> Self {
        self.order_by.push(expr.into());
        self
    }

    pub fn top(mut self, top: usize) -> Self {
        self.top = Some(top);
        self
    }

    /// OData system query options, percent-encoded.
    pub fn query_string(&self) -> String {
        let mut params = Vec::new();
        if !self.select.is_empty() {
            params.push(format!("$select={}", self.select.join(",")));
        }
        if let Some(filter) = &self.filter {
            params.push(format!("$filter={}", urlencoding::encode(filter)));
        }
        if !self.order_by.is_empty() {
            params.push(format!(
                "$orderby={}",
                urlencoding::encode(&self.order_by.join(","))
            ));
        }
        if let Some(top) = self.top {
            params.push(format!("$top={top}"));
        }
        params.join("&")
    }
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct RowPage {
    pub rows: Vec<Row>,
    pub next_link: Option<String>,
}

/// `@odata.etag`, `name@OData.Community.Display.V1.FormattedValue` and
/// friends carry metadata, not column values.
pub fn is_annotation(key: &str) -> bool {
    key.starts_with('@') || key.contains("@OData") || key.contains("@Microsoft")
}

pub fn strip_annotations(row: Row) -> Row {
    row.into_iter().filter(|(key, _)| !is_annotation(key)).collect()
}

pub trait DataPlatformClient {
    /// First page when `next_link` is `None`, otherwise the page it names.
    fn fetch_page(&self, query: &RowQuery, next_link: Option<&str>)
        -> Result<RowPage, DataPlatformError>;

    /// Every page until the server stops linking or `top` rows are in hand.
    fn fetch_rows(&self, query: &RowQuery) -> Result<Vec<Row>, DataPlatformError> {
        let mut rows = Vec::new();
        let mut next_link: Option<String> = None;
        loop {
            let page = self.fetch_page(query, next_link.as_deref())?;
            rows.extend(page.rows.into_iter().map(strip_annotations));
            if let Some(top) = query.top {
                if rows.len() >= top {
                    rows.truncate(top);
                    return Ok(rows);
                }
            }
            match page.next_link {
                Some(link) if !link.is_empty() && next_link.as_deref() != Some(link.as_str()) => {
                    next_link = Some(link)
                }
                _ => return Ok(rows),
            }
        }
    }
}
