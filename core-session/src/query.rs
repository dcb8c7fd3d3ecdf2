//! # Table Query Builder
//!
//! Translates chained projection, filter, limit and order calls into a single
//! REST request against `/rest/v1/<table>`.
//!
//! ```text
//! table("jobs").select("id,title").eq("status", "open").gte("salary", 50000).limit(10)
//!   -> GET /rest/v1/jobs?select=id,title&status=eq.open&salary=gte.50000&limit=10
//! ```
//!
//! Builders are plain values: every chained call consumes the builder and
//! returns it with the new state, and `execute_*` consumes it for good.
//! Filters keep insertion order and are never deduplicated, so two bounds on
//! the same column render as two segments.

use crate::error::{Result, SessionError};
use crate::session::{HttpSession, SessionRequest};
use bridge_traits::HttpResponse;
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::fmt;
use std::sync::Arc;
use tracing::{debug, instrument, warn};

const REST_PREFIX: &str = "/rest/v1";

/// Comparison operator of a row filter.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FilterOp {
    Eq,
    Neq,
    Gt,
    Gte,
    Lt,
    Lte,
    Like,
    Ilike,
    Is,
}

impl FilterOp {
    pub fn as_str(&self) -> &'static str {
        match self {
            FilterOp::Eq => "eq",
            FilterOp::Neq => "neq",
            FilterOp::Gt => "gt",
            FilterOp::Gte => "gte",
            FilterOp::Lt => "lt",
            FilterOp::Lte => "lte",
            FilterOp::Like => "like",
            FilterOp::Ilike => "ilike",
            FilterOp::Is => "is",
        }
    }
}

impl fmt::Display for FilterOp {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// One `(column, operator, value)` triple.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Filter {
    pub column: String,
    pub op: FilterOp,
    pub value: String,
}

impl Filter {
    /// `column=op.value`, with the value percent-encoded.
    pub fn render(&self) -> String {
        format!(
            "{}={}.{}",
            self.column,
            self.op,
            urlencoding::encode(&self.value)
        )
    }
}

/// Rows returned by a table request.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct TableResponse {
    pub rows: Vec<Value>,
}

impl TableResponse {
    /// Decodes a response body. An object body becomes a single row; an
    /// empty body or `null` yields no rows.
    pub fn from_body(body: &[u8]) -> Result<Self> {
        if body.iter().all(u8::is_ascii_whitespace) {
            return Ok(Self::default());
        }

        let value: Value =
            serde_json::from_slice(body).map_err(|e| SessionError::Decode(e.to_string()))?;

        let rows = match value {
            Value::Array(rows) => rows,
            Value::Null => Vec::new(),
            object @ Value::Object(_) => vec![object],
            other => {
                return Err(SessionError::Decode(format!(
                    "expected a JSON array or object, got {}",
                    other
                )))
            }
        };

        Ok(Self { rows })
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    pub fn first(&self) -> Option<&Value> {
        self.rows.first()
    }

    /// Deserializes every row into `T`.
    pub fn into_typed<T: DeserializeOwned>(self) -> Result<Vec<T>> {
        self.rows
            .into_iter()
            .map(|row| serde_json::from_value(row).map_err(|e| SessionError::Decode(e.to_string())))
            .collect()
    }
}

/// Accumulates one table request.
#[must_use = "a query does nothing until `execute_read` or `execute_write` is called"]
pub struct QueryBuilder {
    session: Arc<HttpSession>,
    table: String,
    projection: String,
    filters: Vec<Filter>,
    limit: Option<usize>,
    order: Option<(String, bool)>,
}

impl QueryBuilder {
    pub fn new(session: Arc<HttpSession>, table: impl Into<String>) -> Self {
        Self {
            session,
            table: table.into(),
            projection: "*".to_string(),
            filters: Vec::new(),
            limit: None,
            order: None,
        }
    }

    pub fn select(mut self, projection: impl Into<String>) -> Self {
        self.projection = projection.into();
        self
    }

    /// Appends a filter. Earlier filters are kept even on the same column.
    pub fn filter(
        mut self,
        column: impl Into<String>,
        op: FilterOp,
        value: impl fmt::Display,
    ) -> Self {
        self.filters.push(Filter {
            column: column.into(),
            op,
            value: value.to_string(),
        });
        self
    }

    pub fn eq(self, column: impl Into<String>, value: impl fmt::Display) -> Self {
        self.filter(column, FilterOp::Eq, value)
    }

    pub fn neq(self, column: impl Into<String>, value: impl fmt::Display) -> Self {
        self.filter(column, FilterOp::Neq, value)
    }

    pub fn gt(self, column: impl Into<String>, value: impl fmt::Display) -> Self {
        self.filter(column, FilterOp::Gt, value)
    }

    pub fn gte(self, column: impl Into<String>, value: impl fmt::Display) -> Self {
        self.filter(column, FilterOp::Gte, value)
    }

    pub fn lt(self, column: impl Into<String>, value: impl fmt::Display) -> Self {
        self.filter(column, FilterOp::Lt, value)
    }

    pub fn lte(self, column: impl Into<String>, value: impl fmt::Display) -> Self {
        self.filter(column, FilterOp::Lte, value)
    }

    /// Caps the number of rows. Replaces any earlier limit; must be positive.
    pub fn limit(mut self, n: usize) -> Self {
        self.limit = Some(n);
        self
    }

    /// Sorts by `column`. Replaces any earlier ordering.
    pub fn order(mut self, column: impl Into<String>, descending: bool) -> Self {
        self.order = Some((column.into(), descending));
        self
    }

    pub fn table(&self) -> &str {
        &self.table
    }

    pub fn filters(&self) -> &[Filter] {
        &self.filters
    }

    /// Path and query string of the read request.
    pub fn render_path(&self) -> String {
        let mut segments = Vec::with_capacity(self.filters.len() + 3);
        segments.push(format!("select={}", self.projection));
        segments.extend(self.filters.iter().map(Filter::render));
        if let Some(limit) = self.limit {
            segments.push(format!("limit={}", limit));
        }
        if let Some((column, descending)) = &self.order {
            let direction = if *descending { "desc" } else { "asc" };
            segments.push(format!("order={}.{}", column, direction));
        }

        format!("{}?{}", self.collection_path(), segments.join("&"))
    }

    fn collection_path(&self) -> String {
        format!("{}/{}", REST_PREFIX, self.table)
    }

    fn validate(&self) -> Result<()> {
        if self.table.trim().is_empty() {
            return Err(SessionError::InvalidQuery(
                "table name cannot be empty".to_string(),
            ));
        }
        if self.limit == Some(0) {
            return Err(SessionError::InvalidQuery(
                "limit must be a positive integer".to_string(),
            ));
        }
        Ok(())
    }

    /// Fetches matching rows.
    ///
    /// # Errors
    ///
    /// - [`SessionError::InvalidQuery`] for an empty table name or `limit(0)`
    /// - [`SessionError::RemoteQuery`] with the upstream status and body on a non-2xx reply
    /// - [`SessionError::Transport`] when the request never got a response
    #[instrument(skip(self), fields(table = %self.table, filters = self.filters.len()))]
    pub async fn execute_read(self) -> Result<TableResponse> {
        self.validate()?;
        let path = self.render_path();
        debug!(path = %path, "Executing table read");

        let response = self.session.execute(SessionRequest::get(path)).await?;
        into_table_response(&self.table, response)
    }

    /// Inserts `payload` and returns the created rows as stored by the server.
    ///
    /// Filters, limit and order do not apply to inserts and are not sent.
    #[instrument(skip(self, payload), fields(table = %self.table))]
    pub async fn execute_write<T: Serialize + ?Sized>(self, payload: &T) -> Result<TableResponse> {
        self.validate()?;
        if !self.filters.is_empty() {
            debug!(
                ignored = self.filters.len(),
                "Filters are not sent with table inserts"
            );
        }

        let request = SessionRequest::post(self.collection_path())
            .header("Prefer", "return=representation")
            .json(payload)?;

        let response = self.session.execute(request).await?;
        into_table_response(&self.table, response)
    }
}

impl fmt::Debug for QueryBuilder {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("QueryBuilder")
            .field("table", &self.table)
            .field("projection", &self.projection)
            .field("filters", &self.filters)
            .field("limit", &self.limit)
            .field("order", &self.order)
            .finish()
    }
}

fn into_table_response(table: &str, response: HttpResponse) -> Result<TableResponse> {
    if !response.is_success() {
        let body = String::from_utf8_lossy(&response.body).into_owned();
        warn!(table, status = response.status, "Table request rejected");
        return Err(SessionError::RemoteQuery {
            status: response.status,
            body,
        });
    }

    TableResponse::from_body(&response.body)
}
