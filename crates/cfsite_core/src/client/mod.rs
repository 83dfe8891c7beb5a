//! Query client contract shared by every repository.
//!
//! # Responsibility
//! - Describe collection queries as plain data (`Query`) independent of backend.
//! - Define the async `QueryClient` seam implemented by REST and SQLite backends.
//! - Carry backend failures verbatim in `QueryError`.
//!
//! # Invariants
//! - Filters are equality-only and applied in insertion order.
//! - `fetch_maybe_single` never treats zero matching rows as an error.
//! - Backend error `code`/`message` fields are preserved unchanged.
//!
//! # See also
//! - docs/architecture/backend.md

use async_trait::async_trait;
use serde::Deserialize;
use serde_json::{Map, Value};
use std::error::Error;
use std::fmt::{Display, Formatter};
use std::sync::Arc;

pub mod classify;
pub mod rest;
pub mod sqlite;

pub use classify::{classify, FailureKind};

/// One JSON row as returned by a backend.
pub type Row = Map<String, Value>;

pub type QueryResult<T> = Result<T, QueryError>;

/// Postgres `undefined_table`.
pub const UNDEFINED_TABLE_CODE: &str = "42P01";
/// PostgREST: table missing from the schema cache.
pub const SCHEMA_CACHE_MISS_CODE: &str = "PGRST205";
/// PostgREST: singular response requested but multiple rows matched.
pub const MULTIPLE_ROWS_CODE: &str = "PGRST116";

/// Equality predicate `column = value`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Filter {
    pub column: String,
    pub value: String,
}

/// Sort order for list queries.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Order {
    pub column: String,
    pub ascending: bool,
}

/// Backend-agnostic description of a read against one collection.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Query {
    pub collection: String,
    /// Comma-separated projection, `*` for all columns.
    pub columns: String,
    pub filters: Vec<Filter>,
    pub order: Option<Order>,
    pub limit: Option<u32>,
}

impl Query {
    /// Starts a query selecting `columns` from `collection`.
    pub fn select(collection: impl Into<String>, columns: impl Into<String>) -> Self {
        Self {
            collection: collection.into(),
            columns: columns.into(),
            filters: Vec::new(),
            order: None,
            limit: None,
        }
    }

    /// Adds an equality filter.
    pub fn eq(mut self, column: impl Into<String>, value: impl Into<String>) -> Self {
        self.filters.push(Filter {
            column: column.into(),
            value: value.into(),
        });
        self
    }

    pub fn order(mut self, column: impl Into<String>, ascending: bool) -> Self {
        self.order = Some(Order {
            column: column.into(),
            ascending,
        });
        self
    }

    pub fn limit(mut self, limit: u32) -> Self {
        self.limit = Some(limit);
        self
    }

    /// Returns the value of the first equality filter on `column`.
    pub fn filter_value(&self, column: &str) -> Option<&str> {
        self.filters
            .iter()
            .find(|filter| filter.column == column)
            .map(|filter| filter.value.as_str())
    }

    /// Returns projected column names, or an empty list for `*`.
    pub fn projected_columns(&self) -> Vec<&str> {
        let trimmed = self.columns.trim();
        if trimmed.is_empty() || trimmed == "*" {
            return Vec::new();
        }
        trimmed
            .split(',')
            .map(str::trim)
            .filter(|column| !column.is_empty())
            .collect()
    }
}

/// Backend error with its original code and message.
///
/// Mirrors the PostgREST error body so hosted failures pass through intact.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct QueryError {
    #[serde(default)]
    pub code: Option<String>,
    #[serde(default)]
    pub message: String,
    #[serde(default)]
    pub details: Option<String>,
    #[serde(default)]
    pub hint: Option<String>,
}

impl QueryError {
    pub fn new(code: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            code: Some(code.into()),
            message: message.into(),
            details: None,
            hint: None,
        }
    }

    /// Failure with no backend code (network, decoding, local validation).
    pub fn transport(message: impl Into<String>) -> Self {
        Self {
            code: None,
            message: message.into(),
            details: None,
            hint: None,
        }
    }

    pub fn with_details(mut self, details: impl Into<String>) -> Self {
        self.details = Some(details.into());
        self
    }

    pub fn code(&self) -> Option<&str> {
        self.code.as_deref()
    }
}

impl Display for QueryError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match &self.code {
            Some(code) => write!(f, "backend error {code}: {}", self.message)?,
            None => write!(f, "backend error: {}", self.message)?,
        }
        if let Some(details) = &self.details {
            write!(f, " ({details})")?;
        }
        Ok(())
    }
}

impl Error for QueryError {}

/// Async query client over a managed record store.
#[async_trait]
pub trait QueryClient: Send + Sync {
    /// Fetches at most one row. Zero rows yields `Ok(None)`.
    async fn fetch_maybe_single(&self, query: &Query) -> QueryResult<Option<Row>>;
    /// Counts matching rows without returning them. `None` when the backend
    /// reports no count.
    async fn fetch_count(&self, query: &Query) -> QueryResult<Option<u64>>;
    /// Fetches all matching rows honoring order and limit.
    async fn fetch_rows(&self, query: &Query) -> QueryResult<Vec<Row>>;
    /// Inserts one row.
    async fn insert(&self, collection: &str, row: &Row) -> QueryResult<()>;
    /// Inserts or merges rows keyed by `on_conflict`.
    async fn upsert(&self, collection: &str, rows: &[Row], on_conflict: &str) -> QueryResult<()>;
    /// Applies `patch` to rows matching the query filters; returns affected rows.
    async fn update(&self, query: &Query, patch: &Row) -> QueryResult<u64>;
}

#[async_trait]
impl<T: QueryClient + ?Sized> QueryClient for Arc<T> {
    async fn fetch_maybe_single(&self, query: &Query) -> QueryResult<Option<Row>> {
        (**self).fetch_maybe_single(query).await
    }

    async fn fetch_count(&self, query: &Query) -> QueryResult<Option<u64>> {
        (**self).fetch_count(query).await
    }

    async fn fetch_rows(&self, query: &Query) -> QueryResult<Vec<Row>> {
        (**self).fetch_rows(query).await
    }

    async fn insert(&self, collection: &str, row: &Row) -> QueryResult<()> {
        (**self).insert(collection, row).await
    }

    async fn upsert(&self, collection: &str, rows: &[Row], on_conflict: &str) -> QueryResult<()> {
        (**self).upsert(collection, rows, on_conflict).await
    }

    async fn update(&self, query: &Query, patch: &Row) -> QueryResult<u64> {
        (**self).update(query, patch).await
    }
}

#[cfg(test)]
mod tests {
    use super::{Query, QueryError};

    #[test]
    fn query_builder_keeps_filters_in_order() {
        let query = Query::select("inquiries", "id")
            .eq("status", "new")
            .eq("product", "truss")
            .limit(5);

        assert_eq!(query.filters.len(), 2);
        assert_eq!(query.filters[0].column, "status");
        assert_eq!(query.filter_value("product"), Some("truss"));
        assert_eq!(query.filter_value("missing"), None);
        assert_eq!(query.limit, Some(5));
    }

    #[test]
    fn projected_columns_treats_star_as_all() {
        assert!(Query::select("products", "*").projected_columns().is_empty());
        assert_eq!(
            Query::select("products", "id, name").projected_columns(),
            vec!["id", "name"]
        );
    }

    #[test]
    fn query_error_display_includes_code_and_details() {
        let err = QueryError::new("42501", "permission denied").with_details("table products");
        assert_eq!(
            err.to_string(),
            "backend error 42501: permission denied (table products)"
        );
        assert_eq!(QueryError::transport("timeout").code(), None);
    }
}
