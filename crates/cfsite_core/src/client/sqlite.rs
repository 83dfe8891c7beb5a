//! SQLite-backed query client for local development and offline use.
//!
//! # Responsibility
//! - Execute backend-agnostic `Query` values against a migrated connection.
//! - Translate SQLite failures into backend-shaped `QueryError`s.
//!
//! # Invariants
//! - Identifiers are validated before being spliced into SQL; values are bound.
//! - Columns declared `JSON` round-trip as JSON values, not strings: every
//!   value written to one is stored as JSON text, strings included.
//! - A missing table surfaces as `42P01`, like the hosted backend.
//! - Calls block the calling task while SQLite runs. Callers on a
//!   multi-thread runtime should go through `tokio::task::spawn_blocking`.
//!
//! # See also
//! - docs/architecture/local-backend.md

use super::{
    Query, QueryClient, QueryError, QueryResult, Row, MULTIPLE_ROWS_CODE, UNDEFINED_TABLE_CODE,
};
use crate::db::{open_db, open_db_in_memory, DbResult};
use async_trait::async_trait;
use once_cell::sync::Lazy;
use regex::Regex;
use rusqlite::types::{Value as SqlValue, ValueRef};
use rusqlite::{params_from_iter, Connection};
use serde_json::{Number, Value};
use std::collections::HashSet;
use std::path::Path;
use std::sync::{Mutex, PoisonError};

static IDENTIFIER_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^[A-Za-z_][A-Za-z0-9_]*$").expect("valid identifier regex"));
static NO_SUCH_TABLE_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"no such table: (?:[A-Za-z0-9_]+\.)?([A-Za-z0-9_]+)").expect("valid table regex")
});

/// Query client over one SQLite connection.
pub struct SqliteQueryClient {
    conn: Mutex<Connection>,
}

impl SqliteQueryClient {
    /// Wraps an already migrated connection.
    pub fn new(conn: Connection) -> Self {
        Self {
            conn: Mutex::new(conn),
        }
    }

    /// Opens (and migrates) a database file.
    pub fn open(path: impl AsRef<Path>) -> DbResult<Self> {
        Ok(Self::new(open_db(path)?))
    }

    pub fn open_in_memory() -> DbResult<Self> {
        Ok(Self::new(open_db_in_memory()?))
    }

    /// Runs raw SQL against the underlying connection.
    ///
    /// Intended for fixtures and maintenance, not for repository code.
    pub fn execute_batch(&self, sql: &str) -> QueryResult<()> {
        self.with_conn(|conn| conn.execute_batch(sql))
    }

    /// Names of `collection` columns declared `JSON`. Empty for unknown tables.
    fn json_columns(&self, collection: &str) -> QueryResult<HashSet<String>> {
        let sql = format!("PRAGMA table_info({});", quote_ident(collection)?);
        self.with_conn(|conn| {
            let mut stmt = conn.prepare(&sql)?;
            let columns = stmt
                .query_map([], |row| {
                    Ok((row.get::<_, String>("name")?, row.get::<_, String>("type")?))
                })?
                .filter_map(|column| match column {
                    Ok((name, decl)) if decl.eq_ignore_ascii_case("JSON") => Some(Ok(name)),
                    Ok(_) => None,
                    Err(err) => Some(Err(err)),
                })
                .collect::<rusqlite::Result<HashSet<_>>>()?;
            Ok(columns)
        })
    }

    fn with_conn<T>(&self, f: impl FnOnce(&Connection) -> rusqlite::Result<T>) -> QueryResult<T> {
        let conn = self.conn.lock().unwrap_or_else(PoisonError::into_inner);
        f(&conn).map_err(map_sqlite_error)
    }
}

#[async_trait]
impl QueryClient for SqliteQueryClient {
    async fn fetch_maybe_single(&self, query: &Query) -> QueryResult<Option<Row>> {
        let (sql, binds) = build_select(query, Some(2))?;
        let mut rows = self.with_conn(|conn| read_rows(conn, &sql, binds))?;
        match rows.len() {
            0 => Ok(None),
            1 => Ok(rows.pop()),
            count => Err(QueryError::new(
                MULTIPLE_ROWS_CODE,
                "JSON object requested, multiple (or no) rows returned",
            )
            .with_details(format!("results contain at least {count} rows"))),
        }
    }

    async fn fetch_count(&self, query: &Query) -> QueryResult<Option<u64>> {
        let (where_sql, binds) = build_where(query)?;
        let sql = format!(
            "SELECT COUNT(*) FROM {}{where_sql};",
            quote_ident(&query.collection)?
        );
        let count = self.with_conn(|conn| {
            conn.query_row(&sql, params_from_iter(binds), |row| row.get::<_, i64>(0))
        })?;
        Ok(u64::try_from(count).ok())
    }

    async fn fetch_rows(&self, query: &Query) -> QueryResult<Vec<Row>> {
        let (sql, binds) = build_select(query, query.limit)?;
        self.with_conn(|conn| read_rows(conn, &sql, binds))
    }

    async fn insert(&self, collection: &str, row: &Row) -> QueryResult<()> {
        let json_columns = self.json_columns(collection)?;
        let (sql, binds) = build_insert(collection, row, &json_columns)?;
        self.with_conn(|conn| conn.execute(&sql, params_from_iter(binds)).map(|_| ()))
    }

    async fn upsert(&self, collection: &str, rows: &[Row], on_conflict: &str) -> QueryResult<()> {
        let conflict = quote_ident(on_conflict)?;
        let json_columns = self.json_columns(collection)?;
        let mut statements = Vec::with_capacity(rows.len());
        for row in rows {
            let (insert_sql, binds) = build_insert(collection, row, &json_columns)?;
            let assignments = row
                .keys()
                .filter(|column| column.as_str() != on_conflict)
                .map(|column| {
                    let quoted = quote_ident(column)?;
                    Ok(format!("{quoted} = excluded.{quoted}"))
                })
                .collect::<QueryResult<Vec<_>>>()?;
            let action = if assignments.is_empty() {
                "DO NOTHING".to_string()
            } else {
                format!("DO UPDATE SET {}", assignments.join(", "))
            };
            let sql = format!(
                "{} ON CONFLICT({conflict}) {action};",
                insert_sql.trim_end_matches(';')
            );
            statements.push((sql, binds));
        }

        self.with_conn(|conn| {
            let tx = conn.unchecked_transaction()?;
            for (sql, binds) in statements {
                tx.execute(&sql, params_from_iter(binds))?;
            }
            tx.commit()
        })
    }

    async fn update(&self, query: &Query, patch: &Row) -> QueryResult<u64> {
        if patch.is_empty() {
            return Err(QueryError::transport("update patch cannot be empty"));
        }

        let json_columns = self.json_columns(&query.collection)?;
        let mut binds = Vec::with_capacity(patch.len() + query.filters.len());
        let mut assignments = Vec::with_capacity(patch.len());
        for (column, value) in patch {
            assignments.push(format!("{} = ?", quote_ident(column)?));
            binds.push(json_to_sql(value, json_columns.contains(column)));
        }
        let (where_sql, where_binds) = build_where(query)?;
        binds.extend(where_binds);

        let sql = format!(
            "UPDATE {} SET {}{where_sql};",
            quote_ident(&query.collection)?,
            assignments.join(", ")
        );
        let changed = self.with_conn(|conn| conn.execute(&sql, params_from_iter(binds)))?;
        Ok(changed as u64)
    }
}

fn quote_ident(name: &str) -> QueryResult<String> {
    if IDENTIFIER_RE.is_match(name) {
        Ok(format!("\"{name}\""))
    } else {
        Err(QueryError::transport(format!("invalid identifier `{name}`")))
    }
}

fn build_where(query: &Query) -> QueryResult<(String, Vec<SqlValue>)> {
    if query.filters.is_empty() {
        return Ok((String::new(), Vec::new()));
    }

    let mut clauses = Vec::with_capacity(query.filters.len());
    let mut binds = Vec::with_capacity(query.filters.len());
    for filter in &query.filters {
        clauses.push(format!("{} = ?", quote_ident(&filter.column)?));
        binds.push(SqlValue::Text(filter.value.clone()));
    }
    Ok((format!(" WHERE {}", clauses.join(" AND ")), binds))
}

fn build_select(query: &Query, limit: Option<u32>) -> QueryResult<(String, Vec<SqlValue>)> {
    let projection = match query.projected_columns().as_slice() {
        [] => "*".to_string(),
        columns => columns
            .iter()
            .map(|column| quote_ident(column))
            .collect::<QueryResult<Vec<_>>>()?
            .join(", "),
    };

    let (where_sql, mut binds) = build_where(query)?;
    let mut sql = format!(
        "SELECT {projection} FROM {}{where_sql}",
        quote_ident(&query.collection)?
    );

    if let Some(order) = &query.order {
        sql.push_str(&format!(
            " ORDER BY {} {}",
            quote_ident(&order.column)?,
            if order.ascending { "ASC" } else { "DESC" }
        ));
    }

    if let Some(limit) = limit {
        sql.push_str(" LIMIT ?");
        binds.push(SqlValue::Integer(i64::from(limit)));
    }

    sql.push(';');
    Ok((sql, binds))
}

fn build_insert(
    collection: &str,
    row: &Row,
    json_columns: &HashSet<String>,
) -> QueryResult<(String, Vec<SqlValue>)> {
    let table = quote_ident(collection)?;
    if row.is_empty() {
        return Ok((format!("INSERT INTO {table} DEFAULT VALUES;"), Vec::new()));
    }

    let columns = row
        .keys()
        .map(|column| quote_ident(column))
        .collect::<QueryResult<Vec<_>>>()?;
    let placeholders = vec!["?"; columns.len()].join(", ");
    let binds = row
        .iter()
        .map(|(column, value)| json_to_sql(value, json_columns.contains(column)))
        .collect();

    Ok((
        format!(
            "INSERT INTO {table} ({}) VALUES ({placeholders});",
            columns.join(", ")
        ),
        binds,
    ))
}

fn read_rows(conn: &Connection, sql: &str, binds: Vec<SqlValue>) -> rusqlite::Result<Vec<Row>> {
    let mut stmt = conn.prepare(sql)?;
    let columns: Vec<(String, bool)> = stmt
        .columns()
        .iter()
        .map(|column| {
            let is_json = column
                .decl_type()
                .is_some_and(|decl| decl.eq_ignore_ascii_case("JSON"));
            (column.name().to_string(), is_json)
        })
        .collect();

    let mut rows = stmt.query(params_from_iter(binds))?;
    let mut records = Vec::new();
    while let Some(row) = rows.next()? {
        let mut record = Row::new();
        for (index, (name, is_json)) in columns.iter().enumerate() {
            record.insert(name.clone(), sql_to_json(row.get_ref(index)?, *is_json));
        }
        records.push(record);
    }
    Ok(records)
}

fn sql_to_json(value: ValueRef<'_>, is_json: bool) -> Value {
    match value {
        ValueRef::Null => Value::Null,
        ValueRef::Integer(number) => Value::from(number),
        ValueRef::Real(number) => Number::from_f64(number).map_or(Value::Null, Value::Number),
        ValueRef::Text(bytes) => {
            let text = String::from_utf8_lossy(bytes).into_owned();
            if is_json {
                // Malformed JSON stays a string so callers can reject the shape.
                serde_json::from_str(&text).unwrap_or(Value::String(text))
            } else {
                Value::String(text)
            }
        }
        ValueRef::Blob(bytes) => Value::Array(bytes.iter().copied().map(Value::from).collect()),
    }
}

fn json_to_sql(value: &Value, is_json: bool) -> SqlValue {
    if is_json {
        return match value {
            Value::Null => SqlValue::Null,
            other => SqlValue::Text(other.to_string()),
        };
    }

    match value {
        Value::Null => SqlValue::Null,
        Value::Bool(flag) => SqlValue::Integer(i64::from(*flag)),
        Value::Number(number) => match number.as_i64() {
            Some(integer) => SqlValue::Integer(integer),
            None => number.as_f64().map_or(SqlValue::Null, SqlValue::Real),
        },
        Value::String(text) => SqlValue::Text(text.clone()),
        Value::Array(_) | Value::Object(_) => SqlValue::Text(value.to_string()),
    }
}

fn map_sqlite_error(err: rusqlite::Error) -> QueryError {
    let message = err.to_string();
    if let Some(captures) = NO_SUCH_TABLE_RE.captures(&message) {
        return QueryError::new(
            UNDEFINED_TABLE_CODE,
            format!("relation \"{}\" does not exist", &captures[1]),
        );
    }

    match &err {
        rusqlite::Error::SqliteFailure(failure, _) => {
            QueryError::new(format!("SQLITE_{}", failure.extended_code), message)
        }
        _ => QueryError::transport(message),
    }
}
