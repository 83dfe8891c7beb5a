//! Site content repository with a session-scoped absence fallback.
//!
//! # Responsibility
//! - Resolve a `ContentKey` into its JSON payload.
//! - Treat a missing content collection as "no content" for the session.
//! - Upsert content for seeding.
//!
//! # Invariants
//! - Once the collection is known absent, reads never reach the backend again.
//! - Only relation-absent failures are swallowed; every other backend error
//!   propagates unchanged.
//! - Payloads that are not JSON objects are returned as `None`.

use crate::client::{classify, FailureKind, Query, QueryClient, Row};
use crate::model::content::{ContentKey, ContentPayload};
use crate::repo::{RepoError, RepoResult};
use crate::session::AbsenceCache;
use log::{debug, error, info, warn};
use serde::de::DeserializeOwned;
use serde_json::Value;

pub const CONTENT_COLLECTION: &str = "site_content";
pub const CONTENT_KEY_COLUMN: &str = "key";
pub const CONTENT_PAYLOAD_COLUMN: &str = "content";

/// Content reads/writes over a query client.
pub struct ContentRepository<C: QueryClient, A: AbsenceCache> {
    client: C,
    absence: A,
}

impl<C: QueryClient, A: AbsenceCache> ContentRepository<C, A> {
    pub fn new(client: C, absence: A) -> Self {
        Self { client, absence }
    }

    pub fn absence_cache(&self) -> &A {
        &self.absence
    }

    /// Loads the payload stored under `key`.
    ///
    /// # Contract
    /// - Known-absent collection: `Ok(None)` without querying.
    /// - Relation-absent error: marks the collection absent, `Ok(None)`.
    /// - Other backend errors: `Err(RepoError::Backend)` with the original code.
    /// - No row, or payload not a JSON object: `Ok(None)`.
    pub async fn get_content(&self, key: &ContentKey) -> RepoResult<Option<ContentPayload>> {
        if self.absence.is_known_absent() {
            debug!("event=content_get module=repo status=skipped reason=collection_absent key={key}");
            return Ok(None);
        }

        let query = Query::select(CONTENT_COLLECTION, CONTENT_PAYLOAD_COLUMN)
            .eq(CONTENT_KEY_COLUMN, key.as_str());

        let row = match self.client.fetch_maybe_single(&query).await {
            Ok(row) => row,
            Err(err) => match classify(&err) {
                FailureKind::RelationAbsent => {
                    warn!(
                        "event=content_get module=repo status=fallback reason=collection_absent key={} code={}",
                        key,
                        err.code().unwrap_or("none")
                    );
                    self.absence.mark_absent();
                    return Ok(None);
                }
                FailureKind::Fatal => {
                    error!(
                        "event=content_get module=repo status=error key={} code={} error={}",
                        key,
                        err.code().unwrap_or("none"),
                        err.message
                    );
                    return Err(RepoError::Backend(err));
                }
            },
        };

        let Some(mut row) = row else {
            return Ok(None);
        };

        match row.remove(CONTENT_PAYLOAD_COLUMN) {
            Some(Value::Object(payload)) => Ok(Some(payload)),
            Some(other) => {
                warn!(
                    "event=content_get module=repo status=rejected reason=payload_not_object key={} kind={}",
                    key,
                    json_kind(&other)
                );
                Ok(None)
            }
            None => Ok(None),
        }
    }

    /// Loads the payload under `key` deserialized into `T`.
    ///
    /// An object that does not fit `T` yields `Ok(None)`.
    pub async fn get_content_as<T: DeserializeOwned>(
        &self,
        key: &ContentKey,
    ) -> RepoResult<Option<T>> {
        let Some(payload) = self.get_content(key).await? else {
            return Ok(None);
        };

        match serde_json::from_value::<T>(Value::Object(payload)) {
            Ok(typed) => Ok(Some(typed)),
            Err(err) => {
                warn!(
                    "event=content_get module=repo status=rejected reason=payload_shape key={key} error={err}"
                );
                Ok(None)
            }
        }
    }

    /// Writes (inserts or replaces) the payload under `key`.
    pub async fn upsert_content(&self, key: &ContentKey, payload: &ContentPayload) -> RepoResult<()> {
        self.seed_content(&[(key.clone(), payload.clone())])
            .await
            .map(|_| ())
    }

    /// Upserts many entries in one backend call. Returns the entry count.
    pub async fn seed_content(&self, entries: &[(ContentKey, ContentPayload)]) -> RepoResult<usize> {
        if entries.is_empty() {
            return Ok(0);
        }

        let rows: Vec<Row> = entries
            .iter()
            .map(|(key, payload)| {
                let mut row = Row::new();
                row.insert(
                    CONTENT_KEY_COLUMN.to_string(),
                    Value::String(key.as_str().to_string()),
                );
                row.insert(
                    CONTENT_PAYLOAD_COLUMN.to_string(),
                    Value::Object(payload.clone()),
                );
                row
            })
            .collect();

        self.client
            .upsert(CONTENT_COLLECTION, &rows, CONTENT_KEY_COLUMN)
            .await?;
        info!(
            "event=content_seed module=repo status=ok entries={}",
            rows.len()
        );
        Ok(rows.len())
    }
}

fn json_kind(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "bool",
        Value::Number(_) => "number",
        Value::String(_) => "string",
        Value::Array(_) => "array",
        Value::Object(_) => "object",
    }
}
