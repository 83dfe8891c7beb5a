#![allow(dead_code)]

use async_trait::async_trait;
use cfsite_core::{Query, QueryClient, QueryError, QueryResult, Row};
use serde_json::Value;
use std::collections::{HashMap, VecDeque};
use std::sync::Mutex;

/// One recorded call against the scripted client.
#[derive(Debug, Clone, PartialEq)]
pub enum Call {
    MaybeSingle(Query),
    Count(Query),
    Rows(Query),
    Insert(String, Row),
    Upsert(String, Vec<Row>, String),
    Update(Query, Row),
}

/// Scripted reply for a count query.
#[derive(Debug, Clone)]
pub enum CountReply {
    Ready(QueryResult<Option<u64>>),
    /// Never resolves.
    Pending,
}

/// In-memory query client returning scripted replies and recording calls.
#[derive(Default)]
pub struct ScriptedClient {
    calls: Mutex<Vec<Call>>,
    single_replies: Mutex<VecDeque<QueryResult<Option<Row>>>>,
    count_replies: Mutex<HashMap<String, CountReply>>,
    row_replies: Mutex<VecDeque<QueryResult<Vec<Row>>>>,
    update_affected: Mutex<u64>,
}

impl ScriptedClient {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push_single(&self, reply: QueryResult<Option<Row>>) {
        self.single_replies.lock().unwrap().push_back(reply);
    }

    pub fn push_rows(&self, reply: QueryResult<Vec<Row>>) {
        self.row_replies.lock().unwrap().push_back(reply);
    }

    pub fn set_count(&self, collection: &str, reply: CountReply) {
        self.count_replies
            .lock()
            .unwrap()
            .insert(collection.to_string(), reply);
    }

    pub fn set_update_affected(&self, affected: u64) {
        *self.update_affected.lock().unwrap() = affected;
    }

    pub fn calls(&self) -> Vec<Call> {
        self.calls.lock().unwrap().clone()
    }

    pub fn count_queries(&self) -> Vec<Query> {
        self.calls()
            .into_iter()
            .filter_map(|call| match call {
                Call::Count(query) => Some(query),
                _ => None,
            })
            .collect()
    }

    fn record(&self, call: Call) {
        self.calls.lock().unwrap().push(call);
    }
}

#[async_trait]
impl QueryClient for ScriptedClient {
    async fn fetch_maybe_single(&self, query: &Query) -> QueryResult<Option<Row>> {
        self.record(Call::MaybeSingle(query.clone()));
        self.single_replies
            .lock()
            .unwrap()
            .pop_front()
            .unwrap_or(Ok(None))
    }

    async fn fetch_count(&self, query: &Query) -> QueryResult<Option<u64>> {
        self.record(Call::Count(query.clone()));
        let reply = self
            .count_replies
            .lock()
            .unwrap()
            .get(&query.collection)
            .cloned();
        match reply {
            Some(CountReply::Ready(result)) => result,
            Some(CountReply::Pending) => std::future::pending().await,
            None => Ok(None),
        }
    }

    async fn fetch_rows(&self, query: &Query) -> QueryResult<Vec<Row>> {
        self.record(Call::Rows(query.clone()));
        self.row_replies
            .lock()
            .unwrap()
            .pop_front()
            .unwrap_or(Ok(Vec::new()))
    }

    async fn insert(&self, collection: &str, row: &Row) -> QueryResult<()> {
        self.record(Call::Insert(collection.to_string(), row.clone()));
        Ok(())
    }

    async fn upsert(&self, collection: &str, rows: &[Row], on_conflict: &str) -> QueryResult<()> {
        self.record(Call::Upsert(
            collection.to_string(),
            rows.to_vec(),
            on_conflict.to_string(),
        ));
        Ok(())
    }

    async fn update(&self, query: &Query, patch: &Row) -> QueryResult<u64> {
        self.record(Call::Update(query.clone(), patch.clone()));
        Ok(*self.update_affected.lock().unwrap())
    }
}

/// Builds a row from a JSON object literal.
pub fn row(value: Value) -> Row {
    match value {
        Value::Object(map) => map,
        other => panic!("expected JSON object, got {other}"),
    }
}

pub fn permission_denied() -> QueryError {
    QueryError::new("42501", "permission denied for table")
}
