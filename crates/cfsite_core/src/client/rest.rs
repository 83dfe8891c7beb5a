//! PostgREST-compatible HTTP query client for the hosted backend.
//!
//! # Responsibility
//! - Encode `Query` values as PostgREST URL parameters.
//! - Authenticate every request with the project anon key.
//! - Decode PostgREST error bodies into `QueryError` verbatim.
//!
//! # Invariants
//! - No retries or timeouts beyond what the HTTP client applies.
//! - Exact counts come from `Content-Range`, never from row bodies.

use super::{Query, QueryClient, QueryError, QueryResult, Row, MULTIPLE_ROWS_CODE};
use async_trait::async_trait;
use log::debug;
use reqwest::header::{HeaderMap, HeaderValue, CONTENT_RANGE};
use reqwest::{Client, Method, RequestBuilder, Response, Url};
use secrecy::{ExposeSecret, SecretString};

const REST_PATH: &str = "rest/v1/";

/// Connection settings for a hosted project.
#[derive(Debug, Clone)]
pub struct RestConfig {
    /// Project root URL, e.g. `https://xyz.example.co/`.
    pub project_url: Url,
    /// Public (anon) API key sent as `apikey` and bearer token.
    pub anon_key: SecretString,
}

impl RestConfig {
    #[must_use]
    pub fn new(project_url: Url, anon_key: SecretString) -> Self {
        Self {
            project_url,
            anon_key,
        }
    }
}

/// Query client speaking the PostgREST dialect over HTTP.
pub struct RestQueryClient {
    client: Client,
    base_url: Url,
    anon_key: SecretString,
}

impl RestQueryClient {
    /// Builds a client rooted at `<project_url>/rest/v1/`.
    pub fn new(config: RestConfig) -> QueryResult<Self> {
        let mut project_url = config.project_url;
        if !project_url.path().ends_with('/') {
            let path = format!("{}/", project_url.path());
            project_url.set_path(&path);
        }
        let base_url = project_url
            .join(REST_PATH)
            .map_err(|err| QueryError::transport(format!("invalid project url: {err}")))?;

        Ok(Self {
            client: Client::new(),
            base_url,
            anon_key: config.anon_key,
        })
    }

    fn collection_url(&self, collection: &str) -> QueryResult<Url> {
        self.base_url
            .join(collection)
            .map_err(|err| QueryError::transport(format!("invalid collection `{collection}`: {err}")))
    }

    fn request(&self, method: Method, url: Url) -> RequestBuilder {
        let key = self.anon_key.expose_secret();
        self.client
            .request(method, url)
            .header("apikey", key)
            .header("Authorization", format!("Bearer {key}"))
    }

    async fn send(&self, request: RequestBuilder) -> QueryResult<Response> {
        let response = request
            .send()
            .await
            .map_err(|err| QueryError::transport(format!("request failed: {err}")))?;

        if response.status().is_success() {
            return Ok(response);
        }
        Err(error_from_response(response).await)
    }
}

#[async_trait]
impl QueryClient for RestQueryClient {
    async fn fetch_maybe_single(&self, query: &Query) -> QueryResult<Option<Row>> {
        let mut single = query.clone();
        single.limit = Some(2);
        let url = read_url(self.collection_url(&query.collection)?, &single);
        debug!("event=rest_fetch module=client status=start collection={} mode=maybe_single", query.collection);

        let response = self.send(self.request(Method::GET, url)).await?;
        let mut rows: Vec<Row> = decode_json(response).await?;
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
        let url = read_url(self.collection_url(&query.collection)?, query);
        debug!("event=rest_fetch module=client status=start collection={} mode=count", query.collection);

        let response = self
            .send(
                self.request(Method::HEAD, url)
                    .header("Prefer", "count=exact"),
            )
            .await?;
        Ok(parse_content_range_total(response.headers()))
    }

    async fn fetch_rows(&self, query: &Query) -> QueryResult<Vec<Row>> {
        let url = read_url(self.collection_url(&query.collection)?, query);
        let response = self.send(self.request(Method::GET, url)).await?;
        decode_json(response).await
    }

    async fn insert(&self, collection: &str, row: &Row) -> QueryResult<()> {
        let url = self.collection_url(collection)?;
        self.send(
            self.request(Method::POST, url)
                .header("Prefer", "return=minimal")
                .json(row),
        )
        .await?;
        Ok(())
    }

    async fn upsert(&self, collection: &str, rows: &[Row], on_conflict: &str) -> QueryResult<()> {
        let mut url = self.collection_url(collection)?;
        url.query_pairs_mut().append_pair("on_conflict", on_conflict);
        self.send(
            self.request(Method::POST, url)
                .header("Prefer", "resolution=merge-duplicates,return=minimal")
                .json(rows),
        )
        .await?;
        Ok(())
    }

    async fn update(&self, query: &Query, patch: &Row) -> QueryResult<u64> {
        let mut url = self.collection_url(&query.collection)?;
        {
            let mut pairs = url.query_pairs_mut();
            for filter in &query.filters {
                pairs.append_pair(&filter.column, &format!("eq.{}", filter.value));
            }
        }

        let response = self
            .send(
                self.request(Method::PATCH, url)
                    .header("Prefer", "return=representation")
                    .json(patch),
            )
            .await?;
        let rows: Vec<Row> = decode_json(response).await?;
        Ok(rows.len() as u64)
    }
}

/// Encodes projection, filters, order and limit as PostgREST parameters.
fn read_url(mut url: Url, query: &Query) -> Url {
    {
        let mut pairs = url.query_pairs_mut();
        pairs.append_pair("select", query.columns.trim());
        for filter in &query.filters {
            pairs.append_pair(&filter.column, &format!("eq.{}", filter.value));
        }
        if let Some(order) = &query.order {
            let direction = if order.ascending { "asc" } else { "desc" };
            pairs.append_pair("order", &format!("{}.{direction}", order.column));
        }
        if let Some(limit) = query.limit {
            pairs.append_pair("limit", &limit.to_string());
        }
    }
    url
}

/// Parses the total from `Content-Range: 0-4/5` or `*/5`.
fn parse_content_range_total(headers: &HeaderMap) -> Option<u64> {
    headers
        .get(CONTENT_RANGE)
        .and_then(|value: &HeaderValue| value.to_str().ok())
        .and_then(|range| range.rsplit_once('/'))
        .and_then(|(_, total)| total.trim().parse::<u64>().ok())
}

async fn decode_json<T: serde::de::DeserializeOwned>(response: Response) -> QueryResult<T> {
    response
        .json::<T>()
        .await
        .map_err(|err| QueryError::transport(format!("invalid response body: {err}")))
}

async fn error_from_response(response: Response) -> QueryError {
    let status = response.status();
    let body = response.text().await.unwrap_or_default();

    match serde_json::from_str::<QueryError>(&body) {
        Ok(err) if err.code.is_some() || !err.message.is_empty() => err,
        _ => {
            let message = if body.trim().is_empty() {
                format!("HTTP {status}")
            } else {
                format!("HTTP {status}: {}", body.trim())
            };
            QueryError::new(status.as_str(), message)
        }
    }
}
