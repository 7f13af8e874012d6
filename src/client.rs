//! Content delivery client.
//!
//! The [`ContentSource`] trait is the seam between page-level code and the
//! network: the resolver and page queries only ever see the trait, so tests run
//! against an in-memory source while production uses [`DeliveryClient`] over
//! the delivery REST API.
//!
//! | Operation | Endpoint |
//! |---|---|
//! | [`ContentSource::find`] | `GET /v3/content_types/{ct}/entries` |
//! | [`ContentSource::fetch_entry`] | `GET /v3/content_types/{ct}/entries/{uid}` |
//! | [`DeliveryClient::content_types`] | `GET /v3/content_types` |
//! | [`DeliveryClient::locales`] | `GET /v3/locales` |
//! | [`DeliveryClient::graphql`] | `POST graphql.contentstack.com/stacks/{api_key}` |
//!
//! No request is retried. Non-2xx responses become [`ClientError::Status`]
//! carrying the response body.

use crate::config::StackConfig;
use crate::locale::Locale;
use async_trait::async_trait;
use reqwest::{Client, RequestBuilder, StatusCode};
use serde::Deserialize;
use serde_json::{Map, Value, json};
use std::time::Duration;
use thiserror::Error;

/// Delivery host used unless the config names an override.
pub const DEFAULT_HOST: &str = "cdn.contentstack.io";

/// GraphQL delivery host.
pub const GRAPHQL_HOST: &str = "graphql.contentstack.com";

const REQUEST_TIMEOUT: Duration = Duration::from_secs(30);

#[derive(Error, Debug)]
pub enum ClientError {
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),
    #[error("Request failed with status {status}: {body}")]
    Status { status: StatusCode, body: String },
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
    #[error("Response is missing `{0}`")]
    MissingField(&'static str),
    #[error("Failed to load locales: {0}")]
    Locales(Box<ClientError>),
}

/// A query over the entries of one content type.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct EntryQuery {
    pub content_type_uid: String,
    pub locale: Option<Locale>,
    /// Reference fields the API should inline one level deep.
    pub include_references: Vec<String>,
    /// Field equality filters, combined with AND.
    pub filters: Vec<(String, Value)>,
    pub include_count: bool,
}

impl EntryQuery {
    pub fn new(content_type_uid: impl Into<String>) -> Self {
        Self {
            content_type_uid: content_type_uid.into(),
            ..Self::default()
        }
    }

    pub fn locale(mut self, locale: Locale) -> Self {
        self.locale = Some(locale);
        self
    }

    pub fn include_references<I, S>(mut self, fields: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.include_references
            .extend(fields.into_iter().map(Into::into));
        self
    }

    /// Restrict results to entries whose `field` equals `value`.
    pub fn where_eq(mut self, field: impl Into<String>, value: impl Into<Value>) -> Self {
        self.filters.push((field.into(), value.into()));
        self
    }

    pub fn include_count(mut self) -> Self {
        self.include_count = true;
        self
    }

    /// Query-string pairs for this query, excluding the environment.
    pub fn to_params(&self) -> Vec<(String, String)> {
        let mut params = Vec::new();
        if let Some(locale) = &self.locale {
            params.push(("locale".to_string(), locale.to_string()));
        }
        for field in &self.include_references {
            params.push(("include[]".to_string(), field.clone()));
        }
        if !self.filters.is_empty() {
            let filter: Map<String, Value> = self.filters.iter().cloned().collect();
            params.push(("query".to_string(), Value::Object(filter).to_string()));
        }
        if self.include_count {
            params.push(("include_count".to_string(), "true".to_string()));
        }
        params
    }
}

/// One page of query results.
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
pub struct EntryPage {
    #[serde(default)]
    pub entries: Vec<Value>,
    /// Total matching entries, present when the count was requested.
    #[serde(default)]
    pub count: Option<u64>,
}

/// Read access to published entries.
#[async_trait]
pub trait ContentSource: Send + Sync {
    /// Run an entry query, returning the first page of results.
    async fn find(&self, query: &EntryQuery) -> Result<EntryPage, ClientError>;

    /// Fetch a single entry by content type and uid.
    async fn fetch_entry(
        &self,
        content_type_uid: &str,
        entry_uid: &str,
        locale: &Locale,
    ) -> Result<Value, ClientError>;
}

/// HTTP client for the delivery API.
#[derive(Debug, Clone)]
pub struct DeliveryClient {
    http: Client,
    host: String,
    api_key: String,
    delivery_token: String,
    environment: String,
}

impl DeliveryClient {
    /// Build a client from stack credentials, applying any host override.
    pub fn new(stack: &StackConfig) -> Result<Self, ClientError> {
        let http = Client::builder().timeout(REQUEST_TIMEOUT).build()?;
        let mut client = Self {
            http,
            host: DEFAULT_HOST.to_string(),
            api_key: stack.api_key.clone(),
            delivery_token: stack.delivery_token.clone(),
            environment: stack.environment.clone(),
        };
        if let Some(host) = stack.delivery_host() {
            client.set_host(host);
        }
        Ok(client)
    }

    /// Point the client at a different delivery host.
    pub fn set_host(&mut self, host: impl Into<String>) {
        let host = host.into();
        tracing::debug!(%host, "delivery host override");
        self.host = host;
    }

    pub fn host(&self) -> &str {
        &self.host
    }

    fn url(&self, path: &str) -> String {
        format!("https://{}/v3/{}", self.host, path.trim_start_matches('/'))
    }

    /// URL for the GraphQL endpoint of this stack.
    pub fn graphql_url(&self) -> String {
        format!(
            "https://{GRAPHQL_HOST}/stacks/{}?environment={}",
            self.api_key, self.environment
        )
    }

    fn get(&self, path: &str) -> RequestBuilder {
        self.http
            .get(self.url(path))
            .header("api_key", &self.api_key)
            .header("access_token", &self.delivery_token)
            .query(&[("environment", &self.environment)])
    }

    async fn send_json(request: RequestBuilder) -> Result<Value, ClientError> {
        let response = request.send().await?;
        let status = response.status();
        decode_body(status, response.text().await)
    }

    /// List every content type, including global field schemas.
    pub async fn content_types(&self) -> Result<Vec<Value>, ClientError> {
        let request = self
            .get("content_types")
            .query(&[("include_global_field_schema", "true")]);
        let mut body = Self::send_json(request).await?;
        take_array(&mut body, "content_types")
    }

    /// List the locales published on this stack.
    pub async fn locales(&self) -> Result<Vec<Value>, ClientError> {
        let result = async {
            let mut body = Self::send_json(self.get("locales")).await?;
            take_array(&mut body, "locales")
        }
        .await;
        result.map_err(|err| ClientError::Locales(Box::new(err)))
    }

    /// Run a raw GraphQL query and return the response body verbatim.
    pub async fn graphql(&self, query: &str) -> Result<Value, ClientError> {
        let request = self
            .http
            .post(self.graphql_url())
            .header("access_token", &self.delivery_token)
            .json(&json!({ "query": query }));
        Self::send_json(request).await
    }
}

#[async_trait]
impl ContentSource for DeliveryClient {
    async fn find(&self, query: &EntryQuery) -> Result<EntryPage, ClientError> {
        let path = format!("content_types/{}/entries", query.content_type_uid);
        let request = self.get(&path).query(&query.to_params());
        entry_page(Self::send_json(request).await?)
    }

    async fn fetch_entry(
        &self,
        content_type_uid: &str,
        entry_uid: &str,
        locale: &Locale,
    ) -> Result<Value, ClientError> {
        let path = format!("content_types/{content_type_uid}/entries/{entry_uid}");
        let request = self.get(&path).query(&[("locale", locale.as_str())]);
        take_entry(Self::send_json(request).await?)
    }
}

/// Turn a response status and body text into JSON, or a status error carrying
/// the body.
fn decode_body(
    status: StatusCode,
    text: Result<String, reqwest::Error>,
) -> Result<Value, ClientError> {
    if !status.is_success() {
        let body = text.unwrap_or_else(|_| "Unknown error".to_string());
        return Err(ClientError::Status { status, body });
    }
    Ok(serde_json::from_str(&text?)?)
}

fn entry_page(body: Value) -> Result<EntryPage, ClientError> {
    Ok(serde_json::from_value(body)?)
}

fn take_entry(mut body: Value) -> Result<Value, ClientError> {
    body.get_mut("entry")
        .map(Value::take)
        .ok_or(ClientError::MissingField("entry"))
}

fn take_array(body: &mut Value, field: &'static str) -> Result<Vec<Value>, ClientError> {
    match body.get_mut(field).map(Value::take) {
        Some(Value::Array(items)) => Ok(items),
        _ => Err(ClientError::MissingField(field)),
    }
}
