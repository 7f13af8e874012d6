//! Shared test utilities for the stackfront test suite.
//!
//! [`MockSource`] is an in-memory [`ContentSource`] that serves canned entries
//! and query pages, fails on request, and records every call so tests can
//! assert what was fetched and in which locale.
//!
//! ```rust,ignore
//! let source = MockSource::new()
//!     .with_entry("hero_banner", "b1", json!({ "title": "Spring" }))
//!     .with_failure("hero_banner", "b2");
//! ```

use crate::client::{ClientError, ContentSource, EntryPage, EntryQuery};
use crate::locale::Locale;
use async_trait::async_trait;
use reqwest::StatusCode;
use serde_json::Value;
use std::collections::{HashMap, HashSet};
use std::sync::Mutex;

/// Mock content source. Uses Mutex so it is Sync like the real client.
#[derive(Default)]
pub struct MockSource {
    entries: HashMap<(String, String), Value>,
    failing: HashSet<(String, String)>,
    pages: HashMap<String, EntryPage>,
    failing_queries: HashSet<String>,
    fetches: Mutex<Vec<(String, String, String)>>,
    queries: Mutex<Vec<EntryQuery>>,
}

impl MockSource {
    pub fn new() -> Self {
        Self::default()
    }

    /// Serve `entry` for `content_type/uid`.
    pub fn with_entry(mut self, content_type: &str, uid: &str, entry: Value) -> Self {
        self.entries
            .insert((content_type.to_string(), uid.to_string()), entry);
        self
    }

    /// Fail every fetch of `content_type/uid`.
    pub fn with_failure(mut self, content_type: &str, uid: &str) -> Self {
        self.failing
            .insert((content_type.to_string(), uid.to_string()));
        self
    }

    /// Answer queries on `content_type` with these entries.
    pub fn with_page(mut self, content_type: &str, entries: Vec<Value>) -> Self {
        let count = Some(entries.len() as u64);
        self.pages
            .insert(content_type.to_string(), EntryPage { entries, count });
        self
    }

    /// Fail every query on `content_type`.
    pub fn with_failing_query(mut self, content_type: &str) -> Self {
        self.failing_queries.insert(content_type.to_string());
        self
    }

    /// Recorded single-entry fetches as `(content_type, uid, locale)`.
    pub fn fetches(&self) -> Vec<(String, String, String)> {
        self.fetches.lock().unwrap().clone()
    }

    /// Recorded queries, in call order.
    pub fn queries(&self) -> Vec<EntryQuery> {
        self.queries.lock().unwrap().clone()
    }
}

fn not_found(what: String) -> ClientError {
    ClientError::Status {
        status: StatusCode::NOT_FOUND,
        body: format!("{what} not found"),
    }
}

#[async_trait]
impl ContentSource for MockSource {
    async fn find(&self, query: &EntryQuery) -> Result<EntryPage, ClientError> {
        self.queries.lock().unwrap().push(query.clone());
        let content_type = &query.content_type_uid;
        if self.failing_queries.contains(content_type) {
            return Err(ClientError::Status {
                status: StatusCode::INTERNAL_SERVER_ERROR,
                body: "query failed".to_string(),
            });
        }
        let mut page = self.pages.get(content_type).cloned().unwrap_or_default();
        for (field, expected) in &query.filters {
            page.entries
                .retain(|entry| entry.get(field) == Some(expected));
        }
        Ok(page)
    }

    async fn fetch_entry(
        &self,
        content_type_uid: &str,
        entry_uid: &str,
        locale: &Locale,
    ) -> Result<Value, ClientError> {
        self.fetches.lock().unwrap().push((
            content_type_uid.to_string(),
            entry_uid.to_string(),
            locale.to_string(),
        ));
        let key = (content_type_uid.to_string(), entry_uid.to_string());
        if self.failing.contains(&key) {
            return Err(not_found(format!("{content_type_uid}/{entry_uid}")));
        }
        self.entries
            .get(&key)
            .cloned()
            .ok_or_else(|| not_found(format!("{content_type_uid}/{entry_uid}")))
    }
}
