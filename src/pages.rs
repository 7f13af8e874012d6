//! Page-level content queries.
//!
//! These are the calls page code makes: fetch a content type's entries, find
//! the entry for a URL, resolve every reference inside a collection. [`Pages`]
//! wraps a [`ContentSource`] together with the content settings from the site
//! config, so every query applies the same default locale and reference depth.
//!
//! Error policy differs per call and mirrors how pages use them:
//!
//! | Call | On failure |
//! |------|-----------|
//! | [`Pages::get_entry`], [`Pages::get_entry_by_url`], [`Pages::get_entry_by_uid`] | logged, propagated |
//! | [`Pages::get_all_entries_by_content_type`] | logged, empty result |
//! | nested references inside any resolved entry | logged, stub kept |

use crate::client::{ClientError, ContentSource, DeliveryClient, EntryQuery};
use crate::config::ContentConfig;
use crate::locale::Locale;
use crate::resolver::{ResolvedEntry, Resolver};
use crate::richtext::{RenderOptions, json_to_html};
use serde_json::Value;

/// Arguments of [`Pages::get_entry`].
#[derive(Debug, Clone, Default)]
pub struct GetEntry {
    pub content_type_uid: String,
    /// Reference fields to inline in the query.
    pub reference_field_path: Vec<String>,
    /// Rich-text fields to render to HTML.
    pub json_rte_path: Vec<String>,
}

/// Arguments of [`Pages::get_entry_by_url`].
#[derive(Debug, Clone, Default)]
pub struct GetEntryByUrl {
    pub content_type_uid: String,
    pub entry_url: String,
    pub reference_field_path: Vec<String>,
    pub locale: Option<String>,
}

/// Content queries bound to a source and the site's content settings.
pub struct Pages<'s, S: ?Sized> {
    source: &'s S,
    default_locale: Locale,
    max_reference_depth: usize,
    render_options: RenderOptions,
}

impl<'s, S> Pages<'s, S>
where
    S: ContentSource + ?Sized,
{
    pub fn new(source: &'s S, config: &ContentConfig) -> Self {
        Self {
            source,
            default_locale: config.default_locale.clone(),
            max_reference_depth: config.max_reference_depth,
            render_options: RenderOptions::site(),
        }
    }

    /// Normalize a requested locale, falling back to the configured default.
    pub fn locale(&self, requested: Option<&str>) -> Locale {
        requested
            .filter(|code| !code.trim().is_empty())
            .map(Locale::new)
            .unwrap_or_else(|| self.default_locale.clone())
    }

    pub fn resolver(&self, locale: Locale) -> Resolver<'s, S> {
        Resolver::new(self.source, locale).with_max_depth(self.max_reference_depth)
    }

    /// All entries of a content type with the given references inlined and
    /// rich-text fields rendered to HTML.
    pub async fn get_entry(&self, request: &GetEntry) -> Result<Vec<Value>, ClientError> {
        let query = EntryQuery::new(&request.content_type_uid)
            .include_references(request.reference_field_path.iter().cloned());
        let page = self.source.find(&query).await.inspect_err(|err| {
            tracing::error!(content_type = %request.content_type_uid, error = %err, "entry query failed");
        })?;
        let mut entries = page.entries;
        for entry in &mut entries {
            json_to_html(entry, &request.json_rte_path, &self.render_options);
        }
        Ok(entries)
    }

    /// The entry of a content type whose `url` field equals `entry_url`.
    ///
    /// Returns `Ok(None)` when no entry matches.
    pub async fn get_entry_by_url(
        &self,
        request: &GetEntryByUrl,
    ) -> Result<Option<Value>, ClientError> {
        let locale = self.locale(request.locale.as_deref());
        let query = EntryQuery::new(&request.content_type_uid)
            .locale(locale)
            .include_references(request.reference_field_path.iter().cloned())
            .where_eq("url", request.entry_url.as_str());
        let page = self.source.find(&query).await.inspect_err(|err| {
            tracing::error!(
                content_type = %request.content_type_uid,
                url = %request.entry_url,
                error = %err,
                "entry by url query failed"
            );
        })?;
        Ok(page.entries.into_iter().next())
    }

    /// A single entry by uid, in the default locale.
    pub async fn get_entry_by_uid(
        &self,
        content_type_uid: &str,
        entry_uid: &str,
    ) -> Result<Value, ClientError> {
        self.source
            .fetch_entry(content_type_uid, entry_uid, &self.default_locale)
            .await
            .inspect_err(|err| {
                tracing::error!(
                    content_type = %content_type_uid,
                    uid = %entry_uid,
                    error = %err,
                    "error fetching entry"
                );
            })
    }

    /// Resolve every reference inside `entry`.
    pub async fn resolve_nested_entry(&self, entry: &Value, locale: Option<&str>) -> ResolvedEntry {
        self.resolver(self.locale(locale)).resolve(entry).await
    }

    /// Every entry of a content type (first page), fully resolved.
    ///
    /// A failed query is logged and yields an empty list; failed references
    /// inside entries keep their stubs.
    pub async fn get_all_entries_by_content_type(
        &self,
        content_type_uid: &str,
        locale: Option<&str>,
    ) -> Vec<ResolvedEntry> {
        let locale = self.locale(locale);
        let query = EntryQuery::new(content_type_uid)
            .locale(locale.clone())
            .include_count();
        let page = match self.source.find(&query).await {
            Ok(page) => page,
            Err(err) => {
                tracing::error!(content_type = %content_type_uid, error = %err, "error fetching entries");
                return Vec::new();
            }
        };
        tracing::debug!(
            content_type = %content_type_uid,
            fetched = page.entries.len(),
            total = ?page.count,
            "resolving entries"
        );
        self.resolver(locale).resolve_all(&page.entries).await
    }
}

/// The first value at a dotted `path` inside `entry`.
///
/// Arrays along the way are searched element by element, so
/// `page_components.hero_carousel` finds the carousel block wherever it sits
/// in the component list.
pub fn field_at<'a>(entry: &'a Value, path: &str) -> Option<&'a Value> {
    fn descend<'a>(node: &'a Value, keys: &[&str]) -> Option<&'a Value> {
        let Some((first, rest)) = keys.split_first() else {
            return Some(node);
        };
        match node {
            Value::Array(items) => items.iter().find_map(|item| descend(item, keys)),
            Value::Object(map) => map.get(*first).and_then(|child| descend(child, rest)),
            _ => None,
        }
    }
    let keys: Vec<&str> = path.split('.').filter(|key| !key.is_empty()).collect();
    descend(entry, &keys)
}

/// Every content type on the stack, with global field schemas.
pub async fn get_all_content_types(client: &DeliveryClient) -> Result<Vec<Value>, ClientError> {
    client.content_types().await.inspect_err(|err| {
        tracing::error!(error = %err, "error fetching content types");
    })
}

/// Every locale published on the stack.
pub async fn get_locales(client: &DeliveryClient) -> Result<Vec<Value>, ClientError> {
    client.locales().await.inspect_err(|err| {
        tracing::error!(error = %err, "error fetching locales");
    })
}

/// Run a GraphQL query and return the provider's response verbatim.
pub async fn execute_graphql_query(
    client: &DeliveryClient,
    query: &str,
) -> Result<Value, ClientError> {
    client.graphql(query).await.inspect_err(|err| {
        tracing::error!(error = %err, "GraphQL fetch failed");
    })
}
