//! Reference resolution for fetched entries.
//!
//! Entries returned by the delivery API embed other entries as reference stubs:
//!
//! ```json
//! { "uid": "blt5c7a", "_content_type_uid": "hero_banner" }
//! ```
//!
//! [`Resolver::resolve`] walks an entry and replaces every stub with the
//! referenced entry, itself resolved, producing a fully denormalized entry.
//!
//! # Walk
//!
//! Every node is classified into a [`NodeKind`] before dispatch:
//!
//! | Kind | Action |
//! |------|--------|
//! | `Sequence` | resolve elements concurrently, keep order |
//! | `Reference` | fetch, then resolve the fetched entry's fields |
//! | `Mapping` | resolve values concurrently, keep keys |
//! | `Scalar` | returned unchanged |
//!
//! Siblings share nothing, so their fetches are issued together with
//! [`join_all`]. A reference's own subtree is only walked once its fetch
//! has returned.
//!
//! # Failures
//!
//! A reference that cannot be followed stays in the output as the original stub.
//! The per-reference outcome is a [`Resolution`]; the walk collects every
//! fallback into [`ResolvedEntry::unresolved`] so callers can tell a clean
//! result from a degraded one. Nothing is retried and nothing propagates: one
//! broken reference degrades only its own subtree.
//!
//! A reference is not followed when it already appears among its own
//! ancestors ([`ResolveError::Cycle`]) or when the chain of references above it
//! reaches the depth limit ([`ResolveError::DepthExceeded`]).

use crate::client::{ClientError, ContentSource};
use crate::locale::Locale;
use futures::FutureExt;
use futures::future::{BoxFuture, join_all};
use serde_json::{Map, Value};
use std::fmt;
use thiserror::Error;

/// Default limit on nested reference chains.
pub const DEFAULT_MAX_DEPTH: usize = 10;

const UID_KEY: &str = "uid";
const CONTENT_TYPE_KEY: &str = "_content_type_uid";

#[derive(Error, Debug)]
pub enum ResolveError {
    #[error("fetch failed: {0}")]
    Fetch(#[from] ClientError),
    #[error("reference cycle through {0}")]
    Cycle(ReferenceStub),
    #[error("reference depth limit of {limit} exceeded")]
    DepthExceeded { limit: usize },
}

/// Pointer to an entry that has not been fetched.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct ReferenceStub {
    pub uid: String,
    pub content_type_uid: String,
}

impl ReferenceStub {
    /// Recognize a stub: a mapping with non-empty string `uid` and
    /// `_content_type_uid` fields.
    pub fn from_map(map: &Map<String, Value>) -> Option<Self> {
        let field = |key: &str| {
            map.get(key)
                .and_then(Value::as_str)
                .filter(|s| !s.is_empty())
        };
        Some(Self {
            uid: field(UID_KEY)?.to_string(),
            content_type_uid: field(CONTENT_TYPE_KEY)?.to_string(),
        })
    }

    pub fn to_value(&self) -> Value {
        let mut map = Map::new();
        map.insert(UID_KEY.to_string(), Value::String(self.uid.clone()));
        map.insert(
            CONTENT_TYPE_KEY.to_string(),
            Value::String(self.content_type_uid.clone()),
        );
        Value::Object(map)
    }
}

impl fmt::Display for ReferenceStub {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}/{}", self.content_type_uid, self.uid)
    }
}

/// Shape of a node, decided once before the walk dispatches on it.
#[derive(Debug, PartialEq)]
pub enum NodeKind<'a> {
    Sequence(&'a [Value]),
    Reference(ReferenceStub),
    Mapping(&'a Map<String, Value>),
    Scalar(&'a Value),
}

impl<'a> NodeKind<'a> {
    pub fn classify(node: &'a Value) -> Self {
        match node {
            Value::Array(items) => NodeKind::Sequence(items),
            Value::Object(map) => match ReferenceStub::from_map(map) {
                Some(stub) => NodeKind::Reference(stub),
                None => NodeKind::Mapping(map),
            },
            scalar => NodeKind::Scalar(scalar),
        }
    }
}

/// Outcome of following one reference.
#[derive(Debug)]
pub enum Resolution {
    /// The referenced entry, fetched and resolved.
    Resolved(Value),
    /// The reference could not be followed; `original` is the stub as found.
    Unresolved { original: Value, cause: ResolveError },
}

impl Resolution {
    pub fn is_resolved(&self) -> bool {
        matches!(self, Resolution::Resolved(_))
    }

    /// The value to place in the output tree.
    pub fn into_value(self) -> Value {
        match self {
            Resolution::Resolved(value) => value,
            Resolution::Unresolved { original, .. } => original,
        }
    }
}

/// A reference left in place, with its location in the entry.
#[derive(Debug)]
pub struct UnresolvedReference {
    /// JSON path of the stub, e.g. `$.page_components[2].hero`.
    pub path: String,
    pub stub: ReferenceStub,
    pub cause: ResolveError,
}

/// A resolved entry and the references that had to be left unresolved.
#[derive(Debug, Default)]
pub struct ResolvedEntry {
    pub value: Value,
    pub unresolved: Vec<UnresolvedReference>,
}

impl ResolvedEntry {
    fn clean(value: Value) -> Self {
        Self {
            value,
            unresolved: Vec::new(),
        }
    }

    /// True when every reference was followed.
    pub fn is_complete(&self) -> bool {
        self.unresolved.is_empty()
    }

    pub fn into_value(self) -> Value {
        self.value
    }
}

/// Resolves references against a [`ContentSource`] in one locale.
pub struct Resolver<'s, S: ?Sized> {
    source: &'s S,
    locale: Locale,
    max_depth: usize,
}

impl<'s, S> Resolver<'s, S>
where
    S: ContentSource + ?Sized,
{
    pub fn new(source: &'s S, locale: Locale) -> Self {
        Self {
            source,
            locale,
            max_depth: DEFAULT_MAX_DEPTH,
        }
    }

    /// Limit how many references deep a chain may be followed.
    pub fn with_max_depth(mut self, max_depth: usize) -> Self {
        self.max_depth = max_depth;
        self
    }

    pub fn locale(&self) -> &Locale {
        &self.locale
    }

    /// Resolve every reference reachable from `node`.
    pub async fn resolve(&self, node: &Value) -> ResolvedEntry {
        self.walk(node, "$".to_string(), &[]).await
    }

    /// Resolve several entries concurrently, preserving order.
    pub async fn resolve_all(&self, nodes: &[Value]) -> Vec<ResolvedEntry> {
        join_all(nodes.iter().map(|node| self.resolve(node))).await
    }

    /// Follow a single reference.
    ///
    /// Failures deeper inside the fetched entry fall back in place and do not
    /// affect the outcome; use [`resolve`](Self::resolve) to see them.
    pub async fn resolve_reference(&self, stub: &ReferenceStub) -> Resolution {
        let (resolution, _) = self
            .follow(&stub.to_value(), stub.clone(), "$".to_string(), &[])
            .await;
        resolution
    }

    fn walk<'a>(
        &'a self,
        node: &'a Value,
        path: String,
        chain: &'a [ReferenceStub],
    ) -> BoxFuture<'a, ResolvedEntry> {
        async move {
            match NodeKind::classify(node) {
                NodeKind::Scalar(value) => ResolvedEntry::clean(value.clone()),
                NodeKind::Sequence(items) => {
                    let branches = items
                        .iter()
                        .enumerate()
                        .map(|(i, item)| self.walk(item, format!("{path}[{i}]"), chain));
                    let mut unresolved = Vec::new();
                    let values = join_all(branches)
                        .await
                        .into_iter()
                        .map(|branch| {
                            unresolved.extend(branch.unresolved);
                            branch.value
                        })
                        .collect();
                    ResolvedEntry {
                        value: Value::Array(values),
                        unresolved,
                    }
                }
                NodeKind::Mapping(map) => self.walk_fields(map, path, chain).await,
                NodeKind::Reference(stub) => {
                    let (resolution, nested) = self.follow(node, stub.clone(), path.clone(), chain).await;
                    match resolution {
                        Resolution::Resolved(value) => ResolvedEntry {
                            value,
                            unresolved: nested,
                        },
                        Resolution::Unresolved { original, cause } => ResolvedEntry {
                            value: original,
                            unresolved: vec![UnresolvedReference { path, stub, cause }],
                        },
                    }
                }
            }
        }
        .boxed()
    }

    async fn walk_fields(
        &self,
        map: &Map<String, Value>,
        path: String,
        chain: &[ReferenceStub],
    ) -> ResolvedEntry {
        let branches = map
            .iter()
            .map(|(key, value)| self.walk(value, format!("{path}.{key}"), chain));
        let walked = join_all(branches).await;

        let mut unresolved = Vec::new();
        let mut fields = Map::new();
        for (key, branch) in map.keys().zip(walked) {
            unresolved.extend(branch.unresolved);
            fields.insert(key.clone(), branch.value);
        }
        ResolvedEntry {
            value: Value::Object(fields),
            unresolved,
        }
    }

    /// Fetch a referenced entry and resolve it. Returns the outcome for this
    /// reference and any fallbacks that happened inside the fetched entry.
    async fn follow(
        &self,
        original: &Value,
        stub: ReferenceStub,
        path: String,
        chain: &[ReferenceStub],
    ) -> (Resolution, Vec<UnresolvedReference>) {
        let refuse = |cause: ResolveError| {
            tracing::warn!(reference = %stub, %path, error = %cause, "reference not followed");
            Resolution::Unresolved {
                original: original.clone(),
                cause,
            }
        };
        if chain.contains(&stub) {
            return (refuse(ResolveError::Cycle(stub.clone())), Vec::new());
        }
        if chain.len() >= self.max_depth {
            let limit = self.max_depth;
            return (refuse(ResolveError::DepthExceeded { limit }), Vec::new());
        }

        let fetched = match self
            .source
            .fetch_entry(&stub.content_type_uid, &stub.uid, &self.locale)
            .await
        {
            Ok(fetched) => fetched,
            Err(err) => {
                tracing::error!(reference = %stub, %path, error = %err, "failed to resolve reference");
                let resolution = Resolution::Unresolved {
                    original: original.clone(),
                    cause: err.into(),
                };
                return (resolution, Vec::new());
            }
        };

        let mut child_chain = chain.to_vec();
        child_chain.push(stub);
        // The fetched entry is walked by its fields: an entry that echoes its
        // own uid and content type is not a stub to fetch again.
        let walked = match &fetched {
            Value::Object(map) => self.walk_fields(map, path, &child_chain).await,
            other => self.walk(other, path, &child_chain).await,
        };
        (Resolution::Resolved(walked.value), walked.unresolved)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_helpers::MockSource;
    use serde_json::json;

    fn stub(content_type: &str, uid: &str) -> Value {
        json!({ "uid": uid, "_content_type_uid": content_type })
    }

    #[test]
    fn classify_scalars() {
        for value in [json!(null), json!(1), json!("text"), json!(true)] {
            assert!(matches!(NodeKind::classify(&value), NodeKind::Scalar(_)));
        }
    }

    #[test]
    fn classify_sequence_and_mapping() {
        assert!(matches!(
            NodeKind::classify(&json!([1, 2])),
            NodeKind::Sequence(items) if items.len() == 2
        ));
        assert!(matches!(
            NodeKind::classify(&json!({ "title": "Home" })),
            NodeKind::Mapping(_)
        ));
    }

    #[test]
    fn classify_reference_needs_both_fields() {
        assert_eq!(
            NodeKind::classify(&stub("banner", "b1")),
            NodeKind::Reference(ReferenceStub {
                uid: "b1".into(),
                content_type_uid: "banner".into(),
            })
        );
        assert!(matches!(
            NodeKind::classify(&json!({ "uid": "b1" })),
            NodeKind::Mapping(_)
        ));
        assert!(matches!(
            NodeKind::classify(&json!({ "uid": "", "_content_type_uid": "banner" })),
            NodeKind::Mapping(_)
        ));
        assert!(matches!(
            NodeKind::classify(&json!({ "uid": 7, "_content_type_uid": "banner" })),
            NodeKind::Mapping(_)
        ));
    }

    #[tokio::test]
    async fn fully_resolved_entry_is_unchanged() {
        let source = MockSource::new();
        let entry = json!({
            "uid": "page1",
            "title": "Home",
            "tags": ["a", "b"],
            "seo": { "meta_title": "Home", "enable_search_indexing": true },
            "count": 3,
            "hero": null
        });
        let resolved = Resolver::new(&source, Locale::default()).resolve(&entry).await;
        assert!(resolved.is_complete());
        assert_eq!(resolved.value, entry);
        assert!(source.fetches().is_empty());
    }

    #[tokio::test]
    async fn field_order_preserved() {
        let source = MockSource::new().with_entry(
            "banner",
            "b1",
            json!({ "title": "Spring", "bg_color": "#fff", "banner_description": "New" }),
        );
        let entry = json!({
            "url": "/",
            "title": "Home",
            "hero": stub("banner", "b1"),
            "seo": {}
        });
        let resolved = Resolver::new(&source, Locale::default()).resolve(&entry).await;

        let keys: Vec<&str> = resolved
            .value
            .as_object()
            .unwrap()
            .keys()
            .map(String::as_str)
            .collect();
        assert_eq!(keys, ["url", "title", "hero", "seo"]);
        let hero: Vec<&str> = resolved.value["hero"]
            .as_object()
            .unwrap()
            .keys()
            .map(String::as_str)
            .collect();
        assert_eq!(hero, ["title", "bg_color", "banner_description"]);
    }

    #[tokio::test]
    async fn three_level_chain_is_inlined() {
        let source = MockSource::new()
            .with_entry("banner", "b1", json!({ "uid": "b1", "title": "Banner", "cta": stub("link", "l1") }))
            .with_entry("link", "l1", json!({ "uid": "l1", "href": "/shop" }));
        let entry = json!({ "uid": "p1", "hero": stub("banner", "b1") });

        let resolved = Resolver::new(&source, Locale::default()).resolve(&entry).await;

        assert!(resolved.is_complete());
        assert_eq!(
            resolved.value,
            json!({
                "uid": "p1",
                "hero": {
                    "uid": "b1",
                    "title": "Banner",
                    "cta": { "uid": "l1", "href": "/shop" }
                }
            })
        );
    }

    #[tokio::test]
    async fn failed_reference_keeps_stub_and_siblings_resolve() {
        let source = MockSource::new()
            .with_entry("banner", "ok", json!({ "uid": "ok", "title": "Fine" }))
            .with_failure("banner", "broken");
        let entry = json!({
            "first": stub("banner", "broken"),
            "second": stub("banner", "ok")
        });

        let resolved = Resolver::new(&source, Locale::default()).resolve(&entry).await;

        assert_eq!(resolved.value["first"], stub("banner", "broken"));
        assert_eq!(resolved.value["second"]["title"], "Fine");
        assert_eq!(resolved.unresolved.len(), 1);
        let failure = &resolved.unresolved[0];
        assert_eq!(failure.path, "$.first");
        assert_eq!(failure.stub.uid, "broken");
        assert!(matches!(failure.cause, ResolveError::Fetch(_)));
    }

    #[tokio::test]
    async fn sequence_order_preserved() {
        let source = MockSource::new()
            .with_entry("card", "c1", json!({ "n": 1 }))
            .with_entry("card", "c2", json!({ "n": 2 }))
            .with_entry("card", "c3", json!({ "n": 3 }));
        let entry = json!([stub("card", "c1"), "plain", stub("card", "c2"), stub("card", "c3")]);

        let resolved = Resolver::new(&source, Locale::default()).resolve(&entry).await;

        assert_eq!(resolved.value, json!([{ "n": 1 }, "plain", { "n": 2 }, { "n": 3 }]));
    }

    #[tokio::test]
    async fn nested_failure_reports_path() {
        let source = MockSource::new()
            .with_entry("section", "s1", json!({ "cards": [stub("card", "missing")] }));
        let entry = json!({ "sections": [stub("section", "s1")] });

        let resolved = Resolver::new(&source, Locale::default()).resolve(&entry).await;

        assert_eq!(resolved.value["sections"][0]["cards"][0], stub("card", "missing"));
        assert_eq!(resolved.unresolved.len(), 1);
        assert_eq!(resolved.unresolved[0].path, "$.sections[0].cards[0]");
    }

    #[tokio::test]
    async fn fetches_use_resolver_locale() {
        let source = MockSource::new().with_entry("banner", "b1", json!({ "title": "Hola" }));
        let entry = json!({ "hero": stub("banner", "b1") });

        Resolver::new(&source, Locale::new("ES-MX")).resolve(&entry).await;

        assert_eq!(
            source.fetches(),
            vec![("banner".to_string(), "b1".to_string(), "es-mx".to_string())]
        );
    }

    #[tokio::test]
    async fn cycle_is_not_followed() {
        let source = MockSource::new()
            .with_entry("page", "a", json!({ "uid": "a", "next": stub("page", "b") }))
            .with_entry("page", "b", json!({ "uid": "b", "next": stub("page", "a") }));
        let entry = json!({ "start": stub("page", "a") });

        let resolved = Resolver::new(&source, Locale::default()).resolve(&entry).await;

        assert_eq!(resolved.value["start"]["next"]["next"], stub("page", "a"));
        assert_eq!(resolved.unresolved.len(), 1);
        assert!(matches!(resolved.unresolved[0].cause, ResolveError::Cycle(_)));
        assert_eq!(source.fetches().len(), 2);
    }

    #[tokio::test]
    async fn self_describing_entry_is_not_refetched() {
        let source = MockSource::new().with_entry(
            "banner",
            "b1",
            json!({ "uid": "b1", "_content_type_uid": "banner", "title": "Banner" }),
        );
        let entry = json!({ "hero": stub("banner", "b1") });

        let resolved = Resolver::new(&source, Locale::default()).resolve(&entry).await;

        assert!(resolved.is_complete());
        assert_eq!(resolved.value["hero"]["title"], "Banner");
        assert_eq!(source.fetches().len(), 1);
    }

    #[tokio::test]
    async fn depth_limit_stops_chain() {
        let source = MockSource::new()
            .with_entry("node", "n1", json!({ "child": stub("node", "n2") }))
            .with_entry("node", "n2", json!({ "child": stub("node", "n3") }))
            .with_entry("node", "n3", json!({ "leaf": true }));
        let entry = json!({ "root": stub("node", "n1") });

        let resolved = Resolver::new(&source, Locale::default())
            .with_max_depth(2)
            .resolve(&entry)
            .await;

        assert_eq!(resolved.value["root"]["child"]["child"], stub("node", "n3"));
        assert!(matches!(
            resolved.unresolved[0].cause,
            ResolveError::DepthExceeded { limit: 2 }
        ));
    }

    #[tokio::test]
    async fn resolve_reference_reports_outcome() {
        let source = MockSource::new()
            .with_entry("banner", "b1", json!({ "title": "Banner" }))
            .with_failure("banner", "b2");
        let resolver = Resolver::new(&source, Locale::default());

        let ok = resolver
            .resolve_reference(&ReferenceStub {
                uid: "b1".into(),
                content_type_uid: "banner".into(),
            })
            .await;
        assert!(ok.is_resolved());
        assert_eq!(ok.into_value(), json!({ "title": "Banner" }));

        let failed = resolver
            .resolve_reference(&ReferenceStub {
                uid: "b2".into(),
                content_type_uid: "banner".into(),
            })
            .await;
        match failed {
            Resolution::Unresolved { original, cause } => {
                assert_eq!(original, stub("banner", "b2"));
                assert!(matches!(cause, ResolveError::Fetch(_)));
            }
            Resolution::Resolved(_) => panic!("expected unresolved"),
        }
    }

    #[tokio::test]
    async fn resolve_all_preserves_order() {
        let source = MockSource::new().with_entry("tag", "t1", json!({ "name": "news" }));
        let entries = vec![json!({ "tag": stub("tag", "t1") }), json!({ "title": "plain" })];

        let resolved = Resolver::new(&source, Locale::default())
            .resolve_all(&entries)
            .await;

        assert_eq!(resolved.len(), 2);
        assert_eq!(resolved[0].value["tag"]["name"], "news");
        assert_eq!(resolved[1].value["title"], "plain");
    }
}
