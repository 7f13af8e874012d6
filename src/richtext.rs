//! JSON rich-text to HTML.
//!
//! Rich-text fields arrive as a node tree:
//!
//! ```json
//! { "type": "doc", "children": [
//!     { "type": "p", "children": [ { "text": "Hello ", "bold": true }, { "text": "world" } ] }
//! ] }
//! ```
//!
//! [`json_to_html`] replaces the trees found at the given field paths with
//! their HTML rendering, in place. Element nodes render through a rule table:
//! a rule registered in [`RenderOptions`] for a node type wins over the built-in
//! markup. The site installs one rule, for `span`, which emits the children
//! without a wrapper ([`RenderOptions::site`]).
//!
//! All text passes through maud, so it is escaped.

use maud::{Markup, html};
use serde_json::Value;
use std::collections::HashMap;
use std::fmt;

/// Renders one element node given its already-rendered children.
pub type NodeRule = Box<dyn Fn(&Value, Markup) -> Markup + Send + Sync>;

/// Per-node-type overrides of the built-in markup.
#[derive(Default)]
pub struct RenderOptions {
    rules: HashMap<String, NodeRule>,
}

impl fmt::Debug for RenderOptions {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut types: Vec<&str> = self.rules.keys().map(String::as_str).collect();
        types.sort_unstable();
        f.debug_struct("RenderOptions").field("rules", &types).finish()
    }
}

impl RenderOptions {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a rule for `node_type`, replacing any earlier one.
    pub fn rule<F>(mut self, node_type: &str, rule: F) -> Self
    where
        F: Fn(&Value, Markup) -> Markup + Send + Sync + 'static,
    {
        self.rules.insert(node_type.to_string(), Box::new(rule));
        self
    }

    /// The options the site renders with: `span` passes its children through.
    pub fn site() -> Self {
        Self::new().rule("span", |_node, children| children)
    }
}

/// Render a rich-text node (usually a `doc`) to HTML.
pub fn render(node: &Value, options: &RenderOptions) -> Markup {
    if let Some(text) = node.get("text").and_then(Value::as_str) {
        return render_text(node, text);
    }
    let children = html! {
        @if let Some(children) = node.get("children").and_then(Value::as_array) {
            @for child in children {
                (render(child, options))
            }
        }
    };
    let node_type = node.get("type").and_then(Value::as_str).unwrap_or_default();
    match options.rules.get(node_type) {
        Some(rule) => rule(node, children),
        None => render_element(node_type, node, children),
    }
}

fn attr<'a>(node: &'a Value, name: &str) -> Option<&'a str> {
    node.get("attrs")?.get(name)?.as_str()
}

fn render_element(node_type: &str, node: &Value, children: Markup) -> Markup {
    match node_type {
        "p" => html! { p { (children) } },
        "h1" => html! { h1 { (children) } },
        "h2" => html! { h2 { (children) } },
        "h3" => html! { h3 { (children) } },
        "h4" => html! { h4 { (children) } },
        "h5" => html! { h5 { (children) } },
        "h6" => html! { h6 { (children) } },
        "ul" => html! { ul { (children) } },
        "ol" => html! { ol { (children) } },
        "li" => html! { li { (children) } },
        "blockquote" => html! { blockquote { (children) } },
        "code" => html! { pre { code { (children) } } },
        "span" => html! { span { (children) } },
        "hr" => html! { hr; },
        "br" => html! { br; },
        "a" => {
            let href = attr(node, "url").or_else(|| attr(node, "href")).unwrap_or("#");
            html! { a href=(href) target=[attr(node, "target")] { (children) } }
        }
        "img" => {
            let src = attr(node, "url").or_else(|| attr(node, "src")).unwrap_or_default();
            html! { img src=(src) alt=[attr(node, "alt")]; }
        }
        // doc and unknown containers contribute only their children
        _ => children,
    }
}

fn render_text(node: &Value, text: &str) -> Markup {
    let mark = |name: &str| node.get(name).and_then(Value::as_bool).unwrap_or(false);
    let mut markup = html! { (text) };
    if mark("inlineCode") {
        markup = html! { code { (markup) } };
    }
    if mark("bold") {
        markup = html! { strong { (markup) } };
    }
    if mark("italic") {
        markup = html! { em { (markup) } };
    }
    if mark("underline") {
        markup = html! { u { (markup) } };
    }
    if mark("strikethrough") {
        markup = html! { s { (markup) } };
    }
    if mark("superscript") {
        markup = html! { sup { (markup) } };
    }
    if mark("subscript") {
        markup = html! { sub { (markup) } };
    }
    markup
}

fn is_rich_text(value: &Value) -> bool {
    value.get("type").and_then(Value::as_str) == Some("doc")
}

/// Replace the rich-text trees at each dotted `path` in `entry` with HTML.
///
/// Arrays met along a path are descended element-wise, so
/// `page_components.section.description` reaches the field in every
/// component. A path that leads nowhere, or to something that is not a
/// `doc`, is left alone.
pub fn json_to_html<P: AsRef<str>>(entry: &mut Value, paths: &[P], options: &RenderOptions) {
    for path in paths {
        let segments: Vec<&str> = path.as_ref().split('.').filter(|s| !s.is_empty()).collect();
        apply(entry, &segments, options);
    }
}

fn apply(node: &mut Value, segments: &[&str], options: &RenderOptions) {
    if let Value::Array(items) = node {
        for item in items {
            apply(item, segments, options);
        }
        return;
    }
    match segments.split_first() {
        None => {
            if is_rich_text(node) {
                *node = Value::String(render(node, options).into_string());
            }
        }
        Some((head, rest)) => {
            if let Some(child) = node.get_mut(*head) {
                apply(child, rest, options);
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn doc(children: Value) -> Value {
        json!({ "type": "doc", "children": children })
    }

    #[test]
    fn paragraph_with_marks() {
        let node = doc(json!([
            { "type": "p", "children": [
                { "text": "Hello ", "bold": true },
                { "text": "world", "italic": true }
            ] }
        ]));
        let html = render(&node, &RenderOptions::new()).into_string();
        assert_eq!(html, "<p><strong>Hello </strong><em>world</em></p>");
    }

    #[test]
    fn span_wrapped_by_default() {
        let node = doc(json!([{ "type": "span", "children": [{ "text": "x" }] }]));
        let html = render(&node, &RenderOptions::new()).into_string();
        assert_eq!(html, "<span>x</span>");
    }

    #[test]
    fn site_span_rule_passes_children_through() {
        let node = doc(json!([
            { "type": "p", "children": [
                { "type": "span", "children": [{ "text": "inner", "bold": true }] }
            ] }
        ]));
        let html = render(&node, &RenderOptions::site()).into_string();
        assert_eq!(html, "<p><strong>inner</strong></p>");
    }

    #[test]
    fn custom_rule_overrides_builtin() {
        let options = RenderOptions::new().rule("p", |_, children| html! { div.para { (children) } });
        let node = doc(json!([{ "type": "p", "children": [{ "text": "a" }] }]));
        assert_eq!(
            render(&node, &options).into_string(),
            r#"<div class="para">a</div>"#
        );
    }

    #[test]
    fn links_and_images() {
        let node = doc(json!([
            { "type": "a", "attrs": { "url": "/about", "target": "_blank" }, "children": [{ "text": "About" }] },
            { "type": "img", "attrs": { "url": "https://images.test/a.png" }, "children": [] }
        ]));
        let html = render(&node, &RenderOptions::new()).into_string();
        assert!(html.contains(r#"<a href="/about" target="_blank">About</a>"#));
        assert!(html.contains(r#"<img src="https://images.test/a.png">"#));
    }

    #[test]
    fn text_is_escaped() {
        let node = doc(json!([{ "type": "p", "children": [{ "text": "<script>" }] }]));
        let html = render(&node, &RenderOptions::new()).into_string();
        assert_eq!(html, "<p>&lt;script&gt;</p>");
    }

    #[test]
    fn json_to_html_replaces_nested_path() {
        let mut entry = json!({
            "title": "Home",
            "page_components": [
                { "section": { "description": doc(json!([{ "type": "p", "children": [{ "text": "one" }] }])) } },
                { "hero": { "title": "no section here" } },
                { "section": { "description": doc(json!([{ "type": "p", "children": [{ "text": "two" }] }])) } }
            ]
        });
        json_to_html(&mut entry, &["page_components.section.description"], &RenderOptions::site());
        assert_eq!(entry["page_components"][0]["section"]["description"], "<p>one</p>");
        assert_eq!(entry["page_components"][2]["section"]["description"], "<p>two</p>");
        assert_eq!(entry["page_components"][1]["hero"]["title"], "no section here");
    }

    #[test]
    fn json_to_html_over_entry_list() {
        let mut entries = json!([
            { "body": doc(json!([{ "type": "h2", "children": [{ "text": "A" }] }])) },
            { "body": doc(json!([{ "type": "h2", "children": [{ "text": "B" }] }])) }
        ]);
        json_to_html(&mut entries, &["body"], &RenderOptions::site());
        assert_eq!(entries[0]["body"], "<h2>A</h2>");
        assert_eq!(entries[1]["body"], "<h2>B</h2>");
    }

    #[test]
    fn json_to_html_ignores_non_doc_values() {
        let mut entry = json!({ "body": "already html" });
        json_to_html(&mut entry, &["body", "missing.path"], &RenderOptions::site());
        assert_eq!(entry, json!({ "body": "already html" }));
    }
}
