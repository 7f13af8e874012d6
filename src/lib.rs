//! # Stackfront
//!
//! Content glue for a marketing site backed by a headless CMS. Pages are
//! modelled as entries; entries point at each other through reference stubs
//! (`{ "uid", "_content_type_uid" }`). Stackfront fetches those entries,
//! resolves every stub into the entry it names, renders rich-text fields to
//! HTML, and drives the hero carousel that sits on top of most pages.
//!
//! # Data Flow
//!
//! ```text
//! stackfront.toml + env  →  SiteConfig
//! SiteConfig.stack       →  DeliveryClient   (implements ContentSource)
//! ContentSource          →  Pages            (queries, locale, depth)
//! Pages                  →  Resolver         (stubs → entries, per branch)
//! resolved page          →  Carousel         (state + autoplay + markup)
//! ```
//!
//! # Module Map
//!
//! | Module | Role |
//! |--------|------|
//! | [`config`] | Layered `stackfront.toml` + environment loading and validation |
//! | [`locale`] | Normalized locale codes with the site default |
//! | [`client`] | Delivery API client and the [`client::ContentSource`] seam |
//! | [`resolver`] | Recursive reference-stub resolution with per-branch failure isolation |
//! | [`pages`] | Page-level queries: entries, entry by URL or uid, locales, GraphQL |
//! | [`richtext`] | JSON rich-text to HTML, with the site's span passthrough rule |
//! | [`carousel`] | Slide state machine, scoped autoplay timer, and carousel markup |
//! | [`output`] | CLI output formatting |
//!
//! # Design Decisions
//!
//! ## One Seam for the CMS
//!
//! Everything above the HTTP layer talks to [`client::ContentSource`], a
//! two-method async trait (`find`, `fetch_entry`). The delivery client is one
//! implementation; tests use an in-memory one. Resolution logic never sees a
//! URL or a status code.
//!
//! ## Failures Stay Local
//!
//! A reference that cannot be fetched leaves its stub in place and is reported
//! next to the resolved value in [`resolver::ResolvedEntry::unresolved`].
//! Sibling branches resolve normally. A page with one broken banner still
//! renders the rest of the page.
//!
//! ## Bounded Resolution
//!
//! References can form cycles (a page linking to a page linking back). The
//! resolver tracks the chain of stubs above each branch and a maximum depth,
//! so every walk terminates. Both limits surface as unresolved references,
//! never as a hang or a panic.
//!
//! ## Timers Are Owned
//!
//! The carousel's autoplay timer is a value. Dropping it aborts the task, and
//! the carousel swaps in a fresh one whenever autoplay or the slide count
//! changes. There is no global timer registry to leak into.

pub mod carousel;
pub mod client;
pub mod config;
pub mod locale;
pub mod output;
pub mod pages;
pub mod resolver;
pub mod richtext;

#[cfg(test)]
pub(crate) mod test_helpers;
