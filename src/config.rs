//! Site configuration module.
//!
//! Configuration is assembled once at startup and handed to the delivery client,
//! resolver and carousel by reference. Three layers are merged, later layers
//! winning:
//!
//! ```text
//! stock defaults  →  stackfront.toml (optional)  →  environment variables
//! ```
//!
//! ## Config File
//!
//! ```toml
//! # All options are optional in the file - defaults shown below.
//! # Credentials must be supplied here or through the environment.
//!
//! [stack]
//! api_key = ""
//! delivery_token = ""
//! environment = ""
//! # host = "eu-api.contentstack.com"   # Non-default region or private host
//!
//! [content]
//! default_locale = "en-us"
//! max_reference_depth = 10
//!
//! [carousel]
//! autoplay_interval_ms = 5000
//! ```
//!
//! ## Environment
//!
//! | Variable | Key |
//! |----------|-----|
//! | `CONTENTSTACK_API_KEY` | `stack.api_key` |
//! | `CONTENTSTACK_DELIVERY_TOKEN` | `stack.delivery_token` |
//! | `CONTENTSTACK_ENVIRONMENT` | `stack.environment` |
//! | `CONTENTSTACK_API_HOST` | `stack.host` |
//!
//! Each variable may also be given with a `NEXT_PUBLIC_` prefix; the unprefixed
//! name wins when both are set.
//!
//! A missing credential is a fatal [`ConfigError::MissingCredential`], raised
//! before any request is attempted. Unknown keys are rejected to catch typos.

use crate::locale::Locale;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::Path;
use thiserror::Error;

/// Default config file name, looked up in the working directory.
pub const CONFIG_FILENAME: &str = "stackfront.toml";

/// Environment variables mapped onto `[stack]` keys.
const ENV_KEYS: &[(&str, &str)] = &[
    ("CONTENTSTACK_API_KEY", "api_key"),
    ("CONTENTSTACK_DELIVERY_TOKEN", "delivery_token"),
    ("CONTENTSTACK_ENVIRONMENT", "environment"),
    ("CONTENTSTACK_API_HOST", "host"),
];

const ENV_PUBLIC_PREFIX: &str = "NEXT_PUBLIC_";

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("TOML parse error: {0}")]
    Toml(#[from] toml::de::Error),
    #[error("Missing stack credential: {0}")]
    MissingCredential(&'static str),
    #[error("Config validation error: {0}")]
    Validation(String),
}

/// Fully merged site configuration.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct SiteConfig {
    /// Stack credentials and delivery host.
    pub stack: StackConfig,
    /// Content fetching behaviour.
    pub content: ContentConfig,
    /// Hero carousel behaviour.
    pub carousel: CarouselConfig,
}

impl SiteConfig {
    /// Check credentials are present and values are in range.
    ///
    /// Credentials are checked in a fixed order so the error always names the
    /// first one missing.
    pub fn validate(&self) -> Result<(), ConfigError> {
        let credentials = [
            ("api_key", &self.stack.api_key),
            ("delivery_token", &self.stack.delivery_token),
            ("environment", &self.stack.environment),
        ];
        for (name, value) in credentials {
            if value.trim().is_empty() {
                return Err(ConfigError::MissingCredential(name));
            }
        }
        if self.content.max_reference_depth == 0 {
            return Err(ConfigError::Validation(
                "content.max_reference_depth must be at least 1".into(),
            ));
        }
        if self.carousel.autoplay_interval_ms == 0 {
            return Err(ConfigError::Validation(
                "carousel.autoplay_interval_ms must be non-zero".into(),
            ));
        }
        Ok(())
    }
}

/// Stack credentials. All three credentials are required.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct StackConfig {
    /// Stack API key.
    pub api_key: String,
    /// Delivery token for published content.
    pub delivery_token: String,
    /// Publishing environment name.
    pub environment: String,
    /// Host override for non-default regions or private deployments.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub host: Option<String>,
}

impl StackConfig {
    /// The delivery host override to apply, if any.
    ///
    /// Management hosts (`api`) are rewritten to their delivery counterpart
    /// (`cdn`). Default `contentstack.io` hosts are not overrides and yield
    /// `None`, leaving the client on its built-in host.
    pub fn delivery_host(&self) -> Option<String> {
        let host = self.host.as_deref()?.trim();
        if host.is_empty() {
            return None;
        }
        let host = custom_host_url(host);
        is_valid_custom_host(&host).then_some(host)
    }
}

/// Rewrite a management API host to the matching delivery host.
pub fn custom_host_url(host: &str) -> String {
    host.replacen("api", "cdn", 1)
}

/// Whether a host is a genuine override rather than the default delivery host.
pub fn is_valid_custom_host(host: &str) -> bool {
    !host.is_empty() && !host.contains("contentstack.io")
}

/// Content fetching behaviour.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct ContentConfig {
    /// Locale used when a request does not name one.
    pub default_locale: Locale,
    /// Longest chain of nested references the resolver will follow.
    pub max_reference_depth: usize,
}

impl Default for ContentConfig {
    fn default() -> Self {
        Self {
            default_locale: Locale::default(),
            max_reference_depth: crate::resolver::DEFAULT_MAX_DEPTH,
        }
    }
}

/// Hero carousel behaviour.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct CarouselConfig {
    /// Autoplay period in milliseconds.
    pub autoplay_interval_ms: u64,
}

impl Default for CarouselConfig {
    fn default() -> Self {
        Self {
            autoplay_interval_ms: 5000,
        }
    }
}

// =============================================================================
// Config loading, merging, and validation
// =============================================================================

/// Returns the stock default config as a `toml::Value::Table`.
pub fn stock_defaults_value() -> toml::Value {
    toml::Value::try_from(SiteConfig::default()).expect("default config must serialize")
}

/// Recursively merge `overlay` on top of `base`.
///
/// - Tables are merged key-by-key (overlay keys override base keys).
/// - Non-table values in overlay replace base values entirely.
/// - Keys in base that are not in overlay are preserved.
pub fn merge_toml(base: toml::Value, overlay: toml::Value) -> toml::Value {
    match (base, overlay) {
        (toml::Value::Table(mut base_table), toml::Value::Table(overlay_table)) => {
            for (key, overlay_val) in overlay_table {
                let merged = match base_table.remove(&key) {
                    Some(base_val) => merge_toml(base_val, overlay_val),
                    None => overlay_val,
                };
                base_table.insert(key, merged);
            }
            toml::Value::Table(base_table)
        }
        (_, overlay) => overlay,
    }
}

/// Load a config file as a raw TOML value.
///
/// Returns `Ok(None)` if the file does not exist.
pub fn load_raw_config(path: &Path) -> Result<Option<toml::Value>, ConfigError> {
    if !path.exists() {
        return Ok(None);
    }
    let content = fs::read_to_string(path)?;
    let value: toml::Value = toml::from_str(&content)?;
    Ok(Some(value))
}

/// Build the environment layer from a variable lookup.
///
/// Blank values count as unset so an exported-but-empty variable does not
/// mask a value from the config file.
pub fn env_overlay<F>(lookup: F) -> Option<toml::Value>
where
    F: Fn(&str) -> Option<String>,
{
    let mut stack = toml::value::Table::new();
    for (var, key) in ENV_KEYS {
        let value = lookup(var)
            .filter(|v| !v.trim().is_empty())
            .or_else(|| lookup(&format!("{ENV_PUBLIC_PREFIX}{var}")))
            .filter(|v| !v.trim().is_empty());
        if let Some(value) = value {
            stack.insert((*key).to_string(), toml::Value::String(value));
        }
    }
    if stack.is_empty() {
        return None;
    }
    let mut root = toml::value::Table::new();
    root.insert("stack".to_string(), toml::Value::Table(stack));
    Some(toml::Value::Table(root))
}

/// Merge the given overlays onto a base value in order, then deserialize and
/// validate.
pub fn resolve_config(
    base: toml::Value,
    overlays: impl IntoIterator<Item = Option<toml::Value>>,
) -> Result<SiteConfig, ConfigError> {
    let merged = overlays.into_iter().flatten().fold(base, merge_toml);
    let config: SiteConfig = merged.try_into()?;
    config.validate()?;
    Ok(config)
}

/// Load the site config: stock defaults, then `path` if it exists, then the
/// process environment.
pub fn load_config(path: &Path) -> Result<SiteConfig, ConfigError> {
    let file = load_raw_config(path)?;
    let env = env_overlay(|name| std::env::var(name).ok());
    resolve_config(stock_defaults_value(), [file, env])
}

/// Returns a fully-commented stock `stackfront.toml`.
///
/// Used by the `gen-config` CLI command.
pub fn stock_config_toml() -> &'static str {
    r##"# stackfront configuration
# ========================
# Values shown below are the defaults. Every key may be omitted, but the three
# stack credentials must then come from the environment:
#   CONTENTSTACK_API_KEY, CONTENTSTACK_DELIVERY_TOKEN, CONTENTSTACK_ENVIRONMENT
# (NEXT_PUBLIC_-prefixed names are accepted too.)
# Unknown keys will cause an error.

# ---------------------------------------------------------------------------
# Stack credentials
# ---------------------------------------------------------------------------
[stack]
api_key = ""
delivery_token = ""
environment = ""

# Host override for non-default regions, e.g. "eu-api.contentstack.com".
# "api" is rewritten to "cdn"; default contentstack.io hosts are ignored.
# host = "eu-api.contentstack.com"

# ---------------------------------------------------------------------------
# Content fetching
# ---------------------------------------------------------------------------
[content]
# Locale used when a request does not name one. Always lower-cased.
default_locale = "en-us"

# Longest chain of nested references followed before giving up.
max_reference_depth = 10

# ---------------------------------------------------------------------------
# Hero carousel
# ---------------------------------------------------------------------------
[carousel]
# Autoplay period in milliseconds.
autoplay_interval_ms = 5000
"##
}
