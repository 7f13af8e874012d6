//! Locale codes as the delivery API expects them.
//!
//! The API matches locale codes case-sensitively against lower-case codes, so
//! `"EN-US"` and `"en-us"` must reach the wire identically. [`Locale`] lower-cases
//! on construction; an empty or missing code falls back to [`DEFAULT_LOCALE`].

use serde::{Deserialize, Serialize};
use std::fmt;

/// Locale used when the caller does not ask for one.
pub const DEFAULT_LOCALE: &str = "en-us";

/// A normalized (lower-case, trimmed) locale code.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub struct Locale(String);

impl Locale {
    /// Normalize a locale code. Blank input yields the default locale.
    pub fn new(code: &str) -> Self {
        let code = code.trim();
        if code.is_empty() {
            Self::default()
        } else {
            Self(code.to_lowercase())
        }
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl Default for Locale {
    fn default() -> Self {
        Self(DEFAULT_LOCALE.to_string())
    }
}

impl From<String> for Locale {
    fn from(code: String) -> Self {
        Self::new(&code)
    }
}

impl From<&str> for Locale {
    fn from(code: &str) -> Self {
        Self::new(code)
    }
}

impl From<Locale> for String {
    fn from(locale: Locale) -> Self {
        locale.0
    }
}

impl fmt::Display for Locale {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}
