//! MIME type detection module
//!
//! Maps a request URL to the Content-Type sent back with the response.
//! The table is built once at startup and shared read-only afterwards.

use hyper::header::HeaderValue;
use std::collections::HashMap;
use std::sync::Arc;

/// Key of the fallback entry used when no extension matches
pub const DEFAULT_KEY: &str = "default";

/// Key of the entry served for directory requests
pub const HTML_KEY: &str = "html";

const BUILTIN_TYPES: &[(&str, &str)] = &[
    (DEFAULT_KEY, "application/octet-stream"),
    (HTML_KEY, "text/html; charset=UTF-8"),
    ("js", "application/javascript"),
    ("mjs", "application/javascript"),
    ("css", "text/css"),
    ("png", "image/png"),
    ("jpg", "image/jpg"),
    ("gif", "image/gif"),
    ("ico", "image/x-icon"),
    ("svg", "image/svg+xml"),
    ("json", "application/json"),
    ("map", "application/json"),
    ("wasm", "application/wasm"),
    ("txt", "text/plain; charset=UTF-8"),
];

#[derive(Debug, thiserror::Error, PartialEq, Eq)]
pub enum MimeTableError {
    #[error("MIME table is missing the required `{0}` entry")]
    MissingEntry(&'static str),
    #[error("MIME type for `{key}` is not a valid header value")]
    InvalidValue { key: String },
}

/// Immutable extension -> content type mapping
#[derive(Debug, Clone)]
pub struct MimeTable {
    entries: HashMap<String, String>,
}

impl MimeTable {
    /// Build a table from explicit entries.
    ///
    /// Both `default` and `html` must be present, and every value must be
    /// usable as a `Content-Type` header.
    pub fn new(entries: HashMap<String, String>) -> Result<Self, MimeTableError> {
        for required in [DEFAULT_KEY, HTML_KEY] {
            if !entries.contains_key(required) {
                return Err(MimeTableError::MissingEntry(required));
            }
        }
        if let Some((key, _)) = entries
            .iter()
            .find(|(_, value)| HeaderValue::from_str(value).is_err())
        {
            return Err(MimeTableError::InvalidValue { key: key.clone() });
        }
        Ok(Self { entries })
    }

    /// Built-in table extended (or overridden) by configured entries
    pub fn with_overrides(overrides: &HashMap<String, String>) -> Result<Self, MimeTableError> {
        let mut entries = Self::builtin().entries;
        entries.extend(overrides.iter().map(|(k, v)| (k.clone(), v.clone())));
        Self::new(entries)
    }

    pub fn builtin() -> Self {
        Self {
            entries: BUILTIN_TYPES
                .iter()
                .map(|(ext, ty)| ((*ext).to_string(), (*ty).to_string()))
                .collect(),
        }
    }

    pub fn get(&self, extension: &str) -> Option<&str> {
        self.entries.get(extension).map(String::as_str)
    }

    pub fn default_type(&self) -> &str {
        // Presence is checked on construction.
        self.get(DEFAULT_KEY).unwrap_or("application/octet-stream")
    }

    pub fn html_type(&self) -> &str {
        self.get(HTML_KEY).unwrap_or("text/html; charset=UTF-8")
    }

    pub fn entry_count(&self) -> usize {
        self.entries.len()
    }
}

/// Resolves the Content-Type for a request URL
#[derive(Debug, Clone)]
pub struct MimeResolver {
    table: Arc<MimeTable>,
}

impl MimeResolver {
    pub const fn new(table: Arc<MimeTable>) -> Self {
        Self { table }
    }

    pub fn table(&self) -> &MimeTable {
        &self.table
    }

    /// Get the Content-Type for `url`
    ///
    /// A trailing `/` always means the index document, even when an earlier
    /// segment contains a dot. Otherwise the text after the last `.` is looked
    /// up as-is, falling back to the `default` entry.
    pub fn resolve(&self, url: &str) -> &str {
        if url.ends_with('/') {
            return self.table.html_type();
        }

        match url.rfind('.') {
            Some(index) => self
                .table
                .get(&url[index + 1..])
                .unwrap_or_else(|| self.table.default_type()),
            None => self.table.default_type(),
        }
    }
}
