//! Request path resolution
//!
//! Maps a request URL onto a path under the document root. Pure: the
//! filesystem is never consulted here.

use std::path::PathBuf;

#[derive(Debug, Clone)]
pub struct PathResolver {
    root: PathBuf,
    index_file: String,
}

impl PathResolver {
    pub fn new(root: impl Into<PathBuf>, index_file: impl Into<String>) -> Self {
        Self {
            root: root.into(),
            index_file: index_file.into(),
        }
    }

    /// Resolve `url` to a filesystem path
    ///
    /// Any URL ending in `/` is served by the index document at the root.
    /// Otherwise the URL is used verbatim as a relative path; all leading
    /// slashes are removed so it can never replace the root.
    pub fn resolve(&self, url: &str) -> PathBuf {
        if url.ends_with('/') {
            return self.root.join(&self.index_file);
        }

        self.root.join(url.trim_start_matches('/'))
    }
}
