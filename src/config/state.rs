// Application state module
// Immutable state built once at startup and shared by every connection

use std::sync::Arc;

use super::types::Config;
use crate::handler::{FileFetcher, PathResolver};
use crate::http::{MimeResolver, MimeTable, MimeTableError};

/// Application state
pub struct AppState {
    pub config: Config,
    pub mime: Arc<MimeTable>,
    pub fetcher: FileFetcher,
}

impl AppState {
    pub fn new(config: Config) -> Result<Self, MimeTableError> {
        let mime = Arc::new(MimeTable::with_overrides(&config.mime)?);
        let fetcher = FileFetcher::new(
            MimeResolver::new(Arc::clone(&mime)),
            PathResolver::new(&config.server.root, config.server.index_file.as_str()),
        );

        Ok(Self {
            config,
            mime,
            fetcher,
        })
    }
}
