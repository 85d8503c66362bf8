//! File fetching module
//!
//! Resolves the content type and filesystem path for a URL, checks that a
//! regular file exists there, and opens it for streaming.

use std::future::Future;
use std::io;
use std::path::{Path, PathBuf};
use tokio::fs::{self, File};

use super::path::PathResolver;
use crate::http::MimeResolver;
use crate::logger;

/// Outcome of looking a URL up on disk
#[derive(Debug)]
pub enum FetchOutcome {
    /// File exists and is open for reading
    Found { file: File, len: u64 },
    /// Nothing servable at the resolved path
    NotFound,
    /// The existence check passed but the file could not be opened
    OpenFailed { path: PathBuf, error: io::Error },
}

/// Result of a single fetch; consumed once by the request handler
#[derive(Debug)]
pub struct FetchResult<'a> {
    pub content_type: &'a str,
    pub outcome: FetchOutcome,
}

/// Source of files for the request handler
pub trait Fetch {
    fn fetch<'a>(&'a self, url: &'a str) -> impl Future<Output = FetchResult<'a>> + Send;

    /// Content type used for responses that never reach `fetch`
    fn default_content_type(&self) -> &str;
}

/// Fetches files from the document root
#[derive(Debug, Clone)]
pub struct FileFetcher {
    mime: MimeResolver,
    paths: PathResolver,
}

impl FileFetcher {
    pub const fn new(mime: MimeResolver, paths: PathResolver) -> Self {
        Self { mime, paths }
    }
}

impl Fetch for FileFetcher {
    async fn fetch<'a>(&'a self, url: &'a str) -> FetchResult<'a> {
        let content_type = self.mime.resolve(url);
        let path = self.paths.resolve(url);

        let outcome = match fs::metadata(&path).await {
            // Directories are not servable (no listings)
            Ok(meta) if !meta.is_file() => FetchOutcome::NotFound,
            // Length comes from the opened handle so it matches the streamed bytes
            Ok(_) => match open_with_len(&path).await {
                Ok((file, len)) => FetchOutcome::Found { file, len },
                Err(error) => FetchOutcome::OpenFailed { path, error },
            },
            Err(e) => {
                if e.kind() != io::ErrorKind::NotFound {
                    logger::log_debug(&format!(
                        "Treating '{}' as missing: {e}",
                        path.display()
                    ));
                }
                FetchOutcome::NotFound
            }
        };

        FetchResult {
            content_type,
            outcome,
        }
    }

    fn default_content_type(&self) -> &str {
        self.mime.table().default_type()
    }
}

async fn open_with_len(path: &Path) -> io::Result<(File, u64)> {
    let file = File::open(path).await?;
    let len = file.metadata().await?.len();
    Ok((file, len))
}
