//! Request handling module
//!
//! Entry point for HTTP request processing: validate the target, fetch the
//! file, decide the status, build the response, and write one access-log line.

use hyper::body::Incoming;
use hyper::{Method, Request, Response, StatusCode, Uri};
use std::convert::Infallible;
use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Instant;

use super::fetch::{Fetch, FetchOutcome};
use crate::config::{AppState, LoggingConfig};
use crate::http::{self, body, ResponseBody};
use crate::logger::{self, AccessLogEntry};

/// Request context encapsulating information needed for request processing
pub struct RequestContext<'a> {
    pub method: &'a Method,
    /// Request path, `None` when the request target is unusable
    pub url: Option<&'a str>,
    pub remote_addr: SocketAddr,
    pub reject_parent_segments: bool,
    pub chunk_size: usize,
    pub logging: &'a LoggingConfig,
}

/// Main entry point for HTTP request handling
pub async fn handle_request(
    req: Request<Incoming>,
    remote_addr: SocketAddr,
    state: Arc<AppState>,
) -> Result<Response<ResponseBody>, Infallible> {
    let ctx = RequestContext {
        method: req.method(),
        url: request_path(req.uri()),
        remote_addr,
        reject_parent_segments: state.config.http.reject_parent_segments,
        chunk_size: state.config.performance.chunk_size,
        logging: &state.config.logging,
    };

    Ok(respond(&ctx, &state.fetcher).await)
}

/// Produce exactly one response for the request described by `ctx`
pub async fn respond<F: Fetch>(ctx: &RequestContext<'_>, fetcher: &F) -> Response<ResponseBody> {
    let started = Instant::now();

    // 1. Validate
    let Some(url) = ctx.url.filter(|url| is_valid_url(url, ctx.reject_parent_segments)) else {
        let resp = http::build_empty_response(StatusCode::BAD_REQUEST, fetcher.default_content_type());
        log_access(ctx, resp.status(), 0, started);
        return resp;
    };

    // 2. Resolve
    let result = fetcher.fetch(url).await;

    // 3. Decide status
    let status = decide_status(&result.outcome);

    // 4. Respond
    let (resp, body_bytes) = match result.outcome {
        FetchOutcome::Found { file, len } => (
            http::build_file_response(
                result.content_type,
                len,
                body::from_file(file, ctx.chunk_size),
            ),
            len,
        ),
        FetchOutcome::OpenFailed { path, error } => {
            logger::log_error(&format!(
                "Failed to open file '{}': {error}",
                path.display()
            ));
            (http::build_empty_response(status, result.content_type), 0)
        }
        FetchOutcome::NotFound => (http::build_empty_response(status, result.content_type), 0),
    };

    // 5. Log
    log_access(ctx, resp.status(), body_bytes, started);
    resp
}

/// Found -> 200, missing -> 404, unreadable despite existing -> 500
pub const fn decide_status(outcome: &FetchOutcome) -> StatusCode {
    match outcome {
        FetchOutcome::Found { .. } => StatusCode::OK,
        FetchOutcome::NotFound => StatusCode::NOT_FOUND,
        FetchOutcome::OpenFailed { .. } => StatusCode::INTERNAL_SERVER_ERROR,
    }
}

/// Extract the request path, rejecting targets that have none
///
/// Authority-form (`CONNECT host:port`) targets yield an empty path and the
/// asterisk form yields `*`; neither names a file.
pub fn request_path(uri: &Uri) -> Option<&str> {
    let path = uri.path();
    path.starts_with('/').then_some(path)
}

fn is_valid_url(url: &str, reject_parent_segments: bool) -> bool {
    if !url.starts_with('/') {
        return false;
    }
    if reject_parent_segments && url.split('/').any(|segment| segment == "..") {
        logger::log_debug(&format!("Rejected path with parent segment: {url}"));
        return false;
    }
    true
}

fn log_access(ctx: &RequestContext<'_>, status: StatusCode, body_bytes: u64, started: Instant) {
    if !ctx.logging.access_log {
        return;
    }

    let mut entry = AccessLogEntry::new(
        ctx.remote_addr.ip().to_string(),
        ctx.method.to_string(),
        ctx.url.unwrap_or("-").to_string(),
    );
    entry.status = status.as_u16();
    entry.body_bytes = body_bytes;
    entry.request_time_us = u64::try_from(started.elapsed().as_micros()).unwrap_or(u64::MAX);

    logger::log_access(&entry, &ctx.logging.access_log_format);
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::handler::fetch::{FetchResult, FileFetcher};
    use crate::handler::path::PathResolver;
    use crate::http::{MimeResolver, MimeTable};
    use http_body_util::BodyExt;
    use hyper::header::{CONTENT_LENGTH, CONTENT_TYPE};
    use std::cell::Cell;
    use std::future::Future;
    use std::io;
    use std::path::PathBuf;

    /// Counts calls and always reports the configured outcome kind
    struct StubFetcher {
        calls: Cell<usize>,
        open_fails: bool,
    }

    impl StubFetcher {
        const fn new(open_fails: bool) -> Self {
            Self {
                calls: Cell::new(0),
                open_fails,
            }
        }
    }

    impl Fetch for StubFetcher {
        fn fetch<'a>(&'a self, _url: &'a str) -> impl Future<Output = FetchResult<'a>> + Send {
            self.calls.set(self.calls.get() + 1);
            let outcome = if self.open_fails {
                FetchOutcome::OpenFailed {
                    path: PathBuf::from("locked.css"),
                    error: io::Error::from(io::ErrorKind::PermissionDenied),
                }
            } else {
                FetchOutcome::NotFound
            };
            std::future::ready(FetchResult {
                content_type: "text/css",
                outcome,
            })
        }

        fn default_content_type(&self) -> &str {
            "application/octet-stream"
        }
    }

    fn logging() -> LoggingConfig {
        LoggingConfig {
            access_log: false,
            ..LoggingConfig::default()
        }
    }

    fn ctx<'a>(method: &'a Method, url: Option<&'a str>, logging: &'a LoggingConfig) -> RequestContext<'a> {
        RequestContext {
            method,
            url,
            remote_addr: SocketAddr::from(([127, 0, 0, 1], 40000)),
            reject_parent_segments: true,
            chunk_size: 16 * 1024,
            logging,
        }
    }

    fn file_fetcher(root: &std::path::Path) -> FileFetcher {
        FileFetcher::new(
            MimeResolver::new(Arc::new(MimeTable::builtin())),
            PathResolver::new(root, "index.html"),
        )
    }

    async fn body_bytes(resp: Response<ResponseBody>) -> Vec<u8> {
        resp.into_body().collect().await.unwrap().to_bytes().to_vec()
    }

    #[tokio::test]
    async fn test_root_serves_index_html() {
        let dir = tempfile::tempdir().unwrap();
        let html = b"<!DOCTYPE html><title>demo</title>".to_vec();
        std::fs::write(dir.path().join("index.html"), &html).unwrap();

        let log = logging();
        let resp = respond(&ctx(&Method::GET, Some("/"), &log), &file_fetcher(dir.path())).await;

        assert_eq!(resp.status(), StatusCode::OK);
        assert_eq!(resp.headers()[CONTENT_TYPE], "text/html; charset=UTF-8");
        assert_eq!(resp.headers()[CONTENT_LENGTH], html.len().to_string().as_str());
        assert_eq!(body_bytes(resp).await, html);
    }

    #[tokio::test]
    async fn test_binary_file_is_byte_exact() {
        let dir = tempfile::tempdir().unwrap();
        let data: Vec<u8> = (0..=255u8).cycle().take(100_000).collect();
        std::fs::write(dir.path().join("blob.png"), &data).unwrap();

        let log = logging();
        let resp = respond(&ctx(&Method::GET, Some("/blob.png"), &log), &file_fetcher(dir.path())).await;

        assert_eq!(resp.status(), StatusCode::OK);
        assert_eq!(resp.headers()[CONTENT_TYPE], "image/png");
        assert_eq!(body_bytes(resp).await, data);
    }

    #[tokio::test]
    async fn test_missing_file_is_404_with_guessed_type() {
        let dir = tempfile::tempdir().unwrap();

        let log = logging();
        let resp = respond(&ctx(&Method::GET, Some("/missing.png"), &log), &file_fetcher(dir.path())).await;

        assert_eq!(resp.status(), StatusCode::NOT_FOUND);
        assert_eq!(resp.headers()[CONTENT_TYPE], "image/png");
        assert!(body_bytes(resp).await.is_empty());
    }

    #[tokio::test]
    async fn test_absent_url_is_400_without_fetch() {
        let fetcher = StubFetcher::new(false);
        let log = logging();
        let resp = respond(&ctx(&Method::GET, None, &log), &fetcher).await;

        assert_eq!(resp.status(), StatusCode::BAD_REQUEST);
        assert_eq!(resp.headers()[CONTENT_TYPE], "application/octet-stream");
        assert_eq!(fetcher.calls.get(), 0);
        assert!(body_bytes(resp).await.is_empty());
    }

    #[tokio::test]
    async fn test_parent_segment_is_400_without_fetch() {
        let fetcher = StubFetcher::new(false);
        let log = logging();
        let resp = respond(&ctx(&Method::GET, Some("/../etc/passwd"), &log), &fetcher).await;

        assert_eq!(resp.status(), StatusCode::BAD_REQUEST);
        assert_eq!(fetcher.calls.get(), 0);
    }

    #[tokio::test]
    async fn test_parent_segment_allowed_when_not_rejected() {
        let fetcher = StubFetcher::new(false);
        let log = logging();
        let mut c = ctx(&Method::GET, Some("/a/../b.css"), &log);
        c.reject_parent_segments = false;
        let resp = respond(&c, &fetcher).await;

        assert_eq!(resp.status(), StatusCode::NOT_FOUND);
        assert_eq!(fetcher.calls.get(), 1);
    }

    #[tokio::test]
    async fn test_dots_inside_names_are_not_parent_segments() {
        let fetcher = StubFetcher::new(false);
        let log = logging();
        let resp = respond(&ctx(&Method::GET, Some("/a..b/..c.css"), &log), &fetcher).await;

        assert_eq!(resp.status(), StatusCode::NOT_FOUND);
        assert_eq!(fetcher.calls.get(), 1);
    }

    #[tokio::test]
    async fn test_open_failure_is_500() {
        let fetcher = StubFetcher::new(true);
        let log = logging();
        let resp = respond(&ctx(&Method::GET, Some("/locked.css"), &log), &fetcher).await;

        assert_eq!(resp.status(), StatusCode::INTERNAL_SERVER_ERROR);
        assert_eq!(resp.headers()[CONTENT_TYPE], "text/css");
        assert_eq!(fetcher.calls.get(), 1);
    }

    #[tokio::test]
    async fn test_method_is_not_consulted() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(dir.path().join("data.json"), b"{}").unwrap();

        let log = logging();
        let resp = respond(&ctx(&Method::POST, Some("/data.json"), &log), &file_fetcher(dir.path())).await;

        assert_eq!(resp.status(), StatusCode::OK);
        assert_eq!(body_bytes(resp).await, b"{}");
    }

    #[test]
    fn test_status_decision() {
        assert_eq!(decide_status(&FetchOutcome::NotFound), StatusCode::NOT_FOUND);
        let failed = FetchOutcome::OpenFailed {
            path: PathBuf::from("a.css"),
            error: io::Error::from(io::ErrorKind::PermissionDenied),
        };
        assert_eq!(decide_status(&failed), StatusCode::INTERNAL_SERVER_ERROR);
    }

    #[test]
    fn test_request_path_from_uri() {
        let uri: Uri = "/a/b.js?v=3".parse().unwrap();
        assert_eq!(request_path(&uri), Some("/a/b.js"));

        let uri: Uri = "http://example.com/x.css".parse().unwrap();
        assert_eq!(request_path(&uri), Some("/x.css"));

        let uri: Uri = "example.com:443".parse().unwrap();
        assert_eq!(request_path(&uri), None);

        let uri: Uri = "*".parse().unwrap();
        assert_eq!(request_path(&uri), None);
    }
}
