//! HTTP response building module
//!
//! Every response carries a `Content-Type`; the body is either a file stream or empty.

use hyper::header::{CONTENT_LENGTH, CONTENT_TYPE};
use hyper::{Response, StatusCode};

use super::body::{self, ResponseBody};

/// Build 200 OK response streaming a file body
pub fn build_file_response(
    content_type: &str,
    content_length: u64,
    body: ResponseBody,
) -> Response<ResponseBody> {
    Response::builder()
        .status(StatusCode::OK)
        .header(CONTENT_TYPE, content_type)
        .header(CONTENT_LENGTH, content_length)
        .body(body)
        .unwrap_or_else(|e| {
            log_build_error(StatusCode::OK, &e);
            fallback_response(StatusCode::INTERNAL_SERVER_ERROR)
        })
}

/// Build a response with no body (400, 404, 500)
pub fn build_empty_response(status: StatusCode, content_type: &str) -> Response<ResponseBody> {
    Response::builder()
        .status(status)
        .header(CONTENT_TYPE, content_type)
        .body(body::empty())
        .unwrap_or_else(|e| {
            log_build_error(status, &e);
            fallback_response(status)
        })
}

/// Used when a header value cannot be encoded (e.g. a configured MIME string with control chars)
fn fallback_response(status: StatusCode) -> Response<ResponseBody> {
    let mut resp = Response::new(body::empty());
    *resp.status_mut() = status;
    resp
}

/// Log response build error
fn log_build_error(status: StatusCode, error: &hyper::http::Error) {
    crate::logger::log_error(&format!(
        "Failed to build {} response: {error}",
        status.as_u16()
    ));
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_empty_response_sets_content_type() {
        let resp = build_empty_response(StatusCode::NOT_FOUND, "image/png");
        assert_eq!(resp.status(), StatusCode::NOT_FOUND);
        assert_eq!(resp.headers()[CONTENT_TYPE], "image/png");
    }

    #[test]
    fn test_file_response_headers() {
        let resp = build_file_response("text/css", 42, body::empty());
        assert_eq!(resp.status(), StatusCode::OK);
        assert_eq!(resp.headers()[CONTENT_TYPE], "text/css");
        assert_eq!(resp.headers()[CONTENT_LENGTH], "42");
    }

    #[test]
    fn test_invalid_header_value_falls_back() {
        let resp = build_empty_response(StatusCode::NOT_FOUND, "bad\nvalue");
        assert_eq!(resp.status(), StatusCode::NOT_FOUND);
        assert!(resp.headers().get(CONTENT_TYPE).is_none());
    }
}
