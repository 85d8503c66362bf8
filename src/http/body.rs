//! Response body types
//!
//! File bodies are streamed chunk by chunk; nothing is buffered in full.
//! Dropping the body (normal completion, client gone, or a read error)
//! drops the underlying file handle.

use futures::TryStreamExt;
use http_body_util::combinators::BoxBody;
use http_body_util::{BodyExt, Empty, StreamBody};
use hyper::body::{Bytes, Frame};
use std::io;
use tokio::fs::File;
use tokio_util::io::ReaderStream;

/// Body type of every response the server produces
pub type ResponseBody = BoxBody<Bytes, io::Error>;

pub fn empty() -> ResponseBody {
    Empty::<Bytes>::new()
        .map_err(|never| match never {})
        .boxed()
}

/// Stream `file` into a response body, reading at most `chunk_size` bytes per frame
pub fn from_file(file: File, chunk_size: usize) -> ResponseBody {
    let stream = ReaderStream::with_capacity(file, chunk_size);
    StreamBody::new(stream.map_ok(Frame::data)).boxed()
}
