//! HTTP protocol layer module
//!
//! Content-type detection, response bodies, and response builders.
//! Decoupled from how request paths map onto the filesystem.

pub mod body;
pub mod mime;
pub mod response;

// Re-export commonly used types
pub use body::ResponseBody;
pub use mime::{MimeResolver, MimeTable, MimeTableError};
pub use response::{build_empty_response, build_file_response};
