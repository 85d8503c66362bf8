//! Request handler module
//!
//! Maps request URLs to files under the document root and streams them back.

pub mod fetch;
pub mod path;
pub mod request;

// Re-export main entry point
pub use fetch::FileFetcher;
pub use path::PathResolver;
pub use request::handle_request;
