// Configuration module entry point
// Loads layered configuration and builds the shared application state

mod state;
mod types;

use std::net::SocketAddr;

use crate::http::{MimeTable, MimeTableError};
use crate::logger::LogLevel;

// Re-export public types
pub use state::AppState;
pub use types::{Config, LoggingConfig};

/// Configuration file looked up when no path is given
pub const DEFAULT_CONFIG_PATH: &str = "config";

/// Prefix for environment overrides, e.g. `STATIC_SERVER__PORT=9000`
const ENV_PREFIX: &str = "STATIC";

#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error(transparent)]
    Load(#[from] config::ConfigError),
    #[error("invalid listen address '{addr}': {source}")]
    InvalidAddress {
        addr: String,
        source: std::net::AddrParseError,
    },
    #[error("invalid log level: {0}")]
    InvalidLogLevel(String),
    #[error("performance.chunk_size must be greater than zero")]
    InvalidChunkSize,
    #[error("invalid [mime] section: {0}")]
    Mime(#[from] MimeTableError),
}

impl Config {
    /// Load configuration from `config_path` (extension optional)
    ///
    /// A missing file is not an error; defaults and environment still apply.
    pub fn load_from(config_path: &str) -> Result<Self, ConfigError> {
        let settings = config::Config::builder()
            .add_source(config::File::with_name(config_path).required(false))
            .add_source(
                config::Environment::with_prefix(ENV_PREFIX)
                    .prefix_separator("_")
                    .separator("__"),
            )
            .set_default("server.host", "0.0.0.0")?
            .set_default("server.port", 8000)?
            .set_default("server.root", ".")?
            .set_default("server.index_file", "index.html")?
            .set_default("logging.level", "info")?
            .set_default("logging.access_log", true)?
            .set_default("performance.keep_alive", true)?
            .set_default("performance.header_read_timeout", 30)?
            .set_default("performance.chunk_size", 65_536)?
            .set_default("http.reject_parent_segments", true)?
            .build()?;

        let cfg: Self = settings.try_deserialize()?;
        cfg.validate()?;
        Ok(cfg)
    }

    fn validate(&self) -> Result<(), ConfigError> {
        self.logging
            .level
            .parse::<LogLevel>()
            .map_err(ConfigError::InvalidLogLevel)?;
        if self.performance.chunk_size == 0 {
            return Err(ConfigError::InvalidChunkSize);
        }
        MimeTable::with_overrides(&self.mime)?;
        self.get_socket_addr()?;
        Ok(())
    }

    pub fn get_socket_addr(&self) -> Result<SocketAddr, ConfigError> {
        let addr = format!("{}:{}", self.server.host, self.server.port);
        addr.parse()
            .map_err(|source| ConfigError::InvalidAddress { addr, source })
    }
}
