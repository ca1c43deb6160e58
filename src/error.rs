//! Unified error type.

use thiserror::Error;

/// The error type returned by chirpy's fallible operations.
///
/// Application-level errors (a chirp that is too long, a missing file) are
/// expressed as HTTP [`Response`](crate::Response) values, not as `Error`s.
/// This type surfaces infrastructure failures: binding to a port, accepting a
/// connection, or loading configuration.
#[derive(Debug, Error)]
pub enum Error {
    #[error("io: {0}")]
    Io(#[from] std::io::Error),

    #[error("read config {path}: {source}")]
    ConfigRead {
        path: String,
        #[source]
        source: std::io::Error,
    },

    #[error("invalid config: {0}")]
    ConfigParse(#[from] toml::de::Error),

    #[error("invalid config: {0}")]
    ConfigInvalid(String),
}

pub type Result<T> = std::result::Result<T, Error>;
