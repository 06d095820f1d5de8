use thiserror::Error;

/// Result type alias for blacklist operations
pub type Result<T> = std::result::Result<T, Error>;

/// Errors surfaced by feeds, repositories, and serializers
#[derive(Error, Debug)]
pub enum Error {
    /// Feed unreachable or request construction/transfer failed
    #[error("feed {feed} unreachable: {message}")]
    Transport {
        /// Name of the feed that failed
        feed: String,
        message: String,
    },

    /// Feed answered with a non-success status code
    #[error("feed {feed} returned unexpected status {status}")]
    Status {
        /// Name of the feed that failed
        feed: String,
        status: u16,
    },

    /// Malformed feed record or malformed serialized record
    #[error("parse error in {context}: {message}")]
    Parse { context: String, message: String },

    /// Backend read/write failure, with the operation and affected key(s)
    #[error("store error during {op} on {key}: {message}")]
    Store {
        op: &'static str,
        key: String,
        message: String,
    },

    /// Backend acknowledged fewer (or more) items than were submitted
    #[error("store {op} wrote {actual} items, expected {expected}")]
    CountMismatch {
        op: &'static str,
        expected: usize,
        actual: usize,
    },

    /// Operation the backend cannot provide, e.g. a full scan
    #[error("operation not supported by this repository: {0}")]
    Unsupported(&'static str),

    /// I/O failure while reading or writing serialized data
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

impl Error {
    /// True when the error came from fetching a feed rather than from
    /// local storage or decoding.
    pub fn is_feed_error(&self) -> bool {
        matches!(self, Self::Transport { .. } | Self::Status { .. })
    }
}
