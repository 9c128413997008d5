//! Error types for impress-zotero

use thiserror::Error;

use crate::domain::LibraryId;
use crate::http::HttpError;
use crate::search::SearchIndexError;

/// Result type alias for mirror operations
pub type Result<T> = std::result::Result<T, MirrorError>;

/// Main error type for mirror operations
///
/// Every variant carries owned string data so one refresh outcome can be
/// cloned out to all callers waiting on it.
#[derive(Error, Debug, Clone)]
pub enum MirrorError {
    /// Transport or remote API failure
    #[error("Zotero API error: {0}")]
    Http(#[from] HttpError),

    /// Search index failure
    #[error("Search index error: {0}")]
    Search(#[from] SearchIndexError),

    /// The local API did not answer the reachability check
    #[error("Zotero local API not reachable at {url}")]
    Unreachable { url: String },

    /// Illegal state transition (refresh before initialize, initialize twice)
    #[error("Invalid state: {0}")]
    InvalidState(String),

    /// Search requested for a library the index was not built for
    #[error("Search index not ready for library {library_id}")]
    NotIndexed { library_id: LibraryId },

    /// No loaded snapshot for the library
    #[error("No item cache for library {library_id}")]
    NoSnapshot { library_id: LibraryId },

    /// Configuration could not be read or is invalid
    #[error("Configuration error: {0}")]
    Config(String),
}

impl MirrorError {
    /// HTTP status carried by the error, if the remote answered at all
    pub fn status(&self) -> Option<u16> {
        match self {
            MirrorError::Http(HttpError::Status { status, .. }) => Some(*status),
            _ => None,
        }
    }
}

impl From<toml::de::Error> for MirrorError {
    fn from(err: toml::de::Error) -> Self {
        MirrorError::Config(err.to_string())
    }
}

impl From<std::io::Error> for MirrorError {
    fn from(err: std::io::Error) -> Self {
        MirrorError::Config(err.to_string())
    }
}
