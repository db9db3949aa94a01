//! Error types for promptlink.

use std::path::PathBuf;

/// Errors surfaced by the library.
///
/// View actions never return these for clipboard or navigation failures;
/// those are logged and swallowed so the edit/playback flow keeps going.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error("invalid page URL `{url}`: {source}")]
    InvalidPageUrl {
        url: String,
        #[source]
        source: url::ParseError,
    },

    #[error("page URL `{0}` cannot carry a query string")]
    OpaquePageUrl(String),

    #[error("failed to read config {path:?}: {source}")]
    ConfigRead {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to parse config {path:?}: {source}")]
    ConfigParse {
        path: PathBuf,
        #[source]
        source: toml::de::Error,
    },

    #[error("failed to write config {path:?}: {source}")]
    ConfigWrite {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to serialize config: {0}")]
    ConfigSerialize(#[from] toml::ser::Error),

    #[error("clipboard unavailable: {0}")]
    Clipboard(String),

    #[error("could not open `{url}`: {reason}")]
    Navigation { url: String, reason: String },
}

pub type Result<T> = std::result::Result<T, Error>;
