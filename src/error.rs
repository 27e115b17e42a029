use std::io;
use std::path::PathBuf;

use thiserror::Error;

/// Failure of a single request. Asset fetches that end here are skipped,
/// the entry page fetch ending here fails the whole mirror.
#[derive(Debug, Error)]
pub enum FetchError {
    #[error("malformed URL: {0}")]
    MalformedUrl(String),

    #[error("request timed out")]
    Timeout,

    #[error("request failed: {0}")]
    Transport(#[source] reqwest::Error),

    #[error("empty response body")]
    EmptyBody,
}

impl From<reqwest::Error> for FetchError {
    fn from(e: reqwest::Error) -> Self {
        if e.is_timeout() {
            FetchError::Timeout
        } else if e.is_builder() {
            FetchError::MalformedUrl(e.to_string())
        } else {
            FetchError::Transport(e)
        }
    }
}

/// Errors that end a mirror run. They never leave `SiteMirror::mirror`;
/// the orchestrator folds them into a failed `MirrorResult`.
#[derive(Debug, Error)]
pub enum MirrorError {
    #[error("invalid URL: {0}")]
    InvalidUrl(String),

    #[error("failed to create project folder {}: {source}", path.display())]
    ProjectFolder {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    #[error("failed to fetch {url}: {source}")]
    EntryPage {
        url: String,
        #[source]
        source: FetchError,
    },

    #[error("failed to parse HTML: {0}")]
    Parse(#[source] io::Error),

    #[error("failed to serialize HTML: {0}")]
    Serialize(#[source] io::Error),

    #[error("failed to write {}: {source}", path.display())]
    Write {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    #[error("failed to build HTTP client: {0}")]
    Client(#[source] reqwest::Error),
}
