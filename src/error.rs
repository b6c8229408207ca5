use std::path::PathBuf;

use thiserror::Error;

#[derive(Debug, Error)]
pub enum SnapshotError {
    #[error("snapshot {path} unreadable: {source}")]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("snapshot {path} is not valid json: {source}")]
    Parse {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },

    #[error("snapshot {path} has version {found}, expected {expected}")]
    Version {
        path: PathBuf,
        found: u32,
        expected: u32,
    },

    #[error("snapshot serialize failed: {0}")]
    Serialize(#[from] serde_json::Error),

    #[error("snapshot write to {path} failed: {source}")]
    Write {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

#[derive(Debug, Error)]
pub enum FeedError {
    #[error("quote feed disabled")]
    Disabled,

    #[error("ODDS_API_KEY missing")]
    MissingApiKey,

    #[error("no feed sport key configured for the requested leagues")]
    NoSportKeys,

    #[error("odds request failed: {0}")]
    Request(#[from] reqwest::Error),

    #[error("odds http {status}: {snippet}")]
    Status { status: u16, snippet: String },

    #[error("invalid odds json: {0}")]
    Json(#[from] serde_json::Error),

    #[error("odds feed file {path} unreadable: {source}")]
    File {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("http client unavailable: {0}")]
    Client(String),
}
