use std::path::PathBuf;

use thiserror::Error;

#[derive(Error, Debug)]
pub enum FetchError {
    #[error("HTTP request failed: {0}")]
    RequestFailed(#[from] reqwest::Error),

    #[error("Host unreachable: {0}")]
    Unreachable(String),
}

#[derive(Error, Debug)]
pub enum LookupError {
    #[error("No ingredients provided")]
    EmptyBatch,

    #[error("Invalid endpoint {url}: {reason}")]
    InvalidEndpoint { url: String, reason: String },

    #[error("Failed to load table {path}: {reason}")]
    TableLoad { path: PathBuf, reason: String },

    #[error("HTTP client setup failed: {0}")]
    Client(#[from] FetchError),
}
