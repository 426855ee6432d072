use std::path::PathBuf;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("Failed to read config file '{path}': {source}")]
    ReadFile {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("Failed to parse config: {0}")]
    Parse(#[from] serde_yaml::Error),

    #[error("recent_limit must be at least 1")]
    ZeroRecentLimit,

    #[error("Remote store url is empty")]
    EmptyRemoteUrl,

    #[error("Export page of {width}x{height} with margin {margin} leaves no room for text")]
    PageTooSmall {
        width: usize,
        height: usize,
        margin: usize,
    },

    #[error("No data directory could be determined; set data_dir in the config")]
    NoDataDir,
}

#[derive(Error, Debug)]
pub enum CacheError {
    #[error("Failed to create cache directory '{path}': {source}")]
    CreateDir {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("Failed to write '{path}': {source}")]
    Write {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("Failed to remove '{path}': {source}")]
    Remove {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("Serialization error: {0}")]
    Serialize(#[from] serde_json::Error),
}

/// Failures of the remote plan store. Messages are shown to the user verbatim.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum StoreError {
    #[error("{0}")]
    Validation(String),

    #[error("Network error: {0}")]
    Network(String),

    #[error("Not authorized: {0}")]
    Auth(String),

    #[error("Store rejected the request ({status}): {message}")]
    Rejected { status: u16, message: String },

    #[error("Unexpected response from store: {0}")]
    Decode(String),
}

impl From<reqwest::Error> for StoreError {
    fn from(err: reqwest::Error) -> Self {
        if err.is_decode() {
            StoreError::Decode(err.to_string())
        } else {
            StoreError::Network(err.to_string())
        }
    }
}

#[derive(Error, Debug)]
pub enum SessionError {
    #[error("Sign-in failed: {0}")]
    SignIn(String),

    #[error("Sign-up failed: {0}")]
    SignUp(String),

    #[error("Network error: {0}")]
    Network(#[from] reqwest::Error),

    #[error("Failed to persist session '{path}': {source}")]
    Persist {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("Serialization error: {0}")]
    Serialize(#[from] serde_json::Error),
}

#[derive(Error, Debug)]
pub enum SyncError {
    #[error("{0}")]
    Validation(String),

    #[error("No plan with id '{0}'")]
    NotFound(String),

    #[error("Delete confirmation is unknown or already used")]
    InvalidToken,

    #[error(transparent)]
    Store(#[from] StoreError),

    #[error("Local cache error: {0}")]
    Cache(#[from] CacheError),
}

#[derive(Error, Debug)]
pub enum ExportError {
    #[error("Failed to create export directory: {0}")]
    CreateDir(std::io::Error),

    #[error("Failed to write document: {0}")]
    Write(std::io::Error),
}
