//! Error types for Pagecast

use std::path::PathBuf;

use thiserror::Error;

pub type Result<T> = std::result::Result<T, PagecastError>;

#[derive(Error, Debug)]
pub enum PagecastError {
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    #[error("Graph API error: {0}")]
    Graph(#[from] GraphError),

    #[error("Content error: {0}")]
    Content(#[from] ContentError),

    #[error("{0}")]
    Setup(#[from] SetupError),

    #[error("Invalid input: {0}")]
    InvalidInput(String),
}

impl PagecastError {
    /// Returns the appropriate exit code for this error
    pub fn exit_code(&self) -> i32 {
        match self {
            PagecastError::InvalidInput(_) => 2,
            PagecastError::Config(_) => 2,
            PagecastError::Setup(_) => 1,
            PagecastError::Graph(_) => 1,
            PagecastError::Content(_) => 1,
        }
    }
}

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("Failed to read config file: {0}")]
    ReadError(#[from] std::io::Error),

    #[error("Failed to parse config: {0}")]
    ParseError(#[from] toml::de::Error),

    #[error("Invalid value: {0}")]
    InvalidValue(String),
}

/// Failures talking to the Graph API.
///
/// Cloneable so a single failure can be both logged and carried in a
/// [`crate::types::PublishOutcome`].
#[derive(Error, Debug, Clone)]
pub enum GraphError {
    #[error("Network error: {0}")]
    Network(String),

    #[error("{0}")]
    Api(String),

    #[error("File not found: {0}")]
    MissingFile(String),

    #[error("HTTP client error: {0}")]
    Client(String),
}

impl From<reqwest::Error> for GraphError {
    fn from(error: reqwest::Error) -> Self {
        if error.is_timeout() {
            GraphError::Network(format!("request timed out: {}", error))
        } else if error.is_builder() {
            GraphError::Client(error.to_string())
        } else {
            GraphError::Network(error.to_string())
        }
    }
}

/// Per-file read failures raised by the post loader.
#[derive(Error, Debug)]
pub enum ContentError {
    #[error("Failed to read {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("{0} is not valid UTF-8")]
    Encoding(PathBuf),

    #[error("Failed to read document {path}: {message}")]
    Document { path: PathBuf, message: String },
}

/// Preconditions whose failure aborts the whole run.
#[derive(Error, Debug)]
pub enum SetupError {
    #[error("Posts directory not found: {0}")]
    PostsDirMissing(PathBuf),

    #[error("Failed to create images directory {path}: {source}")]
    ImagesDir {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Failed to read page registry {path}: {source}")]
    PagesUnreadable {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("No Facebook pages configured in {0}")]
    NoTargets(PathBuf),

    #[error("No valid Facebook pages found")]
    NoReachableTargets,

    #[error("No post files found in {0}")]
    NoPostFiles(PathBuf),

    #[error("No valid posts loaded")]
    NoPosts,
}
