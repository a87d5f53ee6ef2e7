//! Error types for the browser shell

use thiserror::Error;

use crate::state::TabId;

/// Result type alias for shell operations
pub type ShellResult<T> = Result<T, ShellError>;

/// Main error type for the shell core
#[derive(Error, Debug)]
pub enum ShellError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("URL error: {0}")]
    Url(#[from] url::ParseError),

    #[error("View error: {0}")]
    View(String),

    #[error("Host error: {0}")]
    Host(String),

    #[error("Tab not found: {0}")]
    NotFound(TabId),
}

impl ShellError {
    /// Create a new view error
    pub fn view(msg: impl Into<String>) -> Self {
        Self::View(msg.into())
    }

    /// Create a new host error
    pub fn host(msg: impl Into<String>) -> Self {
        Self::Host(msg.into())
    }
}
