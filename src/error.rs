use std::path::PathBuf;
use std::time::Duration;
use thiserror::Error;

/// Docscribe error types
#[derive(Error, Debug)]
pub enum Error {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Failed to parse config file: {0}")]
    ConfigParse(#[from] toml::de::Error),

    #[error("Config validation error: {0}")]
    ConfigValidation(String),

    #[error("Parse error in {path}: {message}")]
    Parse { path: PathBuf, message: String },

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("Glob pattern error: {0}")]
    GlobPattern(#[from] glob::PatternError),

    #[error("Parser error: {0}")]
    Parser(String),

    #[error("Backend error: {0}")]
    Backend(#[from] BackendError),
}

/// Failures reported by a completion backend for a single prompt
#[derive(Error, Debug)]
pub enum BackendError {
    #[error("failed to spawn `{program}`: {source}")]
    Spawn {
        program: String,
        #[source]
        source: std::io::Error,
    },

    #[error("failed waiting for `{program}`: {source}")]
    Wait {
        program: String,
        #[source]
        source: std::io::Error,
    },

    #[error("no response within {0:?}")]
    Timeout(Duration),

    #[error("process exited with {status}: {stderr}")]
    ExitStatus { status: String, stderr: String },

    #[error("empty response")]
    EmptyResponse,

    #[error("request failed: {0}")]
    Http(String),

    #[error("{0}")]
    Config(String),
}

/// Result type alias for Docscribe operations
pub type Result<T> = std::result::Result<T, Error>;

impl Error {
    /// Create a config validation error
    pub fn config_validation(msg: impl Into<String>) -> Self {
        Error::ConfigValidation(msg.into())
    }

    /// Create a parse error
    pub fn parse(path: impl Into<PathBuf>, message: impl Into<String>) -> Self {
        Error::Parse {
            path: path.into(),
            message: message.into(),
        }
    }

    /// Create a parser error
    pub fn parser(msg: impl Into<String>) -> Self {
        Error::Parser(msg.into())
    }
}

impl BackendError {
    pub fn http(msg: impl Into<String>) -> Self {
        BackendError::Http(msg.into())
    }
}
