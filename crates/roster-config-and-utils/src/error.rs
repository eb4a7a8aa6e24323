//! Errors raised while preparing config, paths and logging.

use thiserror::Error;

#[derive(Error, Debug)]
pub enum CoreError {
    /// A value in the config file is out of range.
    #[error("Invalid configuration: {0}")]
    Config(String),

    #[error("Filesystem error: {0}")]
    Io(#[from] std::io::Error),

    /// `api_url` or `push_url` does not parse.
    #[error("Invalid URL: {0}")]
    InvalidUrl(#[from] url::ParseError),

    /// The config file is not valid JSON for [`crate::Config`].
    #[error("Malformed config file: {0}")]
    Json(#[from] serde_json::Error),

    /// Neither `ROSTER_HOME` nor a home directory is available.
    #[error("Cannot locate the roster directory: {0}")]
    Path(String),
}

pub type CoreResult<T> = Result<T, CoreError>;
