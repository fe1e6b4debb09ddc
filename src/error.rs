use std::io;
use std::result::Result as StdResult;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum Error {
    #[error("Rate limit exceeded: {0}")]
    RateLimited(String),
    #[error("Network error: {0}")]
    Network(String),
    #[error("Malformed response: {0}")]
    MalformedResponse(String),
    #[error("Unexpected HTTP status {status}: {message}")]
    UnexpectedStatus { status: u16, message: String },
    #[error("Request failed after {attempts} attempts (last status: {last_status:?})")]
    RetriesExhausted {
        attempts: u32,
        last_status: Option<u16>,
    },
    #[error("Configuration error: {0}")]
    Config(String),
    #[error("Invalid input: {0}")]
    InvalidInput(String),
    #[error("Notification error: {0}")]
    Notification(String),
    #[error("Publish error: {0}")]
    Publish(String),
    #[error("IO error: {0}")]
    Io(#[from] io::Error),
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),
}

impl Error {
    /// Errors the fetch loops recover from by sleeping and retrying.
    pub fn is_transient(&self) -> bool {
        match self {
            Error::RateLimited(_)
            | Error::Network(_)
            | Error::MalformedResponse(_)
            | Error::UnexpectedStatus { .. }
            | Error::RetriesExhausted { .. }
            | Error::Http(_) => true,
            Error::Config(_)
            | Error::InvalidInput(_)
            | Error::Notification(_)
            | Error::Publish(_)
            | Error::Io(_) => false,
        }
    }

    pub fn is_rate_limited(&self) -> bool {
        matches!(self, Error::RateLimited(_))
    }
}

impl From<serde_json::Error> for Error {
    fn from(err: serde_json::Error) -> Self {
        Error::MalformedResponse(err.to_string())
    }
}

impl From<toml::de::Error> for Error {
    fn from(err: toml::de::Error) -> Self {
        Error::Config(err.to_string())
    }
}

pub type Result<T> = StdResult<T, Error>;
