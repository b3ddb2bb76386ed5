use shared::error::ParamError;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ClientError {
    #[error("invalid server url '{url}': {source}")]
    InvalidUrl {
        url: String,
        source: url::ParseError,
    },
    #[error("request to {path} failed: {source}")]
    Transport {
        path: String,
        source: reqwest::Error,
    },
    #[error("{path} returned HTTP {status}")]
    HttpStatus { path: String, status: u16 },
    #[error("malformed response from {path}: {message}")]
    Decode { path: String, message: String },
    #[error(transparent)]
    Params(#[from] ParamError),
    #[error("{command} is not available while the run is {state}{hint}")]
    Unavailable {
        command: &'static str,
        state: String,
        hint: &'static str,
    },
}

impl ClientError {
    /// Connection-level failures, as opposed to a reachable backend rejecting the request.
    pub fn is_transport(&self) -> bool {
        matches!(self, Self::Transport { .. })
    }
}

pub type ClientResult<T> = std::result::Result<T, ClientError>;
