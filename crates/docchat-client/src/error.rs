use thiserror::Error;

#[derive(Error, Debug)]
pub enum ClientError {
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("Backend returned {status}: {detail}")]
    Status {
        status: reqwest::StatusCode,
        detail: String,
    },

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("Stream error: {0}")]
    Stream(String),

    #[error("Invalid configuration: {0}")]
    Config(String),

    #[error("Failed to read upload: {0}")]
    Io(#[from] std::io::Error),
}

impl ClientError {
    /// Server-provided `detail` for status errors, if any
    pub fn detail(&self) -> Option<&str> {
        match self {
            ClientError::Status { detail, .. } if !detail.is_empty() => Some(detail),
            _ => None,
        }
    }
}

pub type Result<T> = std::result::Result<T, ClientError>;
