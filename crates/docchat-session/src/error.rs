use docchat_client::ClientError;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum SessionError {
    #[error("Maximum {max} PDFs allowed. Please delete a PDF before uploading a new one.")]
    CapacityReached { max: usize },

    #[error("Please select a PDF file (got '{0}').")]
    NotAPdf(String),

    #[error("Error uploading PDF: {0}")]
    Upload(String),

    #[error("Unknown document: {0}")]
    UnknownDocument(String),

    #[error("Backend error: {0}")]
    Backend(#[from] ClientError),
}

pub type Result<T> = std::result::Result<T, SessionError>;
