use std::path::Path;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::message::Message;
use crate::error::{ClientError, Result};

/// `GET /sessions`
#[derive(Debug, Clone, Deserialize)]
pub struct SessionList {
    pub sessions: Vec<String>,
    #[serde(default)]
    pub total_sessions: Option<usize>,
}

/// `GET /sessions/{id}`
#[derive(Debug, Clone, Deserialize)]
pub struct SessionDetail {
    #[serde(default)]
    pub session_id: Option<String>,
    #[serde(default)]
    pub messages: Vec<Message>,
}

/// Body of `POST /chat-stream`
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ChatStreamRequest {
    pub message: String,
    pub session_id: String,
    pub use_pdf: bool,
    pub pdf_ids: Vec<String>,
}

impl ChatStreamRequest {
    /// `use_pdf` is derived from whether any document ids are attached
    pub fn new(
        message: impl Into<String>,
        session_id: impl Into<String>,
        pdf_ids: Vec<String>,
    ) -> Self {
        Self {
            message: message.into(),
            session_id: session_id.into(),
            use_pdf: !pdf_ids.is_empty(),
            pdf_ids,
        }
    }
}

/// A file about to be sent to `POST /upload-pdf`
#[derive(Debug, Clone)]
pub struct PdfUpload {
    pub filename: String,
    pub bytes: Vec<u8>,
}

impl PdfUpload {
    pub fn new(filename: impl Into<String>, bytes: Vec<u8>) -> Self {
        Self {
            filename: filename.into(),
            bytes,
        }
    }

    /// Read a file from disk, keeping only its file name
    pub async fn from_path(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let filename = path
            .file_name()
            .and_then(|name| name.to_str())
            .ok_or_else(|| ClientError::Config(format!("Not a file path: {}", path.display())))?
            .to_string();
        let bytes = tokio::fs::read(path).await?;
        Ok(Self { filename, bytes })
    }

    /// Only `.pdf` files are accepted by the backend
    pub fn is_pdf(&self) -> bool {
        self.filename.to_lowercase().ends_with(".pdf")
    }
}

/// Successful `POST /upload-pdf` response
#[derive(Debug, Clone, Deserialize)]
pub struct UploadedPdf {
    #[serde(default)]
    pub pdf_id: Option<String>,
    pub filename: String,
    #[serde(default)]
    pub message: Option<String>,
    #[serde(default)]
    pub content_preview: Option<String>,
}

/// Error body returned by the backend on failure
#[derive(Debug, Clone, Default, Deserialize)]
pub struct ErrorBody {
    #[serde(default)]
    pub detail: Option<serde_json::Value>,
}

impl ErrorBody {
    /// `detail` is usually a string, but validation errors send a list
    pub fn detail_text(&self) -> Option<String> {
        match self.detail.as_ref()? {
            serde_json::Value::String(text) => Some(text.clone()),
            other => Some(other.to_string()),
        }
    }
}

/// Entry of `GET /pdfs`
#[derive(Debug, Clone, Deserialize)]
pub struct RemotePdf {
    pub id: String,
    pub filename: String,
    #[serde(default, with = "super::timestamp")]
    pub uploaded_at: Option<DateTime<Utc>>,
}

/// `GET /pdfs`
#[derive(Debug, Clone, Deserialize)]
pub struct PdfList {
    pub pdfs: Vec<RemotePdf>,
    #[serde(default)]
    pub total_pdfs: Option<usize>,
    #[serde(default)]
    pub note: Option<String>,
}

/// `GET /health`
#[derive(Debug, Clone, Deserialize)]
pub struct HealthStatus {
    pub status: String,
    #[serde(default, with = "super::timestamp")]
    pub timestamp: Option<DateTime<Utc>>,
    #[serde(default)]
    pub database_status: Option<String>,
    #[serde(default)]
    pub pdf_cache_size: Option<usize>,
}

impl HealthStatus {
    pub fn is_healthy(&self) -> bool {
        self.status == "healthy"
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::Role;

    #[test]
    fn test_chat_request_serialization() {
        let request = ChatStreamRequest::new("Hello", "session_abc", vec!["pdf-1".to_string()]);
        let json = serde_json::to_value(&request).unwrap();

        assert_eq!(json["message"], "Hello");
        assert_eq!(json["session_id"], "session_abc");
        assert_eq!(json["use_pdf"], true);
        assert_eq!(json["pdf_ids"][0], "pdf-1");
    }

    #[test]
    fn test_chat_request_without_documents() {
        let request = ChatStreamRequest::new("Hello", "session_abc", Vec::new());
        assert!(!request.use_pdf);
    }

    #[test]
    fn test_session_detail_with_naive_timestamps() {
        let json = r#"{
            "session_id": "session_1",
            "messages": [
                {"role": "user", "content": "Hi", "timestamp": "2024-05-01T12:30:00.123456"},
                {"role": "assistant", "content": "Hello!", "timestamp": null}
            ]
        }"#;
        let detail: SessionDetail = serde_json::from_str(json).unwrap();

        assert_eq!(detail.messages.len(), 2);
        assert_eq!(detail.messages[0].role, Role::User);
        assert!(detail.messages[0].timestamp.is_some());
        assert!(detail.messages[1].timestamp.is_none());
    }

    #[test]
    fn test_error_body_detail() {
        let body: ErrorBody = serde_json::from_str(r#"{"detail": "Only PDF files are allowed"}"#).unwrap();
        assert_eq!(body.detail_text().as_deref(), Some("Only PDF files are allowed"));

        let body: ErrorBody = serde_json::from_str(r#"{"detail": [{"msg": "field required"}]}"#).unwrap();
        assert!(body.detail_text().unwrap().contains("field required"));

        let body: ErrorBody = serde_json::from_str("{}").unwrap();
        assert!(body.detail_text().is_none());
    }

    #[test]
    fn test_pdf_extension_check() {
        assert!(PdfUpload::new("paper.PDF", Vec::new()).is_pdf());
        assert!(!PdfUpload::new("notes.txt", Vec::new()).is_pdf());
    }
}
