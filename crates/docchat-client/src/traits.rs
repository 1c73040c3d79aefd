use async_trait::async_trait;

use crate::error::Result;
use crate::streaming::EventStream;
use crate::types::{ChatStreamRequest, HealthStatus, Message, PdfUpload, RemotePdf, UploadedPdf};

/// Contract of the remote chat service
///
/// The session layer only talks to the backend through this trait, so it can
/// run against the HTTP implementation or an in-memory one.
#[async_trait]
pub trait ChatBackend: Send + Sync {
    /// Ids of every persisted thread
    async fn list_sessions(&self) -> Result<Vec<String>>;

    /// Full message list of one thread
    async fn get_session(&self, session_id: &str) -> Result<Vec<Message>>;

    /// Delete a thread and its messages
    async fn delete_session(&self, session_id: &str) -> Result<()>;

    /// Upload a reference document
    async fn upload_pdf(&self, upload: PdfUpload) -> Result<UploadedPdf>;

    /// Open a streaming exchange; the returned stream yields decoded events
    async fn chat_stream(&self, request: ChatStreamRequest) -> Result<EventStream>;

    /// Documents currently cached by the backend
    async fn list_pdfs(&self) -> Result<Vec<RemotePdf>>;

    /// Backend health report
    async fn health(&self) -> Result<HealthStatus>;
}
