use std::collections::VecDeque;
use std::fmt;
use std::path::Path;
use std::sync::Arc;

use docchat_client::{
    ChatBackend, ChatStreamRequest, ClientError, EventStream, HealthStatus, PdfUpload, RemotePdf,
    StreamEvent,
};
use futures::StreamExt;

use crate::directory::ThreadDirectory;
use crate::error::{Result, SessionError};
use crate::notice::Notice;
use crate::registry::{DocumentId, DocumentRegistry, ReferenceDocument, MAX_DOCUMENTS};
use crate::transcript::TranscriptStore;

/// Assistant message shown when an exchange fails for any reason
pub const GENERIC_FAILURE_MESSAGE: &str = "Sorry, I encountered an error. Please try again.";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionState {
    Idle,
    /// User message accepted, stream not open yet
    Sending,
    /// Stream open, deltas arriving
    Streaming,
}

/// One request/response pair delivering incremental assistant output
///
/// The exchange is tagged with the thread it was opened for and the
/// controller's navigation epoch at that moment. The controller applies its
/// items only while both still match, so output can never land in a thread the
/// user has navigated to since. Dropping the exchange drops the underlying
/// response body.
pub struct StreamingExchange {
    owner_thread_id: String,
    epoch: u64,
    events: EventStream,
    open: bool,
}

impl StreamingExchange {
    pub fn owner_thread_id(&self) -> &str {
        &self.owner_thread_id
    }

    pub fn is_open(&self) -> bool {
        self.open
    }

    /// Next decoder item; `None` once the connection has closed
    pub async fn next_item(&mut self) -> Option<std::result::Result<StreamEvent, ClientError>> {
        if !self.open {
            return None;
        }
        self.events.next().await
    }
}

impl fmt::Debug for StreamingExchange {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("StreamingExchange")
            .field("owner_thread_id", &self.owner_thread_id)
            .field("epoch", &self.epoch)
            .field("open", &self.open)
            .finish()
    }
}

/// Outcome of handing one stream item to the controller
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ExchangeProgress {
    /// Delta appended to the in-flight reply
    Applied,
    /// Reply committed to the transcript
    Completed,
    /// Exchange failed; the failure message was appended
    Failed,
    /// Exchange belongs to a thread that is no longer current; item dropped
    Stale,
}

impl ExchangeProgress {
    /// No further items of this exchange will have any effect
    pub fn is_finished(&self) -> bool {
        !matches!(self, ExchangeProgress::Applied)
    }
}

/// Owns the current thread and coordinates every user action with the
/// streaming exchange it may be racing against
pub struct SessionController {
    backend: Arc<dyn ChatBackend>,
    current_thread_id: String,
    /// Bumped on every thread change; stale exchanges carry an older value
    epoch: u64,
    state: SessionState,
    transcript: TranscriptStore,
    directory: ThreadDirectory,
    documents: DocumentRegistry,
    notices: VecDeque<Notice>,
}

impl SessionController {
    /// Start on a fresh, empty thread. The directory starts empty; call
    /// `refresh_threads` to populate it.
    pub fn new(backend: Arc<dyn ChatBackend>) -> Self {
        Self {
            backend,
            current_thread_id: generate_thread_id(),
            epoch: 0,
            state: SessionState::Idle,
            transcript: TranscriptStore::new(),
            directory: ThreadDirectory::new(),
            documents: DocumentRegistry::new(),
            notices: VecDeque::new(),
        }
    }

    pub fn state(&self) -> SessionState {
        self.state
    }

    pub fn current_thread_id(&self) -> &str {
        &self.current_thread_id
    }

    pub fn transcript(&self) -> &TranscriptStore {
        &self.transcript
    }

    pub fn directory(&self) -> &ThreadDirectory {
        &self.directory
    }

    pub fn documents(&self) -> &DocumentRegistry {
        &self.documents
    }

    /// Take all pending notices, oldest first
    pub fn drain_notices(&mut self) -> Vec<Notice> {
        self.notices.drain(..).collect()
    }

    /// Reload the thread list; on failure the previous list stays
    pub async fn refresh_threads(&mut self) -> bool {
        match self.directory.refresh(self.backend.as_ref()).await {
            Ok(()) => true,
            Err(e) => {
                tracing::error!("Error loading chat sessions: {}", e);
                false
            }
        }
    }

    /// Leave the current thread: cancel any exchange, drop its partial reply,
    /// clear activation
    fn enter_thread(&mut self, thread_id: String) {
        self.epoch += 1;
        self.current_thread_id = thread_id;
        self.transcript.clear();
        self.documents.clear_active();
        self.state = SessionState::Idle;
    }

    pub async fn start_new_thread(&mut self) {
        let thread_id = generate_thread_id();
        tracing::info!("Starting new thread {}", thread_id);
        self.enter_thread(thread_id);
        self.refresh_threads().await;
    }

    /// Make `thread_id` current and load its messages
    ///
    /// Falls back to a new thread when the messages cannot be loaded; returns
    /// whether the switch succeeded.
    pub async fn switch_thread(&mut self, thread_id: &str) -> bool {
        tracing::info!("Switching to thread {}", thread_id);
        self.enter_thread(thread_id.to_string());

        match self.backend.get_session(thread_id).await {
            Ok(messages) => {
                self.transcript.replace_all(messages);
                true
            }
            Err(e) => {
                tracing::error!("Failed to load session {}. Creating a new chat: {}", thread_id, e);
                self.notices.push_back(Notice::ThreadLoadFailed {
                    thread_id: thread_id.to_string(),
                });
                self.start_new_thread().await;
                false
            }
        }
    }

    /// Delete a thread on the backend and locally
    ///
    /// The local removal happens whatever the backend answers.
    pub async fn delete_thread(&mut self, thread_id: &str) {
        if let Err(e) = self.backend.delete_session(thread_id).await {
            tracing::warn!("Failed to delete session {}: {}", thread_id, e);
            self.notices.push_back(Notice::DeleteFailed {
                thread_id: thread_id.to_string(),
            });
        }

        self.directory.remove(thread_id);
        if thread_id == self.current_thread_id {
            self.start_new_thread().await;
        }
    }

    /// Delete the current thread on the backend, then start a new one
    pub async fn reset_current_thread(&mut self) {
        let thread_id = self.current_thread_id.clone();
        if let Err(e) = self.backend.delete_session(&thread_id).await {
            tracing::warn!(
                "Failed to delete session {} on backend, continuing with client-side reset: {}",
                thread_id,
                e
            );
        }
        self.start_new_thread().await;
    }

    /// Send a user message and open the streaming exchange for the reply
    ///
    /// Returns `None` when the text is blank, when another exchange is still
    /// running, or when the exchange could not be opened (the failure message
    /// is then already in the transcript).
    pub async fn submit(&mut self, text: &str) -> Option<StreamingExchange> {
        if text.trim().is_empty() || self.state != SessionState::Idle {
            tracing::debug!("Ignoring submit in state {:?}", self.state);
            return None;
        }

        self.transcript.append_user_message(text);
        self.state = SessionState::Sending;

        let pdf_ids = self
            .documents
            .active_ids()
            .iter()
            .map(|id| id.as_str().to_string())
            .collect();
        let request = ChatStreamRequest::new(text, self.current_thread_id.clone(), pdf_ids);

        match self.backend.chat_stream(request).await {
            Ok(events) => {
                self.transcript.begin_assistant_stream();
                self.state = SessionState::Streaming;
                Some(StreamingExchange {
                    owner_thread_id: self.current_thread_id.clone(),
                    epoch: self.epoch,
                    events,
                    open: true,
                })
            }
            Err(e) => {
                tracing::error!("Streaming error: {}", e);
                self.fail_exchange();
                None
            }
        }
    }

    /// Apply one item pulled from `exchange`; `None` means the connection closed
    pub async fn handle_stream_item(
        &mut self,
        exchange: &mut StreamingExchange,
        item: Option<std::result::Result<StreamEvent, ClientError>>,
    ) -> ExchangeProgress {
        if !exchange.open || !self.owns(exchange) {
            if exchange.open {
                tracing::debug!(
                    "Dropping output of stale exchange for thread {}",
                    exchange.owner_thread_id
                );
            }
            exchange.open = false;
            return ExchangeProgress::Stale;
        }

        match item {
            Some(Ok(StreamEvent::Delta { content })) => {
                self.transcript.append_delta(&content);
                ExchangeProgress::Applied
            }
            Some(Ok(StreamEvent::Done)) => {
                exchange.open = false;
                self.transcript.commit_stream();
                self.state = SessionState::Idle;
                self.refresh_threads().await;
                ExchangeProgress::Completed
            }
            Some(Ok(StreamEvent::Error { message })) => {
                tracing::error!("Streaming error reported by backend: {}", message);
                exchange.open = false;
                self.fail_exchange();
                ExchangeProgress::Failed
            }
            Some(Err(e)) => {
                tracing::error!("Streaming error: {}", e);
                exchange.open = false;
                self.fail_exchange();
                ExchangeProgress::Failed
            }
            None => {
                tracing::error!("Stream closed before completion");
                exchange.open = false;
                self.fail_exchange();
                ExchangeProgress::Failed
            }
        }
    }

    /// Pull and apply items until the exchange finishes
    pub async fn drive_exchange(&mut self, mut exchange: StreamingExchange) -> ExchangeProgress {
        loop {
            let item = exchange.next_item().await;
            let progress = self.handle_stream_item(&mut exchange, item).await;
            if progress.is_finished() {
                return progress;
            }
        }
    }

    fn owns(&self, exchange: &StreamingExchange) -> bool {
        exchange.epoch == self.epoch && exchange.owner_thread_id == self.current_thread_id
    }

    fn fail_exchange(&mut self) {
        self.transcript.discard_stream();
        self.transcript.append_assistant_message(GENERIC_FAILURE_MESSAGE);
        self.state = SessionState::Idle;
    }

    /// Upload a reference document; the outcome is reported as a notice
    pub async fn upload_document(&mut self, upload: PdfUpload) -> Option<ReferenceDocument> {
        match self.documents.upload(self.backend.as_ref(), upload).await {
            Ok(document) => {
                self.notices.push_back(Notice::DocumentUploaded {
                    filename: document.filename.clone(),
                });
                Some(document)
            }
            Err(e) => {
                self.notices.push_back(upload_failure_notice(e));
                None
            }
        }
    }

    /// Read a file from disk and upload it
    pub async fn upload_document_from_path(
        &mut self,
        path: impl AsRef<Path>,
    ) -> Option<ReferenceDocument> {
        if self.documents.is_full() {
            self.notices
                .push_back(Notice::CapacityReached { max: MAX_DOCUMENTS });
            return None;
        }

        match PdfUpload::from_path(path).await {
            Ok(upload) => self.upload_document(upload).await,
            Err(e) => {
                tracing::error!("Error reading upload: {}", e);
                self.notices.push_back(Notice::UploadFailed {
                    detail: e.to_string(),
                });
                None
            }
        }
    }

    pub fn remove_document(&mut self, id: &DocumentId) -> bool {
        self.documents.remove(id)
    }

    /// Flip a document's activation; `None` for unknown ids
    pub fn toggle_document(&mut self, id: &DocumentId) -> Option<bool> {
        match self.documents.toggle_active(id) {
            Ok(active) => Some(active),
            Err(e) => {
                tracing::warn!("{}", e);
                None
            }
        }
    }

    /// Documents the backend currently keeps in memory
    pub async fn server_documents(&self) -> Result<Vec<RemotePdf>> {
        Ok(self.backend.list_pdfs().await?)
    }

    pub async fn health(&self) -> Result<HealthStatus> {
        Ok(self.backend.health().await?)
    }
}

fn generate_thread_id() -> String {
    format!("session_{}", uuid::Uuid::new_v4().simple())
}

fn upload_failure_notice(error: SessionError) -> Notice {
    match error {
        SessionError::CapacityReached { max } => Notice::CapacityReached { max },
        SessionError::NotAPdf(filename) => Notice::NotAPdf { filename },
        SessionError::Upload(detail) => Notice::UploadFailed { detail },
        other => Notice::UploadFailed {
            detail: other.to_string(),
        },
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_generated_thread_ids_are_unique() {
        let a = generate_thread_id();
        let b = generate_thread_id();
        assert!(a.starts_with("session_"));
        assert_ne!(a, b);
    }

    #[test]
    fn test_progress_finished() {
        assert!(!ExchangeProgress::Applied.is_finished());
        assert!(ExchangeProgress::Completed.is_finished());
        assert!(ExchangeProgress::Failed.is_finished());
        assert!(ExchangeProgress::Stale.is_finished());
    }

    #[test]
    fn test_upload_failure_notices() {
        assert_eq!(
            upload_failure_notice(SessionError::CapacityReached { max: 3 }),
            Notice::CapacityReached { max: 3 }
        );
        assert_eq!(
            upload_failure_notice(SessionError::Upload("bad".to_string())),
            Notice::UploadFailed {
                detail: "bad".to_string()
            }
        );
    }
}
