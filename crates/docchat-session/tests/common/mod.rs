//! In-memory backend with scripted streams, shared by the integration tests.

#![allow(dead_code)]

use std::collections::{HashSet, VecDeque};
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::Mutex;

use async_trait::async_trait;
use chrono::{TimeZone, Utc};
use docchat_client::{
    decode_event_stream, ChatBackend, ChatStreamRequest, ClientError, EventStream, HealthStatus,
    Message, PdfUpload, RemotePdf, StatusCode, UploadedPdf,
};

/// What the next `chat_stream` call answers with
pub enum StreamScript {
    /// Raw chunks fed through the real decoder; `Err` simulates a dropped connection
    Chunks(Vec<Result<Vec<u8>, String>>),
    /// Refuse before streaming starts
    Reject,
}

#[derive(Default)]
pub struct ScriptedBackend {
    sessions: Mutex<Vec<(String, Vec<Message>)>>,
    broken_sessions: Mutex<HashSet<String>>,
    streams: Mutex<VecDeque<StreamScript>>,
    chat_requests: Mutex<Vec<ChatStreamRequest>>,
    deleted: Mutex<Vec<String>>,
    upload_failure: Mutex<Option<String>>,
    pub list_fails: AtomicBool,
    pub delete_fails: AtomicBool,
    pub omit_pdf_ids: AtomicBool,
    pub upload_calls: AtomicUsize,
}

impl ScriptedBackend {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_session(self, id: &str, messages: Vec<Message>) -> Self {
        self.sessions
            .lock()
            .unwrap()
            .push((id.to_string(), messages));
        self
    }

    /// Listed, but its detail fetch fails
    pub fn with_broken_session(self, id: &str) -> Self {
        self.sessions.lock().unwrap().push((id.to_string(), Vec::new()));
        self.broken_sessions.lock().unwrap().insert(id.to_string());
        self
    }

    pub fn push_stream(&self, script: StreamScript) {
        self.streams.lock().unwrap().push_back(script);
    }

    pub fn fail_uploads_with(&self, detail: &str) {
        *self.upload_failure.lock().unwrap() = Some(detail.to_string());
    }

    pub fn chat_requests(&self) -> Vec<ChatStreamRequest> {
        self.chat_requests.lock().unwrap().clone()
    }

    pub fn deleted(&self) -> Vec<String> {
        self.deleted.lock().unwrap().clone()
    }

    pub fn uploads(&self) -> usize {
        self.upload_calls.load(Ordering::SeqCst)
    }
}

fn not_found(what: &str) -> ClientError {
    ClientError::Status {
        status: StatusCode::NOT_FOUND,
        detail: format!("{} not found", what),
    }
}

#[async_trait]
impl ChatBackend for ScriptedBackend {
    async fn list_sessions(&self) -> docchat_client::Result<Vec<String>> {
        if self.list_fails.load(Ordering::SeqCst) {
            return Err(ClientError::Stream("connection refused".to_string()));
        }
        Ok(self
            .sessions
            .lock()
            .unwrap()
            .iter()
            .map(|(id, _)| id.clone())
            .collect())
    }

    async fn get_session(&self, session_id: &str) -> docchat_client::Result<Vec<Message>> {
        if self.broken_sessions.lock().unwrap().contains(session_id) {
            return Err(ClientError::Stream("detail fetch failed".to_string()));
        }
        self.sessions
            .lock()
            .unwrap()
            .iter()
            .find(|(id, _)| id == session_id)
            .map(|(_, messages)| messages.clone())
            .ok_or_else(|| not_found(session_id))
    }

    async fn delete_session(&self, session_id: &str) -> docchat_client::Result<()> {
        self.deleted.lock().unwrap().push(session_id.to_string());
        if self.delete_fails.load(Ordering::SeqCst) {
            return Err(ClientError::Status {
                status: StatusCode::INTERNAL_SERVER_ERROR,
                detail: String::new(),
            });
        }
        self.sessions.lock().unwrap().retain(|(id, _)| id != session_id);
        Ok(())
    }

    async fn upload_pdf(&self, upload: PdfUpload) -> docchat_client::Result<UploadedPdf> {
        let n = self.upload_calls.fetch_add(1, Ordering::SeqCst) + 1;
        if let Some(detail) = self.upload_failure.lock().unwrap().clone() {
            return Err(ClientError::Status {
                status: StatusCode::BAD_REQUEST,
                detail,
            });
        }

        let pdf_id = if self.omit_pdf_ids.load(Ordering::SeqCst) {
            None
        } else {
            Some(format!("pdf-{}", n))
        };
        Ok(UploadedPdf {
            pdf_id,
            filename: upload.filename,
            message: Some("stored".to_string()),
            content_preview: Some("preview".to_string()),
        })
    }

    async fn chat_stream(&self, request: ChatStreamRequest) -> docchat_client::Result<EventStream> {
        self.chat_requests.lock().unwrap().push(request);
        let script = self
            .streams
            .lock()
            .unwrap()
            .pop_front()
            .unwrap_or(StreamScript::Reject);

        match script {
            StreamScript::Chunks(chunks) => Ok(decode_event_stream(futures::stream::iter(chunks))),
            StreamScript::Reject => Err(ClientError::Status {
                status: StatusCode::INTERNAL_SERVER_ERROR,
                detail: "Could not initiate chat stream".to_string(),
            }),
        }
    }

    async fn list_pdfs(&self) -> docchat_client::Result<Vec<RemotePdf>> {
        Ok(Vec::new())
    }

    async fn health(&self) -> docchat_client::Result<HealthStatus> {
        Ok(HealthStatus {
            status: "healthy".to_string(),
            timestamp: None,
            database_status: Some("connected".to_string()),
            pdf_cache_size: Some(0),
        })
    }
}

/// `data: {json}` frame followed by the blank separator line
pub fn frame(json: &str) -> Result<Vec<u8>, String> {
    Ok(format!("data: {}\n\n", json).into_bytes())
}

pub fn delta(text: &str) -> Result<Vec<u8>, String> {
    frame(&serde_json::json!({ "content": text, "done": false }).to_string())
}

pub fn done() -> Result<Vec<u8>, String> {
    frame(r#"{"content": "", "done": true}"#)
}

pub fn error_frame(message: &str) -> Result<Vec<u8>, String> {
    frame(&serde_json::json!({ "error": message, "done": true }).to_string())
}

/// Message with a fixed timestamp on 2024-05-01 at `hour`:00
pub fn at_hour(mut message: Message, hour: u32) -> Message {
    message.timestamp = Some(Utc.with_ymd_and_hms(2024, 5, 1, hour, 0, 0).unwrap());
    message
}

pub fn pdf(name: &str) -> PdfUpload {
    PdfUpload::new(name, b"%PDF-1.4".to_vec())
}
