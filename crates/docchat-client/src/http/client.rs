// reqwest implementation of the backend contract

use async_trait::async_trait;
use reqwest::header::{HeaderMap, HeaderValue, ACCEPT};
use reqwest::multipart::{Form, Part};
use reqwest::Response;
use serde::de::DeserializeOwned;
use url::Url;

use crate::buffer_utils::decode_event_stream;
use crate::config::ClientConfig;
use crate::error::{ClientError, Result};
use crate::streaming::EventStream;
use crate::traits::ChatBackend;
use crate::types::{
    ChatStreamRequest, ErrorBody, HealthStatus, Message, PdfList, PdfUpload, RemotePdf,
    SessionDetail, SessionList, UploadedPdf,
};

/// HTTP client for the chat backend
pub struct HttpChatBackend {
    http_client: reqwest::Client,
    base_url: String,
}

impl HttpChatBackend {
    /// Create client against the given base URL with default settings
    pub fn new(base_url: impl Into<String>) -> Result<Self> {
        Self::from_config(&ClientConfig::new(base_url))
    }

    pub fn from_config(config: &ClientConfig) -> Result<Self> {
        let base_url = config.normalized_base_url()?;

        let mut headers = HeaderMap::new();
        headers.insert(ACCEPT, HeaderValue::from_static("application/json"));

        let http_client = reqwest::Client::builder()
            .default_headers(headers)
            .connect_timeout(config.connect_timeout())
            .build()?;

        Ok(Self {
            http_client,
            base_url,
        })
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    /// Build `{base_url}/{segments...}` with each segment percent-encoded
    fn endpoint(&self, segments: &[&str]) -> Result<Url> {
        let mut url = Url::parse(&self.base_url)
            .map_err(|e| ClientError::Config(format!("Invalid base URL: {}", e)))?;
        url.path_segments_mut()
            .map_err(|_| ClientError::Config("Base URL cannot carry a path".to_string()))?
            .pop_if_empty()
            .extend(segments);
        Ok(url)
    }

    async fn get_json<T: DeserializeOwned>(&self, segments: &[&str]) -> Result<T> {
        let url = self.endpoint(segments)?;
        let response = self.http_client.get(url).send().await?;
        let response = Self::check_status(response).await?;
        Ok(response.json::<T>().await?)
    }

    /// Pass successful responses through; turn failures into `ClientError::Status`
    async fn check_status(response: Response) -> Result<Response> {
        let status = response.status();
        if status.is_success() {
            tracing::debug!("Backend request successful: {} {}", status, response.url());
            return Ok(response);
        }

        let body = response
            .text()
            .await
            .unwrap_or_else(|_| "Failed to read response body".to_string());
        let detail = serde_json::from_str::<ErrorBody>(&body)
            .ok()
            .and_then(|b| b.detail_text())
            .unwrap_or(body);

        tracing::debug!("Backend request failed: status={}, detail={}", status, detail);
        Err(ClientError::Status { status, detail })
    }
}

#[async_trait]
impl ChatBackend for HttpChatBackend {
    async fn list_sessions(&self) -> Result<Vec<String>> {
        let list: SessionList = self.get_json(&["sessions"]).await?;
        Ok(list.sessions)
    }

    async fn get_session(&self, session_id: &str) -> Result<Vec<Message>> {
        let detail: SessionDetail = self.get_json(&["sessions", session_id]).await?;
        Ok(detail.messages)
    }

    async fn delete_session(&self, session_id: &str) -> Result<()> {
        let url = self.endpoint(&["sessions", session_id])?;
        let response = self.http_client.delete(url).send().await?;
        Self::check_status(response).await?;
        Ok(())
    }

    async fn upload_pdf(&self, upload: PdfUpload) -> Result<UploadedPdf> {
        let url = self.endpoint(&["upload-pdf"])?;
        let part = Part::bytes(upload.bytes)
            .file_name(upload.filename)
            .mime_str("application/pdf")?;
        let form = Form::new().part("file", part);

        let response = self.http_client.post(url).multipart(form).send().await?;
        let response = Self::check_status(response).await?;
        Ok(response.json::<UploadedPdf>().await?)
    }

    async fn chat_stream(&self, request: ChatStreamRequest) -> Result<EventStream> {
        let url = self.endpoint(&["chat-stream"])?;
        tracing::debug!(
            session_id = %request.session_id,
            pdf_count = request.pdf_ids.len(),
            "Opening chat stream"
        );

        let response = self
            .http_client
            .post(url)
            .header(ACCEPT, "text/event-stream")
            .json(&request)
            .send()
            .await?;
        let response = Self::check_status(response).await?;

        Ok(decode_event_stream(response.bytes_stream()))
    }

    async fn list_pdfs(&self) -> Result<Vec<RemotePdf>> {
        let list: PdfList = self.get_json(&["pdfs"]).await?;
        Ok(list.pdfs)
    }

    async fn health(&self) -> Result<HealthStatus> {
        self.get_json(&["health"]).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_client_creation() {
        assert!(HttpChatBackend::new("http://localhost:8000").is_ok());
        assert!(HttpChatBackend::new("localhost").is_err());
    }

    #[test]
    fn test_endpoint_encodes_segments() {
        let client = HttpChatBackend::new("http://localhost:8000/").unwrap();
        assert_eq!(client.base_url(), "http://localhost:8000");

        let url = client.endpoint(&["sessions", "a b/c"]).unwrap();
        assert_eq!(url.as_str(), "http://localhost:8000/sessions/a%20b%2Fc");
    }

    #[test]
    fn test_endpoint_keeps_base_path() {
        let client = HttpChatBackend::new("http://localhost:8000/api").unwrap();
        let url = client.endpoint(&["sessions"]).unwrap();
        assert_eq!(url.as_str(), "http://localhost:8000/api/sessions");
    }
}
