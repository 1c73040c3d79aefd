use std::fmt;

use chrono::{DateTime, Utc};
use docchat_client::{ChatBackend, PdfUpload};

use crate::error::{Result, SessionError};

/// Maximum number of reference documents held at once
pub const MAX_DOCUMENTS: usize = 3;

/// Backend-issued (or locally generated) document identifier
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct DocumentId(String);

impl DocumentId {
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    fn generate() -> Self {
        Self(uuid::Uuid::new_v4().to_string())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for DocumentId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for DocumentId {
    fn from(id: &str) -> Self {
        Self::new(id)
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ReferenceDocument {
    pub id: DocumentId,
    pub filename: String,
    pub uploaded_at: DateTime<Utc>,
    /// First characters of the extracted text, as reported by the backend
    pub preview: Option<String>,
}

/// Uploaded documents and the subset attached to the next message
#[derive(Debug, Default)]
pub struct DocumentRegistry {
    documents: Vec<ReferenceDocument>,
    active: Vec<DocumentId>,
}

impl DocumentRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Upload a document and admit it on success
    ///
    /// Capacity and file type are checked before any request is made. The
    /// check and the admission happen under the same `&mut self` borrow, so two
    /// uploads can never both slip past a capacity check.
    pub async fn upload(
        &mut self,
        backend: &dyn ChatBackend,
        upload: PdfUpload,
    ) -> Result<ReferenceDocument> {
        if self.is_full() {
            return Err(SessionError::CapacityReached { max: MAX_DOCUMENTS });
        }
        if !upload.is_pdf() {
            return Err(SessionError::NotAPdf(upload.filename));
        }

        let filename = upload.filename.clone();
        let uploaded = backend.upload_pdf(upload).await.map_err(|e| {
            tracing::error!("Error uploading PDF {}: {}", filename, e);
            SessionError::Upload(e.detail().map(str::to_string).unwrap_or_else(|| e.to_string()))
        })?;

        let document = ReferenceDocument {
            id: uploaded
                .pdf_id
                .map(DocumentId::new)
                .unwrap_or_else(DocumentId::generate),
            filename: uploaded.filename,
            uploaded_at: Utc::now(),
            preview: uploaded.content_preview,
        };
        tracing::info!("Uploaded PDF {} as {}", document.filename, document.id);

        self.documents.push(document.clone());
        Ok(document)
    }

    /// Drop a document from the held set and the active set
    pub fn remove(&mut self, id: &DocumentId) -> bool {
        let before = self.documents.len();
        self.documents.retain(|d| &d.id != id);
        self.active.retain(|a| a != id);
        self.documents.len() != before
    }

    /// Flip activation; returns whether the document is now active
    pub fn toggle_active(&mut self, id: &DocumentId) -> Result<bool> {
        if !self.documents.iter().any(|d| &d.id == id) {
            return Err(SessionError::UnknownDocument(id.to_string()));
        }

        if let Some(pos) = self.active.iter().position(|a| a == id) {
            self.active.remove(pos);
            Ok(false)
        } else {
            self.active.push(id.clone());
            Ok(true)
        }
    }

    pub fn clear_active(&mut self) {
        self.active.clear();
    }

    pub fn is_active(&self, id: &DocumentId) -> bool {
        self.active.contains(id)
    }

    /// Active ids in activation order
    pub fn active_ids(&self) -> &[DocumentId] {
        &self.active
    }

    pub fn active_documents(&self) -> impl Iterator<Item = &ReferenceDocument> {
        self.active
            .iter()
            .filter_map(|id| self.documents.iter().find(|d| &d.id == id))
    }

    pub fn active_filenames(&self) -> Vec<&str> {
        self.active_documents().map(|d| d.filename.as_str()).collect()
    }

    pub fn documents(&self) -> &[ReferenceDocument] {
        &self.documents
    }

    pub fn get(&self, id: &DocumentId) -> Option<&ReferenceDocument> {
        self.documents.iter().find(|d| &d.id == id)
    }

    pub fn len(&self) -> usize {
        self.documents.len()
    }

    pub fn is_empty(&self) -> bool {
        self.documents.is_empty()
    }

    pub fn is_full(&self) -> bool {
        self.documents.len() >= MAX_DOCUMENTS
    }

    pub fn capacity(&self) -> usize {
        MAX_DOCUMENTS
    }

    #[cfg(test)]
    pub(crate) fn insert_for_test(&mut self, id: &str, filename: &str) {
        self.documents.push(ReferenceDocument {
            id: DocumentId::new(id),
            filename: filename.to_string(),
            uploaded_at: Utc::now(),
            preview: None,
        });
    }
}
