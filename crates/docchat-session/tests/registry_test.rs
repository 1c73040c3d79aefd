mod common;

use std::sync::atomic::Ordering;

use common::{pdf, ScriptedBackend};
use docchat_session::{DocumentRegistry, SessionError, MAX_DOCUMENTS};

#[tokio::test]
async fn test_capacity_checked_before_request() {
    let backend = ScriptedBackend::new();
    let mut registry = DocumentRegistry::new();

    for i in 0..MAX_DOCUMENTS {
        registry
            .upload(&backend, pdf(&format!("doc{}.pdf", i)))
            .await
            .unwrap();
    }
    let result = registry.upload(&backend, pdf("extra.pdf")).await;

    assert!(matches!(result, Err(SessionError::CapacityReached { max: 3 })));
    assert_eq!(backend.uploads(), MAX_DOCUMENTS);
    assert_eq!(registry.len(), MAX_DOCUMENTS);
}

#[tokio::test]
async fn test_non_pdf_rejected_locally() {
    let backend = ScriptedBackend::new();
    let mut registry = DocumentRegistry::new();

    let result = registry.upload(&backend, pdf("slides.PPTX")).await;

    assert!(matches!(result, Err(SessionError::NotAPdf(name)) if name == "slides.PPTX"));
    assert_eq!(backend.uploads(), 0);
    assert!(registry.is_empty());
}

#[tokio::test]
async fn test_uppercase_extension_accepted() {
    let backend = ScriptedBackend::new();
    let mut registry = DocumentRegistry::new();

    let document = registry.upload(&backend, pdf("REPORT.PDF")).await.unwrap();

    assert_eq!(document.id.as_str(), "pdf-1");
    assert_eq!(document.filename, "REPORT.PDF");
    assert_eq!(document.preview.as_deref(), Some("preview"));
}

#[tokio::test]
async fn test_backend_failure_carries_detail() {
    let backend = ScriptedBackend::new();
    backend.fail_uploads_with("Error processing PDF: file is encrypted");
    let mut registry = DocumentRegistry::new();

    let result = registry.upload(&backend, pdf("locked.pdf")).await;

    match result {
        Err(SessionError::Upload(detail)) => {
            assert_eq!(detail, "Error processing PDF: file is encrypted")
        }
        other => panic!("unexpected result: {:?}", other),
    }
    assert!(registry.is_empty());
}

#[tokio::test]
async fn test_missing_backend_id_gets_local_one() {
    let backend = ScriptedBackend::new();
    backend.omit_pdf_ids.store(true, Ordering::SeqCst);
    let mut registry = DocumentRegistry::new();

    let first = registry.upload(&backend, pdf("a.pdf")).await.unwrap();
    let second = registry.upload(&backend, pdf("b.pdf")).await.unwrap();

    assert!(!first.id.as_str().is_empty());
    assert_ne!(first.id, second.id);
    assert!(registry.get(&first.id).is_some());
}
