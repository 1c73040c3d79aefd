pub mod controller;
pub mod directory;
pub mod error;
pub mod notice;
pub mod registry;
pub mod transcript;

pub use controller::{
    ExchangeProgress, SessionController, SessionState, StreamingExchange, GENERIC_FAILURE_MESSAGE,
};
pub use directory::{derive_title, ThreadDirectory, ThreadSummary, NEW_THREAD_TITLE};
pub use error::{Result, SessionError};
pub use notice::Notice;
pub use registry::{DocumentId, DocumentRegistry, ReferenceDocument, MAX_DOCUMENTS};
pub use transcript::TranscriptStore;

pub use docchat_client::{Message, Role, StreamEvent};
