pub mod api;
pub mod message;
pub mod timestamp;

pub use api::{
    ChatStreamRequest, ErrorBody, HealthStatus, PdfList, PdfUpload, RemotePdf, SessionDetail,
    SessionList, UploadedPdf,
};
pub use message::{Message, Role};
