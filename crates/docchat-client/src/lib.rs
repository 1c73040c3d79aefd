pub mod buffer_utils;
pub mod config;
pub mod error;
pub mod http;
pub mod streaming;
pub mod traits;
pub mod types;

pub use buffer_utils::{decode_event_stream, FrameDecoder, LineBuffer, FRAME_PREFIX};
pub use config::ClientConfig;
pub use error::{ClientError, Result};
pub use http::HttpChatBackend;
pub use streaming::{EventStream, StreamEvent};
pub use traits::ChatBackend;
pub use reqwest::StatusCode;
pub use types::{
    ChatStreamRequest, HealthStatus, Message, PdfUpload, RemotePdf, Role, UploadedPdf,
};
