use std::pin::Pin;

use futures::Stream;
use serde::{Deserialize, Serialize};

use crate::error::Result;

/// One decoded event of a streaming exchange
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum StreamEvent {
    /// More assistant text to append
    Delta { content: String },

    /// Exchange completed; nothing follows
    Done,

    /// Server reported a failure; nothing follows
    Error { message: String },
}

impl StreamEvent {
    pub fn delta(content: impl Into<String>) -> Self {
        Self::Delta {
            content: content.into(),
        }
    }

    pub fn error(message: impl Into<String>) -> Self {
        Self::Error {
            message: message.into(),
        }
    }

    /// `Done` and `Error` end the exchange
    pub fn is_terminal(&self) -> bool {
        matches!(self, StreamEvent::Done | StreamEvent::Error { .. })
    }
}

/// Boxed event stream returned by `ChatBackend::chat_stream`
pub type EventStream = Pin<Box<dyn Stream<Item = Result<StreamEvent>> + Send>>;

/// JSON payload carried by a `data: ` frame
///
/// The backend sends `{content, done: false}` for deltas, `{content: "", done: true}`
/// on completion and `{error, done}` on failure.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct FramePayload {
    #[serde(default)]
    pub content: Option<String>,
    #[serde(default)]
    pub done: bool,
    #[serde(default)]
    pub error: Option<String>,
}

impl FramePayload {
    pub(crate) fn into_events(self) -> Vec<StreamEvent> {
        if let Some(message) = self.error {
            return vec![StreamEvent::Error { message }];
        }

        let mut events = Vec::new();
        if let Some(content) = self.content {
            if !content.is_empty() {
                events.push(StreamEvent::Delta { content });
            }
        }
        if self.done {
            events.push(StreamEvent::Done);
        }
        events
    }
}
