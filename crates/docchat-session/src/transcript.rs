use docchat_client::Message;

/// Working copy of the current thread's messages plus the in-flight reply
///
/// Committed messages are append-only. The in-flight buffer is `Some` between
/// `begin_assistant_stream` and exactly one of `commit_stream` or
/// `discard_stream`.
#[derive(Debug, Default)]
pub struct TranscriptStore {
    messages: Vec<Message>,
    in_flight: Option<String>,
}

impl TranscriptStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Append a user message stamped now
    ///
    /// Returns false (and changes nothing) for empty or whitespace-only text.
    pub fn append_user_message(&mut self, text: &str) -> bool {
        if text.trim().is_empty() {
            return false;
        }
        self.messages.push(Message::user(text));
        true
    }

    /// Append a complete assistant message, bypassing the in-flight buffer
    pub fn append_assistant_message(&mut self, text: impl Into<String>) {
        self.messages.push(Message::assistant(text));
    }

    /// Open an empty in-flight buffer
    ///
    /// Returns false if one is already open; the open buffer is left as is.
    pub fn begin_assistant_stream(&mut self) -> bool {
        if self.in_flight.is_some() {
            return false;
        }
        self.in_flight = Some(String::new());
        true
    }

    /// Append to the in-flight buffer; ignored when none is open
    pub fn append_delta(&mut self, text: &str) {
        match self.in_flight.as_mut() {
            Some(buffer) => buffer.push_str(text),
            None => tracing::debug!("Dropping delta with no open stream"),
        }
    }

    /// Turn the in-flight buffer into an assistant message
    pub fn commit_stream(&mut self) -> Option<&Message> {
        let content = self.in_flight.take()?;
        self.messages.push(Message::assistant(content));
        self.messages.last()
    }

    /// Drop the in-flight buffer without committing; returns whether one was open
    pub fn discard_stream(&mut self) -> bool {
        self.in_flight.take().is_some()
    }

    /// Replace the whole transcript, e.g. after loading a thread
    pub fn replace_all(&mut self, messages: Vec<Message>) {
        self.in_flight = None;
        self.messages = messages;
    }

    pub fn clear(&mut self) {
        self.replace_all(Vec::new());
    }

    pub fn messages(&self) -> &[Message] {
        &self.messages
    }

    /// Text received so far for the reply being streamed
    pub fn in_flight(&self) -> Option<&str> {
        self.in_flight.as_deref()
    }

    pub fn is_streaming(&self) -> bool {
        self.in_flight.is_some()
    }

    pub fn len(&self) -> usize {
        self.messages.len()
    }

    pub fn is_empty(&self) -> bool {
        self.messages.is_empty()
    }
}
