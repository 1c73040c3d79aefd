use std::fmt::Display;

use futures::{Stream, StreamExt};

use super::buffering::LineBuffer;
use crate::error::ClientError;
use crate::streaming::{EventStream, FramePayload, StreamEvent};

/// Prefix marking a protocol frame; every other line is ignored
pub const FRAME_PREFIX: &str = "data: ";

/// Parse one complete, trimmed line into events
///
/// Non-frame lines and malformed payloads produce no events. A bad frame is
/// logged and skipped so it cannot take the whole stream down.
pub fn parse_frame(line: &str) -> Vec<StreamEvent> {
    let Some(data) = line.strip_prefix(FRAME_PREFIX) else {
        return Vec::new();
    };

    match serde_json::from_str::<FramePayload>(data) {
        Ok(payload) => payload.into_events(),
        Err(e) => {
            tracing::warn!("Skipping malformed stream frame: {} ({})", data, e);
            Vec::new()
        }
    }
}

/// Incremental decoder: feed raw chunks, get events back
///
/// Once a terminal event (`Done` or `Error`) has been produced the decoder
/// is finished and ignores any further input.
pub struct FrameDecoder {
    lines: LineBuffer,
    finished: bool,
}

impl FrameDecoder {
    pub fn new() -> Self {
        Self {
            lines: LineBuffer::default(),
            finished: false,
        }
    }

    /// Append a chunk and decode every line it completes
    pub fn push(&mut self, bytes: &[u8]) -> Vec<StreamEvent> {
        if self.finished {
            return Vec::new();
        }
        self.lines.extend(bytes);

        let mut events = Vec::new();
        while let Some(line) = self.lines.next_line() {
            self.decode_line(line, &mut events);
            if self.finished {
                break;
            }
        }
        events
    }

    /// Connection closed: treat any unterminated tail as a final line
    pub fn finish(&mut self) -> Vec<StreamEvent> {
        let mut events = Vec::new();
        if !self.finished {
            if let Some(line) = self.lines.take_remainder() {
                self.decode_line(line, &mut events);
            }
        }
        self.finished = true;
        events
    }

    pub fn is_finished(&self) -> bool {
        self.finished
    }

    fn decode_line(
        &mut self,
        line: crate::error::Result<String>,
        events: &mut Vec<StreamEvent>,
    ) {
        let line = match line {
            Ok(line) => line,
            Err(e) => {
                tracing::warn!("Skipping undecodable stream line: {}", e);
                return;
            }
        };
        if line.is_empty() {
            return;
        }

        for event in parse_frame(&line) {
            let terminal = event.is_terminal();
            events.push(event);
            if terminal {
                self.finished = true;
                return;
            }
        }
    }
}

impl Default for FrameDecoder {
    fn default() -> Self {
        Self::new()
    }
}

/// Turn a stream of byte chunks into a stream of events
///
/// Stops reading as soon as a terminal event is seen. A transport error is
/// yielded once as `ClientError::Stream` and ends the stream. If the chunks run
/// out before any terminal event the stream just ends; callers treat that as a
/// failed exchange.
pub fn decode_event_stream<S, B, E>(chunks: S) -> EventStream
where
    S: Stream<Item = std::result::Result<B, E>> + Send + 'static,
    B: AsRef<[u8]> + Send + 'static,
    E: Display + Send + 'static,
{
    Box::pin(async_stream::stream! {
        let mut chunks = Box::pin(chunks);
        let mut decoder = FrameDecoder::new();
        let mut failed = false;

        while let Some(chunk_result) = chunks.next().await {
            match chunk_result {
                Ok(bytes) => {
                    for event in decoder.push(bytes.as_ref()) {
                        yield Ok(event);
                    }
                    if decoder.is_finished() {
                        break;
                    }
                }
                Err(e) => {
                    yield Err(ClientError::Stream(e.to_string()));
                    failed = true;
                    break;
                }
            }
        }

        if !failed {
            for event in decoder.finish() {
                yield Ok(event);
            }
        }
    })
}
