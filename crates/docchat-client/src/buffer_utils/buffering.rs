use std::collections::VecDeque;

use crate::error::{ClientError, Result};

/// Carry-over buffer for line-based parsing across chunk boundaries
///
/// Bytes are kept undecoded until a full line is available, so a multi-byte
/// character split between two chunks is decoded only once it is whole.
pub struct LineBuffer {
    buffer: VecDeque<u8>,
}

impl LineBuffer {
    /// Create a new buffer with specified capacity
    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            buffer: VecDeque::with_capacity(capacity),
        }
    }

    /// Add bytes to the buffer
    pub fn extend(&mut self, bytes: &[u8]) {
        self.buffer.extend(bytes);
    }

    /// Extract next line (up to \n) from buffer, trimmed
    /// Returns None if no complete line is available
    pub fn next_line(&mut self) -> Option<Result<String>> {
        let newline_pos = self.buffer.iter().position(|&b| b == b'\n')?;
        let line_bytes: Vec<u8> = self.buffer.drain(..=newline_pos).collect();
        Some(decode_line(&line_bytes))
    }

    /// Drain whatever is left as a final line (used when the connection closes)
    pub fn take_remainder(&mut self) -> Option<Result<String>> {
        if self.buffer.is_empty() {
            return None;
        }
        let line_bytes: Vec<u8> = self.buffer.drain(..).collect();
        Some(decode_line(&line_bytes))
    }

    /// Current buffer size
    pub fn len(&self) -> usize {
        self.buffer.len()
    }

    /// Check if buffer is empty
    pub fn is_empty(&self) -> bool {
        self.buffer.is_empty()
    }
}

impl Default for LineBuffer {
    fn default() -> Self {
        Self::with_capacity(4096)
    }
}

fn decode_line(bytes: &[u8]) -> Result<String> {
    std::str::from_utf8(bytes)
        .map(|line| line.trim().to_string())
        .map_err(|e| ClientError::Stream(format!("Invalid UTF-8: {}", e)))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_line_buffer_basic() {
        let mut buffer = LineBuffer::with_capacity(64);

        buffer.extend(b"line1\nline2\r\n");

        assert_eq!(buffer.next_line().unwrap().unwrap(), "line1");
        assert_eq!(buffer.next_line().unwrap().unwrap(), "line2");
        assert!(buffer.next_line().is_none());
        assert!(buffer.is_empty());
    }

    #[test]
    fn test_partial_line() {
        let mut buffer = LineBuffer::with_capacity(64);

        buffer.extend(b"partial");
        assert!(buffer.next_line().is_none());
        assert_eq!(buffer.len(), 7);

        buffer.extend(b" line\n");
        assert_eq!(buffer.next_line().unwrap().unwrap(), "partial line");
    }

    #[test]
    fn test_split_multibyte_character() {
        let mut buffer = LineBuffer::default();
        let text = "olá\n".as_bytes();

        // 'á' is two bytes; split it down the middle
        buffer.extend(&text[..3]);
        assert!(buffer.next_line().is_none());
        buffer.extend(&text[3..]);

        assert_eq!(buffer.next_line().unwrap().unwrap(), "olá");
    }

    #[test]
    fn test_take_remainder() {
        let mut buffer = LineBuffer::default();
        assert!(buffer.take_remainder().is_none());

        buffer.extend(b"done\ntail");
        assert_eq!(buffer.next_line().unwrap().unwrap(), "done");
        assert_eq!(buffer.take_remainder().unwrap().unwrap(), "tail");
        assert!(buffer.is_empty());
    }

    #[test]
    fn test_invalid_utf8_line() {
        let mut buffer = LineBuffer::default();
        buffer.extend(&[0xff, 0xfe, b'\n', b'o', b'k', b'\n']);

        assert!(buffer.next_line().unwrap().is_err());
        assert_eq!(buffer.next_line().unwrap().unwrap(), "ok");
    }
}
