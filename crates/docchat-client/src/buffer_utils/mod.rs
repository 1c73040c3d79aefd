mod buffering;
mod sse_parser;

pub use buffering::LineBuffer;
pub use sse_parser::{decode_event_stream, parse_frame, FrameDecoder, FRAME_PREFIX};
