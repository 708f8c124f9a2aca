//! Streaming frame codec for the `;`-terminated text framing
//!
//! # Format
//! - Payload: arbitrary-length ASCII/UTF-8 text
//! - Terminator: `;` (0x3B)
//! - The receiver strips the terminator and trims surrounding whitespace

/// Frame terminator byte
pub const TERMINATOR: u8 = b';';

/// Maximum payload length (reasonable limit to prevent buffer overflow)
const MAX_FRAME_LEN: usize = 256;

/// Streaming frame codec
///
/// Accumulates raw bytes from the transport and yields complete payloads as
/// they become available. Partial frames stay buffered until the terminator
/// arrives.
pub struct FrameCodec {
    buffer: Vec<u8>,
}

impl FrameCodec {
    /// Create a new frame codec
    pub fn new() -> Self {
        Self {
            buffer: Vec::with_capacity(64),
        }
    }

    /// Push raw bytes into the codec's buffer
    pub fn push_bytes(&mut self, data: &[u8]) {
        self.buffer.extend_from_slice(data);

        // Prevent buffer overflow if the peer never sends a terminator
        if self.buffer.len() > MAX_FRAME_LEN * 4 {
            tracing::warn!(
                "discarding {} unterminated bytes",
                self.buffer.len() - MAX_FRAME_LEN
            );
            let start = self.buffer.len() - MAX_FRAME_LEN;
            self.buffer = self.buffer[start..].to_vec();
        }
    }

    /// Try to extract the next complete payload from the buffer
    ///
    /// Returns the payload with the terminator stripped and surrounding
    /// whitespace trimmed, or `None` if no complete frame is buffered.
    pub fn next_frame(&mut self) -> Option<String> {
        let term_pos = self.buffer.iter().position(|&b| b == TERMINATOR)?;

        let frame_bytes: Vec<u8> = self.buffer.drain(..=term_pos).collect();

        // Parse as ASCII (strip terminator)
        let payload = String::from_utf8_lossy(&frame_bytes[..frame_bytes.len() - 1]);

        Some(payload.trim().to_string())
    }

    /// Clear the internal buffer
    pub fn clear(&mut self) {
        self.buffer.clear();
    }
}

impl Default for FrameCodec {
    fn default() -> Self {
        Self::new()
    }
}

/// Encode a payload to its wire format (payload plus terminator)
pub fn encode_frame(payload: &str) -> Vec<u8> {
    format!("{};", payload).into_bytes()
}

#[cfg(test)]
mod tests {
    use super::{encode_frame, FrameCodec};

    #[test]
    fn test_single_frame() {
        let mut codec = FrameCodec::new();
        codec.push_bytes(b"Go start;");

        assert_eq!(codec.next_frame().as_deref(), Some("Go start"));
        assert!(codec.next_frame().is_none());
    }

    #[test]
    fn test_streaming_parse() {
        let mut codec = FrameCodec::new();

        // Push partial data
        codec.push_bytes(b"Channel ");
        assert!(codec.next_frame().is_none());

        // Push rest
        codec.push_bytes(b"OK;");
        assert_eq!(codec.next_frame().as_deref(), Some("Channel OK"));
    }

    #[test]
    fn test_multiple_frames() {
        let mut codec = FrameCodec::new();
        codec.push_bytes(b"1:255;2:0;3:17;");

        assert_eq!(codec.next_frame().as_deref(), Some("1:255"));
        assert_eq!(codec.next_frame().as_deref(), Some("2:0"));
        assert_eq!(codec.next_frame().as_deref(), Some("3:17"));
        assert!(codec.next_frame().is_none());
    }

    #[test]
    fn test_whitespace_trimmed() {
        let mut codec = FrameCodec::new();
        codec.push_bytes(b"  Channel complete OK \r\n;");

        assert_eq!(codec.next_frame().as_deref(), Some("Channel complete OK"));
    }

    #[test]
    fn test_empty_payload() {
        let mut codec = FrameCodec::new();
        codec.push_bytes(b";");

        assert_eq!(codec.next_frame().as_deref(), Some(""));
    }

    #[test]
    fn test_encode_appends_terminator() {
        assert_eq!(encode_frame("Start"), b"Start;");
        assert_eq!(encode_frame("7"), b"7;");
    }

    #[test]
    fn test_runaway_input_is_bounded() {
        let mut codec = FrameCodec::new();
        // 10 KiB with no terminator must not grow the buffer unboundedly
        for _ in 0..160 {
            codec.push_bytes(&[b'x'; 64]);
        }
        codec.push_bytes(b"tail;");
        // The surviving suffix still yields a frame once terminated
        let frame = codec.next_frame().expect("frame after terminator");
        assert!(frame.ends_with("tail"));
    }
}
