//! Framed transport over any async byte stream
//!
//! Wraps a raw `AsyncRead + AsyncWrite` stream with the `;`-terminated
//! framing. Real serial ports ([`crate::serial`]) and in-memory duplex
//! streams used by tests share this code path.

use dmx_protocol::{encode_frame, FrameCodec};
use tokio::io::{AsyncRead, AsyncReadExt, AsyncWrite, AsyncWriteExt};

/// Read buffer size for one transport read
const READ_BUF_LEN: usize = 1024;

/// Line-oriented view of a byte transport
pub struct FramedLink<T> {
    io: T,
    codec: FrameCodec,
    buffer: Vec<u8>,
}

impl<T> FramedLink<T>
where
    T: AsyncRead + AsyncWrite + Unpin + Send,
{
    /// Wrap a raw transport
    pub fn new(io: T) -> Self {
        Self {
            io,
            codec: FrameCodec::new(),
            buffer: vec![0u8; READ_BUF_LEN],
        }
    }

    /// Read the next complete frame payload, blocking until the terminator
    /// arrives
    ///
    /// Returns the payload with the terminator stripped and whitespace
    /// trimmed. A closed transport surfaces as `UnexpectedEof`.
    pub async fn read_frame(&mut self) -> Result<String, std::io::Error> {
        loop {
            if let Some(frame) = self.codec.next_frame() {
                return Ok(frame);
            }

            let n = self.io.read(&mut self.buffer).await?;
            if n == 0 {
                return Err(std::io::Error::new(
                    std::io::ErrorKind::UnexpectedEof,
                    "transport closed",
                ));
            }
            self.codec.push_bytes(&self.buffer[..n]);
        }
    }

    /// Write one payload with the terminator appended
    pub async fn write_frame(&mut self, payload: &str) -> Result<(), std::io::Error> {
        self.io.write_all(&encode_frame(payload)).await?;
        self.io.flush().await
    }
}
