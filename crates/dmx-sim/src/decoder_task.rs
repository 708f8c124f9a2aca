//! Virtual decoder actor task
//!
//! A pure async task that owns a [`VirtualDecoder`] and serves it over any
//! byte stream (one end of a `tokio::io::duplex` in tests). The task uses a
//! `select!` loop to answer handshake frames and to inject updates, raw
//! lines, or a shutdown on command.

use std::io;

use dmx_protocol::{encode_frame, FrameCodec};
use tokio::io::{AsyncRead, AsyncReadExt, AsyncWrite, AsyncWriteExt};
use tokio::sync::mpsc;
use tracing::{debug, info};

use crate::VirtualDecoder;

/// Commands that can be sent to a virtual decoder actor
#[derive(Debug, Clone)]
pub enum VirtualDecoderCommand {
    /// Emit one `<channel>:<value>` update frame
    SendUpdate { channel: i64, value: i64 },
    /// Emit an arbitrary payload as a single frame
    SendRaw(String),
    /// Close the stream and end the task
    Shutdown,
}

/// Run the virtual decoder actor task
///
/// Processes client frames through the decoder state machine, writing each
/// reply back, and services injection commands from `cmd_rx`. Returns when
/// the stream closes or a shutdown command arrives.
pub async fn run_virtual_decoder_task<S>(
    mut stream: S,
    mut decoder: VirtualDecoder,
    mut cmd_rx: mpsc::Receiver<VirtualDecoderCommand>,
) -> io::Result<VirtualDecoder>
where
    S: AsyncRead + AsyncWrite + Unpin,
{
    let mut codec = FrameCodec::new();
    let mut buf = [0u8; 1024];

    info!("starting virtual decoder task");

    loop {
        tokio::select! {
            cmd = cmd_rx.recv() => {
                match cmd {
                    Some(VirtualDecoderCommand::SendUpdate { channel, value }) => {
                        let payload = format!("{}:{}", channel, value);
                        stream.write_all(&encode_frame(&payload)).await?;
                        stream.flush().await?;
                    }
                    Some(VirtualDecoderCommand::SendRaw(payload)) => {
                        stream.write_all(&encode_frame(&payload)).await?;
                        stream.flush().await?;
                    }
                    Some(VirtualDecoderCommand::Shutdown) | None => {
                        debug!("virtual decoder shutting down");
                        break;
                    }
                }
            }

            result = stream.read(&mut buf) => {
                match result {
                    Ok(0) => {
                        debug!("virtual decoder stream closed");
                        break;
                    }
                    Ok(n) => {
                        codec.push_bytes(&buf[..n]);
                        while let Some(line) = codec.next_frame() {
                            if let Some(reply) = decoder.handle_line(&line) {
                                stream.write_all(&encode_frame(&reply)).await?;
                                stream.flush().await?;
                            }
                        }
                    }
                    Err(e) => return Err(e),
                }
            }
        }
    }

    Ok(decoder)
}

#[cfg(test)]
mod tests {
    use super::{run_virtual_decoder_task, VirtualDecoderCommand};
    use crate::VirtualDecoder;
    use dmx_protocol::{encode_frame, FrameCodec};
    use tokio::io::{AsyncReadExt, AsyncWriteExt};
    use tokio::sync::mpsc;

    async fn read_frame<R: AsyncReadExt + Unpin>(io: &mut R, codec: &mut FrameCodec) -> String {
        let mut buf = [0u8; 256];
        loop {
            if let Some(frame) = codec.next_frame() {
                return frame;
            }
            let n = io.read(&mut buf).await.unwrap();
            assert_ne!(n, 0, "decoder closed unexpectedly");
            codec.push_bytes(&buf[..n]);
        }
    }

    #[tokio::test]
    async fn test_serves_handshake_and_streams_updates() {
        let (mut client, server) = tokio::io::duplex(256);
        let (cmd_tx, cmd_rx) = mpsc::channel(8);
        let task = tokio::spawn(run_virtual_decoder_task(
            server,
            VirtualDecoder::new(),
            cmd_rx,
        ));

        let mut codec = FrameCodec::new();
        for (send, expect) in [
            ("Start", "Go start"),
            ("3", "Channel OK"),
            ("Channel complete", "Channel complete OK"),
        ] {
            client.write_all(&encode_frame(send)).await.unwrap();
            assert_eq!(read_frame(&mut client, &mut codec).await, expect);
        }

        cmd_tx
            .send(VirtualDecoderCommand::SendUpdate {
                channel: 3,
                value: 150,
            })
            .await
            .unwrap();
        assert_eq!(read_frame(&mut client, &mut codec).await, "3:150");

        cmd_tx.send(VirtualDecoderCommand::Shutdown).await.unwrap();
        let decoder = task.await.unwrap().unwrap();
        assert_eq!(decoder.registered(), &[3]);
    }
}
