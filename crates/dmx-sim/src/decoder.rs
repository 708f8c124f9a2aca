//! Virtual decoder state machine
//!
//! Models the decoder side of the handshake: waiting for `Start`, collecting
//! channel registrations, then streaming updates. Replies are configurable
//! so tests can make the peer misbehave at any step.

use dmx_protocol::handshake::{CHANNEL_COMPLETE, CHANNEL_COMPLETE_OK, CHANNEL_OK, GO_START, START};
use serde::{Deserialize, Serialize};
use tracing::debug;

/// Replies the virtual decoder gives at each handshake step
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct VirtualDecoderConfig {
    /// Reply to `Start`
    pub start_reply: String,
    /// Reply to each channel registration
    pub channel_reply: String,
    /// Reply to `Channel complete`
    pub complete_reply: String,
}

impl Default for VirtualDecoderConfig {
    fn default() -> Self {
        Self {
            start_reply: GO_START.to_string(),
            channel_reply: CHANNEL_OK.to_string(),
            complete_reply: CHANNEL_COMPLETE_OK.to_string(),
        }
    }
}

/// Where the decoder is in its session
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Phase {
    AwaitingStart,
    Registering,
    Streaming,
}

/// A simulated DMX decoder peer
#[derive(Debug)]
pub struct VirtualDecoder {
    config: VirtualDecoderConfig,
    phase: Phase,
    /// Channel ids the client registered, in arrival order
    registered: Vec<u32>,
}

impl VirtualDecoder {
    /// Create a well-behaved decoder
    pub fn new() -> Self {
        Self::from_config(VirtualDecoderConfig::default())
    }

    /// Create a decoder with custom (possibly wrong) handshake replies
    pub fn from_config(config: VirtualDecoderConfig) -> Self {
        Self {
            config,
            phase: Phase::AwaitingStart,
            registered: Vec::new(),
        }
    }

    /// Channel ids registered so far
    pub fn registered(&self) -> &[u32] {
        &self.registered
    }

    /// Whether the handshake has completed
    pub fn is_streaming(&self) -> bool {
        self.phase == Phase::Streaming
    }

    /// Process one received payload, returning the reply to send, if any
    pub fn handle_line(&mut self, line: &str) -> Option<String> {
        match self.phase {
            Phase::AwaitingStart => {
                if line == START {
                    self.phase = Phase::Registering;
                }
                debug!("decoder: start request {:?}", line);
                Some(self.config.start_reply.clone())
            }
            Phase::Registering => {
                if line == CHANNEL_COMPLETE {
                    self.phase = Phase::Streaming;
                    debug!(
                        "decoder: registration complete, {} channels",
                        self.registered.len()
                    );
                    return Some(self.config.complete_reply.clone());
                }
                if let Ok(id) = line.parse::<u32>() {
                    self.registered.push(id);
                }
                Some(self.config.channel_reply.clone())
            }
            // The client never sends once updates are flowing
            Phase::Streaming => None,
        }
    }
}

impl Default for VirtualDecoder {
    fn default() -> Self {
        Self::new()
    }
}
