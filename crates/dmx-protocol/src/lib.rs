//! DMX Link Wire Protocol
//!
//! This crate implements the text framing protocol spoken between the
//! channel-value engine and the serial peer (a microcontroller that has
//! already decoded the physical DMX bus):
//!
//! - Every message is an ASCII/UTF-8 payload terminated by a single `;` byte
//! - Handshake messages are fixed literals (see [`handshake`])
//! - Steady-state updates have the form `<channel>:<value>`
//!
//! # Architecture
//!
//! [`FrameCodec`] is a streaming parser that handles partial reads: push raw
//! bytes in, pull complete trimmed payloads out. [`parse_update`] turns one
//! payload into a validated [`ChannelUpdate`] or a classified failure.
//! Channel-set membership is not known at this layer; the link engine
//! performs that check on the parsed pair.
//!
//! # Example
//!
//! ```rust
//! use dmx_protocol::{parse_update, ChannelUpdate, FrameCodec};
//!
//! let mut codec = FrameCodec::new();
//! codec.push_bytes(b" 3:127 ;");
//!
//! let line = codec.next_frame().unwrap();
//! let update = parse_update(&line).unwrap();
//! assert_eq!(update, ChannelUpdate { channel: 3, value: 127 });
//! ```

pub mod error;
pub mod frame;
pub mod handshake;
pub mod update;

pub use error::ParseError;
pub use frame::{encode_frame, FrameCodec, TERMINATOR};
pub use update::{parse_update, ChannelUpdate, DELIMITER};
