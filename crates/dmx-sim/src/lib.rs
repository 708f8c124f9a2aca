//! DMX Decoder Simulation Library
//!
//! This crate provides a simulated decoder peer for testing the serial link
//! engine without physical hardware. It includes:
//!
//! - **VirtualDecoder**: The decoder's handshake state machine, with
//!   configurable replies for failure injection
//! - **run_virtual_decoder_task**: An async actor serving a decoder over any
//!   byte stream, with command-driven update injection
//!
//! # Example
//!
//! ```rust
//! use dmx_sim::{VirtualDecoder, VirtualDecoderConfig};
//!
//! // A decoder that rejects the start request
//! let mut decoder = VirtualDecoder::from_config(VirtualDecoderConfig {
//!     start_reply: "Busy".to_string(),
//!     ..VirtualDecoderConfig::default()
//! });
//!
//! assert_eq!(decoder.handle_line("Start").as_deref(), Some("Busy"));
//! ```

pub mod decoder;
pub mod decoder_task;

pub use decoder::{VirtualDecoder, VirtualDecoderConfig};
pub use decoder_task::{run_virtual_decoder_task, VirtualDecoderCommand};
