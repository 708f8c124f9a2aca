//! DMX Serial Link Engine
//!
//! This crate drives one session against a DMX decoder peer over a serial
//! line: the startup handshake that registers the channel set, the
//! continuous stream of `<channel>:<value>` updates, max-value arbitration
//! over the registered channels, and flood-governed switch requests for the
//! downstream consumer.
//!
//! # Architecture
//!
//! A [`LinkSession`] owns the transport and runs a single background worker:
//!
//! - [`handshake`] performs the one-shot registration exchange
//! - [`arbiter`] holds authoritative per-channel state and detects winner
//!   and value changes
//! - [`events`] fans change notifications out to subscribers as a unified
//!   [`LinkEvent`] stream
//! - [`governor`] rate-limits winner changes into at most one switch per
//!   protection window
//!
//! The transport is generic: [`serial`] opens the real decoder port, and
//! tests drive the same code paths over in-memory duplex streams.
//!
//! # Example
//!
//! ```rust,no_run
//! use dmx_link::LinkSession;
//!
//! # async fn run() -> Result<(), dmx_link::LinkError> {
//! let mut session = LinkSession::open("/dev/ttyUSB0")?;
//! let mut events = session.subscribe()?;
//! let mut switches = session.switch_requests().unwrap();
//!
//! session.start([1, 2, 3]).await?;
//!
//! while let Some(channel) = switches.recv().await {
//!     println!("switch to channel {}", channel);
//! }
//! # Ok(())
//! # }
//! ```

pub mod arbiter;
pub mod channels;
pub mod error;
pub mod events;
pub mod governor;
pub mod handshake;
pub mod link;
pub mod serial;
pub mod session;

pub use arbiter::{Arbiter, ArbitrationDelta, UnregisteredChannel};
pub use channels::{Arbitration, ChannelId, ChannelSet};
pub use error::LinkError;
pub use events::{EventDispatcher, FaultKind, LinkEvent};
pub use governor::{FloodGovernor, DEFAULT_PROTECTION_WINDOW};
pub use link::FramedLink;
pub use serial::{open_port, BAUD_RATE};
pub use session::{LinkConfig, LinkSession};
