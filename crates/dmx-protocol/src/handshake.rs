//! Handshake message literals
//!
//! The startup exchange uses fixed, case-sensitive message literals. The
//! engine sends [`START`], each channel id as decimal text, then
//! [`CHANNEL_COMPLETE`]; the peer acknowledges with the matching reply
//! literal at every step. Matching is exact, not fuzzy.

/// Opens the handshake (engine -> peer)
pub const START: &str = "Start";

/// Expected acknowledgement of [`START`] (peer -> engine)
pub const GO_START: &str = "Go start";

/// Expected acknowledgement of each channel registration (peer -> engine)
pub const CHANNEL_OK: &str = "Channel OK";

/// Closes channel registration (engine -> peer)
pub const CHANNEL_COMPLETE: &str = "Channel complete";

/// Expected acknowledgement of [`CHANNEL_COMPLETE`] (peer -> engine)
pub const CHANNEL_COMPLETE_OK: &str = "Channel complete OK";
