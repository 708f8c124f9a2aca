//! Error types for the link engine

use thiserror::Error;

use crate::events::FaultKind;

/// Errors that can occur in a link session
#[derive(Debug, Error)]
pub enum LinkError {
    /// The serial port could not be opened
    #[error("cannot open port: {0}")]
    CannotOpenPort(#[source] tokio_serial::Error),

    /// The transport failed mid-stream
    #[error("port communication error: {0}")]
    PortCommunication(#[from] std::io::Error),

    /// The peer did not acknowledge the handshake start
    #[error("start protocol invalid: expected \"Go start\", got {reply:?}")]
    StartProtocolInvalid {
        /// What the peer actually sent (or a transport failure description)
        reply: String,
    },

    /// The peer did not acknowledge channel registration
    #[error("channel protocol invalid: {reply:?}")]
    ChannelProtocolInvalid {
        /// What the peer actually sent (or a transport failure description)
        reply: String,
    },

    /// An update line was malformed
    #[error("message protocol invalid: {line:?}")]
    MessageProtocolInvalid {
        /// The raw offending line
        line: String,
    },

    /// An update referenced a channel outside the registered set
    #[error("channel invalid: {line:?}")]
    ChannelInvalid {
        /// The raw offending line
        line: String,
    },

    /// The session was already started once
    #[error("session already started")]
    AlreadyStarted,

    /// The session was disposed
    #[error("session disposed")]
    Disposed,
}

impl LinkError {
    /// Whether this error terminates the session
    ///
    /// Per-line message errors are reported and skipped; everything else
    /// aborts the start or ends the run loop.
    pub fn is_fatal(&self) -> bool {
        !matches!(
            self,
            LinkError::MessageProtocolInvalid { .. } | LinkError::ChannelInvalid { .. }
        )
    }

    /// Decompose a non-fatal per-line error into the fault pair carried by
    /// the event stream
    ///
    /// Fatal errors return `None`; they abort rather than surface as events.
    pub fn into_fault(self) -> Option<(FaultKind, String)> {
        match self {
            LinkError::MessageProtocolInvalid { line } => {
                Some((FaultKind::MalformedUpdate, line))
            }
            LinkError::ChannelInvalid { line } => Some((FaultKind::UnknownChannel, line)),
            _ => None,
        }
    }
}
