//! Handshake sequencer
//!
//! Drives the one-shot startup exchange that registers the channel set with
//! the peer, in strict order:
//!
//! 1. `Start` -> expect `Go start`
//! 2. each channel id, in registration order -> expect `Channel OK`
//! 3. `Channel complete` -> expect `Channel complete OK`
//!
//! Any unexpected reply, or a transport failure at any step, aborts the
//! whole exchange with the step's protocol error kind. There is no retry
//! and no partial success; the session must never start after a failed
//! handshake. No timeout is imposed here, so a non-responsive peer blocks
//! indefinitely.

use dmx_protocol::handshake::{CHANNEL_COMPLETE, CHANNEL_COMPLETE_OK, CHANNEL_OK, GO_START, START};
use tokio::io::{AsyncRead, AsyncWrite};
use tracing::{debug, warn};

use crate::channels::ChannelSet;
use crate::error::LinkError;
use crate::link::FramedLink;

/// Which handshake step a transport failure or mismatch occurred in
#[derive(Clone, Copy)]
enum Step {
    Start,
    Channel,
}

impl Step {
    fn invalid(self, reply: String) -> LinkError {
        match self {
            Step::Start => LinkError::StartProtocolInvalid { reply },
            Step::Channel => LinkError::ChannelProtocolInvalid { reply },
        }
    }
}

/// One send/expect round trip; any deviation aborts with the step's kind
async fn exchange<T>(
    io: &mut FramedLink<T>,
    step: Step,
    send: &str,
    expect: &str,
) -> Result<(), LinkError>
where
    T: AsyncRead + AsyncWrite + Unpin + Send,
{
    io.write_frame(send)
        .await
        .map_err(|e| step.invalid(format!("transport failure: {}", e)))?;

    let reply = io
        .read_frame()
        .await
        .map_err(|e| step.invalid(format!("transport failure: {}", e)))?;

    if reply != expect {
        warn!("handshake rejected: sent {:?}, got {:?}", send, reply);
        return Err(step.invalid(reply));
    }

    debug!("handshake: {:?} acknowledged", send);
    Ok(())
}

/// Run the full registration exchange for `channels`
///
/// On success every channel's value has been reset to 0 and the peer will
/// start streaming `<channel>:<value>` updates.
pub async fn perform<T>(io: &mut FramedLink<T>, channels: &mut ChannelSet) -> Result<(), LinkError>
where
    T: AsyncRead + AsyncWrite + Unpin + Send,
{
    exchange(io, Step::Start, START, GO_START).await?;

    let ids: Vec<_> = channels.ids().collect();
    for id in ids {
        exchange(io, Step::Channel, &id.to_string(), CHANNEL_OK).await?;
    }

    exchange(io, Step::Channel, CHANNEL_COMPLETE, CHANNEL_COMPLETE_OK).await?;

    channels.reset();
    debug!("handshake complete, {} channels registered", channels.len());
    Ok(())
}
