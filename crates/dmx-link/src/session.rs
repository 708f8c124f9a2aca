//! Link session lifecycle
//!
//! A [`LinkSession`] owns the transport for its whole life: unopened, then
//! handshaking, then running (a single background worker reading frames and
//! dispatching notifications), then disposed. At most one handshake and one
//! run loop per session; re-entry is an error.
//!
//! Cancellation is cooperative: [`LinkSession::dispose`] sends a shutdown
//! message that the worker observes in its `select!`, then awaits the worker
//! before the transport (owned by the worker) is released. Disposal is
//! idempotent. Callers must let `start` complete before disposing.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;

use dmx_protocol::parse_update;
use serde::{Deserialize, Serialize};
use tokio::io::{AsyncRead, AsyncWrite};
use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tokio_serial::SerialStream;
use tracing::{info, warn};

use crate::arbiter::Arbiter;
use crate::channels::{ChannelId, ChannelSet};
use crate::error::LinkError;
use crate::events::{EventDispatcher, LinkEvent};
use crate::governor::FloodGovernor;
use crate::link::FramedLink;
use crate::serial;

/// Session configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LinkConfig {
    /// Minimum interval between effective switch actions (ms)
    pub protection_window_ms: u64,
    /// Capacity of each subscriber and switch channel
    pub channel_capacity: usize,
}

impl Default for LinkConfig {
    fn default() -> Self {
        Self {
            protection_window_ms: 100,
            channel_capacity: 64,
        }
    }
}

/// Commands sent to the session worker
#[derive(Debug)]
enum SessionCommand {
    /// Shut the run loop down cleanly
    Shutdown,
}

/// One serial link session: handshake, run loop, disposal
pub struct LinkSession<T> {
    io: Option<FramedLink<T>>,
    config: LinkConfig,
    dispatcher: Option<EventDispatcher>,
    governor: Option<FloodGovernor>,
    switch_rx: Option<mpsc::Receiver<ChannelId>>,
    disposed: Arc<AtomicBool>,
    worker: Option<JoinHandle<()>>,
    shutdown_tx: Option<mpsc::Sender<SessionCommand>>,
}

impl LinkSession<SerialStream> {
    /// Open the decoder serial port and wrap it in a session
    pub fn open(port_name: &str) -> Result<Self, LinkError> {
        Ok(Self::new(serial::open_port(port_name)?))
    }

    /// [`LinkSession::open`] with a custom configuration
    pub fn open_with_config(port_name: &str, config: LinkConfig) -> Result<Self, LinkError> {
        Ok(Self::with_config(serial::open_port(port_name)?, config))
    }
}

impl<T> LinkSession<T>
where
    T: AsyncRead + AsyncWrite + Unpin + Send + 'static,
{
    /// Create a session over any transport with default configuration
    pub fn new(io: T) -> Self {
        Self::with_config(io, LinkConfig::default())
    }

    /// Create a session over any transport
    pub fn with_config(io: T, config: LinkConfig) -> Self {
        let (governor, switch_rx) = FloodGovernor::new(
            Duration::from_millis(config.protection_window_ms),
            config.channel_capacity,
        );
        Self {
            io: Some(FramedLink::new(io)),
            config,
            dispatcher: Some(EventDispatcher::new()),
            governor: Some(governor),
            switch_rx: Some(switch_rx),
            disposed: Arc::new(AtomicBool::new(false)),
            worker: None,
            shutdown_tx: None,
        }
    }

    /// Register an event subscriber
    ///
    /// Must be called before [`LinkSession::start`]; the dispatcher moves
    /// into the worker when the session starts.
    pub fn subscribe(&mut self) -> Result<mpsc::Receiver<LinkEvent>, LinkError> {
        match self.dispatcher.as_mut() {
            Some(dispatcher) => Ok(dispatcher.subscribe(self.config.channel_capacity)),
            None => Err(LinkError::AlreadyStarted),
        }
    }

    /// Take the flood-governed switch request stream
    ///
    /// Returns `None` after the first call; there is a single consumer.
    pub fn switch_requests(&mut self) -> Option<mpsc::Receiver<ChannelId>> {
        self.switch_rx.take()
    }

    /// Run the handshake and, on success, start the background run loop
    ///
    /// Any handshake failure is fatal: the error is returned, the session
    /// never reaches the running state, and it cannot be started again.
    pub async fn start(
        &mut self,
        channels: impl IntoIterator<Item = u32>,
    ) -> Result<(), LinkError> {
        if self.disposed.load(Ordering::SeqCst) {
            return Err(LinkError::Disposed);
        }
        if self.worker.is_some() {
            return Err(LinkError::AlreadyStarted);
        }
        // A previously failed start also consumed the transport
        let mut io = self.io.take().ok_or(LinkError::AlreadyStarted)?;

        let mut channel_set = ChannelSet::new(channels);
        crate::handshake::perform(&mut io, &mut channel_set).await?;

        let arbiter = Arbiter::new(channel_set);
        let dispatcher = self.dispatcher.take().unwrap_or_default();
        let governor = match self.governor.take() {
            Some(governor) => governor,
            None => return Err(LinkError::AlreadyStarted),
        };

        let (shutdown_tx, shutdown_rx) = mpsc::channel(1);
        self.shutdown_tx = Some(shutdown_tx);
        self.worker = Some(tokio::spawn(run_loop(
            io,
            arbiter,
            dispatcher,
            governor,
            shutdown_rx,
        )));

        info!("link session running");
        Ok(())
    }

    /// Whether the run loop is currently alive
    pub fn is_running(&self) -> bool {
        self.worker
            .as_ref()
            .is_some_and(|worker| !worker.is_finished())
    }

    /// Graceful, idempotent shutdown
    ///
    /// Signals the worker, awaits its termination, and only then releases
    /// the transport. Repeated calls are no-ops.
    pub async fn dispose(&mut self) {
        if self.disposed.swap(true, Ordering::SeqCst) {
            return;
        }

        if let Some(shutdown_tx) = self.shutdown_tx.take() {
            let _ = shutdown_tx.send(SessionCommand::Shutdown).await;
        }

        if let Some(worker) = self.worker.take() {
            if let Err(e) = worker.await {
                warn!("session worker ended abnormally: {}", e);
            }
        }

        // A never-started session still holds the transport
        self.io = None;

        info!("link session disposed");
    }
}

/// The session worker: read, arbitrate, dispatch, until cancelled or the
/// transport fails
async fn run_loop<T>(
    mut io: FramedLink<T>,
    mut arbiter: Arbiter,
    dispatcher: EventDispatcher,
    governor: FloodGovernor,
    mut shutdown_rx: mpsc::Receiver<SessionCommand>,
) where
    T: AsyncRead + AsyncWrite + Unpin + Send,
{
    info!("run loop started");

    let failure = loop {
        tokio::select! {
            cmd = shutdown_rx.recv() => {
                match cmd {
                    Some(SessionCommand::Shutdown) | None => {
                        info!("shutdown requested");
                        break None;
                    }
                }
            }

            frame = io.read_frame() => {
                match frame {
                    Ok(line) => {
                        process_line(&mut arbiter, &dispatcher, &governor, line).await;
                    }
                    Err(e) => {
                        let error = LinkError::PortCommunication(e);
                        warn!("{}", error);
                        break Some(error.to_string());
                    }
                }
            }
        }
    };

    dispatcher
        .emit(LinkEvent::SessionEnded { error: failure })
        .await;
    info!("run loop ended");
}

/// Handle one received line: parse, arbitrate, notify
///
/// Parse failures and unknown channels are reported and skipped; they never
/// terminate the loop. Winner notifications precede value notifications for
/// the same update, and winner changes feed the flood governor.
async fn process_line(
    arbiter: &mut Arbiter,
    dispatcher: &EventDispatcher,
    governor: &FloodGovernor,
    line: String,
) {
    let update = match parse_update(&line) {
        Ok(update) => update,
        Err(_) => {
            report_fault(dispatcher, LinkError::MessageProtocolInvalid { line }).await;
            return;
        }
    };

    let delta = match arbiter.apply(update) {
        Ok(delta) => delta,
        Err(_) => {
            report_fault(dispatcher, LinkError::ChannelInvalid { line }).await;
            return;
        }
    };

    if let Some(channel) = delta.winner_changed {
        dispatcher.emit(LinkEvent::WinnerChanged { channel }).await;
        governor.request_switch(channel).await;
    }

    if let Some(value) = delta.value_changed {
        dispatcher.emit(LinkEvent::ValueChanged { value }).await;
    }
}

/// Report a non-fatal per-line error and keep the loop running
async fn report_fault(dispatcher: &EventDispatcher, error: LinkError) {
    warn!("{}", error);
    if let Some((kind, line)) = error.into_fault() {
        dispatcher.emit(LinkEvent::ProtocolFault { kind, line }).await;
    }
}

#[cfg(test)]
mod tests {
    use super::LinkSession;
    use crate::error::LinkError;

    #[tokio::test]
    async fn test_start_after_dispose_is_rejected() {
        let (near, _far) = tokio::io::duplex(64);
        let mut session = LinkSession::new(near);

        session.dispose().await;
        let err = session.start([1, 2]).await.unwrap_err();
        assert!(matches!(err, LinkError::Disposed));
    }

    #[tokio::test]
    async fn test_switch_requests_single_consumer() {
        let (near, _far) = tokio::io::duplex(64);
        let mut session = LinkSession::new(near);

        assert!(session.switch_requests().is_some());
        assert!(session.switch_requests().is_none());
    }

    #[tokio::test]
    async fn test_dispose_is_idempotent_without_start() {
        let (near, _far) = tokio::io::duplex(64);
        let mut session = LinkSession::new(near);

        session.dispose().await;
        session.dispose().await;
        assert!(!session.is_running());
    }
}
