//! Flood governor for switch requests
//!
//! Winner changes can arrive far faster than the downstream consumer can
//! act on them (switching playback is expensive). The governor forwards at
//! most one switch per protection window: requests arriving inside the
//! window are coalesced into a single delayed fire targeting the most
//! recent winner, and a request for a channel that is already active (or
//! already the most recent request) is dropped outright.
//!
//! At most one delayed task is pending at a time; a request landing while
//! one is pending only updates the pending target. The window is measured
//! from the last fire (a fire that turns out to be a no-op still restarts
//! it), and construction starts the first window so a burst of winner
//! changes at startup still collapses to one switch.

use std::sync::atomic::{AtomicBool, AtomicI64, AtomicU64, Ordering};
use std::sync::Arc;
use std::time::Duration;

use tokio::sync::mpsc;
use tokio::time::Instant;
use tracing::debug;

use crate::channels::ChannelId;

/// Default protection window between effective switches
pub const DEFAULT_PROTECTION_WINDOW: Duration = Duration::from_millis(100);

/// Sentinel for "no channel"
const NO_CHANNEL: i64 = -1;

struct GovernorState {
    epoch: Instant,
    window_ms: u64,
    /// Most recently requested target
    requested: AtomicI64,
    /// Channel the last effective switch selected
    active: AtomicI64,
    /// Whether a delayed fire is scheduled
    pending: AtomicBool,
    /// Milliseconds since `epoch` of the last fire
    last_switch_ms: AtomicU64,
    switch_tx: mpsc::Sender<ChannelId>,
}

impl GovernorState {
    fn now_ms(&self) -> u64 {
        self.epoch.elapsed().as_millis() as u64
    }

    /// Execute one (possibly delayed) switch attempt
    async fn fire(&self) {
        // Restart the window before lifting the pending flag: a request that
        // lands mid-fire must compute its deferral from this fire, not from
        // the previous window start, or it could schedule inside the window.
        self.last_switch_ms.store(self.now_ms(), Ordering::SeqCst);

        // Clear the pending flag before reading the target: a request that
        // lands between the two either updates `requested` in time for this
        // fire or sees pending == false and schedules the next one. Loading
        // first would drop it entirely.
        self.pending.store(false, Ordering::SeqCst);
        let target = self.requested.load(Ordering::SeqCst);

        if self.active.swap(target, Ordering::SeqCst) == target {
            debug!("switch to channel {} is a no-op", target);
            return;
        }

        if let Some(id) = u32::try_from(target).ok().map(ChannelId) {
            let _ = self.switch_tx.send(id).await;
        }
    }
}

/// Rate limiter between winner-changed notifications and switch actions
pub struct FloodGovernor {
    state: Arc<GovernorState>,
}

impl FloodGovernor {
    /// Create a governor; switch actions arrive on the returned receiver
    pub fn new(window: Duration, capacity: usize) -> (Self, mpsc::Receiver<ChannelId>) {
        let (switch_tx, switch_rx) = mpsc::channel(capacity);
        let state = Arc::new(GovernorState {
            epoch: Instant::now(),
            window_ms: window.as_millis() as u64,
            requested: AtomicI64::new(NO_CHANNEL),
            active: AtomicI64::new(NO_CHANNEL),
            pending: AtomicBool::new(false),
            // Construction starts the first protection window
            last_switch_ms: AtomicU64::new(0),
            switch_tx,
        });
        (Self { state }, switch_rx)
    }

    /// Request a switch to `target`
    ///
    /// Fires immediately when outside the protection window, otherwise
    /// coalesces into the single pending delayed fire.
    pub async fn request_switch(&self, target: ChannelId) {
        let state = &self.state;
        let id = i64::from(target.0);

        if state.requested.swap(id, Ordering::SeqCst) == id {
            // Duplicate of the most recent request: already applied or
            // already the pending target.
            return;
        }

        let since_last = state
            .now_ms()
            .saturating_sub(state.last_switch_ms.load(Ordering::SeqCst));

        if since_last < state.window_ms {
            if state.pending.swap(true, Ordering::SeqCst) {
                // The pending fire will pick up the updated target
                return;
            }

            let remaining = state.window_ms - since_last;
            debug!(
                "switch to channel {} deferred for {}ms",
                target.0, remaining
            );
            let state = Arc::clone(state);
            tokio::spawn(async move {
                tokio::time::sleep(Duration::from_millis(remaining)).await;
                state.fire().await;
            });
        } else {
            state.fire().await;
        }
    }

    /// Channel the last effective switch selected, if any
    pub fn active(&self) -> Option<ChannelId> {
        let raw = self.state.active.load(Ordering::SeqCst);
        u32::try_from(raw).ok().map(ChannelId)
    }
}
