//! Channel arbitrator
//!
//! On every accepted update the arbitrator overwrites the channel's value,
//! recomputes the maximum across the full set, and decides which of the two
//! edge-triggered notifications (winner changed, value changed) are
//! warranted. The last-emitted winner and value live in atomics with
//! exchange-and-compare semantics: the run loop is the only writer, but a
//! disposer may read concurrently and must never observe a torn pair, and
//! "swap, then compare against the previous" is what makes the
//! notify-only-on-change rule race-free.

use std::sync::atomic::{AtomicI64, Ordering};

use dmx_protocol::ChannelUpdate;

use crate::channels::{ChannelId, ChannelSet};

/// Sentinel for "no winner has been emitted" / all channels idle
const NO_WINNER: i64 = -1;

/// Sentinel for "no value has been emitted yet"
///
/// Values are not clamped at this layer, so the sentinel sits outside the
/// representable update range.
const NO_VALUE: i64 = i64::MIN;

/// An update named a channel outside the registered set
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct UnregisteredChannel {
    /// The channel id the peer sent
    pub channel: i64,
}

/// Notifications warranted by one accepted update
///
/// Either, both, or neither may be present. When both are delivered, winner
/// precedes value.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ArbitrationDelta {
    /// New arbitration winner, if it differs from the last emitted one and
    /// the effective value is non-zero
    pub winner_changed: Option<ChannelId>,
    /// New effective value, if it differs from the last emitted one
    pub value_changed: Option<i64>,
}

/// Holds authoritative per-channel state and the last-emitted pair
pub struct Arbiter {
    channels: ChannelSet,
    last_winner: AtomicI64,
    last_value: AtomicI64,
}

impl Arbiter {
    /// Create an arbitrator over a freshly handshaken channel set
    ///
    /// All values start at 0, matching the post-handshake reset.
    pub fn new(mut channels: ChannelSet) -> Self {
        channels.reset();
        Self {
            channels,
            last_winner: AtomicI64::new(NO_WINNER),
            last_value: AtomicI64::new(NO_VALUE),
        }
    }

    /// Apply one accepted update and compute the warranted notifications
    ///
    /// A transition to the all-zero state resets the remembered winner to
    /// "none" without a winner-changed notification; only the value change
    /// (to 0) is reported. This keeps simultaneous quiescing of several
    /// channels from thrashing the downstream consumer.
    pub fn apply(&mut self, update: ChannelUpdate) -> Result<ArbitrationDelta, UnregisteredChannel> {
        let id = u32::try_from(update.channel)
            .ok()
            .map(ChannelId)
            .filter(|id| self.channels.contains(*id))
            .ok_or(UnregisteredChannel {
                channel: update.channel,
            })?;

        self.channels.set(id, update.value);
        let arb = self.channels.arbitrate();

        let winner_changed = match arb.winner {
            Some(winner) => {
                let prev = self.last_winner.swap(i64::from(winner.0), Ordering::SeqCst);
                (prev != i64::from(winner.0)).then_some(winner)
            }
            None => {
                self.last_winner.swap(NO_WINNER, Ordering::SeqCst);
                None
            }
        };

        let prev_value = self.last_value.swap(arb.value, Ordering::SeqCst);
        let value_changed = (prev_value != arb.value).then_some(arb.value);

        Ok(ArbitrationDelta {
            winner_changed,
            value_changed,
        })
    }

    /// Last-emitted arbitration winner, or `None` when all channels are idle
    pub fn winner(&self) -> Option<ChannelId> {
        let raw = self.last_winner.load(Ordering::SeqCst);
        u32::try_from(raw).ok().map(ChannelId)
    }

    /// Last-emitted effective value (0 before any update was accepted)
    pub fn value(&self) -> i64 {
        match self.last_value.load(Ordering::SeqCst) {
            NO_VALUE => 0,
            value => value,
        }
    }

    /// The underlying channel set
    pub fn channels(&self) -> &ChannelSet {
        &self.channels
    }
}

#[cfg(test)]
mod tests {
    use super::{Arbiter, ArbitrationDelta, UnregisteredChannel};
    use crate::channels::{ChannelId, ChannelSet};
    use dmx_protocol::ChannelUpdate;
    use proptest::prelude::*;

    fn arbiter(ids: &[u32]) -> Arbiter {
        Arbiter::new(ChannelSet::new(ids.iter().copied()))
    }

    fn apply(arb: &mut Arbiter, channel: i64, value: i64) -> ArbitrationDelta {
        arb.apply(ChannelUpdate { channel, value })
            .expect("registered channel")
    }

    #[test]
    fn test_first_update_emits_both() {
        let mut arb = arbiter(&[1, 2]);

        let delta = apply(&mut arb, 1, 100);
        assert_eq!(delta.winner_changed, Some(ChannelId(1)));
        assert_eq!(delta.value_changed, Some(100));
    }

    #[test]
    fn test_identical_update_is_suppressed() {
        let mut arb = arbiter(&[1, 2]);

        apply(&mut arb, 1, 100);
        let delta = apply(&mut arb, 1, 100);
        assert_eq!(delta.winner_changed, None);
        assert_eq!(delta.value_changed, None);
    }

    #[test]
    fn test_value_change_without_winner_change() {
        let mut arb = arbiter(&[1, 2]);

        apply(&mut arb, 1, 100);
        let delta = apply(&mut arb, 1, 150);
        assert_eq!(delta.winner_changed, None);
        assert_eq!(delta.value_changed, Some(150));
    }

    #[test]
    fn test_winner_change_without_value_change() {
        let mut arb = arbiter(&[1, 2]);

        apply(&mut arb, 1, 100);
        // Channel 2 overtakes at the same effective value after channel 1
        // quiesces: winner moves, value does not.
        apply(&mut arb, 2, 100);
        let delta = apply(&mut arb, 1, 0);
        assert_eq!(delta.winner_changed, Some(ChannelId(2)));
        assert_eq!(delta.value_changed, None);
    }

    #[test]
    fn test_transition_to_all_zero_reports_value_only() {
        let mut arb = arbiter(&[1, 2]);

        apply(&mut arb, 1, 100);
        let delta = apply(&mut arb, 1, 0);
        assert_eq!(delta.winner_changed, None);
        assert_eq!(delta.value_changed, Some(0));
        assert_eq!(arb.winner(), None);
        assert_eq!(arb.value(), 0);
    }

    #[test]
    fn test_rewake_after_idle_refires_winner() {
        let mut arb = arbiter(&[1, 2]);

        apply(&mut arb, 1, 100);
        apply(&mut arb, 1, 0);

        // Same channel returns: the remembered winner was reset to none, so
        // this is a genuine winner change again.
        let delta = apply(&mut arb, 1, 50);
        assert_eq!(delta.winner_changed, Some(ChannelId(1)));
        assert_eq!(delta.value_changed, Some(50));
    }

    #[test]
    fn test_idle_alternation_never_fires_winner() {
        let mut arb = arbiter(&[1, 2]);

        for _ in 0..4 {
            let a = apply(&mut arb, 1, 0);
            let b = apply(&mut arb, 2, 0);
            assert_eq!(a.winner_changed, None);
            assert_eq!(b.winner_changed, None);
        }
    }

    #[test]
    fn test_tie_breaks_to_first_registered() {
        let mut arb = arbiter(&[3, 1]);

        apply(&mut arb, 1, 70);
        let delta = apply(&mut arb, 3, 70);
        // Channel 3 registered first, so the tie moves the winner to it
        assert_eq!(delta.winner_changed, Some(ChannelId(3)));
    }

    #[test]
    fn test_unregistered_channel_rejected() {
        let mut arb = arbiter(&[1, 2]);

        let err = arb
            .apply(ChannelUpdate {
                channel: 5,
                value: 10,
            })
            .unwrap_err();
        assert_eq!(err, UnregisteredChannel { channel: 5 });

        // Negative ids can never be registered
        assert!(arb
            .apply(ChannelUpdate {
                channel: -3,
                value: 10
            })
            .is_err());
    }

    proptest! {
        /// After any accepted update sequence the winner equals the
        /// first-registered channel among those holding the maximum, or none
        /// when the maximum is 0.
        #[test]
        fn arbitration_is_deterministic(
            updates in proptest::collection::vec((0u32..4, 0i64..256), 1..64)
        ) {
            let ids = [10u32, 11, 12, 13];
            let mut arb = arbiter(&ids);

            for (slot, value) in updates {
                let channel = i64::from(ids[slot as usize]);
                let _ = apply(&mut arb, channel, value);

                let values: Vec<i64> = ids
                    .iter()
                    .map(|&id| arb.channels().get(ChannelId(id)).unwrap_or(0))
                    .collect();
                let max = values.iter().copied().max().unwrap_or(0);
                let expected = if max == 0 {
                    None
                } else {
                    values
                        .iter()
                        .position(|&v| v == max)
                        .map(|i| ChannelId(ids[i]))
                };

                prop_assert_eq!(arb.channels().arbitrate().winner, expected);
                prop_assert_eq!(arb.winner(), expected);
            }
        }
    }
}
