//! Channel set state and arbitration
//!
//! The channel set's key domain is fixed when the session handshake
//! completes; only values change afterwards. Entries keep registration
//! order because arbitration breaks ties toward the first-registered
//! channel, so this is a Vec of pairs rather than a hash map.

use serde::{Deserialize, Serialize};

/// Identifier of one tracked input channel
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct ChannelId(pub u32);

impl std::fmt::Display for ChannelId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Result of one arbitration pass over the channel set
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Arbitration {
    /// Channel holding the maximum value, or `None` when the maximum is 0
    pub winner: Option<ChannelId>,
    /// The maximum value itself (0 when there is no winner)
    pub value: i64,
}

/// Registration-ordered mapping of channel id to current value
#[derive(Debug, Clone)]
pub struct ChannelSet {
    entries: Vec<(ChannelId, i64)>,
}

impl ChannelSet {
    /// Build a channel set from ids in registration order
    ///
    /// A repeated id keeps its first position.
    pub fn new(ids: impl IntoIterator<Item = u32>) -> Self {
        let mut entries: Vec<(ChannelId, i64)> = Vec::new();
        for id in ids {
            let id = ChannelId(id);
            if !entries.iter().any(|(existing, _)| *existing == id) {
                entries.push((id, 0));
            }
        }
        Self { entries }
    }

    /// Registered ids in registration order
    pub fn ids(&self) -> impl Iterator<Item = ChannelId> + '_ {
        self.entries.iter().map(|(id, _)| *id)
    }

    /// Number of registered channels
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Whether the set is empty
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Whether an id is registered
    pub fn contains(&self, id: ChannelId) -> bool {
        self.entries.iter().any(|(existing, _)| *existing == id)
    }

    /// Current value of a channel
    pub fn get(&self, id: ChannelId) -> Option<i64> {
        self.entries
            .iter()
            .find(|(existing, _)| *existing == id)
            .map(|(_, value)| *value)
    }

    /// Overwrite a channel's value
    ///
    /// Returns `false` if the id is not registered; the key domain never
    /// grows after the handshake.
    pub fn set(&mut self, id: ChannelId, value: i64) -> bool {
        match self
            .entries
            .iter_mut()
            .find(|(existing, _)| *existing == id)
        {
            Some((_, slot)) => {
                *slot = value;
                true
            }
            None => false,
        }
    }

    /// Reset every channel's value to 0
    pub fn reset(&mut self) {
        for (_, value) in &mut self.entries {
            *value = 0;
        }
    }

    /// Select the current winner: the first-registered channel holding the
    /// maximum value, or no winner when the maximum is 0
    ///
    /// The all-zero case is explicit so idle channels never produce a
    /// degenerate "channel with value 0 wins" state.
    pub fn arbitrate(&self) -> Arbitration {
        let mut best: Option<(ChannelId, i64)> = None;
        for &(id, value) in &self.entries {
            match best {
                // Strict comparison keeps the first-registered channel on ties
                Some((_, best_value)) if value <= best_value => {}
                _ => best = Some((id, value)),
            }
        }

        match best {
            Some((id, value)) if value != 0 => Arbitration {
                winner: Some(id),
                value,
            },
            _ => Arbitration {
                winner: None,
                value: 0,
            },
        }
    }
}
