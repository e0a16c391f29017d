//! Participant slot assignment for a single two-player match
//!
//! The relay tracks exactly two fixed slots for its whole lifetime. A slot
//! binds to a display name exactly once, in registration order, and never
//! unbinds; the table is the source of truth for who plays at which index.

use log::info;
use protocol::MAX_PLAYERS;

/// Fixed two-slot table mapping participant index to display name.
///
/// Index 0 goes to the first registrant, index 1 to the second. The domain
/// caps participants at two, so this stays a fixed array rather than a
/// growable collection.
#[derive(Debug, Default)]
pub struct SlotTable {
    names: [Option<String>; MAX_PLAYERS],
}

impl SlotTable {
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of slots bound so far.
    pub fn bound_count(&self) -> usize {
        self.names.iter().filter(|name| name.is_some()).count()
    }

    /// Returns true once both slots are bound.
    pub fn is_full(&self) -> bool {
        self.bound_count() == MAX_PLAYERS
    }

    /// Binds the next free slot to `name` and returns its index.
    ///
    /// Returns None when both slots are already bound; the caller drops the
    /// registration silently per the protocol.
    pub fn register(&mut self, name: &str) -> Option<u8> {
        let index = self.bound_count();
        if index >= MAX_PLAYERS {
            return None;
        }

        self.names[index] = Some(name.to_string());
        info!("Slot {} bound to {:?}", index, name);
        Some(index as u8)
    }

    /// Display name bound at `index`, if any.
    pub fn name(&self, index: u8) -> Option<&str> {
        self.names
            .get(index as usize)
            .and_then(|slot| slot.as_deref())
    }

    /// All bound (index, name) pairs in index order.
    pub fn bound_in_index_order(&self) -> Vec<(u8, String)> {
        self.names
            .iter()
            .enumerate()
            .filter_map(|(index, slot)| slot.as_ref().map(|name| (index as u8, name.clone())))
            .collect()
    }
}
