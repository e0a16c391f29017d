//! Local game state updated only by relay-confirmed commands

use log::warn;
use protocol::MAX_PLAYERS;

/// State model seam between the session and whatever renders the game.
///
/// The session core only ever talks to this trait; concrete windowing or
/// rendering types stay outside the crate.
pub trait GameModel {
    /// Materializes a participant at `index` at position (x, y).
    fn spawn_participant(&mut self, name: &str, index: u8, x: i32, y: i32);

    /// Translates the participant at `index` by (dx, dy).
    fn translate_participant(&mut self, index: u8, dx: i32, dy: i32);

    /// Sets the display attribute (e.g. color) of the participant at `index`.
    fn set_attribute(&mut self, index: u8, value: &str);
}

/// One materialized participant.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Participant {
    pub name: String,
    pub x: i32,
    pub y: i32,
    pub attribute: String,
}

impl Participant {
    pub fn new(name: &str, x: i32, y: i32) -> Self {
        Self {
            name: name.to_string(),
            x,
            y,
            // Every participant starts out red until recolored
            attribute: "red".to_string(),
        }
    }
}

/// Plain two-slot [`GameModel`] implementation backing the demo binary and
/// the tests. A fixed pair, since the match never holds more than two.
#[derive(Debug, Default)]
pub struct TwoSlotState {
    slots: [Option<Participant>; MAX_PLAYERS],
}

impl TwoSlotState {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn participant(&self, index: u8) -> Option<&Participant> {
        self.slots.get(index as usize).and_then(|slot| slot.as_ref())
    }
}

impl GameModel for TwoSlotState {
    fn spawn_participant(&mut self, name: &str, index: u8, x: i32, y: i32) {
        match self.slots.get_mut(index as usize) {
            Some(slot) => *slot = Some(Participant::new(name, x, y)),
            None => warn!("Spawn for out-of-range index {}", index),
        }
    }

    fn translate_participant(&mut self, index: u8, dx: i32, dy: i32) {
        match self.slots.get_mut(index as usize).and_then(Option::as_mut) {
            Some(participant) => {
                participant.x += dx;
                participant.y += dy;
            }
            None => warn!("Move for unmaterialized index {}", index),
        }
    }

    fn set_attribute(&mut self, index: u8, value: &str) {
        match self.slots.get_mut(index as usize).and_then(Option::as_mut) {
            Some(participant) => participant.attribute = value.to_string(),
            None => warn!("Attribute change for unmaterialized index {}", index),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_spawn_materializes_participant() {
        let mut state = TwoSlotState::new();
        state.spawn_participant("Alice", 0, 100, 200);

        let alice = state.participant(0).unwrap();
        assert_eq!(alice.name, "Alice");
        assert_eq!((alice.x, alice.y), (100, 200));
        assert_eq!(alice.attribute, "red");
        assert!(state.participant(1).is_none());
    }

    #[test]
    fn test_translate_moves_by_delta() {
        let mut state = TwoSlotState::new();
        state.spawn_participant("Alice", 0, 100, 200);

        state.translate_participant(0, 10, 0);
        state.translate_participant(0, -30, 10);

        let alice = state.participant(0).unwrap();
        assert_eq!((alice.x, alice.y), (80, 210));
    }

    #[test]
    fn test_set_attribute() {
        let mut state = TwoSlotState::new();
        state.spawn_participant("Bob", 1, 50, 50);

        state.set_attribute(1, "blue");
        assert_eq!(state.participant(1).unwrap().attribute, "blue");
    }

    #[test]
    fn test_commands_for_unknown_index_are_ignored() {
        let mut state = TwoSlotState::new();

        // No participant materialized yet; these must not panic
        state.translate_participant(0, 10, 0);
        state.set_attribute(1, "green");
        state.spawn_participant("Ghost", 7, 0, 0);

        assert!(state.participant(0).is_none());
        assert!(state.participant(1).is_none());
    }
}
