//! # Session Library
//!
//! Client-side implementation for the two-player relay protocol. A session
//! connects to the relay, registers a display name, and then drives a local
//! game model exclusively from relay-confirmed commands.
//!
//! ## Echo-Confirmed State
//!
//! Local input never mutates the game model directly. Each resolved input
//! becomes an intent, the intent is sent to the relay as a command, and
//! only the relayed echo is applied. Both participants therefore apply the
//! same authoritative command sequence in the same order, without either
//! client trusting its own unconfirmed input.
//!
//! ## Module Organization
//!
//! ### Game Module (`game`)
//! The [`game::GameModel`] seam the session drives, plus a plain two-slot
//! implementation used by the demo binary and tests. Rendering stays
//! behind this trait, outside the crate.
//!
//! ### Input Module (`input`)
//! The [`input::Intent`] type and the mapping from resolved input tokens
//! to intents (direction, color, leave).
//!
//! ### Network Module (`network`)
//! The [`network::Session`] itself: timed connect, registration, intent
//! sending with the owned slot index, and the receive loop that applies
//! echoed commands to the model.

pub mod game;
pub mod input;
pub mod network;
