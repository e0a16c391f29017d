//! # Relay Server Library
//!
//! This library implements the central relay for a two-player real-time
//! match. The relay is the single authority for participant identity: it
//! binds each registrant to one of two fixed slots, starts the match once
//! both slots are bound, and from then on fans every state-change command
//! out to all connected sessions, the sender included.
//!
//! ## Architecture
//!
//! ### Coordinator Loop
//! All slot-table and match-phase mutations happen on a single coordinator
//! task fed by an mpsc channel. Per-connection reader tasks only forward
//! received lines into that channel, so registration counting and the
//! waiting-to-active transition are handled by exactly one writer.
//!
//! ### Dumb Fan-Out
//! Once the match is active, the relay performs no validation of move or
//! attribute-change commands: frames are echoed unmodified to every
//! session. Agreement between the two views comes from every session
//! applying the same echoed command stream, not from server-side checks.
//!
//! ## Module Organization
//!
//! ### Slots Module (`slots`)
//! The fixed two-slot participant table and its registration rules.
//!
//! ### Network Module (`network`)
//! TCP accept loop, per-connection reader/writer tasks, the coordinator
//! loop, and the spawn/echo broadcast logic.

pub mod network;
pub mod slots;
