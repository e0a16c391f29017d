//! Wire protocol shared by the relay and the sessions.
//!
//! Every command travels as one line of colon-separated ASCII fields; the
//! first field is the command tag, the rest are positional arguments.

use thiserror::Error;

pub const WORLD_WIDTH: i32 = 800;
pub const WORLD_HEIGHT: i32 = 600;
pub const SPAWN_MARGIN: i32 = 50;
pub const SPAWN_X_MIN: i32 = SPAWN_MARGIN;
pub const SPAWN_X_MAX: i32 = WORLD_WIDTH - SPAWN_MARGIN;
pub const SPAWN_Y_MIN: i32 = SPAWN_MARGIN;
pub const SPAWN_Y_MAX: i32 = WORLD_HEIGHT - SPAWN_MARGIN;
pub const MOVE_STEP: i32 = 10;
pub const MAX_PLAYERS: usize = 2;

/// A single protocol command, the unit of everything sent over the wire.
///
/// `Register` flows client-to-relay, `Spawn` relay-to-clients, and
/// `Move`/`AttributeChange` flow both ways (intent up, echo down).
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Command {
    Register {
        name: String,
    },
    Spawn {
        name: String,
        index: u8,
        x: i32,
        y: i32,
    },
    Move {
        index: u8,
        dx: i32,
        dy: i32,
    },
    AttributeChange {
        index: u8,
        attribute: String,
    },
}

/// Failure to decode a received line into a [`Command`].
///
/// Always a recoverable value; the offending frame is dropped and the
/// connection keeps going.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum DecodeError {
    #[error("malformed frame: {0}")]
    MalformedFrame(String),
}

/// Encodes a command into its single-line wire form (without newline).
pub fn encode(command: &Command) -> String {
    match command {
        Command::Register { name } => format!("register:{}", name),
        Command::Spawn { name, index, x, y } => {
            format!("spawn:{}:{}:{}:{}", name, index, x, y)
        }
        Command::Move { index, dx, dy } => format!("move:{}:{}:{}", index, dx, dy),
        Command::AttributeChange { index, attribute } => {
            format!("attribute-change:{}:{}", index, attribute)
        }
    }
}

/// Decodes one received line into a command.
///
/// Fails on an unknown tag, a wrong field count for a known tag, or a
/// numeric field that does not parse. Never panics on any input.
pub fn decode(frame: &str) -> Result<Command, DecodeError> {
    let fields: Vec<&str> = frame.split(':').collect();

    match fields[0] {
        "register" => {
            expect_arity(frame, &fields, 2)?;
            Ok(Command::Register {
                name: fields[1].to_string(),
            })
        }
        "spawn" => {
            expect_arity(frame, &fields, 5)?;
            Ok(Command::Spawn {
                name: fields[1].to_string(),
                index: parse_int(frame, fields[2])?,
                x: parse_int(frame, fields[3])?,
                y: parse_int(frame, fields[4])?,
            })
        }
        "move" => {
            expect_arity(frame, &fields, 4)?;
            Ok(Command::Move {
                index: parse_int(frame, fields[1])?,
                dx: parse_int(frame, fields[2])?,
                dy: parse_int(frame, fields[3])?,
            })
        }
        "attribute-change" => {
            expect_arity(frame, &fields, 3)?;
            Ok(Command::AttributeChange {
                index: parse_int(frame, fields[1])?,
                attribute: fields[2].to_string(),
            })
        }
        _ => Err(DecodeError::MalformedFrame(format!(
            "unknown tag in {:?}",
            frame
        ))),
    }
}

fn expect_arity(frame: &str, fields: &[&str], expected: usize) -> Result<(), DecodeError> {
    if fields.len() == expected {
        Ok(())
    } else {
        Err(DecodeError::MalformedFrame(format!(
            "expected {} fields in {:?}, got {}",
            expected,
            frame,
            fields.len()
        )))
    }
}

fn parse_int<T: std::str::FromStr>(frame: &str, field: &str) -> Result<T, DecodeError> {
    field
        .parse()
        .map_err(|_| DecodeError::MalformedFrame(format!("bad integer {:?} in {:?}", field, frame)))
}
