//! Client-side session: register, receive echoed commands, apply them

use crate::game::GameModel;
use crate::input::Intent;
use log::{debug, info, warn};
use protocol::{decode, encode, Command};
use std::time::Duration;
use tokio::io::{AsyncBufReadExt, AsyncWriteExt, BufReader, Lines};
use tokio::net::tcp::{OwnedReadHalf, OwnedWriteHalf};
use tokio::net::TcpStream;

/// One participant's connection to the relay.
///
/// A session never mutates the game model from local input. Intents go to
/// the relay, and the model changes only when the relayed echo comes back,
/// so both participants observe the same command sequence.
pub struct Session {
    name: String,
    owned_index: Option<u8>,
    lines: Lines<BufReader<OwnedReadHalf>>,
    writer: OwnedWriteHalf,
}

impl Session {
    /// Connects to the relay at `addr` within `timeout` and registers
    /// `name`. Connection establishment is the only blocking step; the
    /// slot index arrives later with the spawn broadcast.
    pub async fn connect(
        addr: &str,
        name: &str,
        timeout: Duration,
    ) -> Result<Self, Box<dyn std::error::Error>> {
        let stream = tokio::time::timeout(timeout, TcpStream::connect(addr)).await??;
        info!("Connected to relay at {}", addr);

        let (read_half, write_half) = stream.into_split();

        let mut session = Session {
            name: name.to_string(),
            owned_index: None,
            lines: BufReader::new(read_half).lines(),
            writer: write_half,
        };

        session
            .send(&Command::Register {
                name: name.to_string(),
            })
            .await?;

        Ok(session)
    }

    /// Slot index this session owns, once its own spawn has been echoed.
    pub fn owned_index(&self) -> Option<u8> {
        self.owned_index
    }

    async fn send(&mut self, command: &Command) -> Result<(), Box<dyn std::error::Error>> {
        let mut line = encode(command);
        line.push('\n');
        self.writer.write_all(line.as_bytes()).await?;
        Ok(())
    }

    /// Maps a local intent to a wire command using this session's owned
    /// index and sends it to the relay.
    ///
    /// Returns whether anything was sent: move and attribute intents
    /// issued before a slot is owned are dropped. A disconnect intent
    /// closes the transport; the protocol defines no farewell command.
    pub async fn send_intent(&mut self, intent: Intent) -> Result<bool, Box<dyn std::error::Error>> {
        if let Intent::Disconnect = intent {
            info!("Leaving the match");
            self.writer.shutdown().await?;
            return Ok(true);
        }

        let index = match self.owned_index {
            Some(index) => index,
            None => {
                debug!("No slot owned yet, dropping intent {:?}", intent);
                return Ok(false);
            }
        };

        match intent {
            Intent::Move { dx, dy } => self.send(&Command::Move { index, dx, dy }).await?,
            Intent::Attribute(attribute) => {
                self.send(&Command::AttributeChange { index, attribute })
                    .await?
            }
            Intent::Disconnect => {}
        }

        Ok(true)
    }

    /// Reads the next frame from the relay and applies it to the model.
    ///
    /// Returns false once the relay has closed the connection. Malformed
    /// frames are dropped and the session keeps receiving.
    pub async fn process_next<M: GameModel>(
        &mut self,
        model: &mut M,
    ) -> Result<bool, Box<dyn std::error::Error>> {
        match self.lines.next_line().await? {
            Some(line) => {
                self.apply_frame(&line, model);
                Ok(true)
            }
            None => {
                info!("Relay closed the connection");
                Ok(false)
            }
        }
    }

    /// Receive loop: applies echoed commands until the relay disconnects.
    pub async fn run<M: GameModel>(
        &mut self,
        model: &mut M,
    ) -> Result<(), Box<dyn std::error::Error>> {
        while self.process_next(model).await? {}
        Ok(())
    }

    fn apply_frame<M: GameModel>(&mut self, line: &str, model: &mut M) {
        match decode(line) {
            Ok(Command::Spawn { name, index, x, y }) => {
                model.spawn_participant(&name, index, x, y);

                // First spawn carrying our own name fixes our slot for the
                // lifetime of the session
                if self.owned_index.is_none() && name == self.name {
                    info!("Playing as {:?} at slot {}", name, index);
                    self.owned_index = Some(index);
                }
            }

            Ok(Command::Move { index, dx, dy }) => {
                // Applied for both participants; our own moves count only
                // once the relay has echoed them back
                model.translate_participant(index, dx, dy);
            }

            Ok(Command::AttributeChange { index, attribute }) => {
                model.set_attribute(index, &attribute);
            }

            Ok(Command::Register { .. }) => {
                warn!("Unexpected register frame from relay");
            }

            Err(e) => {
                warn!("Dropping inbound frame: {}", e);
            }
        }
    }
}
