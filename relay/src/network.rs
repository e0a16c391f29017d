//! Relay network layer handling TCP connections and command fan-out

use crate::slots::SlotTable;
use log::{debug, error, info, warn};
use protocol::{decode, encode, Command, SPAWN_X_MAX, SPAWN_X_MIN, SPAWN_Y_MAX, SPAWN_Y_MIN};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use std::collections::HashMap;
use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;
use tokio::io::{AsyncBufReadExt, AsyncWriteExt, BufReader};
use tokio::net::tcp::OwnedWriteHalf;
use tokio::net::{TcpListener, TcpStream};
use tokio::sync::mpsc;

/// Messages sent from per-connection tasks to the coordinator loop
#[derive(Debug)]
pub enum RelayMessage {
    Connected {
        conn_id: u64,
        outbound: mpsc::UnboundedSender<String>,
    },
    FrameReceived {
        conn_id: u64,
        line: String,
    },
    Disconnected {
        conn_id: u64,
    },
    #[allow(dead_code)]
    Shutdown,
}

/// Match lifecycle of a relay instance; one instance serves one match
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MatchPhase {
    WaitingForPlayers,
    Active,
}

/// Central relay coordinating slot assignment and command broadcast
///
/// Each connection gets a reader task and a writer task; decoded events
/// funnel through one mpsc channel into the coordinator loop, which is the
/// only writer of the slot table and match phase. Broadcasts enqueue whole
/// frames per destination in coordinator order, so two broadcasts can never
/// interleave on a single transport.
pub struct Relay {
    listener: Arc<TcpListener>,
    slots: SlotTable,
    phase: MatchPhase,
    connections: HashMap<u64, mpsc::UnboundedSender<String>>,
    rng: StdRng,

    relay_tx: mpsc::UnboundedSender<RelayMessage>,
    relay_rx: mpsc::UnboundedReceiver<RelayMessage>,
}

impl Relay {
    /// Binds the relay to `addr`. A seed makes spawn positions reproducible;
    /// None draws them from entropy.
    pub async fn bind(addr: &str, seed: Option<u64>) -> Result<Self, Box<dyn std::error::Error>> {
        let listener = Arc::new(TcpListener::bind(addr).await?);
        info!("Relay listening on {}", listener.local_addr()?);

        let (relay_tx, relay_rx) = mpsc::unbounded_channel();

        let rng = match seed {
            Some(seed) => StdRng::seed_from_u64(seed),
            None => StdRng::from_entropy(),
        };

        Ok(Relay {
            listener,
            slots: SlotTable::new(),
            phase: MatchPhase::WaitingForPlayers,
            connections: HashMap::new(),
            rng,
            relay_tx,
            relay_rx,
        })
    }

    /// Address the relay actually bound to (port 0 resolves here).
    pub fn local_addr(&self) -> std::io::Result<SocketAddr> {
        self.listener.local_addr()
    }

    /// Spawns the task that accepts connections and wires up their I/O tasks
    fn spawn_acceptor(&self) {
        let listener = Arc::clone(&self.listener);
        let relay_tx = self.relay_tx.clone();

        tokio::spawn(async move {
            let mut next_conn_id: u64 = 1;

            loop {
                match listener.accept().await {
                    Ok((stream, addr)) => {
                        let conn_id = next_conn_id;
                        next_conn_id += 1;
                        info!("Session {} connected from {}", conn_id, addr);
                        spawn_connection(conn_id, stream, relay_tx.clone());
                    }
                    Err(e) => {
                        error!("Error accepting connection: {}", e);
                        tokio::time::sleep(Duration::from_millis(10)).await;
                    }
                }
            }
        });
    }

    /// Main coordinator loop processing all connection events in arrival order
    pub async fn run(mut self) -> Result<(), Box<dyn std::error::Error>> {
        self.spawn_acceptor();

        let mut relay_rx = std::mem::replace(&mut self.relay_rx, mpsc::unbounded_channel().1);

        info!("Relay started, waiting for two players");

        while let Some(message) = relay_rx.recv().await {
            match message {
                RelayMessage::Connected { conn_id, outbound } => {
                    self.connections.insert(conn_id, outbound);
                }
                RelayMessage::FrameReceived { conn_id, line } => {
                    self.handle_frame(conn_id, &line);
                }
                RelayMessage::Disconnected { conn_id } => {
                    info!("Session {} disconnected", conn_id);
                    self.connections.remove(&conn_id);
                }
                RelayMessage::Shutdown => {
                    info!("Relay shutting down");
                    break;
                }
            }
        }

        Ok(())
    }

    /// Dispatches one inbound frame according to the match phase
    fn handle_frame(&mut self, conn_id: u64, line: &str) {
        match decode(line) {
            Ok(Command::Register { name }) => self.handle_register(&name),

            Ok(Command::Move { .. }) | Ok(Command::AttributeChange { .. }) => {
                if self.phase == MatchPhase::Active {
                    // Mirror broadcast: echoed byte-identical to every
                    // session, the sender included. Sender ownership of the
                    // index is deliberately not verified.
                    self.broadcast(line);
                } else {
                    debug!(
                        "Dropping frame {:?} from session {} before match start",
                        line, conn_id
                    );
                }
            }

            Ok(Command::Spawn { .. }) => {
                warn!("Unexpected spawn frame from session {}", conn_id);
            }

            Err(e) => {
                warn!("Dropping frame from session {}: {}", conn_id, e);
            }
        }
    }

    /// Binds a slot for a registrant; starts the match on the second one
    fn handle_register(&mut self, name: &str) {
        if self.phase == MatchPhase::Active {
            warn!("Registration of {:?} ignored, match already active", name);
            return;
        }

        if self.slots.register(name).is_none() {
            warn!("Registration of {:?} ignored, both slots bound", name);
            return;
        }

        if self.slots.is_full() {
            self.phase = MatchPhase::Active;
            self.broadcast_spawns();
        }
    }

    /// Broadcasts one spawn per bound slot, in index order, at random
    /// positions inside the playfield margin
    fn broadcast_spawns(&mut self) {
        info!("Both slots bound, match is active");

        for (index, name) in self.slots.bound_in_index_order() {
            let x = self.rng.gen_range(SPAWN_X_MIN..=SPAWN_X_MAX);
            let y = self.rng.gen_range(SPAWN_Y_MIN..=SPAWN_Y_MAX);

            let frame = encode(&Command::Spawn { name, index, x, y });
            info!("Spawning slot {} at ({}, {})", index, x, y);
            self.broadcast(&frame);
        }
    }

    /// Queues a frame to every connected session.
    ///
    /// A closed destination queue is skipped; delivery to the remaining
    /// sessions is independent and never blocked by a failed one.
    fn broadcast(&mut self, frame: &str) {
        for (conn_id, outbound) in &self.connections {
            if outbound.send(frame.to_string()).is_err() {
                debug!("Session {} outbound queue closed, skipping", conn_id);
            }
        }
    }
}

/// Spawns the reader and writer tasks for one accepted connection
fn spawn_connection(
    conn_id: u64,
    stream: TcpStream,
    relay_tx: mpsc::UnboundedSender<RelayMessage>,
) {
    let (read_half, write_half) = stream.into_split();
    let (out_tx, out_rx) = mpsc::unbounded_channel();

    if relay_tx
        .send(RelayMessage::Connected {
            conn_id,
            outbound: out_tx,
        })
        .is_err()
    {
        return;
    }

    spawn_connection_writer(conn_id, write_half, out_rx);

    tokio::spawn(async move {
        let mut lines = BufReader::new(read_half).lines();

        loop {
            match lines.next_line().await {
                Ok(Some(line)) => {
                    if relay_tx
                        .send(RelayMessage::FrameReceived { conn_id, line })
                        .is_err()
                    {
                        break;
                    }
                }
                Ok(None) => break,
                Err(e) => {
                    debug!("Read error on session {}: {}", conn_id, e);
                    break;
                }
            }
        }

        let _ = relay_tx.send(RelayMessage::Disconnected { conn_id });
    });
}

/// Drains one connection's outbound queue onto its transport, one whole
/// frame per line
fn spawn_connection_writer(
    conn_id: u64,
    mut write_half: OwnedWriteHalf,
    mut out_rx: mpsc::UnboundedReceiver<String>,
) {
    tokio::spawn(async move {
        while let Some(frame) = out_rx.recv().await {
            let mut line = frame;
            line.push('\n');

            if let Err(e) = write_half.write_all(line.as_bytes()).await {
                debug!("Write error on session {}: {}", conn_id, e);
                break;
            }
        }
    });
}

#[cfg(test)]
mod tests {
    use super::*;

    async fn test_relay(seed: u64) -> Relay {
        Relay::bind("127.0.0.1:0", Some(seed)).await.unwrap()
    }

    fn attach_fake_session(relay: &mut Relay, conn_id: u64) -> mpsc::UnboundedReceiver<String> {
        let (tx, rx) = mpsc::unbounded_channel();
        relay.connections.insert(conn_id, tx);
        rx
    }

    fn parse_spawn(frame: &str) -> (String, u8, i32, i32) {
        match decode(frame).unwrap() {
            Command::Spawn { name, index, x, y } => (name, index, x, y),
            other => panic!("expected spawn, got {:?}", other),
        }
    }

    #[tokio::test]
    async fn test_initial_state_is_waiting() {
        let relay = test_relay(1).await;
        assert_eq!(relay.phase, MatchPhase::WaitingForPlayers);
        assert_eq!(relay.slots.bound_count(), 0);
    }

    #[tokio::test]
    async fn test_two_registrations_produce_two_spawns_in_order() {
        let mut relay = test_relay(7).await;
        let mut rx = attach_fake_session(&mut relay, 1);

        relay.handle_frame(1, "register:Alice");
        assert_eq!(relay.phase, MatchPhase::WaitingForPlayers);
        assert!(rx.try_recv().is_err(), "no spawn before both slots bound");

        relay.handle_frame(1, "register:Bob");
        assert_eq!(relay.phase, MatchPhase::Active);

        let (name0, index0, x0, y0) = parse_spawn(&rx.try_recv().unwrap());
        let (name1, index1, x1, y1) = parse_spawn(&rx.try_recv().unwrap());

        assert_eq!((name0.as_str(), index0), ("Alice", 0));
        assert_eq!((name1.as_str(), index1), ("Bob", 1));

        for (x, y) in [(x0, y0), (x1, y1)] {
            assert!((SPAWN_X_MIN..=SPAWN_X_MAX).contains(&x));
            assert!((SPAWN_Y_MIN..=SPAWN_Y_MAX).contains(&y));
        }

        assert!(rx.try_recv().is_err(), "exactly two spawns");
    }

    #[tokio::test]
    async fn test_third_registration_silently_ignored() {
        let mut relay = test_relay(7).await;
        let mut rx = attach_fake_session(&mut relay, 1);

        relay.handle_frame(1, "register:Alice");
        relay.handle_frame(1, "register:Bob");
        let _ = rx.try_recv().unwrap();
        let _ = rx.try_recv().unwrap();

        relay.handle_frame(1, "register:Mallory");

        assert_eq!(relay.slots.name(0), Some("Alice"));
        assert_eq!(relay.slots.name(1), Some("Bob"));
        assert!(rx.try_recv().is_err(), "no extra spawn broadcast");
    }

    #[tokio::test]
    async fn test_move_mirrored_to_all_sessions_including_sender() {
        let mut relay = test_relay(3).await;
        let mut rx1 = attach_fake_session(&mut relay, 1);
        let mut rx2 = attach_fake_session(&mut relay, 2);

        relay.handle_frame(1, "register:Alice");
        relay.handle_frame(2, "register:Bob");
        for rx in [&mut rx1, &mut rx2] {
            let _ = rx.try_recv().unwrap();
            let _ = rx.try_recv().unwrap();
        }

        relay.handle_frame(1, "move:0:10:0");

        assert_eq!(rx1.try_recv().unwrap(), "move:0:10:0");
        assert_eq!(rx2.try_recv().unwrap(), "move:0:10:0");
    }

    #[tokio::test]
    async fn test_move_dropped_while_waiting() {
        let mut relay = test_relay(3).await;
        let mut rx = attach_fake_session(&mut relay, 1);

        relay.handle_frame(1, "register:Alice");
        relay.handle_frame(1, "move:0:10:0");

        assert!(rx.try_recv().is_err());
        assert_eq!(relay.phase, MatchPhase::WaitingForPlayers);
    }

    #[tokio::test]
    async fn test_malformed_frame_dropped_processing_continues() {
        let mut relay = test_relay(5).await;
        let mut rx = attach_fake_session(&mut relay, 1);

        relay.handle_frame(1, "register:Alice");
        relay.handle_frame(1, "garbage");
        relay.handle_frame(1, "register:Bob");

        // Match still started despite the malformed frame in between
        assert_eq!(relay.phase, MatchPhase::Active);
        let _ = rx.try_recv().unwrap();
        let _ = rx.try_recv().unwrap();

        relay.handle_frame(1, "not:a:command");
        relay.handle_frame(1, "attribute-change:1:blue");
        assert_eq!(rx.try_recv().unwrap(), "attribute-change:1:blue");
    }

    #[tokio::test]
    async fn test_seeded_spawns_are_deterministic() {
        let mut frames = Vec::new();

        for _ in 0..2 {
            let mut relay = test_relay(42).await;
            let mut rx = attach_fake_session(&mut relay, 1);
            relay.handle_frame(1, "register:Alice");
            relay.handle_frame(1, "register:Bob");
            frames.push((rx.try_recv().unwrap(), rx.try_recv().unwrap()));
        }

        assert_eq!(frames[0], frames[1]);
    }

    #[tokio::test]
    async fn test_failed_destination_does_not_block_others() {
        let mut relay = test_relay(9).await;

        // Session 1's outbound queue is already closed
        let rx1 = attach_fake_session(&mut relay, 1);
        drop(rx1);
        let mut rx2 = attach_fake_session(&mut relay, 2);

        relay.handle_frame(2, "register:Alice");
        relay.handle_frame(2, "register:Bob");

        let _ = rx2.try_recv().unwrap();
        let _ = rx2.try_recv().unwrap();

        relay.handle_frame(2, "move:1:0:10");
        assert_eq!(rx2.try_recv().unwrap(), "move:1:0:10");
    }

    #[tokio::test]
    async fn test_disconnect_removes_only_that_session() {
        let mut relay = test_relay(11).await;
        let _rx1 = attach_fake_session(&mut relay, 1);
        let _rx2 = attach_fake_session(&mut relay, 2);

        relay.connections.remove(&1);

        assert!(!relay.connections.contains_key(&1));
        assert!(relay.connections.contains_key(&2));
    }
}
