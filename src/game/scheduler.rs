//! Arena runner - single owner of the game state and its three tick cycles

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

use rand::SeedableRng;
use rand_chacha::ChaCha8Rng;
use tokio::sync::mpsc;
use tokio::time::{interval, Interval, MissedTickBehavior};
use tracing::{debug, info};

use crate::util::time::{admin_sweep, bot_tick, fast_tick, unix_millis};

use super::{Arena, ClientChannels, ClientId, PlayerInput};

/// Commands from connection handlers to the arena
#[derive(Debug, Clone)]
pub enum ArenaCommand {
    Connect(ClientId),
    Disconnect(ClientId),
    Intent(PlayerInput),
}

#[derive(Debug, thiserror::Error)]
pub enum ArenaError {
    #[error("arena is no longer running")]
    Closed,
}

/// Counters published by the runner for the health endpoint
#[derive(Debug, Default)]
pub struct ArenaStats {
    players: AtomicUsize,
    bots: AtomicUsize,
    queued: AtomicUsize,
}

impl ArenaStats {
    pub fn players(&self) -> usize {
        self.players.load(Ordering::Relaxed)
    }

    pub fn bots(&self) -> usize {
        self.bots.load(Ordering::Relaxed)
    }

    pub fn queued(&self) -> usize {
        self.queued.load(Ordering::Relaxed)
    }
}

/// Handle for talking to a running arena
#[derive(Clone)]
pub struct ArenaHandle {
    command_tx: mpsc::Sender<ArenaCommand>,
    stats: Arc<ArenaStats>,
}

impl ArenaHandle {
    pub async fn send(&self, command: ArenaCommand) -> Result<(), ArenaError> {
        self.command_tx
            .send(command)
            .await
            .map_err(|_| ArenaError::Closed)
    }

    pub fn stats(&self) -> &ArenaStats {
        &self.stats
    }
}

/// The task that owns the arena
pub struct ArenaRunner {
    arena: Arena,
    command_rx: mpsc::Receiver<ArenaCommand>,
    stats: Arc<ArenaStats>,
    bot_dice: ChaCha8Rng,
}

impl ArenaRunner {
    pub fn new(channels: Arc<dyn ClientChannels>, seed: u64) -> (Self, ArenaHandle) {
        let (command_tx, command_rx) = mpsc::channel(1024);
        let stats = Arc::new(ArenaStats::default());

        let handle = ArenaHandle {
            command_tx,
            stats: stats.clone(),
        };

        let runner = Self {
            arena: Arena::new(channels, seed),
            command_rx,
            stats,
            bot_dice: ChaCha8Rng::seed_from_u64(seed.wrapping_add(1)),
        };

        (runner, handle)
    }

    /// Run until every handle has been dropped.
    ///
    /// Commands and the three cycles interleave on this one task, so no
    /// state is ever touched from two places at once.
    pub async fn run(mut self) {
        self.arena.fill_with_bots(unix_millis());
        self.publish_stats();
        info!(roster_size = self.arena.roster_size(), "Arena running");

        let mut fast = ticker(fast_tick());
        let mut bots = ticker(bot_tick());
        let mut admin = ticker(admin_sweep());

        loop {
            tokio::select! {
                command = self.command_rx.recv() => match command {
                    Some(command) => self.apply(command),
                    None => break,
                },
                _ = fast.tick() => self.arena.fast_tick(unix_millis()),
                _ = bots.tick() => self.arena.run_bots(&mut self.bot_dice, unix_millis()),
                _ = admin.tick() => self.arena.inactivity_sweep(unix_millis()),
            }
            self.publish_stats();
        }

        info!("Arena stopped, all handles dropped");
    }

    fn apply(&mut self, command: ArenaCommand) {
        match command {
            ArenaCommand::Connect(id) => {
                debug!(client_id = %id, "Connection opened");
                self.arena.connect(id, unix_millis());
            }
            ArenaCommand::Disconnect(id) => {
                debug!(client_id = %id, "Connection closed");
                self.arena.disconnect(id, unix_millis());
            }
            ArenaCommand::Intent(input) => {
                self.arena
                    .handle_intent(input.client_id, input.msg, input.received_at);
            }
        }
    }

    fn publish_stats(&self) {
        let bots = self.arena.bot_count();
        self.stats
            .players
            .store(self.arena.roster_size() - bots, Ordering::Relaxed);
        self.stats.bots.store(bots, Ordering::Relaxed);
        self.stats
            .queued
            .store(self.arena.queue_len(), Ordering::Relaxed);
    }
}

fn ticker(period: std::time::Duration) -> Interval {
    let mut ticker = interval(period);
    ticker.set_missed_tick_behavior(MissedTickBehavior::Skip);
    ticker
}

#[cfg(test)]
mod tests {
    use std::time::Duration;

    use tokio::time::timeout;
    use tokio_test::{assert_err, assert_ok};
    use uuid::Uuid;

    use super::*;
    use crate::game::testing::RecordingChannels;
    use crate::matchmaking::admission::MAX_PLAYERS;
    use crate::ws::protocol::{ClientMsg, ServerMsg};

    /// Poll until `check` holds or a second has passed
    async fn eventually(check: impl Fn() -> bool) -> bool {
        timeout(Duration::from_secs(1), async {
            while !check() {
                tokio::time::sleep(Duration::from_millis(10)).await;
            }
        })
        .await
        .is_ok()
    }

    #[tokio::test]
    async fn backfills_and_broadcasts_on_start() {
        let channels = Arc::new(RecordingChannels::default());
        let (runner, handle) = ArenaRunner::new(channels.clone(), 1);
        tokio::spawn(runner.run());

        assert!(eventually(|| handle.stats().bots() == MAX_PLAYERS).await);
        assert!(eventually(|| channels.broadcasts().len() >= 2).await);
    }

    #[tokio::test]
    async fn connect_and_disconnect_go_through_admission() {
        let channels = Arc::new(RecordingChannels::default());
        let (runner, handle) = ArenaRunner::new(channels.clone(), 2);
        tokio::spawn(runner.run());
        let id = Uuid::new_v4();

        assert_ok!(handle.send(ArenaCommand::Connect(id)).await);
        assert!(eventually(|| handle.stats().players() == 1).await);
        assert!(channels
            .sent_to(&id)
            .contains(&ServerMsg::PlayerJoined { id }));
        assert_eq!(handle.stats().bots(), MAX_PLAYERS - 1);

        let input = PlayerInput {
            client_id: id,
            msg: ClientMsg::Block,
            received_at: unix_millis(),
        };
        assert_ok!(handle.send(ArenaCommand::Intent(input)).await);

        assert_ok!(handle.send(ArenaCommand::Disconnect(id)).await);
        assert!(eventually(|| handle.stats().players() == 0).await);
        assert_eq!(handle.stats().bots(), MAX_PLAYERS);
    }

    #[tokio::test]
    async fn send_fails_once_runner_is_gone() {
        let channels = Arc::new(RecordingChannels::default());
        let (runner, handle) = ArenaRunner::new(channels, 3);
        drop(runner);

        assert_err!(handle.send(ArenaCommand::Connect(Uuid::new_v4())).await);
    }
}
