//! Arena state and intent handling
//!
//! The arena owns the roster, the waiting queue and the activity ledger.
//! Everything here runs on the runner task; `now` is always passed in as
//! Unix milliseconds so the rules can be driven from tests.

use std::collections::HashMap;
use std::sync::Arc;

use rand::{Rng, SeedableRng};
use rand_chacha::ChaCha8Rng;
use tracing::{debug, info};
use uuid::Builder;

use crate::matchmaking::queue::WaitingQueue;
use crate::util::time::BOT_DEATH_GRACE_MS;
use crate::ws::protocol::{ClientMsg, ServerMsg};

use super::combat::ATTACK_COOLDOWN_MS;
use super::entity::{Action, Entity, ARENA_HEIGHT, ARENA_WIDTH};
use super::snapshot;
use super::{ClientChannels, ClientId};

/// A dead bot waiting to be cleared from the roster
#[derive(Debug, Clone, Copy)]
struct PendingRemoval {
    id: ClientId,
    life: u32,
    due_at: u64,
}

/// Authoritative game state
pub struct Arena {
    pub(crate) roster: HashMap<ClientId, Entity>,
    pub(crate) queue: WaitingQueue,
    pub(crate) activity: HashMap<ClientId, u64>,
    pending_removals: Vec<PendingRemoval>,
    pub(crate) channels: Arc<dyn ClientChannels>,
    rng: ChaCha8Rng,
}

impl Arena {
    pub fn new(channels: Arc<dyn ClientChannels>, seed: u64) -> Self {
        Self {
            roster: HashMap::new(),
            queue: WaitingQueue::new(),
            activity: HashMap::new(),
            pending_removals: Vec::new(),
            channels,
            rng: ChaCha8Rng::seed_from_u64(seed),
        }
    }

    #[cfg(test)]
    pub fn entity(&self, id: &ClientId) -> Option<&Entity> {
        self.roster.get(id)
    }

    pub fn roster_size(&self) -> usize {
        self.roster.len()
    }

    pub fn bot_count(&self) -> usize {
        self.roster.values().filter(|e| e.is_bot).count()
    }

    pub fn queue_len(&self) -> usize {
        self.queue.len()
    }

    pub fn queue_position(&self, id: &ClientId) -> Option<usize> {
        self.queue.position(id)
    }

    #[cfg(test)]
    pub fn last_activity(&self, id: &ClientId) -> Option<u64> {
        self.activity.get(id).copied()
    }

    /// Uniform random point inside the arena
    pub(crate) fn spawn_point(&mut self) -> (f32, f32) {
        (
            self.rng.gen_range(0.0..=ARENA_WIDTH),
            self.rng.gen_range(0.0..=ARENA_HEIGHT),
        )
    }

    /// Random v4 identifier not used by anyone in the roster or queue
    pub(crate) fn fresh_bot_id(&mut self) -> ClientId {
        loop {
            let id = Builder::from_random_bytes(self.rng.gen()).into_uuid();
            if !self.roster.contains_key(&id) && !self.queue.contains(&id) {
                return id;
            }
        }
    }

    /// Put a new entity into the roster. Real players get a ledger entry.
    pub(crate) fn spawn_entity(&mut self, id: ClientId, is_bot: bool, now: u64) {
        let spawn = self.spawn_point();
        self.roster.insert(id, Entity::new(id, is_bot, spawn, now));
        if !is_bot {
            self.activity.insert(id, now);
        }
    }

    /// Drop an entity and its ledger entry
    pub(crate) fn remove_entity(&mut self, id: &ClientId) -> Option<Entity> {
        self.activity.remove(id);
        self.roster.remove(id)
    }

    /// Stamp the ledger for a real player in the roster
    pub fn touch_activity(&mut self, id: &ClientId, now: u64) {
        if let Some(entity) = self.roster.get(id) {
            if !entity.is_bot {
                self.activity.insert(*id, now);
            }
        }
    }

    /// Apply one client intent. Intents from unknown or dead clients are
    /// dropped, except `respawn` and `restart`.
    pub fn handle_intent(&mut self, id: ClientId, msg: ClientMsg, now: u64) {
        self.touch_activity(&id, now);

        match msg {
            ClientMsg::Respawn => self.respawn(id, now),
            ClientMsg::Restart => self.restart(id, now),
            ClientMsg::Move { x, y, direction } => {
                if let Some(entity) = self.living_mut(&id) {
                    entity.place(x, y);
                    entity.direction = direction;
                    entity.action = Action::Move;
                }
            }
            ClientMsg::Attack => {
                if let Some(entity) = self.living_mut(&id) {
                    entity.try_start_attack(now, ATTACK_COOLDOWN_MS);
                }
            }
            ClientMsg::Block => {
                if let Some(entity) = self.living_mut(&id) {
                    entity.action = Action::Block;
                }
            }
            ClientMsg::Idle => {
                if let Some(entity) = self.living_mut(&id) {
                    entity.action = Action::Idle;
                }
            }
        }
    }

    fn living_mut(&mut self, id: &ClientId) -> Option<&mut Entity> {
        self.roster.get_mut(id).filter(|e| e.is_alive())
    }

    /// Respawn a rostered entity whether or not it is dead
    pub fn respawn(&mut self, id: ClientId, now: u64) {
        if !self.roster.contains_key(&id) {
            return;
        }
        let spawn = self.spawn_point();
        if let Some(entity) = self.roster.get_mut(&id) {
            entity.respawn(spawn, now);
            debug!(client_id = %id, life = entity.life, "Entity respawned");
        }
    }

    /// Bring a dead player back, or send an absent one through admission
    pub fn restart(&mut self, id: ClientId, now: u64) {
        match self.roster.get(&id) {
            Some(entity) if entity.is_dead => {
                self.respawn(id, now);
                self.channels.send_to(&id, ServerMsg::PlayerRestarted { id });
                info!(client_id = %id, "Player restarted");
            }
            Some(_) => {}
            None if self.queue.contains(&id) => {}
            None => self.connect(id, now),
        }
    }

    /// Book-keeping after an entity's health hits zero
    pub(crate) fn on_death(&mut self, id: ClientId, killer_id: ClientId, now: u64) {
        let Some(entity) = self.roster.get(&id) else {
            return;
        };

        if entity.is_bot {
            debug!(client_id = %id, killer_id = %killer_id, "Bot died");
            self.pending_removals.push(PendingRemoval {
                id,
                life: entity.life,
                due_at: now + BOT_DEATH_GRACE_MS,
            });
            return;
        }

        info!(
            client_id = %id,
            killer_id = %killer_id,
            score = entity.score,
            survival_time = entity.survival_time,
            "Player died"
        );
        self.channels.send_to(
            &id,
            ServerMsg::PlayerDied {
                score: entity.score,
                survival_time: entity.survival_time,
                killer_id,
            },
        );
    }

    /// Clear dead bots whose grace window has elapsed, then backfill.
    /// A removal only fires for the same life that died.
    pub fn expire_grace_windows(&mut self, now: u64) {
        if self.pending_removals.is_empty() {
            return;
        }

        let (due, waiting): (Vec<_>, Vec<_>) = self
            .pending_removals
            .drain(..)
            .partition(|p| p.due_at <= now);
        self.pending_removals = waiting;

        let mut removed = 0;
        for pending in due {
            let still_dead = self
                .roster
                .get(&pending.id)
                .is_some_and(|e| e.is_dead && e.life == pending.life);
            if still_dead {
                self.remove_entity(&pending.id);
                removed += 1;
            }
        }

        if removed > 0 {
            debug!(removed, "Cleared dead bots");
            self.fill_with_bots(now);
        }
    }

    /// Recompute survival clocks for everyone alive
    pub fn refresh_survival_times(&mut self, now: u64) {
        for entity in self.roster.values_mut() {
            entity.refresh_survival_time(now);
        }
    }

    /// 20 Hz cycle: combat resolves fully before the state goes out
    pub fn fast_tick(&mut self, now: u64) {
        self.expire_grace_windows(now);
        self.resolve_combat(now);
        self.refresh_survival_times(now);
        self.channels.broadcast(snapshot::game_state(&self.roster));
    }

    /// Full roster snapshot to one client
    pub(crate) fn send_state_to(&self, id: &ClientId) {
        self.channels.send_to(id, snapshot::game_state(&self.roster));
    }
}
