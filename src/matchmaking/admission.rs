//! Admission policy - capacity, bot displacement, queue promotion,
//! inactivity eviction and bot backfill

use tracing::{debug, info};

use crate::game::{Arena, ClientId};
use crate::util::time::INACTIVITY_TIMEOUT_MS;
use crate::ws::protocol::ServerMsg;

/// Roster capacity, bots included
pub const MAX_PLAYERS: usize = 50;

impl Arena {
    /// A client connected: take a bot's slot, else a free slot, else wait.
    pub fn connect(&mut self, id: ClientId, now: u64) {
        if self.roster.contains_key(&id) {
            return;
        }

        if let Some(position) = self.queue_position(&id) {
            self.channels.send_to(&id, ServerMsg::Queued { position });
            return;
        }

        if let Some(bot_id) = self.first_bot() {
            self.remove_entity(&bot_id);
            debug!(client_id = %id, bot_id = %bot_id, "Displaced bot");
            self.admit(id, now);
        } else if self.roster.len() < MAX_PLAYERS {
            self.admit(id, now);
        } else {
            let position = self.queue.enqueue(id, now);
            self.channels.send_to(&id, ServerMsg::Queued { position });
            info!(client_id = %id, position, "Arena full, client queued");
        }
    }

    /// A client went away, from the roster or from the queue
    pub fn disconnect(&mut self, id: ClientId, now: u64) {
        if self.remove_entity(&id).is_some() {
            info!(client_id = %id, roster_size = self.roster.len(), "Player left");
            self.process_queue(now);
            self.fill_with_bots(now);
        } else if self.queue.remove(&id).is_some() {
            info!(client_id = %id, "Client left the queue");
            self.renumber_queue();
        }
    }

    /// Promote at most one waiting client.
    ///
    /// Heads that can no longer be reached are dropped on the way. A bot is
    /// displaced to make room if there is one; with no bot and no free
    /// slot the head stays where it is.
    pub fn process_queue(&mut self, now: u64) {
        if self.queue.is_empty() {
            return;
        }
        let mut changed = false;

        while let Some(head) = self.queue.pop_front() {
            let id = head.client_id;
            if !self.channels.is_connected(&id) {
                debug!(client_id = %id, "Dropped unreachable queued client");
                changed = true;
                continue;
            }

            if let Some(bot_id) = self.first_bot() {
                self.remove_entity(&bot_id);
            } else if self.roster.len() >= MAX_PLAYERS {
                self.queue.push_front(head);
                break;
            }

            info!(client_id = %id, waited_ms = head.wait_time(now), "Promoted from queue");
            self.admit(id, now);
            changed = true;
            break;
        }

        if changed {
            self.renumber_queue();
        }
    }

    /// Top the roster up to capacity with fresh bots
    pub fn fill_with_bots(&mut self, now: u64) {
        let missing = MAX_PLAYERS.saturating_sub(self.roster.len());
        if missing == 0 {
            return;
        }

        for _ in 0..missing {
            let id = self.fresh_bot_id();
            self.spawn_entity(id, true, now);
        }
        debug!(added = missing, "Backfilled roster with bots");
    }

    /// Evict real players silent for longer than the inactivity timeout,
    /// then promote from the queue and backfill. The last two run every
    /// sweep, evictions or not.
    pub fn inactivity_sweep(&mut self, now: u64) {
        let stale: Vec<ClientId> = self
            .activity
            .iter()
            .filter(|&(_, &last)| now.saturating_sub(last) > INACTIVITY_TIMEOUT_MS)
            .map(|(id, _)| *id)
            .collect();

        for id in stale {
            self.remove_entity(&id);
            info!(client_id = %id, "Evicted inactive player");
        }

        self.process_queue(now);
        self.fill_with_bots(now);
    }

    /// Create a real player and tell it so
    fn admit(&mut self, id: ClientId, now: u64) {
        self.spawn_entity(id, false, now);
        self.channels.send_to(&id, ServerMsg::PlayerJoined { id });
        self.send_state_to(&id);
        info!(client_id = %id, roster_size = self.roster.len(), "Player joined");
    }

    fn first_bot(&self) -> Option<ClientId> {
        self.roster.values().find(|e| e.is_bot).map(|e| e.id)
    }

    /// Tell every waiting client where it now stands
    fn renumber_queue(&self) {
        for (idx, id) in self.queue.ids().enumerate() {
            self.channels
                .send_to(&id, ServerMsg::Queued { position: idx + 1 });
        }
    }
}
