//! Entity model - players and bots share one shape

use serde::{Deserialize, Serialize};

use crate::util::time::elapsed_secs;
use crate::ws::protocol::EntityView;

use super::ClientId;

/// Arena width in world units
pub const ARENA_WIDTH: f32 = 2000.0;
/// Arena height in world units
pub const ARENA_HEIGHT: f32 = 1000.0;
/// Health on spawn
pub const MAX_HEALTH: u32 = 100;

/// Last-known intent, consumed by combat and replayed by clients as animation
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Action {
    #[default]
    Idle,
    Move,
    Attack,
    Block,
}

/// Horizontal facing
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Facing {
    Left,
    #[default]
    Right,
}

/// Result of a hit landing on an entity
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct HitOutcome {
    /// Damage actually applied after mitigation
    pub damage: u32,
    /// This hit took the entity to zero health
    pub killed: bool,
}

/// Authoritative state of one player or bot
#[derive(Debug, Clone)]
pub struct Entity {
    pub id: ClientId,
    pub is_bot: bool,

    pub x: f32,
    pub y: f32,
    pub health: u32,
    pub is_dead: bool,
    pub action: Action,
    pub direction: Facing,
    pub last_attack_time: Option<u64>,

    pub score: u64,
    pub start_time: u64,
    pub survival_time: u64,

    /// Bumped on every respawn so stale death timers can be told apart
    pub life: u32,
}

impl Entity {
    pub fn new(id: ClientId, is_bot: bool, spawn: (f32, f32), now: u64) -> Self {
        let (x, y) = clamp_to_arena(spawn.0, spawn.1);
        Self {
            id,
            is_bot,
            x,
            y,
            health: MAX_HEALTH,
            is_dead: false,
            action: Action::Idle,
            direction: Facing::Right,
            last_attack_time: None,
            score: 0,
            start_time: now,
            survival_time: 0,
            life: 0,
        }
    }

    pub fn is_alive(&self) -> bool {
        !self.is_dead
    }

    /// Set position, clamped to the arena
    pub fn place(&mut self, x: f32, y: f32) {
        let (x, y) = clamp_to_arena(x, y);
        self.x = x;
        self.y = y;
    }

    /// Shift by a delta; faces the way it moved horizontally
    pub fn nudge(&mut self, dx: f32, dy: f32) {
        self.place(self.x + dx, self.y + dy);
        if dx > 0.0 {
            self.direction = Facing::Right;
        } else if dx < 0.0 {
            self.direction = Facing::Left;
        }
    }

    /// Accept an attack intent unless still cooling down
    pub fn try_start_attack(&mut self, now: u64, cooldown_ms: u64) -> bool {
        if let Some(last) = self.last_attack_time {
            if now.saturating_sub(last) < cooldown_ms {
                return false;
            }
        }
        self.action = Action::Attack;
        self.last_attack_time = Some(now);
        true
    }

    /// Apply incoming damage. Blocking halves it. On the killing hit the
    /// survival clock freezes and its seconds are banked into score.
    pub fn take_hit(&mut self, amount: u32, now: u64) -> HitOutcome {
        let damage = if self.action == Action::Block {
            amount / 2
        } else {
            amount
        };

        self.health = self.health.saturating_sub(damage);

        let killed = self.health == 0 && !self.is_dead;
        if killed {
            self.is_dead = true;
            self.survival_time = elapsed_secs(self.start_time, now);
            self.score += self.survival_time;
        }

        HitOutcome { damage, killed }
    }

    /// Fresh spawn point, full health, new life. Score carries over.
    pub fn respawn(&mut self, spawn: (f32, f32), now: u64) {
        self.place(spawn.0, spawn.1);
        self.health = MAX_HEALTH;
        self.is_dead = false;
        self.action = Action::Idle;
        self.start_time = now;
        self.survival_time = 0;
        self.life = self.life.wrapping_add(1);
    }

    /// Recompute seconds alive; frozen while dead
    pub fn refresh_survival_time(&mut self, now: u64) {
        if self.is_alive() {
            self.survival_time = elapsed_secs(self.start_time, now);
        }
    }

    pub fn view(&self) -> EntityView {
        EntityView {
            id: self.id,
            is_bot: self.is_bot,
            x: self.x,
            y: self.y,
            health: self.health,
            is_dead: self.is_dead,
            action: self.action,
            direction: self.direction,
            score: self.score,
            survival_time: self.survival_time,
        }
    }

    pub fn distance_to(&self, other: &Entity) -> f32 {
        let dx = self.x - other.x;
        let dy = self.y - other.y;
        (dx * dx + dy * dy).sqrt()
    }
}

pub fn clamp_to_arena(x: f32, y: f32) -> (f32, f32) {
    (x.clamp(0.0, ARENA_WIDTH), y.clamp(0.0, ARENA_HEIGHT))
}
