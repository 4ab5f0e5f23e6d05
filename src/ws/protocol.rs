//! WebSocket protocol message definitions
//! These are the wire types for client-server communication

use std::collections::HashMap;

use serde::{Deserialize, Serialize};

use crate::game::entity::{Action, Facing};
use crate::game::ClientId;

/// Messages sent from client to server
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", content = "data", rename_all = "camelCase")]
pub enum ClientMsg {
    /// Client-reported position (trusted, clamped to the arena)
    Move {
        x: f32,
        y: f32,
        direction: Facing,
    },

    /// Melee swing, subject to the attack cooldown
    Attack,

    /// Raise guard: halves incoming damage while held
    Block,

    /// Back to neutral stance
    Idle,

    /// Respawn in place of the current entity, dead or alive
    Respawn,

    /// Come back after death, or re-enter after being removed
    Restart,
}

/// Messages sent from server to client
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", content = "data", rename_all = "camelCase")]
pub enum ServerMsg {
    /// Full roster snapshot
    GameState {
        players: HashMap<ClientId, EntityView>,
    },

    /// Admission confirmed, carries the client's own identifier
    PlayerJoined { id: ClientId },

    /// Waiting for a slot (1-based position)
    Queued { position: usize },

    /// Sent only to the player who died
    #[serde(rename_all = "camelCase")]
    PlayerDied {
        score: u64,
        survival_time: u64,
        killer_id: ClientId,
    },

    /// Back in play after death
    PlayerRestarted { id: ClientId },
}

/// Entity state as broadcast to clients
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EntityView {
    pub id: ClientId,
    pub is_bot: bool,
    pub x: f32,
    pub y: f32,
    /// Health (0-100)
    pub health: u32,
    pub is_dead: bool,
    pub action: Action,
    pub direction: Facing,
    pub score: u64,
    /// Whole seconds alive in the current life
    pub survival_time: u64,
}
