//! Snapshot building for network transmission

use std::collections::HashMap;

use crate::ws::protocol::{EntityView, ServerMsg};

use super::entity::Entity;
use super::ClientId;

/// Full roster as a `gameState` message
pub fn game_state(roster: &HashMap<ClientId, Entity>) -> ServerMsg {
    let players: HashMap<ClientId, EntityView> = roster
        .iter()
        .map(|(id, entity)| (*id, entity.view()))
        .collect();

    ServerMsg::GameState { players }
}
