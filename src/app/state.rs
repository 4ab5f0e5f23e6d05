//! Application state shared across routes

use std::sync::Arc;

use crate::config::Config;
use crate::game::{ArenaHandle, ArenaRunner};
use crate::ws::SessionHub;

/// Shared application state
#[derive(Clone)]
pub struct AppState {
    pub config: Arc<Config>,
    pub hub: Arc<SessionHub>,
    pub arena: ArenaHandle,
}

impl AppState {
    /// Build the state along with the arena runner, which the caller must spawn
    pub fn new(config: Config) -> (Self, ArenaRunner) {
        let config = Arc::new(config);

        // Sockets register here; the arena writes through it
        let hub = Arc::new(SessionHub::new());

        let seed = config.arena_seed.unwrap_or_else(rand::random);
        let (runner, arena) = ArenaRunner::new(hub.clone(), seed);

        let state = Self { config, hub, arena };
        (state, runner)
    }
}
