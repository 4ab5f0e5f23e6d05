//! Session hub - routes arena output to connected sockets

use dashmap::DashMap;
use tokio::sync::{broadcast, mpsc};
use tracing::{debug, warn};

use crate::game::{ClientChannels, ClientId};
use crate::ws::protocol::ServerMsg;

/// Per-client direct channel depth
const DIRECT_CAPACITY: usize = 64;
/// Shared state topic depth; a client further behind than this skips ahead
const STATE_CAPACITY: usize = 64;

/// Receivers handed to one socket's writer task
pub struct SessionChannels {
    pub direct_rx: mpsc::Receiver<ServerMsg>,
    pub state_rx: broadcast::Receiver<ServerMsg>,
}

/// Connected sockets, keyed by client identifier
pub struct SessionHub {
    sessions: DashMap<ClientId, mpsc::Sender<ServerMsg>>,
    state_tx: broadcast::Sender<ServerMsg>,
}

impl SessionHub {
    pub fn new() -> Self {
        let (state_tx, _) = broadcast::channel(STATE_CAPACITY);
        Self {
            sessions: DashMap::new(),
            state_tx,
        }
    }

    /// Open channels for a new socket
    pub fn register(&self, id: ClientId) -> SessionChannels {
        let (direct_tx, direct_rx) = mpsc::channel(DIRECT_CAPACITY);
        self.sessions.insert(id, direct_tx);
        SessionChannels {
            direct_rx,
            state_rx: self.state_tx.subscribe(),
        }
    }

    pub fn unregister(&self, id: &ClientId) {
        self.sessions.remove(id);
    }

    pub fn session_count(&self) -> usize {
        self.sessions.len()
    }
}

impl Default for SessionHub {
    fn default() -> Self {
        Self::new()
    }
}

impl ClientChannels for SessionHub {
    fn is_connected(&self, id: &ClientId) -> bool {
        self.sessions
            .get(id)
            .is_some_and(|tx| !tx.is_closed())
    }

    fn send_to(&self, id: &ClientId, msg: ServerMsg) {
        let Some(tx) = self.sessions.get(id) else {
            return;
        };

        match tx.try_send(msg) {
            Ok(()) => {}
            Err(mpsc::error::TrySendError::Full(_)) => {
                warn!(client_id = %id, "Direct channel full, message dropped");
            }
            Err(mpsc::error::TrySendError::Closed(_)) => {
                debug!(client_id = %id, "Direct channel closed");
            }
        }
    }

    fn broadcast(&self, msg: ServerMsg) {
        // No subscribers is fine: nobody is connected.
        let _ = self.state_tx.send(msg);
    }
}
