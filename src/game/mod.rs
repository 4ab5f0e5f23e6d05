//! Game simulation modules

pub mod arena;
pub mod bots;
pub mod combat;
pub mod entity;
pub mod scheduler;
pub mod snapshot;

pub use arena::Arena;
pub use scheduler::{ArenaCommand, ArenaHandle, ArenaRunner};

use uuid::Uuid;

use crate::ws::protocol::{ClientMsg, ServerMsg};

/// Opaque per-connection identifier; bots get one too
pub type ClientId = Uuid;

/// Intent received from a WebSocket
#[derive(Debug, Clone)]
pub struct PlayerInput {
    pub client_id: ClientId,
    pub msg: ClientMsg,
    pub received_at: u64,
}

/// Outbound side of the transport as the arena sees it.
///
/// Implementations must never block: the arena calls these from its tick
/// loop and a slow client cannot be allowed to stall the simulation.
pub trait ClientChannels: Send + Sync {
    /// Whether a message sent to `id` could still be delivered
    fn is_connected(&self, id: &ClientId) -> bool;

    /// Deliver a message to one client, dropping it if that is not possible
    fn send_to(&self, id: &ClientId, msg: ServerMsg);

    /// Publish to every connected client
    fn broadcast(&self, msg: ServerMsg);
}

#[cfg(test)]
pub mod testing {
    //! In-memory transport used by the core's unit tests

    use std::collections::HashSet;

    use parking_lot::Mutex;

    use super::{ClientChannels, ClientId};
    use crate::ws::protocol::ServerMsg;

    #[derive(Default)]
    pub struct RecordingChannels {
        sent: Mutex<Vec<(ClientId, ServerMsg)>>,
        broadcasts: Mutex<Vec<ServerMsg>>,
        offline: Mutex<HashSet<ClientId>>,
    }

    impl RecordingChannels {
        /// Make a client unreachable, as if its socket had dropped
        pub fn go_offline(&self, id: ClientId) {
            self.offline.lock().insert(id);
        }

        /// Messages delivered to one client, oldest first
        pub fn sent_to(&self, id: &ClientId) -> Vec<ServerMsg> {
            self.sent
                .lock()
                .iter()
                .filter(|(to, _)| to == id)
                .map(|(_, msg)| msg.clone())
                .collect()
        }

        pub fn broadcasts(&self) -> Vec<ServerMsg> {
            self.broadcasts.lock().clone()
        }
    }

    impl ClientChannels for RecordingChannels {
        fn is_connected(&self, id: &ClientId) -> bool {
            !self.offline.lock().contains(id)
        }

        fn send_to(&self, id: &ClientId, msg: ServerMsg) {
            self.sent.lock().push((*id, msg));
        }

        fn broadcast(&self, msg: ServerMsg) {
            self.broadcasts.lock().push(msg);
        }
    }
}
