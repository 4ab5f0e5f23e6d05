//! Waiting queue for clients that arrive while the roster is full

use std::collections::VecDeque;

use crate::game::ClientId;

/// Client waiting for a slot
#[derive(Debug, Clone)]
pub struct QueuedClient {
    pub client_id: ClientId,
    pub queued_at: u64,
}

impl QueuedClient {
    pub fn new(client_id: ClientId, queued_at: u64) -> Self {
        Self {
            client_id,
            queued_at,
        }
    }

    /// How long this client has been waiting, in milliseconds
    pub fn wait_time(&self, now: u64) -> u64 {
        now.saturating_sub(self.queued_at)
    }
}

/// FIFO of waiting clients. An identifier appears at most once.
#[derive(Debug, Default)]
pub struct WaitingQueue {
    queue: VecDeque<QueuedClient>,
}

impl WaitingQueue {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a client at the tail, or leave it where it is if already queued.
    /// Returns its 1-based position.
    pub fn enqueue(&mut self, client_id: ClientId, now: u64) -> usize {
        if let Some(position) = self.position(&client_id) {
            return position;
        }
        self.queue.push_back(QueuedClient::new(client_id, now));
        self.queue.len()
    }

    /// Remove a client wherever it is
    pub fn remove(&mut self, client_id: &ClientId) -> Option<QueuedClient> {
        let idx = self.queue.iter().position(|c| &c.client_id == client_id)?;
        self.queue.remove(idx)
    }

    pub fn pop_front(&mut self) -> Option<QueuedClient> {
        self.queue.pop_front()
    }

    /// Put a client back at the head
    pub fn push_front(&mut self, client: QueuedClient) {
        self.queue.push_front(client);
    }

    /// 1-based position of a client
    pub fn position(&self, client_id: &ClientId) -> Option<usize> {
        self.queue
            .iter()
            .position(|c| &c.client_id == client_id)
            .map(|idx| idx + 1)
    }

    pub fn contains(&self, client_id: &ClientId) -> bool {
        self.queue.iter().any(|c| &c.client_id == client_id)
    }

    /// Queued identifiers, head first
    pub fn ids(&self) -> impl Iterator<Item = ClientId> + '_ {
        self.queue.iter().map(|c| c.client_id)
    }

    pub fn len(&self) -> usize {
        self.queue.len()
    }

    pub fn is_empty(&self) -> bool {
        self.queue.is_empty()
    }
}
