//! In-memory FIFO of pending replies shared by the Telegram listener and the
//! bridge loop.

use std::sync::{Arc, Mutex};

use tracing::debug;

use crate::types::OutboundReply;

/// Cloneable handle to a reply queue.
///
/// The Telegram handler pushes, the bridge loop drains. The lock is a
/// `std::sync::Mutex` because it is never held across an `.await`.
#[derive(Debug, Clone, Default)]
pub struct ReplyQueue {
    inner: Arc<Mutex<Vec<OutboundReply>>>,
}

impl ReplyQueue {
    pub fn new() -> Self {
        Self::default()
    }

    /// Append a reply at the back of the queue.
    pub fn push(&self, reply: OutboundReply) {
        let mut queue = self.inner.lock().unwrap_or_else(|e| e.into_inner());
        queue.push(reply);
        debug!(pending = queue.len(), "queued telegram reply");
    }

    /// Take every queued reply in append order, leaving the queue empty.
    ///
    /// The swap happens under one lock acquisition, so a reply pushed
    /// concurrently lands either in this batch or in the next one.
    pub fn take_all(&self) -> Vec<OutboundReply> {
        let mut queue = self.inner.lock().unwrap_or_else(|e| e.into_inner());
        std::mem::take(&mut *queue)
    }

    pub fn len(&self) -> usize {
        self.inner.lock().unwrap_or_else(|e| e.into_inner()).len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}
