//! Queue of "free" operations granted by events.
//!
//! Event handlers enqueue operations here; the sandbox drains the queue
//! in enqueue order immediately after the event handler returns, before
//! the acting faction's turn is considered complete. Every event
//! resolution goes through the sandbox (the engine's own event path and
//! any decision agent running an event both do), so the drain-once-per-
//! resolution invariant holds at a single call site.
//!
//! Free operations run outside normal turn accounting: handlers receive
//! `free = true` and charge no resources.

use im::Vector;
use serde::{Deserialize, Serialize};

use crate::core::{FactionId, OpId, SpaceId};

/// One operation granted for free by an event.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct FreeOperation {
    /// The faction that executes the operation.
    pub faction: FactionId,

    /// The operation (command or special activity).
    pub op: OpId,

    /// Target space; `None` lets the handler choose.
    pub space: Option<SpaceId>,
}

/// FIFO queue of pending free operations.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct FreeOperationQueue {
    queue: Vector<FreeOperation>,
}

impl FreeOperationQueue {
    /// Create an empty queue.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Enqueue an operation.
    pub fn enqueue(&mut self, op: FreeOperation) {
        self.queue.push_back(op);
    }

    /// Remove and return every queued operation in enqueue order,
    /// leaving the queue empty.
    pub fn drain(&mut self) -> Vec<FreeOperation> {
        let drained: Vec<_> = self.queue.iter().cloned().collect();
        self.queue.clear();
        drained
    }

    /// Number of queued operations.
    #[must_use]
    pub fn len(&self) -> usize {
        self.queue.len()
    }

    /// True if nothing is queued.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.queue.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn op(faction: u8, op_id: u16) -> FreeOperation {
        FreeOperation {
            faction: FactionId::new(faction),
            op: OpId::new(op_id),
            space: None,
        }
    }

    #[test]
    fn test_drain_preserves_fifo_order() {
        let mut queue = FreeOperationQueue::new();
        queue.enqueue(op(0, 1));
        queue.enqueue(op(1, 2));
        queue.enqueue(op(0, 3));

        let drained = queue.drain();
        let ops: Vec<u16> = drained.iter().map(|f| f.op.0).collect();
        assert_eq!(ops, vec![1, 2, 3]);
        assert!(queue.is_empty());
    }

    #[test]
    fn test_drain_empty_is_noop() {
        let mut queue = FreeOperationQueue::new();
        assert!(queue.drain().is_empty());
    }
}
