//=========================================================================
// Effect Bus
//=========================================================================
//
// Type-keyed outbox for side effects aimed at external collaborators.
//
// Architecture:
//   Core systems → publish<M>() → HashMap<TypeId, Vec<M>>
//                                       ↓
//   Collaborators ← read<M>() (any number of readers, same frame)
//                                       ↓
//   World ────────→ drain<M>() / clear<M>() at tick boundary
//
// The core never draws, plays or simulates anything itself. It records
// what should happen (swap a visual, play a cue, freeze a body) and the
// renderer/audio/physics collaborators consume the records.
//
//=========================================================================

//=== External Dependencies ===============================================

use std::any::TypeId;
use std::collections::HashMap;

//=== Internal Dependencies ===============================================

use super::message_queue::MessageQueue;

//=== Public API ==========================================================

/// Marker trait for types that can travel through the [`MessageBus`].
///
/// Blanket-implemented for every `Send + 'static` type so effects can be
/// handed across the engine's thread boundary in batches.
pub trait Message: Send + 'static {}

impl<T: Send + 'static> Message for T {}

//=========================================================================

/// Per-type queues of published effects.
pub struct MessageBus {
    queues: HashMap<TypeId, Box<dyn MessageQueue>>,
}

impl MessageBus {
    pub fn new() -> Self {
        Self { queues: HashMap::new() }
    }

    //--- Publishing -------------------------------------------------------

    /// Appends a message to the queue for its type.
    pub fn publish<M: Message>(&mut self, msg: M) {
        self.queue_mut::<M>().push(msg);
    }

    //--- Reading ----------------------------------------------------------

    /// All queued messages of type `M`, oldest first.
    pub fn read<M: Message>(&self) -> &[M] {
        self.queue::<M>().map(Vec::as_slice).unwrap_or(&[])
    }

    /// Takes every queued message of type `M`, keeping the allocation.
    pub fn drain<M: Message>(&mut self) -> Vec<M> {
        match self.queues.get_mut(&TypeId::of::<M>()) {
            Some(q) => q
                .as_any_mut()
                .downcast_mut::<Vec<M>>()
                .map(|v| v.drain(..).collect())
                .unwrap_or_default(),
            None => Vec::new(),
        }
    }

    //--- Query API --------------------------------------------------------

    pub fn has_messages<M: Message>(&self) -> bool {
        self.count::<M>() > 0
    }

    pub fn count<M: Message>(&self) -> usize {
        self.queues
            .get(&TypeId::of::<M>())
            .map(|q| q.len())
            .unwrap_or(0)
    }

    /// Total number of queued messages across every type.
    pub fn total(&self) -> usize {
        self.queues.values().map(|q| q.len()).sum()
    }

    //--- Clearing ---------------------------------------------------------

    pub fn clear<M: Message>(&mut self) {
        if let Some(q) = self.queues.get_mut(&TypeId::of::<M>()) {
            q.clear_queue();
        }
    }

    /// Empties every queue while keeping allocations for the next frame.
    pub fn clear_all(&mut self) {
        for q in self.queues.values_mut() {
            q.clear_queue();
        }
    }

    //--- Internal Helpers -------------------------------------------------

    fn queue<M: Message>(&self) -> Option<&Vec<M>> {
        self.queues
            .get(&TypeId::of::<M>())
            .and_then(|q| q.as_any().downcast_ref::<Vec<M>>())
    }

    fn queue_mut<M: Message>(&mut self) -> &mut Vec<M> {
        let slot = self
            .queues
            .entry(TypeId::of::<M>())
            .or_insert_with(|| Box::new(Vec::<M>::new()));

        // Queues are keyed by the TypeId of their element type, so a
        // mismatch is unreachable.
        match slot.as_any_mut().downcast_mut::<Vec<M>>() {
            Some(v) => v,
            None => unreachable!("queue stored under foreign TypeId"),
        }
    }
}

impl Default for MessageBus {
    fn default() -> Self {
        Self::new()
    }
}

//=========================================================================
// Tests
//=========================================================================
