/// Mutation queues — thread-safe staging of BVH changes
///
/// Scene edits can come from any thread. They are recorded here and
/// applied in one batch by `Bvh::update()`, so the tree itself is only
/// ever touched by the thread that owns it. Each operation kind has its
/// own lock; an item queued twice for the same operation is kept once.

use std::sync::Arc;
use parking_lot::Mutex;
use rustc_hash::FxHashSet;
use crate::scene::{EntityKey, LightKey};

/// Something the BVH indexes
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum BvhItem {
    Entity(EntityKey),
    Light(LightKey),
}

/// Deduplicated FIFO list for one operation kind
#[derive(Debug, Default)]
struct PendingList {
    items: Vec<BvhItem>,
    queued: FxHashSet<BvhItem>,
}

impl PendingList {
    fn push(&mut self, item: BvhItem) {
        if self.queued.insert(item) {
            self.items.push(item);
        }
    }

    fn take(&mut self) -> Vec<BvhItem> {
        self.queued.clear();
        std::mem::take(&mut self.items)
    }
}

/// The three pending lists
#[derive(Debug, Default)]
pub(crate) struct MutationQueues {
    to_add: Mutex<PendingList>,
    to_remove: Mutex<PendingList>,
    to_update: Mutex<PendingList>,
}

/// Snapshot taken by `Bvh::update()`
#[derive(Debug, Default)]
pub(crate) struct DrainedMutations {
    pub(crate) removed: Vec<BvhItem>,
    pub(crate) added: Vec<BvhItem>,
    pub(crate) updated: Vec<BvhItem>,
}

impl DrainedMutations {
    pub(crate) fn is_empty(&self) -> bool {
        self.removed.is_empty() && self.added.is_empty() && self.updated.is_empty()
    }
}

impl MutationQueues {
    /// Take all pending items
    ///
    /// Each list is swapped out under its own lock and the lock is released
    /// before the items are processed.
    pub(crate) fn drain(&self) -> DrainedMutations {
        DrainedMutations {
            removed: self.to_remove.lock().take(),
            added: self.to_add.lock().take(),
            updated: self.to_update.lock().take(),
        }
    }

    pub(crate) fn pending(&self) -> usize {
        self.to_add.lock().items.len()
            + self.to_remove.lock().items.len()
            + self.to_update.lock().items.len()
    }
}

/// Cloneable handle for queueing BVH changes from any thread
#[derive(Debug, Clone, Default)]
pub struct BvhMutator {
    queues: Arc<MutationQueues>,
}

impl BvhMutator {
    pub(crate) fn queues(&self) -> &MutationQueues {
        &self.queues
    }

    pub fn add_entity(&self, entity: EntityKey) {
        self.queues.to_add.lock().push(BvhItem::Entity(entity));
    }

    pub fn remove_entity(&self, entity: EntityKey) {
        self.queues.to_remove.lock().push(BvhItem::Entity(entity));
    }

    pub fn update_entity(&self, entity: EntityKey) {
        self.queues.to_update.lock().push(BvhItem::Entity(entity));
    }

    pub fn add_light(&self, light: LightKey) {
        self.queues.to_add.lock().push(BvhItem::Light(light));
    }

    pub fn remove_light(&self, light: LightKey) {
        self.queues.to_remove.lock().push(BvhItem::Light(light));
    }

    pub fn update_light(&self, light: LightKey) {
        self.queues.to_update.lock().push(BvhItem::Light(light));
    }

    /// Number of queued items across all lists
    pub fn pending(&self) -> usize {
        self.queues.pending()
    }
}

#[cfg(test)]
#[path = "mutation_queue_tests.rs"]
mod tests;
