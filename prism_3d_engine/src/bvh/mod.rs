/// BVH module — spatial index of scene entities and lights
///
/// `BvhTree` is the data structure, `Bvh` adds the thread-safe mutation
/// queues and the scene-level queries (culling, picking, light lookup).

pub mod bvh;
pub mod bvh_node;
pub mod bvh_tree;
pub mod mutation_queue;

pub use bvh::{Bvh, BvhUpdateStats, PickData};
pub use bvh_node::{BvhNode, BvhNodeKey};
pub use bvh_tree::{BvhTree, SplitOutcome};
pub use mutation_queue::{BvhItem, BvhMutator};
