/// BvhNode — one node of the bounding volume hierarchy
///
/// Nodes live in a slot-map arena owned by `BvhTree`. Children are owned
/// through their keys; `parent` is a plain back-reference used only to
/// walk upward when boxes change.

use slotmap::new_key_type;
use crate::math::BoundingBox;
use crate::scene::{EntityKey, LightKey};

new_key_type! {
    /// Stable key of a node inside a `BvhTree` arena.
    pub struct BvhNodeKey;
}

#[derive(Debug, Clone)]
pub struct BvhNode {
    pub(crate) left: Option<BvhNodeKey>,
    pub(crate) right: Option<BvhNodeKey>,
    pub(crate) parent: Option<BvhNodeKey>,
    /// Box covering everything below this node
    pub(crate) bounding_box: BoundingBox,
    /// Entities of a leaf (always empty for internal nodes)
    pub(crate) entities: Vec<EntityKey>,
    /// Point/spot lights whose volume touches this leaf (empty for internal nodes)
    pub(crate) lights: Vec<LightKey>,
    /// Root is 0
    pub(crate) depth: u32,
}

impl BvhNode {
    pub(crate) fn leaf(parent: Option<BvhNodeKey>, depth: u32) -> Self {
        Self {
            left: None,
            right: None,
            parent,
            bounding_box: BoundingBox::EMPTY,
            entities: Vec::new(),
            lights: Vec::new(),
            depth,
        }
    }

    /// A node is a leaf iff it has no children
    pub fn is_leaf(&self) -> bool {
        self.left.is_none() && self.right.is_none()
    }

    pub fn left(&self) -> Option<BvhNodeKey> {
        self.left
    }

    pub fn right(&self) -> Option<BvhNodeKey> {
        self.right
    }

    pub fn parent(&self) -> Option<BvhNodeKey> {
        self.parent
    }

    pub fn bounding_box(&self) -> &BoundingBox {
        &self.bounding_box
    }

    pub fn entities(&self) -> &[EntityKey] {
        &self.entities
    }

    pub fn lights(&self) -> &[LightKey] {
        &self.lights
    }

    pub fn depth(&self) -> u32 {
        self.depth
    }

    /// Both children, when the node is internal
    pub(crate) fn children(&self) -> Option<(BvhNodeKey, BvhNodeKey)> {
        match (self.left, self.right) {
            (Some(l), Some(r)) => Some((l, r)),
            _ => None,
        }
    }
}
