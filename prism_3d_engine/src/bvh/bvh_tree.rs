/// BvhTree — binary bounding volume hierarchy over entities and lights
///
/// Entities live in leaves only; every entity is in exactly one leaf and
/// that leaf's box contains the entity's box. A leaf holding more than
/// `max_entity_per_node` entities is split in two along the longest axis
/// of its box at the object median, unless the box is already at or below
/// `min_node_size` or the leaf sits at `max_depth`.
///
/// Point and spot lights are registered in every leaf their influence
/// volume touches. Directional lights affect everything and are never
/// indexed.
///
/// Removals do not restructure the tree immediately: they schedule the
/// parent for a merge check and `clean()` performs the merges and frees
/// detached nodes.

use rustc_hash::FxHashMap;
use slotmap::SlotMap;
use crate::camera::Frustum;
use crate::math::{frustum_box_intersection, ray_box_intersection, BoundingBox, IntersectResult, Ray};
use crate::scene::{EntityKey, LightKey, LightVolume};
use crate::settings::BvhSettings;
use super::bvh_node::{BvhNode, BvhNodeKey};

/// What happened when a leaf was asked to split
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SplitOutcome {
    /// The leaf is within the entity limit
    NotNeeded,
    /// The leaf (and any overfull descendant) was split
    Split,
    /// The box is too small to split; the leaf stays oversized
    TooSmall,
    /// A leaf hit the depth limit while still overfull
    DepthLimited,
}

pub struct BvhTree {
    nodes: SlotMap<BvhNodeKey, BvhNode>,
    root: BvhNodeKey,
    settings: BvhSettings,
    /// Reverse lookup: entity → (leaf, world box)
    entity_locations: FxHashMap<EntityKey, (BvhNodeKey, BoundingBox)>,
    /// Indexed light volumes
    light_volumes: FxHashMap<LightKey, LightVolume>,
    /// Registration order of lights; leaf light lists follow it
    light_order: Vec<LightKey>,
    /// Parents whose children should be checked for merging
    merge_candidates: Vec<BvhNodeKey>,
    /// Detached nodes waiting for `clean()`
    nodes_to_delete: Vec<BvhNodeKey>,
}

impl BvhTree {
    pub fn new(settings: BvhSettings) -> Self {
        let mut nodes = SlotMap::with_key();
        let root = nodes.insert(BvhNode::leaf(None, 0));
        Self {
            nodes,
            root,
            settings,
            entity_locations: FxHashMap::default(),
            light_volumes: FxHashMap::default(),
            light_order: Vec::new(),
            merge_candidates: Vec::new(),
            nodes_to_delete: Vec::new(),
        }
    }

    // ===== ACCESSORS =====

    pub fn settings(&self) -> &BvhSettings {
        &self.settings
    }

    /// Takes effect on the next `rebuild()`
    pub fn set_settings(&mut self, settings: BvhSettings) {
        self.settings = settings;
    }

    pub fn root(&self) -> BvhNodeKey {
        self.root
    }

    pub fn node(&self, key: BvhNodeKey) -> Option<&BvhNode> {
        self.nodes.get(key)
    }

    /// Box covering the whole tree
    pub fn bounding_box(&self) -> BoundingBox {
        self.nodes[self.root].bounding_box
    }

    pub fn entity_count(&self) -> usize {
        self.entity_locations.len()
    }

    pub fn contains_entity(&self, entity: EntityKey) -> bool {
        self.entity_locations.contains_key(&entity)
    }

    /// Leaf currently holding `entity`
    pub fn entity_leaf(&self, entity: EntityKey) -> Option<BvhNodeKey> {
        self.entity_locations.get(&entity).map(|(leaf, _)| *leaf)
    }

    /// World box the entity was indexed with
    pub fn entity_box(&self, entity: EntityKey) -> Option<&BoundingBox> {
        self.entity_locations.get(&entity).map(|(_, bb)| bb)
    }

    pub fn contains_light(&self, light: LightKey) -> bool {
        self.light_volumes.contains_key(&light)
    }

    /// Lights registered in the entity's leaf, in registration order
    pub fn lights_near(&self, entity: EntityKey) -> &[LightKey] {
        match self.entity_locations.get(&entity) {
            Some((leaf, _)) => &self.nodes[*leaf].lights,
            None => &[],
        }
    }

    /// All reachable leaves, depth first, left before right
    pub fn leaves(&self) -> Vec<BvhNodeKey> {
        let mut leaves = Vec::new();
        let mut stack = vec![self.root];
        while let Some(key) = stack.pop() {
            match self.nodes[key].children() {
                Some((l, r)) => {
                    stack.push(r);
                    stack.push(l);
                }
                None => leaves.push(key),
            }
        }
        leaves
    }

    /// Number of reachable nodes
    pub fn node_count(&self) -> usize {
        let mut count = 0;
        let mut stack = vec![self.root];
        while let Some(key) = stack.pop() {
            count += 1;
            if let Some((l, r)) = self.nodes[key].children() {
                stack.push(l);
                stack.push(r);
            }
        }
        count
    }

    /// Deepest leaf depth
    pub fn depth(&self) -> u32 {
        self.leaves().iter().map(|k| self.nodes[*k].depth).max().unwrap_or(0)
    }

    /// Boxes of every leaf (editor overlay feed)
    pub fn debug_leaf_boxes(&self) -> Vec<BoundingBox> {
        self.leaves().iter().map(|k| self.nodes[*k].bounding_box).collect()
    }

    /// Nodes detached by merges and not yet freed
    pub fn pending_deletions(&self) -> usize {
        self.nodes_to_delete.len()
    }

    // ===== ENTITY MUTATIONS =====

    /// Insert an entity into the leaf that best contains its box
    ///
    /// Descends choosing the child that already contains the box (the
    /// smaller one if both do), otherwise the child whose volume grows
    /// least. An overfull leaf is split right away.
    ///
    /// Returns true when a full rebuild is warranted: a leaf at the depth
    /// limit is still overfull.
    pub fn add(&mut self, entity: EntityKey, bb: BoundingBox) -> bool {
        if self.entity_locations.contains_key(&entity) {
            return self.update_entity(entity, bb);
        }

        let leaf = self.find_insertion_leaf(&bb);
        self.nodes[leaf].entities.push(entity);
        self.entity_locations.insert(entity, (leaf, bb));
        self.update_leaf(leaf, false);

        self.split(leaf) == SplitOutcome::DepthLimited
    }

    /// Remove an entity; returns false if it was not indexed
    ///
    /// The owning leaf's box shrinks immediately, merging waits for `clean()`.
    pub fn remove(&mut self, entity: EntityKey) -> bool {
        let Some((leaf, _)) = self.entity_locations.remove(&entity) else {
            return false;
        };

        let entities = &mut self.nodes[leaf].entities;
        if let Some(pos) = entities.iter().position(|&e| e == entity) {
            entities.remove(pos);
        }
        self.update_leaf(leaf, true);
        true
    }

    /// Re-insert an entity with a new box; returns `add`'s rebuild flag
    pub fn update_entity(&mut self, entity: EntityKey, bb: BoundingBox) -> bool {
        if let Some((leaf, old_box)) = self.entity_locations.get_mut(&entity) {
            // Still inside its leaf's box: only the leaf box may shrink
            let leaf = *leaf;
            if self.nodes[leaf].bounding_box.contains(&bb) {
                *old_box = bb;
                self.update_leaf(leaf, false);
                return false;
            }
        }
        self.remove(entity);
        self.add(entity, bb)
    }

    // ===== LIGHT MUTATIONS =====

    /// Register a point or spot light in every leaf its volume touches
    ///
    /// Global volumes are ignored. Registering an existing light updates it.
    pub fn add_light(&mut self, light: LightKey, volume: LightVolume) {
        if matches!(volume, LightVolume::Global) {
            return;
        }
        if self.light_volumes.contains_key(&light) {
            self.update_light(light, volume);
            return;
        }

        self.light_volumes.insert(light, volume);
        self.light_order.push(light);
        for leaf in self.leaves_touching(&volume) {
            self.nodes[leaf].lights.push(light);
        }
    }

    /// Unregister a light; returns false if it was not indexed
    pub fn remove_light(&mut self, light: LightKey) -> bool {
        if self.light_volumes.remove(&light).is_none() {
            return false;
        }
        self.light_order.retain(|&l| l != light);
        for leaf in self.leaves() {
            self.nodes[leaf].lights.retain(|&l| l != light);
        }
        true
    }

    /// Move a light to a new volume, keeping its registration order
    pub fn update_light(&mut self, light: LightKey, volume: LightVolume) {
        if matches!(volume, LightVolume::Global) {
            self.remove_light(light);
            return;
        }
        if !self.light_volumes.contains_key(&light) {
            self.add_light(light, volume);
            return;
        }

        self.light_volumes.insert(light, volume);
        for leaf in self.leaves() {
            let node = &self.nodes[leaf];
            let should = !node.bounding_box.is_empty() && volume.touches(&node.bounding_box);
            if should != node.lights.contains(&light) {
                self.rederive_leaf_lights(leaf);
            }
        }
    }

    // ===== STRUCTURE =====

    /// Re-derive a leaf's box from its members and propagate upward
    ///
    /// Ancestors are re-unioned until one comes out unchanged. A changed
    /// leaf box re-derives the leaf's light list. `removed_from_this_node`
    /// schedules the parent for a merge check at the next `clean()`.
    pub fn update_leaf(&mut self, node: BvhNodeKey, removed_from_this_node: bool) {
        let new_box = self.nodes[node]
            .entities
            .iter()
            .filter_map(|e| self.entity_locations.get(e))
            .fold(BoundingBox::EMPTY, |acc, (_, bb)| acc.union(bb));

        if removed_from_this_node {
            if let Some(parent) = self.nodes[node].parent {
                if !self.merge_candidates.contains(&parent) {
                    self.merge_candidates.push(parent);
                }
            }
        }

        if new_box == self.nodes[node].bounding_box {
            return;
        }
        self.nodes[node].bounding_box = new_box;
        self.rederive_leaf_lights(node);
        self.propagate_box_upward(node);
    }

    /// Split an overfull leaf, recursing into overfull children
    pub fn split(&mut self, leaf: BvhNodeKey) -> SplitOutcome {
        let node = &self.nodes[leaf];
        if node.entities.len() <= self.settings.max_entity_per_node {
            return SplitOutcome::NotNeeded;
        }
        if node.depth >= self.settings.max_depth {
            crate::engine_warn!(
                "prism3d::Bvh",
                "Leaf at max depth {} holds {} entities",
                node.depth,
                node.entities.len()
            );
            return SplitOutcome::DepthLimited;
        }
        if node.bounding_box.longest_extent() <= self.settings.min_node_size {
            crate::engine_trace!(
                "prism3d::Bvh",
                "Leaf kept oversized ({} entities, extent {})",
                node.entities.len(),
                node.bounding_box.longest_extent()
            );
            return SplitOutcome::TooSmall;
        }

        let axis = node.bounding_box.longest_axis();
        let depth = node.depth;
        let mut members: Vec<(EntityKey, BoundingBox)> = node
            .entities
            .iter()
            .filter_map(|e| self.entity_locations.get(e).map(|(_, bb)| (*e, *bb)))
            .collect();
        members.sort_by(|a, b| a.1.center()[axis].total_cmp(&b.1.center()[axis]));
        let right_members = members.split_off(members.len() / 2);

        let left = self.create_leaf(leaf, depth + 1, &members);
        let right = self.create_leaf(leaf, depth + 1, &right_members);

        let parent = &mut self.nodes[leaf];
        parent.entities.clear();
        parent.left = Some(left);
        parent.right = Some(right);
        self.reassign_lights_from_parent(leaf);

        crate::engine_trace!(
            "prism3d::Bvh",
            "Split leaf at depth {} on axis {} ({} / {})",
            depth,
            axis,
            members.len(),
            right_members.len()
        );

        let left_outcome = self.split(left);
        let right_outcome = self.split(right);
        if left_outcome == SplitOutcome::DepthLimited || right_outcome == SplitOutcome::DepthLimited {
            SplitOutcome::DepthLimited
        } else {
            SplitOutcome::Split
        }
    }

    /// Hand a node's lights down to the children they touch
    ///
    /// Walks the subtree so that after a structural change only leaves
    /// hold light references.
    pub fn reassign_lights_from_parent(&mut self, node: BvhNodeKey) {
        let Some((left, right)) = self.nodes[node].children() else {
            return;
        };
        let lights = std::mem::take(&mut self.nodes[node].lights);

        for child in [left, right] {
            let child_box = self.nodes[child].bounding_box;
            let inherited: Vec<LightKey> = lights
                .iter()
                .copied()
                .filter(|l| {
                    self.light_volumes
                        .get(l)
                        .is_some_and(|v| !child_box.is_empty() && v.touches(&child_box))
                })
                .collect();
            let child_node = &mut self.nodes[child];
            for l in inherited {
                if !child_node.lights.contains(&l) {
                    child_node.lights.push(l);
                }
            }
            self.reassign_lights_from_parent(child);
        }
    }

    /// Perform scheduled merges and free detached nodes
    ///
    /// Two sibling leaves merge into their parent when their combined count
    /// fits in one leaf, or when one of them is empty. An empty leaf next
    /// to an internal sibling is dropped and the sibling's children move up.
    /// Merging cascades toward the root. Leaves that end up overfull above
    /// the depth limit (a depth-limited leaf merged or moved up) are split
    /// again.
    pub fn clean(&mut self) {
        let mut worklist = std::mem::take(&mut self.merge_candidates);
        let mut merges = 0usize;

        while let Some(parent) = worklist.pop() {
            let Some(node) = self.nodes.get(parent) else {
                continue;
            };
            let Some((l, r)) = node.children() else {
                continue;
            };
            let (ln, rn) = (&self.nodes[l], &self.nodes[r]);

            match (ln.is_leaf(), rn.is_leaf()) {
                (true, true) => {
                    let combined = ln.entities.len() + rn.entities.len();
                    if combined <= self.settings.max_entity_per_node
                        || ln.entities.is_empty()
                        || rn.entities.is_empty()
                    {
                        self.merge_children(parent, l, r);
                        merges += 1;
                        self.split(parent);
                        if let Some(grand_parent) = self.nodes[parent].parent {
                            worklist.push(grand_parent);
                        }
                    }
                }
                (true, false) if ln.entities.is_empty() => {
                    self.promote_children(parent, r, l);
                    self.split_overfull_leaves(parent);
                    worklist.push(parent);
                }
                (false, true) if rn.entities.is_empty() => {
                    self.promote_children(parent, l, r);
                    self.split_overfull_leaves(parent);
                    worklist.push(parent);
                }
                _ => {}
            }
        }

        let freed = self.nodes_to_delete.len();
        for key in self.nodes_to_delete.drain(..) {
            self.nodes.remove(key);
        }

        if merges > 0 || freed > 0 {
            crate::engine_debug!(
                "prism3d::Bvh",
                "Clean: {} merges, {} nodes freed",
                merges,
                freed
            );
        }
    }

    /// Drop everything; the tree becomes a single empty leaf
    pub fn clear(&mut self) {
        self.nodes.clear();
        self.root = self.nodes.insert(BvhNode::leaf(None, 0));
        self.entity_locations.clear();
        self.light_volumes.clear();
        self.light_order.clear();
        self.merge_candidates.clear();
        self.nodes_to_delete.clear();
    }

    /// Build the tree top-down from scratch
    ///
    /// All entities start in the root which is then split recursively;
    /// lights are registered before splitting so they flow down with it.
    /// Returns true if some leaf ended up overfull at the depth limit.
    pub fn rebuild(
        &mut self,
        entities: &[(EntityKey, BoundingBox)],
        lights: &[(LightKey, LightVolume)],
    ) -> bool {
        self.clear();
        let root = self.root;

        let mut root_box = BoundingBox::EMPTY;
        for (entity, bb) in entities {
            if self.entity_locations.insert(*entity, (root, *bb)).is_none() {
                self.nodes[root].entities.push(*entity);
            }
            root_box.expand_to_box(bb);
        }
        self.nodes[root].bounding_box = root_box;

        for (light, volume) in lights {
            if matches!(volume, LightVolume::Global) || self.light_volumes.contains_key(light) {
                continue;
            }
            self.light_volumes.insert(*light, *volume);
            self.light_order.push(*light);
        }
        self.rederive_leaf_lights(root);

        self.split(root) == SplitOutcome::DepthLimited
    }

    // ===== QUERIES =====

    /// Visit every entity whose box is not outside the frustum
    ///
    /// Subtrees whose box is fully inside are accepted without further
    /// tests and report `Inside` for all their entities.
    pub fn visit_frustum<F>(&self, frustum: &Frustum, mut visit: F)
    where
        F: FnMut(EntityKey, &BoundingBox, IntersectResult),
    {
        // (node, parent already fully inside)
        let mut stack = vec![(self.root, false)];

        while let Some((key, parent_inside)) = stack.pop() {
            let node = &self.nodes[key];
            if node.bounding_box.is_empty() {
                continue;
            }

            let inside = if parent_inside {
                true
            } else {
                match frustum_box_intersection(frustum, &node.bounding_box) {
                    IntersectResult::Outside => continue,
                    IntersectResult::Inside => true,
                    IntersectResult::Intersect => false,
                }
            };

            match node.children() {
                Some((l, r)) => {
                    stack.push((r, inside));
                    stack.push((l, inside));
                }
                None => {
                    for entity in &node.entities {
                        let Some((_, bb)) = self.entity_locations.get(entity) else {
                            continue;
                        };
                        let result = if inside {
                            IntersectResult::Inside
                        } else {
                            frustum_box_intersection(frustum, bb)
                        };
                        if result != IntersectResult::Outside {
                            visit(*entity, bb, result);
                        }
                    }
                }
            }
        }
    }

    /// Visit every entity in a leaf whose box the ray hits
    pub fn visit_ray<F>(&self, ray: &Ray, mut visit: F)
    where
        F: FnMut(EntityKey, &BoundingBox),
    {
        let mut stack = vec![self.root];
        while let Some(key) = stack.pop() {
            let node = &self.nodes[key];
            if node.bounding_box.is_empty() {
                continue;
            }
            let (hit, _) = ray_box_intersection(ray, &node.bounding_box);
            if !hit {
                continue;
            }
            match node.children() {
                Some((l, r)) => {
                    stack.push(r);
                    stack.push(l);
                }
                None => {
                    for entity in &node.entities {
                        if let Some((_, bb)) = self.entity_locations.get(entity) {
                            visit(*entity, bb);
                        }
                    }
                }
            }
        }
    }

    // ===== INVARIANTS =====

    /// Describe the first structural invariant violation, if any
    ///
    /// Meaningful after `clean()`.
    pub fn find_invariant_violation(&self) -> Option<String> {
        let mut seen: FxHashMap<EntityKey, BvhNodeKey> = FxHashMap::default();
        let mut stack = vec![self.root];

        while let Some(key) = stack.pop() {
            let node = &self.nodes[key];
            if node.depth > self.settings.max_depth {
                return Some(format!("node at depth {} exceeds max depth", node.depth));
            }

            if let Some((l, r)) = node.children() {
                if !node.entities.is_empty() || !node.lights.is_empty() {
                    return Some("internal node holds entity or light references".to_string());
                }
                for child in [l, r] {
                    let c = &self.nodes[child];
                    if c.parent != Some(key) {
                        return Some("child parent link is broken".to_string());
                    }
                    if c.depth != node.depth + 1 {
                        return Some("child depth is not parent depth + 1".to_string());
                    }
                    if !c.bounding_box.is_empty() && !node.bounding_box.contains(&c.bounding_box) {
                        return Some("parent box does not contain child box".to_string());
                    }
                    stack.push(child);
                }
                continue;
            }
            if node.left.is_some() || node.right.is_some() {
                return Some("node has exactly one child".to_string());
            }

            let overfull = node.entities.len() > self.settings.max_entity_per_node;
            if overfull
                && node.bounding_box.longest_extent() > self.settings.min_node_size
                && node.depth < self.settings.max_depth
            {
                return Some(format!("leaf holds {} entities", node.entities.len()));
            }

            for entity in &node.entities {
                if seen.insert(*entity, key).is_some() {
                    return Some("entity registered in two leaves".to_string());
                }
                match self.entity_locations.get(entity) {
                    Some((leaf, bb)) => {
                        if *leaf != key {
                            return Some("entity location points at another leaf".to_string());
                        }
                        if !node.bounding_box.contains(bb) {
                            return Some("leaf box does not contain entity box".to_string());
                        }
                    }
                    None => return Some("leaf references an unknown entity".to_string()),
                }
            }
        }

        if seen.len() != self.entity_locations.len() {
            return Some("indexed entity is not reachable from the root".to_string());
        }
        None
    }

    /// Assert the structural invariants (debug builds only)
    pub fn sanity_check(&self) {
        if let Some(violation) = self.find_invariant_violation() {
            debug_assert!(false, "BVH invariant violated: {}", violation);
        }
    }

    // ===== INTERNAL HELPERS =====

    fn create_leaf(
        &mut self,
        parent: BvhNodeKey,
        depth: u32,
        members: &[(EntityKey, BoundingBox)],
    ) -> BvhNodeKey {
        let mut node = BvhNode::leaf(Some(parent), depth);
        for (entity, bb) in members {
            node.entities.push(*entity);
            node.bounding_box.expand_to_box(bb);
        }
        let key = self.nodes.insert(node);
        for (entity, _) in members {
            if let Some(location) = self.entity_locations.get_mut(entity) {
                location.0 = key;
            }
        }
        key
    }

    fn find_insertion_leaf(&self, bb: &BoundingBox) -> BvhNodeKey {
        let mut key = self.root;
        while let Some((l, r)) = self.nodes[key].children() {
            key = self.choose_child(l, r, bb);
        }
        key
    }

    fn choose_child(&self, left: BvhNodeKey, right: BvhNodeKey, bb: &BoundingBox) -> BvhNodeKey {
        let lb = &self.nodes[left].bounding_box;
        let rb = &self.nodes[right].bounding_box;

        match (lb.contains(bb), rb.contains(bb)) {
            (true, false) => return left,
            (false, true) => return right,
            (true, true) => return if rb.volume() < lb.volume() { right } else { left },
            (false, false) => {}
        }

        let left_growth = lb.union(bb).volume() - lb.volume();
        let right_growth = rb.union(bb).volume() - rb.volume();
        if right_growth < left_growth {
            return right;
        }
        if left_growth < right_growth {
            return left;
        }

        // Flat boxes grow by zero volume; fall back to proximity
        let c = bb.center();
        let left_distance = if lb.is_empty() { f32::MAX } else { lb.center().distance_squared(c) };
        let right_distance = if rb.is_empty() { f32::MAX } else { rb.center().distance_squared(c) };
        if right_distance < left_distance {
            right
        } else {
            left
        }
    }

    fn propagate_box_upward(&mut self, from: BvhNodeKey) {
        let mut current = self.nodes[from].parent;
        while let Some(key) = current {
            let Some((l, r)) = self.nodes[key].children() else {
                break;
            };
            let merged = self.nodes[l].bounding_box.union(&self.nodes[r].bounding_box);
            if merged == self.nodes[key].bounding_box {
                break;
            }
            self.nodes[key].bounding_box = merged;
            current = self.nodes[key].parent;
        }
    }

    /// Rebuild a leaf's light list from all indexed lights, in registration order
    fn rederive_leaf_lights(&mut self, leaf: BvhNodeKey) {
        if !self.nodes[leaf].is_leaf() {
            return;
        }
        let bb = self.nodes[leaf].bounding_box;
        let lights: Vec<LightKey> = if bb.is_empty() {
            Vec::new()
        } else {
            self.light_order
                .iter()
                .copied()
                .filter(|l| self.light_volumes.get(l).is_some_and(|v| v.touches(&bb)))
                .collect()
        };
        self.nodes[leaf].lights = lights;
    }

    fn leaves_touching(&self, volume: &LightVolume) -> Vec<BvhNodeKey> {
        let mut leaves = Vec::new();
        let mut stack = vec![self.root];
        while let Some(key) = stack.pop() {
            let node = &self.nodes[key];
            if node.bounding_box.is_empty() || !volume.touches(&node.bounding_box) {
                continue;
            }
            match node.children() {
                Some((l, r)) => {
                    stack.push(r);
                    stack.push(l);
                }
                None => leaves.push(key),
            }
        }
        leaves
    }

    fn merge_children(&mut self, parent: BvhNodeKey, left: BvhNodeKey, right: BvhNodeKey) {
        let mut entities = std::mem::take(&mut self.nodes[left].entities);
        entities.append(&mut self.nodes[right].entities);
        for entity in &entities {
            if let Some(location) = self.entity_locations.get_mut(entity) {
                location.0 = parent;
            }
        }

        let node = &mut self.nodes[parent];
        node.entities = entities;
        node.left = None;
        node.right = None;
        self.nodes_to_delete.push(left);
        self.nodes_to_delete.push(right);

        let before = self.nodes[parent].bounding_box;
        self.update_leaf(parent, false);
        if self.nodes[parent].bounding_box == before {
            self.rederive_leaf_lights(parent);
        }
    }

    /// Replace `parent`'s children with those of `keep`, dropping `empty`
    fn promote_children(&mut self, parent: BvhNodeKey, keep: BvhNodeKey, empty: BvhNodeKey) {
        let Some((kl, kr)) = self.nodes[keep].children() else {
            return;
        };
        let keep_box = self.nodes[keep].bounding_box;

        let node = &mut self.nodes[parent];
        node.left = Some(kl);
        node.right = Some(kr);
        node.bounding_box = keep_box;
        self.nodes[kl].parent = Some(parent);
        self.nodes[kr].parent = Some(parent);
        self.shift_depth(kl);
        self.shift_depth(kr);

        self.nodes_to_delete.push(keep);
        self.nodes_to_delete.push(empty);
    }

    /// Split every overfull leaf below `root`
    fn split_overfull_leaves(&mut self, root: BvhNodeKey) {
        let mut overfull = Vec::new();
        let mut stack = vec![root];
        while let Some(key) = stack.pop() {
            let node = &self.nodes[key];
            match node.children() {
                Some((l, r)) => {
                    stack.push(l);
                    stack.push(r);
                }
                None if node.entities.len() > self.settings.max_entity_per_node => overfull.push(key),
                None => {}
            }
        }
        for leaf in overfull {
            self.split(leaf);
        }
    }

    /// Decrease the depth of a whole subtree by one
    fn shift_depth(&mut self, root: BvhNodeKey) {
        let mut stack = vec![root];
        while let Some(key) = stack.pop() {
            let node = &mut self.nodes[key];
            node.depth = node.depth.saturating_sub(1);
            if let Some((l, r)) = node.children() {
                stack.push(l);
                stack.push(r);
            }
        }
    }
}

#[cfg(test)]
#[path = "bvh_tree_tests.rs"]
mod tests;
