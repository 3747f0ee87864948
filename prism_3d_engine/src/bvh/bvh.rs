/// Bvh — scene-facing spatial index
///
/// Wraps a `BvhTree` with the mutation queues. Edits are queued through a
/// `BvhMutator` and applied by `update()`, once per frame, in the order
/// removals, additions, updates. Queries run on the tree as it was after
/// the last `update()`.

use glam::Vec3;
use crate::camera::Frustum;
use crate::engine::Engine;
use crate::error::Result;
use crate::math::{
    find_mesh_intersection, frustum_box_intersection, point_on_ray, ray_box_intersection,
    BoundingBox, IntersectResult, MeshIntersection, Ray,
};
use crate::scene::{EntityKey, LightKey, LightVolume, SceneData};
use crate::settings::BvhSettings;
use super::bvh_tree::BvhTree;
use super::mutation_queue::{BvhItem, BvhMutator};

/// Result of a pick query
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PickData {
    pub entity: EntityKey,
    /// Hit point for ray picks, entity position for frustum picks
    pub position: Vec3,
}

/// Counters of one `update()` call
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct BvhUpdateStats {
    pub removed: usize,
    pub added: usize,
    pub updated: usize,
    pub rebuilt: bool,
}

pub struct Bvh {
    tree: BvhTree,
    mutator: BvhMutator,
}

impl Bvh {
    pub fn new(settings: BvhSettings) -> Self {
        Self {
            tree: BvhTree::new(settings),
            mutator: BvhMutator::default(),
        }
    }

    // ===== ACCESSORS =====

    pub fn tree(&self) -> &BvhTree {
        &self.tree
    }

    pub fn settings(&self) -> &BvhSettings {
        self.tree.settings()
    }

    /// Handle for queueing changes from other threads
    pub fn mutator(&self) -> BvhMutator {
        self.mutator.clone()
    }

    /// Replace the tree parameters
    ///
    /// The current tree keeps its shape; call `rebuild()` to apply them.
    pub fn set_parameters(&mut self, settings: BvhSettings) -> Result<()> {
        settings.validate()?;
        self.tree.set_settings(settings);
        Ok(())
    }

    // ===== QUEUEING =====

    pub fn add_entity(&self, entity: EntityKey) {
        self.mutator.add_entity(entity);
    }

    pub fn remove_entity(&self, entity: EntityKey) {
        self.mutator.remove_entity(entity);
    }

    pub fn update_entity(&self, entity: EntityKey) {
        self.mutator.update_entity(entity);
    }

    pub fn add_light(&self, light: LightKey) {
        self.mutator.add_light(light);
    }

    pub fn remove_light(&self, light: LightKey) {
        self.mutator.remove_light(light);
    }

    pub fn update_light(&self, light: LightKey) {
        self.mutator.update_light(light);
    }

    // ===== FRAME UPDATE =====

    /// Apply every queued change, then merge and free nodes
    ///
    /// Entity boxes and light volumes are read from `scene` now, not when
    /// the change was queued. Entities with an empty world box and
    /// directional lights are not indexed. If an insertion overfilled a
    /// leaf at the depth limit, the tree is rebuilt once at the end.
    pub fn update(&mut self, scene: &SceneData) -> BvhUpdateStats {
        let drained = self.mutator.queues().drain();
        if drained.is_empty() {
            return BvhUpdateStats::default();
        }

        let mut needs_rebuild = false;

        for item in &drained.removed {
            match *item {
                BvhItem::Entity(entity) => {
                    self.tree.remove(entity);
                }
                BvhItem::Light(light) => {
                    self.tree.remove_light(light);
                }
            }
        }

        for item in &drained.added {
            match *item {
                BvhItem::Entity(entity) => {
                    if let Some(bb) = indexed_box(scene, entity) {
                        needs_rebuild |= self.tree.add(entity, bb);
                    }
                }
                BvhItem::Light(light) => {
                    if let Some(volume) = indexed_volume(scene, light) {
                        self.tree.add_light(light, volume);
                    }
                }
            }
        }

        for item in &drained.updated {
            match *item {
                BvhItem::Entity(entity) => match indexed_box(scene, entity) {
                    Some(bb) => needs_rebuild |= self.tree.update_entity(entity, bb),
                    None => {
                        self.tree.remove(entity);
                    }
                },
                BvhItem::Light(light) => match indexed_volume(scene, light) {
                    Some(volume) => self.tree.update_light(light, volume),
                    None => {
                        self.tree.remove_light(light);
                    }
                },
            }
        }

        self.tree.clean();

        crate::engine_debug!(
            "prism3d::Bvh",
            "Applied {} removals, {} additions, {} updates",
            drained.removed.len(),
            drained.added.len(),
            drained.updated.len()
        );

        if needs_rebuild {
            crate::engine_info!(
                "prism3d::Bvh",
                "Leaf overflow at max depth {}, rebuilding",
                self.tree.settings().max_depth
            );
            self.rebuild(scene);
        }

        self.tree.sanity_check();

        BvhUpdateStats {
            removed: drained.removed.len(),
            added: drained.added.len(),
            updated: drained.updated.len(),
            rebuilt: needs_rebuild,
        }
    }

    /// Rebuild the tree from every entity and light of the scene
    ///
    /// Pending queued changes are discarded since the rebuild already
    /// reflects the scene.
    pub fn rebuild(&mut self, scene: &SceneData) {
        self.mutator.queues().drain();

        let entities: Vec<(EntityKey, BoundingBox)> = scene
            .entities()
            .filter_map(|(key, _)| indexed_box(scene, key).map(|bb| (key, bb)))
            .collect();
        let lights: Vec<(LightKey, LightVolume)> = scene
            .lights()
            .filter_map(|(key, _)| indexed_volume(scene, key).map(|v| (key, v)))
            .collect();

        if self.tree.rebuild(&entities, &lights) {
            crate::engine_warn!(
                "prism3d::Bvh",
                "Rebuild left overfull leaves at max depth {}",
                self.tree.settings().max_depth
            );
        }

        crate::engine_info!(
            "prism3d::Bvh",
            "Rebuilt with {} entities, {} lights, {} leaves",
            entities.len(),
            lights.len(),
            self.tree.leaves().len()
        );
    }

    // ===== QUERIES =====

    /// Entities whose box is not outside the frustum
    pub fn frustum_query(&self, frustum: &Frustum) -> Vec<EntityKey> {
        let mut visible = Vec::new();
        self.tree.visit_frustum(frustum, |entity, _, _| visible.push(entity));
        visible
    }

    /// Point and spot lights registered around an entity
    pub fn lights_near(&self, entity: EntityKey) -> &[LightKey] {
        self.tree.lights_near(entity)
    }

    /// Boxes of every leaf
    pub fn debug_leaf_boxes(&self) -> Vec<BoundingBox> {
        self.tree.debug_leaf_boxes()
    }

    /// Closest entity hit by the ray
    ///
    /// Entities are tested against their mesh triangles. Entities without
    /// CPU-side geometry use their box hit distance instead.
    pub fn pick_object(&self, scene: &SceneData, ray: &Ray, ignore: &[EntityKey]) -> Option<PickData> {
        let mut closest: Option<(EntityKey, f32)> = None;

        self.tree.visit_ray(ray, |key, bb| {
            if ignore.contains(&key) {
                return;
            }
            let (hit, box_distance) = ray_box_intersection(ray, bb);
            if !hit {
                return;
            }
            let Some(entity) = scene.entity(key) else {
                return;
            };

            let distance = match find_mesh_intersection(entity, ray) {
                MeshIntersection::Hit { t, .. } => t,
                MeshIntersection::Untraceable => box_distance,
                MeshIntersection::Miss => return,
            };
            if distance > 0.0 && closest.map_or(true, |(_, best)| distance < best) {
                closest = Some((key, distance));
            }
        });

        closest.map(|(entity, t)| PickData {
            entity,
            position: point_on_ray(ray, t),
        })
    }

    /// Entities selected by a frustum (box selection)
    ///
    /// Fully inside entities are always picked; partially inside ones only
    /// with `pick_partially_inside`. `extra` entities are tested as well
    /// even if they are not indexed.
    pub fn pick_objects(
        &self,
        scene: &SceneData,
        frustum: &Frustum,
        ignore: &[EntityKey],
        extra: &[EntityKey],
        pick_partially_inside: bool,
    ) -> Vec<PickData> {
        let accepts = |result: IntersectResult| match result {
            IntersectResult::Inside => true,
            IntersectResult::Intersect => pick_partially_inside,
            IntersectResult::Outside => false,
        };

        let mut picked = Vec::new();
        self.tree.visit_frustum(frustum, |key, _, result| {
            if ignore.contains(&key) || !accepts(result) {
                return;
            }
            if let Some(entity) = scene.entity(key) {
                picked.push(PickData { entity: key, position: entity.position() });
            }
        });

        for &key in extra {
            if ignore.contains(&key) || picked.iter().any(|p| p.entity == key) {
                continue;
            }
            let Some(entity) = scene.entity(key) else {
                continue;
            };
            let bb = entity.world_bounding_box();
            if !bb.is_empty() && accepts(frustum_box_intersection(frustum, &bb)) {
                picked.push(PickData { entity: key, position: entity.position() });
            }
        }

        picked
    }
}

impl Default for Bvh {
    /// Uses the engine-wide BVH settings
    fn default() -> Self {
        Self::new(Engine::settings().bvh)
    }
}

/// World box to index an entity with, if it should be indexed
fn indexed_box(scene: &SceneData, entity: EntityKey) -> Option<BoundingBox> {
    let bb = scene.entity(entity)?.world_bounding_box();
    (!bb.is_empty()).then_some(bb)
}

/// Volume to index a light with; directional lights are not indexed
fn indexed_volume(scene: &SceneData, light: LightKey) -> Option<LightVolume> {
    let light = scene.light(light)?;
    if light.is_directional() {
        return None;
    }
    Some(light.influence())
}

#[cfg(test)]
#[path = "bvh_tests.rs"]
mod tests;
