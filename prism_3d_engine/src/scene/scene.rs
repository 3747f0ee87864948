/// Scene — entity and light storage with its BVH
///
/// Entities and lights live in slot maps; their keys stay valid until
/// removal and are what the BVH and render jobs refer to. Every edit made
/// through `Scene` queues the matching BVH change; `update()` applies them.

use slotmap::{new_key_type, SlotMap};
use crate::bvh::{Bvh, BvhMutator, BvhUpdateStats, PickData};
use crate::camera::Frustum;
use crate::error::Result;
use crate::math::Ray;
use crate::settings::BvhSettings;
use super::entity::Entity;
use super::light::Light;

new_key_type! {
    /// Stable key of an entity in a scene.
    pub struct EntityKey;
    /// Stable key of a light in a scene.
    pub struct LightKey;
}

/// Entity and light storage, without indexing
#[derive(Debug, Default)]
pub struct SceneData {
    entities: SlotMap<EntityKey, Entity>,
    lights: SlotMap<LightKey, Light>,
}

impl SceneData {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn entity(&self, key: EntityKey) -> Option<&Entity> {
        self.entities.get(key)
    }

    pub fn entity_mut(&mut self, key: EntityKey) -> Option<&mut Entity> {
        self.entities.get_mut(key)
    }

    pub fn light(&self, key: LightKey) -> Option<&Light> {
        self.lights.get(key)
    }

    pub fn light_mut(&mut self, key: LightKey) -> Option<&mut Light> {
        self.lights.get_mut(key)
    }

    pub fn entities(&self) -> impl Iterator<Item = (EntityKey, &Entity)> {
        self.entities.iter()
    }

    pub fn lights(&self) -> impl Iterator<Item = (LightKey, &Light)> {
        self.lights.iter()
    }

    pub fn lights_mut(&mut self) -> impl Iterator<Item = (LightKey, &mut Light)> {
        self.lights.iter_mut()
    }

    pub fn entity_count(&self) -> usize {
        self.entities.len()
    }

    pub fn light_count(&self) -> usize {
        self.lights.len()
    }

    pub fn insert_entity(&mut self, entity: Entity) -> EntityKey {
        self.entities.insert(entity)
    }

    pub fn remove_entity(&mut self, key: EntityKey) -> Option<Entity> {
        self.entities.remove(key)
    }

    pub fn insert_light(&mut self, light: Light) -> LightKey {
        self.lights.insert(light)
    }

    pub fn remove_light(&mut self, key: LightKey) -> Option<Light> {
        self.lights.remove(key)
    }
}

pub struct Scene {
    data: SceneData,
    bvh: Bvh,
}

impl Scene {
    /// Empty scene using the engine-wide BVH settings
    pub fn new() -> Self {
        Self {
            data: SceneData::new(),
            bvh: Bvh::default(),
        }
    }

    pub fn with_settings(settings: BvhSettings) -> Self {
        Self {
            data: SceneData::new(),
            bvh: Bvh::new(settings),
        }
    }

    // ===== ACCESSORS =====

    pub fn data(&self) -> &SceneData {
        &self.data
    }

    pub fn bvh(&self) -> &Bvh {
        &self.bvh
    }

    /// Handle for queueing BVH changes from other threads
    pub fn bvh_mutator(&self) -> BvhMutator {
        self.bvh.mutator()
    }

    pub fn entity(&self, key: EntityKey) -> Option<&Entity> {
        self.data.entity(key)
    }

    pub fn light(&self, key: LightKey) -> Option<&Light> {
        self.data.light(key)
    }

    pub fn entities(&self) -> impl Iterator<Item = (EntityKey, &Entity)> {
        self.data.entities()
    }

    pub fn lights(&self) -> impl Iterator<Item = (LightKey, &Light)> {
        self.data.lights()
    }

    // ===== ENTITIES =====

    pub fn add_entity(&mut self, entity: Entity) -> EntityKey {
        let key = self.data.insert_entity(entity);
        self.bvh.add_entity(key);
        key
    }

    pub fn remove_entity(&mut self, key: EntityKey) -> Option<Entity> {
        let entity = self.data.remove_entity(key)?;
        self.bvh.remove_entity(key);
        Some(entity)
    }

    /// Edit an entity; the BVH picks up the change at the next `update()`
    pub fn modify_entity<R>(&mut self, key: EntityKey, edit: impl FnOnce(&mut Entity) -> R) -> Option<R> {
        let entity = self.data.entity_mut(key)?;
        let result = edit(entity);
        self.bvh.update_entity(key);
        Some(result)
    }

    pub fn set_entity_transform(&mut self, key: EntityKey, world_transform: glam::Mat4) -> bool {
        self.modify_entity(key, |e| e.set_world_transform(world_transform)).is_some()
    }

    // ===== LIGHTS =====

    pub fn add_light(&mut self, light: Light) -> LightKey {
        let key = self.data.insert_light(light);
        self.bvh.add_light(key);
        key
    }

    pub fn remove_light(&mut self, key: LightKey) -> Option<Light> {
        let light = self.data.remove_light(key)?;
        self.bvh.remove_light(key);
        Some(light)
    }

    /// Edit a light; the BVH picks up the change at the next `update()`
    pub fn modify_light<R>(&mut self, key: LightKey, edit: impl FnOnce(&mut Light) -> R) -> Option<R> {
        let light = self.data.light_mut(key)?;
        let result = edit(light);
        self.bvh.update_light(key);
        Some(result)
    }

    /// Storage access for renderer-side state (shadow cameras, atlas slots)
    ///
    /// Edits made here are not seen by the BVH.
    pub(crate) fn data_mut(&mut self) -> &mut SceneData {
        &mut self.data
    }

    // ===== BVH =====

    /// Apply queued changes to the BVH
    pub fn update(&mut self) -> BvhUpdateStats {
        self.bvh.update(&self.data)
    }

    pub fn rebuild_bvh(&mut self) {
        self.bvh.rebuild(&self.data);
    }

    /// Change the BVH parameters and rebuild
    pub fn set_bvh_parameters(&mut self, settings: BvhSettings) -> Result<()> {
        self.bvh.set_parameters(settings)?;
        self.bvh.rebuild(&self.data);
        Ok(())
    }

    pub fn frustum_query(&self, frustum: &Frustum) -> Vec<EntityKey> {
        self.bvh.frustum_query(frustum)
    }

    pub fn pick_object(&self, ray: &Ray, ignore: &[EntityKey]) -> Option<PickData> {
        self.bvh.pick_object(&self.data, ray, ignore)
    }

    pub fn pick_objects(
        &self,
        frustum: &Frustum,
        ignore: &[EntityKey],
        extra: &[EntityKey],
        pick_partially_inside: bool,
    ) -> Vec<PickData> {
        self.bvh.pick_objects(&self.data, frustum, ignore, extra, pick_partially_inside)
    }
}

impl Default for Scene {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
#[path = "scene_tests.rs"]
mod tests;
