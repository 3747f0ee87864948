/// Entity — a placed, optionally drawable mesh instance

use std::sync::Arc;
use bitflags::bitflags;
use glam::{Mat4, Vec3};
use crate::engine::Engine;
use crate::math::{skin_position, BoundingBox};
use super::material::Material;
use super::mesh::{Mesh, Skeleton};

/// Skinned meshes with more vertices than this go through the worker pool
const PARALLEL_SKINNING_THRESHOLD: usize = 4096;

/// Vertices per worker task when skinning in parallel
const SKINNING_CHUNK_SIZE: usize = 1024;

bitflags! {
    /// Entity state flags
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
    pub struct EntityFlags: u32 {
        /// Drawn by the forward pass
        const VISIBLE     = 1 << 0;
        /// Rendered into shadow maps
        const CAST_SHADOW = 1 << 1;
        /// Produces render jobs at all (cleared for helpers and markers)
        const DRAWABLE    = 1 << 2;
    }
}

impl Default for EntityFlags {
    fn default() -> Self {
        EntityFlags::VISIBLE | EntityFlags::CAST_SHADOW | EntityFlags::DRAWABLE
    }
}

#[derive(Debug, Clone)]
pub struct Entity {
    name: String,
    world_transform: Mat4,
    mesh: Option<Arc<Mesh>>,
    material_override: Option<Arc<Material>>,
    sub_mesh_materials: Vec<Option<Arc<Material>>>,
    skeleton: Option<Skeleton>,
    flags: EntityFlags,
    bounding_box_override: Option<BoundingBox>,
}

impl Entity {
    /// Entity without mesh at the origin
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            world_transform: Mat4::IDENTITY,
            mesh: None,
            material_override: None,
            sub_mesh_materials: Vec::new(),
            skeleton: None,
            flags: EntityFlags::default(),
            bounding_box_override: None,
        }
    }

    /// Entity drawing `mesh` with the given world transform
    pub fn with_mesh(name: impl Into<String>, mesh: Arc<Mesh>, world_transform: Mat4) -> Self {
        let mut entity = Self::new(name);
        entity.mesh = Some(mesh);
        entity.world_transform = world_transform;
        entity
    }

    // ===== ACCESSORS =====

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn world_transform(&self) -> &Mat4 {
        &self.world_transform
    }

    pub fn position(&self) -> Vec3 {
        self.world_transform.w_axis.truncate()
    }

    pub fn mesh(&self) -> Option<&Arc<Mesh>> {
        self.mesh.as_ref()
    }

    pub fn material_override(&self) -> Option<&Arc<Material>> {
        self.material_override.as_ref()
    }

    /// Per-sub-mesh material, if one was assigned for `index`
    pub fn sub_mesh_material(&self, index: usize) -> Option<&Arc<Material>> {
        self.sub_mesh_materials.get(index).and_then(|m| m.as_ref())
    }

    pub fn skeleton(&self) -> Option<&Skeleton> {
        self.skeleton.as_ref()
    }

    pub fn skeleton_mut(&mut self) -> Option<&mut Skeleton> {
        self.skeleton.as_mut()
    }

    pub fn flags(&self) -> EntityFlags {
        self.flags
    }

    pub fn is_visible(&self) -> bool {
        self.flags.contains(EntityFlags::VISIBLE)
    }

    pub fn casts_shadow(&self) -> bool {
        self.flags.contains(EntityFlags::CAST_SHADOW)
    }

    /// True if the entity produces render jobs
    pub fn is_drawable(&self) -> bool {
        self.flags.contains(EntityFlags::DRAWABLE) && self.mesh.is_some()
    }

    /// Skinning matrices when both a skeleton and skinned geometry are present
    pub fn bone_matrices(&self) -> Option<&[Mat4]> {
        match (&self.skeleton, &self.mesh) {
            (Some(skeleton), Some(mesh)) if mesh.is_skinned() => Some(skeleton.bone_matrices()),
            _ => None,
        }
    }

    // ===== SETTERS =====

    pub fn set_world_transform(&mut self, world_transform: Mat4) {
        self.world_transform = world_transform;
    }

    pub fn set_mesh(&mut self, mesh: Option<Arc<Mesh>>) {
        self.mesh = mesh;
    }

    /// Single material used for every sub-mesh
    pub fn set_material_override(&mut self, material: Option<Arc<Material>>) {
        self.material_override = material;
    }

    /// Materials indexed by sub-mesh
    pub fn set_sub_mesh_materials(&mut self, materials: Vec<Option<Arc<Material>>>) {
        self.sub_mesh_materials = materials;
    }

    pub fn set_skeleton(&mut self, skeleton: Option<Skeleton>) {
        self.skeleton = skeleton;
    }

    pub fn set_flags(&mut self, flags: EntityFlags) {
        self.flags = flags;
    }

    pub fn set_flag(&mut self, flag: EntityFlags, enabled: bool) {
        self.flags.set(flag, enabled);
    }

    /// Replace the mesh box with a fixed local-space box
    pub fn set_bounding_box_override(&mut self, bounding_box: Option<BoundingBox>) {
        self.bounding_box_override = bounding_box;
    }

    // ===== BOUNDS =====

    /// Local-space box: override, posed skinned box, or mesh box
    pub fn local_bounding_box(&self) -> BoundingBox {
        if let Some(bb) = self.bounding_box_override {
            return bb;
        }
        let Some(mesh) = &self.mesh else {
            return BoundingBox::EMPTY;
        };
        match self.bone_matrices() {
            Some(bones) => skinned_bounding_box(mesh, bones),
            None => mesh.bounding_box(),
        }
    }

    /// World-space box of the local box
    pub fn world_bounding_box(&self) -> BoundingBox {
        self.local_bounding_box().transformed(&self.world_transform)
    }
}

/// Box around the posed vertices of every skinned sub-mesh
///
/// Sub-meshes without CPU data or skin keep their bind-pose box. Large
/// vertex sets are skinned on the engine worker pool; if the pool is not
/// available the work is done on the calling thread.
fn skinned_bounding_box(mesh: &Mesh, bones: &[Mat4]) -> BoundingBox {
    let mut bb = BoundingBox::EMPTY;

    for sub_mesh in mesh.sub_meshes() {
        let (Some(positions), Some(skin)) = (sub_mesh.positions(), sub_mesh.skin()) else {
            bb.expand_to_box(sub_mesh.bounding_box());
            continue;
        };

        let count = positions.len().min(skin.len());
        let skin_range = |range: std::ops::Range<usize>| -> BoundingBox {
            BoundingBox::from_points(range.map(|i| skin_position(positions[i], &skin[i], bones)))
        };

        let posed = if count > PARALLEL_SKINNING_THRESHOLD {
            match Engine::worker_pool() {
                Ok(pool) => {
                    let starts: Vec<usize> = (0..count).step_by(SKINNING_CHUNK_SIZE).collect();
                    pool.par_map(&starts, |start| {
                        skin_range(*start..(*start + SKINNING_CHUNK_SIZE).min(count))
                    })
                    .iter()
                    .fold(BoundingBox::EMPTY, |acc, part| acc.union(part))
                }
                Err(_) => skin_range(0..count),
            }
        } else {
            skin_range(0..count)
        };

        bb.expand_to_box(&posed);
    }

    bb
}

#[cfg(test)]
#[path = "entity_tests.rs"]
mod tests;
