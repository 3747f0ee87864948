/// Render jobs - per-frame draw units and the processing applied to them
///
/// A `RenderJob` pairs one sub-mesh of an entity with its resolved
/// material, world transform, box, shadow flag and selected lights. Jobs
/// are rebuilt every frame and dropped at the end of it.

use std::sync::Arc;
use glam::Mat4;
use crate::bvh::Bvh;
use crate::camera::Camera;
use crate::math::{frustum_box_intersection, BoundingBox, IntersectResult};
use crate::scene::{EntityKey, LightKey, Material, Mesh, SceneData};
use super::light_culling::{select_lights, select_lights_from_scene};

#[derive(Debug, Clone)]
pub struct RenderJob {
    pub entity: EntityKey,
    pub sub_mesh_index: usize,
    pub mesh: Arc<Mesh>,
    pub material: Arc<Material>,
    pub world_transform: Mat4,
    /// World box of the entity
    pub bounding_box: BoundingBox,
    pub shadow_caster: bool,
    /// Filled by `RenderJobProcessor::assign_lights`
    pub lights: Vec<LightKey>,
}

impl RenderJob {
    pub fn is_translucent(&self) -> bool {
        self.material.is_translucent()
    }
}

/// Jobs split by how they are drawn
#[derive(Debug, Clone, Default)]
pub struct SeparatedJobs {
    pub opaque: Vec<RenderJob>,
    pub translucent: Vec<RenderJob>,
    /// Opaque jobs whose material opted out of the forward path
    pub deferred: Vec<RenderJob>,
}

/// Stateless job helpers
pub struct RenderJobProcessor;

impl RenderJobProcessor {
    /// One job per sub-mesh of every visible, drawable entity in `keys`
    ///
    /// Material resolution: entity override, then the entity's per-sub-mesh
    /// list, then the sub-mesh material, then the shared default.
    pub fn create_render_jobs(scene: &SceneData, keys: &[EntityKey]) -> Vec<RenderJob> {
        let mut jobs = Vec::new();

        for &key in keys {
            let Some(entity) = scene.entity(key) else {
                continue;
            };
            if !entity.is_visible() || !entity.is_drawable() {
                continue;
            }
            let Some(mesh) = entity.mesh() else {
                continue;
            };

            let bounding_box = entity.world_bounding_box();
            for (index, sub_mesh) in mesh.sub_meshes().iter().enumerate() {
                let material = entity
                    .material_override()
                    .or_else(|| entity.sub_mesh_material(index))
                    .or_else(|| sub_mesh.material())
                    .cloned()
                    .unwrap_or_else(Material::shared_default);

                jobs.push(RenderJob {
                    entity: key,
                    sub_mesh_index: index,
                    mesh: Arc::clone(mesh),
                    material,
                    world_transform: *entity.world_transform(),
                    bounding_box,
                    shadow_caster: entity.casts_shadow(),
                    lights: Vec::new(),
                });
            }
        }

        jobs
    }

    /// Jobs for every entity of the scene
    pub fn create_all_render_jobs(scene: &SceneData) -> Vec<RenderJob> {
        let keys: Vec<EntityKey> = scene.entities().map(|(key, _)| key).collect();
        Self::create_render_jobs(scene, &keys)
    }

    /// Split jobs into opaque, translucent and deferred buckets (order kept)
    pub fn separate_opaque_translucent(jobs: Vec<RenderJob>) -> SeparatedJobs {
        let mut separated = SeparatedJobs::default();
        for job in jobs {
            let state = job.material.render_state();
            if state.is_translucent() {
                separated.translucent.push(job);
            } else if state.use_forward_path {
                separated.opaque.push(job);
            } else {
                separated.deferred.push(job);
            }
        }
        separated
    }

    /// Stable back-to-front sort
    ///
    /// Perspective: farthest box center first. Orthographic: ascending
    /// world translation z.
    pub fn stable_sort_by_distance_to_camera(jobs: &mut [RenderJob], camera: &Camera) {
        if camera.is_orthographic() {
            jobs.sort_by(|a, b| a.world_transform.w_axis.z.total_cmp(&b.world_transform.w_axis.z));
        } else {
            let eye = camera.position();
            jobs.sort_by(|a, b| {
                let da = a.bounding_box.center().distance_squared(eye);
                let db = b.bounding_box.center().distance_squared(eye);
                db.total_cmp(&da)
            });
        }
    }

    /// Stable sort, highest material priority first
    pub fn stable_sort_by_material_priority(jobs: &mut [RenderJob]) {
        jobs.sort_by(|a, b| {
            b.material
                .render_state()
                .priority
                .cmp(&a.material.render_state().priority)
        });
    }

    /// Translucent draw order: by distance, then by priority
    pub fn sort_translucent(jobs: &mut [RenderJob], camera: &Camera) {
        Self::stable_sort_by_distance_to_camera(jobs, camera);
        Self::stable_sort_by_material_priority(jobs);
    }

    /// Drop jobs whose box is outside the camera frustum
    pub fn frustum_cull(jobs: &mut Vec<RenderJob>, camera: &Camera) {
        let frustum = camera.frustum();
        jobs.retain(|job| frustum_box_intersection(frustum, &job.bounding_box) != IntersectResult::Outside);
    }

    /// Drop jobs that do not cast shadows
    pub fn drop_non_casters(jobs: &mut Vec<RenderJob>) {
        jobs.retain(|job| job.shadow_caster);
    }

    /// Box covering every job
    pub fn bounding_box(jobs: &[RenderJob]) -> BoundingBox {
        jobs.iter()
            .fold(BoundingBox::EMPTY, |acc, job| acc.union(&job.bounding_box))
    }

    /// Select lights for every job
    ///
    /// Indexed entities take their candidates from their BVH leaf; others
    /// test every scene light.
    pub fn assign_lights(jobs: &mut [RenderJob], scene: &SceneData, bvh: &Bvh) {
        for job in jobs.iter_mut() {
            job.lights = if bvh.tree().contains_entity(job.entity) {
                select_lights(scene, &job.bounding_box, bvh.lights_near(job.entity))
            } else {
                select_lights_from_scene(scene, &job.bounding_box)
            };
        }
    }
}

#[cfg(test)]
#[path = "render_job_tests.rs"]
mod tests;
