/// Ray casts against an entity's triangles
///
/// Only sub-meshes that still hold CPU-side vertices are tested. Skinned
/// sub-meshes are posed with the entity's current skeleton before the
/// triangle test, so picks match what is on screen.

use crate::engine::Engine;
use crate::scene::Entity;
use super::geometry::Ray;
use super::intersection::{ray_box_intersection, ray_triangle_intersection};

/// Sub-meshes with more triangles than this are tested on the worker pool
const PARALLEL_TRIANGLE_THRESHOLD: usize = 2048;
const TRIANGLE_CHUNK_SIZE: usize = 512;

/// Outcome of `find_mesh_intersection`
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum MeshIntersection {
    /// Closest hit: sub-mesh index and ray parameter (world ray units)
    Hit { sub_mesh: usize, t: f32 },
    /// Traceable geometry exists but the ray misses it
    Miss,
    /// No sub-mesh retains CPU-side vertices, nothing can be traced
    Untraceable,
}

/// Cast a world-space ray against an entity's mesh
///
/// The ray is moved into the entity's local space without renormalizing,
/// so the returned `t` is valid on the original world ray.
pub fn find_mesh_intersection(entity: &Entity, ray: &Ray) -> MeshIntersection {
    let Some(mesh) = entity.mesh() else {
        return MeshIntersection::Untraceable;
    };

    let local_ray = ray.transformed(&entity.world_transform().inverse());
    let bones = entity.bone_matrices();

    let mut traceable = false;
    let mut closest: Option<(usize, f32)> = None;

    for (index, sub_mesh) in mesh.sub_meshes().iter().enumerate() {
        if !sub_mesh.is_traceable() {
            continue;
        }
        traceable = true;

        // Bind-pose boxes do not bound posed vertices
        if bones.is_none() || !sub_mesh.is_skinned() {
            let (hit, _) = ray_box_intersection(&local_ray, sub_mesh.bounding_box());
            if !hit {
                continue;
            }
        }

        let count = sub_mesh.triangle_count();
        let test = |tri: usize| -> Option<f32> {
            let [v0, v1, v2] = sub_mesh.triangle(tri, bones)?;
            ray_triangle_intersection(&local_ray, v0, v1, v2)
        };

        let nearest = if count > PARALLEL_TRIANGLE_THRESHOLD {
            match Engine::worker_pool() {
                Ok(pool) => {
                    let triangles: Vec<usize> = (0..count).collect();
                    pool.par_chunks_map(&triangles, TRIANGLE_CHUNK_SIZE, |chunk| {
                        chunk.iter().filter_map(|tri| test(*tri)).reduce(f32::min).into_iter().collect()
                    })
                    .into_iter()
                    .reduce(f32::min)
                }
                Err(_) => (0..count).filter_map(test).reduce(f32::min),
            }
        } else {
            (0..count).filter_map(test).reduce(f32::min)
        };

        if let Some(t) = nearest {
            if closest.map_or(true, |(_, best)| t < best) {
                closest = Some((index, t));
            }
        }
    }

    match closest {
        Some((sub_mesh, t)) => MeshIntersection::Hit { sub_mesh, t },
        None if traceable => MeshIntersection::Miss,
        None => MeshIntersection::Untraceable,
    }
}

#[cfg(test)]
#[path = "mesh_intersection_tests.rs"]
mod tests;
