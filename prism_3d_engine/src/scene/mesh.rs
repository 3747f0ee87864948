/// Mesh data as seen by the CPU side of the renderer
///
/// A sub-mesh may have flushed its vertices to the GPU (`positions` is
/// `None`); it still has a bounding box and can be drawn, but cannot be
/// ray traced.

use std::sync::Arc;
use glam::{Mat4, Vec3};
use crate::math::{skin_position, BoundingBox, SkinWeights};
use super::material::Material;

#[derive(Debug, Clone)]
pub struct SubMesh {
    name: String,
    positions: Option<Vec<Vec3>>,
    indices: Vec<u32>,
    skin: Option<Vec<SkinWeights>>,
    material: Option<Arc<Material>>,
    bounding_box: BoundingBox,
}

impl SubMesh {
    /// Sub-mesh with CPU-side vertices; the box is computed from them
    pub fn new(name: impl Into<String>, positions: Vec<Vec3>, indices: Vec<u32>) -> Self {
        let bounding_box = BoundingBox::from_points(positions.iter().copied());
        Self {
            name: name.into(),
            positions: Some(positions),
            indices,
            skin: None,
            material: None,
            bounding_box,
        }
    }

    /// GPU-resident sub-mesh known only by its box
    pub fn gpu_only(name: impl Into<String>, bounding_box: BoundingBox) -> Self {
        Self {
            name: name.into(),
            positions: None,
            indices: Vec::new(),
            skin: None,
            material: None,
            bounding_box,
        }
    }

    /// Axis-aligned box `[-half, half]` made of 12 triangles
    pub fn cube(name: impl Into<String>, half_extents: Vec3) -> Self {
        let h = half_extents;
        let positions = vec![
            Vec3::new(-h.x, -h.y, -h.z),
            Vec3::new(h.x, -h.y, -h.z),
            Vec3::new(h.x, h.y, -h.z),
            Vec3::new(-h.x, h.y, -h.z),
            Vec3::new(-h.x, -h.y, h.z),
            Vec3::new(h.x, -h.y, h.z),
            Vec3::new(h.x, h.y, h.z),
            Vec3::new(-h.x, h.y, h.z),
        ];
        let indices = vec![
            0, 2, 1, 0, 3, 2, // -z
            4, 5, 6, 4, 6, 7, // +z
            0, 1, 5, 0, 5, 4, // -y
            3, 6, 2, 3, 7, 6, // +y
            0, 4, 7, 0, 7, 3, // -x
            1, 2, 6, 1, 6, 5, // +x
        ];
        Self::new(name, positions, indices)
    }

    pub fn with_material(mut self, material: Arc<Material>) -> Self {
        self.material = Some(material);
        self
    }

    /// Attach per-vertex skin weights (one entry per position)
    pub fn with_skin(mut self, skin: Vec<SkinWeights>) -> Self {
        self.skin = Some(skin);
        self
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn positions(&self) -> Option<&[Vec3]> {
        self.positions.as_deref()
    }

    pub fn indices(&self) -> &[u32] {
        &self.indices
    }

    pub fn skin(&self) -> Option<&[SkinWeights]> {
        self.skin.as_deref()
    }

    pub fn material(&self) -> Option<&Arc<Material>> {
        self.material.as_ref()
    }

    /// Bind-pose bounding box in mesh space
    pub fn bounding_box(&self) -> &BoundingBox {
        &self.bounding_box
    }

    /// True while CPU-side vertices are retained
    pub fn is_traceable(&self) -> bool {
        self.positions.is_some()
    }

    pub fn is_skinned(&self) -> bool {
        self.skin.is_some()
    }

    /// Release CPU-side vertex data; the box is kept
    pub fn flush_cpu_data(&mut self) {
        self.positions = None;
        self.skin = None;
    }

    /// Number of complete triangles
    pub fn triangle_count(&self) -> usize {
        self.indices.len() / 3
    }

    /// Vertex positions of triangle `index`, posed by `bones` when skinned
    ///
    /// Returns `None` for untraceable sub-meshes and out-of-range indices.
    pub fn triangle(&self, index: usize, bones: Option<&[Mat4]>) -> Option<[Vec3; 3]> {
        let positions = self.positions.as_ref()?;
        let tri = self.indices.get(index * 3..index * 3 + 3)?;

        let mut out = [Vec3::ZERO; 3];
        for (slot, vertex_index) in out.iter_mut().zip(tri.iter()) {
            let vi = *vertex_index as usize;
            let p = *positions.get(vi)?;
            *slot = match (bones, self.skin.as_ref()) {
                (Some(bones), Some(skin)) => match skin.get(vi) {
                    Some(weights) => skin_position(p, weights, bones),
                    None => p,
                },
                _ => p,
            };
        }
        Some(out)
    }
}

#[derive(Debug, Clone)]
pub struct Mesh {
    name: String,
    sub_meshes: Vec<SubMesh>,
}

impl Mesh {
    pub fn new(name: impl Into<String>, sub_meshes: Vec<SubMesh>) -> Self {
        Self { name: name.into(), sub_meshes }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn sub_meshes(&self) -> &[SubMesh] {
        &self.sub_meshes
    }

    pub fn sub_meshes_mut(&mut self) -> &mut [SubMesh] {
        &mut self.sub_meshes
    }

    /// Union of all sub-mesh boxes
    pub fn bounding_box(&self) -> BoundingBox {
        self.sub_meshes
            .iter()
            .fold(BoundingBox::EMPTY, |acc, sm| acc.union(sm.bounding_box()))
    }

    pub fn is_skinned(&self) -> bool {
        self.sub_meshes.iter().any(|sm| sm.is_skinned())
    }
}

/// Current pose of a skeleton as skinning matrices (bone world * inverse bind)
#[derive(Debug, Clone, Default)]
pub struct Skeleton {
    bone_matrices: Vec<Mat4>,
}

impl Skeleton {
    /// Skeleton in bind pose
    pub fn new(bone_count: usize) -> Self {
        Self { bone_matrices: vec![Mat4::IDENTITY; bone_count] }
    }

    pub fn bone_matrices(&self) -> &[Mat4] {
        &self.bone_matrices
    }

    pub fn bone_count(&self) -> usize {
        self.bone_matrices.len()
    }

    /// Replace the pose; extra matrices are ignored, missing ones stay as they are
    pub fn set_pose(&mut self, matrices: &[Mat4]) {
        for (dst, src) in self.bone_matrices.iter_mut().zip(matrices.iter()) {
            *dst = *src;
        }
    }

    pub fn set_bone(&mut self, index: usize, matrix: Mat4) {
        if let Some(dst) = self.bone_matrices.get_mut(index) {
            *dst = matrix;
        }
    }
}
