/// CPU skinning of vertex positions
///
/// Used where the posed geometry matters on the CPU side: skinned bounding
/// boxes and ray picking against animated meshes.

use glam::{Mat4, Vec3};

/// Up to four bone influences for one vertex
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct SkinWeights {
    /// Indices into the skeleton's bone matrix list
    pub bones: [u32; 4],
    /// Influence of each bone; unused slots carry 0
    pub weights: [f32; 4],
}

impl SkinWeights {
    /// Vertex fully driven by one bone
    pub fn single(bone: u32) -> Self {
        Self { bones: [bone, 0, 0, 0], weights: [1.0, 0.0, 0.0, 0.0] }
    }
}

/// Weighted sum of bone transforms applied to a bind-pose position
///
/// Influences with a zero weight or an out-of-range bone index are
/// ignored. A vertex without any valid influence keeps its bind position.
pub fn skin_position(position: Vec3, skin: &SkinWeights, bone_matrices: &[Mat4]) -> Vec3 {
    let mut skinned = Vec3::ZERO;
    let mut total_weight = 0.0;

    for (bone, weight) in skin.bones.iter().zip(skin.weights.iter()) {
        if *weight == 0.0 {
            continue;
        }
        let Some(matrix) = bone_matrices.get(*bone as usize) else {
            continue;
        };
        skinned += matrix.transform_point3(position) * *weight;
        total_weight += *weight;
    }

    if total_weight == 0.0 {
        position
    } else {
        skinned
    }
}

#[cfg(test)]
#[path = "skinning_tests.rs"]
mod tests;
