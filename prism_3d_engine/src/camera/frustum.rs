/// Frustum — six clipping planes for visibility culling.
///
/// Planes are stored as `PlaneEquation`s whose normals point inward: a
/// point P is inside the frustum if `signed_distance(P) >= 0` for all
/// planes.

use glam::{Mat4, Vec4};
use crate::math::{frustum_box_intersection, BoundingBox, IntersectResult, PlaneEquation};

/// Frustum plane indices
pub const PLANE_LEFT: usize = 0;
pub const PLANE_RIGHT: usize = 1;
pub const PLANE_TOP: usize = 2;
pub const PLANE_BOTTOM: usize = 3;
pub const PLANE_NEAR: usize = 4;
pub const PLANE_FAR: usize = 5;

/// Six frustum planes for culling.
///
/// Works with both perspective and orthographic projections.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Frustum {
    /// Frustum planes: left, right, top, bottom, near, far
    pub planes: [PlaneEquation; 6],
}

impl Frustum {
    /// Extract frustum planes from a combined `projection * view (* model)` matrix.
    ///
    /// Uses the Gribb & Hartmann row-combination method with an OpenGL
    /// style clip volume (`-w <= z <= w`). Planes point inward.
    ///
    /// When `normalize` is false the plane normals keep whatever length
    /// the matrix gives them; signed distances are then only comparable
    /// in sign, not in magnitude.
    pub fn extract(m: &Mat4, normalize: bool) -> Self {
        let row0 = m.row(0);
        let row1 = m.row(1);
        let row2 = m.row(2);
        let row3 = m.row(3);

        let packed: [Vec4; 6] = [
            row3 + row0, // left
            row3 - row0, // right
            row3 - row1, // top
            row3 + row1, // bottom
            row3 + row2, // near
            row3 - row2, // far
        ];

        let mut planes = packed.map(PlaneEquation::from_vec4);
        if normalize {
            for plane in &mut planes {
                *plane = plane.normalized();
            }
        }

        Self { planes }
    }

    /// Extract normalized planes from a view-projection matrix.
    pub fn from_view_projection(vp: &Mat4) -> Self {
        Self::extract(vp, true)
    }

    /// Classify a box against this frustum (3-way test).
    pub fn classify_aabb(&self, bb: &BoundingBox) -> IntersectResult {
        frustum_box_intersection(self, bb)
    }

    /// Conservative visibility test: `true` unless the box is fully outside.
    pub fn intersects_aabb(&self, bb: &BoundingBox) -> bool {
        self.classify_aabb(bb) != IntersectResult::Outside
    }
}

#[cfg(test)]
#[path = "frustum_tests.rs"]
mod tests;
