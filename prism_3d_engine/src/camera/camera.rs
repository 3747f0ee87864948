/// Camera — view, projection, frustum and viewport.
///
/// Mostly a passive container: setters store and compute nothing, the
/// frustum is only refreshed by `refresh_frustum()` or by the
/// convenience constructors and `look_at`/`set_world_transform`, which
/// keep all three matrices consistent.

use glam::{Mat4, Vec3, Vec4};
use crate::render::Viewport;
use super::frustum::Frustum;

#[derive(Debug, Clone)]
pub struct Camera {
    view_matrix: Mat4,
    projection_matrix: Mat4,
    frustum: Frustum,
    viewport: Viewport,
}

impl Camera {
    /// Create a new camera with the given parameters.
    pub fn new(view: Mat4, projection: Mat4, frustum: Frustum, viewport: Viewport) -> Self {
        Self {
            view_matrix: view,
            projection_matrix: projection,
            frustum,
            viewport,
        }
    }

    /// Perspective camera at the origin looking down -Z.
    ///
    /// # Arguments
    ///
    /// * `fov_y` - Vertical field of view in radians
    /// * `aspect` - Width / height
    /// * `near`, `far` - Clip distances (both positive)
    pub fn perspective(fov_y: f32, aspect: f32, near: f32, far: f32, viewport: Viewport) -> Self {
        let projection = Mat4::perspective_rh_gl(fov_y, aspect, near, far);
        Self::from_matrices(Mat4::IDENTITY, projection, viewport)
    }

    /// Orthographic camera at the origin looking down -Z.
    #[allow(clippy::too_many_arguments)]
    pub fn orthographic(
        left: f32,
        right: f32,
        bottom: f32,
        top: f32,
        near: f32,
        far: f32,
        viewport: Viewport,
    ) -> Self {
        let projection = Mat4::orthographic_rh_gl(left, right, bottom, top, near, far);
        Self::from_matrices(Mat4::IDENTITY, projection, viewport)
    }

    /// Camera with a frustum derived from `projection * view`.
    pub fn from_matrices(view: Mat4, projection: Mat4, viewport: Viewport) -> Self {
        let frustum = Frustum::from_view_projection(&(projection * view));
        Self::new(view, projection, frustum, viewport)
    }

    // ===== GETTERS =====

    /// View matrix (inverse of the camera's world transform).
    pub fn view_matrix(&self) -> &Mat4 {
        &self.view_matrix
    }

    /// Projection matrix (perspective or orthographic).
    pub fn projection_matrix(&self) -> &Mat4 {
        &self.projection_matrix
    }

    /// Combined view-projection matrix (projection * view).
    pub fn view_projection_matrix(&self) -> Mat4 {
        self.projection_matrix * self.view_matrix
    }

    /// Frustum planes for culling.
    pub fn frustum(&self) -> &Frustum {
        &self.frustum
    }

    pub fn viewport(&self) -> &Viewport {
        &self.viewport
    }

    /// Camera's world transform.
    pub fn world_transform(&self) -> Mat4 {
        self.view_matrix.inverse()
    }

    /// World-space eye position.
    pub fn position(&self) -> Vec3 {
        self.world_transform().w_axis.truncate()
    }

    /// World-space viewing direction (unit length).
    pub fn forward(&self) -> Vec3 {
        (-self.world_transform().z_axis.truncate()).normalize_or_zero()
    }

    /// True if the projection is orthographic (no perspective divide).
    pub fn is_orthographic(&self) -> bool {
        self.projection_matrix.w_axis.w == 1.0
    }

    /// The 8 world-space frustum corners: near plane first, then far plane,
    /// each in the order (-x,-y), (+x,-y), (+x,+y), (-x,+y).
    pub fn frustum_corners(&self) -> [Vec3; 8] {
        let inv = self.view_projection_matrix().inverse();
        let ndc = [
            Vec3::new(-1.0, -1.0, -1.0),
            Vec3::new(1.0, -1.0, -1.0),
            Vec3::new(1.0, 1.0, -1.0),
            Vec3::new(-1.0, 1.0, -1.0),
            Vec3::new(-1.0, -1.0, 1.0),
            Vec3::new(1.0, -1.0, 1.0),
            Vec3::new(1.0, 1.0, 1.0),
            Vec3::new(-1.0, 1.0, 1.0),
        ];
        ndc.map(|p| {
            let h = inv * Vec4::new(p.x, p.y, p.z, 1.0);
            h.truncate() / h.w
        })
    }

    // ===== SETTERS — store, compute nothing =====

    pub fn set_view(&mut self, matrix: Mat4) {
        self.view_matrix = matrix;
    }

    pub fn set_projection(&mut self, matrix: Mat4) {
        self.projection_matrix = matrix;
    }

    pub fn set_frustum(&mut self, frustum: Frustum) {
        self.frustum = frustum;
    }

    pub fn set_viewport(&mut self, viewport: Viewport) {
        self.viewport = viewport;
    }

    // ===== DERIVED UPDATES =====

    /// Recompute the frustum from the current view and projection.
    pub fn refresh_frustum(&mut self) {
        self.frustum = Frustum::from_view_projection(&self.view_projection_matrix());
    }

    /// Place the camera at `eye` looking at `target`, then refresh the frustum.
    pub fn look_at(&mut self, eye: Vec3, target: Vec3, up: Vec3) {
        self.view_matrix = Mat4::look_at_rh(eye, target, up);
        self.refresh_frustum();
    }

    /// Set the camera's world transform, then refresh the frustum.
    pub fn set_world_transform(&mut self, world: Mat4) {
        self.view_matrix = world.inverse();
        self.refresh_frustum();
    }
}

#[cfg(test)]
#[path = "camera_tests.rs"]
mod tests;
