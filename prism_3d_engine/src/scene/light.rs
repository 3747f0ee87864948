/// Lights — directional, point and spot as one sum type
///
/// Every light owns the camera used to render its shadow map and carries
/// its current shadow atlas placement, which the shadow pass rewrites
/// whenever the caster set or a resolution changes.

use std::sync::Arc;
use glam::{Mat4, UVec2, Vec3};
use crate::camera::{Camera, Frustum};
use crate::math::{
    frustum_box_intersection, sphere_box_intersection, sphere_contains_box, BoundingBox,
    BoundingSphere, IntersectResult,
};
use crate::render::Viewport;
use super::material::Material;

/// Near clip distance of perspective shadow cameras
pub const SHADOW_NEAR_PLANE: f32 = 0.01;

/// Half size of a directional shadow camera before any fitting
pub const DEFAULT_DIRECTIONAL_SHADOW_EXTENT: f32 = 10.0;

/// Distance of the directional shadow camera from the origin before fitting
pub const DEFAULT_DIRECTIONAL_SHADOW_DISTANCE: f32 = 50.0;

/// Direction used when a light is given a zero or non-finite direction
pub const DEFAULT_LIGHT_DIRECTION: Vec3 = Vec3::NEG_Y;

/// Light-type specific parameters
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum LightKind {
    /// Parallel light from infinitely far away
    Directional { direction: Vec3 },
    /// Omnidirectional light with a finite range
    Point { radius: f32 },
    /// Cone light; `outer_angle` is the full cone aperture in radians
    Spot { direction: Vec3, radius: f32, outer_angle: f32, inner_angle: f32 },
}

/// Placement of one light's shadow map inside the atlas
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ShadowAtlasSlot {
    /// Atlas layer; for point lights the first of 6 consecutive layers
    pub layer: u32,
    /// Texel offset of the map inside the layer
    pub coord: UVec2,
    /// Width and height of the map in texels
    pub resolution: u32,
}

/// Region of space a light can affect
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum LightVolume {
    /// Affects everything (directional lights)
    Global,
    /// Point light range
    Sphere(BoundingSphere),
    /// Spot light cone, approximated by its shadow frustum and that frustum's box
    Cone { frustum: Frustum, bounds: BoundingBox },
}

impl LightVolume {
    /// True if the volume may affect anything inside the box
    pub fn touches(&self, bb: &BoundingBox) -> bool {
        match self {
            LightVolume::Global => true,
            LightVolume::Sphere(sphere) => sphere_box_intersection(sphere, bb),
            LightVolume::Cone { frustum, bounds } => {
                bounds.intersects(bb)
                    && frustum_box_intersection(frustum, bb) != IntersectResult::Outside
            }
        }
    }

    /// 3-way classification of the box against the volume
    pub fn classify(&self, bb: &BoundingBox) -> IntersectResult {
        match self {
            LightVolume::Global => IntersectResult::Inside,
            LightVolume::Sphere(sphere) => {
                if !sphere_box_intersection(sphere, bb) {
                    IntersectResult::Outside
                } else if sphere_contains_box(sphere, bb) {
                    IntersectResult::Inside
                } else {
                    IntersectResult::Intersect
                }
            }
            LightVolume::Cone { frustum, .. } => frustum_box_intersection(frustum, bb),
        }
    }
}

#[derive(Debug, Clone)]
pub struct Light {
    name: String,
    kind: LightKind,
    position: Vec3,
    color: Vec3,
    intensity: f32,
    cast_shadow: bool,
    shadow_resolution: u32,
    shadow_softness: f32,
    shadow_material: Option<Arc<Material>>,
    shadow_camera: Camera,
    atlas_slot: Option<ShadowAtlasSlot>,
    shadow_resolution_updated: bool,
}

impl Light {
    fn from_kind(name: impl Into<String>, kind: LightKind, position: Vec3) -> Self {
        let viewport = Viewport::new(0.0, 0.0, 1024.0, 1024.0);
        let mut light = Self {
            name: name.into(),
            kind,
            position,
            color: Vec3::ONE,
            intensity: 1.0,
            cast_shadow: false,
            shadow_resolution: 1024,
            shadow_softness: 0.5,
            shadow_material: None,
            shadow_camera: Camera::from_matrices(Mat4::IDENTITY, Mat4::IDENTITY, viewport),
            atlas_slot: None,
            shadow_resolution_updated: false,
        };
        light.update_shadow_camera();
        light
    }

    pub fn directional(name: impl Into<String>, direction: Vec3) -> Self {
        let direction = light_direction(direction);
        Self::from_kind(name, LightKind::Directional { direction }, Vec3::ZERO)
    }

    pub fn point(name: impl Into<String>, position: Vec3, radius: f32) -> Self {
        Self::from_kind(name, LightKind::Point { radius }, position)
    }

    /// Spot light; angles are full cone apertures in radians
    pub fn spot(
        name: impl Into<String>,
        position: Vec3,
        direction: Vec3,
        radius: f32,
        outer_angle: f32,
        inner_angle: f32,
    ) -> Self {
        let direction = light_direction(direction);
        Self::from_kind(
            name,
            LightKind::Spot { direction, radius, outer_angle, inner_angle },
            position,
        )
    }

    // ===== ACCESSORS =====

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn kind(&self) -> &LightKind {
        &self.kind
    }

    pub fn is_directional(&self) -> bool {
        matches!(self.kind, LightKind::Directional { .. })
    }

    pub fn is_point(&self) -> bool {
        matches!(self.kind, LightKind::Point { .. })
    }

    pub fn is_spot(&self) -> bool {
        matches!(self.kind, LightKind::Spot { .. })
    }

    pub fn position(&self) -> Vec3 {
        self.position
    }

    /// Emission direction; `None` for point lights
    pub fn direction(&self) -> Option<Vec3> {
        match self.kind {
            LightKind::Directional { direction } | LightKind::Spot { direction, .. } => {
                Some(direction)
            }
            LightKind::Point { .. } => None,
        }
    }

    pub fn color(&self) -> Vec3 {
        self.color
    }

    pub fn intensity(&self) -> f32 {
        self.intensity
    }

    pub fn casts_shadow(&self) -> bool {
        self.cast_shadow
    }

    pub fn shadow_resolution(&self) -> u32 {
        self.shadow_resolution
    }

    pub fn shadow_softness(&self) -> f32 {
        self.shadow_softness
    }

    pub fn shadow_material(&self) -> Option<&Arc<Material>> {
        self.shadow_material.as_ref()
    }

    pub fn shadow_camera(&self) -> &Camera {
        &self.shadow_camera
    }

    pub fn shadow_camera_mut(&mut self) -> &mut Camera {
        &mut self.shadow_camera
    }

    pub fn shadow_frustum(&self) -> &Frustum {
        self.shadow_camera.frustum()
    }

    pub fn atlas_slot(&self) -> Option<ShadowAtlasSlot> {
        self.atlas_slot
    }

    /// True if the requested resolution changed since the last atlas pack
    pub fn shadow_resolution_updated(&self) -> bool {
        self.shadow_resolution_updated
    }

    /// Range of influence; `f32::MAX` for directional lights
    pub fn affect_distance(&self) -> f32 {
        match self.kind {
            LightKind::Directional { .. } => f32::MAX,
            LightKind::Point { radius } | LightKind::Spot { radius, .. } => radius,
        }
    }

    /// Region of space this light affects
    pub fn influence(&self) -> LightVolume {
        match self.kind {
            LightKind::Directional { .. } => LightVolume::Global,
            LightKind::Point { radius } => {
                LightVolume::Sphere(BoundingSphere::new(self.position, radius))
            }
            LightKind::Spot { direction, radius, outer_angle, .. } => {
                let camera = self.cone_camera(direction, radius, outer_angle);
                LightVolume::Cone {
                    frustum: *camera.frustum(),
                    bounds: BoundingBox::from_points(camera.frustum_corners()),
                }
            }
        }
    }

    // ===== SETTERS =====

    pub fn set_position(&mut self, position: Vec3) {
        self.position = position;
        self.update_shadow_camera();
    }

    /// Set the direction of a directional or spot light (ignored for point lights)
    pub fn set_direction(&mut self, new_direction: Vec3) {
        let new_direction = light_direction(new_direction);
        match &mut self.kind {
            LightKind::Directional { direction } | LightKind::Spot { direction, .. } => {
                *direction = new_direction;
            }
            LightKind::Point { .. } => return,
        }
        self.update_shadow_camera();
    }

    /// Set the range of a point or spot light (ignored for directional lights)
    pub fn set_radius(&mut self, new_radius: f32) {
        match &mut self.kind {
            LightKind::Point { radius } | LightKind::Spot { radius, .. } => *radius = new_radius,
            LightKind::Directional { .. } => return,
        }
        self.update_shadow_camera();
    }

    pub fn set_color(&mut self, color: Vec3) {
        self.color = color;
    }

    pub fn set_intensity(&mut self, intensity: f32) {
        self.intensity = intensity;
    }

    pub fn set_cast_shadow(&mut self, cast_shadow: bool) {
        self.cast_shadow = cast_shadow;
    }

    /// Request a new shadow map size; flags the atlas for repacking if it changed
    pub fn set_shadow_resolution(&mut self, resolution: u32) {
        if resolution != self.shadow_resolution {
            self.shadow_resolution = resolution;
            self.shadow_resolution_updated = true;
        }
    }

    pub fn clear_shadow_resolution_updated(&mut self) {
        self.shadow_resolution_updated = false;
    }

    pub fn set_shadow_softness(&mut self, softness: f32) {
        self.shadow_softness = softness;
    }

    pub fn set_shadow_material(&mut self, material: Option<Arc<Material>>) {
        self.shadow_material = material;
    }

    pub fn set_atlas_slot(&mut self, slot: Option<ShadowAtlasSlot>) {
        self.atlas_slot = slot;
    }

    // ===== SHADOW CAMERA =====

    /// Rebuild the shadow camera from the light's current parameters
    ///
    /// Point lights get a 90° camera at the light position (the shadow pass
    /// re-orients it per cube face). Directional lights get a default
    /// orthographic box that the shadow pass later fits to the scene.
    pub fn update_shadow_camera(&mut self) {
        self.shadow_camera = match self.kind {
            LightKind::Directional { direction } => {
                let e = DEFAULT_DIRECTIONAL_SHADOW_EXTENT;
                let eye = -direction * DEFAULT_DIRECTIONAL_SHADOW_DISTANCE;
                let view = Mat4::look_at_rh(eye, Vec3::ZERO, up_vector_for(direction));
                let projection = Mat4::orthographic_rh_gl(
                    -e,
                    e,
                    -e,
                    e,
                    SHADOW_NEAR_PLANE,
                    DEFAULT_DIRECTIONAL_SHADOW_DISTANCE * 2.0,
                );
                Camera::from_matrices(view, projection, self.shadow_viewport())
            }
            LightKind::Point { radius } => {
                let view = Mat4::from_translation(-self.position);
                let projection = Mat4::perspective_rh_gl(
                    std::f32::consts::FRAC_PI_2,
                    1.0,
                    SHADOW_NEAR_PLANE,
                    radius.max(SHADOW_NEAR_PLANE * 2.0),
                );
                Camera::from_matrices(view, projection, self.shadow_viewport())
            }
            LightKind::Spot { direction, radius, outer_angle, .. } => {
                self.cone_camera(direction, radius, outer_angle)
            }
        };
    }

    fn shadow_viewport(&self) -> Viewport {
        let r = self.shadow_resolution as f32;
        Viewport::new(0.0, 0.0, r, r)
    }

    /// Perspective camera covering a spot light's cone
    fn cone_camera(&self, direction: Vec3, radius: f32, outer_angle: f32) -> Camera {
        let fov = outer_angle.clamp(0.01, std::f32::consts::PI - 0.01);
        let view = Mat4::look_at_rh(
            self.position,
            self.position + direction,
            up_vector_for(direction),
        );
        let projection = Mat4::perspective_rh_gl(
            fov,
            1.0,
            SHADOW_NEAR_PLANE,
            radius.max(SHADOW_NEAR_PLANE * 2.0),
        );
        Camera::from_matrices(view, projection, self.shadow_viewport())
    }
}

/// Unit light direction, `DEFAULT_LIGHT_DIRECTION` for degenerate input
pub fn light_direction(direction: Vec3) -> Vec3 {
    direction.try_normalize().unwrap_or(DEFAULT_LIGHT_DIRECTION)
}

/// Up vector that is never parallel to `direction`
pub fn up_vector_for(direction: Vec3) -> Vec3 {
    if direction.normalize_or_zero().dot(Vec3::Y).abs() > 0.999 {
        Vec3::Z
    } else {
        Vec3::Y
    }
}

#[cfg(test)]
#[path = "light_tests.rs"]
mod tests;
