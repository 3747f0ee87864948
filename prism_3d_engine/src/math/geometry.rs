/// Basic geometric primitives: rays, planes and spheres

use glam::{Mat4, Vec3, Vec4};

// ===== RAY =====

/// Half-line `origin + t * direction`, `t >= 0`
///
/// `direction` is not required to be unit length. Distances reported by
/// intersection routines are parameters along this ray.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Ray {
    pub origin: Vec3,
    pub direction: Vec3,
}

impl Ray {
    pub fn new(origin: Vec3, direction: Vec3) -> Self {
        Self { origin, direction }
    }

    /// Express the ray in another space
    ///
    /// The direction is transformed as a vector and not renormalized, so a
    /// parameter `t` designates the same point in both spaces.
    pub fn transformed(&self, matrix: &Mat4) -> Ray {
        Ray {
            origin: matrix.transform_point3(self.origin),
            direction: matrix.transform_vector3(self.direction),
        }
    }
}

// ===== PLANE =====

/// Plane `dot(normal, p) + d = 0`; the normal side is the positive side
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PlaneEquation {
    pub normal: Vec3,
    pub d: f32,
}

impl PlaneEquation {
    pub fn new(normal: Vec3, d: f32) -> Self {
        Self { normal, d }
    }

    /// Plane from packed (A, B, C, D) coefficients
    pub fn from_vec4(v: Vec4) -> Self {
        Self { normal: v.truncate(), d: v.w }
    }

    pub fn from_point_normal(point: Vec3, normal: Vec3) -> Self {
        let normal = normal.normalize_or_zero();
        Self { normal, d: -normal.dot(point) }
    }

    /// Plane through three points, counter-clockwise winding facing the normal
    pub fn from_points(p0: Vec3, p1: Vec3, p2: Vec3) -> Self {
        let normal = (p1 - p0).cross(p2 - p0);
        Self::from_point_normal(p0, normal)
    }

    /// Same plane with a unit-length normal (unchanged if the normal is zero)
    pub fn normalized(&self) -> Self {
        let len = self.normal.length();
        if len > 0.0 {
            Self { normal: self.normal / len, d: self.d / len }
        } else {
            *self
        }
    }

    /// `dot(normal, p) + d`; a true distance only for normalized planes
    pub fn signed_distance(&self, point: Vec3) -> f32 {
        self.normal.dot(point) + self.d
    }

    /// Closest point of the plane to `point` (plane must be normalized)
    pub fn project_point(&self, point: Vec3) -> Vec3 {
        point - self.normal * self.signed_distance(point)
    }
}

// ===== SPHERE =====

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct BoundingSphere {
    pub center: Vec3,
    pub radius: f32,
}

impl BoundingSphere {
    pub fn new(center: Vec3, radius: f32) -> Self {
        Self { center, radius }
    }
}
