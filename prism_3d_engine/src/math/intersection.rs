/// Closed-form intersection tests
///
/// Every culling path goes through these. They are pure functions: no
/// allocation, no logging.

use glam::Vec3;
use crate::camera::Frustum;
use super::bounding_box::BoundingBox;
use super::geometry::{BoundingSphere, PlaneEquation, Ray};

/// Epsilon used by the ray/triangle and ray/plane tests
pub const RAY_EPSILON: f32 = 1e-7;

/// Result of a 3-way volume classification
///
/// - `Outside` → skip the whole subtree
/// - `Inside` → accept the whole subtree without further tests
/// - `Intersect` → test children individually
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum IntersectResult {
    /// Entirely outside
    Outside,
    /// Straddles at least one plane
    Intersect,
    /// Entirely inside
    Inside,
}

// ===== FRUSTUM =====

/// Classify a box against the six frustum planes
///
/// For each plane the box corner furthest along the normal (`vmax`) and the
/// one furthest against it (`vmin`) are picked by normal sign per axis.
/// The first plane with `vmax` behind it yields `Outside` immediately; any
/// plane with `vmin` behind it makes the result `Intersect`; otherwise the
/// box is `Inside`.
pub fn frustum_box_intersection(frustum: &Frustum, bb: &BoundingBox) -> IntersectResult {
    let mut result = IntersectResult::Inside;

    for plane in &frustum.planes {
        let n = plane.normal;
        let vmax = Vec3::new(
            if n.x >= 0.0 { bb.max.x } else { bb.min.x },
            if n.y >= 0.0 { bb.max.y } else { bb.min.y },
            if n.z >= 0.0 { bb.max.z } else { bb.min.z },
        );
        if plane.signed_distance(vmax) < 0.0 {
            return IntersectResult::Outside;
        }

        let vmin = Vec3::new(
            if n.x >= 0.0 { bb.min.x } else { bb.max.x },
            if n.y >= 0.0 { bb.min.y } else { bb.max.y },
            if n.z >= 0.0 { bb.min.z } else { bb.max.z },
        );
        if plane.signed_distance(vmin) < 0.0 {
            result = IntersectResult::Intersect;
        }
    }

    result
}

/// Classify a sphere against the six frustum planes (planes must be normalized)
pub fn frustum_sphere_intersection(frustum: &Frustum, sphere: &BoundingSphere) -> IntersectResult {
    let mut result = IntersectResult::Inside;
    for plane in &frustum.planes {
        let distance = plane.signed_distance(sphere.center);
        if distance < -sphere.radius {
            return IntersectResult::Outside;
        }
        if distance < sphere.radius {
            result = IntersectResult::Intersect;
        }
    }
    result
}

// ===== SPHERE / BOX / POINT =====

/// Squared distance from a point to the closest point of a box (0 inside)
pub fn point_box_distance_squared(point: Vec3, bb: &BoundingBox) -> f32 {
    let closest = point.clamp(bb.min, bb.max);
    point.distance_squared(closest)
}

/// True if the sphere touches the box
pub fn sphere_box_intersection(sphere: &BoundingSphere, bb: &BoundingBox) -> bool {
    point_box_distance_squared(sphere.center, bb) <= sphere.radius * sphere.radius
}

/// True if the box lies entirely within the sphere
pub fn sphere_contains_box(sphere: &BoundingSphere, bb: &BoundingBox) -> bool {
    let r2 = sphere.radius * sphere.radius;
    bb.corners().iter().all(|c| c.distance_squared(sphere.center) <= r2)
}

pub fn sphere_sphere_intersection(a: &BoundingSphere, b: &BoundingSphere) -> bool {
    let r = a.radius + b.radius;
    a.center.distance_squared(b.center) <= r * r
}

pub fn sphere_point_intersection(sphere: &BoundingSphere, point: Vec3) -> bool {
    sphere.center.distance_squared(point) <= sphere.radius * sphere.radius
}

/// True if the boxes overlap or touch
pub fn box_box_intersection(a: &BoundingBox, b: &BoundingBox) -> bool {
    a.intersects(b)
}

/// True if the point is strictly inside the box (surface points do not count)
pub fn box_point_intersection(bb: &BoundingBox, point: Vec3) -> bool {
    point.cmpgt(bb.min).all() && point.cmplt(bb.max).all()
}

// ===== RAY =====

/// Slab test
///
/// Returns `(hit, t)`. When the box is entirely behind the origin, or the
/// slabs do not overlap (`tmin > tmax`), `hit` is false and `t` is the exit
/// distance `tmax`. On a hit `t` is the entry distance `tmin`, which is
/// negative when the origin lies inside the box.
pub fn ray_box_intersection(ray: &Ray, bb: &BoundingBox) -> (bool, f32) {
    let inv = ray.direction.recip();

    let t1 = (bb.min - ray.origin) * inv;
    let t2 = (bb.max - ray.origin) * inv;

    let tmin = t1.min(t2).max_element();
    let tmax = t1.max(t2).min_element();

    if tmax < 0.0 {
        return (false, tmax);
    }
    if tmin > tmax {
        return (false, tmax);
    }
    (true, tmin)
}

/// Möller–Trumbore ray/triangle test
///
/// Both faces are hit. Returns the ray parameter of the hit point, only for
/// hits strictly in front of the origin.
pub fn ray_triangle_intersection(ray: &Ray, v0: Vec3, v1: Vec3, v2: Vec3) -> Option<f32> {
    let edge1 = v1 - v0;
    let edge2 = v2 - v0;
    let h = ray.direction.cross(edge2);
    let a = edge1.dot(h);
    if a.abs() < RAY_EPSILON {
        return None; // parallel
    }

    let f = 1.0 / a;
    let s = ray.origin - v0;
    let u = f * s.dot(h);
    if !(0.0..=1.0).contains(&u) {
        return None;
    }

    let q = s.cross(edge1);
    let v = f * ray.direction.dot(q);
    if v < 0.0 || u + v > 1.0 {
        return None;
    }

    let t = f * edge2.dot(q);
    if t > RAY_EPSILON {
        Some(t)
    } else {
        None
    }
}

/// Ray/plane test; returns the parameter of the hit point in front of the origin
pub fn ray_plane_intersection(ray: &Ray, plane: &PlaneEquation) -> Option<f32> {
    let denom = plane.normal.dot(ray.direction);
    if denom.abs() < RAY_EPSILON {
        return None;
    }
    let t = -plane.signed_distance(ray.origin) / denom;
    if t >= 0.0 {
        Some(t)
    } else {
        None
    }
}

/// Ray/sphere test; returns the nearest non-negative parameter
pub fn ray_sphere_intersection(ray: &Ray, sphere: &BoundingSphere) -> Option<f32> {
    let oc = ray.origin - sphere.center;
    let a = ray.direction.length_squared();
    if a == 0.0 {
        return None;
    }
    let b = oc.dot(ray.direction);
    let c = oc.length_squared() - sphere.radius * sphere.radius;
    let disc = b * b - a * c;
    if disc < 0.0 {
        return None;
    }

    let sq = disc.sqrt();
    let t0 = (-b - sq) / a;
    let t1 = (-b + sq) / a;
    if t0 >= 0.0 {
        Some(t0)
    } else if t1 >= 0.0 {
        Some(t1)
    } else {
        None
    }
}

pub fn point_on_ray(ray: &Ray, t: f32) -> Vec3 {
    ray.origin + ray.direction * t
}

/// Closest point to `point` on the infinite line through `a` and `b`
pub fn project_point_onto_line(point: Vec3, a: Vec3, b: Vec3) -> Vec3 {
    let ab = b - a;
    let len2 = ab.length_squared();
    if len2 == 0.0 {
        return a;
    }
    a + ab * ((point - a).dot(ab) / len2)
}

#[cfg(test)]
#[path = "intersection_tests.rs"]
mod tests;
