use glam::{Mat4, Vec3};
use crate::camera::Frustum;
use super::*;

fn unit_box_at(center: Vec3) -> BoundingBox {
    BoundingBox::from_center_half_extents(center, Vec3::splat(0.5))
}

// ============================================================================
// FRUSTUM / BOX
// ============================================================================

#[test]
fn test_frustum_box_outside_every_plane_direction() {
    let f = Frustum::from_view_projection(&Mat4::IDENTITY);
    for offset in [Vec3::X, -Vec3::X, Vec3::Y, -Vec3::Y, Vec3::Z, -Vec3::Z] {
        let bb = unit_box_at(offset * 3.0);
        assert_eq!(frustum_box_intersection(&f, &bb), IntersectResult::Outside);
    }
}

#[test]
fn test_frustum_box_outside_wins_over_intersect() {
    // Straddles the left plane but is fully beyond the far plane
    let f = Frustum::from_view_projection(&Mat4::IDENTITY);
    let bb = BoundingBox::new(Vec3::new(-1.5, -0.5, -5.0), Vec3::new(-0.5, 0.5, -4.0));
    assert_eq!(frustum_box_intersection(&f, &bb), IntersectResult::Outside);
}

#[test]
fn test_frustum_box_touching_face_is_not_outside() {
    let f = Frustum::from_view_projection(&Mat4::IDENTITY);
    let bb = BoundingBox::new(Vec3::new(1.0, -0.5, -0.5), Vec3::new(2.0, 0.5, 0.5));
    assert_eq!(frustum_box_intersection(&f, &bb), IntersectResult::Intersect);
}

#[test]
fn test_frustum_sphere() {
    let f = Frustum::from_view_projection(&Mat4::IDENTITY);
    let inside = BoundingSphere::new(Vec3::ZERO, 0.5);
    let straddling = BoundingSphere::new(Vec3::new(1.0, 0.0, 0.0), 0.5);
    let outside = BoundingSphere::new(Vec3::new(3.0, 0.0, 0.0), 0.5);
    assert_eq!(frustum_sphere_intersection(&f, &inside), IntersectResult::Inside);
    assert_eq!(frustum_sphere_intersection(&f, &straddling), IntersectResult::Intersect);
    assert_eq!(frustum_sphere_intersection(&f, &outside), IntersectResult::Outside);
}

// ============================================================================
// SPHERE / BOX / POINT
// ============================================================================

#[test]
fn test_sphere_box_distance_ten_radius_five_misses() {
    let bb = BoundingBox::from_center_half_extents(Vec3::ZERO, Vec3::ONE);
    let far = BoundingSphere::new(Vec3::new(10.0, 0.0, 0.0), 5.0);
    let near = BoundingSphere::new(Vec3::new(3.0, 0.0, 0.0), 5.0);
    assert!(!sphere_box_intersection(&far, &bb));
    assert!(sphere_box_intersection(&near, &bb));
}

#[test]
fn test_sphere_box_corner_region() {
    let bb = BoundingBox::from_center_half_extents(Vec3::ZERO, Vec3::ONE);
    // Distance to the (1,1,1) corner is sqrt(3) ~ 1.732
    let center = Vec3::splat(2.0);
    assert!(!sphere_box_intersection(&BoundingSphere::new(center, 1.7), &bb));
    assert!(sphere_box_intersection(&BoundingSphere::new(center, 1.8), &bb));
    assert_eq!(point_box_distance_squared(Vec3::ZERO, &bb), 0.0);
}

#[test]
fn test_sphere_contains_box() {
    let bb = BoundingBox::from_center_half_extents(Vec3::ZERO, Vec3::ONE);
    assert!(sphere_contains_box(&BoundingSphere::new(Vec3::ZERO, 2.0), &bb));
    assert!(!sphere_contains_box(&BoundingSphere::new(Vec3::ZERO, 1.5), &bb));
}

#[test]
fn test_sphere_sphere_and_point() {
    let a = BoundingSphere::new(Vec3::ZERO, 1.0);
    let b = BoundingSphere::new(Vec3::new(1.5, 0.0, 0.0), 1.0);
    let c = BoundingSphere::new(Vec3::new(3.0, 0.0, 0.0), 0.5);
    assert!(sphere_sphere_intersection(&a, &b));
    assert!(!sphere_sphere_intersection(&a, &c));
    assert!(sphere_point_intersection(&a, Vec3::new(0.0, 1.0, 0.0)));
    assert!(!sphere_point_intersection(&a, Vec3::new(0.0, 1.1, 0.0)));
}

#[test]
fn test_box_point_is_strict() {
    let bb = unit_box_at(Vec3::ZERO);
    assert!(box_point_intersection(&bb, Vec3::ZERO));
    assert!(!box_point_intersection(&bb, Vec3::new(0.5, 0.0, 0.0)));
    assert!(box_box_intersection(&bb, &unit_box_at(Vec3::new(1.0, 0.0, 0.0))));
    assert!(!box_box_intersection(&bb, &unit_box_at(Vec3::new(1.1, 0.0, 0.0))));
}

// ============================================================================
// RAY / BOX
// ============================================================================

#[test]
fn test_ray_box_hit_reports_entry() {
    let ray = Ray::new(Vec3::new(-5.0, 0.0, 0.0), Vec3::X);
    let (hit, t) = ray_box_intersection(&ray, &unit_box_at(Vec3::ZERO));
    assert!(hit);
    assert!((t - 4.5).abs() < 1e-5);
}

#[test]
fn test_ray_box_behind_origin_reports_exit() {
    let ray = Ray::new(Vec3::new(5.0, 0.0, 0.0), Vec3::X);
    let (hit, t) = ray_box_intersection(&ray, &unit_box_at(Vec3::ZERO));
    assert!(!hit);
    assert!((t - -4.5).abs() < 1e-5);
}

#[test]
fn test_ray_box_miss() {
    let ray = Ray::new(Vec3::new(-5.0, 2.0, 0.0), Vec3::X);
    let (hit, _) = ray_box_intersection(&ray, &unit_box_at(Vec3::ZERO));
    assert!(!hit);
}

#[test]
fn test_ray_box_origin_inside() {
    let ray = Ray::new(Vec3::ZERO, Vec3::Y);
    let (hit, t) = ray_box_intersection(&ray, &unit_box_at(Vec3::ZERO));
    assert!(hit);
    assert!(t < 0.0);
}

// ============================================================================
// RAY / TRIANGLE, PLANE, SPHERE
// ============================================================================

#[test]
fn test_ray_triangle_hit_and_miss() {
    let v0 = Vec3::new(-1.0, -1.0, 0.0);
    let v1 = Vec3::new(1.0, -1.0, 0.0);
    let v2 = Vec3::new(0.0, 1.0, 0.0);

    let ray = Ray::new(Vec3::new(0.0, 0.0, 5.0), -Vec3::Z);
    let t = ray_triangle_intersection(&ray, v0, v1, v2).unwrap();
    assert!((t - 5.0).abs() < 1e-5);

    let miss = Ray::new(Vec3::new(3.0, 0.0, 5.0), -Vec3::Z);
    assert!(ray_triangle_intersection(&miss, v0, v1, v2).is_none());

    let parallel = Ray::new(Vec3::new(0.0, 0.0, 5.0), Vec3::X);
    assert!(ray_triangle_intersection(&parallel, v0, v1, v2).is_none());

    let away = Ray::new(Vec3::new(0.0, 0.0, 5.0), Vec3::Z);
    assert!(ray_triangle_intersection(&away, v0, v1, v2).is_none());
}

#[test]
fn test_ray_plane() {
    let plane = PlaneEquation::from_point_normal(Vec3::new(0.0, 2.0, 0.0), Vec3::Y);
    let down = Ray::new(Vec3::new(0.0, 10.0, 0.0), -Vec3::Y);
    assert!((ray_plane_intersection(&down, &plane).unwrap() - 8.0).abs() < 1e-5);

    let up = Ray::new(Vec3::new(0.0, 10.0, 0.0), Vec3::Y);
    assert!(ray_plane_intersection(&up, &plane).is_none());
}

#[test]
fn test_ray_sphere() {
    let sphere = BoundingSphere::new(Vec3::new(0.0, 0.0, -10.0), 2.0);
    let ray = Ray::new(Vec3::ZERO, -Vec3::Z);
    assert!((ray_sphere_intersection(&ray, &sphere).unwrap() - 8.0).abs() < 1e-5);

    let inside = Ray::new(Vec3::new(0.0, 0.0, -10.0), -Vec3::Z);
    assert!((ray_sphere_intersection(&inside, &sphere).unwrap() - 2.0).abs() < 1e-5);

    let miss = Ray::new(Vec3::new(5.0, 0.0, 0.0), -Vec3::Z);
    assert!(ray_sphere_intersection(&miss, &sphere).is_none());
}

#[test]
fn test_point_helpers() {
    let ray = Ray::new(Vec3::ONE, Vec3::X);
    assert_eq!(point_on_ray(&ray, 2.0), Vec3::new(3.0, 1.0, 1.0));

    let p = project_point_onto_line(Vec3::new(1.0, 5.0, 0.0), Vec3::ZERO, Vec3::X);
    assert_eq!(p, Vec3::new(1.0, 0.0, 0.0));
    assert_eq!(project_point_onto_line(Vec3::ONE, Vec3::ZERO, Vec3::ZERO), Vec3::ZERO);
}

#[test]
fn test_transformed_ray_keeps_parameter() {
    let world = Mat4::from_scale_rotation_translation(
        Vec3::splat(2.0),
        glam::Quat::from_rotation_y(0.3),
        Vec3::new(4.0, 0.0, 0.0),
    );
    let ray = Ray::new(Vec3::new(0.0, 0.0, 10.0), -Vec3::Z);
    let local = ray.transformed(&world.inverse());
    let back = world.transform_point3(point_on_ray(&local, 3.0));
    assert!((back - point_on_ray(&ray, 3.0)).abs().max_element() < 1e-4);
}

#[test]
fn test_plane_helpers() {
    let plane = PlaneEquation::from_points(Vec3::ZERO, Vec3::X, Vec3::Y);
    assert!((plane.normal - Vec3::Z).length() < 1e-6);
    assert_eq!(plane.signed_distance(Vec3::new(0.0, 0.0, 3.0)), 3.0);
    assert_eq!(plane.project_point(Vec3::new(1.0, 2.0, 3.0)), Vec3::new(1.0, 2.0, 0.0));

    let scaled = PlaneEquation::new(Vec3::new(0.0, 2.0, 0.0), 4.0).normalized();
    assert_eq!(scaled.normal, Vec3::Y);
    assert_eq!(scaled.d, 2.0);
}
