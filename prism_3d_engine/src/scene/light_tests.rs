use glam::Vec3;
use crate::math::{BoundingBox, IntersectResult};
use super::*;

fn unit_box_at(center: Vec3) -> BoundingBox {
    BoundingBox::from_center_half_extents(center, Vec3::splat(0.5))
}

// ============================================================================
// Construction / accessors
// ============================================================================

#[test]
fn test_kind_helpers() {
    let d = Light::directional("sun", Vec3::new(0.0, -2.0, 0.0));
    let p = Light::point("bulb", Vec3::ZERO, 5.0);
    let s = Light::spot("torch", Vec3::ZERO, -Vec3::Z, 10.0, 1.0, 0.8);

    assert!(d.is_directional() && !d.is_point() && !d.is_spot());
    assert!(p.is_point());
    assert!(s.is_spot());
    assert_eq!(d.direction(), Some(-Vec3::Y));
    assert_eq!(p.direction(), None);
    assert_eq!(d.affect_distance(), f32::MAX);
    assert_eq!(p.affect_distance(), 5.0);
    assert_eq!(s.affect_distance(), 10.0);
}

#[test]
fn test_shadow_resolution_flag() {
    let mut light = Light::point("bulb", Vec3::ZERO, 5.0);
    assert!(!light.shadow_resolution_updated());

    light.set_shadow_resolution(1024);
    assert!(!light.shadow_resolution_updated(), "same value does not flag");

    light.set_shadow_resolution(512);
    assert!(light.shadow_resolution_updated());
    assert_eq!(light.shadow_resolution(), 512);

    light.clear_shadow_resolution_updated();
    assert!(!light.shadow_resolution_updated());
}

#[test]
fn test_setters_ignore_other_kinds() {
    let mut p = Light::point("bulb", Vec3::ZERO, 5.0);
    p.set_direction(Vec3::X);
    assert_eq!(p.direction(), None);

    let mut d = Light::directional("sun", -Vec3::Y);
    d.set_radius(3.0);
    assert_eq!(d.affect_distance(), f32::MAX);
}

// ============================================================================
// Influence volumes
// ============================================================================

#[test]
fn test_directional_influence_is_global() {
    let d = Light::directional("sun", -Vec3::Y);
    assert_eq!(d.influence(), LightVolume::Global);
    assert!(d.influence().touches(&unit_box_at(Vec3::splat(1000.0))));
}

#[test]
fn test_point_influence_sphere() {
    let p = Light::point("bulb", Vec3::new(3.0, 0.0, 0.0), 5.0);
    let volume = p.influence();
    assert!(volume.touches(&unit_box_at(Vec3::ZERO)));
    assert_eq!(volume.classify(&unit_box_at(Vec3::ZERO)), IntersectResult::Inside);

    let far = Light::point("far", Vec3::new(10.0, 0.0, 0.0), 5.0);
    assert!(!far.influence().touches(&unit_box_at(Vec3::ZERO)));
}

#[test]
fn test_spot_influence_cone() {
    let s = Light::spot("torch", Vec3::ZERO, -Vec3::Z, 10.0, std::f32::consts::FRAC_PI_3, 0.8);
    let volume = s.influence();

    assert_eq!(volume.classify(&unit_box_at(Vec3::new(0.0, 0.0, -5.0))), IntersectResult::Inside);
    assert!(volume.touches(&unit_box_at(Vec3::new(0.0, 0.0, -5.0))));
    assert!(!volume.touches(&unit_box_at(Vec3::new(0.0, 0.0, 5.0))));
    assert!(!volume.touches(&unit_box_at(Vec3::new(0.0, 0.0, -20.0))));
}

// ============================================================================
// Shadow camera
// ============================================================================

#[test]
fn test_spot_shadow_camera_follows_light() {
    let mut s = Light::spot("torch", Vec3::ZERO, -Vec3::Z, 10.0, 1.0, 0.8);
    s.set_position(Vec3::new(0.0, 5.0, 0.0));
    let eye = s.shadow_camera().position();
    assert!((eye - Vec3::new(0.0, 5.0, 0.0)).length() < 1e-4);
    assert!(!s.shadow_camera().is_orthographic());
}

#[test]
fn test_directional_shadow_camera_is_orthographic() {
    let d = Light::directional("sun", -Vec3::Y);
    assert!(d.shadow_camera().is_orthographic());
    assert!((d.shadow_camera().forward() - -Vec3::Y).length() < 1e-4);
}

#[test]
fn test_degenerate_direction_falls_back_to_down() {
    let mut sun = Light::directional("sun", Vec3::ZERO);
    assert_eq!(sun.direction(), Some(DEFAULT_LIGHT_DIRECTION));
    sun.update_shadow_camera();
    assert!(sun.shadow_camera().view_projection_matrix().is_finite());

    let mut torch = Light::spot("torch", Vec3::ONE, Vec3::ZERO, 10.0, 1.0, 0.8);
    torch.set_direction(Vec3::splat(f32::NAN));
    assert_eq!(torch.direction(), Some(DEFAULT_LIGHT_DIRECTION));
    torch.update_shadow_camera();
    assert!(torch.shadow_camera().view_projection_matrix().is_finite());
}

#[test]
fn test_up_vector_never_parallel() {
    assert_eq!(up_vector_for(Vec3::Y), Vec3::Z);
    assert_eq!(up_vector_for(-Vec3::Y), Vec3::Z);
    assert_eq!(up_vector_for(Vec3::X), Vec3::Y);
}
