use std::sync::Arc;
use glam::{Mat4, Vec3};
use crate::math::{BoundingBox, SkinWeights};
use crate::scene::{Entity, Mesh, Skeleton, SubMesh};
use super::*;

fn cube_entity(at: Vec3) -> Entity {
    let mesh = Arc::new(Mesh::new("cube", vec![SubMesh::cube("cube", Vec3::splat(0.5))]));
    Entity::with_mesh("cube", mesh, Mat4::from_translation(at))
}

#[test]
fn test_hit_reports_world_distance() {
    let entity = cube_entity(Vec3::new(0.0, 0.0, -10.0));
    let ray = Ray::new(Vec3::ZERO, -Vec3::Z);

    match find_mesh_intersection(&entity, &ray) {
        MeshIntersection::Hit { sub_mesh, t } => {
            assert_eq!(sub_mesh, 0);
            assert!((t - 9.5).abs() < 1e-4);
        }
        other => panic!("expected a hit, got {:?}", other),
    }
}

#[test]
fn test_distance_survives_scaled_transform() {
    let mesh = Arc::new(Mesh::new("cube", vec![SubMesh::cube("cube", Vec3::splat(0.5))]));
    let world = Mat4::from_translation(Vec3::new(0.0, 0.0, -10.0)) * Mat4::from_scale(Vec3::splat(4.0));
    let entity = Entity::with_mesh("big", mesh, world);

    let result = find_mesh_intersection(&entity, &Ray::new(Vec3::ZERO, -Vec3::Z));
    assert!(matches!(result, MeshIntersection::Hit { t, .. } if (t - 8.0).abs() < 1e-3));
}

#[test]
fn test_miss() {
    let entity = cube_entity(Vec3::new(5.0, 0.0, -10.0));
    let ray = Ray::new(Vec3::ZERO, -Vec3::Z);
    assert_eq!(find_mesh_intersection(&entity, &ray), MeshIntersection::Miss);
}

#[test]
fn test_flushed_mesh_is_untraceable() {
    let sub = SubMesh::gpu_only("gpu", BoundingBox::from_center_half_extents(Vec3::ZERO, Vec3::ONE));
    let mesh = Arc::new(Mesh::new("gpu", vec![sub]));
    let entity = Entity::with_mesh("gpu", mesh, Mat4::IDENTITY);

    let ray = Ray::new(Vec3::new(0.0, 0.0, 5.0), -Vec3::Z);
    assert_eq!(find_mesh_intersection(&entity, &ray), MeshIntersection::Untraceable);
    assert_eq!(find_mesh_intersection(&Entity::new("none"), &ray), MeshIntersection::Untraceable);
}

#[test]
fn test_closest_sub_mesh_wins() {
    let near = SubMesh::cube("near", Vec3::splat(0.5));
    let far_positions: Vec<Vec3> = near
        .positions()
        .unwrap()
        .iter()
        .map(|p| *p + Vec3::new(0.0, 0.0, -5.0))
        .collect();
    let far = SubMesh::new("far", far_positions, near.indices().to_vec());
    let mesh = Arc::new(Mesh::new("pair", vec![far, near]));
    let entity = Entity::with_mesh("pair", mesh, Mat4::IDENTITY);

    let ray = Ray::new(Vec3::new(0.0, 0.0, 10.0), -Vec3::Z);
    assert!(matches!(
        find_mesh_intersection(&entity, &ray),
        MeshIntersection::Hit { sub_mesh: 1, .. }
    ));
}

#[test]
fn test_skinned_mesh_uses_current_pose() {
    let skin = vec![SkinWeights::single(0); 8];
    let sub = SubMesh::cube("skinned", Vec3::splat(0.5)).with_skin(skin);
    let mesh = Arc::new(Mesh::new("skinned", vec![sub]));
    let mut entity = Entity::with_mesh("skinned", mesh, Mat4::IDENTITY);

    let mut skeleton = Skeleton::new(1);
    skeleton.set_bone(0, Mat4::from_translation(Vec3::new(0.0, 10.0, 0.0)));
    entity.set_skeleton(Some(skeleton));

    // The bind pose sits at the origin, the posed mesh 10 units up
    let at_bind = Ray::new(Vec3::new(0.0, 0.0, 5.0), -Vec3::Z);
    let at_pose = Ray::new(Vec3::new(0.0, 10.0, 5.0), -Vec3::Z);
    assert_eq!(find_mesh_intersection(&entity, &at_bind), MeshIntersection::Miss);
    assert!(matches!(find_mesh_intersection(&entity, &at_pose), MeshIntersection::Hit { .. }));
}

#[test]
fn test_large_sub_mesh_hit_matches_serial_result() {
    // 40x40 unit quads in the z = 0 plane, above the parallel threshold
    let n = 40u32;
    let mut positions = Vec::new();
    for y in 0..=n {
        for x in 0..=n {
            positions.push(Vec3::new(x as f32 - 20.0, y as f32 - 20.0, 0.0));
        }
    }
    let mut indices = Vec::new();
    for y in 0..n {
        for x in 0..n {
            let i = y * (n + 1) + x;
            indices.extend_from_slice(&[i, i + 1, i + n + 1, i + 1, i + n + 2, i + n + 1]);
        }
    }
    let sub = SubMesh::new("grid", positions, indices);
    assert!(sub.triangle_count() > 2048);

    let mesh = Arc::new(Mesh::new("grid", vec![sub]));
    let entity = Entity::with_mesh("grid", mesh, Mat4::IDENTITY);

    let hit = Ray::new(Vec3::new(3.3, -7.6, 5.0), -Vec3::Z);
    assert!(matches!(
        find_mesh_intersection(&entity, &hit),
        MeshIntersection::Hit { sub_mesh: 0, t } if (t - 5.0).abs() < 1e-4
    ));

    let outside = Ray::new(Vec3::new(30.0, 0.0, 5.0), -Vec3::Z);
    assert_eq!(find_mesh_intersection(&entity, &outside), MeshIntersection::Miss);
}
