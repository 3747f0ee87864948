use std::sync::Arc;
use glam::{Mat4, Vec3};
use crate::render::device::QuadShader;
use crate::render::recording_device::{DeviceCommand, RecordingDevice};
use crate::render::Viewport;
use crate::scene::{BlendFunction, Entity, Light, Material, Mesh, RenderState, SubMesh};
use crate::settings::BvhSettings;
use super::*;

fn settings() -> ShadowSettings {
    ShadowSettings {
        atlas_size: 1024,
        blur_softness_epsilon: 0.001,
        blur_kernel_radius: 2,
    }
}

fn cube(position: Vec3, material: Option<Arc<Material>>) -> Entity {
    let mut sub_mesh = SubMesh::cube("cube", Vec3::splat(0.5));
    if let Some(material) = material {
        sub_mesh = sub_mesh.with_material(material);
    }
    Entity::with_mesh("cube", Arc::new(Mesh::new("cube", vec![sub_mesh])), Mat4::from_translation(position))
}

fn glass() -> Arc<Material> {
    Arc::new(Material::with_render_state(
        "glass",
        RenderState {
            blend_function: BlendFunction::AlphaBlend,
            ..RenderState::default()
        },
    ))
}

/// Camera at +Z looking at the origin
fn camera() -> Camera {
    let mut camera = Camera::perspective(1.0, 4.0 / 3.0, 0.1, 100.0, Viewport::new(0.0, 0.0, 640.0, 480.0));
    camera.look_at(Vec3::new(0.0, 0.0, 10.0), Vec3::ZERO, Vec3::Y);
    camera
}

// ============================================================================
// Frame pipeline
// ============================================================================

#[test]
fn test_frame_counts_visible_jobs() {
    let mut scene = Scene::with_settings(BvhSettings::default());
    scene.add_entity(cube(Vec3::ZERO, None));
    scene.add_entity(cube(Vec3::new(1.5, 0.0, 0.0), Some(glass())));
    scene.add_entity(cube(Vec3::new(0.0, 0.0, 50.0), None)); // behind the camera
    let mut renderer = SceneRenderer::with_settings(settings());
    let mut device = RecordingDevice::new();

    let stats = renderer.render(&mut device, &mut scene, &camera(), &[]).unwrap();

    assert_eq!(stats.bvh.added, 3);
    assert_eq!(stats.visible_entities, 2);
    assert_eq!(stats.opaque_jobs, 1);
    assert_eq!(stats.translucent_jobs, 1);
    assert_eq!(stats.shadow_lights, 0);
    assert_eq!(stats.outlined_jobs, 0);
    assert_eq!(device.draws().len(), 2);
}

#[test]
fn test_second_frame_has_nothing_to_sync() {
    let mut scene = Scene::with_settings(BvhSettings::default());
    scene.add_entity(cube(Vec3::ZERO, None));
    let mut renderer = SceneRenderer::with_settings(settings());
    let mut device = RecordingDevice::new();

    renderer.render(&mut device, &mut scene, &camera(), &[]).unwrap();
    let stats = renderer.render(&mut device, &mut scene, &camera(), &[]).unwrap();

    assert_eq!(stats.bvh, BvhUpdateStats::default());
    assert_eq!(stats.visible_entities, 1);
}

#[test]
fn test_shadow_pass_runs_before_forward() {
    let mut scene = Scene::with_settings(BvhSettings::default());
    let caster = scene.add_entity(cube(Vec3::ZERO, None));
    // Floor outside the view still casts
    let hidden = scene.add_entity(cube(Vec3::new(0.0, -2.0, 30.0), None));
    let mut spot = Light::spot("spot", Vec3::new(0.0, 10.0, 10.0), Vec3::NEG_Y, 50.0, 2.5, 2.0);
    spot.set_cast_shadow(true);
    spot.set_shadow_resolution(512);
    scene.add_light(spot);
    let mut renderer = SceneRenderer::with_settings(settings());
    let mut device = RecordingDevice::new();

    let stats = renderer.render(&mut device, &mut scene, &camera(), &[]).unwrap();

    assert_eq!(stats.shadow_lights, 1);
    let atlas = renderer.shadow_pass().atlas();
    let draws: Vec<(EntityKey, Option<FramebufferId>)> = {
        let mut bound = None;
        device
            .commands()
            .iter()
            .filter_map(|c| match c {
                DeviceCommand::BindFramebuffer { framebuffer, .. } => {
                    bound = *framebuffer;
                    None
                }
                DeviceCommand::Draw(call) => Some((call.entity, bound)),
                _ => None,
            })
            .collect()
    };
    let first_forward = draws.iter().position(|(_, fb)| *fb != atlas).unwrap();
    assert!(draws[..first_forward].iter().all(|(_, fb)| *fb == atlas));
    assert!(draws[..first_forward].iter().any(|(e, _)| *e == hidden));
    assert_eq!(draws[first_forward..].to_vec(), vec![(caster, None::<FramebufferId>)]);
}

#[test]
fn test_forward_draws_carry_nearby_lights() {
    let mut scene = Scene::with_settings(BvhSettings::default());
    scene.add_entity(cube(Vec3::ZERO, None));
    let near = scene.add_light(Light::point("near", Vec3::new(0.0, 2.0, 0.0), 5.0));
    scene.add_light(Light::point("far", Vec3::new(0.0, 2.0, -80.0), 5.0));
    let sun = scene.add_light(Light::directional("sun", Vec3::NEG_Y));
    let mut renderer = SceneRenderer::with_settings(settings());
    let mut device = RecordingDevice::new();

    renderer.render(&mut device, &mut scene, &camera(), &[]).unwrap();

    assert_eq!(device.draws()[0].lights, vec![sun, near]);
}

#[test]
fn test_selection_is_outlined_last() {
    let mut scene = Scene::with_settings(BvhSettings::default());
    let selected = scene.add_entity(cube(Vec3::ZERO, None));
    scene.add_entity(cube(Vec3::new(2.0, 0.0, 0.0), None));
    let mut renderer = SceneRenderer::with_settings(settings());
    let mut device = RecordingDevice::new();

    let stats = renderer.render(&mut device, &mut scene, &camera(), &[selected]).unwrap();

    assert_eq!(stats.outlined_jobs, 1);
    let draws = device.draws();
    assert_eq!(draws.len(), 3);
    assert_eq!(draws[2].entity, selected);
    assert!(matches!(
        device.commands().last(),
        Some(DeviceCommand::DrawFullscreenQuad(QuadShader::Dilate { .. }))
    ));
}

#[test]
fn test_release_targets_frees_every_offscreen_framebuffer() {
    let mut scene = Scene::with_settings(BvhSettings::default());
    let selected = scene.add_entity(cube(Vec3::ZERO, None));
    let mut spot = Light::spot("spot", Vec3::new(0.0, 10.0, 0.0), Vec3::NEG_Y, 50.0, 1.0, 0.8);
    spot.set_cast_shadow(true);
    spot.set_shadow_softness(0.5);
    scene.add_light(spot);
    let mut renderer = SceneRenderer::with_settings(settings());
    let mut device = RecordingDevice::new();

    renderer.render(&mut device, &mut scene, &camera(), &[selected]).unwrap();
    // Atlas, blur target, outline mask
    assert_eq!(device.live_framebuffer_count(), 3);

    renderer.release_targets(&mut device).unwrap();
    assert_eq!(device.live_framebuffer_count(), 0);

    renderer.render(&mut device, &mut scene, &camera(), &[selected]).unwrap();
    assert_eq!(device.live_framebuffer_count(), 3);
}
