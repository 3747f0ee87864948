use glam::UVec2;
use crate::render::context::RenderContext;
use crate::render::pass::run_pass;
use crate::render::recording_device::{DeviceCommand, RecordingDevice};
use crate::scene::{Entity, Mesh, SubMesh};
use super::*;

fn settings() -> ShadowSettings {
    ShadowSettings {
        atlas_size: 1024,
        blur_softness_epsilon: 0.001,
        blur_kernel_radius: 4,
    }
}

fn cube_entity(name: &str, position: Vec3) -> Entity {
    let mesh = Arc::new(Mesh::new("cube", vec![SubMesh::cube("cube", Vec3::splat(0.5))]));
    Entity::with_mesh(name, mesh, Mat4::from_translation(position))
}

fn shadowed(mut light: Light, resolution: u32, softness: f32) -> Light {
    light.set_cast_shadow(true);
    light.set_shadow_resolution(resolution);
    light.set_shadow_softness(softness);
    light
}

fn spot_above(resolution: u32, softness: f32) -> Light {
    shadowed(
        Light::spot("spot", Vec3::new(0.0, 5.0, 0.0), Vec3::NEG_Y, 20.0, 1.2, 1.0),
        resolution,
        softness,
    )
}

fn prepared(scene: &mut SceneData) -> ShadowPass {
    let jobs = RenderJobProcessor::create_all_render_jobs(scene);
    let mut pass = ShadowPass::new(settings());
    pass.prepare(scene, &jobs, None, 256);
    pass
}

fn run(pass: &mut ShadowPass, device: &mut RecordingDevice) {
    let mut ctx = RenderContext::new(device);
    run_pass(pass, &mut ctx).unwrap();
    assert!(ctx.override_material().is_none());
    assert_eq!(ctx.framebuffer(), None);
}

fn count<F: Fn(&DeviceCommand) -> bool>(device: &RecordingDevice, filter: F) -> usize {
    device.commands().iter().filter(|c| filter(c)).count()
}

// ============================================================================
// Preparation
// ============================================================================

#[test]
fn test_prepare_keeps_casters_and_shadowed_lights() {
    let mut scene = SceneData::new();
    scene.insert_entity(cube_entity("caster", Vec3::ZERO));
    let mut receiver = cube_entity("receiver", Vec3::new(3.0, 0.0, 0.0));
    receiver.set_flag(crate::scene::EntityFlags::CAST_SHADOW, false);
    scene.insert_entity(receiver);
    let spot = scene.insert_light(spot_above(256, 0.0));
    scene.insert_light(Light::point("unshadowed", Vec3::ONE, 5.0));

    let pass = prepared(&mut scene);

    assert_eq!(pass.draw_list().len(), 1);
    assert_eq!(pass.lights().len(), 1);
    assert_eq!(pass.lights()[0].0, spot);
    assert_eq!(pass.packer().layer_count(), 1);
}

#[test]
fn test_directional_camera_fits_casters() {
    let mut scene = SceneData::new();
    scene.insert_entity(cube_entity("a", Vec3::new(-4.0, 0.0, 2.0)));
    scene.insert_entity(cube_entity("b", Vec3::new(6.0, 1.0, -3.0)));
    let sun = scene.insert_light(shadowed(Light::directional("sun", Vec3::new(0.3, -1.0, 0.2)), 512, 0.0));

    let pass = prepared(&mut scene);
    let caster_box = RenderJobProcessor::bounding_box(pass.draw_list());
    let light = scene.light(sun).unwrap();

    assert_eq!(
        frustum_box_intersection(light.shadow_camera().frustum(), &caster_box),
        IntersectResult::Inside
    );
    assert!(light.shadow_camera().is_orthographic());
}

#[test]
fn test_directional_fit_uses_smaller_view_window() {
    let mut light = shadowed(Light::directional("sun", Vec3::NEG_Y), 512, 0.0);
    let casters = BoundingBox::new(Vec3::new(-50.0, -1.0, -50.0), Vec3::new(50.0, 1.0, 50.0));
    let view = Camera::orthographic(-2.0, 2.0, -2.0, 2.0, 0.1, 10.0, Viewport::new(0.0, 0.0, 64.0, 64.0));

    fit_directional_shadow_camera(&mut light, &casters, Some(&view));

    // Only the view's neighbourhood is covered, but the whole caster depth is
    let frustum = light.shadow_camera().frustum();
    let near_view = BoundingBox::new(Vec3::new(-1.0, -1.0, -3.0), Vec3::new(1.0, 1.0, -1.0));
    let far_away = BoundingBox::new(Vec3::new(40.0, -1.0, 40.0), Vec3::new(45.0, 1.0, 45.0));
    assert_eq!(frustum_box_intersection(frustum, &near_view), IntersectResult::Inside);
    assert_eq!(frustum_box_intersection(frustum, &far_away), IntersectResult::Outside);
}

#[test]
fn test_directional_fit_without_casters_uses_default_camera() {
    let mut light = Light::directional("sun", Vec3::NEG_Y);
    let expected = *light.shadow_camera().view_matrix();
    fit_directional_shadow_camera(&mut light, &BoundingBox::EMPTY, None);
    assert_eq!(*light.shadow_camera().view_matrix(), expected);
}

#[test]
fn test_cube_face_cameras_look_along_axes() {
    let light = Light::point("bulb", Vec3::new(1.0, 2.0, 3.0), 10.0);
    for (face, (direction, _)) in CUBE_FACE_ORIENTATIONS.iter().enumerate() {
        let camera = cube_face_camera(&light, face);
        assert!((camera.position() - light.position()).length() < 1e-4);
        assert!((camera.forward() - *direction).length() < 1e-4, "face {}", face);
    }
}

// ============================================================================
// Rendering
// ============================================================================

#[test]
fn test_spot_light_renders_and_blurs() {
    let mut scene = SceneData::new();
    scene.insert_entity(cube_entity("caster", Vec3::ZERO));
    scene.insert_light(spot_above(256, 0.5));
    let mut pass = prepared(&mut scene);
    let mut device = RecordingDevice::new();

    run(&mut pass, &mut device);

    let atlas = pass.atlas().unwrap();
    let desc = device.framebuffer_desc(atlas).unwrap();
    assert_eq!((desc.width, desc.height, desc.layers), (1024, 1024, 1));

    let draws = device.draws();
    assert_eq!(draws.len(), 1);
    assert_eq!(draws[0].render_state.blend_function, BlendFunction::None);
    assert!(count(&device, |c| matches!(c, DeviceCommand::SetViewport(v) if v.width == 256.0)) >= 1);

    let blurs: Vec<bool> = device
        .commands()
        .iter()
        .filter_map(|c| match c {
            DeviceCommand::DrawFullscreenQuad(QuadShader::GaussianBlur { horizontal, .. }) => Some(*horizontal),
            _ => None,
        })
        .collect();
    assert_eq!(blurs, vec![true, false]);
}

#[test]
fn test_hard_shadows_skip_blur() {
    let mut scene = SceneData::new();
    scene.insert_entity(cube_entity("caster", Vec3::ZERO));
    scene.insert_light(spot_above(256, 0.0));
    let mut pass = prepared(&mut scene);
    let mut device = RecordingDevice::new();

    run(&mut pass, &mut device);

    assert_eq!(count(&device, |c| matches!(c, DeviceCommand::DrawFullscreenQuad(_))), 0);
}

#[test]
fn test_shared_layer_cleared_fully_once() {
    let mut scene = SceneData::new();
    scene.insert_entity(cube_entity("caster", Vec3::ZERO));
    scene.insert_light(spot_above(256, 0.0));
    scene.insert_light(spot_above(256, 0.0));
    let mut pass = prepared(&mut scene);
    let mut device = RecordingDevice::new();

    run(&mut pass, &mut device);

    let clears: Vec<ClearFlags> = device
        .commands()
        .iter()
        .filter_map(|c| match c {
            DeviceCommand::Clear { flags, .. } => Some(*flags),
            _ => None,
        })
        .collect();
    assert_eq!(clears, vec![ClearFlags::ALL, ClearFlags::DEPTH]);

    let coords: Vec<UVec2> = pass.lights().iter().map(|(_, l)| l.atlas_slot().unwrap().coord).collect();
    assert_ne!(coords[0], coords[1]);
}

#[test]
fn test_point_light_renders_six_faces() {
    let mut scene = SceneData::new();
    for position in [Vec3::X, Vec3::NEG_X, Vec3::Y, Vec3::NEG_Y, Vec3::Z, Vec3::NEG_Z] {
        scene.insert_entity(cube_entity("around", position * 4.0));
    }
    scene.insert_light(shadowed(Light::point("bulb", Vec3::ZERO, 20.0), 256, 0.5));
    let mut pass = prepared(&mut scene);
    let mut device = RecordingDevice::new();

    run(&mut pass, &mut device);

    let atlas = pass.atlas();
    let layers: Vec<u32> = device
        .commands()
        .iter()
        .filter_map(|c| match c {
            DeviceCommand::BindFramebuffer { framebuffer, layer } if *framebuffer == atlas => Some(*layer),
            _ => None,
        })
        .collect();
    assert_eq!(layers, vec![0, 1, 2, 3, 4, 5]);
    assert_eq!(pass.atlas_layers(), 6);
    // Each face sees exactly the cube in front of it
    assert_eq!(device.draws().len(), 6);
    // Point shadows are never blurred
    assert_eq!(count(&device, |c| matches!(c, DeviceCommand::DrawFullscreenQuad(_))), 0);
}

#[test]
fn test_light_shadow_material_overrides_default() {
    let mut scene = SceneData::new();
    scene.insert_entity(cube_entity("caster", Vec3::ZERO));
    let custom = Arc::new(Material::new("custom_shadow"));
    let mut light = spot_above(256, 0.0);
    light.set_shadow_material(Some(Arc::clone(&custom)));
    scene.insert_light(light);
    let mut pass = prepared(&mut scene);
    let mut device = RecordingDevice::new();

    run(&mut pass, &mut device);

    assert_eq!(device.draws()[0].material, custom.id());
}

#[test]
fn test_atlas_recreated_only_when_repacked() {
    let mut scene = SceneData::new();
    scene.insert_entity(cube_entity("caster", Vec3::ZERO));
    scene.insert_light(spot_above(256, 0.0));
    let jobs = RenderJobProcessor::create_all_render_jobs(&scene);
    let mut pass = ShadowPass::new(settings());
    let mut device = RecordingDevice::new();

    pass.prepare(&mut scene, &jobs, None, 256);
    run(&mut pass, &mut device);
    pass.prepare(&mut scene, &jobs, None, 256);
    run(&mut pass, &mut device);
    let created = |device: &RecordingDevice| {
        count(device, |c| matches!(c, DeviceCommand::CreateFramebuffer { .. }))
    };
    // Atlas and blur target
    assert_eq!(created(&device), 2);

    scene.insert_light(shadowed(Light::point("bulb", Vec3::ONE, 5.0), 256, 0.0));
    pass.prepare(&mut scene, &jobs, None, 256);
    run(&mut pass, &mut device);
    assert_eq!(created(&device), 3);
    assert_eq!(pass.atlas_layers(), 12);
    // The single-layer atlas was released
    assert_eq!(device.live_framebuffer_count(), 2);
}

#[test]
fn test_repack_with_same_layer_count_reuses_atlas() {
    let mut scene = SceneData::new();
    scene.insert_entity(cube_entity("caster", Vec3::ZERO));
    let spot = scene.insert_light(spot_above(128, 0.0));
    let jobs = RenderJobProcessor::create_all_render_jobs(&scene);
    let mut pass = ShadowPass::new(settings());
    let mut device = RecordingDevice::new();

    pass.prepare(&mut scene, &jobs, None, 256);
    run(&mut pass, &mut device);
    let atlas = pass.atlas();

    for resolution in [256, 128, 512, 256, 64] {
        scene.light_mut(spot).unwrap().set_shadow_resolution(resolution);
        pass.prepare(&mut scene, &jobs, None, 256);
        run(&mut pass, &mut device);
        assert_eq!(pass.lights()[0].1.atlas_slot().unwrap().resolution, resolution);
    }

    assert_eq!(pass.atlas(), atlas);
    assert_eq!(pass.atlas_layers(), 1);
    assert_eq!(device.live_framebuffer_count(), 2);
    assert!(!device.commands().iter().any(|c| matches!(c, DeviceCommand::DestroyFramebuffer(_))));
}
