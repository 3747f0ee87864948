use glam::{Mat4, Vec3};
use slotmap::SlotMap;
use crate::math::BoundingBox;
use crate::render::pass::run_pass;
use crate::render::recording_device::{DeviceCommand, RecordingDevice};
use crate::render::Viewport;
use crate::scene::{BlendFunction, EntityKey, Mesh, SubMesh};
use super::*;

fn entity_keys(count: usize) -> Vec<EntityKey> {
    let mut arena: SlotMap<EntityKey, ()> = SlotMap::with_key();
    (0..count).map(|_| arena.insert(())).collect()
}

fn material(name: &str, blend_function: BlendFunction, cull_mode: CullMode) -> Arc<Material> {
    Arc::new(Material::with_render_state(
        name,
        RenderState {
            blend_function,
            cull_mode,
            ..RenderState::default()
        },
    ))
}

fn job(entity: EntityKey, z: f32, material: Arc<Material>) -> RenderJob {
    let position = Vec3::new(0.0, 0.0, z);
    RenderJob {
        entity,
        sub_mesh_index: 0,
        mesh: Arc::new(Mesh::new("cube", vec![SubMesh::cube("cube", Vec3::splat(0.5))])),
        material,
        world_transform: Mat4::from_translation(position),
        bounding_box: BoundingBox::from_center_half_extents(position, Vec3::splat(0.5)),
        shadow_caster: false,
        lights: Vec::new(),
    }
}

fn camera() -> Camera {
    Camera::perspective(1.0, 1.0, 0.1, 100.0, Viewport::new(0.0, 0.0, 320.0, 240.0))
}

fn render(pass: &mut ForwardPass) -> RecordingDevice {
    let mut device = RecordingDevice::new();
    let mut ctx = RenderContext::new(&mut device);
    run_pass(pass, &mut ctx).unwrap();
    drop(ctx);
    device
}

// ============================================================================
// Forward pass
// ============================================================================

#[test]
fn test_pre_render_binds_target_viewport_and_clears() {
    let mut pass = ForwardPass::new(camera(), None);
    let device = render(&mut pass);

    assert_eq!(
        device.commands()[0],
        DeviceCommand::BindFramebuffer { framebuffer: None, layer: 0 }
    );
    assert_eq!(
        device.commands()[1],
        DeviceCommand::SetViewport(Viewport::new(0.0, 0.0, 320.0, 240.0))
    );
    assert!(matches!(device.commands()[2], DeviceCommand::Clear { flags: ClearFlags::ALL, .. }));
}

#[test]
fn test_no_clear_when_disabled() {
    let mut pass = ForwardPass::new(camera(), None);
    pass.set_clear_color(None);
    let device = render(&mut pass);
    assert!(!device.commands().iter().any(|c| matches!(c, DeviceCommand::Clear { .. })));
}

#[test]
fn test_opaque_before_translucent_in_given_order() {
    let keys = entity_keys(4);
    let opaque = material("stone", BlendFunction::None, CullMode::Back);
    let glass = material("glass", BlendFunction::AlphaBlend, CullMode::Back);
    let jobs = vec![
        job(keys[0], -5.0, Arc::clone(&glass)),
        job(keys[1], -5.0, Arc::clone(&opaque)),
        job(keys[2], -20.0, Arc::clone(&glass)),
        job(keys[3], -2.0, Arc::clone(&opaque)),
    ];
    let mut pass = ForwardPass::new(camera(), None);
    pass.set_jobs(RenderJobProcessor::separate_opaque_translucent(jobs));

    let device = render(&mut pass);
    let order: Vec<EntityKey> = device.draws().iter().map(|d| d.entity).collect();
    // Opaque keep their order, translucent are drawn farthest first
    assert_eq!(order, vec![keys[1], keys[3], keys[2], keys[0]]);
}

#[test]
fn test_two_sided_translucent_drawn_twice() {
    let keys = entity_keys(2);
    let glass = material("glass", BlendFunction::AlphaBlend, CullMode::TwoSided);
    let plain = material("plain", BlendFunction::AlphaBlend, CullMode::Back);
    let jobs = vec![job(keys[0], -10.0, glass), job(keys[1], -5.0, plain)];
    let mut pass = ForwardPass::new(camera(), None);
    pass.set_jobs(RenderJobProcessor::separate_opaque_translucent(jobs));

    let device = render(&mut pass);
    let draws: Vec<(EntityKey, CullMode)> = device
        .draws()
        .iter()
        .map(|d| (d.entity, d.render_state.cull_mode))
        .collect();
    assert_eq!(
        draws,
        vec![
            (keys[0], CullMode::Front),
            (keys[0], CullMode::Back),
            (keys[1], CullMode::Back),
        ]
    );
    // The material itself is untouched
    assert_eq!(pass.translucent_jobs()[0].material.render_state().cull_mode, CullMode::TwoSided);
}

#[test]
fn test_deferred_jobs_ignored() {
    let keys = entity_keys(1);
    let deferred = Arc::new(Material::with_render_state(
        "deferred",
        RenderState {
            use_forward_path: false,
            ..RenderState::default()
        },
    ));
    let mut pass = ForwardPass::new(camera(), None);
    pass.set_jobs(RenderJobProcessor::separate_opaque_translucent(vec![job(keys[0], -5.0, deferred)]));

    let device = render(&mut pass);
    assert!(device.draws().is_empty());
}

#[test]
fn test_draw_carries_lights_and_camera() {
    let keys = entity_keys(1);
    let mut lights: SlotMap<crate::scene::LightKey, ()> = SlotMap::with_key();
    let light = lights.insert(());
    let mut j = job(keys[0], -5.0, material("stone", BlendFunction::None, CullMode::Back));
    j.lights = vec![light];
    let camera = camera();
    let mut pass = ForwardPass::new(camera.clone(), None);
    pass.set_jobs(RenderJobProcessor::separate_opaque_translucent(vec![j]));

    let device = render(&mut pass);
    let draws = device.draws();
    assert_eq!(draws[0].lights, vec![light]);
    assert_eq!(draws[0].view_projection, camera.view_projection_matrix());
}

#[test]
fn test_override_material_replaces_job_material() {
    let keys = entity_keys(1);
    let stone = material("stone", BlendFunction::None, CullMode::Back);
    let highlight = Arc::new(Material::new("highlight"));
    let mut pass = ForwardPass::new(camera(), None);
    pass.set_jobs(RenderJobProcessor::separate_opaque_translucent(vec![job(keys[0], -5.0, stone)]));

    let mut device = RecordingDevice::new();
    let mut ctx = RenderContext::new(&mut device);
    ctx.set_override_material(Some(Arc::clone(&highlight)));
    run_pass(&mut pass, &mut ctx).unwrap();
    drop(ctx);

    assert_eq!(device.draws()[0].material, highlight.id());
}
