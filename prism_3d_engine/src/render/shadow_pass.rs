/// ShadowPass - renders every shadow-casting light into the shadow atlas
///
/// `prepare()` runs on the scene before the pass: it keeps the caster
/// jobs, repacks the atlas when needed and updates each light's shadow
/// camera (directional lights are fitted to the casters and the view).
/// The pass itself then draws the casters once per light, or once per
/// cube face for point lights, and blurs soft shadows.

use std::sync::Arc;
use glam::{Mat4, Vec3, Vec4};
use crate::camera::Camera;
use crate::engine::Engine;
use crate::error::Result;
use crate::math::{frustum_box_intersection, BoundingBox, IntersectResult};
use crate::scene::light::up_vector_for;
use crate::scene::{BlendFunction, Light, LightKey, LightKind, Material, RenderState, SceneData};
use crate::settings::ShadowSettings;
use super::context::RenderContext;
use super::device::{ClearFlags, DrawCall, FramebufferDesc, FramebufferId, QuadShader, RenderDevice, Viewport};
use super::pass::Pass;
use super::render_job::{RenderJob, RenderJobProcessor};
use super::shadow_atlas::{ShadowAtlasPacker, POINT_LIGHT_FACES};

/// Shadow maps store depth moments; cleared to "nothing occludes"
pub const SHADOW_CLEAR_COLOR: Vec4 = Vec4::ONE;

/// Look direction and up vector of each cube face: +X, -X, -Y, +Y, +Z, -Z
pub const CUBE_FACE_ORIENTATIONS: [(Vec3, Vec3); 6] = [
    (Vec3::X, Vec3::NEG_Y),
    (Vec3::NEG_X, Vec3::NEG_Y),
    (Vec3::NEG_Y, Vec3::NEG_Z),
    (Vec3::Y, Vec3::Z),
    (Vec3::Z, Vec3::NEG_Y),
    (Vec3::NEG_Z, Vec3::NEG_Y),
];

/// Slack added around fitted directional shadow volumes
const FIT_MARGIN: f32 = 0.1;

/// Shadow camera of one cube face of a point light
pub fn cube_face_camera(light: &Light, face: usize) -> Camera {
    let (direction, up) = CUBE_FACE_ORIENTATIONS[face % CUBE_FACE_ORIENTATIONS.len()];
    let eye = light.position();
    let view = Mat4::look_at_rh(eye, eye + direction, up);
    let shadow_camera = light.shadow_camera();
    Camera::from_matrices(view, *shadow_camera.projection_matrix(), *shadow_camera.viewport())
}

/// Fit a directional light's orthographic shadow camera
///
/// The light-space XY window is the smaller of the casters' box and the
/// view frustum; the depth range always covers every caster. Without
/// casters the default shadow camera is used.
pub fn fit_directional_shadow_camera(light: &mut Light, casters: &BoundingBox, view_camera: Option<&Camera>) {
    let Some(direction) = light.direction() else {
        return;
    };
    if casters.is_empty() {
        light.update_shadow_camera();
        return;
    }

    let view = Mat4::look_at_rh(Vec3::ZERO, direction, up_vector_for(direction));
    let to_light = |points: [Vec3; 8]| BoundingBox::from_points(points.map(|p| view.transform_point3(p)));
    let xy_area = |bb: &BoundingBox| bb.width() * bb.height();

    let scene_fit = to_light(casters.corners());
    let mut window = scene_fit;
    if let Some(camera) = view_camera {
        let view_fit = to_light(camera.frustum_corners());
        if xy_area(&view_fit) < xy_area(&scene_fit) {
            window = view_fit;
        }
    }

    // Light space looks down -Z
    let projection = Mat4::orthographic_rh_gl(
        window.min.x - FIT_MARGIN,
        window.max.x + FIT_MARGIN,
        window.min.y - FIT_MARGIN,
        window.max.y + FIT_MARGIN,
        -scene_fit.max.z - FIT_MARGIN,
        -scene_fit.min.z + FIT_MARGIN,
    );
    let resolution = light.shadow_resolution() as f32;
    *light.shadow_camera_mut() =
        Camera::from_matrices(view, projection, Viewport::new(0.0, 0.0, resolution, resolution));
}

pub struct ShadowPass {
    settings: ShadowSettings,
    packer: ShadowAtlasPacker,
    default_material: Arc<Material>,
    atlas: Option<FramebufferId>,
    atlas_layers: u32,
    atlas_dirty: bool,
    blur_target: Option<FramebufferId>,
    cleared_layers: Vec<bool>,
    draw_list: Vec<RenderJob>,
    lights: Vec<(LightKey, Light)>,
}

impl ShadowPass {
    pub fn new(settings: ShadowSettings) -> Self {
        Self {
            settings,
            packer: ShadowAtlasPacker::new(settings.atlas_size),
            default_material: Arc::new(Material::new("prism3d::DefaultShadowMaterial")),
            atlas: None,
            atlas_layers: 0,
            atlas_dirty: true,
            blur_target: None,
            cleared_layers: Vec::new(),
            draw_list: Vec::new(),
            lights: Vec::new(),
        }
    }

    pub fn settings(&self) -> &ShadowSettings {
        &self.settings
    }

    pub fn packer(&self) -> &ShadowAtlasPacker {
        &self.packer
    }

    /// Atlas framebuffer, once created
    pub fn atlas(&self) -> Option<FramebufferId> {
        self.atlas
    }

    pub fn atlas_layers(&self) -> u32 {
        self.atlas_layers
    }

    /// Lights rendered by the next `render`, with their prepared cameras
    pub fn lights(&self) -> &[(LightKey, Light)] {
        &self.lights
    }

    /// Casters rendered by the next `render`
    pub fn draw_list(&self) -> &[RenderJob] {
        &self.draw_list
    }

    /// Gather casters and lights for this frame
    ///
    /// `jobs` are candidate casters (non-casters are dropped here).
    /// `max_layers` is the device's array layer limit.
    pub fn prepare(
        &mut self,
        scene: &mut SceneData,
        jobs: &[RenderJob],
        view_camera: Option<&Camera>,
        max_layers: u32,
    ) {
        self.draw_list = jobs.iter().filter(|job| job.shadow_caster).cloned().collect();

        let casters: Vec<LightKey> = scene
            .lights()
            .filter(|(_, light)| light.casts_shadow())
            .map(|(key, _)| key)
            .collect();

        if self.packer.update(scene, &casters, max_layers) {
            self.atlas_dirty = true;
        }

        let caster_box = RenderJobProcessor::bounding_box(&self.draw_list);
        self.lights.clear();
        for key in casters {
            let Some(light) = scene.light_mut(key) else {
                continue;
            };
            if light.is_directional() {
                fit_directional_shadow_camera(light, &caster_box, view_camera);
            } else {
                light.update_shadow_camera();
            }
            if light.atlas_slot().is_some() {
                self.lights.push((key, light.clone()));
            }
        }
    }

    /// Release the atlas and blur target; they are created again on the next run
    pub fn release_targets(&mut self, device: &mut dyn RenderDevice) -> Result<()> {
        if let Some(atlas) = self.atlas.take() {
            device.destroy_framebuffer(atlas)?;
        }
        if let Some(blur) = self.blur_target.take() {
            device.destroy_framebuffer(blur)?;
        }
        self.atlas_layers = 0;
        self.atlas_dirty = true;
        Ok(())
    }

    /// Create the atlas and blur target, replacing the atlas when its layer count changed
    fn ensure_targets(&mut self, ctx: &mut RenderContext) -> Result<()> {
        let size = self.settings.atlas_size;
        if self.atlas_dirty || self.atlas.is_none() {
            let layers = self.packer.layer_count().max(1);
            if self.atlas.is_none() || layers != self.atlas_layers {
                if let Some(old) = self.atlas.take() {
                    ctx.device().destroy_framebuffer(old)?;
                }
                self.atlas = Some(ctx.device().create_framebuffer(&FramebufferDesc {
                    width: size,
                    height: size,
                    layers,
                    depth_stencil: true,
                })?);
                self.atlas_layers = layers;
            }
            self.atlas_dirty = false;
        }
        if self.blur_target.is_none() {
            self.blur_target = Some(ctx.device().create_framebuffer(&FramebufferDesc {
                width: size,
                height: size,
                layers: 1,
                depth_stencil: false,
            })?);
        }
        Ok(())
    }

    /// Full clear on the first write to a layer this frame, depth-only after
    fn clear_layer(&mut self, ctx: &mut RenderContext, layer: u32) -> Result<()> {
        let index = layer as usize;
        if self.cleared_layers.get(index).copied().unwrap_or(false) {
            ctx.device().clear(ClearFlags::DEPTH, SHADOW_CLEAR_COLOR)
        } else {
            if let Some(flag) = self.cleared_layers.get_mut(index) {
                *flag = true;
            }
            ctx.device().clear(ClearFlags::ALL, SHADOW_CLEAR_COLOR)
        }
    }

    fn draw_casters(&self, ctx: &mut RenderContext, camera: &Camera, material: &Material) -> Result<()> {
        let view_projection = camera.view_projection_matrix();
        for job in &self.draw_list {
            if frustum_box_intersection(camera.frustum(), &job.bounding_box) == IntersectResult::Outside {
                continue;
            }
            // Entity state, never blended
            let render_state = RenderState {
                blend_function: BlendFunction::None,
                ..*job.material.render_state()
            };
            ctx.device().draw(&DrawCall {
                entity: job.entity,
                sub_mesh: job.sub_mesh_index,
                material: material.id(),
                render_state,
                world_transform: job.world_transform,
                view_projection,
                lights: Vec::new(),
            })?;
        }
        Ok(())
    }

    fn render_light(&mut self, ctx: &mut RenderContext, light: &Light) -> Result<()> {
        let (Some(slot), Some(atlas)) = (light.atlas_slot(), self.atlas) else {
            return Ok(());
        };
        let material = light
            .shadow_material()
            .cloned()
            .unwrap_or_else(|| Arc::clone(&self.default_material));
        ctx.set_override_material(Some(Arc::clone(&material)));
        let viewport = Viewport::square(slot.coord.x, slot.coord.y, slot.resolution);

        if let LightKind::Point { .. } = light.kind() {
            for face in 0..POINT_LIGHT_FACES {
                let layer = slot.layer + face;
                if layer >= self.atlas_layers {
                    break;
                }
                ctx.set_framebuffer(Some(atlas), layer)?;
                ctx.device().set_viewport(viewport)?;
                self.clear_layer(ctx, layer)?;
                let camera = cube_face_camera(light, face as usize);
                self.draw_casters(ctx, &camera, &material)?;
            }
            return Ok(());
        }

        if slot.layer >= self.atlas_layers {
            return Ok(());
        }
        ctx.set_framebuffer(Some(atlas), slot.layer)?;
        ctx.device().set_viewport(viewport)?;
        self.clear_layer(ctx, slot.layer)?;
        self.draw_casters(ctx, light.shadow_camera(), &material)?;

        if light.shadow_softness() > self.settings.blur_softness_epsilon {
            self.blur(ctx, atlas, slot.layer, viewport)?;
        }
        Ok(())
    }

    /// Separable Gaussian blur of one atlas region: horizontal then vertical
    fn blur(&self, ctx: &mut RenderContext, atlas: FramebufferId, layer: u32, viewport: Viewport) -> Result<()> {
        let Some(temp) = self.blur_target else {
            return Ok(());
        };
        let (Some(atlas_texture), Some(temp_texture)) =
            (ctx.device().color_texture(atlas), ctx.device().color_texture(temp))
        else {
            return Ok(());
        };
        let radius = self.settings.blur_kernel_radius;

        ctx.set_framebuffer(Some(temp), 0)?;
        ctx.device().set_viewport(viewport)?;
        ctx.device().bind_texture(0, atlas_texture)?;
        ctx.device().draw_fullscreen_quad(QuadShader::GaussianBlur {
            horizontal: true,
            radius,
            source_layer: layer,
        })?;

        ctx.set_framebuffer(Some(atlas), layer)?;
        ctx.device().set_viewport(viewport)?;
        ctx.device().bind_texture(0, temp_texture)?;
        ctx.device().draw_fullscreen_quad(QuadShader::GaussianBlur {
            horizontal: false,
            radius,
            source_layer: 0,
        })
    }
}

impl Default for ShadowPass {
    fn default() -> Self {
        Self::new(Engine::settings().shadows)
    }
}

impl Pass for ShadowPass {
    fn name(&self) -> &str {
        "ShadowPass"
    }

    fn pre_render(&mut self, ctx: &mut RenderContext) -> Result<()> {
        self.ensure_targets(ctx)?;
        self.cleared_layers.clear();
        self.cleared_layers.resize(self.atlas_layers as usize, false);
        Ok(())
    }

    fn render(&mut self, ctx: &mut RenderContext) -> Result<()> {
        let lights = std::mem::take(&mut self.lights);
        let result = lights
            .iter()
            .try_for_each(|(_, light)| self.render_light(ctx, light));
        self.lights = lights;
        result
    }
}

#[cfg(test)]
#[path = "shadow_pass_tests.rs"]
mod tests;
