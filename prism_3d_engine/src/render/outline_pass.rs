/// OutlinePass - draws a colored ring around a selection of jobs
///
/// Three steps, all through nested passes:
/// 1. a stencil pass marks the selection in an offscreen mask target
/// 2. a fill quad turns the stencil marks into a binary color mask
/// 3. a dilate quad grows the mask by `thickness` texels into the target

use glam::Vec4;
use crate::camera::Camera;
use crate::engine_debug;
use crate::error::Result;
use super::context::RenderContext;
use super::device::{FramebufferDesc, FramebufferId, QuadShader, RenderDevice, StencilMode, Viewport};
use super::full_quad_pass::FullQuadPass;
use super::pass::{run_pass, Pass};
use super::render_job::RenderJob;
use super::stencil_pass::{StencilRenderPass, STENCIL_MARK};

pub const DEFAULT_OUTLINE_COLOR: Vec4 = Vec4::new(1.0, 0.6, 0.0, 1.0);
pub const DEFAULT_OUTLINE_THICKNESS: u32 = 3;

pub struct OutlinePass {
    camera: Camera,
    target: Option<FramebufferId>,
    color: Vec4,
    thickness: u32,
    mask: Option<(FramebufferId, u32, u32)>,
    stencil: StencilRenderPass,
}

impl OutlinePass {
    pub fn new(camera: Camera, target: Option<FramebufferId>) -> Self {
        Self {
            stencil: StencilRenderPass::new(camera.clone(), None),
            camera,
            target,
            color: DEFAULT_OUTLINE_COLOR,
            thickness: DEFAULT_OUTLINE_THICKNESS,
            mask: None,
        }
    }

    pub fn set_camera(&mut self, camera: Camera) {
        self.stencil.set_camera(camera.clone());
        self.camera = camera;
    }

    pub fn set_target(&mut self, target: Option<FramebufferId>) {
        self.target = target;
    }

    pub fn set_style(&mut self, color: Vec4, thickness: u32) {
        self.color = color;
        self.thickness = thickness;
    }

    /// Selected jobs; an empty selection draws nothing
    pub fn set_selection(&mut self, jobs: Vec<RenderJob>) {
        self.stencil.set_jobs(jobs);
    }

    /// Mask framebuffer, once created
    pub fn mask(&self) -> Option<FramebufferId> {
        self.mask.map(|(framebuffer, _, _)| framebuffer)
    }

    /// Release the mask target; it is created again on the next run
    pub fn release_targets(&mut self, device: &mut dyn RenderDevice) -> Result<()> {
        if let Some((mask, _, _)) = self.mask.take() {
            device.destroy_framebuffer(mask)?;
        }
        Ok(())
    }

    fn viewport_size(&self) -> (u32, u32) {
        let viewport = self.camera.viewport();
        (viewport.width.max(1.0) as u32, viewport.height.max(1.0) as u32)
    }

    /// Mask target matching the viewport size
    fn ensure_mask(&mut self, ctx: &mut RenderContext) -> Result<FramebufferId> {
        let (width, height) = self.viewport_size();
        if let Some((framebuffer, w, h)) = self.mask {
            if (w, h) == (width, height) {
                return Ok(framebuffer);
            }
        }
        if let Some((old, _, _)) = self.mask.take() {
            ctx.device().destroy_framebuffer(old)?;
        }
        let framebuffer = ctx.device().create_framebuffer(&FramebufferDesc {
            width,
            height,
            layers: 1,
            depth_stencil: true,
        })?;
        engine_debug!("prism3d::OutlinePass", "Created {}x{} outline mask", width, height);
        self.mask = Some((framebuffer, width, height));
        Ok(framebuffer)
    }
}

impl Pass for OutlinePass {
    fn name(&self) -> &str {
        "OutlinePass"
    }

    fn pre_render(&mut self, ctx: &mut RenderContext) -> Result<()> {
        if self.stencil.jobs().is_empty() {
            return Ok(());
        }
        let mask = self.ensure_mask(ctx)?;
        self.stencil.set_target(Some(mask));
        Ok(())
    }

    fn render(&mut self, ctx: &mut RenderContext) -> Result<()> {
        let Some((mask, width, height)) = self.mask else {
            return Ok(());
        };
        if self.stencil.jobs().is_empty() {
            return Ok(());
        }
        run_pass(&mut self.stencil, ctx)?;

        let mask_viewport = Viewport::new(0.0, 0.0, width as f32, height as f32);
        ctx.device().set_stencil(StencilMode::TestEqual { reference: STENCIL_MARK })?;
        let mut fill = FullQuadPass::new(QuadShader::Fill { color: Vec4::ONE }, Some(mask), mask_viewport);
        let filled = run_pass(&mut fill, ctx);
        ctx.device().set_stencil(StencilMode::Disabled)?;
        filled?;

        let Some(mask_texture) = ctx.device().color_texture(mask) else {
            return Ok(());
        };
        let mut dilate = FullQuadPass::new(
            QuadShader::Dilate { thickness: self.thickness, color: self.color },
            self.target,
            *self.camera.viewport(),
        );
        dilate.set_inputs(vec![mask_texture]);
        run_pass(&mut dilate, ctx)
    }
}

#[cfg(test)]
#[path = "outline_pass_tests.rs"]
mod tests;
