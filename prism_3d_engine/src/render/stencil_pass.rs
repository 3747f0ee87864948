/// StencilRenderPass - marks the pixels covered by a set of jobs
///
/// Color writes are disabled and every drawn pixel gets the stencil
/// reference value. `post_render` turns color writes back on and
/// disables the stencil test.

use glam::Vec4;
use crate::camera::Camera;
use crate::error::Result;
use super::context::RenderContext;
use super::device::{ClearFlags, DrawCall, FramebufferId, StencilMode};
use super::pass::Pass;
use super::render_job::RenderJob;

/// Stencil value written for covered pixels
pub const STENCIL_MARK: u8 = 1;

pub struct StencilRenderPass {
    camera: Camera,
    target: Option<FramebufferId>,
    jobs: Vec<RenderJob>,
}

impl StencilRenderPass {
    pub fn new(camera: Camera, target: Option<FramebufferId>) -> Self {
        Self {
            camera,
            target,
            jobs: Vec::new(),
        }
    }

    pub fn set_camera(&mut self, camera: Camera) {
        self.camera = camera;
    }

    pub fn set_target(&mut self, target: Option<FramebufferId>) {
        self.target = target;
    }

    pub fn set_jobs(&mut self, jobs: Vec<RenderJob>) {
        self.jobs = jobs;
    }

    pub fn jobs(&self) -> &[RenderJob] {
        &self.jobs
    }
}

impl Pass for StencilRenderPass {
    fn name(&self) -> &str {
        "StencilRenderPass"
    }

    fn pre_render(&mut self, ctx: &mut RenderContext) -> Result<()> {
        ctx.set_framebuffer(self.target, 0)?;
        let device = ctx.device();
        device.set_viewport(*self.camera.viewport())?;
        device.clear(ClearFlags::STENCIL | ClearFlags::COLOR, Vec4::ZERO)?;
        device.set_color_mask(false)?;
        device.set_stencil(StencilMode::Write { reference: STENCIL_MARK })
    }

    fn render(&mut self, ctx: &mut RenderContext) -> Result<()> {
        let view_projection = self.camera.view_projection_matrix();
        for job in &self.jobs {
            ctx.device().draw(&DrawCall {
                entity: job.entity,
                sub_mesh: job.sub_mesh_index,
                material: job.material.id(),
                render_state: *job.material.render_state(),
                world_transform: job.world_transform,
                view_projection,
                lights: Vec::new(),
            })?;
        }
        Ok(())
    }

    fn post_render(&mut self, ctx: &mut RenderContext) -> Result<()> {
        let device = ctx.device();
        device.set_color_mask(true)?;
        device.set_stencil(StencilMode::Disabled)
    }
}

#[cfg(test)]
#[path = "stencil_pass_tests.rs"]
mod tests;
