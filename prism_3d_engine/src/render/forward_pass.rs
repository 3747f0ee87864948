/// ForwardPass - draws opaque jobs, then translucent jobs back to front
///
/// Opaque jobs are drawn in the order they were given. Translucent jobs
/// are stable-sorted by distance then by material priority before
/// drawing. Two-sided translucent materials are drawn twice, far faces
/// first (front faces culled) then near faces (back faces culled).

use std::sync::Arc;
use glam::Vec4;
use crate::camera::Camera;
use crate::error::Result;
use crate::scene::{CullMode, Material, RenderState};
use super::context::RenderContext;
use super::device::{ClearFlags, DrawCall, FramebufferId};
use super::pass::Pass;
use super::render_job::{RenderJob, RenderJobProcessor, SeparatedJobs};

pub struct ForwardPass {
    camera: Camera,
    target: Option<FramebufferId>,
    clear: Option<Vec4>,
    opaque: Vec<RenderJob>,
    translucent: Vec<RenderJob>,
}

impl ForwardPass {
    /// Pass drawing into `target` (`None` is the window)
    pub fn new(camera: Camera, target: Option<FramebufferId>) -> Self {
        Self {
            camera,
            target,
            clear: Some(Vec4::new(0.0, 0.0, 0.0, 1.0)),
            opaque: Vec::new(),
            translucent: Vec::new(),
        }
    }

    pub fn camera(&self) -> &Camera {
        &self.camera
    }

    pub fn set_camera(&mut self, camera: Camera) {
        self.camera = camera;
    }

    pub fn target(&self) -> Option<FramebufferId> {
        self.target
    }

    pub fn set_target(&mut self, target: Option<FramebufferId>) {
        self.target = target;
    }

    /// Clear color applied in `pre_render`; `None` keeps the target content
    pub fn set_clear_color(&mut self, color: Option<Vec4>) {
        self.clear = color;
    }

    /// Take the opaque and translucent buckets; deferred jobs are ignored
    pub fn set_jobs(&mut self, jobs: SeparatedJobs) {
        self.opaque = jobs.opaque;
        self.translucent = jobs.translucent;
    }

    pub fn opaque_jobs(&self) -> &[RenderJob] {
        &self.opaque
    }

    pub fn translucent_jobs(&self) -> &[RenderJob] {
        &self.translucent
    }

    fn draw_job(&self, ctx: &mut RenderContext, job: &RenderJob, cull_mode: Option<CullMode>) -> Result<()> {
        let material: &Material = ctx
            .override_material()
            .map(Arc::as_ref)
            .unwrap_or(job.material.as_ref());
        let mut render_state: RenderState = *material.render_state();
        if let Some(cull_mode) = cull_mode {
            render_state.cull_mode = cull_mode;
        }
        let call = DrawCall {
            entity: job.entity,
            sub_mesh: job.sub_mesh_index,
            material: material.id(),
            render_state,
            world_transform: job.world_transform,
            view_projection: self.camera.view_projection_matrix(),
            lights: job.lights.clone(),
        };
        ctx.device().draw(&call)
    }
}

impl Pass for ForwardPass {
    fn name(&self) -> &str {
        "ForwardPass"
    }

    fn pre_render(&mut self, ctx: &mut RenderContext) -> Result<()> {
        ctx.set_framebuffer(self.target, 0)?;
        ctx.device().set_viewport(*self.camera.viewport())?;
        if let Some(color) = self.clear {
            ctx.device().clear(ClearFlags::ALL, color)?;
        }
        Ok(())
    }

    fn render(&mut self, ctx: &mut RenderContext) -> Result<()> {
        for job in &self.opaque {
            self.draw_job(ctx, job, None)?;
        }

        RenderJobProcessor::sort_translucent(&mut self.translucent, &self.camera);
        for job in &self.translucent {
            let two_sided = job.material.render_state().cull_mode == CullMode::TwoSided;
            if two_sided {
                self.draw_job(ctx, job, Some(CullMode::Front))?;
                self.draw_job(ctx, job, Some(CullMode::Back))?;
            } else {
                self.draw_job(ctx, job, None)?;
            }
        }
        Ok(())
    }
}

#[cfg(test)]
#[path = "forward_pass_tests.rs"]
mod tests;
