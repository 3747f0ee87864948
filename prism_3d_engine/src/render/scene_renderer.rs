/// SceneRenderer - runs one frame of a scene through the pass pipeline
///
/// Frame order: BVH sync, camera frustum query, job creation, shadow
/// pass, forward pass (opaque then translucent), outline pass for the
/// selection. Every pass runs through `run_pass`, so each one leaves
/// the render context as it found it.

use crate::bvh::BvhUpdateStats;
use crate::camera::Camera;
use crate::engine::Engine;
use crate::engine_trace;
use crate::error::Result;
use crate::scene::{EntityKey, Scene};
use crate::settings::ShadowSettings;
use super::context::RenderContext;
use super::device::{FramebufferId, RenderDevice};
use super::forward_pass::ForwardPass;
use super::outline_pass::OutlinePass;
use super::pass::run_pass;
use super::render_job::RenderJobProcessor;
use super::shadow_pass::ShadowPass;

/// What one frame did
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct FrameStats {
    pub bvh: BvhUpdateStats,
    /// Entities returned by the camera frustum query
    pub visible_entities: usize,
    pub opaque_jobs: usize,
    pub translucent_jobs: usize,
    /// Jobs skipped by the forward pass
    pub deferred_jobs: usize,
    /// Lights rendered into the shadow atlas
    pub shadow_lights: usize,
    pub outlined_jobs: usize,
}

pub struct SceneRenderer {
    target: Option<FramebufferId>,
    shadow_pass: ShadowPass,
    outline_pass: Option<OutlinePass>,
}

impl SceneRenderer {
    /// Renderer drawing to the window with the engine-wide shadow settings
    pub fn new() -> Self {
        Self::with_settings(Engine::settings().shadows)
    }

    pub fn with_settings(shadows: ShadowSettings) -> Self {
        Self {
            target: None,
            shadow_pass: ShadowPass::new(shadows),
            outline_pass: None,
        }
    }

    pub fn target(&self) -> Option<FramebufferId> {
        self.target
    }

    /// Final color target; `None` is the window
    pub fn set_target(&mut self, target: Option<FramebufferId>) {
        self.target = target;
    }

    pub fn shadow_pass(&self) -> &ShadowPass {
        &self.shadow_pass
    }

    /// Release every offscreen target owned by the passes
    pub fn release_targets(&mut self, device: &mut dyn RenderDevice) -> Result<()> {
        self.shadow_pass.release_targets(device)?;
        if let Some(outline) = self.outline_pass.as_mut() {
            outline.release_targets(device)?;
        }
        Ok(())
    }

    /// Render one frame
    pub fn render(
        &mut self,
        device: &mut dyn RenderDevice,
        scene: &mut Scene,
        camera: &Camera,
        selection: &[EntityKey],
    ) -> Result<FrameStats> {
        let mut stats = FrameStats {
            bvh: scene.update(),
            ..FrameStats::default()
        };

        let visible = scene.frustum_query(camera.frustum());
        stats.visible_entities = visible.len();
        let mut jobs = RenderJobProcessor::create_render_jobs(scene.data(), &visible);

        // Off-screen casters still cast into the view
        let casters = RenderJobProcessor::create_all_render_jobs(scene.data());
        let max_layers = device.max_array_texture_layers();
        self.shadow_pass.prepare(scene.data_mut(), &casters, Some(camera), max_layers);
        stats.shadow_lights = self.shadow_pass.lights().len();

        RenderJobProcessor::assign_lights(&mut jobs, scene.data(), scene.bvh());
        let separated = RenderJobProcessor::separate_opaque_translucent(jobs);
        stats.opaque_jobs = separated.opaque.len();
        stats.translucent_jobs = separated.translucent.len();
        stats.deferred_jobs = separated.deferred.len();

        let mut ctx = RenderContext::new(device);
        run_pass(&mut self.shadow_pass, &mut ctx)?;

        let mut forward = ForwardPass::new(camera.clone(), self.target);
        forward.set_jobs(separated);
        run_pass(&mut forward, &mut ctx)?;

        if !selection.is_empty() {
            let selected = RenderJobProcessor::create_render_jobs(scene.data(), selection);
            stats.outlined_jobs = selected.len();
            let outline = self
                .outline_pass
                .get_or_insert_with(|| OutlinePass::new(camera.clone(), None));
            outline.set_camera(camera.clone());
            outline.set_target(self.target);
            outline.set_selection(selected);
            run_pass(outline, &mut ctx)?;
        }

        engine_trace!(
            "prism3d::SceneRenderer",
            "Frame: {} visible, {} opaque, {} translucent, {} shadowed lights",
            stats.visible_entities,
            stats.opaque_jobs,
            stats.translucent_jobs,
            stats.shadow_lights
        );
        Ok(stats)
    }
}

impl Default for SceneRenderer {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
#[path = "scene_renderer_tests.rs"]
mod tests;
