/// FullQuadPass - draws one screen-covering quad with a fixed shader
///
/// Input textures are bound to consecutive slots starting at 0.

use crate::error::Result;
use super::context::RenderContext;
use super::device::{FramebufferId, QuadShader, TextureId, Viewport};
use super::pass::Pass;

pub struct FullQuadPass {
    shader: QuadShader,
    target: Option<FramebufferId>,
    viewport: Viewport,
    inputs: Vec<TextureId>,
}

impl FullQuadPass {
    pub fn new(shader: QuadShader, target: Option<FramebufferId>, viewport: Viewport) -> Self {
        Self {
            shader,
            target,
            viewport,
            inputs: Vec::new(),
        }
    }

    pub fn shader(&self) -> QuadShader {
        self.shader
    }

    pub fn set_shader(&mut self, shader: QuadShader) {
        self.shader = shader;
    }

    pub fn set_target(&mut self, target: Option<FramebufferId>, viewport: Viewport) {
        self.target = target;
        self.viewport = viewport;
    }

    pub fn set_inputs(&mut self, inputs: Vec<TextureId>) {
        self.inputs = inputs;
    }
}

impl Pass for FullQuadPass {
    fn name(&self) -> &str {
        "FullQuadPass"
    }

    fn pre_render(&mut self, ctx: &mut RenderContext) -> Result<()> {
        ctx.set_framebuffer(self.target, 0)?;
        ctx.device().set_viewport(self.viewport)?;
        for (slot, texture) in self.inputs.iter().enumerate() {
            ctx.device().bind_texture(slot as u32, *texture)?;
        }
        Ok(())
    }

    fn render(&mut self, ctx: &mut RenderContext) -> Result<()> {
        ctx.device().draw_fullscreen_quad(self.shader)
    }
}
