/// Pass trait - one step of the frame pipeline
///
/// A pass runs `pre_render` (bind target, set overrides, clear),
/// `render` (issue draws) and `post_render` (undo pass-specific device
/// state). `run_pass` wraps the three in a `RenderContext` scope so the
/// framebuffer and override material seen by the caller are restored
/// afterwards. Passes may run other passes from inside `render`.

use crate::error::Result;
use super::context::RenderContext;

pub trait Pass {
    /// Name used in log messages
    fn name(&self) -> &str;

    fn pre_render(&mut self, ctx: &mut RenderContext) -> Result<()>;

    fn render(&mut self, ctx: &mut RenderContext) -> Result<()>;

    fn post_render(&mut self, _ctx: &mut RenderContext) -> Result<()> {
        Ok(())
    }
}

/// Run a pass inside a saved render state scope
///
/// Once `pre_render` succeeded, `post_render` runs even if `render`
/// failed. The first error is returned.
pub fn run_pass(pass: &mut dyn Pass, ctx: &mut RenderContext) -> Result<()> {
    let mut scope = ctx.scope();
    crate::engine_trace!("prism3d::Pass", "Running {}", pass.name());
    pass.pre_render(&mut scope)?;
    let rendered = pass.render(&mut scope);
    let restored = pass.post_render(&mut scope);
    rendered.and(restored)
}
