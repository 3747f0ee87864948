/// Recording device - headless `RenderDevice` that logs every command
///
/// Used by tests and tools to check draw order and state without a GPU.

use glam::Vec4;
use crate::engine_bail;
use crate::error::Result;
use super::device::{
    ClearFlags, DrawCall, FramebufferDesc, FramebufferId, QuadShader, RenderDevice,
    StencilMode, TextureId, Viewport,
};

/// Default array layer limit, matching common desktop GPUs
pub const DEFAULT_MAX_ARRAY_LAYERS: u32 = 256;

/// One recorded device call
#[derive(Debug, Clone, PartialEq)]
pub enum DeviceCommand {
    CreateFramebuffer { framebuffer: FramebufferId, desc: FramebufferDesc },
    DestroyFramebuffer(FramebufferId),
    BindFramebuffer { framebuffer: Option<FramebufferId>, layer: u32 },
    SetViewport(Viewport),
    Clear { flags: ClearFlags, color: Vec4 },
    SetColorMask(bool),
    SetStencil(StencilMode),
    BindTexture { slot: u32, texture: TextureId },
    Draw(DrawCall),
    DrawFullscreenQuad(QuadShader),
}

#[derive(Debug)]
pub struct RecordingDevice {
    commands: Vec<DeviceCommand>,
    /// Indexed by id; released slots stay `None` so ids are never reused
    framebuffers: Vec<Option<FramebufferDesc>>,
    max_array_layers: u32,
    fail_draws: bool,
}

impl RecordingDevice {
    pub fn new() -> Self {
        Self::with_max_array_layers(DEFAULT_MAX_ARRAY_LAYERS)
    }

    pub fn with_max_array_layers(max_array_layers: u32) -> Self {
        Self {
            commands: Vec::new(),
            framebuffers: Vec::new(),
            max_array_layers,
            fail_draws: false,
        }
    }

    pub fn commands(&self) -> &[DeviceCommand] {
        &self.commands
    }

    /// Forget recorded commands (framebuffers stay alive)
    pub fn clear_commands(&mut self) {
        self.commands.clear();
    }

    /// Recorded draws, in order
    pub fn draws(&self) -> Vec<&DrawCall> {
        self.commands
            .iter()
            .filter_map(|c| match c {
                DeviceCommand::Draw(call) => Some(call),
                _ => None,
            })
            .collect()
    }

    /// Make every following `draw` fail, to exercise error paths
    pub fn set_fail_draws(&mut self, fail: bool) {
        self.fail_draws = fail;
    }

    pub fn framebuffer_desc(&self, framebuffer: FramebufferId) -> Option<&FramebufferDesc> {
        self.framebuffers.get(framebuffer.0 as usize).and_then(Option::as_ref)
    }

    /// Framebuffers created and not yet destroyed
    pub fn live_framebuffer_count(&self) -> usize {
        self.framebuffers.iter().filter(|fb| fb.is_some()).count()
    }

    fn check_framebuffer(&self, framebuffer: FramebufferId) -> Result<()> {
        if self.framebuffer_desc(framebuffer).is_none() {
            engine_bail!("prism3d::RecordingDevice", "Unknown framebuffer {}", framebuffer.0);
        }
        Ok(())
    }
}

impl Default for RecordingDevice {
    fn default() -> Self {
        Self::new()
    }
}

impl RenderDevice for RecordingDevice {
    fn max_array_texture_layers(&self) -> u32 {
        self.max_array_layers
    }

    fn create_framebuffer(&mut self, desc: &FramebufferDesc) -> Result<FramebufferId> {
        if desc.width == 0 || desc.height == 0 || desc.layers == 0 {
            engine_bail!(
                "prism3d::RecordingDevice",
                "Invalid framebuffer size {}x{}x{}",
                desc.width,
                desc.height,
                desc.layers
            );
        }
        let framebuffer = FramebufferId(self.framebuffers.len() as u32);
        self.framebuffers.push(Some(*desc));
        self.commands.push(DeviceCommand::CreateFramebuffer { framebuffer, desc: *desc });
        Ok(framebuffer)
    }

    fn destroy_framebuffer(&mut self, framebuffer: FramebufferId) -> Result<()> {
        self.check_framebuffer(framebuffer)?;
        if let Some(slot) = self.framebuffers.get_mut(framebuffer.0 as usize) {
            *slot = None;
        }
        self.commands.push(DeviceCommand::DestroyFramebuffer(framebuffer));
        Ok(())
    }

    fn color_texture(&self, framebuffer: FramebufferId) -> Option<TextureId> {
        // One color texture per framebuffer, sharing its index
        self.framebuffer_desc(framebuffer).map(|_| TextureId(framebuffer.0))
    }

    fn bind_framebuffer(&mut self, framebuffer: Option<FramebufferId>, layer: u32) -> Result<()> {
        if let Some(fb) = framebuffer {
            self.check_framebuffer(fb)?;
            if let Some(desc) = self.framebuffer_desc(fb) {
                if layer >= desc.layers {
                    engine_bail!(
                        "prism3d::RecordingDevice",
                        "Layer {} out of range for framebuffer {} ({} layers)",
                        layer,
                        fb.0,
                        desc.layers
                    );
                }
            }
        }
        self.commands.push(DeviceCommand::BindFramebuffer { framebuffer, layer });
        Ok(())
    }

    fn set_viewport(&mut self, viewport: Viewport) -> Result<()> {
        self.commands.push(DeviceCommand::SetViewport(viewport));
        Ok(())
    }

    fn clear(&mut self, flags: ClearFlags, color: Vec4) -> Result<()> {
        self.commands.push(DeviceCommand::Clear { flags, color });
        Ok(())
    }

    fn set_color_mask(&mut self, enabled: bool) -> Result<()> {
        self.commands.push(DeviceCommand::SetColorMask(enabled));
        Ok(())
    }

    fn set_stencil(&mut self, mode: StencilMode) -> Result<()> {
        self.commands.push(DeviceCommand::SetStencil(mode));
        Ok(())
    }

    fn bind_texture(&mut self, slot: u32, texture: TextureId) -> Result<()> {
        self.commands.push(DeviceCommand::BindTexture { slot, texture });
        Ok(())
    }

    fn draw(&mut self, call: &DrawCall) -> Result<()> {
        if self.fail_draws {
            engine_bail!("prism3d::RecordingDevice", "Draw of sub-mesh {} rejected", call.sub_mesh);
        }
        self.commands.push(DeviceCommand::Draw(call.clone()));
        Ok(())
    }

    fn draw_fullscreen_quad(&mut self, shader: QuadShader) -> Result<()> {
        self.commands.push(DeviceCommand::DrawFullscreenQuad(shader));
        Ok(())
    }
}

#[cfg(test)]
#[path = "recording_device_tests.rs"]
mod tests;
