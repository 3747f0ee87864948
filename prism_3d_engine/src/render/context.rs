/// RenderContext - explicit render state shared by the passes
///
/// Holds the device plus the state passes push and pop: the bound
/// framebuffer (and layer) and the override material. `scope()` saves
/// that state and the returned guard restores it when dropped, so a pass
/// cannot leak its framebuffer or override material to the next one,
/// even when it returns early with an error.

use std::ops::{Deref, DerefMut};
use std::sync::Arc;
use crate::error::Result;
use crate::scene::Material;
use super::device::{FramebufferId, RenderDevice};

/// Saved part of the context
#[derive(Debug, Clone)]
pub struct SavedRenderState {
    framebuffer: Option<FramebufferId>,
    layer: u32,
    override_material: Option<Arc<Material>>,
}

pub struct RenderContext<'d> {
    device: &'d mut dyn RenderDevice,
    framebuffer: Option<FramebufferId>,
    layer: u32,
    override_material: Option<Arc<Material>>,
}

impl<'d> RenderContext<'d> {
    /// Context starting on the window framebuffer without override material
    pub fn new(device: &'d mut dyn RenderDevice) -> Self {
        Self {
            device,
            framebuffer: None,
            layer: 0,
            override_material: None,
        }
    }

    pub fn device(&mut self) -> &mut dyn RenderDevice {
        &mut *self.device
    }

    pub fn framebuffer(&self) -> Option<FramebufferId> {
        self.framebuffer
    }

    pub fn framebuffer_layer(&self) -> u32 {
        self.layer
    }

    pub fn override_material(&self) -> Option<&Arc<Material>> {
        self.override_material.as_ref()
    }

    /// Bind a framebuffer layer and remember it
    pub fn set_framebuffer(&mut self, framebuffer: Option<FramebufferId>, layer: u32) -> Result<()> {
        self.device.bind_framebuffer(framebuffer, layer)?;
        self.framebuffer = framebuffer;
        self.layer = layer;
        Ok(())
    }

    pub fn set_override_material(&mut self, material: Option<Arc<Material>>) {
        self.override_material = material;
    }

    pub fn save(&self) -> SavedRenderState {
        SavedRenderState {
            framebuffer: self.framebuffer,
            layer: self.layer,
            override_material: self.override_material.clone(),
        }
    }

    /// Put back a saved state; the framebuffer is rebound only if it changed
    pub fn restore(&mut self, saved: &SavedRenderState) -> Result<()> {
        self.override_material = saved.override_material.clone();
        if self.framebuffer != saved.framebuffer || self.layer != saved.layer {
            self.set_framebuffer(saved.framebuffer, saved.layer)?;
        }
        Ok(())
    }

    /// Save the state; it is restored when the guard is dropped
    pub fn scope(&mut self) -> RenderScope<'_, 'd> {
        let saved = self.save();
        RenderScope { context: self, saved }
    }
}

/// Guard returned by `RenderContext::scope()`
pub struct RenderScope<'s, 'd> {
    context: &'s mut RenderContext<'d>,
    saved: SavedRenderState,
}

impl<'d> Deref for RenderScope<'_, 'd> {
    type Target = RenderContext<'d>;

    fn deref(&self) -> &Self::Target {
        self.context
    }
}

impl<'d> DerefMut for RenderScope<'_, 'd> {
    fn deref_mut(&mut self) -> &mut Self::Target {
        self.context
    }
}

impl Drop for RenderScope<'_, '_> {
    fn drop(&mut self) {
        if let Err(e) = self.context.restore(&self.saved) {
            crate::engine_error!("prism3d::RenderContext", "Failed to restore render state: {}", e);
        }
    }
}

#[cfg(test)]
#[path = "context_tests.rs"]
mod tests;
