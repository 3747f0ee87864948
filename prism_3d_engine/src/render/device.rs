/// RenderDevice trait - the GPU backend as seen by the render passes
///
/// The passes only decide what is drawn, in which order and with which
/// state. Everything API-specific sits behind this trait.

use glam::{Mat4, Vec4};
use bitflags::bitflags;
use crate::error::Result;
use crate::scene::{EntityKey, LightKey, MaterialId, RenderState};

/// Handle of a framebuffer created by a device
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct FramebufferId(pub u32);

/// Handle of a texture owned by a device
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct TextureId(pub u32);

/// Viewport dimensions and depth range
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Viewport {
    pub x: f32,
    pub y: f32,
    pub width: f32,
    pub height: f32,
    pub min_depth: f32,
    pub max_depth: f32,
}

impl Viewport {
    /// Viewport with the full 0..1 depth range
    pub fn new(x: f32, y: f32, width: f32, height: f32) -> Self {
        Self {
            x,
            y,
            width,
            height,
            min_depth: 0.0,
            max_depth: 1.0,
        }
    }

    /// Square viewport of `size` texels at an atlas coordinate
    pub fn square(x: u32, y: u32, size: u32) -> Self {
        Self::new(x as f32, y as f32, size as f32, size as f32)
    }
}

bitflags! {
    /// Which attachments `clear` touches
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
    pub struct ClearFlags: u32 {
        const COLOR   = 1 << 0;
        const DEPTH   = 1 << 1;
        const STENCIL = 1 << 2;
        const ALL     = Self::COLOR.bits() | Self::DEPTH.bits() | Self::STENCIL.bits();
    }
}

/// Stencil configuration
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum StencilMode {
    #[default]
    Disabled,
    /// Always pass, write `reference` where fragments land
    Write { reference: u8 },
    /// Pass only where the stored value equals `reference`
    TestEqual { reference: u8 },
    /// Pass only where the stored value differs from `reference`
    TestNotEqual { reference: u8 },
}

/// Built-in full-screen shaders
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum QuadShader {
    /// One direction of a separable Gaussian blur
    GaussianBlur { horizontal: bool, radius: u32, source_layer: u32 },
    /// Grow a binary mask by `thickness` texels and draw the ring in `color`
    Dilate { thickness: u32, color: Vec4 },
    /// Plain copy of the bound texture
    Copy,
    /// Solid color, no input
    Fill { color: Vec4 },
}

/// Framebuffer description
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FramebufferDesc {
    pub width: u32,
    pub height: u32,
    /// Color texture array layers (1 for a plain 2D target)
    pub layers: u32,
    pub depth_stencil: bool,
}

/// One draw of one sub-mesh
#[derive(Debug, Clone, PartialEq)]
pub struct DrawCall {
    pub entity: EntityKey,
    pub sub_mesh: usize,
    /// Material whose shader is used (override material if one is active)
    pub material: MaterialId,
    /// State to draw with; a copy, the material itself is never modified
    pub render_state: RenderState,
    pub world_transform: Mat4,
    pub view_projection: Mat4,
    pub lights: Vec<LightKey>,
}

/// GPU backend used by the render passes
///
/// All methods record or execute immediately; ordering is the call order.
pub trait RenderDevice {
    /// Largest supported array texture layer count
    fn max_array_texture_layers(&self) -> u32;

    /// Create a framebuffer with a color texture (array) and optional depth/stencil
    fn create_framebuffer(&mut self, desc: &FramebufferDesc) -> Result<FramebufferId>;

    /// Release a framebuffer and its textures; the id becomes invalid
    fn destroy_framebuffer(&mut self, framebuffer: FramebufferId) -> Result<()>;

    /// Color texture of a framebuffer
    fn color_texture(&self, framebuffer: FramebufferId) -> Option<TextureId>;

    /// Bind a framebuffer layer as render target; `None` is the window
    fn bind_framebuffer(&mut self, framebuffer: Option<FramebufferId>, layer: u32) -> Result<()>;

    fn set_viewport(&mut self, viewport: Viewport) -> Result<()>;

    fn clear(&mut self, flags: ClearFlags, color: Vec4) -> Result<()>;

    fn set_color_mask(&mut self, enabled: bool) -> Result<()>;

    fn set_stencil(&mut self, mode: StencilMode) -> Result<()>;

    fn bind_texture(&mut self, slot: u32, texture: TextureId) -> Result<()>;

    fn draw(&mut self, call: &DrawCall) -> Result<()>;

    fn draw_fullscreen_quad(&mut self, shader: QuadShader) -> Result<()>;
}
