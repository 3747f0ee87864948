/// Material — render state read by the passes
///
/// Materials are shared through `Arc<Material>` and never mutated by a
/// pass. When a pass needs different state for one draw (cull mode flip,
/// shadow override) it copies the `RenderState` into the draw call.

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, OnceLock};

static NEXT_MATERIAL_ID: AtomicU64 = AtomicU64::new(1);

/// Unique material identifier
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct MaterialId(pub u64);

impl MaterialId {
    fn next() -> Self {
        MaterialId(NEXT_MATERIAL_ID.fetch_add(1, Ordering::Relaxed))
    }
}

/// Face culling mode
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum CullMode {
    /// Cull back faces
    #[default]
    Back,
    /// Cull front faces
    Front,
    /// No culling
    TwoSided,
}

/// Blend function
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum BlendFunction {
    /// Opaque, no blending
    #[default]
    None,
    /// src_alpha / one_minus_src_alpha
    AlphaBlend,
    /// Alpha test against `alpha_mask_threshold`, no blending
    AlphaMask,
    /// Additive
    OneToOne,
}

/// Fixed-function state of a material
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RenderState {
    pub cull_mode: CullMode,
    pub blend_function: BlendFunction,
    /// Higher priorities draw first among translucent jobs
    pub priority: i32,
    /// Opaque materials with `false` belong to a deferred path
    pub use_forward_path: bool,
    pub alpha_mask_threshold: f32,
}

impl Default for RenderState {
    fn default() -> Self {
        Self {
            cull_mode: CullMode::Back,
            blend_function: BlendFunction::None,
            priority: 0,
            use_forward_path: true,
            alpha_mask_threshold: 0.001,
        }
    }
}

impl RenderState {
    /// Blended materials must be drawn back to front
    pub fn is_translucent(&self) -> bool {
        matches!(self.blend_function, BlendFunction::AlphaBlend | BlendFunction::OneToOne)
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct Material {
    id: MaterialId,
    name: String,
    render_state: RenderState,
}

impl Material {
    /// New opaque material with default state and a fresh id
    pub fn new(name: impl Into<String>) -> Self {
        Self::with_render_state(name, RenderState::default())
    }

    pub fn with_render_state(name: impl Into<String>, render_state: RenderState) -> Self {
        Self {
            id: MaterialId::next(),
            name: name.into(),
            render_state,
        }
    }

    /// Shared fallback used when nothing else provides a material
    pub fn shared_default() -> Arc<Material> {
        static DEFAULT: OnceLock<Arc<Material>> = OnceLock::new();
        Arc::clone(DEFAULT.get_or_init(|| Arc::new(Material::new("prism3d::DefaultMaterial"))))
    }

    pub fn id(&self) -> MaterialId {
        self.id
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn render_state(&self) -> &RenderState {
        &self.render_state
    }

    pub fn render_state_mut(&mut self) -> &mut RenderState {
        &mut self.render_state
    }

    pub fn is_translucent(&self) -> bool {
        self.render_state.is_translucent()
    }
}
