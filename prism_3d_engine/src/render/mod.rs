/// Render module — render jobs, light culling, shadow atlas and the pass pipeline
///
/// Passes talk to the GPU through the `RenderDevice` trait and share state
/// through `RenderContext`. `RecordingDevice` is a headless device that
/// records every command.

pub mod context;
pub mod device;
pub mod forward_pass;
pub mod full_quad_pass;
pub mod light_culling;
pub mod outline_pass;
pub mod pass;
pub mod recording_device;
pub mod render_job;
pub mod scene_renderer;
pub mod shadow_atlas;
pub mod shadow_pass;
pub mod stencil_pass;

pub use context::{RenderContext, RenderScope, SavedRenderState};
pub use device::{
    ClearFlags, DrawCall, FramebufferDesc, FramebufferId, QuadShader, RenderDevice,
    StencilMode, TextureId, Viewport,
};
pub use forward_pass::ForwardPass;
pub use full_quad_pass::FullQuadPass;
pub use light_culling::{intersect_count, select_lights, select_lights_from_scene};
pub use outline_pass::OutlinePass;
pub use pass::{run_pass, Pass};
pub use recording_device::{DeviceCommand, RecordingDevice};
pub use render_job::{RenderJob, RenderJobProcessor, SeparatedJobs};
pub use scene_renderer::{FrameStats, SceneRenderer};
pub use shadow_atlas::{BinPack2D, GpuShadowSlot, PackedRect, ShadowAtlasPacker, POINT_LIGHT_FACES};
pub use shadow_pass::{cube_face_camera, fit_directional_shadow_camera, ShadowPass};
pub use stencil_pass::StencilRenderPass;
