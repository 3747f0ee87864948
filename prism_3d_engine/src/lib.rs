/*!
# Prism 3D Engine

Spatial visibility and render-job scheduling core of the Prism 3D engine.

The crate keeps a dynamic bounding volume hierarchy over scene entities and
lights, culls it against camera frustums, picks objects by ray or frustum,
assigns the most relevant lights to each render job, packs shadow maps into
an array texture atlas and drives a fixed pass pipeline over an abstract
render device.

## Architecture

- **Bvh**: dynamic BVH with thread-safe mutation queues drained once per frame
- **Scene**: slot-map storage of entities and lights, owner of the BVH
- **RenderJobProcessor**: per-sub-mesh jobs, sorting, culling and light assignment
- **ShadowAtlasPacker**: first-fit packing of shadow maps into atlas layers
- **Pass**: shadow, forward, stencil, full-quad and outline passes
- **SceneRenderer**: runs one frame through the pipeline
*/

// Internal modules
mod error;
mod engine;
pub mod log;
pub mod settings;
pub mod math;
pub mod camera;
pub mod scene;
pub mod bvh;
pub mod render;
pub mod utils;

// Main prism3d namespace module
pub mod prism3d {
    // Error types
    pub use crate::error::{Error, Result};

    // Engine singleton
    pub use crate::engine::Engine;

    // Settings
    pub use crate::settings::{BvhSettings, EngineSettings, ShadowSettings, WorkerSettings};

    // Logging sub-module (types only, NOT macros)
    pub mod log {
        pub use crate::log::{Logger, LogEntry, LogSeverity, DefaultLogger};
    }

    pub mod math {
        pub use crate::math::*;
    }

    pub mod camera {
        pub use crate::camera::*;
    }

    pub mod scene {
        pub use crate::scene::*;
    }

    pub mod bvh {
        pub use crate::bvh::*;
    }

    pub mod render {
        pub use crate::render::*;
    }

    pub mod utils {
        pub use crate::utils::*;
    }
}

// Re-export math library at crate root
pub use glam;
