/// Scene module — entities, meshes, materials, lights and their storage

pub mod entity;
pub mod light;
pub mod material;
pub mod mesh;
pub mod scene;

pub use entity::{Entity, EntityFlags};
pub use light::{Light, LightKind, LightVolume, ShadowAtlasSlot};
pub use material::{BlendFunction, CullMode, Material, MaterialId, RenderState};
pub use mesh::{Mesh, Skeleton, SubMesh};
pub use scene::{EntityKey, LightKey, Scene, SceneData};
