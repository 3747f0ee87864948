/// Camera module — view/projection container and frustum extraction.

pub mod camera;
pub mod frustum;

pub use camera::Camera;
pub use frustum::{
    Frustum, PLANE_BOTTOM, PLANE_FAR, PLANE_LEFT, PLANE_NEAR, PLANE_RIGHT, PLANE_TOP,
};
