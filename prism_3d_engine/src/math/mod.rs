/// Math module — bounding volumes, rays, planes, intersection tests and CPU skinning.

pub mod bounding_box;
pub mod geometry;
pub mod intersection;
pub mod mesh_intersection;
pub mod skinning;

pub use bounding_box::BoundingBox;
pub use geometry::{BoundingSphere, PlaneEquation, Ray};
pub use intersection::{
    box_box_intersection, box_point_intersection, frustum_box_intersection,
    frustum_sphere_intersection, point_box_distance_squared, point_on_ray,
    project_point_onto_line, ray_box_intersection, ray_plane_intersection,
    ray_sphere_intersection, ray_triangle_intersection, sphere_box_intersection,
    sphere_contains_box, sphere_point_intersection, sphere_sphere_intersection,
    IntersectResult, RAY_EPSILON,
};
pub use mesh_intersection::{find_mesh_intersection, MeshIntersection};
pub use skinning::{skin_position, SkinWeights};
