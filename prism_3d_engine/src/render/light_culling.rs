/// Light culling - pick the lights that matter for one render job
///
/// Directional lights are always kept and come first. A point light counts
/// when its sphere touches the job's box, a spot light when the box is not
/// outside its shadow frustum. Lights that do not count are dropped; the
/// rest follow the directional lights in candidate order.

use crate::math::{BoundingBox, IntersectResult};
use crate::scene::{Light, LightKey, SceneData};

/// 1 if the light reaches the box, 0 otherwise
pub fn intersect_count(light: &Light, bb: &BoundingBox) -> u32 {
    match light.influence().classify(bb) {
        IntersectResult::Outside => 0,
        IntersectResult::Intersect | IntersectResult::Inside => 1,
    }
}

/// Lights for a box, given point/spot candidates
///
/// `candidates` usually comes from the BVH leaf of the entity. Directional
/// lights in it are ignored; every directional light of the scene is
/// included anyway.
pub fn select_lights(scene: &SceneData, bb: &BoundingBox, candidates: &[LightKey]) -> Vec<LightKey> {
    let mut selected: Vec<LightKey> = scene
        .lights()
        .filter(|(_, light)| light.is_directional())
        .map(|(key, _)| key)
        .collect();

    selected.extend(candidates.iter().copied().filter(|&key| {
        scene
            .light(key)
            .is_some_and(|light| !light.is_directional() && intersect_count(light, bb) > 0)
    }));
    selected
}

/// Same as `select_lights` with every scene light as candidate
pub fn select_lights_from_scene(scene: &SceneData, bb: &BoundingBox) -> Vec<LightKey> {
    let candidates: Vec<LightKey> = scene
        .lights()
        .filter(|(_, light)| !light.is_directional())
        .map(|(key, _)| key)
        .collect();
    select_lights(scene, bb, &candidates)
}

#[cfg(test)]
#[path = "light_culling_tests.rs"]
mod tests;
