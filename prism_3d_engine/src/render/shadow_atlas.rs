/// Shadow atlas - packing of shadow maps into a shared 2D array texture
///
/// Every shadow-casting light gets a square region of one atlas layer.
/// Directional and spot lights use one layer; point lights use 6
/// consecutive layers (one per cube face) with the same region in each.
/// Regions are packed with a shelf packer, biggest first, and the atlas is
/// only repacked when the caster list or a requested resolution changes.

use bytemuck::{Pod, Zeroable};
use glam::UVec2;
use crate::scene::{Light, LightKey, SceneData, ShadowAtlasSlot};

/// Cube faces rendered for a point light
pub const POINT_LIGHT_FACES: u32 = 6;

/// Square placed by `BinPack2D`
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PackedRect {
    pub layer: u32,
    pub coord: UVec2,
    pub size: u32,
}

impl PackedRect {
    pub fn overlaps(&self, other: &PackedRect) -> bool {
        self.layer == other.layer
            && self.coord.x < other.coord.x + other.size
            && other.coord.x < self.coord.x + self.size
            && self.coord.y < other.coord.y + other.size
            && other.coord.y < self.coord.y + self.size
    }
}

/// Horizontal strip of a layer; squares are placed left to right
#[derive(Debug, Clone)]
struct Shelf {
    y: u32,
    height: u32,
    next_x: u32,
}

#[derive(Debug, Clone, Default)]
struct Layer {
    shelves: Vec<Shelf>,
    used_height: u32,
}

/// First-fit shelf packer for squares
///
/// A square goes on the first shelf (in layer order) with room for it.
/// Otherwise a new shelf is opened in the first layer with enough
/// remaining height, and otherwise a new layer is started. Feed squares
/// biggest first for a tight packing.
#[derive(Debug, Clone)]
pub struct BinPack2D {
    atlas_size: u32,
    layers: Vec<Layer>,
}

impl BinPack2D {
    pub fn new(atlas_size: u32) -> Self {
        Self {
            atlas_size,
            layers: Vec::new(),
        }
    }

    pub fn layer_count(&self) -> u32 {
        self.layers.len() as u32
    }

    /// Place one square; `None` if it is empty or larger than a layer
    pub fn insert(&mut self, size: u32) -> Option<PackedRect> {
        if size == 0 || size > self.atlas_size {
            return None;
        }

        for (index, layer) in self.layers.iter_mut().enumerate() {
            for shelf in layer.shelves.iter_mut() {
                if size <= shelf.height && shelf.next_x + size <= self.atlas_size {
                    let coord = UVec2::new(shelf.next_x, shelf.y);
                    shelf.next_x += size;
                    return Some(PackedRect { layer: index as u32, coord, size });
                }
            }
        }

        let atlas_size = self.atlas_size;
        let layer_index = match self
            .layers
            .iter()
            .position(|layer| layer.used_height + size <= atlas_size)
        {
            Some(index) => index,
            None => {
                self.layers.push(Layer::default());
                self.layers.len() - 1
            }
        };

        let layer = &mut self.layers[layer_index];
        let y = layer.used_height;
        layer.shelves.push(Shelf { y, height: size, next_x: size });
        layer.used_height += size;
        Some(PackedRect {
            layer: layer_index as u32,
            coord: UVec2::new(0, y),
            size,
        })
    }

    /// Pack squares in the given order
    pub fn pack(squares: &[u32], atlas_size: u32) -> Vec<Option<PackedRect>> {
        let mut packer = Self::new(atlas_size);
        squares.iter().map(|&size| packer.insert(size)).collect()
    }
}

/// Per-light shadow record for a GPU light buffer
#[repr(C)]
#[derive(Debug, Clone, Copy, PartialEq, Pod, Zeroable)]
pub struct GpuShadowSlot {
    /// Region origin in texels
    pub coord: [f32; 2],
    /// Region size in texels
    pub resolution: f32,
    /// First atlas layer
    pub layer: f32,
    pub softness: f32,
    pub _padding: [f32; 3],
}

impl GpuShadowSlot {
    /// Record of a light with an atlas slot
    pub fn from_light(light: &Light) -> Option<Self> {
        let slot = light.atlas_slot()?;
        Some(Self {
            coord: [slot.coord.x as f32, slot.coord.y as f32],
            resolution: slot.resolution as f32,
            layer: slot.layer as f32,
            softness: light.shadow_softness(),
            _padding: [0.0; 3],
        })
    }
}

/// Assigns atlas slots to shadow-casting lights
#[derive(Debug, Clone)]
pub struct ShadowAtlasPacker {
    atlas_size: u32,
    previous_casters: Vec<LightKey>,
    layer_count: u32,
}

impl ShadowAtlasPacker {
    pub fn new(atlas_size: u32) -> Self {
        Self {
            atlas_size,
            previous_casters: Vec::new(),
            layer_count: 0,
        }
    }

    pub fn atlas_size(&self) -> u32 {
        self.atlas_size
    }

    /// Layers the atlas texture needs (after clamping)
    pub fn layer_count(&self) -> u32 {
        self.layer_count
    }

    /// Repack if the casters or their resolutions changed
    ///
    /// Returns true when slots were reassigned. Lights that do not fit in
    /// `max_layers` lose their slot (and their shadows).
    pub fn update(&mut self, scene: &mut SceneData, casters: &[LightKey], max_layers: u32) -> bool {
        let mut changed = casters != self.previous_casters.as_slice();
        for &key in casters {
            if let Some(light) = scene.light_mut(key) {
                if light.shadow_resolution_updated() {
                    light.clear_shadow_resolution_updated();
                    changed = true;
                }
            }
        }
        if !changed {
            return false;
        }
        self.previous_casters = casters.to_vec();

        let needed = self.place(scene, casters);
        self.layer_count = needed;
        if needed > max_layers {
            crate::engine_error!(
                "prism3d::ShadowAtlas",
                "Max array texture layer count reached: {} needed, {} available",
                needed,
                max_layers
            );
            self.layer_count = max_layers;
            self.drop_slots_beyond(scene, casters, max_layers);
        }

        crate::engine_info!(
            "prism3d::ShadowAtlas",
            "Packed {} shadow maps into {} layers",
            casters.len(),
            self.layer_count
        );
        true
    }

    /// Forget the previous casters so the next `update()` repacks
    pub fn invalidate(&mut self) {
        self.previous_casters.clear();
    }

    /// GPU records of every caster that has a slot
    pub fn gpu_slots(scene: &SceneData, casters: &[LightKey]) -> Vec<GpuShadowSlot> {
        casters
            .iter()
            .filter_map(|&key| scene.light(key).and_then(GpuShadowSlot::from_light))
            .collect()
    }

    /// Assign slots and return the number of layers used
    fn place(&self, scene: &mut SceneData, casters: &[LightKey]) -> u32 {
        for (key, light) in scene.lights_mut() {
            if !casters.contains(&key) {
                light.set_atlas_slot(None);
            }
        }

        let mut flat: Vec<(LightKey, u32)> = Vec::new();
        let mut points: Vec<(LightKey, u32)> = Vec::new();
        for &key in casters {
            let Some(light) = scene.light(key) else {
                continue;
            };
            let resolution = light.shadow_resolution().min(self.atlas_size);
            if light.is_point() {
                points.push((key, resolution));
            } else {
                flat.push((key, resolution));
            }
        }
        flat.sort_by(|a, b| b.1.cmp(&a.1));
        points.sort_by(|a, b| b.1.cmp(&a.1));

        let mut layer_count = 0u32;
        let mut last_flat_layer: Option<u32> = None;

        let sizes: Vec<u32> = flat.iter().map(|(_, r)| *r).collect();
        for ((key, _), rect) in flat.iter().zip(BinPack2D::pack(&sizes, self.atlas_size)) {
            let slot = rect.map(|r| {
                last_flat_layer = Some(last_flat_layer.map_or(r.layer, |l| l.max(r.layer)));
                layer_count = layer_count.max(r.layer + 1);
                ShadowAtlasSlot { layer: r.layer, coord: r.coord, resolution: r.size }
            });
            if let Some(light) = scene.light_mut(*key) {
                light.set_atlas_slot(slot);
            }
        }

        // Point lights start after the last flat layer, 6 layers per packed layer
        let first_point_block = last_flat_layer.map_or(0, |l| l + 1);
        let sizes: Vec<u32> = points.iter().map(|(_, r)| *r).collect();
        for ((key, _), rect) in points.iter().zip(BinPack2D::pack(&sizes, self.atlas_size)) {
            let slot = rect.map(|r| {
                let layer = (r.layer + first_point_block) * POINT_LIGHT_FACES;
                layer_count = layer_count.max(layer + POINT_LIGHT_FACES);
                ShadowAtlasSlot { layer, coord: r.coord, resolution: r.size }
            });
            if let Some(light) = scene.light_mut(*key) {
                light.set_atlas_slot(slot);
            }
        }

        layer_count
    }

    fn drop_slots_beyond(&self, scene: &mut SceneData, casters: &[LightKey], max_layers: u32) {
        for &key in casters {
            let Some(light) = scene.light_mut(key) else {
                continue;
            };
            let Some(slot) = light.atlas_slot() else {
                continue;
            };
            let span = if light.is_point() { POINT_LIGHT_FACES } else { 1 };
            if slot.layer + span > max_layers {
                light.set_atlas_slot(None);
            }
        }
    }
}

#[cfg(test)]
#[path = "shadow_atlas_tests.rs"]
mod tests;
