//! Engine-wide tunables
//!
//! Settings are plain values with `Default` impls. The engine keeps one
//! copy behind `Engine::settings()`; subsystems copy what they need when
//! they are created (a `Bvh` snapshots `BvhSettings`, a `ShadowPass`
//! snapshots `ShadowSettings`).

use crate::error::{Error, Result};

/// BVH policy parameters
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct BvhSettings {
    /// Leaves holding more entities than this are split
    pub max_entity_per_node: usize,
    /// Leaves whose longest extent is at or below this size are never split
    pub min_node_size: f32,
    /// Maximum depth of any node (root is depth 0)
    pub max_depth: u32,
}

impl Default for BvhSettings {
    fn default() -> Self {
        Self {
            max_entity_per_node: 10,
            min_node_size: 2.0,
            max_depth: 32,
        }
    }
}

impl BvhSettings {
    /// Check that the parameters describe a usable tree
    ///
    /// # Errors
    ///
    /// Returns `InvalidParameter` if `max_entity_per_node` or `max_depth` is
    /// zero, or if `min_node_size` is negative or not finite.
    pub fn validate(&self) -> Result<()> {
        if self.max_entity_per_node == 0 {
            return Err(Error::InvalidParameter(
                "BvhSettings::max_entity_per_node must be at least 1".to_string(),
            ));
        }
        if self.max_depth == 0 {
            return Err(Error::InvalidParameter(
                "BvhSettings::max_depth must be at least 1".to_string(),
            ));
        }
        if !self.min_node_size.is_finite() || self.min_node_size < 0.0 {
            return Err(Error::InvalidParameter(format!(
                "BvhSettings::min_node_size must be a finite non-negative number, got {}",
                self.min_node_size
            )));
        }
        Ok(())
    }
}

/// Shadow atlas and filtering parameters
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ShadowSettings {
    /// Width and height of one atlas layer, in texels
    pub atlas_size: u32,
    /// Blur is skipped when a light's softness is not above this value
    pub blur_softness_epsilon: f32,
    /// Number of texels the blur kernel reaches on each side
    pub blur_kernel_radius: u32,
}

impl Default for ShadowSettings {
    fn default() -> Self {
        Self {
            atlas_size: 4096,
            blur_softness_epsilon: 0.001,
            blur_kernel_radius: 4,
        }
    }
}

impl ShadowSettings {
    /// # Errors
    ///
    /// Returns `InvalidParameter` if the atlas size is zero.
    pub fn validate(&self) -> Result<()> {
        if self.atlas_size == 0 {
            return Err(Error::InvalidParameter(
                "ShadowSettings::atlas_size must be non-zero".to_string(),
            ));
        }
        Ok(())
    }
}

/// Worker pool sizing
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct WorkerSettings {
    /// Number of worker threads; `0` lets the pool pick one per logical core
    pub thread_count: usize,
}

/// All engine settings
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct EngineSettings {
    pub bvh: BvhSettings,
    pub shadows: ShadowSettings,
    pub workers: WorkerSettings,
}

impl EngineSettings {
    /// Validate every section
    ///
    /// # Errors
    ///
    /// Returns the first `InvalidParameter` reported by a section.
    pub fn validate(&self) -> Result<()> {
        self.bvh.validate()?;
        self.shadows.validate()?;
        Ok(())
    }
}

#[cfg(test)]
#[path = "settings_tests.rs"]
mod tests;
