//! Playback & Skinning Settings
//!
//! Plain configuration structs with sensible defaults. They are serde-enabled
//! so they can live in an asset or a config file next to the clips they tune.
//!
//! ```rust,ignore
//! use sinew::settings::{SkinningMode, SkinningSettings};
//!
//! let settings = SkinningSettings {
//!     mode: SkinningMode::Cpu,
//!     auto_update_bounds: true,
//! };
//! let mesh = SkinnedMesh::new("body", bind_pose, joints, weights)?.with_settings(&settings);
//! ```

use serde::{Deserialize, Serialize};

use crate::animation::LoopCount;

// ---------------------------------------------------------------------------
// Skinning
// ---------------------------------------------------------------------------

/// Where vertex deformation runs.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum SkinningMode {
    /// Vertices are transformed on the CPU into the mesh's output buffers.
    #[default]
    Cpu,
    /// The palette and per-vertex influences are uploaded to a shader.
    Gpu,
}

/// Per-mesh skinning configuration.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct SkinningSettings {
    pub mode: SkinningMode,
    /// Recompute the bounding box after each CPU skinning pass.
    pub auto_update_bounds: bool,
}

// ---------------------------------------------------------------------------
// Clip playback
// ---------------------------------------------------------------------------

/// Initial playback parameters for a clip instance.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ClipPlayback {
    pub loop_count: LoopCount,
    pub time_scale: f64,
}

impl Default for ClipPlayback {
    fn default() -> Self {
        Self {
            loop_count: LoopCount::default(),
            time_scale: 1.0,
        }
    }
}

impl ClipPlayback {
    #[must_use]
    pub fn looping() -> Self {
        Self {
            loop_count: LoopCount::Infinite,
            ..Self::default()
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn partial_settings_fill_defaults() {
        let settings: SkinningSettings = serde_json::from_str(r#"{"mode":"Gpu"}"#).unwrap();
        assert_eq!(settings.mode, SkinningMode::Gpu);
        assert!(!settings.auto_update_bounds);

        let playback: ClipPlayback = serde_json::from_str(r#"{"loop_count":"Infinite"}"#).unwrap();
        assert_eq!(playback.loop_count, LoopCount::Infinite);
        assert_eq!(playback.time_scale, 1.0);
    }
}
