//! Session configuration.

use serde::{Deserialize, Serialize};

use crate::engine::{EngineConfig, REFERENCE_DENSITY};
use crate::mask::FLOOD_TOLERANCE;

/// Tunables for an AR session. Every field has an explicit default; a
/// config file only needs to name the fields it overrides.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct SessionConfig {
    /// Per-channel flood-fill tolerance for mask refinement.
    pub flood_tolerance: u8,

    /// Minimum matched 2D/3D pairs before a PnP correction is attempted.
    pub min_correspondences: usize,

    /// Map point density at which mapping quality saturates.
    pub reference_density: f32,
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self {
            flood_tolerance: FLOOD_TOLERANCE,
            min_correspondences: 4,
            reference_density: REFERENCE_DENSITY,
        }
    }
}

impl SessionConfig {
    /// Parse from a JSON document; missing fields take their defaults.
    pub fn from_json(json: &str) -> Result<Self, serde_json::Error> {
        serde_json::from_str(json)
    }

    /// The engine-side slice of this configuration.
    pub fn engine_config(&self) -> EngineConfig {
        EngineConfig {
            reference_density: self.reference_density,
        }
    }
}
