//! The raw command surface of the native mapping engine.

use std::num::NonZeroU64;
use std::path::Path;

/// Opaque handle to one live engine instance, minted by `init`.
///
/// Non-zero by construction: the engine signals allocation failure by
/// returning zero, which never becomes a `RawEngineHandle`. At most one
/// valid handle exists per process; the bridge owns it exclusively.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RawEngineHandle(NonZeroU64);

impl RawEngineHandle {
    /// Wrap a raw handle value, `None` for zero.
    pub fn new(raw: u64) -> Option<Self> {
        NonZeroU64::new(raw).map(Self)
    }

    pub fn get(self) -> u64 {
        self.0.get()
    }
}

/// Initialization parameters for the extended init contract.
#[derive(Debug, Clone)]
pub struct EngineConfig {
    /// Point density at which the map is considered fully built; feeds the
    /// mapping-quality normalization.
    pub reference_density: f32,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            reference_density: crate::engine::bridge::REFERENCE_DENSITY,
        }
    }
}

/// The narrow command surface into the native engine (an FFI boundary).
///
/// Buffer parameters are borrowed for the duration of the call only — the
/// `&[u8]` / `&[f32; 16]` signatures make retaining them impossible without
/// copying, which implementations must not do either: the caller may reuse
/// the underlying memory on the next frame.
///
/// Two init contracts exist across engine builds. `init_extended` is the
/// primary (density-aware) contract; builds predating it return `None` and
/// callers fall back to the legacy `init`. The bridge negotiates this once
/// at initialization and records the outcome — implementations must answer
/// consistently for the lifetime of the process.
pub trait EngineCommands: Send {
    /// Extended init contract. `None` when this engine build only speaks
    /// the legacy contract (or allocation failed under it).
    fn init_extended(&mut self, config: &EngineConfig) -> Option<RawEngineHandle>;

    /// Legacy init contract. `None` on allocation failure.
    fn init(&mut self) -> Option<RawEngineHandle>;

    fn destroy(&mut self, handle: RawEngineHandle);

    /// Upload the per-frame view and projection matrices (row-major).
    fn update_camera(&mut self, handle: RawEngineHandle, view: &[f32; 16], projection: &[f32; 16]);

    /// Feed one depth frame into the mapper. `stride` is the byte stride of
    /// a row in `depth`; `pose` is the camera pose for the frame.
    #[allow(clippy::too_many_arguments)]
    fn feed_depth(
        &mut self,
        handle: RawEngineHandle,
        depth: &[u8],
        width: u32,
        height: u32,
        stride: u32,
        pose: &[f32; 16],
        fov: f32,
    );

    fn draw(&mut self, handle: RawEngineHandle);

    /// Current number of mapped points.
    fn point_count(&mut self, handle: RawEngineHandle) -> i32;

    fn save_world(&mut self, handle: RawEngineHandle, path: &Path) -> bool;

    /// Returns `false` on failure; the engine guarantees the previously
    /// active map is untouched in that case.
    fn load_world(&mut self, handle: RawEngineHandle, path: &Path) -> bool;

    fn clear_map(&mut self, handle: RawEngineHandle);

    /// Drop mapped points older than `age_threshold` (engine time units).
    fn prune_map(&mut self, handle: RawEngineHandle, age_threshold: f32);

    /// Hand the engine the target's descriptor payload for native-side
    /// relocalization.
    fn set_target_descriptors(
        &mut self,
        handle: RawEngineHandle,
        payload: &[u8],
        rows: i32,
        cols: i32,
        type_tag: i32,
    );

    /// Re-anchor the map with a corrected transform (row-major).
    fn align_map(&mut self, handle: RawEngineHandle, transform: &[f32; 16]);

    fn on_surface_changed(&mut self, handle: RawEngineHandle, width: u32, height: u32);
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_zero_is_never_a_handle() {
        assert!(RawEngineHandle::new(0).is_none());
        assert_eq!(RawEngineHandle::new(7).unwrap().get(), 7);
    }
}
