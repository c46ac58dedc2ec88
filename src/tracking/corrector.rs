//! Per-frame pose correction against the fingerprint.

use tracing::debug;

use crate::engine::MappingEngineBridge;
use crate::geometry::AnchorTransform;

use super::intrinsics::CameraIntrinsics;
use super::pnp::solve_pnp;

/// Minimum matched pairs for a PnP attempt.
const MIN_CORRESPONDENCES: usize = 4;

/// Reconciles the native engine's drift-prone pose against the known
/// fingerprint, one frame at a time.
///
/// Correction is opportunistic: a frame with too few matches or a
/// degenerate configuration is simply skipped and the engine's own pose
/// stays in effect until the next usable frame.
pub struct PoseCorrector {
    min_correspondences: usize,
}

impl PoseCorrector {
    pub fn new() -> Self {
        Self {
            min_correspondences: MIN_CORRESPONDENCES,
        }
    }

    /// Raise the correspondence gate above the solver's geometric minimum
    /// of 4, trading correction frequency for robustness.
    pub fn with_min_correspondences(min_correspondences: usize) -> Self {
        Self {
            min_correspondences: min_correspondences.max(MIN_CORRESPONDENCES),
        }
    }

    /// Attempt a pose correction for one processed frame.
    ///
    /// `points2d` are pixel observations in the current frame, matched
    /// index-for-index against the fingerprint's stored 3D `points3d`. On
    /// success the corrected transform is forwarded to the bridge's
    /// `align_map` and returned. On any failure the function returns `None`
    /// having made zero calls into the bridge.
    pub fn track_and_correct(
        &self,
        bridge: &MappingEngineBridge,
        points2d: &[[f32; 2]],
        points3d: &[[f32; 3]],
        intrinsics: &CameraIntrinsics,
    ) -> Option<AnchorTransform> {
        if points2d.len() != points3d.len() {
            debug!(
                n2d = points2d.len(),
                n3d = points3d.len(),
                "mismatched correspondence arrays, skipping correction"
            );
            return None;
        }
        if points2d.len() < self.min_correspondences {
            debug!(
                matches = points2d.len(),
                needed = self.min_correspondences,
                "too few matches, skipping correction"
            );
            return None;
        }

        let normalized: Vec<_> = points2d.iter().map(|&p| intrinsics.normalize(p)).collect();
        let (rotation, translation) = solve_pnp(points3d, &normalized)?;

        let transform = AnchorTransform::from_rotation_translation(&rotation, &translation);
        bridge.align_map(&transform);
        Some(transform)
    }
}

impl Default for PoseCorrector {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::engine::{EngineCommands, EngineConfig, RawEngineHandle};
    use std::path::Path;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Arc;

    /// Engine that only counts align_map calls.
    struct AlignCounter(Arc<AtomicUsize>);

    impl EngineCommands for AlignCounter {
        fn init_extended(&mut self, _c: &EngineConfig) -> Option<RawEngineHandle> {
            RawEngineHandle::new(1)
        }
        fn init(&mut self) -> Option<RawEngineHandle> {
            RawEngineHandle::new(1)
        }
        fn destroy(&mut self, _h: RawEngineHandle) {}
        fn update_camera(&mut self, _h: RawEngineHandle, _v: &[f32; 16], _p: &[f32; 16]) {}
        fn feed_depth(
            &mut self,
            _h: RawEngineHandle,
            _d: &[u8],
            _w: u32,
            _ht: u32,
            _s: u32,
            _pose: &[f32; 16],
            _fov: f32,
        ) {
        }
        fn draw(&mut self, _h: RawEngineHandle) {}
        fn point_count(&mut self, _h: RawEngineHandle) -> i32 {
            0
        }
        fn save_world(&mut self, _h: RawEngineHandle, _p: &Path) -> bool {
            true
        }
        fn load_world(&mut self, _h: RawEngineHandle, _p: &Path) -> bool {
            true
        }
        fn clear_map(&mut self, _h: RawEngineHandle) {}
        fn prune_map(&mut self, _h: RawEngineHandle, _a: f32) {}
        fn set_target_descriptors(
            &mut self,
            _h: RawEngineHandle,
            _p: &[u8],
            _r: i32,
            _c: i32,
            _t: i32,
        ) {
        }
        fn align_map(&mut self, _h: RawEngineHandle, _t: &[f32; 16]) {
            self.0.fetch_add(1, Ordering::SeqCst);
        }
        fn on_surface_changed(&mut self, _h: RawEngineHandle, _w: u32, _ht: u32) {}
    }

    fn counting_bridge() -> (MappingEngineBridge, Arc<AtomicUsize>) {
        let aligns = Arc::new(AtomicUsize::new(0));
        let bridge = MappingEngineBridge::new(Box::new(AlignCounter(aligns.clone())));
        bridge.initialize(&EngineConfig::default());
        (bridge, aligns)
    }

    fn identity_intrinsics() -> CameraIntrinsics {
        CameraIntrinsics::new(1.0, 1.0, 0.0, 0.0)
    }

    #[test]
    fn test_too_few_matches_returns_none_without_bridge_calls() {
        let (bridge, aligns) = counting_bridge();
        let corrector = PoseCorrector::new();

        let p2 = [[0.0, 0.0], [1.0, 0.0], [0.0, 1.0]];
        let p3 = [[0.0, 0.0, 1.0], [1.0, 0.0, 1.0], [0.0, 1.0, 1.0]];
        let result = corrector.track_and_correct(&bridge, &p2, &p3, &identity_intrinsics());

        assert!(result.is_none());
        assert_eq!(aligns.load(Ordering::SeqCst), 0);
    }

    #[test]
    fn test_mismatched_arrays_return_none() {
        let (bridge, aligns) = counting_bridge();
        let corrector = PoseCorrector::new();

        let p2 = [[0.0, 0.0]; 5];
        let p3 = [[0.0, 0.0, 1.0]; 4];
        assert!(corrector
            .track_and_correct(&bridge, &p2, &p3, &identity_intrinsics())
            .is_none());
        assert_eq!(aligns.load(Ordering::SeqCst), 0);
    }

    #[test]
    fn test_successful_correction_aligns_once() {
        let (bridge, aligns) = counting_bridge();
        let corrector = PoseCorrector::new();

        // Non-coplanar points seen by a camera 5 units back; observations
        // generated with identity rotation so projection is just p/z.
        let points3d: Vec<[f32; 3]> = vec![
            [-1.0, -1.0, 0.0],
            [1.0, -1.0, 0.2],
            [1.0, 1.0, 0.0],
            [-1.0, 1.0, 0.3],
            [0.0, 0.0, 1.0],
            [0.5, -0.5, 0.7],
        ];
        let points2d: Vec<[f32; 2]> = points3d
            .iter()
            .map(|p| {
                let z = p[2] + 5.0;
                [p[0] / z, p[1] / z]
            })
            .collect();

        let transform = corrector
            .track_and_correct(&bridge, &points2d, &points3d, &identity_intrinsics())
            .expect("clean synthetic data must solve");

        assert_eq!(aligns.load(Ordering::SeqCst), 1);
        let t = transform.translation();
        assert!((t[0]).abs() < 1e-2);
        assert!((t[1]).abs() < 1e-2);
        assert!((t[2] - 5.0).abs() < 5e-2);
    }

    #[test]
    fn test_min_correspondence_floor_is_four() {
        let corrector = PoseCorrector::with_min_correspondences(2);
        let (bridge, aligns) = counting_bridge();
        let p2 = [[0.0, 0.0], [1.0, 0.0]];
        let p3 = [[0.0, 0.0, 1.0], [1.0, 0.0, 1.0]];
        assert!(corrector
            .track_and_correct(&bridge, &p2, &p3, &identity_intrinsics())
            .is_none());
        assert_eq!(aligns.load(Ordering::SeqCst), 0);
    }
}
