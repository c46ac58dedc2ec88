//! Lifecycle and resource-sharing contract over the single engine handle.
//!
//! The bridge is the one object allowed to hold a live [`RawEngineHandle`].
//! Mutating calls are serialized behind an exclusive lock because the
//! native engine is not proven re-entrant; the mapping-quality score is
//! published through an atomic so any thread can observe it without
//! touching the lock.
//!
//! Calling any operation while uninitialized is defined behavior (a silent
//! no-op), not an error: frame callbacks race activity lifecycle
//! transitions, and failing one frame must not interrupt the session.

use std::path::Path;
use std::sync::atomic::{AtomicU32, Ordering};

use parking_lot::Mutex;
use tracing::{debug, info, warn};

use crate::fingerprint::DescriptorMatrix;
use crate::geometry::AnchorTransform;

use super::commands::{EngineCommands, EngineConfig, RawEngineHandle};

/// Canonical map density (in points) at which mapping quality saturates
/// at 1.0. A freshly started map over a room-scale surface reaches roughly
/// half of this within a few seconds of depth feed.
pub const REFERENCE_DENSITY: f32 = 2000.0;

/// Which init contract the running engine build accepted.
///
/// Negotiated once inside `initialize()` and recorded here; never re-probed
/// per call.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ApiContract {
    /// The density-aware `init_extended` contract.
    Extended,
    /// The bare legacy `init` contract.
    Legacy,
}

struct BridgeState {
    engine: Box<dyn EngineCommands>,
    handle: Option<RawEngineHandle>,
    contract: Option<ApiContract>,
    reference_density: f32,
}

/// Exclusive owner of the native mapping engine instance.
pub struct MappingEngineBridge {
    state: Mutex<BridgeState>,
    /// Mapping quality in [0, 1], stored as f32 bits. Recomputed
    /// synchronously inside every depth feed, readable from any thread.
    quality: AtomicU32,
}

impl MappingEngineBridge {
    /// Wrap a command surface. The bridge starts uninitialized; nothing
    /// touches the engine until [`initialize`](Self::initialize).
    pub fn new(engine: Box<dyn EngineCommands>) -> Self {
        Self {
            state: Mutex::new(BridgeState {
                engine,
                handle: None,
                contract: None,
                reference_density: REFERENCE_DENSITY,
            }),
            quality: AtomicU32::new(0.0f32.to_bits()),
        }
    }

    /// Allocate the engine handle, negotiating the call contract: try the
    /// extended contract first, fall back to legacy, and record the winner.
    /// No-op if already initialized.
    pub fn initialize(&self, config: &EngineConfig) {
        let mut state = self.state.lock();
        if state.handle.is_some() {
            debug!("engine already initialized, ignoring");
            return;
        }

        let (handle, contract) = match state.engine.init_extended(config) {
            Some(h) => (Some(h), ApiContract::Extended),
            None => (state.engine.init(), ApiContract::Legacy),
        };

        match handle {
            Some(h) => {
                info!(handle = h.get(), ?contract, "mapping engine initialized");
                state.handle = Some(h);
                state.contract = Some(contract);
                state.reference_density = config.reference_density;
                self.publish_quality(0.0);
            }
            None => warn!("mapping engine failed to initialize under either contract"),
        }
    }

    /// Release the engine handle. Idempotent; safe to call twice or never.
    pub fn destroy(&self) {
        let mut state = self.state.lock();
        if let Some(handle) = state.handle.take() {
            state.engine.destroy(handle);
            state.contract = None;
            self.publish_quality(0.0);
            info!("mapping engine destroyed");
        }
    }

    pub fn is_ready(&self) -> bool {
        self.state.lock().handle.is_some()
    }

    /// The negotiated contract, `None` while uninitialized.
    pub fn active_contract(&self) -> Option<ApiContract> {
        self.state.lock().contract
    }

    /// Mapping quality in [0, 1]; 0 while uninitialized. Lock-free.
    pub fn mapping_quality(&self) -> f32 {
        f32::from_bits(self.quality.load(Ordering::Acquire))
    }

    /// Mapped point count; 0 while uninitialized.
    pub fn point_count(&self) -> i32 {
        let mut state = self.state.lock();
        match state.handle {
            Some(handle) => state.engine.point_count(handle),
            None => 0,
        }
    }

    pub fn update_camera(&self, view: &[f32; 16], projection: &[f32; 16]) {
        let mut state = self.state.lock();
        if let Some(handle) = state.handle {
            state.engine.update_camera(handle, view, projection);
        }
    }

    /// Feed one depth frame and synchronously recompute mapping quality,
    /// so no reader ever observes a pre-feed value afterwards. The depth
    /// buffer is borrowed for this call only.
    pub fn feed_depth_data(
        &self,
        depth: &[u8],
        width: u32,
        height: u32,
        stride: u32,
        pose: &AnchorTransform,
        fov: f32,
    ) {
        let mut state = self.state.lock();
        let Some(handle) = state.handle else { return };
        state
            .engine
            .feed_depth(handle, depth, width, height, stride, pose.as_row_major(), fov);
        let count = state.engine.point_count(handle);
        let quality = (count.max(0) as f32 / state.reference_density).min(1.0);
        self.publish_quality(quality);
    }

    pub fn draw(&self) {
        let mut state = self.state.lock();
        if let Some(handle) = state.handle {
            state.engine.draw(handle);
        }
    }

    pub fn on_surface_changed(&self, width: u32, height: u32) {
        let mut state = self.state.lock();
        if let Some(handle) = state.handle {
            state.engine.on_surface_changed(handle, width, height);
        }
    }

    pub fn save_world(&self, path: &Path) -> bool {
        let mut state = self.state.lock();
        match state.handle {
            Some(handle) => state.engine.save_world(handle, path),
            None => false,
        }
    }

    /// Load a previously saved map. A `false` return leaves the active map
    /// and the published quality untouched.
    pub fn load_world(&self, path: &Path) -> bool {
        let mut state = self.state.lock();
        let Some(handle) = state.handle else {
            return false;
        };
        if !state.engine.load_world(handle, path) {
            warn!("world load failed, keeping active map: {}", path.display());
            return false;
        }
        let count = state.engine.point_count(handle);
        let quality = (count.max(0) as f32 / state.reference_density).min(1.0);
        self.publish_quality(quality);
        true
    }

    pub fn clear_map(&self) {
        let mut state = self.state.lock();
        if let Some(handle) = state.handle {
            state.engine.clear_map(handle);
            self.publish_quality(0.0);
        }
    }

    pub fn prune_map(&self, age_threshold: f32) {
        let mut state = self.state.lock();
        let Some(handle) = state.handle else { return };
        state.engine.prune_map(handle, age_threshold);
        let count = state.engine.point_count(handle);
        let quality = (count.max(0) as f32 / state.reference_density).min(1.0);
        self.publish_quality(quality);
    }

    /// Apply a corrected anchor transform to the map.
    pub fn align_map(&self, transform: &AnchorTransform) {
        let mut state = self.state.lock();
        if let Some(handle) = state.handle {
            state.engine.align_map(handle, transform.as_row_major());
        }
    }

    /// Hand the target fingerprint's descriptors to the engine for
    /// native-side relocalization.
    pub fn set_target_descriptors(&self, matrix: &DescriptorMatrix) {
        let mut state = self.state.lock();
        if let Some(handle) = state.handle {
            state.engine.set_target_descriptors(
                handle,
                matrix.payload(),
                matrix.rows(),
                matrix.cols(),
                matrix.elem_type().tag(),
            );
        }
    }

    fn publish_quality(&self, quality: f32) {
        self.quality.store(quality.to_bits(), Ordering::Release);
    }
}

impl Drop for MappingEngineBridge {
    fn drop(&mut self) {
        self.destroy();
    }
}
