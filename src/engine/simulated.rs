//! In-process stand-in for the native mapping engine.
//!
//! Keeps just enough state (a point set with birth times, saved world
//! snapshots) for the bridge's observable behavior — point counts, quality,
//! save/load semantics — to be exercised without the native library.

use std::collections::HashMap;
use std::path::{Path, PathBuf};

use tracing::debug;

use super::commands::{EngineCommands, EngineConfig, RawEngineHandle};

/// Simulated engine: mapping state without any actual mapping.
///
/// Depth frames add one point per 4x4 pixel tile, stamped with a
/// monotonically increasing frame tick so `prune_map` has real ages to work
/// against. `save_world`/`load_world` snapshot the point set in memory
/// keyed by path.
pub struct SimulatedEngine {
    next_handle: u64,
    live: Option<RawEngineHandle>,
    /// Birth tick of every mapped point.
    points: Vec<u32>,
    tick: u32,
    saved_worlds: HashMap<PathBuf, Vec<u32>>,
    speaks_extended: bool,
}

impl SimulatedEngine {
    pub fn new() -> Self {
        Self {
            next_handle: 1,
            live: None,
            points: Vec::new(),
            tick: 0,
            saved_worlds: HashMap::new(),
            speaks_extended: true,
        }
    }

    /// A build that predates the extended init contract; `init_extended`
    /// always answers `None`, forcing callers onto the legacy path.
    pub fn legacy() -> Self {
        Self {
            speaks_extended: false,
            ..Self::new()
        }
    }

    fn is_live(&self, handle: RawEngineHandle) -> bool {
        self.live == Some(handle)
    }
}

impl Default for SimulatedEngine {
    fn default() -> Self {
        Self::new()
    }
}

impl EngineCommands for SimulatedEngine {
    fn init_extended(&mut self, config: &EngineConfig) -> Option<RawEngineHandle> {
        if !self.speaks_extended {
            return None;
        }
        debug!(
            reference_density = config.reference_density,
            "simulated engine init (extended)"
        );
        self.init()
    }

    fn init(&mut self) -> Option<RawEngineHandle> {
        if self.live.is_some() {
            // One live instance per process.
            return None;
        }
        let handle = RawEngineHandle::new(self.next_handle)?;
        self.next_handle += 1;
        self.live = Some(handle);
        self.points.clear();
        self.tick = 0;
        Some(handle)
    }

    fn destroy(&mut self, handle: RawEngineHandle) {
        if self.is_live(handle) {
            self.live = None;
            self.points.clear();
        }
    }

    fn update_camera(&mut self, _handle: RawEngineHandle, _view: &[f32; 16], _proj: &[f32; 16]) {}

    fn feed_depth(
        &mut self,
        handle: RawEngineHandle,
        _depth: &[u8],
        width: u32,
        height: u32,
        _stride: u32,
        _pose: &[f32; 16],
        _fov: f32,
    ) {
        if !self.is_live(handle) {
            return;
        }
        self.tick += 1;
        let new_points = ((width / 4) * (height / 4)) as usize;
        self.points.extend(std::iter::repeat(self.tick).take(new_points));
    }

    fn draw(&mut self, _handle: RawEngineHandle) {}

    fn point_count(&mut self, handle: RawEngineHandle) -> i32 {
        if self.is_live(handle) {
            self.points.len() as i32
        } else {
            0
        }
    }

    fn save_world(&mut self, handle: RawEngineHandle, path: &Path) -> bool {
        if !self.is_live(handle) {
            return false;
        }
        self.saved_worlds.insert(path.to_path_buf(), self.points.clone());
        true
    }

    fn load_world(&mut self, handle: RawEngineHandle, path: &Path) -> bool {
        if !self.is_live(handle) {
            return false;
        }
        match self.saved_worlds.get(path) {
            Some(points) => {
                self.points = points.clone();
                true
            }
            // Unknown path: report failure, keep the active map.
            None => false,
        }
    }

    fn clear_map(&mut self, handle: RawEngineHandle) {
        if self.is_live(handle) {
            self.points.clear();
        }
    }

    fn prune_map(&mut self, handle: RawEngineHandle, age_threshold: f32) {
        if !self.is_live(handle) {
            return;
        }
        let cutoff = self.tick.saturating_sub(age_threshold as u32);
        self.points.retain(|&birth| birth >= cutoff);
    }

    fn set_target_descriptors(
        &mut self,
        _handle: RawEngineHandle,
        payload: &[u8],
        rows: i32,
        cols: i32,
        _type_tag: i32,
    ) {
        debug!(rows, cols, bytes = payload.len(), "target descriptors set");
    }

    fn align_map(&mut self, _handle: RawEngineHandle, _transform: &[f32; 16]) {}

    fn on_surface_changed(&mut self, _handle: RawEngineHandle, _width: u32, _height: u32) {}
}
