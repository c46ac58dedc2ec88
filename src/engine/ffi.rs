//! Bindings to the real native mapping engine library.
//!
//! Only compiled with the `native-engine` feature; the link target is the
//! vendor's `anchor_engine` shared library. Paths cross the boundary as
//! NUL-terminated UTF-8; a path that cannot be represented fails the
//! operation rather than aborting.

use std::ffi::CString;
use std::path::Path;

use tracing::warn;

use super::commands::{EngineCommands, EngineConfig, RawEngineHandle};

#[link(name = "anchor_engine")]
extern "C" {
    fn ae_init_v2(reference_density: f32) -> u64;
    fn ae_init() -> u64;
    fn ae_destroy(handle: u64);
    fn ae_update_camera(handle: u64, view: *const f32, projection: *const f32);
    fn ae_feed_depth(
        handle: u64,
        depth: *const u8,
        depth_len: usize,
        width: u32,
        height: u32,
        stride: u32,
        pose: *const f32,
        fov: f32,
    );
    fn ae_draw(handle: u64);
    fn ae_point_count(handle: u64) -> i32;
    fn ae_save_world(handle: u64, path: *const std::os::raw::c_char) -> bool;
    fn ae_load_world(handle: u64, path: *const std::os::raw::c_char) -> bool;
    fn ae_clear_map(handle: u64);
    fn ae_prune_map(handle: u64, age_threshold: f32);
    fn ae_set_target_descriptors(
        handle: u64,
        payload: *const u8,
        payload_len: usize,
        rows: i32,
        cols: i32,
        type_tag: i32,
    );
    fn ae_align_map(handle: u64, transform: *const f32);
    fn ae_on_surface_changed(handle: u64, width: u32, height: u32);
}

fn c_path(path: &Path) -> Option<CString> {
    let utf8 = path.to_str()?;
    CString::new(utf8).ok()
}

/// [`EngineCommands`] backed by the real native library.
pub struct NativeEngine;

impl NativeEngine {
    pub fn new() -> Self {
        Self
    }
}

impl Default for NativeEngine {
    fn default() -> Self {
        Self::new()
    }
}

impl EngineCommands for NativeEngine {
    fn init_extended(&mut self, config: &EngineConfig) -> Option<RawEngineHandle> {
        // Engine builds without the v2 entry point return 0 here.
        RawEngineHandle::new(unsafe { ae_init_v2(config.reference_density) })
    }

    fn init(&mut self) -> Option<RawEngineHandle> {
        RawEngineHandle::new(unsafe { ae_init() })
    }

    fn destroy(&mut self, handle: RawEngineHandle) {
        unsafe { ae_destroy(handle.get()) }
    }

    fn update_camera(&mut self, handle: RawEngineHandle, view: &[f32; 16], projection: &[f32; 16]) {
        unsafe { ae_update_camera(handle.get(), view.as_ptr(), projection.as_ptr()) }
    }

    fn feed_depth(
        &mut self,
        handle: RawEngineHandle,
        depth: &[u8],
        width: u32,
        height: u32,
        stride: u32,
        pose: &[f32; 16],
        fov: f32,
    ) {
        unsafe {
            ae_feed_depth(
                handle.get(),
                depth.as_ptr(),
                depth.len(),
                width,
                height,
                stride,
                pose.as_ptr(),
                fov,
            )
        }
    }

    fn draw(&mut self, handle: RawEngineHandle) {
        unsafe { ae_draw(handle.get()) }
    }

    fn point_count(&mut self, handle: RawEngineHandle) -> i32 {
        unsafe { ae_point_count(handle.get()) }
    }

    fn save_world(&mut self, handle: RawEngineHandle, path: &Path) -> bool {
        match c_path(path) {
            Some(p) => unsafe { ae_save_world(handle.get(), p.as_ptr()) },
            None => {
                warn!("world path not representable across FFI: {}", path.display());
                false
            }
        }
    }

    fn load_world(&mut self, handle: RawEngineHandle, path: &Path) -> bool {
        match c_path(path) {
            Some(p) => unsafe { ae_load_world(handle.get(), p.as_ptr()) },
            None => {
                warn!("world path not representable across FFI: {}", path.display());
                false
            }
        }
    }

    fn clear_map(&mut self, handle: RawEngineHandle) {
        unsafe { ae_clear_map(handle.get()) }
    }

    fn prune_map(&mut self, handle: RawEngineHandle, age_threshold: f32) {
        unsafe { ae_prune_map(handle.get(), age_threshold) }
    }

    fn set_target_descriptors(
        &mut self,
        handle: RawEngineHandle,
        payload: &[u8],
        rows: i32,
        cols: i32,
        type_tag: i32,
    ) {
        unsafe {
            ae_set_target_descriptors(handle.get(), payload.as_ptr(), payload.len(), rows, cols, type_tag)
        }
    }

    fn align_map(&mut self, handle: RawEngineHandle, transform: &[f32; 16]) {
        unsafe { ae_align_map(handle.get(), transform.as_ptr()) }
    }

    fn on_surface_changed(&mut self, handle: RawEngineHandle, width: u32, height: u32) {
        unsafe { ae_on_surface_changed(handle.get(), width, height) }
    }
}
