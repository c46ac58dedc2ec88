//! Pinhole camera intrinsics.

use glam::Vec2;

/// Pinhole intrinsics for the frame being tracked.
///
/// Distortion is expected to have been removed upstream by the capture
/// pipeline; the tracker only needs the linear model to move between pixel
/// and normalized image coordinates.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct CameraIntrinsics {
    pub fx: f64,
    pub fy: f64,
    pub cx: f64,
    pub cy: f64,
}

impl CameraIntrinsics {
    pub fn new(fx: f64, fy: f64, cx: f64, cy: f64) -> Self {
        Self { fx, fy, cx, cy }
    }

    /// Map a pixel observation onto the normalized z=1 image plane, the
    /// coordinate space the PnP solver works in.
    pub fn normalize(&self, pixel: [f32; 2]) -> Vec2 {
        Vec2::new(
            ((pixel[0] as f64 - self.cx) / self.fx) as f32,
            ((pixel[1] as f64 - self.cy) / self.fy) as f32,
        )
    }
}
