//! Messages sent from the capture/frame side into the worker threads.

use image::{DynamicImage, GrayImage};

use crate::mask::RefineMode;
use crate::tracking::CameraIntrinsics;

/// One mask-refinement tap: grow or carve the segmentation at `seed`.
pub struct RefineRequest {
    pub image: DynamicImage,
    pub current_mask: GrayImage,
    pub seed: (u32, u32),
    pub mode: RefineMode,
}

/// The matched 2D/3D correspondences extracted from one camera frame,
/// index-aligned: `points2d[i]` observes the fingerprint point
/// `points3d[i]`.
pub struct FrameMatches {
    pub points2d: Vec<[f32; 2]>,
    pub points3d: Vec<[f32; 3]>,
    pub intrinsics: CameraIntrinsics,
}
