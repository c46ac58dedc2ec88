//! Mask refinement: channel normalization, flood fill, combination policy.

use image::{DynamicImage, GrayImage, RgbImage};
use thiserror::Error;
use tracing::warn;

use super::flood::flood_fill_region;

/// Per-channel fill tolerance measured against the seed pixel.
pub const FLOOD_TOLERANCE: u8 = 20;

/// How a refined region combines with the existing mask.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RefineMode {
    /// OR the new region into the mask (grow the target).
    Additive,
    /// AND the mask with the complement of the new region (carve away).
    Subtractive,
}

/// Failures during a refinement pass. These are absorbed by [`refine`],
/// which falls back to the unmodified prior mask.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum MaskError {
    #[error("unsupported channel layout: {0}")]
    UnsupportedChannels(String),

    #[error("seed ({x}, {y}) outside image bounds {width}x{height}")]
    SeedOutOfBounds { x: u32, y: u32, width: u32, height: u32 },

    #[error("mask is {mask_width}x{mask_height} but image is {width}x{height}")]
    DimensionMismatch {
        mask_width: u32,
        mask_height: u32,
        width: u32,
        height: u32,
    },
}

/// An all-excluded mask matching the given dimensions.
pub fn blank_mask(width: u32, height: u32) -> GrayImage {
    GrayImage::new(width, height)
}

/// Normalize a captured image to the 3-channel layout the flood fill is
/// defined over. 4-channel input drops alpha; 1-channel input replicates
/// gray. Anything else (16-bit, float) is rejected rather than silently
/// coerced.
pub fn normalize_channels(image: &DynamicImage) -> Result<RgbImage, MaskError> {
    match image {
        DynamicImage::ImageRgb8(rgb) => Ok(rgb.clone()),
        DynamicImage::ImageRgba8(_) | DynamicImage::ImageLuma8(_) | DynamicImage::ImageLumaA8(_) => {
            Ok(image.to_rgb8())
        }
        other => Err(MaskError::UnsupportedChannels(format!("{:?}", other.color()))),
    }
}

/// Refine the mask by flood-filling from `seed` and combining per `mode`.
///
/// Best-effort: any failure (bad seed, mismatched mask, unsupported image)
/// logs and returns the unmodified `current_mask` — one bad tap must never
/// corrupt the user's prior segmentation work.
pub fn refine(
    image: &DynamicImage,
    current_mask: &GrayImage,
    seed: (u32, u32),
    mode: RefineMode,
) -> GrayImage {
    refine_with_tolerance(image, current_mask, seed, mode, FLOOD_TOLERANCE)
}

/// [`refine`] with an explicit tolerance, for sessions that override the
/// default in their configuration.
pub fn refine_with_tolerance(
    image: &DynamicImage,
    current_mask: &GrayImage,
    seed: (u32, u32),
    mode: RefineMode,
    tolerance: u8,
) -> GrayImage {
    match try_refine(image, current_mask, seed, mode, tolerance) {
        Ok(mask) => mask,
        Err(err) => {
            warn!("mask refinement failed, keeping prior mask: {err}");
            current_mask.clone()
        }
    }
}

fn try_refine(
    image: &DynamicImage,
    current_mask: &GrayImage,
    seed: (u32, u32),
    mode: RefineMode,
    tolerance: u8,
) -> Result<GrayImage, MaskError> {
    // Channel normalization is an explicit pre-step; the fill itself only
    // ever sees 3-channel data.
    let rgb = normalize_channels(image)?;
    let (width, height) = rgb.dimensions();

    if current_mask.dimensions() != (width, height) {
        let (mask_width, mask_height) = current_mask.dimensions();
        return Err(MaskError::DimensionMismatch {
            mask_width,
            mask_height,
            width,
            height,
        });
    }
    if seed.0 >= width || seed.1 >= height {
        return Err(MaskError::SeedOutOfBounds {
            x: seed.0,
            y: seed.1,
            width,
            height,
        });
    }

    let region = flood_fill_region(&rgb, seed, tolerance);

    let combined = GrayImage::from_fn(width, height, |x, y| {
        let held = current_mask.get_pixel(x, y).0[0] == 255;
        let grown = region.get_pixel(x, y).0[0] == 255;
        let keep = match mode {
            RefineMode::Additive => held || grown,
            RefineMode::Subtractive => held && !grown,
        };
        image::Luma([if keep { 255 } else { 0 }])
    });
    Ok(combined)
}
