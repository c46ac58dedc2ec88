//! Mask evolution engine: interactive region-growing segmentation.
//!
//! Isolates the target surface from its background in a captured photo. The
//! user taps seed points; each tap grows (or carves away) a flood-filled
//! region around the seed. The mask is a single-channel binary image with
//! the same dimensions as its source: 0 = excluded, 255 = included.

pub mod engine;
mod flood;

pub use engine::{
    blank_mask, normalize_channels, refine, refine_with_tolerance, MaskError, RefineMode,
    FLOOD_TOLERANCE,
};
