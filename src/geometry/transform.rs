//! Anchor transform: the 4x4 matrix placing the virtual overlay relative to
//! the tracked surface.
//!
//! # Convention
//!
//! The transform is stored **row-major** and this convention is used
//! everywhere in the crate, including the raw engine command surface. The
//! sixteen elements lay out as:
//!
//! ```text
//! [ r00 r01 r02 tx ]      index [  0  1  2  3 ]
//! [ r10 r11 r12 ty ]  ->        [  4  5  6  7 ]
//! [ r20 r21 r22 tz ]            [  8  9 10 11 ]
//! [  0   0   0   1 ]            [ 12 13 14 15 ]
//! ```
//!
//! Column-major consumers (e.g. GL-style uniform uploads) must transpose at
//! their own boundary; nothing in this crate ever mixes conventions.

use nalgebra::{Rotation3, Vector3};

/// A 4x4 homogeneous transform, row-major.
///
/// Produced each frame by the pose-correction tracker and consumed
/// immediately by the render bridge; not retained beyond one frame unless
/// explicitly cached for map alignment.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct AnchorTransform {
    elements: [f32; 16],
}

impl AnchorTransform {
    /// The identity transform.
    pub fn identity() -> Self {
        Self::from_row_major([
            1.0, 0.0, 0.0, 0.0, //
            0.0, 1.0, 0.0, 0.0, //
            0.0, 0.0, 1.0, 0.0, //
            0.0, 0.0, 0.0, 1.0,
        ])
    }

    /// Wrap sixteen row-major elements.
    pub fn from_row_major(elements: [f32; 16]) -> Self {
        Self { elements }
    }

    /// Build from a rotation and a translation (both f64, as produced by the
    /// PnP solver), narrowing to f32 for the render path.
    pub fn from_rotation_translation(rotation: &Rotation3<f64>, translation: &Vector3<f64>) -> Self {
        let r = rotation.matrix();
        Self::from_row_major([
            r[(0, 0)] as f32,
            r[(0, 1)] as f32,
            r[(0, 2)] as f32,
            translation.x as f32,
            r[(1, 0)] as f32,
            r[(1, 1)] as f32,
            r[(1, 2)] as f32,
            translation.y as f32,
            r[(2, 0)] as f32,
            r[(2, 1)] as f32,
            r[(2, 2)] as f32,
            translation.z as f32,
            0.0,
            0.0,
            0.0,
            1.0,
        ])
    }

    /// The row-major element array.
    pub fn as_row_major(&self) -> &[f32; 16] {
        &self.elements
    }

    /// The translation column (tx, ty, tz).
    pub fn translation(&self) -> [f32; 3] {
        [self.elements[3], self.elements[7], self.elements[11]]
    }
}

impl Default for AnchorTransform {
    fn default() -> Self {
        Self::identity()
    }
}
