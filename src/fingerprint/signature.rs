//! The matched-feature signature of a captured target surface.

use std::hash::{Hash, Hasher};

use thiserror::Error;

use super::descriptor::DescriptorMatrix;
use super::keypoint::Keypoint;

/// Cross-field validation failures when assembling a [`Fingerprint`].
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum FingerprintError {
    #[error("keypoint count {keypoints} does not match descriptor rows {rows}")]
    KeypointRowMismatch { keypoints: usize, rows: usize },

    #[error("3D point array length {len} is not a multiple of 3")]
    RaggedPoints { len: usize },

    #[error("3D point count {points} does not match keypoint count {keypoints}")]
    PointCountMismatch { points: usize, keypoints: usize },
}

/// The persisted feature signature identifying a target surface.
///
/// Keypoints are index-aligned with descriptor rows: `keypoints[i]` is
/// described by `descriptors.row(i)`. When present, `points3d` is a flat
/// `[x0,y0,z0, x1,y1,z1, ...]` array giving each keypoint's position in
/// anchor-relative world space at capture time; it is what makes the
/// fingerprint usable for PnP pose correction.
///
/// Equality and hashing compare descriptor bytes by content, never identity.
#[derive(Debug, Clone, PartialEq)]
pub struct Fingerprint {
    keypoints: Vec<Keypoint>,
    descriptors: DescriptorMatrix,
    points3d: Vec<f32>,
}

impl Fingerprint {
    /// Assemble a fingerprint, enforcing index alignment between keypoints,
    /// descriptor rows, and (when supplied) 3D points.
    pub fn new(
        keypoints: Vec<Keypoint>,
        descriptors: DescriptorMatrix,
        points3d: Option<Vec<f32>>,
    ) -> Result<Self, FingerprintError> {
        if keypoints.len() != descriptors.rows() as usize {
            return Err(FingerprintError::KeypointRowMismatch {
                keypoints: keypoints.len(),
                rows: descriptors.rows() as usize,
            });
        }
        let points3d = points3d.unwrap_or_default();
        if !points3d.is_empty() {
            if points3d.len() % 3 != 0 {
                return Err(FingerprintError::RaggedPoints {
                    len: points3d.len(),
                });
            }
            if points3d.len() / 3 != keypoints.len() {
                return Err(FingerprintError::PointCountMismatch {
                    points: points3d.len() / 3,
                    keypoints: keypoints.len(),
                });
            }
        }
        Ok(Self {
            keypoints,
            descriptors,
            points3d,
        })
    }

    pub fn keypoints(&self) -> &[Keypoint] {
        &self.keypoints
    }

    pub fn descriptors(&self) -> &DescriptorMatrix {
        &self.descriptors
    }

    /// Flat 3D point array; empty when the fingerprint carries no geometry.
    pub fn points3d(&self) -> &[f32] {
        &self.points3d
    }

    /// Whether anchor-relative 3D points were captured for this fingerprint.
    pub fn has_geometry(&self) -> bool {
        !self.points3d.is_empty()
    }

    /// The 3D point for keypoint `index`, `None` when out of range or when
    /// the fingerprint has no geometry.
    pub fn point3d(&self, index: usize) -> Option<[f32; 3]> {
        let base = index.checked_mul(3)?;
        if base + 3 > self.points3d.len() {
            return None;
        }
        Some([
            self.points3d[base],
            self.points3d[base + 1],
            self.points3d[base + 2],
        ])
    }
}

impl Eq for Fingerprint {}

impl Hash for Fingerprint {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.keypoints.hash(state);
        self.descriptors.hash(state);
        for v in &self.points3d {
            v.to_bits().hash(state);
        }
    }
}
