//! Fingerprint data model: the persisted feature signature of a target surface.
//!
//! A `Fingerprint` bundles the detected keypoints, their descriptor matrix,
//! and (optionally) each keypoint's 3D position in anchor-relative world
//! space at capture time. It is created once by the feature extractor when
//! the user confirms a target capture and is read-only afterwards; updates
//! produce a new `Fingerprint`.

mod descriptor;
mod keypoint;
mod signature;

pub use descriptor::{DescriptorMatrix, ElemType};
pub use keypoint::Keypoint;
pub use signature::{Fingerprint, FingerprintError};
