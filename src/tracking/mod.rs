//! Pose correction: reconciling the native engine's drift against the
//! fingerprint via Perspective-n-Point.

pub mod corrector;
pub mod intrinsics;
mod pnp;

pub use corrector::PoseCorrector;
pub use intrinsics::CameraIntrinsics;
