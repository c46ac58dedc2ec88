//! Thin wrapper around the external SQPnP solver.

use glam::{Vec2, Vec3};
use nalgebra::{Rotation3, Vector3};
use tracing::debug;

/// Solve for the camera pose from matched 3D points and normalized 2D
/// observations (z=1 plane coordinates, see
/// [`CameraIntrinsics::normalize`](super::CameraIntrinsics::normalize)).
///
/// Returns the world-to-camera rotation and translation, or `None` when the
/// solver cannot produce a pose (degenerate configuration, no solution
/// within tolerance). Solver scratch state is scoped to this call on every
/// path.
pub(crate) fn solve_pnp(
    points3d: &[[f32; 3]],
    normalized2d: &[Vec2],
) -> Option<(Rotation3<f64>, Vector3<f64>)> {
    let pts3: Vec<Vec3> = points3d
        .iter()
        .map(|p| Vec3::new(p[0], p[1], p[2]))
        .collect();

    let Some((rvec, tvec)) = sqpnp_simple::sqpnp_solve_glam(&pts3, normalized2d) else {
        debug!(correspondences = pts3.len(), "PnP solver returned no pose");
        return None;
    };

    // The solver reports rotation as an axis-angle (Rodrigues) vector.
    let rotation = Rotation3::new(Vector3::new(rvec.0, rvec.1, rvec.2));
    let translation = Vector3::new(tvec.0, tvec.1, tvec.2);
    Some((rotation, translation))
}
