//! Pose recovery for a planar square marker from four corner correspondences.

use nalgebra::{Matrix3, Point2, SMatrix, SVector, Vector3};
use thiserror::Error;

use crate::camera::CameraModel;
use crate::config::MarkerGeometry;

#[derive(Debug, Error)]
pub enum SolveError {
    #[error("corner correspondences are degenerate")]
    DegenerateCorners,
    #[error("svd failed to converge")]
    SvdFailed,
}

/// Marker pose in the camera frame.
#[derive(Debug, Clone, Copy)]
pub struct SquarePose {
    /// Marker center in camera coordinates, meters.
    pub translation: Vector3<f64>,
    /// Rotation taking marker-frame directions into the camera frame.
    pub rotation: Matrix3<f64>,
}

impl SquarePose {
    /// In-plane heading: the rotation of the marker's x axis about the
    /// camera's optical axis, in degrees.
    pub fn yaw_deg(&self) -> f64 {
        yaw_from_rotation(&self.rotation)
    }
}

/// Recovers a marker pose from the four detected corner pixels. Implementors
/// must undistort and normalize the pixels against the supplied camera.
pub trait PoseSolver {
    fn solve_square(
        &self,
        image_corners: &[Point2<f64>; 4],
        marker: &MarkerGeometry,
        camera: &CameraModel,
    ) -> Result<SquarePose, SolveError>;
}

/// Homography-based solver for a square lying in its own Z = 0 plane.
///
/// Four correspondences determine the plane-to-image homography exactly.
/// In normalized camera coordinates H factors as `[r1 r2 t]` up to scale,
/// which yields the pose directly after orthonormalization.
#[derive(Debug, Clone, Copy, Default)]
pub struct PlanarSquareSolver;

impl PoseSolver for PlanarSquareSolver {
    fn solve_square(
        &self,
        image_corners: &[Point2<f64>; 4],
        marker: &MarkerGeometry,
        camera: &CameraModel,
    ) -> Result<SquarePose, SolveError> {
        let normalized = image_corners.map(|p| camera.normalized_undistorted(p));
        if quad_area(&normalized) < 1e-12 {
            return Err(SolveError::DegenerateCorners);
        }

        let object = marker.object_corners();
        let object_xy = [
            Point2::new(object[0].x, object[0].y),
            Point2::new(object[1].x, object[1].y),
            Point2::new(object[2].x, object[2].y),
            Point2::new(object[3].x, object[3].y),
        ];

        let h = square_homography(&object_xy, &normalized)?;
        decompose_homography(&h)
    }
}

/// Shoelace area of the (assumed convex) quad, for degeneracy checks.
fn quad_area(corners: &[Point2<f64>; 4]) -> f64 {
    let mut twice_area = 0.0;
    for i in 0..4 {
        let a = corners[i];
        let b = corners[(i + 1) % 4];
        twice_area += a.x * b.y - b.x * a.y;
    }
    (twice_area / 2.0).abs()
}

/// DLT homography for exactly four correspondences, plane coordinates to
/// normalized image coordinates.
///
/// With four points the system is exactly determined, so instead of a
/// nullspace extraction we fix `H[2,2] = 1` and solve the remaining eight
/// unknowns directly. The scale is legitimate here: `H[2,2]` is the marker
/// distance along the optical axis, which cannot vanish for a visible marker.
fn square_homography(
    plane: &[Point2<f64>; 4],
    image: &[Point2<f64>; 4],
) -> Result<Matrix3<f64>, SolveError> {
    let mut a = SMatrix::<f64, 8, 8>::zeros();
    let mut b = SVector::<f64, 8>::zeros();

    for (i, (pw, pi)) in plane.iter().zip(image.iter()).enumerate() {
        let (x, y) = (pw.x, pw.y);
        let (u, v) = (pi.x, pi.y);
        let r0 = 2 * i;
        let r1 = 2 * i + 1;

        a[(r0, 0)] = x;
        a[(r0, 1)] = y;
        a[(r0, 2)] = 1.0;
        a[(r0, 6)] = -u * x;
        a[(r0, 7)] = -u * y;
        b[r0] = u;

        a[(r1, 3)] = x;
        a[(r1, 4)] = y;
        a[(r1, 5)] = 1.0;
        a[(r1, 6)] = -v * x;
        a[(r1, 7)] = -v * y;
        b[r1] = v;
    }

    let h = a.lu().solve(&b).ok_or(SolveError::DegenerateCorners)?;

    Ok(Matrix3::new(
        h[0], h[1], h[2], h[3], h[4], h[5], h[6], h[7], 1.0,
    ))
}

/// Factor a plane-induced homography in normalized coordinates into rotation
/// and translation: `H ~ [r1 r2 t]` for the plane Z = 0.
fn decompose_homography(h: &Matrix3<f64>) -> Result<SquarePose, SolveError> {
    let h1 = h.column(0).into_owned();
    let h2 = h.column(1).into_owned();
    let h3 = h.column(2).into_owned();

    let norm1 = h1.norm();
    let norm2 = h2.norm();
    if norm1 < 1e-12 || norm2 < 1e-12 {
        return Err(SolveError::DegenerateCorners);
    }

    // Scale so the first two columns become unit rotation columns, averaging
    // the two norms. The sign is pinned by cheirality: the marker must sit in
    // front of the camera.
    let mut lambda = 2.0 / (norm1 + norm2);
    if lambda * h3.z < 0.0 {
        lambda = -lambda;
    }

    let r1 = h1 * lambda;
    let r2 = h2 * lambda;
    let r3 = r1.cross(&r2);
    let rough = Matrix3::from_columns(&[r1, r2, r3]);

    // Project onto SO(3) (polar decomposition via SVD).
    let svd = rough.svd(true, true);
    let u = svd.u.ok_or(SolveError::SvdFailed)?;
    let v_t = svd.v_t.ok_or(SolveError::SvdFailed)?;
    let mut rotation = u * v_t;
    if rotation.determinant() < 0.0 {
        let mut u_flipped = u;
        u_flipped.column_mut(2).neg_mut();
        rotation = u_flipped * v_t;
    }

    Ok(SquarePose {
        translation: h3 * lambda,
        rotation,
    })
}

/// Heading about the optical axis in degrees, read off the rotation matrix as
/// `atan2(R[1][0], R[0][0])`.
pub fn yaw_from_rotation(rotation: &Matrix3<f64>) -> f64 {
    rotation[(1, 0)].atan2(rotation[(0, 0)]).to_degrees()
}
