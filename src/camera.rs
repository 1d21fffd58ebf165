//! Pinhole camera model with Brown-Conrady distortion.

use nalgebra::{Matrix3, Point2, Point3};
use serde::{Deserialize, Serialize};

/// Pinhole intrinsics: focal lengths and principal point in pixels.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
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

    /// The 3x3 calibration matrix K.
    pub fn matrix(&self) -> Matrix3<f64> {
        Matrix3::new(self.fx, 0.0, self.cx, 0.0, self.fy, self.cy, 0.0, 0.0, 1.0)
    }

    /// Pixel coordinates to normalized image coordinates (z = 1 plane).
    pub fn pixel_to_normalized(&self, p: Point2<f64>) -> Point2<f64> {
        Point2::new((p.x - self.cx) / self.fx, (p.y - self.cy) / self.fy)
    }

    /// Normalized image coordinates back to pixels.
    pub fn normalized_to_pixel(&self, n: Point2<f64>) -> Point2<f64> {
        Point2::new(self.fx * n.x + self.cx, self.fy * n.y + self.cy)
    }

    pub fn is_valid(&self) -> bool {
        self.fx.is_finite()
            && self.fy.is_finite()
            && self.cx.is_finite()
            && self.cy.is_finite()
            && self.fx.abs() > f64::EPSILON
            && self.fy.abs() > f64::EPSILON
    }
}

/// Brown-Conrady coefficients in OpenCV order: k1, k2, p1, p2, k3.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct DistortionCoeffs {
    pub k1: f64,
    pub k2: f64,
    pub p1: f64,
    pub p2: f64,
    pub k3: f64,
}

/// Iteration cap for the fixed-point undistortion below. The model is mildly
/// nonlinear for realistic coefficients, so convergence is fast.
const UNDISTORT_MAX_ITERS: usize = 15;
const UNDISTORT_EPS: f64 = 1e-10;

impl DistortionCoeffs {
    pub fn none() -> Self {
        Self::default()
    }

    pub fn new(k1: f64, k2: f64, p1: f64, p2: f64, k3: f64) -> Self {
        Self { k1, k2, p1, p2, k3 }
    }

    pub fn is_zero(&self) -> bool {
        self.k1 == 0.0 && self.k2 == 0.0 && self.p1 == 0.0 && self.p2 == 0.0 && self.k3 == 0.0
    }

    /// Apply the forward model to a normalized point.
    pub fn distort(&self, n: Point2<f64>) -> Point2<f64> {
        let (x, y) = (n.x, n.y);
        let r2 = x * x + y * y;
        let radial = 1.0 + self.k1 * r2 + self.k2 * r2 * r2 + self.k3 * r2 * r2 * r2;
        let dx = 2.0 * self.p1 * x * y + self.p2 * (r2 + 2.0 * x * x);
        let dy = self.p1 * (r2 + 2.0 * y * y) + 2.0 * self.p2 * x * y;
        Point2::new(x * radial + dx, y * radial + dy)
    }

    /// Invert the model by fixed-point iteration, seeded with the distorted
    /// point itself.
    pub fn undistort(&self, d: Point2<f64>) -> Point2<f64> {
        if self.is_zero() {
            return d;
        }
        let mut n = d;
        for _ in 0..UNDISTORT_MAX_ITERS {
            let reprojected = self.distort(n);
            let err_x = reprojected.x - d.x;
            let err_y = reprojected.y - d.y;
            n = Point2::new(n.x - err_x, n.y - err_y);
            if err_x * err_x + err_y * err_y < UNDISTORT_EPS * UNDISTORT_EPS {
                break;
            }
        }
        n
    }
}

/// Intrinsics plus distortion, shared read-only by the stages that project
/// or back-project points.
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct CameraModel {
    pub intrinsics: CameraIntrinsics,
    pub distortion: DistortionCoeffs,
}

impl CameraModel {
    pub fn new(intrinsics: CameraIntrinsics, distortion: DistortionCoeffs) -> Self {
        Self {
            intrinsics,
            distortion,
        }
    }

    /// Project a camera-frame point to distorted pixel coordinates. Returns
    /// `None` for points at or behind the camera plane.
    pub fn project(&self, p: &Point3<f64>) -> Option<Point2<f64>> {
        if p.z <= f64::EPSILON {
            return None;
        }
        let n = Point2::new(p.x / p.z, p.y / p.z);
        Some(self.intrinsics.normalized_to_pixel(self.distortion.distort(n)))
    }

    /// Back-project a distorted pixel to undistorted normalized coordinates.
    pub fn normalized_undistorted(&self, pixel: Point2<f64>) -> Point2<f64> {
        self.distortion
            .undistort(self.intrinsics.pixel_to_normalized(pixel))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    fn intrinsics() -> CameraIntrinsics {
        CameraIntrinsics::new(1000.0, 995.0, 640.0, 480.0)
    }

    #[test]
    fn normalize_round_trips() {
        let k = intrinsics();
        let p = Point2::new(812.5, 123.25);
        let back = k.normalized_to_pixel(k.pixel_to_normalized(p));
        assert_relative_eq!(back.x, p.x, epsilon = 1e-12);
        assert_relative_eq!(back.y, p.y, epsilon = 1e-12);
    }

    #[test]
    fn calibration_matrix_layout() {
        let k = intrinsics().matrix();
        assert_eq!(k[(0, 0)], 1000.0);
        assert_eq!(k[(1, 1)], 995.0);
        assert_eq!(k[(0, 2)], 640.0);
        assert_eq!(k[(1, 2)], 480.0);
        assert_eq!(k[(2, 2)], 1.0);
    }

    #[test]
    fn optical_axis_projects_to_principal_point() {
        let cam = CameraModel::new(intrinsics(), DistortionCoeffs::none());
        let p = cam.project(&Point3::new(0.0, 0.0, 2.0)).unwrap();
        assert_relative_eq!(p.x, 640.0, epsilon = 1e-12);
        assert_relative_eq!(p.y, 480.0, epsilon = 1e-12);
    }

    #[test]
    fn points_behind_camera_do_not_project() {
        let cam = CameraModel::new(intrinsics(), DistortionCoeffs::none());
        assert!(cam.project(&Point3::new(0.1, 0.1, -1.0)).is_none());
        assert!(cam.project(&Point3::new(0.1, 0.1, 0.0)).is_none());
    }

    #[test]
    fn undistort_inverts_distort() {
        let dist = DistortionCoeffs::new(-0.28, 0.07, 1.2e-4, -9.0e-5, 0.0);
        for &(x, y) in &[(0.0, 0.0), (0.1, -0.2), (-0.35, 0.3), (0.4, 0.4)] {
            let n = Point2::new(x, y);
            let back = dist.undistort(dist.distort(n));
            assert_relative_eq!(back.x, n.x, epsilon = 1e-8);
            assert_relative_eq!(back.y, n.y, epsilon = 1e-8);
        }
    }

    #[test]
    fn zero_distortion_is_identity() {
        let dist = DistortionCoeffs::none();
        let n = Point2::new(0.25, -0.125);
        assert_eq!(dist.distort(n), n);
        assert_eq!(dist.undistort(n), n);
    }

    #[test]
    fn degenerate_intrinsics_are_flagged() {
        assert!(intrinsics().is_valid());
        assert!(!CameraIntrinsics::new(0.0, 1000.0, 640.0, 480.0).is_valid());
        assert!(!CameraIntrinsics::new(f64::NAN, 1000.0, 640.0, 480.0).is_valid());
    }
}
