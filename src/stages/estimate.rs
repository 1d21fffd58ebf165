//! Fine stage: re-detects inside the candidate region at full resolution and
//! solves for the marker pose.

use std::sync::Arc;

use nalgebra::Point2;
use tracing::{debug, info, trace};

use crate::camera::CameraModel;
use crate::config::MarkerGeometry;
use crate::detect::{self, MarkerDetector};
use crate::frame;
use crate::geometry::PoseSolver;
use crate::system::{PoseEstimate, RegionCandidate, SharedState};

pub struct FinePoseEstimator {
    detector: Box<dyn MarkerDetector + Send>,
    solver: Box<dyn PoseSolver + Send>,
    marker: MarkerGeometry,
    camera: CameraModel,
    shared: Arc<SharedState>,
}

impl FinePoseEstimator {
    pub fn new(
        detector: Box<dyn MarkerDetector + Send>,
        solver: Box<dyn PoseSolver + Send>,
        marker: MarkerGeometry,
        camera: CameraModel,
        shared: Arc<SharedState>,
    ) -> Self {
        Self {
            detector,
            solver,
            marker,
            camera,
            shared,
        }
    }

    /// Stage loop. Exits when the region slot reports shutdown.
    pub fn run(mut self) {
        info!("fine pose estimator started");
        while let Some(candidate) = self.shared.region_slot.take_blocking() {
            if !candidate.valid {
                debug!("discarding invalid region candidate");
                continue;
            }
            if let Some(pose) = self.estimate(&candidate) {
                if self.shared.pose_slot.publish(pose) {
                    debug!("pose slot overwritten before consumption");
                }
            }
        }
        info!("fine pose estimator exited");
    }

    /// One candidate's worth of work. `None` when the marker is gone from
    /// the region or the solve is rejected; no retry here, the next coarse
    /// cycle supplies a fresh candidate.
    fn estimate(&mut self, candidate: &RegionCandidate) -> Option<PoseEstimate> {
        let gray = candidate.frame.to_gray();
        let crop = frame::crop(&gray, &candidate.roi);
        let detections = self.detector.detect(&crop);
        let primary = detect::pick_primary(&detections)?;

        // Crop-local corners back to full-frame pixel coordinates.
        let offset_x = f64::from(candidate.roi.x);
        let offset_y = f64::from(candidate.roi.y);
        let corners = primary
            .corners
            .map(|c| Point2::new(c.x + offset_x, c.y + offset_y));

        let pose = match self.solver.solve_square(&corners, &self.marker, &self.camera) {
            Ok(pose) => pose,
            Err(e) => {
                debug!("pose solve rejected: {e}");
                return None;
            }
        };

        trace!(
            x = pose.translation.x,
            y = pose.translation.y,
            z = pose.translation.z,
            "pose solved"
        );
        Some(PoseEstimate {
            frame: candidate.frame.clone(),
            translation: pose.translation,
            yaw_deg: pose.yaw_deg(),
            roi: candidate.roi,
            valid: true,
        })
    }
}
