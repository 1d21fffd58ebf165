//! Payloads flowing through the handoff slots.

use std::sync::Arc;

use nalgebra::Vector3;

use crate::frame::Frame;
use crate::geometry::PixelRect;

/// Output of the coarse stage: where in the full-resolution frame the fine
/// stage should search.
///
/// Invalidity is data, not an error: a candidate whose mapped region fell
/// entirely outside the frame still flows downstream with `valid == false`,
/// giving the fine stage a well-defined discard path.
#[derive(Debug, Clone)]
pub struct RegionCandidate {
    /// The frame the region was derived from.
    pub frame: Arc<Frame>,
    /// Search region in the frame's native resolution. Meaningful only when
    /// `valid`; always fully inside the frame bounds when it is.
    pub roi: PixelRect,
    pub valid: bool,
}

impl RegionCandidate {
    pub fn new(frame: Arc<Frame>, roi: PixelRect) -> Self {
        Self {
            frame,
            roi,
            valid: true,
        }
    }

    /// A marker was seen, but its mapped region degenerated after clamping.
    pub fn degenerate(frame: Arc<Frame>) -> Self {
        Self {
            frame,
            roi: PixelRect::default(),
            valid: false,
        }
    }
}

/// Output of the fine stage: the refined marker pose for one frame.
#[derive(Debug, Clone)]
pub struct PoseEstimate {
    /// The frame the pose was estimated on.
    pub frame: Arc<Frame>,
    /// Marker center in camera coordinates, meters.
    pub translation: Vector3<f64>,
    /// Heading about the optical axis, degrees.
    pub yaw_deg: f64,
    /// The region the corners were refined in, for overlay rendering.
    pub roi: PixelRect,
    pub valid: bool,
}
