//! Logging sink for headless runs.

use tracing::info;

use crate::system::PoseEstimate;

use super::{pose_label, PresentError, PresentationSink};

/// Writes each pose as a log line. An optional frame budget flips the quit
/// poll after a fixed number of poses, which keeps demo runs bounded.
#[derive(Debug, Default)]
pub struct ConsoleSink {
    presented: usize,
    budget: Option<usize>,
}

impl ConsoleSink {
    pub fn new() -> Self {
        Self::default()
    }

    /// Request termination once `frames` poses have been presented.
    pub fn with_frame_budget(frames: usize) -> Self {
        Self {
            presented: 0,
            budget: Some(frames),
        }
    }

    pub fn presented(&self) -> usize {
        self.presented
    }
}

impl PresentationSink for ConsoleSink {
    fn present(&mut self, pose: &PoseEstimate) -> Result<(), PresentError> {
        self.presented += 1;
        info!(
            timestamp_ns = pose.frame.timestamp_ns,
            roi = ?pose.roi,
            "{}",
            pose_label(pose)
        );
        Ok(())
    }

    fn poll_quit(&mut self) -> bool {
        self.budget.is_some_and(|budget| self.presented >= budget)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::frame::Frame;
    use crate::geometry::PixelRect;
    use image::RgbImage;
    use nalgebra::Vector3;
    use std::sync::Arc;

    fn pose() -> PoseEstimate {
        PoseEstimate {
            frame: Arc::new(Frame::new(RgbImage::new(4, 4), 3)),
            translation: Vector3::new(0.0, 0.0, 1.0),
            yaw_deg: 0.0,
            roi: PixelRect::new(0, 0, 4, 4),
            valid: true,
        }
    }

    #[test]
    fn without_budget_it_never_quits() {
        let mut sink = ConsoleSink::new();
        for _ in 0..100 {
            sink.present(&pose()).unwrap();
        }
        assert!(!sink.poll_quit());
        assert_eq!(sink.presented(), 100);
    }

    #[test]
    fn budget_flips_the_quit_poll() {
        let mut sink = ConsoleSink::with_frame_budget(2);
        assert!(!sink.poll_quit());
        sink.present(&pose()).unwrap();
        assert!(!sink.poll_quit());
        sink.present(&pose()).unwrap();
        assert!(sink.poll_quit());
    }

    #[test]
    fn zero_budget_quits_immediately() {
        let mut sink = ConsoleSink::with_frame_budget(0);
        assert!(sink.poll_quit());
    }
}
