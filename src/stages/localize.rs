//! Coarse stage: finds the marker at a fixed low resolution and maps its
//! bounding box to a padded full-resolution search region.

use std::sync::Arc;

use tracing::{debug, info, trace};

use crate::config::PipelineConfig;
use crate::detect::{self, MarkerDetector};
use crate::frame::{self, Frame};
use crate::geometry;
use crate::system::{RegionCandidate, SharedState};

pub struct CoarseLocalizer {
    detector: Box<dyn MarkerDetector + Send>,
    config: PipelineConfig,
    shared: Arc<SharedState>,
}

impl CoarseLocalizer {
    pub fn new(
        detector: Box<dyn MarkerDetector + Send>,
        config: PipelineConfig,
        shared: Arc<SharedState>,
    ) -> Self {
        Self {
            detector,
            config,
            shared,
        }
    }

    /// Stage loop. Exits when the frame slot reports shutdown.
    pub fn run(mut self) {
        info!("coarse localizer started");
        while let Some(frame) = self.shared.frame_slot.take_blocking() {
            if let Some(candidate) = self.localize(&frame) {
                if self.shared.region_slot.publish(candidate) {
                    debug!("region slot overwritten before consumption");
                }
            }
        }
        info!("coarse localizer exited");
    }

    /// One frame's worth of work. `None` when nothing was detected: no
    /// candidate is published and the fine stage stays idle.
    fn localize(&mut self, frame: &Arc<Frame>) -> Option<RegionCandidate> {
        let gray = frame.to_gray();
        let low = frame::downsample(&gray, self.config.low_width, self.config.low_height);
        let detections = self.detector.detect(&low);
        let primary = detect::pick_primary(&detections)?;

        // Per-axis upscale factors; downsampling may be non-uniform.
        let sx = f64::from(frame.width()) / f64::from(low.width());
        let sy = f64::from(frame.height()) / f64::from(low.height());

        match geometry::refinement_region(
            &primary.corners,
            sx,
            sy,
            f64::from(self.config.roi_padding),
            frame.width(),
            frame.height(),
        ) {
            Some(roi) => {
                trace!(?roi, "coarse detection mapped to full resolution");
                Some(RegionCandidate::new(frame.clone(), roi))
            }
            None => {
                debug!("mapped region left the frame, flagging candidate invalid");
                Some(RegionCandidate::degenerate(frame.clone()))
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::detect::TagDetection;
    use crate::geometry::PixelRect;
    use image::{GrayImage, RgbImage};
    use nalgebra::Point2;

    /// Returns canned detections regardless of image content.
    struct ScriptedDetector(Vec<TagDetection>);

    impl MarkerDetector for ScriptedDetector {
        fn detect(&mut self, _image: &GrayImage) -> Vec<TagDetection> {
            self.0.clone()
        }
    }

    fn corners(min: f64, max: f64) -> [Point2<f64>; 4] {
        [
            Point2::new(min, min),
            Point2::new(max, min),
            Point2::new(max, max),
            Point2::new(min, max),
        ]
    }

    fn frame_1280x960() -> Arc<Frame> {
        Arc::new(Frame::new(RgbImage::new(1280, 960), 42))
    }

    fn localizer(detections: Vec<TagDetection>) -> CoarseLocalizer {
        CoarseLocalizer::new(
            Box::new(ScriptedDetector(detections)),
            PipelineConfig::default(),
            SharedState::new(),
        )
    }

    #[test]
    fn maps_low_res_corners_to_a_padded_region() {
        // 1280x960 over 640x480 gives scale 2 on both axes.
        let frame = frame_1280x960();
        let det = TagDetection {
            id: 0,
            corners: corners(100.0, 150.0),
        };
        let candidate = localizer(vec![det]).localize(&frame).unwrap();

        assert!(candidate.valid);
        assert_eq!(candidate.roi, PixelRect::new(120, 120, 260, 260));
        assert_eq!(candidate.frame.timestamp_ns, 42);
    }

    #[test]
    fn zero_detections_publish_nothing() {
        let mut localizer = localizer(vec![]);
        let frame = frame_1280x960();
        assert!(localizer.localize(&frame).is_none());
        // The downstream slot stays empty for this cycle.
        assert!(localizer.shared.region_slot.is_empty());
    }

    #[test]
    fn region_outside_the_frame_is_flagged_invalid() {
        let frame = frame_1280x960();
        let det = TagDetection {
            id: 0,
            corners: corners(-200.0, -190.0),
        };
        let candidate = localizer(vec![det]).localize(&frame).unwrap();
        assert!(!candidate.valid);
    }

    #[test]
    fn largest_detection_wins() {
        let frame = frame_1280x960();
        let small = TagDetection {
            id: 0,
            corners: corners(10.0, 20.0),
        };
        let large = TagDetection {
            id: 1,
            corners: corners(100.0, 150.0),
        };
        let candidate = localizer(vec![small, large]).localize(&frame).unwrap();
        assert_eq!(candidate.roi, PixelRect::new(120, 120, 260, 260));
    }

    #[test]
    fn run_drains_until_shutdown() {
        let shared = SharedState::new();
        let det = TagDetection {
            id: 0,
            corners: corners(100.0, 150.0),
        };
        let localizer = CoarseLocalizer::new(
            Box::new(ScriptedDetector(vec![det])),
            PipelineConfig::default(),
            shared.clone(),
        );

        shared.frame_slot.publish(frame_1280x960());
        shared.request_shutdown();
        localizer.run();

        let candidate = shared.region_slot.try_take().expect("candidate published");
        assert!(candidate.valid);
    }
}
