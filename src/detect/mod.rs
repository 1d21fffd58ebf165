//! Marker detection seam.
//!
//! Each pipeline stage owns its own detector instance, so implementations are
//! free to keep per-instance state (decimation settings, scratch buffers,
//! native handles) without synchronization.

pub mod quad;

use image::GrayImage;
use nalgebra::Point2;

use crate::geometry::Aabb;

pub use quad::QuadDetector;

/// One detected marker: an identifier and four corner positions in the pixel
/// coordinates of the searched image, wound TL, TR, BR, BL.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct TagDetection {
    pub id: usize,
    pub corners: [Point2<f64>; 4],
}

impl TagDetection {
    /// Axis-aligned bounding box of the corners.
    pub fn corner_bounds(&self) -> Aabb {
        Aabb::from_corners(&self.corners)
    }
}

/// Finds markers in a grayscale image. Stateful by design: detectors may
/// carry tuning (decimation, thresholds) fixed at construction.
pub trait MarkerDetector {
    fn detect(&mut self, image: &GrayImage) -> Vec<TagDetection>;
}

/// Choose the detection to track when several are present: the one with the
/// largest corner bounding box, earliest wins on ties.
pub fn pick_primary(detections: &[TagDetection]) -> Option<&TagDetection> {
    let mut best: Option<(&TagDetection, f64)> = None;
    for det in detections {
        let area = det.corner_bounds().area();
        match best {
            Some((_, best_area)) if area <= best_area => {}
            _ => best = Some((det, area)),
        }
    }
    best.map(|(det, _)| det)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn detection(id: usize, min: f64, max: f64) -> TagDetection {
        TagDetection {
            id,
            corners: [
                Point2::new(min, min),
                Point2::new(max, min),
                Point2::new(max, max),
                Point2::new(min, max),
            ],
        }
    }

    #[test]
    fn primary_is_the_largest_detection() {
        let dets = vec![
            detection(0, 0.0, 10.0),
            detection(1, 0.0, 50.0),
            detection(2, 0.0, 20.0),
        ];
        assert_eq!(pick_primary(&dets).unwrap().id, 1);
    }

    #[test]
    fn ties_go_to_the_earliest_detection() {
        let dets = vec![detection(7, 0.0, 25.0), detection(8, 10.0, 35.0)];
        assert_eq!(pick_primary(&dets).unwrap().id, 7);
    }

    #[test]
    fn no_detections_yield_none() {
        assert!(pick_primary(&[]).is_none());
    }
}
