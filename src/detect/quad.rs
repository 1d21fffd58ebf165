//! Built-in intensity detector for a single dark square on a light field.
//!
//! This is the detector the synthetic and replay paths run with. It finds the
//! bounding box of below-threshold pixels, optionally scanning a decimated
//! grid first and refining the edges at full resolution, and reports the box
//! corners as a detection. Axis-aligned markers only; deployments with real
//! tag families plug their decoder in through [`MarkerDetector`] instead.

use image::GrayImage;
use nalgebra::Point2;

use super::{MarkerDetector, TagDetection};

#[derive(Debug, Clone, Copy)]
pub struct QuadDetector {
    threshold: u8,
    decimation: u32,
    min_side: u32,
}

impl Default for QuadDetector {
    fn default() -> Self {
        Self {
            threshold: 128,
            decimation: 1,
            min_side: 4,
        }
    }
}

impl QuadDetector {
    /// `decimation` is the sampling stride of the initial scan; 1 visits
    /// every pixel. Edges are re-scanned at full resolution afterwards, so
    /// corner accuracy does not degrade with the stride.
    pub fn new(threshold: u8, decimation: u32) -> Self {
        Self {
            threshold,
            decimation: decimation.max(1),
            min_side: 4,
        }
    }

    /// Reject boxes smaller than `min_side` pixels on either axis.
    pub fn with_min_side(mut self, min_side: u32) -> Self {
        self.min_side = min_side;
        self
    }

    fn is_dark(&self, image: &GrayImage, x: u32, y: u32) -> bool {
        image.get_pixel(x, y).0[0] < self.threshold
    }

    fn row_has_dark(&self, image: &GrayImage, y: u32, x0: u32, x1: u32) -> bool {
        (x0..=x1).any(|x| self.is_dark(image, x, y))
    }

    fn col_has_dark(&self, image: &GrayImage, x: u32, y0: u32, y1: u32) -> bool {
        (y0..=y1).any(|y| self.is_dark(image, x, y))
    }

    /// Inclusive bounding box of dark samples on the decimated grid.
    fn decimated_bbox(&self, image: &GrayImage) -> Option<(u32, u32, u32, u32)> {
        let step = self.decimation as usize;
        let mut bbox: Option<(u32, u32, u32, u32)> = None;
        for y in (0..image.height()).step_by(step) {
            for x in (0..image.width()).step_by(step) {
                if !self.is_dark(image, x, y) {
                    continue;
                }
                bbox = Some(match bbox {
                    None => (x, y, x, y),
                    Some((x0, y0, x1, y1)) => (x0.min(x), y0.min(y), x1.max(x), y1.max(y)),
                });
            }
        }
        bbox
    }

    /// Push the box outward to cover dark pixels the decimated grid skipped.
    /// For a convex dark region each side moves at most `decimation - 1`.
    fn grow_full_res(
        &self,
        image: &GrayImage,
        bbox: (u32, u32, u32, u32),
    ) -> (u32, u32, u32, u32) {
        let (mut x0, mut y0, mut x1, mut y1) = bbox;
        loop {
            let mut grew = false;
            if x0 > 0 && self.col_has_dark(image, x0 - 1, y0, y1) {
                x0 -= 1;
                grew = true;
            }
            if x1 + 1 < image.width() && self.col_has_dark(image, x1 + 1, y0, y1) {
                x1 += 1;
                grew = true;
            }
            if y0 > 0 && self.row_has_dark(image, y0 - 1, x0, x1) {
                y0 -= 1;
                grew = true;
            }
            if y1 + 1 < image.height() && self.row_has_dark(image, y1 + 1, x0, x1) {
                y1 += 1;
                grew = true;
            }
            if !grew {
                return (x0, y0, x1, y1);
            }
        }
    }
}

impl MarkerDetector for QuadDetector {
    fn detect(&mut self, image: &GrayImage) -> Vec<TagDetection> {
        let Some(bbox) = self.decimated_bbox(image) else {
            return Vec::new();
        };
        let (x0, y0, x1, y1) = if self.decimation > 1 {
            self.grow_full_res(image, bbox)
        } else {
            bbox
        };

        if x1 - x0 + 1 < self.min_side || y1 - y0 + 1 < self.min_side {
            return Vec::new();
        }

        // Pixel centers sit half a pixel inside the true edges.
        let left = f64::from(x0) - 0.5;
        let top = f64::from(y0) - 0.5;
        let right = f64::from(x1) + 0.5;
        let bottom = f64::from(y1) + 0.5;

        vec![TagDetection {
            id: 0,
            corners: [
                Point2::new(left, top),
                Point2::new(right, top),
                Point2::new(right, bottom),
                Point2::new(left, bottom),
            ],
        }]
    }
}
