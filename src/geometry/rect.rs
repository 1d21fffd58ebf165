//! Axis-aligned rectangles and the coarse-to-fine region mapping.

use nalgebra::Point2;
use serde::{Deserialize, Serialize};

/// Integer pixel rectangle, always within the frame it was clamped to.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct PixelRect {
    pub x: u32,
    pub y: u32,
    pub width: u32,
    pub height: u32,
}

impl PixelRect {
    pub fn new(x: u32, y: u32, width: u32, height: u32) -> Self {
        Self {
            x,
            y,
            width,
            height,
        }
    }

    /// One past the rightmost column.
    pub fn right(&self) -> u32 {
        self.x + self.width
    }

    /// One past the bottom row.
    pub fn bottom(&self) -> u32 {
        self.y + self.height
    }

    pub fn contains_point(&self, x: f64, y: f64) -> bool {
        x >= f64::from(self.x)
            && y >= f64::from(self.y)
            && x <= f64::from(self.right())
            && y <= f64::from(self.bottom())
    }
}

/// Floating-point bounding box accumulated from detection corners.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Aabb {
    pub min_x: f64,
    pub min_y: f64,
    pub max_x: f64,
    pub max_y: f64,
}

impl Aabb {
    pub fn from_corners(corners: &[Point2<f64>; 4]) -> Self {
        let mut bounds = Self {
            min_x: corners[0].x,
            min_y: corners[0].y,
            max_x: corners[0].x,
            max_y: corners[0].y,
        };
        for c in &corners[1..] {
            bounds.min_x = bounds.min_x.min(c.x);
            bounds.min_y = bounds.min_y.min(c.y);
            bounds.max_x = bounds.max_x.max(c.x);
            bounds.max_y = bounds.max_y.max(c.y);
        }
        bounds
    }

    /// Scale both corners, with independent factors per axis.
    pub fn scaled(self, sx: f64, sy: f64) -> Self {
        Self {
            min_x: self.min_x * sx,
            min_y: self.min_y * sy,
            max_x: self.max_x * sx,
            max_y: self.max_y * sy,
        }
    }

    /// Grow symmetrically by `pad` on every side.
    pub fn padded(self, pad: f64) -> Self {
        Self {
            min_x: self.min_x - pad,
            min_y: self.min_y - pad,
            max_x: self.max_x + pad,
            max_y: self.max_y + pad,
        }
    }

    pub fn width(&self) -> f64 {
        self.max_x - self.min_x
    }

    pub fn height(&self) -> f64 {
        self.max_y - self.min_y
    }

    pub fn area(&self) -> f64 {
        self.width().max(0.0) * self.height().max(0.0)
    }

    /// Intersect with a `frame_width` x `frame_height` frame and round
    /// outward to whole pixels. `None` when nothing of positive area
    /// survives the clamp.
    pub fn clamp_to_frame(self, frame_width: u32, frame_height: u32) -> Option<PixelRect> {
        let x0 = self.min_x.floor().max(0.0) as u32;
        let y0 = self.min_y.floor().max(0.0) as u32;
        let x1 = self.max_x.ceil().min(f64::from(frame_width)).max(0.0) as u32;
        let y1 = self.max_y.ceil().min(f64::from(frame_height)).max(0.0) as u32;
        if x1 <= x0 || y1 <= y0 {
            return None;
        }
        Some(PixelRect::new(x0, y0, x1 - x0, y1 - y0))
    }
}

/// Map detection corners found in a downsampled image to the padded
/// full-resolution region the fine stage should search. `sx` and `sy` are the
/// per-axis upscale factors from search resolution to full resolution.
pub fn refinement_region(
    corners: &[Point2<f64>; 4],
    sx: f64,
    sy: f64,
    pad: f64,
    frame_width: u32,
    frame_height: u32,
) -> Option<PixelRect> {
    Aabb::from_corners(corners)
        .scaled(sx, sy)
        .padded(pad)
        .clamp_to_frame(frame_width, frame_height)
}
