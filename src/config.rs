//! Pipeline configuration.

use std::time::Duration;

use nalgebra::Point3;
use serde::{Deserialize, Serialize};
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("coarse resolution must be nonzero, got {0}x{1}")]
    ZeroCoarseResolution(u32, u32),
    #[error("marker side must be positive, got {0}")]
    NonPositiveMarkerSide(f64),
}

/// Physical description of the tracked marker: a flat square of known side
/// length, centered on its own origin.
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct MarkerGeometry {
    /// Side length in meters.
    pub side_m: f64,
}

impl MarkerGeometry {
    pub fn new(side_m: f64) -> Self {
        Self { side_m }
    }

    /// Marker-frame corner positions in TL, TR, BR, BL order, matching the
    /// corner order reported by detectors.
    pub fn object_corners(&self) -> [Point3<f64>; 4] {
        let h = self.side_m / 2.0;
        [
            Point3::new(-h, -h, 0.0),
            Point3::new(h, -h, 0.0),
            Point3::new(h, h, 0.0),
            Point3::new(-h, h, 0.0),
        ]
    }
}

impl Default for MarkerGeometry {
    fn default() -> Self {
        Self { side_m: 0.1552 }
    }
}

/// Tunables for the detection cascade. Serializable so deployments can ship
/// a JSON config next to the binary.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct PipelineConfig {
    /// Width of the downsampled image searched by the coarse stage.
    pub low_width: u32,
    /// Height of the downsampled image searched by the coarse stage.
    pub low_height: u32,
    /// Symmetric padding, in full-resolution pixels, added around the coarse
    /// bounding box when forming the refinement region.
    pub roi_padding: u32,
    /// How long the capture stage waits on the source before re-checking for
    /// shutdown.
    pub capture_timeout: Duration,
    pub marker: MarkerGeometry,
}

impl Default for PipelineConfig {
    fn default() -> Self {
        Self {
            low_width: 640,
            low_height: 480,
            roi_padding: 80,
            capture_timeout: Duration::from_millis(100),
            marker: MarkerGeometry::default(),
        }
    }
}

impl PipelineConfig {
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.low_width == 0 || self.low_height == 0 {
            return Err(ConfigError::ZeroCoarseResolution(
                self.low_width,
                self.low_height,
            ));
        }
        if !(self.marker.side_m > 0.0) {
            return Err(ConfigError::NonPositiveMarkerSide(self.marker.side_m));
        }
        Ok(())
    }
}
