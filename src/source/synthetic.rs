//! Synthetic scene source: a dark square marker drifting across a light
//! background, rendered through the same camera model the pipeline solves
//! against. Used by the demo binary and the end-to-end tests, where ground
//! truth must be known exactly.

use std::thread;
use std::time::{Duration, Instant};

use nalgebra::{Point2, Point3, Rotation3, Vector3};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

use crate::camera::CameraModel;
use crate::config::MarkerGeometry;
use crate::source::{FrameSource, FrameView, SourceError};

#[derive(Debug, Clone)]
pub struct SyntheticConfig {
    pub width: u32,
    pub height: u32,
    /// Frames to produce before reporting end of stream.
    pub frames: usize,
    /// Timestamp step between frames, and the delivery cadence. Zero hands
    /// frames out as fast as they are asked for.
    pub frame_period_ns: u64,
    /// Marker center in camera coordinates at frame 0. Keep z positive.
    pub start: Vector3<f64>,
    /// Added to the marker center every frame.
    pub velocity_per_frame: Vector3<f64>,
    /// Fixed in-plane rotation of the marker.
    pub yaw_deg: f64,
    pub background: u8,
    pub foreground: u8,
    /// Uniform per-channel intensity jitter, at most this many levels.
    pub noise_amplitude: u8,
    pub noise_seed: u64,
}

impl Default for SyntheticConfig {
    fn default() -> Self {
        Self {
            width: 1280,
            height: 960,
            frames: 60,
            frame_period_ns: 33_333_333,
            start: Vector3::new(-0.12, -0.08, 1.3),
            velocity_per_frame: Vector3::new(0.002, 0.0012, 0.0),
            yaw_deg: 0.0,
            background: 210,
            foreground: 25,
            noise_amplitude: 0,
            noise_seed: 7,
        }
    }
}

pub struct SyntheticSource {
    camera: CameraModel,
    marker: MarkerGeometry,
    config: SyntheticConfig,
    index: usize,
    next_due: Instant,
    rng: StdRng,
    scratch: Vec<u8>,
}

impl SyntheticSource {
    pub fn new(camera: CameraModel, marker: MarkerGeometry, config: SyntheticConfig) -> Self {
        let scratch = vec![0u8; (config.width * config.height * 3) as usize];
        let rng = StdRng::seed_from_u64(config.noise_seed);
        Self {
            camera,
            marker,
            config,
            index: 0,
            next_due: Instant::now(),
            rng,
            scratch,
        }
    }

    /// Ground-truth marker center at a given frame index.
    pub fn translation_at(&self, frame_index: usize) -> Vector3<f64> {
        self.config.start + self.config.velocity_per_frame * frame_index as f64
    }

    pub fn timestamp_at(&self, frame_index: usize) -> u64 {
        frame_index as u64 * self.config.frame_period_ns
    }

    /// Projected marker outline for a frame, or `None` if any corner falls
    /// behind the camera.
    pub fn marker_polygon(&self, frame_index: usize) -> Option<[Point2<f64>; 4]> {
        let rotation =
            Rotation3::from_axis_angle(&Vector3::z_axis(), self.config.yaw_deg.to_radians())
                .into_inner();
        let translation = self.translation_at(frame_index);
        let mut polygon = [Point2::origin(); 4];
        for (dst, corner) in polygon.iter_mut().zip(self.marker.object_corners()) {
            let p_cam = Point3::from(rotation * corner.coords + translation);
            *dst = self.camera.project(&p_cam)?;
        }
        Some(polygon)
    }

    fn render(&mut self) {
        self.scratch.fill(self.config.background);

        if let Some(polygon) = self.marker_polygon(self.index) {
            let min_x = polygon.iter().fold(f64::MAX, |a, p| a.min(p.x)).floor();
            let min_y = polygon.iter().fold(f64::MAX, |a, p| a.min(p.y)).floor();
            let max_x = polygon.iter().fold(f64::MIN, |a, p| a.max(p.x)).ceil();
            let max_y = polygon.iter().fold(f64::MIN, |a, p| a.max(p.y)).ceil();

            let x0 = min_x.max(0.0) as u32;
            let y0 = min_y.max(0.0) as u32;
            let x1 = (max_x.min(f64::from(self.config.width) - 1.0)).max(0.0) as u32;
            let y1 = (max_y.min(f64::from(self.config.height) - 1.0)).max(0.0) as u32;

            for y in y0..=y1 {
                for x in x0..=x1 {
                    if point_in_convex_quad(&polygon, f64::from(x), f64::from(y)) {
                        let base = ((y * self.config.width + x) * 3) as usize;
                        self.scratch[base] = self.config.foreground;
                        self.scratch[base + 1] = self.config.foreground;
                        self.scratch[base + 2] = self.config.foreground;
                    }
                }
            }
        }

        if self.config.noise_amplitude > 0 {
            let amp = i16::from(self.config.noise_amplitude);
            for byte in &mut self.scratch {
                let jitter = self.rng.gen_range(-amp..=amp);
                *byte = (i16::from(*byte) + jitter).clamp(0, 255) as u8;
            }
        }
    }
}

/// True when the pixel center lies inside the polygon; works for any
/// consistently wound convex quad.
fn point_in_convex_quad(polygon: &[Point2<f64>; 4], x: f64, y: f64) -> bool {
    let mut sign = 0.0f64;
    for i in 0..4 {
        let a = polygon[i];
        let b = polygon[(i + 1) % 4];
        let cross = (b.x - a.x) * (y - a.y) - (b.y - a.y) * (x - a.x);
        if cross.abs() < f64::EPSILON {
            continue;
        }
        if sign == 0.0 {
            sign = cross.signum();
        } else if sign != cross.signum() {
            return false;
        }
    }
    true
}

impl FrameSource for SyntheticSource {
    /// Delivery is paced on `frame_period_ns`, like a camera producing at a
    /// fixed rate. When the next frame falls due beyond `timeout`, this
    /// sleeps out the timeout and reports `Ok(None)`.
    fn try_next_frame(&mut self, timeout: Duration) -> Result<Option<FrameView<'_>>, SourceError> {
        if self.index >= self.config.frames {
            return Err(SourceError::EndOfStream);
        }

        let now = Instant::now();
        if now < self.next_due {
            let remaining = self.next_due - now;
            if remaining > timeout {
                thread::sleep(timeout);
                return Ok(None);
            }
            thread::sleep(remaining);
        }
        self.next_due = Instant::now() + Duration::from_nanos(self.config.frame_period_ns);

        self.render();
        let timestamp_ns = self.timestamp_at(self.index);
        self.index += 1;
        Ok(Some(FrameView {
            data: &self.scratch,
            width: self.config.width,
            height: self.config.height,
            timestamp_ns,
        }))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::camera::{CameraIntrinsics, DistortionCoeffs};

    fn camera() -> CameraModel {
        CameraModel::new(
            CameraIntrinsics::new(1000.0, 1000.0, 640.0, 480.0),
            DistortionCoeffs::none(),
        )
    }

    fn config() -> SyntheticConfig {
        SyntheticConfig {
            frames: 3,
            start: Vector3::new(0.0, 0.0, 1.0),
            velocity_per_frame: Vector3::zeros(),
            ..Default::default()
        }
    }

    fn byte_at(view: &FrameView<'_>, x: u32, y: u32) -> u8 {
        view.data[((y * view.width + x) * 3) as usize]
    }

    #[test]
    fn marker_renders_dark_at_projected_center() {
        let mut source = SyntheticSource::new(camera(), MarkerGeometry::new(0.1552), config());
        let view = source.try_next_frame(Duration::ZERO).unwrap().unwrap();
        assert_eq!((view.width, view.height), (1280, 960));
        assert_eq!(view.timestamp_ns, 0);
        // Marker is centered on the optical axis.
        assert_eq!(byte_at(&view, 640, 480), 25);
        assert_eq!(byte_at(&view, 10, 10), 210);
    }

    #[test]
    fn stream_ends_after_configured_frames() {
        let mut source = SyntheticSource::new(camera(), MarkerGeometry::new(0.1552), config());
        for i in 0..3 {
            let view = source.try_next_frame(Duration::from_secs(1)).unwrap().unwrap();
            assert_eq!(view.timestamp_ns, i * 33_333_333);
        }
        assert!(matches!(
            source.try_next_frame(Duration::ZERO),
            Err(SourceError::EndOfStream)
        ));
    }

    #[test]
    fn delivery_is_paced_on_the_frame_period() {
        let cfg = SyntheticConfig {
            width: 320,
            height: 240,
            frame_period_ns: 40_000_000,
            ..config()
        };
        let camera = CameraModel::new(
            CameraIntrinsics::new(320.0, 320.0, 160.0, 120.0),
            DistortionCoeffs::none(),
        );
        let mut source = SyntheticSource::new(camera, MarkerGeometry::new(0.1552), cfg);
        let start = Instant::now();
        assert!(source.try_next_frame(Duration::ZERO).unwrap().is_some());

        // The second frame is not due yet: a bounded wait shorter than the
        // period comes back empty instead of delivering early.
        assert!(source
            .try_next_frame(Duration::from_millis(1))
            .unwrap()
            .is_none());
        assert!(start.elapsed() < Duration::from_millis(35));

        // A wait that covers the period delivers, one period after frame 0.
        assert!(source
            .try_next_frame(Duration::from_secs(1))
            .unwrap()
            .is_some());
        assert!(start.elapsed() >= Duration::from_millis(40));
    }

    #[test]
    fn noise_stays_within_amplitude() {
        let cfg = SyntheticConfig {
            noise_amplitude: 10,
            ..config()
        };
        let mut source = SyntheticSource::new(camera(), MarkerGeometry::new(0.1552), cfg);
        let view = source.try_next_frame(Duration::ZERO).unwrap().unwrap();
        let bg = byte_at(&view, 5, 5);
        assert!((200..=220).contains(&bg), "background byte was {bg}");
        let fg = byte_at(&view, 640, 480);
        assert!((15..=35).contains(&fg), "foreground byte was {fg}");
    }

    #[test]
    fn identical_seeds_render_identical_frames() {
        let cfg = SyntheticConfig {
            noise_amplitude: 8,
            ..config()
        };
        let mut a = SyntheticSource::new(camera(), MarkerGeometry::new(0.1552), cfg.clone());
        let mut b = SyntheticSource::new(camera(), MarkerGeometry::new(0.1552), cfg);
        let frame_a = a.try_next_frame(Duration::ZERO).unwrap().unwrap().data.to_vec();
        let frame_b = b.try_next_frame(Duration::ZERO).unwrap().unwrap().data.to_vec();
        assert_eq!(frame_a, frame_b);
    }

    #[test]
    fn marker_behind_camera_renders_background_only() {
        let cfg = SyntheticConfig {
            start: Vector3::new(0.0, 0.0, -1.0),
            ..config()
        };
        let mut source = SyntheticSource::new(camera(), MarkerGeometry::new(0.1552), cfg);
        let view = source.try_next_frame(Duration::ZERO).unwrap().unwrap();
        assert_eq!(byte_at(&view, 640, 480), 210);
    }
}
