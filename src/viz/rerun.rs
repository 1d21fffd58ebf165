//! Rerun-based presentation sink.
//!
//! Entity hierarchy:
//!     status           - pose label (translation + yaw)
//!     camera/image     - full-resolution frame feed
//!     camera/image/roi - refinement region used for the solve
//!     plots/yaw_deg    - heading over time
//!     plots/range_m    - distance to the marker over time

use rerun::RecordingStream;

use crate::system::PoseEstimate;

use super::{pose_label, PresentError, PresentationSink};

pub struct RerunSink {
    rec: RecordingStream,
    start_timestamp_ns: Option<u64>,
}

impl RerunSink {
    /// Runs the rerun viewer in a separate process and streams to it.
    pub fn spawn(app_id: &str) -> Result<Self, PresentError> {
        let rec = rerun::RecordingStreamBuilder::new(app_id)
            .spawn()
            .map_err(|e| PresentError::Backend(e.to_string()))?;
        Ok(Self {
            rec,
            start_timestamp_ns: None,
        })
    }

    /// Timeline position for all subsequent logs, relative to the first
    /// presented frame.
    fn set_time(&mut self, timestamp_ns: u64) {
        let start_ns = *self.start_timestamp_ns.get_or_insert(timestamp_ns);
        let relative_sec = timestamp_ns.saturating_sub(start_ns) as f64 / 1e9;
        self.rec.set_duration_secs("time", relative_sec);
    }
}

impl PresentationSink for RerunSink {
    fn present(&mut self, pose: &PoseEstimate) -> Result<(), PresentError> {
        self.set_time(pose.frame.timestamp_ns);

        let frame = &pose.frame;
        self.rec
            .log(
                "camera/image",
                &rerun::Image::from_rgb24(
                    frame.pixels().as_raw().clone(),
                    [frame.width(), frame.height()],
                ),
            )
            .ok();

        self.rec
            .log(
                "camera/image/roi",
                &rerun::Boxes2D::from_mins_and_sizes(
                    [[pose.roi.x as f32, pose.roi.y as f32]],
                    [[pose.roi.width as f32, pose.roi.height as f32]],
                )
                .with_colors([[0u8, 255, 0]]),
            )
            .ok();

        self.rec
            .log(
                "status",
                &rerun::TextDocument::new(pose_label(pose))
                    .with_media_type(rerun::MediaType::markdown()),
            )
            .ok();

        self.rec
            .log("plots/yaw_deg", &rerun::Scalars::new([pose.yaw_deg]))
            .ok();
        self.rec
            .log(
                "plots/range_m",
                &rerun::Scalars::new([pose.translation.norm()]),
            )
            .ok();

        Ok(())
    }

    /// The viewer offers no terminate key back to us; runs end when the
    /// source does, or on ctrl-c.
    fn poll_quit(&mut self) -> bool {
        false
    }
}
