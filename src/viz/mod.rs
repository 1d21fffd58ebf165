//! Presentation seam and the sinks shipped with the pipeline.
//!
//! Rendering is a collaborator, not core logic: the consumer stage hands each
//! refined pose to a [`PresentationSink`] and otherwise stays out of the
//! display's way. The sinks here cover headless runs ([`ConsoleSink`]),
//! embedding into a host application ([`ChannelSink`]) and live inspection
//! (`RerunSink`, behind the `viz-rerun` feature).

pub mod channel;
pub mod console;
#[cfg(feature = "viz-rerun")]
pub mod rerun;

use thiserror::Error;

use crate::system::PoseEstimate;

pub use channel::ChannelSink;
pub use console::ConsoleSink;
#[cfg(feature = "viz-rerun")]
pub use self::rerun::RerunSink;

#[derive(Debug, Error)]
pub enum PresentError {
    /// The receiving side of the sink is gone for good.
    #[error("presentation backend disconnected")]
    Disconnected,
    #[error("presentation backend failed: {0}")]
    Backend(String),
}

/// Where refined poses end up.
pub trait PresentationSink {
    /// Render one pose: the region rectangle and a translation/yaw label over
    /// the originating frame, however the backend displays such things.
    fn present(&mut self, pose: &PoseEstimate) -> Result<(), PresentError>;

    /// Non-blocking terminate poll, checked once per consumer cycle. The
    /// first `true` shuts the whole pipeline down.
    fn poll_quit(&mut self) -> bool;
}

/// One-line overlay label: translation in meters, yaw in degrees.
pub fn pose_label(pose: &PoseEstimate) -> String {
    format!(
        "x {:+.3} m | y {:+.3} m | z {:+.3} m | yaw {:+.1} deg",
        pose.translation.x, pose.translation.y, pose.translation.z, pose.yaw_deg
    )
}
