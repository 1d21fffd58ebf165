//! Channel sink: hands poses to an embedding application.

use crossbeam_channel::{Receiver, Sender};
use tracing::debug;

use crate::system::PoseEstimate;

use super::{PresentError, PresentationSink};

/// Forwards each pose over a crossbeam channel. Once the receiving side
/// hangs up, the sink reports a quit so the pipeline shuts down instead of
/// publishing into the void.
pub struct ChannelSink {
    sender: Sender<PoseEstimate>,
    disconnected: bool,
}

impl ChannelSink {
    pub fn new(sender: Sender<PoseEstimate>) -> Self {
        Self {
            sender,
            disconnected: false,
        }
    }

    /// Sink plus matching receiver, for callers without their own channel.
    pub fn unbounded() -> (Self, Receiver<PoseEstimate>) {
        let (sender, receiver) = crossbeam_channel::unbounded();
        (Self::new(sender), receiver)
    }
}

impl PresentationSink for ChannelSink {
    fn present(&mut self, pose: &PoseEstimate) -> Result<(), PresentError> {
        if self.sender.send(pose.clone()).is_err() {
            debug!("pose receiver hung up");
            self.disconnected = true;
            return Err(PresentError::Disconnected);
        }
        Ok(())
    }

    fn poll_quit(&mut self) -> bool {
        self.disconnected
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

    fn pose(timestamp_ns: u64) -> PoseEstimate {
        PoseEstimate {
            frame: Arc::new(Frame::new(RgbImage::new(4, 4), timestamp_ns)),
            translation: Vector3::new(0.1, 0.2, 0.9),
            yaw_deg: 5.0,
            roi: PixelRect::new(1, 1, 2, 2),
            valid: true,
        }
    }

    #[test]
    fn forwards_poses_in_order() {
        let (mut sink, receiver) = ChannelSink::unbounded();
        sink.present(&pose(1)).unwrap();
        sink.present(&pose(2)).unwrap();

        assert_eq!(receiver.recv().unwrap().frame.timestamp_ns, 1);
        assert_eq!(receiver.recv().unwrap().frame.timestamp_ns, 2);
        assert!(!sink.poll_quit());
    }

    #[test]
    fn hangup_turns_into_a_quit() {
        let (mut sink, receiver) = ChannelSink::unbounded();
        drop(receiver);

        let err = sink.present(&pose(1)).unwrap_err();
        assert!(matches!(err, PresentError::Disconnected));
        assert!(sink.poll_quit());
    }
}
