//! Consumer stage: hands refined poses to the presentation sink and owns the
//! terminate input.

use std::sync::Arc;
use std::time::Duration;

use tracing::{debug, info, warn};

use crate::system::SharedState;
use crate::viz::PresentationSink;

/// Bound on one consumer cycle, so the terminate poll runs even when no pose
/// arrives.
const POSE_POLL: Duration = Duration::from_millis(50);

pub struct ResultConsumer<K> {
    sink: K,
    shared: Arc<SharedState>,
}

impl<K: PresentationSink> ResultConsumer<K> {
    pub fn new(sink: K, shared: Arc<SharedState>) -> Self {
        Self { sink, shared }
    }

    /// Stage loop. Exits when shutdown is requested, by this stage (terminate
    /// input) or any other.
    pub fn run(mut self) {
        info!("result consumer started");
        while !self.shared.is_shutdown_requested() {
            if let Some(pose) = self.shared.pose_slot.take_timeout(POSE_POLL) {
                if pose.valid {
                    // A failing sink does not kill the stage; the quit poll
                    // below decides whether the pipeline should stop.
                    if let Err(e) = self.sink.present(&pose) {
                        warn!("presentation failed: {e}");
                    }
                } else {
                    debug!("discarding invalid pose");
                }
            }
            if self.sink.poll_quit() {
                info!("terminate input received");
                self.shared.request_shutdown();
            }
        }
        info!("result consumer exited");
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::frame::Frame;
    use crate::geometry::PixelRect;
    use crate::system::PoseEstimate;
    use crate::viz::PresentError;
    use image::RgbImage;
    use nalgebra::Vector3;
    use std::sync::atomic::{AtomicUsize, Ordering};

    /// Counts presents and quits after a fixed number of quit polls.
    struct ScriptedSink {
        presented: Arc<AtomicUsize>,
        polls: usize,
        quit_on_poll: usize,
        fail_presents: bool,
    }

    impl ScriptedSink {
        fn new(quit_on_poll: usize, fail_presents: bool) -> (Self, Arc<AtomicUsize>) {
            let presented = Arc::new(AtomicUsize::new(0));
            let sink = Self {
                presented: presented.clone(),
                polls: 0,
                quit_on_poll,
                fail_presents,
            };
            (sink, presented)
        }
    }

    impl PresentationSink for ScriptedSink {
        fn present(&mut self, _pose: &PoseEstimate) -> Result<(), PresentError> {
            self.presented.fetch_add(1, Ordering::SeqCst);
            if self.fail_presents {
                return Err(PresentError::Backend("scripted failure".into()));
            }
            Ok(())
        }

        fn poll_quit(&mut self) -> bool {
            self.polls += 1;
            self.polls >= self.quit_on_poll
        }
    }

    fn pose(valid: bool) -> PoseEstimate {
        PoseEstimate {
            frame: Arc::new(Frame::new(RgbImage::new(4, 4), 11)),
            translation: Vector3::new(0.0, 0.0, 1.0),
            yaw_deg: 0.0,
            roi: PixelRect::new(0, 0, 4, 4),
            valid,
        }
    }

    #[test]
    fn presents_valid_poses_and_quits_on_terminate() {
        let shared = SharedState::new();
        shared.pose_slot.publish(pose(true));
        let (sink, presented) = ScriptedSink::new(1, false);

        ResultConsumer::new(sink, shared.clone()).run();

        assert_eq!(presented.load(Ordering::SeqCst), 1);
        assert!(shared.is_shutdown_requested());
    }

    #[test]
    fn invalid_poses_are_discarded() {
        let shared = SharedState::new();
        shared.pose_slot.publish(pose(false));
        let (sink, presented) = ScriptedSink::new(1, false);

        ResultConsumer::new(sink, shared.clone()).run();

        assert_eq!(presented.load(Ordering::SeqCst), 0);
        assert!(shared.pose_slot.is_empty());
    }

    #[test]
    fn present_errors_do_not_kill_the_stage() {
        let shared = SharedState::new();
        shared.pose_slot.publish(pose(true));
        let (sink, presented) = ScriptedSink::new(1, true);

        // Returns via the quit poll, not by dying on the failed present.
        ResultConsumer::new(sink, shared.clone()).run();

        assert_eq!(presented.load(Ordering::SeqCst), 1);
        assert!(shared.is_shutdown_requested());
    }

    #[test]
    fn exits_promptly_when_shutdown_is_already_requested() {
        let shared = SharedState::new();
        shared.request_shutdown();
        let (sink, presented) = ScriptedSink::new(usize::MAX, false);

        ResultConsumer::new(sink, shared).run();

        assert_eq!(presented.load(Ordering::SeqCst), 0);
    }
}
