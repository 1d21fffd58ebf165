//! Acquisition stage: pulls frames from the source and publishes owned
//! copies into the frame slot.

use std::sync::Arc;
use std::time::Duration;

use tracing::{debug, error, info, trace};

use crate::frame::Frame;
use crate::source::{FrameSource, SourceError};
use crate::system::SharedState;

pub struct CaptureStage<S> {
    source: S,
    shared: Arc<SharedState>,
    poll_timeout: Duration,
}

impl<S: FrameSource> CaptureStage<S> {
    pub fn new(source: S, shared: Arc<SharedState>, poll_timeout: Duration) -> Self {
        Self {
            source,
            shared,
            poll_timeout,
        }
    }

    /// Stage loop. Exits when shutdown is requested or the source ends; the
    /// source is dropped, and with it the device released, on return.
    pub fn run(mut self) {
        info!("capture stage started");
        while !self.shared.is_shutdown_requested() {
            match self.source.try_next_frame(self.poll_timeout) {
                Ok(Some(view)) => {
                    // The view's buffer is only valid until the next call, so
                    // publish an owned copy.
                    let frame = Arc::new(Frame::from_view(&view));
                    trace!(timestamp_ns = frame.timestamp_ns, "frame captured");
                    if self.shared.frame_slot.publish(frame) {
                        debug!("frame slot overwritten before consumption");
                    }
                }
                // No sample yet. Not an error; re-check shutdown and wait again.
                Ok(None) => {}
                Err(SourceError::EndOfStream) => {
                    info!("source reached end of stream");
                    self.shared.request_shutdown();
                }
                Err(e) => {
                    error!("frame source failed: {e}");
                    self.shared.request_shutdown();
                }
            }
        }
        info!("capture stage exited");
    }
}
