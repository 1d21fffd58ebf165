//! Frame acquisition seam.

pub mod replay;
pub mod synthetic;

use std::time::Duration;

use thiserror::Error;

pub use replay::ReplaySource;
pub use synthetic::{SyntheticConfig, SyntheticSource};

#[derive(Debug, Error)]
pub enum SourceError {
    /// The source has delivered its last frame. Terminal.
    #[error("end of stream")]
    EndOfStream,
    #[error("device error: {0}")]
    Device(String),
    #[error("malformed index entry at line {line}: {reason}")]
    MalformedIndex { line: usize, reason: String },
    #[error(transparent)]
    Io(#[from] std::io::Error),
    #[error(transparent)]
    Image(#[from] image::ImageError),
    #[error(transparent)]
    Csv(#[from] csv::Error),
}

/// Borrowed view of one captured frame. The pixel data is tightly packed
/// RGB8 and only valid until the source is asked for the next frame, which
/// is what forces the capture stage to deep-copy before publishing.
#[derive(Debug)]
pub struct FrameView<'a> {
    pub data: &'a [u8],
    pub width: u32,
    pub height: u32,
    pub timestamp_ns: u64,
}

/// A camera, a recording, or a synthetic scene.
pub trait FrameSource {
    /// Wait up to `timeout` for the next frame. `Ok(None)` means nothing
    /// arrived in time and the caller should re-check for shutdown before
    /// waiting again. Sources that always have a frame ready may ignore the
    /// timeout.
    fn try_next_frame(&mut self, timeout: Duration) -> Result<Option<FrameView<'_>>, SourceError>;
}
