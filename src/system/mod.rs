//! Pipeline orchestration and the state shared between stage threads.
//!
//! This module contains the top-level `TrackerPipeline` that spawns and
//! coordinates the four stage threads, the handoff slots connecting them, and
//! the payload types that flow through.

pub mod messages;
pub mod pipeline;
pub mod shared_state;
pub mod slot;

pub use messages::{PoseEstimate, RegionCandidate};
pub use pipeline::{PipelineError, TrackerPipeline};
pub use shared_state::SharedState;
pub use slot::HandoffSlot;
