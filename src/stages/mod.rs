//! The four stage loops of the detection cascade.
//!
//! Each stage is a struct owning its collaborators plus a `run` method that
//! loops until shutdown. Stages communicate only through the handoff slots in
//! [`SharedState`](crate::system::SharedState); none reads another's state.

pub mod capture;
pub mod estimate;
pub mod localize;
pub mod present;

pub use capture::CaptureStage;
pub use estimate::FinePoseEstimator;
pub use localize::CoarseLocalizer;
pub use present::ResultConsumer;
