//! Shared state between the pipeline stages.
//!
//! One instance per pipeline, always behind `Arc`. The three handoff slots
//! are the only mutable state stages share; everything else (detectors,
//! solver, camera) is owned per stage.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use crate::frame::Frame;

use super::messages::{PoseEstimate, RegionCandidate};
use super::slot::HandoffSlot;

pub struct SharedState {
    /// Latest captured frame: capture -> coarse localizer.
    pub frame_slot: HandoffSlot<Arc<Frame>>,
    /// Latest search region: coarse localizer -> fine estimator.
    pub region_slot: HandoffSlot<RegionCandidate>,
    /// Latest pose: fine estimator -> consumer.
    pub pose_slot: HandoffSlot<PoseEstimate>,

    /// Set once, never cleared. Every stage polls it after each blocking
    /// wait.
    shutdown_requested: Arc<AtomicBool>,
}

impl SharedState {
    pub fn new() -> Arc<Self> {
        let shutdown = Arc::new(AtomicBool::new(false));
        Arc::new(Self {
            frame_slot: HandoffSlot::new(shutdown.clone()),
            region_slot: HandoffSlot::new(shutdown.clone()),
            pose_slot: HandoffSlot::new(shutdown.clone()),
            shutdown_requested: shutdown,
        })
    }

    /// Request shutdown of every stage. Terminal for the whole pipeline.
    /// Wakes all slot waiters so the flag is observed promptly.
    pub fn request_shutdown(&self) {
        self.shutdown_requested.store(true, Ordering::SeqCst);
        self.frame_slot.wake_all();
        self.region_slot.wake_all();
        self.pose_slot.wake_all();
    }

    pub fn is_shutdown_requested(&self) -> bool {
        self.shutdown_requested.load(Ordering::SeqCst)
    }
}
