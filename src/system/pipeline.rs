//! Pipeline lifecycle: spawns the four stage threads and tears them down.
//!
//! The `TrackerPipeline` is the top-level handle users interact with. It owns
//! the shared state and one dedicated OS thread per stage; dropping it (or
//! calling [`TrackerPipeline::wait`] after a terminal condition) requests
//! shutdown and joins every stage. Shutdown is terminal for the whole
//! pipeline; stages are never restarted.

use std::sync::Arc;
use std::thread::{self, JoinHandle};

use thiserror::Error;
use tracing::debug;

use crate::camera::CameraModel;
use crate::config::{ConfigError, PipelineConfig};
use crate::detect::MarkerDetector;
use crate::geometry::PoseSolver;
use crate::source::FrameSource;
use crate::stages::{CaptureStage, CoarseLocalizer, FinePoseEstimator, ResultConsumer};
use crate::viz::PresentationSink;

use super::shared_state::SharedState;

#[derive(Debug, Error)]
pub enum PipelineError {
    #[error(transparent)]
    Config(#[from] ConfigError),
    #[error("camera intrinsics are invalid")]
    InvalidIntrinsics,
    #[error("failed to spawn {stage} stage thread")]
    Spawn {
        stage: &'static str,
        #[source]
        source: std::io::Error,
    },
}

pub struct TrackerPipeline {
    shared: Arc<SharedState>,
    handles: Vec<JoinHandle<()>>,
}

impl TrackerPipeline {
    /// Validate the configuration and start all four stages. Each stage owns
    /// its collaborators; the returned handle owns the stages.
    pub fn launch<S, K>(
        config: PipelineConfig,
        camera: CameraModel,
        source: S,
        coarse_detector: Box<dyn MarkerDetector + Send>,
        fine_detector: Box<dyn MarkerDetector + Send>,
        solver: Box<dyn PoseSolver + Send>,
        sink: K,
    ) -> Result<Self, PipelineError>
    where
        S: FrameSource + Send + 'static,
        K: PresentationSink + Send + 'static,
    {
        config.validate()?;
        if !camera.intrinsics.is_valid() {
            return Err(PipelineError::InvalidIntrinsics);
        }
        let shared = SharedState::new();

        let capture = CaptureStage::new(source, shared.clone(), config.capture_timeout);
        let estimator =
            FinePoseEstimator::new(fine_detector, solver, config.marker, camera, shared.clone());
        let localizer = CoarseLocalizer::new(coarse_detector, config, shared.clone());
        let consumer = ResultConsumer::new(sink, shared.clone());

        let spawned = vec![
            spawn_stage("capture", move || capture.run()),
            spawn_stage("localize", move || localizer.run()),
            spawn_stage("estimate", move || estimator.run()),
            spawn_stage("present", move || consumer.run()),
        ];

        let mut handles = Vec::with_capacity(spawned.len());
        let mut failure = None;
        for result in spawned {
            match result {
                Ok(handle) => handles.push(handle),
                Err(e) => failure = Some(e),
            }
        }
        if let Some(e) = failure {
            // Whatever did start must observe shutdown before we bail out.
            shared.request_shutdown();
            for handle in handles {
                let _ = handle.join();
            }
            return Err(e);
        }

        Ok(Self { shared, handles })
    }

    /// The shutdown flag and slots, for embedders that want to stop the
    /// pipeline or inspect flow from outside.
    pub fn shared(&self) -> &Arc<SharedState> {
        &self.shared
    }

    /// Ask every stage to exit. Safe to call more than once.
    pub fn request_shutdown(&self) {
        self.shared.request_shutdown();
    }

    /// Block until the pipeline terminates on its own: the source ends, the
    /// sink requests termination, or someone calls
    /// [`request_shutdown`](Self::request_shutdown).
    pub fn wait(mut self) {
        self.join_all();
    }

    fn join_all(&mut self) {
        for handle in self.handles.drain(..) {
            let name = handle.thread().name().unwrap_or("stage").to_owned();
            if handle.join().is_err() {
                debug!("{name} stage panicked before join");
            }
        }
    }
}

impl Drop for TrackerPipeline {
    fn drop(&mut self) {
        self.shared.request_shutdown();
        self.join_all();
    }
}

fn spawn_stage<F>(stage: &'static str, f: F) -> Result<JoinHandle<()>, PipelineError>
where
    F: FnOnce() + Send + 'static,
{
    thread::Builder::new()
        .name(stage.to_owned())
        .spawn(f)
        .map_err(|source| PipelineError::Spawn { stage, source })
}
