use anyhow::{Context, Result};
use tracing_subscriber::EnvFilter;

use tagtrack::camera::{CameraIntrinsics, CameraModel, DistortionCoeffs};
use tagtrack::config::PipelineConfig;
use tagtrack::detect::QuadDetector;
use tagtrack::geometry::PlanarSquareSolver;
use tagtrack::source::{SyntheticConfig, SyntheticSource};
use tagtrack::system::TrackerPipeline;

fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    // Optional JSON pipeline config as the first argument.
    let config = match std::env::args().nth(1) {
        Some(path) => {
            let text = std::fs::read_to_string(&path)
                .with_context(|| format!("reading config file {path}"))?;
            serde_json::from_str::<PipelineConfig>(&text)
                .with_context(|| format!("parsing config file {path}"))?
        }
        None => PipelineConfig::default(),
    };

    // Demo rig: a fixed camera watching the marker drift across the image.
    // Real deployments construct the pipeline with their own source, detector
    // bindings and calibration instead.
    let camera = CameraModel::new(
        CameraIntrinsics::new(1000.0, 1000.0, 640.0, 480.0),
        DistortionCoeffs::none(),
    );
    let scene = SyntheticConfig {
        frames: 300,
        noise_amplitude: 6,
        ..Default::default()
    };
    let source = SyntheticSource::new(camera, config.marker, scene);

    #[cfg(feature = "viz-rerun")]
    let sink = tagtrack::viz::RerunSink::spawn("tagtrack")?;
    #[cfg(not(feature = "viz-rerun"))]
    let sink = tagtrack::viz::ConsoleSink::new();

    let pipeline = TrackerPipeline::launch(
        config,
        camera,
        source,
        Box::new(QuadDetector::new(128, 1)),
        Box::new(QuadDetector::new(128, 2)),
        Box::new(PlanarSquareSolver),
        sink,
    )?;
    pipeline.wait();

    Ok(())
}
