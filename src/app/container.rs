use std::sync::Arc;
use std::time::Duration;

use crate::adapters::{
    AppConfig, CaptureBehavior, ExecCaptureAdapter, ForegroundSignal, JsonStoreAdapter,
    SimulatedCapture,
};
use crate::app::{queue_interactor::QueueInteractor, record_interactor::RecordInteractor};
use crate::engine::{
    CaptureSessionManager, ConsoleProgressCallback, JsonProgressCallback, Orchestrator,
    ProgressCallback,
};
use crate::output::ArtifactWriter;
use crate::ports::{CapturePort, ClipStorePort, VisibilityPort};

/// Chunk period of the simulated recorder used by dry runs
const DRY_RUN_CHUNK_INTERVAL: Duration = Duration::from_millis(250);

/// How the container wires the recording side
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ContainerOptions {
    /// Use the simulated recorder instead of spawning the capture command
    pub dry_run: bool,
    /// Report progress as JSON lines
    pub json_progress: bool,
}

pub trait AppContainer: Send + Sync {
    fn queue_interactor(&self) -> Arc<QueueInteractor>;
    fn record_interactor(&self) -> Arc<RecordInteractor>;
    fn foreground(&self) -> ForegroundSignal;
}

pub struct DefaultAppContainer {
    config: AppConfig,
    foreground: ForegroundSignal,
    queue_interactor: Arc<QueueInteractor>,
    record_interactor: Arc<RecordInteractor>,
}

impl DefaultAppContainer {
    pub fn new(config: AppConfig, options: ContainerOptions) -> Self {
        let store_port = Arc::new(JsonStoreAdapter::new(&config.store.dir));
        let capture_port: Arc<dyn CapturePort> = if options.dry_run {
            Arc::new(SimulatedCapture::new(CaptureBehavior::Grant {
                chunk_interval: DRY_RUN_CHUNK_INTERVAL,
                chunk_bytes: config.capture.chunk_bytes,
            }))
        } else {
            Arc::new(ExecCaptureAdapter::new(config.capture.clone()))
        };
        let progress: Arc<dyn ProgressCallback> = if options.json_progress {
            Arc::new(JsonProgressCallback)
        } else {
            Arc::new(ConsoleProgressCallback)
        };
        let foreground = ForegroundSignal::new();

        let orchestrator = Arc::new(
            Orchestrator::new(
                Arc::new(
                    CaptureSessionManager::new(capture_port)
                        .with_finalize_timeout(config.capture.stop_timeout() * 2),
                ),
                Arc::new(foreground.clone()) as Arc<dyn VisibilityPort>,
                progress,
            )
            .with_timing(config.recorder.timing()),
        );

        let queue_interactor = Arc::new(QueueInteractor::new(
            Arc::clone(&store_port) as Arc<dyn ClipStorePort>,
            config.store.key.clone(),
        ));
        let record_interactor = Arc::new(RecordInteractor::new(
            Arc::clone(&store_port) as Arc<dyn ClipStorePort>,
            config.store.key.clone(),
            orchestrator,
            ArtifactWriter::new(&config.output.dir, config.output.overwrite),
        ));

        Self {
            config,
            foreground,
            queue_interactor,
            record_interactor,
        }
    }

    pub fn config(&self) -> &AppConfig {
        &self.config
    }
}

impl AppContainer for DefaultAppContainer {
    fn queue_interactor(&self) -> Arc<QueueInteractor> {
        Arc::clone(&self.queue_interactor)
    }

    fn record_interactor(&self) -> Arc<RecordInteractor> {
        Arc::clone(&self.record_interactor)
    }

    fn foreground(&self) -> ForegroundSignal {
        self.foreground.clone()
    }
}
