//! Sequences every clip through one capture session

use std::sync::Arc;

use tracing::{debug, info, warn};

use crate::domain::errors::DomainError;
use crate::domain::model::{Artifact, ClipProgress, ClipSnapshot, RunStatus};
use crate::engine::cancellation::CancellationWatcher;
use crate::engine::capture_session::{CaptureSessionManager, SessionHandle};
use crate::engine::progress::ProgressCallback;
use crate::engine::segment_player::{play_segment, SegmentTiming};
use crate::ports::{PlaybackSurface, VisibilityPort};

/// Full output volume for the recording
const FULL_VOLUME: u8 = 100;

/// Runs "create video": plays a clip snapshot end to end while capturing it
pub struct Orchestrator {
    capture: Arc<CaptureSessionManager>,
    visibility: Arc<dyn VisibilityPort>,
    progress: Arc<dyn ProgressCallback>,
    timing: SegmentTiming,
}

impl Orchestrator {
    pub fn new(
        capture: Arc<CaptureSessionManager>,
        visibility: Arc<dyn VisibilityPort>,
        progress: Arc<dyn ProgressCallback>,
    ) -> Self {
        Self {
            capture,
            visibility,
            progress,
            timing: SegmentTiming::default(),
        }
    }

    pub fn with_timing(mut self, timing: SegmentTiming) -> Self {
        self.timing = timing;
        self
    }

    pub fn timing(&self) -> &SegmentTiming {
        &self.timing
    }

    /// Record every clip of `snapshot` from `surface` into one artifact.
    ///
    /// Exactly one terminal status is reported to the progress callback, after
    /// the capture tracks are released and the watcher is gone.
    pub async fn create_video(
        &self,
        snapshot: &ClipSnapshot,
        surface: &dyn PlaybackSurface,
    ) -> Result<Artifact, DomainError> {
        let result = self.run(snapshot, surface).await;

        let status = match &result {
            Ok(artifact) => {
                info!(bytes = artifact.size(), clips = snapshot.len(), "recording run done");
                RunStatus::Done {
                    size: artifact.size(),
                }
            }
            Err(e) => {
                warn!(error = %e, "recording run failed");
                RunStatus::Failed(e.clone())
            }
        };
        self.progress.on_status(&status);
        result
    }

    async fn run(
        &self,
        snapshot: &ClipSnapshot,
        surface: &dyn PlaybackSurface,
    ) -> Result<Artifact, DomainError> {
        if snapshot.is_empty() {
            return Err(DomainError::EmptyQueue);
        }
        if !surface.is_ready().await {
            return Err(DomainError::SurfaceNotReady);
        }

        let mut watcher = CancellationWatcher::register(self.visibility.as_ref());
        let session = self.capture.start().await?;
        watcher.arm();
        let handle = session.handle();

        let driven = tokio::select! {
            biased;
            cancelled = watcher.cancelled(&handle) => Err(cancelled),
            driven = self.drive(snapshot, surface, &handle) => driven,
        };
        watcher.deregister();

        if let Err(e) = driven {
            if let Err(pause_error) = surface.pause().await {
                debug!(error = %pause_error, "could not pause surface after failure");
            }
            session.abort().await;
            return Err(e);
        }

        if handle.is_recording() {
            session.stop();
        }
        session.finalize().await?.ok_or(DomainError::NoContentCaptured)
    }

    /// Play each clip strictly one after the other
    async fn drive(
        &self,
        snapshot: &ClipSnapshot,
        surface: &dyn PlaybackSurface,
        handle: &SessionHandle,
    ) -> Result<(), DomainError> {
        prepare_audio(surface).await?;

        let total = snapshot.len();
        for (offset, clip) in snapshot.iter().enumerate() {
            if !handle.is_recording() {
                warn!(status = ?handle.status(), "session stopped recording, ending run early");
                break;
            }

            let progress = ClipProgress {
                index: offset + 1,
                total,
                clip: clip.clone(),
            };
            info!("{}", progress);
            self.progress.on_clip(&progress);

            play_segment(surface, clip.start, clip.end, &self.timing).await?;
        }
        Ok(())
    }
}

/// Capture only includes audio the surface is actually playing
async fn prepare_audio(surface: &dyn PlaybackSurface) -> Result<(), DomainError> {
    if surface.is_muted().await? {
        debug!("unmuting playback surface");
        surface.unmute().await?;
    }
    surface.set_volume(FULL_VOLUME).await
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::adapters::sim_capture::{CaptureBehavior, SimulatedCapture};
    use crate::adapters::sim_surface::{SimulatedSurface, SurfaceEvent};
    use crate::adapters::visibility::ForegroundSignal;
    use crate::domain::model::ClipQueue;
    use crate::engine::progress::{ProgressEvent, ProgressHistory};
    use crate::ports::{CapturePort, CaptureRequest, CaptureStream, CaptureTrack, TrackKind};
    use async_trait::async_trait;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::time::Duration;
    use tokio::sync::mpsc;

    struct Track(Arc<AtomicUsize>);

    impl CaptureTrack for Track {
        fn kind(&self) -> TrackKind {
            TrackKind::Muxed
        }

        fn stop(&self) {
            self.0.fetch_add(1, Ordering::SeqCst);
        }
    }

    /// Delivers a fixed set of chunks, then ends the stream
    struct FixedChunks {
        chunks: Vec<Vec<u8>>,
        stops: Arc<AtomicUsize>,
    }

    #[async_trait]
    impl CapturePort for FixedChunks {
        async fn acquire(&self, _request: CaptureRequest) -> Result<CaptureStream, DomainError> {
            let (tx, rx) = mpsc::channel(self.chunks.len().max(1));
            for chunk in &self.chunks {
                tx.try_send(chunk.clone()).unwrap();
            }
            Ok(CaptureStream {
                chunks: rx,
                tracks: vec![Box::new(Track(Arc::clone(&self.stops)))],
            })
        }
    }

    struct Fixture {
        orchestrator: Orchestrator,
        signal: ForegroundSignal,
        history: Arc<ProgressHistory>,
    }

    fn fixture(port: Arc<dyn CapturePort>) -> Fixture {
        let signal = ForegroundSignal::new();
        let history = Arc::new(ProgressHistory::new());
        let orchestrator = Orchestrator::new(
            Arc::new(CaptureSessionManager::new(port)),
            Arc::new(signal.clone()),
            history.clone(),
        );
        Fixture {
            orchestrator,
            signal,
            history,
        }
    }

    fn snapshot(ranges: &[(f64, f64)]) -> ClipSnapshot {
        let mut queue = ClipQueue::new();
        for (start, end) in ranges {
            queue.insert_range(*start, *end).unwrap();
        }
        queue.snapshot()
    }

    fn seeks(surface: &SimulatedSurface) -> Vec<f64> {
        surface
            .events()
            .into_iter()
            .filter_map(|e| match e {
                SurfaceEvent::Seek(at) => Some(at),
                _ => None,
            })
            .collect()
    }

    #[tokio::test(start_paused = true)]
    async fn test_plays_clips_in_order_without_overlap() {
        let capture = Arc::new(SimulatedCapture::granting(8));
        let f = fixture(capture.clone());
        let surface = SimulatedSurface::new(60.0).muted(30);

        let artifact = f
            .orchestrator
            .create_video(&snapshot(&[(20.0, 25.0), (5.0, 10.0)]), &surface)
            .await
            .unwrap();

        let events = surface.events();
        assert_eq!(
            events,
            vec![
                SurfaceEvent::Unmute,
                SurfaceEvent::Volume(100),
                SurfaceEvent::Seek(5.0),
                SurfaceEvent::Play,
                SurfaceEvent::Pause,
                SurfaceEvent::Seek(20.0),
                SurfaceEvent::Play,
                SurfaceEvent::Pause,
            ]
        );
        assert_eq!(surface.audio(), (false, 100));
        assert!(artifact.size() > 0);
        assert_eq!(artifact.size() % 8, 0);
        assert_eq!(capture.stop_count(), 1);
        assert_eq!(f.signal.observer_count(), 0);

        let events = f.history.events();
        assert_eq!(events.len(), 3);
        match &events[0] {
            ProgressEvent::Clip(p) => assert_eq!(p.to_string(), "Recording clip 1 of 2 (0:05–0:10)"),
            other => panic!("unexpected event {:?}", other),
        }
        assert_eq!(
            f.history.status(),
            Some(RunStatus::Done {
                size: artifact.size()
            })
        );
    }

    #[tokio::test]
    async fn test_artifact_is_concatenation_of_chunks() {
        let stops = Arc::new(AtomicUsize::new(0));
        let f = fixture(Arc::new(FixedChunks {
            chunks: vec![vec![1, 2, 3], vec![4], vec![5, 6, 7, 8, 9]],
            stops: Arc::clone(&stops),
        }));
        let surface = SimulatedSurface::new(60.0);
        let orchestrator = f
            .orchestrator
            .with_timing(SegmentTiming::new(Duration::from_millis(1), Duration::ZERO));

        // Real clock; keep the clip short.
        let artifact = orchestrator
            .create_video(&snapshot(&[(0.0, 0.01)]), &surface)
            .await
            .unwrap();

        assert_eq!(artifact.bytes, vec![1, 2, 3, 4, 5, 6, 7, 8, 9]);
        assert_eq!(artifact.size(), 9);
        assert_eq!(stops.load(Ordering::SeqCst), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn test_no_chunks_means_no_content() {
        let capture = Arc::new(SimulatedCapture::new(CaptureBehavior::Silent));
        let f = fixture(capture.clone());
        let surface = SimulatedSurface::new(60.0);

        let result = f
            .orchestrator
            .create_video(&snapshot(&[(1.0, 2.0)]), &surface)
            .await;

        assert_eq!(result, Err(DomainError::NoContentCaptured));
        assert_eq!(capture.stop_count(), 1);
        assert_eq!(
            f.history.status(),
            Some(RunStatus::Failed(DomainError::NoContentCaptured))
        );
    }

    #[tokio::test(start_paused = true)]
    async fn test_denied_capture_plays_nothing() {
        let capture = Arc::new(SimulatedCapture::new(CaptureBehavior::Deny));
        let f = fixture(capture.clone());
        let surface = SimulatedSurface::new(60.0);

        let result = f
            .orchestrator
            .create_video(&snapshot(&[(5.0, 10.0), (20.0, 25.0)]), &surface)
            .await;

        assert!(matches!(result, Err(DomainError::PermissionDenied(_))));
        assert!(surface.events().is_empty());
        assert_eq!(f.signal.observer_count(), 0);
        assert!(!f
            .history
            .events()
            .iter()
            .any(|e| matches!(e, ProgressEvent::Clip(_))));
    }

    #[tokio::test(start_paused = true)]
    async fn test_leaving_surface_between_clips_cancels_run() {
        let capture = Arc::new(SimulatedCapture::granting(8));
        let f = fixture(capture.clone());
        let surface = SimulatedSurface::new(60.0);

        // Segment 1 pauses at 5s and settles until 5.2s.
        let signal = f.signal.clone();
        tokio::spawn(async move {
            tokio::time::sleep(Duration::from_millis(5100)).await;
            signal.set_foreground(false);
        });

        let result = f
            .orchestrator
            .create_video(&snapshot(&[(5.0, 10.0), (20.0, 25.0)]), &surface)
            .await;

        assert_eq!(result, Err(DomainError::CancelledByUser));
        assert_eq!(seeks(&surface), vec![5.0]);
        assert!(!surface.is_playing());
        assert_eq!(capture.stop_count(), 1);
        assert_eq!(f.signal.observer_count(), 0);
        assert_eq!(
            f.history.status(),
            Some(RunStatus::Failed(DomainError::CancelledByUser))
        );
    }

    #[tokio::test(start_paused = true)]
    async fn test_leaving_surface_mid_segment_stops_playback() {
        let capture = Arc::new(SimulatedCapture::granting(8));
        let f = fixture(capture.clone());
        let surface = SimulatedSurface::new(60.0);

        let signal = f.signal.clone();
        tokio::spawn(async move {
            tokio::time::sleep(Duration::from_secs(2)).await;
            signal.set_foreground(false);
        });

        let result = f
            .orchestrator
            .create_video(&snapshot(&[(5.0, 10.0)]), &surface)
            .await;

        assert_eq!(result, Err(DomainError::CancelledByUser));
        assert_eq!(surface.events().last(), Some(&SurfaceEvent::Pause));
        assert_eq!(capture.stop_count(), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn test_concurrent_run_is_rejected() {
        let capture = Arc::new(SimulatedCapture::granting(8));
        let f = fixture(capture.clone());
        let first_surface = SimulatedSurface::new(60.0);
        let second_surface = SimulatedSurface::new(60.0);
        let clips = snapshot(&[(1.0, 3.0)]);

        let (first, second) = tokio::join!(
            f.orchestrator.create_video(&clips, &first_surface),
            f.orchestrator.create_video(&clips, &second_surface),
        );

        assert!(first.is_ok());
        assert_eq!(second, Err(DomainError::SessionBusy));
        assert!(second_surface.events().is_empty());
        assert_eq!(capture.acquisition_count(), 1);
    }

    #[tokio::test]
    async fn test_preconditions() {
        let capture = Arc::new(SimulatedCapture::granting(8));
        let f = fixture(capture.clone());
        let surface = SimulatedSurface::new(60.0);

        let empty = f.orchestrator.create_video(&snapshot(&[]), &surface).await;
        assert_eq!(empty, Err(DomainError::EmptyQueue));

        surface.set_ready(false);
        let not_ready = f
            .orchestrator
            .create_video(&snapshot(&[(1.0, 2.0)]), &surface)
            .await;
        assert_eq!(not_ready, Err(DomainError::SurfaceNotReady));
        assert_eq!(capture.acquisition_count(), 0);
    }

    #[tokio::test(start_paused = true)]
    async fn test_segment_timeout_aborts_session() {
        let capture = Arc::new(SimulatedCapture::granting(8));
        let f = fixture(capture.clone());
        let surface = SimulatedSurface::new(60.0);
        surface.stall();
        let timing = SegmentTiming::default().with_wait_policy(
            crate::domain::rules::SegmentWaitPolicy::with_slack(Duration::from_secs(1)),
        );
        let orchestrator = f.orchestrator.with_timing(timing);

        let result = orchestrator
            .create_video(&snapshot(&[(5.0, 10.0)]), &surface)
            .await;

        assert_eq!(
            result,
            Err(DomainError::SegmentTimeout {
                start: 5.0,
                end: 10.0
            })
        );
        assert_eq!(capture.stop_count(), 1);
        assert_eq!(f.signal.observer_count(), 0);
    }
}
