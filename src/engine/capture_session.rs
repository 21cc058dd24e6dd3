//! Capture session lifecycle: acquire, record, finalize, tear down

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;

use tokio::sync::{mpsc, watch, Mutex, OwnedMutexGuard};
use tokio::task::JoinHandle;
use tokio::time::Instant;
use tracing::{debug, error, info, warn};

use crate::domain::errors::DomainError;
use crate::domain::model::{Artifact, SessionStatus};
use crate::ports::{CapturePort, CaptureRequest, CaptureTrack};

/// Tracks of one stream, stopped at most once
pub struct TrackSet {
    tracks: Vec<Box<dyn CaptureTrack>>,
    released: AtomicBool,
}

impl TrackSet {
    pub fn new(tracks: Vec<Box<dyn CaptureTrack>>) -> Self {
        Self {
            tracks,
            released: AtomicBool::new(false),
        }
    }

    pub fn len(&self) -> usize {
        self.tracks.len()
    }

    pub fn is_empty(&self) -> bool {
        self.tracks.is_empty()
    }

    pub fn is_released(&self) -> bool {
        self.released.load(Ordering::SeqCst)
    }

    /// Stop every track; returns false if they were already stopped
    pub fn release(&self) -> bool {
        if self.released.swap(true, Ordering::SeqCst) {
            return false;
        }
        for track in &self.tracks {
            debug!(kind = ?track.kind(), "stopping capture track");
            track.stop();
        }
        true
    }
}

struct SessionShared {
    status: watch::Sender<SessionStatus>,
    tracks: TrackSet,
}

impl SessionShared {
    fn stop(&self) -> bool {
        self.status.send_if_modified(|status| {
            if *status == SessionStatus::Recording {
                *status = SessionStatus::Finalizing;
                true
            } else {
                false
            }
        })
    }

    fn set_status(&self, next: SessionStatus) {
        self.status.send_replace(next);
    }
}

/// Cloneable control handle for a running session
#[derive(Clone)]
pub struct SessionHandle {
    shared: Arc<SessionShared>,
}

impl SessionHandle {
    /// Request finalization; no effect unless recording
    pub fn stop(&self) -> bool {
        let stopped = self.shared.stop();
        if stopped {
            debug!("capture session stop requested");
        }
        stopped
    }

    /// Stop all underlying tracks (idempotent)
    pub fn release_tracks(&self) -> bool {
        self.shared.tracks.release()
    }

    pub fn status(&self) -> SessionStatus {
        *self.shared.status.borrow()
    }

    pub fn is_recording(&self) -> bool {
        self.status() == SessionStatus::Recording
    }

    pub fn tracks_released(&self) -> bool {
        self.shared.tracks.is_released()
    }

    /// Observe status transitions
    pub fn subscribe(&self) -> watch::Receiver<SessionStatus> {
        self.shared.status.subscribe()
    }
}

/// Reference bound on how long finalize waits for the stream to close
pub const DEFAULT_FINALIZE_TIMEOUT: Duration = Duration::from_secs(10);

/// Owns the process-wide single capture slot and the acquisition primitive
pub struct CaptureSessionManager {
    port: Arc<dyn CapturePort>,
    slot: Arc<Mutex<()>>,
    finalize_timeout: Duration,
}

impl CaptureSessionManager {
    pub fn new(port: Arc<dyn CapturePort>) -> Self {
        Self {
            port,
            slot: Arc::new(Mutex::new(())),
            finalize_timeout: DEFAULT_FINALIZE_TIMEOUT,
        }
    }

    /// Bound the wait for a stopped stream to deliver its tail and close
    pub fn with_finalize_timeout(mut self, finalize_timeout: Duration) -> Self {
        self.finalize_timeout = finalize_timeout;
        self
    }

    /// Whether a session currently holds the capture slot
    pub fn is_active(&self) -> bool {
        self.slot.try_lock().is_err()
    }

    /// Acquire a display+audio stream and start recording it
    pub async fn start(&self) -> Result<CaptureSession, DomainError> {
        let slot = Arc::clone(&self.slot)
            .try_lock_owned()
            .map_err(|_| DomainError::SessionBusy)?;

        let stream = self
            .port
            .acquire(CaptureRequest::default())
            .await
            .map_err(|e| match e {
                DomainError::PermissionDenied(_) | DomainError::CaptureUnavailable(_) => e,
                other => DomainError::CaptureUnavailable(other.to_string()),
            })?;

        let tracks = TrackSet::new(stream.tracks);
        if tracks.is_empty() {
            tracks.release();
            return Err(DomainError::CaptureUnavailable(
                "capture stream has no tracks".to_string(),
            ));
        }

        let (status, _) = watch::channel(SessionStatus::Recording);
        let shared = Arc::new(SessionShared { status, tracks });
        let sink = tokio::spawn(run_sink(
            stream.chunks,
            shared.status.subscribe(),
            self.finalize_timeout,
        ));

        info!(tracks = shared.tracks.len(), "capture session recording");
        Ok(CaptureSession {
            shared,
            sink: Some(sink),
            _slot: slot,
        })
    }
}

/// One acquisition-record-finalize cycle
pub struct CaptureSession {
    shared: Arc<SessionShared>,
    sink: Option<JoinHandle<Vec<Vec<u8>>>>,
    _slot: OwnedMutexGuard<()>,
}

impl CaptureSession {
    pub fn handle(&self) -> SessionHandle {
        SessionHandle {
            shared: Arc::clone(&self.shared),
        }
    }

    pub fn status(&self) -> SessionStatus {
        *self.shared.status.borrow()
    }

    /// Request finalization; no effect unless recording
    pub fn stop(&self) -> bool {
        self.shared.stop()
    }

    /// Stop the tracks, collect everything the stream still delivers, and
    /// concatenate the chunks.
    ///
    /// Returns `Ok(None)` when nothing was captured.
    pub async fn finalize(mut self) -> Result<Option<Artifact>, DomainError> {
        self.shared.stop();
        self.shared.tracks.release();
        let joined = self.join_sink().await;

        match joined {
            Ok(chunks) => {
                let artifact = Artifact::from_chunks(chunks);
                self.shared.set_status(SessionStatus::Done);
                match &artifact {
                    Some(a) => info!(bytes = a.size(), chunks = a.chunk_count, "capture finalized"),
                    None => info!("capture finalized without data"),
                }
                Ok(artifact)
            }
            Err(e) => {
                self.shared.set_status(SessionStatus::Failed);
                error!(error = %e, "recording sink failed");
                Err(e)
            }
        }
    }

    /// Stop, discard captured data and release tracks
    pub async fn abort(mut self) {
        self.shared.stop();
        self.shared.tracks.release();
        if let Some(sink) = self.sink.take() {
            sink.abort();
            if let Err(e) = sink.await {
                if !e.is_cancelled() {
                    warn!(error = %e, "recording sink failed during abort");
                }
            }
        }
        self.shared.set_status(SessionStatus::Aborted);
        info!("capture session aborted");
    }

    async fn join_sink(&mut self) -> Result<Vec<Vec<u8>>, DomainError> {
        match self.sink.take() {
            Some(sink) => sink
                .await
                .map_err(|e| DomainError::Internal(format!("recording sink task: {}", e))),
            None => Ok(Vec::new()),
        }
    }
}

impl Drop for CaptureSession {
    fn drop(&mut self) {
        if let Some(sink) = self.sink.take() {
            sink.abort();
        }
        self.shared.tracks.release();
        if !self.status().is_terminal() {
            self.shared.set_status(SessionStatus::Aborted);
        }
    }
}

/// Accumulate non-empty chunks in arrival order until the stream ends.
///
/// Once the session stops recording the producer is winding down, so the
/// sink keeps collecting its tail until the stream closes or `drain_timeout`
/// passes.
async fn run_sink(
    mut chunks: mpsc::Receiver<Vec<u8>>,
    mut status: watch::Receiver<SessionStatus>,
    drain_timeout: Duration,
) -> Vec<Vec<u8>> {
    let mut accumulated = Vec::new();

    loop {
        tokio::select! {
            biased;
            _ = async { status.wait_for(|s| *s != SessionStatus::Recording).await.map(|_| ()) } => break,
            chunk = chunks.recv() => match chunk {
                Some(chunk) => push_chunk(&mut accumulated, chunk),
                None => {
                    debug!("capture stream ended");
                    return accumulated;
                }
            },
        }
    }

    let deadline = Instant::now() + drain_timeout;
    loop {
        match tokio::time::timeout_at(deadline, chunks.recv()).await {
            Ok(Some(chunk)) => push_chunk(&mut accumulated, chunk),
            Ok(None) => {
                debug!(chunks = accumulated.len(), "capture stream closed after stop");
                break;
            }
            Err(_) => {
                warn!(?drain_timeout, "capture stream still open after stop, finalizing without its tail");
                break;
            }
        }
    }

    accumulated
}

fn push_chunk(accumulated: &mut Vec<Vec<u8>>, chunk: Vec<u8>) {
    if !chunk.is_empty() {
        accumulated.push(chunk);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ports::{CaptureStream, TrackKind};
    use async_trait::async_trait;
    use std::sync::atomic::AtomicUsize;
    use std::sync::Mutex as StdMutex;

    /// Counts stops; stopping closes every stream the stub handed out
    struct CountingTrack {
        stops: Arc<AtomicUsize>,
        senders: Arc<StdMutex<Vec<mpsc::Sender<Vec<u8>>>>>,
    }

    impl CaptureTrack for CountingTrack {
        fn kind(&self) -> TrackKind {
            TrackKind::Video
        }

        fn stop(&self) {
            self.stops.fetch_add(1, Ordering::SeqCst);
            self.senders.lock().unwrap().clear();
        }
    }

    #[derive(Default)]
    struct StubCapture {
        stops: Arc<AtomicUsize>,
        senders: Arc<StdMutex<Vec<mpsc::Sender<Vec<u8>>>>>,
        deny: bool,
        no_tracks: bool,
    }

    impl StubCapture {
        fn sender(&self) -> mpsc::Sender<Vec<u8>> {
            self.senders.lock().unwrap().last().cloned().unwrap()
        }

        fn track(&self) -> Box<dyn CaptureTrack> {
            Box::new(CountingTrack {
                stops: Arc::clone(&self.stops),
                senders: Arc::clone(&self.senders),
            })
        }
    }

    #[async_trait]
    impl CapturePort for StubCapture {
        async fn acquire(&self, _request: CaptureRequest) -> Result<CaptureStream, DomainError> {
            if self.deny {
                return Err(DomainError::PermissionDenied("declined".to_string()));
            }
            let (tx, rx) = mpsc::channel(16);
            self.senders.lock().unwrap().push(tx);
            let tracks: Vec<Box<dyn CaptureTrack>> = if self.no_tracks {
                Vec::new()
            } else {
                vec![self.track(), self.track()]
            };
            Ok(CaptureStream { chunks: rx, tracks })
        }
    }

    #[tokio::test]
    async fn test_finalize_concatenates_chunks_in_order() {
        let port = Arc::new(StubCapture::default());
        let manager = CaptureSessionManager::new(port.clone());
        let session = manager.start().await.unwrap();
        let handle = session.handle();
        assert_eq!(session.status(), SessionStatus::Recording);

        let tx = port.sender();
        tx.send(vec![1, 2, 3]).await.unwrap();
        tx.send(Vec::new()).await.unwrap();
        tx.send(vec![4]).await.unwrap();
        tx.send(vec![5, 6]).await.unwrap();
        drop(tx);

        let artifact = session.finalize().await.unwrap().unwrap();
        assert_eq!(artifact.bytes, vec![1, 2, 3, 4, 5, 6]);
        assert_eq!(artifact.chunk_count, 3);
        assert_eq!(handle.status(), SessionStatus::Done);
        assert_eq!(port.stops.load(Ordering::SeqCst), 2);
        assert!(!manager.is_active());
    }

    #[tokio::test]
    async fn test_finalize_without_chunks_is_not_an_error() {
        let port = Arc::new(StubCapture::default());
        let manager = CaptureSessionManager::new(port.clone());
        let session = manager.start().await.unwrap();
        let handle = session.handle();

        assert!(session.stop());
        assert!(!session.stop());
        assert_eq!(session.finalize().await.unwrap(), None);
        assert_eq!(handle.status(), SessionStatus::Done);
        assert_eq!(port.stops.load(Ordering::SeqCst), 2);
    }

    #[tokio::test]
    async fn test_stop_only_from_recording() {
        let port = Arc::new(StubCapture::default());
        let manager = CaptureSessionManager::new(port.clone());
        let session = manager.start().await.unwrap();
        let handle = session.handle();

        assert!(handle.stop());
        assert_eq!(handle.status(), SessionStatus::Finalizing);
        session.abort().await;
        assert_eq!(handle.status(), SessionStatus::Aborted);
        assert!(!handle.stop());
        assert_eq!(handle.status(), SessionStatus::Aborted);
    }

    #[tokio::test]
    async fn test_second_session_is_rejected_while_active() {
        let port = Arc::new(StubCapture::default());
        let manager = CaptureSessionManager::new(port.clone());
        let first = manager.start().await.unwrap();

        assert!(manager.is_active());
        assert!(matches!(manager.start().await, Err(DomainError::SessionBusy)));

        first.abort().await;
        let second = manager.start().await.unwrap();
        drop(second);
        assert!(!manager.is_active());
    }

    #[tokio::test]
    async fn test_denied_acquisition() {
        let port = Arc::new(StubCapture {
            deny: true,
            ..Default::default()
        });
        let manager = CaptureSessionManager::new(port);
        assert!(matches!(
            manager.start().await,
            Err(DomainError::PermissionDenied(_))
        ));
        assert!(!manager.is_active());
    }

    #[tokio::test]
    async fn test_stream_without_tracks_is_unavailable() {
        let port = Arc::new(StubCapture {
            no_tracks: true,
            ..Default::default()
        });
        let manager = CaptureSessionManager::new(port);
        assert!(matches!(
            manager.start().await,
            Err(DomainError::CaptureUnavailable(_))
        ));
    }

    #[tokio::test]
    async fn test_tracks_released_once_across_paths() {
        let port = Arc::new(StubCapture::default());
        let manager = CaptureSessionManager::new(port.clone());
        let session = manager.start().await.unwrap();
        let handle = session.handle();

        assert!(handle.release_tracks());
        assert!(!handle.release_tracks());
        session.abort().await;

        assert_eq!(port.stops.load(Ordering::SeqCst), 2);
        assert!(handle.tracks_released());
    }

    #[tokio::test]
    async fn test_dropped_session_releases_tracks() {
        let port = Arc::new(StubCapture::default());
        let manager = CaptureSessionManager::new(port.clone());
        let session = manager.start().await.unwrap();
        let handle = session.handle();

        drop(session);

        assert_eq!(port.stops.load(Ordering::SeqCst), 2);
        assert_eq!(handle.status(), SessionStatus::Aborted);
        assert!(!manager.is_active());
    }

    #[tokio::test]
    async fn test_finalize_collects_chunks_sent_while_stopping() {
        let port = Arc::new(StubCapture::default());
        let manager = CaptureSessionManager::new(port.clone());
        let session = manager.start().await.unwrap();
        let handle = session.handle();

        // Producer that flushes one last chunk once asked to stop
        let tx = port.sender();
        let mut status = handle.subscribe();
        tokio::spawn(async move {
            tx.send(vec![1]).await.unwrap();
            status
                .wait_for(|s| *s == SessionStatus::Finalizing)
                .await
                .map(|_| ())
                .unwrap();
            tx.send(vec![2, 3]).await.unwrap();
        });
        tokio::task::yield_now().await;

        let artifact = session.finalize().await.unwrap().unwrap();
        assert_eq!(artifact.bytes, vec![1, 2, 3]);
    }

    #[tokio::test(start_paused = true)]
    async fn test_finalize_gives_up_on_a_stream_that_never_closes() {
        let port = Arc::new(StubCapture::default());
        let manager =
            CaptureSessionManager::new(port.clone()).with_finalize_timeout(Duration::from_millis(500));
        let session = manager.start().await.unwrap();

        // Kept alive past the track stop, so the stream stays open
        let tx = port.sender();
        tx.send(vec![7, 7]).await.unwrap();

        let artifact = session.finalize().await.unwrap().unwrap();
        assert_eq!(artifact.bytes, vec![7, 7]);
        assert!(!manager.is_active());
        drop(tx);
    }
}
