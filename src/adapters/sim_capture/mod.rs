// Simulated capture adapter - Timer-driven chunk producer

use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use tokio::sync::mpsc;
use tokio::time::{interval_at, Instant, MissedTickBehavior};
use tracing::debug;

use crate::domain::errors::*;
use crate::ports::*;

const CHANNEL_CAPACITY: usize = 64;

/// How the simulated platform answers an acquisition request
#[derive(Debug, Clone, PartialEq)]
pub enum CaptureBehavior {
    /// Grant a stream emitting one `chunk_bytes` chunk per `chunk_interval`
    Grant {
        chunk_interval: Duration,
        chunk_bytes: usize,
    },
    /// Grant a stream that never produces data
    Silent,
    /// The user declines the prompt
    Deny,
    /// The platform cannot capture at all
    Unavailable,
}

struct SimTrack {
    stopped: Arc<AtomicBool>,
    stops: Arc<AtomicUsize>,
}

impl CaptureTrack for SimTrack {
    fn kind(&self) -> TrackKind {
        TrackKind::Muxed
    }

    fn stop(&self) {
        self.stopped.store(true, Ordering::SeqCst);
        self.stops.fetch_add(1, Ordering::SeqCst);
    }
}

/// Capture primitive that fabricates a stream on the tokio clock.
///
/// Chunk `n` is filled with the byte `n % 256` so arrival order stays visible
/// in the concatenated artifact.
pub struct SimulatedCapture {
    behavior: CaptureBehavior,
    stops: Arc<AtomicUsize>,
    acquisitions: AtomicUsize,
}

impl SimulatedCapture {
    pub fn new(behavior: CaptureBehavior) -> Self {
        Self {
            behavior,
            stops: Arc::new(AtomicUsize::new(0)),
            acquisitions: AtomicUsize::new(0),
        }
    }

    /// One chunk per second
    pub fn granting(chunk_bytes: usize) -> Self {
        Self::new(CaptureBehavior::Grant {
            chunk_interval: Duration::from_secs(1),
            chunk_bytes,
        })
    }

    /// Track stop calls across all acquisitions
    pub fn stop_count(&self) -> usize {
        self.stops.load(Ordering::SeqCst)
    }

    pub fn acquisition_count(&self) -> usize {
        self.acquisitions.load(Ordering::SeqCst)
    }

    fn stream(&self, chunk_interval: Option<(Duration, usize)>) -> CaptureStream {
        let (tx, rx) = mpsc::channel(CHANNEL_CAPACITY);
        let stopped = Arc::new(AtomicBool::new(false));
        let track = SimTrack {
            stopped: Arc::clone(&stopped),
            stops: Arc::clone(&self.stops),
        };

        let producer_stopped = stopped;
        tokio::spawn(async move {
            let Some((period, bytes)) = chunk_interval else {
                // Hold the stream open without data until stopped.
                while !producer_stopped.load(Ordering::SeqCst) && !tx.is_closed() {
                    tokio::time::sleep(Duration::from_millis(50)).await;
                }
                return;
            };

            let mut ticker = interval_at(Instant::now() + period, period);
            ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
            let mut index: usize = 0;
            loop {
                ticker.tick().await;
                if producer_stopped.load(Ordering::SeqCst) {
                    break;
                }
                let chunk = vec![(index % 256) as u8; bytes];
                if tx.send(chunk).await.is_err() {
                    break;
                }
                index += 1;
            }
            debug!(chunks = index, "simulated capture producer finished");
        });

        CaptureStream {
            chunks: rx,
            tracks: vec![Box::new(track)],
        }
    }
}

#[async_trait]
impl CapturePort for SimulatedCapture {
    async fn acquire(&self, request: CaptureRequest) -> Result<CaptureStream, DomainError> {
        self.acquisitions.fetch_add(1, Ordering::SeqCst);
        debug!(?request, behavior = ?self.behavior, "simulated capture requested");

        match &self.behavior {
            CaptureBehavior::Grant {
                chunk_interval,
                chunk_bytes,
            } => Ok(self.stream(Some((*chunk_interval, *chunk_bytes)))),
            CaptureBehavior::Silent => Ok(self.stream(None)),
            CaptureBehavior::Deny => Err(DomainError::PermissionDenied(
                "capture request was declined".to_string(),
            )),
            CaptureBehavior::Unavailable => Err(DomainError::CaptureUnavailable(
                "no capture device".to_string(),
            )),
        }
    }
}
