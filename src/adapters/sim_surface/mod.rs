// Simulated surface adapter - In-process clock-driven player

use std::sync::{Arc, Mutex, MutexGuard};

use async_trait::async_trait;
use tokio::time::Instant;

use crate::domain::errors::*;
use crate::ports::*;

/// Command received by the simulated player
#[derive(Debug, Clone, PartialEq)]
pub enum SurfaceEvent {
    Seek(f64),
    Play,
    Pause,
    Unmute,
    Volume(u8),
}

#[derive(Debug)]
struct SimState {
    ready: bool,
    duration: f64,
    rate: f64,
    anchor_position: f64,
    playing_since: Option<Instant>,
    muted: bool,
    volume: u8,
    events: Vec<SurfaceEvent>,
    samples: Vec<f64>,
}

impl SimState {
    fn position(&self) -> f64 {
        let advanced = match self.playing_since {
            Some(since) => since.elapsed().as_secs_f64() * self.rate,
            None => 0.0,
        };
        (self.anchor_position + advanced).min(self.duration)
    }
}

/// Player whose playhead advances with the tokio clock while playing.
///
/// Used for dry runs and tests; honours `tokio::time::pause`.
#[derive(Debug, Clone)]
pub struct SimulatedSurface {
    state: Arc<Mutex<SimState>>,
}

impl SimulatedSurface {
    /// Create a ready, unmuted player for a video of `duration` seconds
    pub fn new(duration: f64) -> Self {
        Self {
            state: Arc::new(Mutex::new(SimState {
                ready: true,
                duration,
                rate: 1.0,
                anchor_position: 0.0,
                playing_since: None,
                muted: false,
                volume: 100,
                events: Vec::new(),
                samples: Vec::new(),
            })),
        }
    }

    pub fn muted(self, volume: u8) -> Self {
        {
            let mut state = self.state();
            state.muted = true;
            state.volume = volume;
        }
        self
    }

    pub fn set_ready(&self, ready: bool) {
        self.state().ready = ready;
    }

    /// Freeze the playhead as if buffering never finished
    pub fn stall(&self) {
        let mut state = self.state();
        state.anchor_position = state.position();
        state.rate = 0.0;
        if state.playing_since.is_some() {
            state.playing_since = Some(Instant::now());
        }
    }

    /// Commands received so far, in order
    pub fn events(&self) -> Vec<SurfaceEvent> {
        self.state().events.clone()
    }

    /// Playhead positions reported so far, in order
    pub fn samples(&self) -> Vec<f64> {
        self.state().samples.clone()
    }

    pub fn is_playing(&self) -> bool {
        self.state().playing_since.is_some()
    }

    pub fn audio(&self) -> (bool, u8) {
        let state = self.state();
        (state.muted, state.volume)
    }

    fn state(&self) -> MutexGuard<'_, SimState> {
        self.state.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    fn ready_state(&self) -> Result<MutexGuard<'_, SimState>, DomainError> {
        let state = self.state();
        if !state.ready {
            return Err(DomainError::SurfaceNotReady);
        }
        Ok(state)
    }
}

#[async_trait]
impl PlaybackSurface for SimulatedSurface {
    async fn is_ready(&self) -> bool {
        self.state().ready
    }

    async fn seek_to(&self, seconds: f64) -> Result<(), DomainError> {
        let mut state = self.ready_state()?;
        state.anchor_position = seconds.clamp(0.0, state.duration);
        if state.playing_since.is_some() {
            state.playing_since = Some(Instant::now());
        }
        state.events.push(SurfaceEvent::Seek(seconds));
        Ok(())
    }

    async fn play(&self) -> Result<(), DomainError> {
        let mut state = self.ready_state()?;
        if state.playing_since.is_none() {
            state.playing_since = Some(Instant::now());
        }
        state.events.push(SurfaceEvent::Play);
        Ok(())
    }

    async fn pause(&self) -> Result<(), DomainError> {
        let mut state = self.ready_state()?;
        state.anchor_position = state.position();
        state.playing_since = None;
        state.events.push(SurfaceEvent::Pause);
        Ok(())
    }

    async fn current_time(&self) -> Result<f64, DomainError> {
        let mut state = self.ready_state()?;
        let position = state.position();
        state.samples.push(position);
        Ok(position)
    }

    async fn is_muted(&self) -> Result<bool, DomainError> {
        Ok(self.ready_state()?.muted)
    }

    async fn unmute(&self) -> Result<(), DomainError> {
        let mut state = self.ready_state()?;
        state.muted = false;
        state.events.push(SurfaceEvent::Unmute);
        Ok(())
    }

    async fn set_volume(&self, volume: u8) -> Result<(), DomainError> {
        let volume = volume.min(100);
        let mut state = self.ready_state()?;
        state.volume = volume;
        state.events.push(SurfaceEvent::Volume(volume));
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;

    #[tokio::test(start_paused = true)]
    async fn test_playhead_follows_clock() {
        let surface = SimulatedSurface::new(30.0);
        surface.seek_to(10.0).await.unwrap();
        assert_eq!(surface.current_time().await.unwrap(), 10.0);

        surface.play().await.unwrap();
        tokio::time::sleep(Duration::from_secs(2)).await;
        assert_eq!(surface.current_time().await.unwrap(), 12.0);

        surface.pause().await.unwrap();
        tokio::time::sleep(Duration::from_secs(5)).await;
        assert_eq!(surface.current_time().await.unwrap(), 12.0);
    }

    #[tokio::test(start_paused = true)]
    async fn test_playhead_stops_at_duration() {
        let surface = SimulatedSurface::new(3.0);
        surface.play().await.unwrap();
        tokio::time::sleep(Duration::from_secs(10)).await;
        assert_eq!(surface.current_time().await.unwrap(), 3.0);
    }

    #[tokio::test]
    async fn test_not_ready_rejects_commands() {
        let surface = SimulatedSurface::new(3.0);
        surface.set_ready(false);
        assert!(!surface.is_ready().await);
        assert_eq!(surface.play().await, Err(DomainError::SurfaceNotReady));
    }

    #[tokio::test]
    async fn test_audio_controls() {
        let surface = SimulatedSurface::new(3.0).muted(20);
        assert!(surface.is_muted().await.unwrap());
        surface.unmute().await.unwrap();
        surface.set_volume(150).await.unwrap();
        assert_eq!(surface.audio(), (false, 100));
    }
}
