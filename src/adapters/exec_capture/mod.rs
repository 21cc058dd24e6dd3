// Exec capture adapter - Screen/audio capture through an external recorder process

use std::io::ErrorKind;
use std::process::Stdio;
use std::time::Duration;

use async_trait::async_trait;
use tokio::io::{AsyncBufReadExt, AsyncReadExt, BufReader};
use tokio::process::{Child, ChildStderr, ChildStdout, Command};
use tokio::sync::{mpsc, watch};
use tokio::time::Instant;
use tracing::{debug, info, warn};

use crate::adapters::toml_config::CaptureConfig;
use crate::domain::errors::*;
use crate::ports::*;

const CHANNEL_CAPACITY: usize = 32;

/// Stops the recorder process; the reader task lets it flush, then reaps it
struct ProcessTrack {
    stop: watch::Sender<bool>,
}

impl CaptureTrack for ProcessTrack {
    fn kind(&self) -> TrackKind {
        TrackKind::Muxed
    }

    fn stop(&self) {
        self.stop.send_replace(true);
    }
}

/// Runs the configured recorder (ffmpeg by default) and streams its stdout
pub struct ExecCaptureAdapter {
    config: CaptureConfig,
}

impl ExecCaptureAdapter {
    pub fn new(config: CaptureConfig) -> Self {
        Self { config }
    }

    pub fn config(&self) -> &CaptureConfig {
        &self.config
    }

    fn command(&self, request: CaptureRequest) -> Command {
        let mut command = Command::new(&self.config.program);
        command
            .args(&self.config.args)
            .env("REELCAP_CAPTURE_VIDEO", flag(request.video))
            .env("REELCAP_CAPTURE_AUDIO", flag(request.audio))
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .kill_on_drop(true);
        command
    }
}

fn flag(enabled: bool) -> &'static str {
    if enabled {
        "1"
    } else {
        "0"
    }
}

/// Map a spawn failure onto the capture error taxonomy
fn spawn_error(program: &str, error: std::io::Error) -> DomainError {
    match error.kind() {
        ErrorKind::PermissionDenied => {
            DomainError::PermissionDenied(format!("not allowed to run {}: {}", program, error))
        }
        ErrorKind::NotFound => {
            DomainError::CaptureUnavailable(format!("recorder '{}' not found", program))
        }
        _ => DomainError::CaptureUnavailable(format!("failed to start {}: {}", program, error)),
    }
}

#[async_trait]
impl CapturePort for ExecCaptureAdapter {
    async fn acquire(&self, request: CaptureRequest) -> Result<CaptureStream, DomainError> {
        let program = self.config.program.clone();
        info!(%program, ?request, "starting recorder");

        let mut child = self
            .command(request)
            .spawn()
            .map_err(|e| spawn_error(&program, e))?;

        let stdout = child.stdout.take().ok_or_else(|| {
            DomainError::CaptureUnavailable("recorder stdout is not available".to_string())
        })?;
        if let Some(stderr) = child.stderr.take() {
            tokio::spawn(forward_stderr(program.clone(), stderr));
        }

        let (chunk_tx, chunk_rx) = mpsc::channel(CHANNEL_CAPACITY);
        let (stop_tx, stop_rx) = watch::channel(false);
        tokio::spawn(pump(
            child,
            stdout,
            chunk_tx,
            stop_rx,
            self.config.chunk_bytes.max(1),
            self.config.stop_timeout(),
        ));

        Ok(CaptureStream {
            chunks: chunk_rx,
            tracks: vec![Box::new(ProcessTrack { stop: stop_tx })],
        })
    }
}

/// Forward stdout as chunks until the recorder exits or a stop is requested.
///
/// A stop asks the recorder to finish, keeps forwarding what it flushes and
/// only kills it once `stop_timeout` passes. The stream closes before reaping.
async fn pump(
    mut child: Child,
    mut stdout: ChildStdout,
    chunks: mpsc::Sender<Vec<u8>>,
    mut stop: watch::Receiver<bool>,
    chunk_bytes: usize,
    stop_timeout: Duration,
) {
    let mut buffer = vec![0u8; chunk_bytes];
    let mut delivered = 0usize;

    let stop_requested = loop {
        tokio::select! {
            biased;
            _ = async { stop.wait_for(|stopped| *stopped).await.map(|_| ()) } => break true,
            read = stdout.read(&mut buffer) => match read {
                Ok(0) => {
                    debug!("recorder closed its output");
                    break false;
                }
                Ok(n) => {
                    if chunks.send(buffer[..n].to_vec()).await.is_err() {
                        break true;
                    }
                    delivered += n;
                }
                Err(e) => {
                    warn!(error = %e, "failed to read recorder output");
                    break true;
                }
            },
        }
    };

    if stop_requested {
        request_stop(&mut child);
        let deadline = Instant::now() + stop_timeout;
        loop {
            match tokio::time::timeout_at(deadline, stdout.read(&mut buffer)).await {
                Ok(Ok(0)) => {
                    debug!(bytes = delivered, "recorder flushed and closed its output");
                    break;
                }
                Ok(Ok(n)) => {
                    if chunks.send(buffer[..n].to_vec()).await.is_ok() {
                        delivered += n;
                    }
                }
                Ok(Err(e)) => {
                    warn!(error = %e, "failed to read recorder output");
                    break;
                }
                Err(_) => {
                    warn!(?stop_timeout, "recorder ignored the stop request, killing it");
                    break;
                }
            }
        }
    }
    drop(chunks);

    match child.try_wait() {
        Ok(Some(_)) => {}
        _ => {
            if let Err(e) = child.start_kill() {
                debug!(error = %e, "recorder already exited");
            }
        }
    }
    match child.wait().await {
        Ok(status) => info!(%status, bytes = delivered, "recorder exited"),
        Err(e) => warn!(error = %e, "failed to reap recorder"),
    }
}

/// Ask the recorder to finish its output (SIGINT, as on an interactive stop)
#[cfg(unix)]
fn request_stop(child: &mut Child) {
    use nix::sys::signal::{kill, Signal};
    use nix::unistd::Pid;

    let Some(pid) = child.id().and_then(|id| i32::try_from(id).ok()) else {
        return;
    };
    match kill(Pid::from_raw(pid), Signal::SIGINT) {
        Ok(()) => debug!(pid, "sent SIGINT to recorder"),
        Err(e) => debug!(pid, error = %e, "could not signal recorder"),
    }
}

#[cfg(not(unix))]
fn request_stop(child: &mut Child) {
    if let Err(e) = child.start_kill() {
        debug!(error = %e, "recorder already exited");
    }
}

async fn forward_stderr(program: String, stderr: ChildStderr) {
    let mut lines = BufReader::new(stderr).lines();
    while let Ok(Some(line)) = lines.next_line().await {
        debug!(%program, "{}", line);
    }
}
