// mpv IPC adapter - Remote playback surface over mpv's JSON socket protocol

use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::Duration;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};
use tokio::io::{AsyncBufReadExt, AsyncWriteExt, BufReader, Lines};
use tokio::net::unix::{OwnedReadHalf, OwnedWriteHalf};
use tokio::net::UnixStream;
use tokio::sync::Mutex;
use tokio::time::Instant;
use tracing::{debug, info, trace};

use crate::domain::errors::*;
use crate::ports::*;

const REQUEST_TIMEOUT: Duration = Duration::from_secs(5);
const RETRY_INTERVAL: Duration = Duration::from_millis(100);

#[derive(Debug, Serialize)]
struct Request<'a> {
    command: &'a [Value],
    request_id: u64,
}

/// A reply or an unsolicited event; events carry no `request_id`
#[derive(Debug, Deserialize)]
struct Reply {
    request_id: Option<u64>,
    error: Option<String>,
    #[serde(default)]
    data: Value,
}

struct Connection {
    lines: Lines<BufReader<OwnedReadHalf>>,
    writer: OwnedWriteHalf,
}

/// mpv instance started with `--input-ipc-server=<socket>`
pub struct MpvIpcSurface {
    socket: PathBuf,
    connection: Mutex<Connection>,
    next_request: AtomicU64,
}

impl MpvIpcSurface {
    /// Connect, retrying until `timeout` while mpv creates its socket
    pub async fn connect(socket: &Path, timeout: Duration) -> Result<Self, DomainError> {
        let deadline = Instant::now() + timeout;
        let stream = loop {
            match UnixStream::connect(socket).await {
                Ok(stream) => break stream,
                Err(e) if Instant::now() >= deadline => {
                    return Err(DomainError::Surface(format!(
                        "cannot connect to mpv at {}: {}",
                        socket.display(),
                        e
                    )))
                }
                Err(e) => {
                    trace!(error = %e, "mpv socket not up yet");
                    tokio::time::sleep(RETRY_INTERVAL).await;
                }
            }
        };

        let (reader, writer) = stream.into_split();
        info!("Connected to mpv at {}", socket.display());
        Ok(Self {
            socket: socket.to_path_buf(),
            connection: Mutex::new(Connection {
                lines: BufReader::new(reader).lines(),
                writer,
            }),
            next_request: AtomicU64::new(1),
        })
    }

    pub fn socket(&self) -> &Path {
        &self.socket
    }

    /// Open `url` paused at the beginning
    pub async fn load(&self, url: &str) -> Result<(), DomainError> {
        info!(url, "loading source into mpv");
        self.set_property("pause", json!(true)).await?;
        self.command(&[json!("loadfile"), json!(url), json!("replace")])
            .await
            .map(|_| ())
    }

    /// Poll readiness until the file is loaded or `timeout` passes
    pub async fn wait_ready(&self, timeout: Duration) -> Result<(), DomainError> {
        let deadline = Instant::now() + timeout;
        while !self.is_ready().await {
            if Instant::now() >= deadline {
                return Err(DomainError::SurfaceNotReady);
            }
            tokio::time::sleep(RETRY_INTERVAL).await;
        }
        debug!("mpv reports a loaded file");
        Ok(())
    }

    async fn get_property(&self, name: &str) -> Result<Value, DomainError> {
        self.command(&[json!("get_property"), json!(name)]).await
    }

    async fn set_property(&self, name: &str, value: Value) -> Result<(), DomainError> {
        self.command(&[json!("set_property"), json!(name), value])
            .await
            .map(|_| ())
    }

    /// Send one command and wait for the reply carrying its request id
    async fn command(&self, command: &[Value]) -> Result<Value, DomainError> {
        let request_id = self.next_request.fetch_add(1, Ordering::Relaxed);
        let mut line = serde_json::to_string(&Request {
            command,
            request_id,
        })
        .map_err(|e| DomainError::Surface(format!("cannot encode mpv command: {}", e)))?;
        line.push('\n');

        let mut connection = self.connection.lock().await;
        let exchange = async {
            connection
                .writer
                .write_all(line.as_bytes())
                .await
                .map_err(|e| DomainError::Surface(format!("mpv socket write failed: {}", e)))?;

            loop {
                let Some(text) = connection
                    .lines
                    .next_line()
                    .await
                    .map_err(|e| DomainError::Surface(format!("mpv socket read failed: {}", e)))?
                else {
                    return Err(DomainError::Surface("mpv closed the connection".to_string()));
                };

                let reply: Reply = match serde_json::from_str(&text) {
                    Ok(reply) => reply,
                    Err(e) => {
                        debug!(error = %e, "ignoring unparsable mpv message");
                        continue;
                    }
                };
                if reply.request_id != Some(request_id) {
                    trace!(message = %text, "skipping mpv event");
                    continue;
                }
                return match reply.error.as_deref() {
                    None | Some("success") => Ok(reply.data),
                    Some(error) => Err(DomainError::Surface(format!(
                        "mpv rejected {}: {}",
                        command.first().map(Value::to_string).unwrap_or_default(),
                        error
                    ))),
                };
            }
        };

        tokio::time::timeout(REQUEST_TIMEOUT, exchange)
            .await
            .map_err(|_| DomainError::Surface("mpv did not answer in time".to_string()))?
    }
}

fn as_f64(value: Value, what: &str) -> Result<f64, DomainError> {
    value
        .as_f64()
        .ok_or_else(|| DomainError::Surface(format!("mpv returned a non-numeric {}", what)))
}

#[async_trait]
impl PlaybackSurface for MpvIpcSurface {
    async fn is_ready(&self) -> bool {
        matches!(self.get_property("duration").await, Ok(Value::Number(_)))
    }

    async fn seek_to(&self, seconds: f64) -> Result<(), DomainError> {
        self.command(&[json!("seek"), json!(seconds), json!("absolute+exact")])
            .await
            .map(|_| ())
    }

    async fn play(&self) -> Result<(), DomainError> {
        self.set_property("pause", json!(false)).await
    }

    async fn pause(&self) -> Result<(), DomainError> {
        self.set_property("pause", json!(true)).await
    }

    async fn current_time(&self) -> Result<f64, DomainError> {
        as_f64(self.get_property("time-pos").await?, "time-pos")
    }

    async fn is_muted(&self) -> Result<bool, DomainError> {
        self.get_property("mute")
            .await?
            .as_bool()
            .ok_or_else(|| DomainError::Surface("mpv returned a non-boolean mute".to_string()))
    }

    async fn unmute(&self) -> Result<(), DomainError> {
        self.set_property("mute", json!(false)).await
    }

    async fn set_volume(&self, volume: u8) -> Result<(), DomainError> {
        self.set_property("volume", json!(volume.min(100))).await
    }
}
