// TOML config adapter - Typed configuration loaded from TOML files

use std::path::{Path, PathBuf};
use std::time::Duration;

use serde::{Deserialize, Serialize};
use tracing::{debug, info};

use crate::domain::rules::SegmentWaitPolicy;
use crate::engine::segment_player::{SegmentTiming, DEFAULT_POLL_INTERVAL, DEFAULT_SETTLE_DELAY};
use crate::error::{ReelcapError, ReelcapResult};
use crate::output::OverwritePolicy;
use crate::utils::logging::LoggingConfig;

/// Default name of the persisted clip list
pub const DEFAULT_STORE_KEY: &str = "clips";

/// Segment player timing
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RecorderConfig {
    pub poll_interval_ms: u64,
    pub settle_delay_ms: u64,
    /// Unset means a stalled player is waited on forever
    pub segment_timeout_slack_ms: Option<u64>,
}

impl Default for RecorderConfig {
    fn default() -> Self {
        Self {
            poll_interval_ms: DEFAULT_POLL_INTERVAL.as_millis() as u64,
            settle_delay_ms: DEFAULT_SETTLE_DELAY.as_millis() as u64,
            segment_timeout_slack_ms: None,
        }
    }
}

impl RecorderConfig {
    pub fn timing(&self) -> SegmentTiming {
        let policy = match self.segment_timeout_slack_ms {
            Some(ms) => SegmentWaitPolicy::with_slack(Duration::from_millis(ms)),
            None => SegmentWaitPolicy::unbounded(),
        };
        SegmentTiming::new(
            Duration::from_millis(self.poll_interval_ms),
            Duration::from_millis(self.settle_delay_ms),
        )
        .with_wait_policy(policy)
    }
}

/// Screen/audio capture command; its stdout is the recording stream
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct CaptureConfig {
    pub program: String,
    pub args: Vec<String>,
    pub chunk_bytes: usize,
    /// How long the recorder may take to flush after the stop signal
    pub stop_timeout_ms: u64,
}

impl Default for CaptureConfig {
    fn default() -> Self {
        let args = [
            "-loglevel", "error", "-f", "x11grab", "-i", ":0.0", "-f", "pulse", "-i", "default",
            "-c:v", "libvpx", "-deadline", "realtime", "-c:a", "libopus", "-f", "webm", "pipe:1",
        ];
        Self {
            program: "ffmpeg".to_string(),
            args: args.iter().map(|a| a.to_string()).collect(),
            chunk_bytes: 64 * 1024,
            stop_timeout_ms: 5_000,
        }
    }
}

impl CaptureConfig {
    pub fn stop_timeout(&self) -> Duration {
        Duration::from_millis(self.stop_timeout_ms)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct StoreConfig {
    pub dir: PathBuf,
    pub key: String,
}

impl Default for StoreConfig {
    fn default() -> Self {
        Self {
            dir: default_data_dir(),
            key: DEFAULT_STORE_KEY.to_string(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct OutputSettings {
    pub dir: PathBuf,
    pub overwrite: OverwritePolicy,
}

impl Default for OutputSettings {
    fn default() -> Self {
        Self {
            dir: PathBuf::from("."),
            overwrite: OverwritePolicy::Prompt,
        }
    }
}

/// Remote player connection
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SurfaceConfig {
    pub mpv_socket: PathBuf,
    pub ready_timeout_ms: u64,
}

impl Default for SurfaceConfig {
    fn default() -> Self {
        Self {
            mpv_socket: std::env::temp_dir().join("reelcap-mpv.sock"),
            ready_timeout_ms: 10_000,
        }
    }
}

impl SurfaceConfig {
    pub fn ready_timeout(&self) -> Duration {
        Duration::from_millis(self.ready_timeout_ms)
    }
}

/// Complete application configuration
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct AppConfig {
    pub recorder: RecorderConfig,
    pub capture: CaptureConfig,
    pub store: StoreConfig,
    pub output: OutputSettings,
    pub logging: LoggingConfig,
    pub surface: SurfaceConfig,
}

/// Reads `AppConfig` from TOML
pub struct TomlConfigAdapter;

impl TomlConfigAdapter {
    /// Parse a TOML document; missing keys keep their defaults
    pub fn parse(content: &str) -> ReelcapResult<AppConfig> {
        let config: AppConfig = toml::from_str(content)?;
        Self::validate(&config)?;
        Ok(config)
    }

    /// Load a config file
    pub fn load(path: &Path) -> ReelcapResult<AppConfig> {
        if !path.exists() {
            return Err(ReelcapError::Config {
                message: format!("Config file does not exist: {}", path.display()),
            });
        }
        let content = std::fs::read_to_string(path)?;
        let config = Self::parse(&content)?;
        info!("Loaded configuration from: {}", path.display());
        Ok(config)
    }

    /// Load the first existing file among the default locations
    pub fn load_default() -> ReelcapResult<Option<AppConfig>> {
        for path in Self::default_config_paths() {
            if path.exists() {
                return Self::load(&path).map(Some);
            }
            debug!("No config at {}", path.display());
        }
        Ok(None)
    }

    /// `./reelcap.toml`, then `$XDG_CONFIG_HOME/reelcap/config.toml`
    pub fn default_config_paths() -> Vec<PathBuf> {
        let mut paths = vec![PathBuf::from("reelcap.toml")];
        if let Some(dir) = config_home() {
            paths.push(dir.join("reelcap").join("config.toml"));
        }
        paths
    }

    /// Serialize a config, e.g. to seed a config file
    pub fn to_toml(config: &AppConfig) -> ReelcapResult<String> {
        toml::to_string_pretty(config).map_err(|e| ReelcapError::Config {
            message: format!("Failed to serialize config: {}", e),
        })
    }

    pub fn validate(config: &AppConfig) -> ReelcapResult<()> {
        if config.recorder.poll_interval_ms == 0 {
            return Err(ReelcapError::Config {
                message: "recorder.poll_interval_ms must be at least 1".to_string(),
            });
        }
        if config.capture.program.trim().is_empty() {
            return Err(ReelcapError::Config {
                message: "capture.program must not be empty".to_string(),
            });
        }
        if config.capture.chunk_bytes == 0 {
            return Err(ReelcapError::Config {
                message: "capture.chunk_bytes must be at least 1".to_string(),
            });
        }
        if config.store.key.trim().is_empty() {
            return Err(ReelcapError::Config {
                message: "store.key must not be empty".to_string(),
            });
        }
        Ok(())
    }
}

fn config_home() -> Option<PathBuf> {
    std::env::var_os("XDG_CONFIG_HOME")
        .map(PathBuf::from)
        .or_else(|| std::env::var_os("HOME").map(|home| PathBuf::from(home).join(".config")))
}

fn default_data_dir() -> PathBuf {
    std::env::var_os("XDG_DATA_HOME")
        .map(PathBuf::from)
        .or_else(|| {
            std::env::var_os("HOME").map(|home| PathBuf::from(home).join(".local").join("share"))
        })
        .map(|dir| dir.join("reelcap"))
        .unwrap_or_else(|| PathBuf::from(".reelcap"))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::utils::logging::LogFormat;

    #[test]
    fn test_partial_file_keeps_defaults() {
        let config = TomlConfigAdapter::parse(
            r#"
            [recorder]
            settle_delay_ms = 350
            segment_timeout_slack_ms = 2000

            [logging]
            format = "json"
            "#,
        )
        .unwrap();

        assert_eq!(config.recorder.poll_interval_ms, 100);
        assert_eq!(config.recorder.settle_delay_ms, 350);
        assert_eq!(config.logging.format, LogFormat::Json);
        assert_eq!(config.capture.program, "ffmpeg");
        assert_eq!(config.store.key, DEFAULT_STORE_KEY);

        let timing = config.recorder.timing();
        assert_eq!(timing.settle_delay, Duration::from_millis(350));
        assert_eq!(
            timing.wait_policy.max_wait(0.0, 1.0),
            Some(Duration::from_secs(3))
        );
    }

    #[test]
    fn test_defaults_are_unbounded() {
        let timing = AppConfig::default().recorder.timing();
        assert_eq!(timing, SegmentTiming::default());
        assert_eq!(timing.wait_policy.max_wait(0.0, 1.0), None);
    }

    #[test]
    fn test_rejects_invalid_values() {
        assert!(matches!(
            TomlConfigAdapter::parse("[recorder]\npoll_interval_ms = 0"),
            Err(ReelcapError::Config { .. })
        ));
        assert!(matches!(
            TomlConfigAdapter::parse("[output]\noverwrite = \"maybe\""),
            Err(ReelcapError::Toml(_))
        ));
    }

    #[test]
    fn test_serialized_defaults_parse_back() {
        let text = TomlConfigAdapter::to_toml(&AppConfig::default()).unwrap();
        assert_eq!(TomlConfigAdapter::parse(&text).unwrap(), AppConfig::default());
    }

    #[test]
    fn test_missing_file() {
        let result = TomlConfigAdapter::load(Path::new("/nonexistent/reelcap.toml"));
        assert!(matches!(result, Err(ReelcapError::Config { .. })));
    }
}
