//! Configuration initialization and hierarchy management

use std::path::PathBuf;

use tracing::{debug, info};

use crate::adapters::toml_config::{AppConfig, TomlConfigAdapter};
use crate::cli::{Cli, Commands};
use crate::error::{ReelcapError, ReelcapResult};
use crate::output::OverwritePolicy;
use crate::utils::logging::LogFormat;

/// Environment variables recognised as overrides
pub const ENV_OVERRIDES: &[&str] = &[
    "REELCAP_LOG_LEVEL",
    "REELCAP_LOG_FORMAT",
    "REELCAP_STORE_DIR",
    "REELCAP_STORE_KEY",
    "REELCAP_OUTPUT_DIR",
    "REELCAP_OVERWRITE",
    "REELCAP_MPV_SOCKET",
    "REELCAP_CAPTURE_PROGRAM",
    "REELCAP_POLL_INTERVAL_MS",
    "REELCAP_SETTLE_DELAY_MS",
    "REELCAP_SEGMENT_TIMEOUT_SLACK_MS",
];

/// Build the configuration following precedence: CLI > Env > File > Defaults
pub fn initialize_configuration_hierarchy(cli: &Cli) -> ReelcapResult<AppConfig> {
    // Defaults, then file
    let mut config = match &cli.config {
        Some(path) => TomlConfigAdapter::load(path)?,
        None => TomlConfigAdapter::load_default()?.unwrap_or_default(),
    };

    let env_overrides = apply_environment_overrides(&mut config, |key| std::env::var(key).ok())?;
    let cli_overrides = apply_cli_overrides(&mut config, cli)?;
    TomlConfigAdapter::validate(&config)?;

    debug!(env_overrides, cli_overrides, "configuration hierarchy resolved");
    Ok(config)
}

/// Apply `REELCAP_*` overrides read through `lookup`; returns how many applied
pub fn apply_environment_overrides<F>(config: &mut AppConfig, lookup: F) -> ReelcapResult<usize>
where
    F: Fn(&str) -> Option<String>,
{
    let mut applied = 0;
    for name in ENV_OVERRIDES {
        if let Some(value) = lookup(name) {
            info!("Found environment override: {} = {}", name, value);
            apply_env_value(config, name, &value)?;
            applied += 1;
        }
    }
    Ok(applied)
}

fn apply_env_value(config: &mut AppConfig, name: &str, value: &str) -> ReelcapResult<()> {
    match name {
        "REELCAP_LOG_LEVEL" => config.logging.level = value.to_string(),
        "REELCAP_LOG_FORMAT" => config.logging.format = LogFormat::parse(value)?,
        "REELCAP_STORE_DIR" => config.store.dir = PathBuf::from(value),
        "REELCAP_STORE_KEY" => config.store.key = value.to_string(),
        "REELCAP_OUTPUT_DIR" => config.output.dir = PathBuf::from(value),
        "REELCAP_OVERWRITE" => config.output.overwrite = value.parse()?,
        "REELCAP_MPV_SOCKET" => config.surface.mpv_socket = PathBuf::from(value),
        "REELCAP_CAPTURE_PROGRAM" => config.capture.program = value.to_string(),
        "REELCAP_POLL_INTERVAL_MS" => config.recorder.poll_interval_ms = parse_millis(name, value)?,
        "REELCAP_SETTLE_DELAY_MS" => config.recorder.settle_delay_ms = parse_millis(name, value)?,
        "REELCAP_SEGMENT_TIMEOUT_SLACK_MS" => {
            config.recorder.segment_timeout_slack_ms = Some(parse_millis(name, value)?)
        }
        other => {
            return Err(ReelcapError::Config {
                message: format!("Unknown environment override: {}", other),
            })
        }
    }
    Ok(())
}

/// Apply command-line overrides; returns how many applied
pub fn apply_cli_overrides(config: &mut AppConfig, cli: &Cli) -> ReelcapResult<usize> {
    let mut applied = 0;

    if let Some(level) = &cli.log_level {
        config.logging.level = level.clone();
        applied += 1;
    }
    if let Some(dir) = &cli.store_dir {
        config.store.dir = dir.clone();
        applied += 1;
    }

    if let Commands::Record(args) = &cli.command {
        if let Some(socket) = &args.socket {
            config.surface.mpv_socket = socket.clone();
            applied += 1;
        }
        if let Some(dir) = &args.output_dir {
            config.output.dir = dir.clone();
            applied += 1;
        }
        if let Some(policy) = &args.overwrite {
            config.output.overwrite = policy.parse::<OverwritePolicy>()?;
            applied += 1;
        }
    }

    if applied > 0 {
        info!("Applied {} CLI configuration overrides", applied);
    }
    Ok(applied)
}

fn parse_millis(name: &str, value: &str) -> ReelcapResult<u64> {
    value.trim().parse().map_err(|e| ReelcapError::Config {
        message: format!("{} must be a whole number of milliseconds: {}", name, e),
    })
}
