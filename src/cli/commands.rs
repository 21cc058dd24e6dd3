//! Command implementations

use anyhow::{Context, Result};
use serde::Serialize;
use tracing::info;

use crate::adapters::{AppConfig, SimulatedSurface, TomlConfigAdapter};
use crate::app::{AppContainer, RecordOutcome};
use crate::cli::args::{AddArgs, ListArgs, LoadArgs, RecordArgs, RemoveArgs};
use crate::domain::model::{Clip, SavedState};
use crate::utils::format_file_size;
use crate::utils::source_id::watch_url;
use crate::utils::time::format_clock;

/// Characters of the clip id shown in listings
const SHORT_ID_LEN: usize = 8;

/// Execute the load command
pub async fn load(container: &dyn AppContainer, args: LoadArgs) -> Result<()> {
    let state = container.queue_interactor().load_source(&args.url).await?;
    println!("Loaded {} ({})", state.source_id, watch_url(&state.source_id));
    Ok(())
}

/// Execute the add command
pub async fn add(container: &dyn AppContainer, args: AddArgs) -> Result<()> {
    let clip = container
        .queue_interactor()
        .add_clip(&args.start, &args.end)
        .await?;
    println!("Added {} [{}]", clip, short_id(&clip));
    Ok(())
}

/// Execute the remove command
pub async fn remove(container: &dyn AppContainer, args: RemoveArgs) -> Result<()> {
    let clip = container.queue_interactor().remove_clip(&args.id).await?;
    println!("Removed {} [{}]", clip, short_id(&clip));
    Ok(())
}

/// Execute the clear command
pub async fn clear(container: &dyn AppContainer) -> Result<()> {
    let removed = container.queue_interactor().clear().await?;
    println!("Removed {} clip(s)", removed);
    Ok(())
}

#[derive(Serialize)]
struct ClipView<'a> {
    id: String,
    start: f64,
    end: f64,
    label: String,
    #[serde(skip)]
    clip: &'a Clip,
}

#[derive(Serialize)]
struct ListView<'a> {
    source_id: &'a str,
    url: String,
    total_seconds: f64,
    saved_at: String,
    clips: Vec<ClipView<'a>>,
}

impl<'a> ListView<'a> {
    fn new(state: &'a SavedState) -> Self {
        Self {
            source_id: &state.source_id,
            url: watch_url(&state.source_id),
            total_seconds: state.clips.iter().map(Clip::duration).sum(),
            saved_at: state.saved_at.to_rfc3339(),
            clips: state
                .clips
                .iter()
                .map(|clip| ClipView {
                    id: clip.id.to_string(),
                    start: clip.start,
                    end: clip.end,
                    label: clip.to_string(),
                    clip,
                })
                .collect(),
        }
    }
}

/// Execute the list command
pub async fn list(container: &dyn AppContainer, args: ListArgs) -> Result<()> {
    let state = container.queue_interactor().saved().await?;

    let Some(state) = state else {
        if args.json {
            println!("null");
        } else {
            println!("No video loaded");
        }
        return Ok(());
    };
    let view = ListView::new(&state);

    if args.json {
        println!("{}", serde_json::to_string_pretty(&view)?);
        return Ok(());
    }

    println!("Video: {} ({})", view.source_id, view.url);
    if view.clips.is_empty() {
        println!("No clips queued");
        return Ok(());
    }
    for (index, entry) in view.clips.iter().enumerate() {
        println!("{:>3}. {}  [{}]", index + 1, entry.label, short_id(entry.clip));
    }
    println!(
        "{} clip(s), {} total",
        view.clips.len(),
        format_clock(view.total_seconds)
    );
    Ok(())
}

/// Execute the record command
pub async fn record(
    container: &dyn AppContainer,
    config: &AppConfig,
    args: RecordArgs,
) -> Result<()> {
    let interactor = container.record_interactor();
    let state = interactor.prepare().await?;

    // Leaving with Ctrl-C counts as leaving the capture surface.
    container.foreground().background_on_ctrl_c();

    let outcome = if args.dry_run {
        let duration = state.clips.iter().map(|c| c.end).fold(0.0, f64::max) + 1.0;
        info!(duration, "recording against a simulated player");
        let surface = SimulatedSurface::new(duration);
        interactor.record(&state, &surface).await?
    } else {
        record_from_mpv(config, &state, &*interactor).await?
    };

    report_outcome(&outcome, args.json)
}

#[cfg(unix)]
async fn record_from_mpv(
    config: &AppConfig,
    state: &SavedState,
    interactor: &crate::app::RecordInteractor,
) -> Result<RecordOutcome> {
    use crate::adapters::MpvIpcSurface;

    let socket = &config.surface.mpv_socket;
    let surface = MpvIpcSurface::connect(socket, config.surface.ready_timeout())
        .await
        .with_context(|| {
            format!(
                "Start mpv with --input-ipc-server={} --idle first",
                socket.display()
            )
        })?;
    surface.load(&watch_url(&state.source_id)).await?;
    surface.wait_ready(config.surface.ready_timeout()).await?;

    Ok(interactor.record(state, &surface).await?)
}

#[cfg(not(unix))]
async fn record_from_mpv(
    _config: &AppConfig,
    _state: &SavedState,
    _interactor: &crate::app::RecordInteractor,
) -> Result<RecordOutcome> {
    anyhow::bail!("mpv control needs a unix socket; use --dry-run on this platform")
}

fn report_outcome(outcome: &RecordOutcome, json: bool) -> Result<()> {
    if json {
        let event = serde_json::json!({
            "event": "saved",
            "path": outcome.path.display().to_string(),
            "size": outcome.size,
            "clips": outcome.clips,
            "timestamp": chrono::Utc::now().to_rfc3339()
        });
        println!("{}", event);
    } else {
        println!(
            "Saved {} ({})",
            outcome.path.display(),
            format_file_size(outcome.size as u64)
        );
    }
    Ok(())
}

/// Execute the config command
pub fn show_config(config: &AppConfig) -> Result<()> {
    print!("{}", TomlConfigAdapter::to_toml(config)?);
    Ok(())
}

fn short_id(clip: &Clip) -> String {
    clip.id.to_string().chars().take(SHORT_ID_LEN).collect()
}
