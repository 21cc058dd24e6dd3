//! Command-line argument definitions

use std::path::PathBuf;

use clap::Args;

/// Arguments for the load command
#[derive(Args, Debug)]
pub struct LoadArgs {
    /// Video URL (watch, youtu.be, embed, shorts or live) or bare video id
    #[arg(short, long)]
    pub url: String,
}

/// Arguments for the add command
#[derive(Args, Debug)]
pub struct AddArgs {
    /// Start time (MM:SS or HH:MM:SS)
    #[arg(short, long)]
    pub start: String,

    /// End time (MM:SS or HH:MM:SS)
    #[arg(short, long)]
    pub end: String,
}

/// Arguments for the remove command
#[derive(Args, Debug)]
pub struct RemoveArgs {
    /// Clip id, or an unambiguous prefix of it
    #[arg(long)]
    pub id: String,
}

/// Arguments for the list command
#[derive(Args, Debug)]
pub struct ListArgs {
    /// Output in JSON format
    #[arg(long)]
    pub json: bool,
}

/// Arguments for the record command
#[derive(Args, Debug)]
pub struct RecordArgs {
    /// mpv IPC socket (mpv --input-ipc-server=<path>)
    #[arg(long)]
    pub socket: Option<PathBuf>,

    /// Directory for the recording
    #[arg(short, long)]
    pub output_dir: Option<PathBuf>,

    /// Play against a simulated player and recorder instead of mpv and ffmpeg
    #[arg(long)]
    pub dry_run: bool,

    /// Overwrite behavior (prompt, always, never)
    #[arg(long)]
    pub overwrite: Option<String>,

    /// Report progress as JSON lines
    #[arg(long)]
    pub json: bool,
}
