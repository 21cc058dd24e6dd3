//! CLI module for reelcap
//!
//! This module handles command-line argument parsing and command execution.

use std::path::PathBuf;

use clap::{Parser, Subcommand};

pub mod args;
pub mod commands;

pub use args::{AddArgs, ListArgs, LoadArgs, RecordArgs, RemoveArgs};

/// reelcap clip recorder
///
/// Queue time ranges of a video, then record them back to back from a
/// remotely controlled player into a single file.
#[derive(Parser, Debug)]
#[command(name = "reelcap")]
#[command(about = "Record a sequence of video clips into a single file")]
#[command(version)]
#[command(long_about = None)]
pub struct Cli {
    /// Configuration file (default: ./reelcap.toml, then the user config dir)
    #[arg(long, global = true, env = "REELCAP_CONFIG")]
    pub config: Option<PathBuf>,

    /// Logging level or filter directive
    #[arg(long, global = true)]
    pub log_level: Option<String>,

    /// Directory holding the saved clip list
    #[arg(long, global = true)]
    pub store_dir: Option<PathBuf>,

    /// The command to execute
    #[command(subcommand)]
    pub command: Commands,
}

/// Available commands
#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Select the source video; clears the clip list
    Load(LoadArgs),
    /// Queue a clip
    Add(AddArgs),
    /// Remove a queued clip
    Remove(RemoveArgs),
    /// Show the source and queued clips
    List(ListArgs),
    /// Remove all queued clips
    Clear,
    /// Record the queued clips into one file
    Record(RecordArgs),
    /// Print the effective configuration as TOML
    Config,
}
