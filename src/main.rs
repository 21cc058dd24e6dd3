//! reelcap
//!
//! Queue time ranges of a video, then record them back to back from a
//! remotely controlled player into a single `.webm` file.
//!
//! # Usage
//!
//! ```bash
//! reelcap load --url "https://youtu.be/dQw4w9WgXcQ"
//! reelcap add --start 0:43 --end 0:51
//! reelcap add --start 1:25 --end 1:33
//! reelcap record --socket /tmp/mpv.sock
//! ```

use anyhow::Result;
use clap::Parser;
use tracing::{debug, info};

use reelcap::app::{ContainerOptions, DefaultAppContainer};
use reelcap::cli::{commands, Cli, Commands};
use reelcap::config_initialization::initialize_configuration_hierarchy;
use reelcap::utils::logging::{init_logging, log_system_info};

/// Main entry point for the reelcap CLI application
#[tokio::main]
async fn main() -> Result<()> {
    // Parse command line arguments
    let cli = Cli::parse();

    let config = initialize_configuration_hierarchy(&cli)?;
    init_logging(&config.logging)?;
    log_system_info();
    debug!(?config, "effective configuration");

    let options = match &cli.command {
        Commands::Record(args) => ContainerOptions {
            dry_run: args.dry_run,
            json_progress: args.json,
        },
        _ => ContainerOptions::default(),
    };
    let container = DefaultAppContainer::new(config.clone(), options);

    // Execute the requested command
    match cli.command {
        Commands::Load(args) => commands::load(&container, args).await?,
        Commands::Add(args) => commands::add(&container, args).await?,
        Commands::Remove(args) => commands::remove(&container, args).await?,
        Commands::List(args) => commands::list(&container, args).await?,
        Commands::Clear => commands::clear(&container).await?,
        Commands::Record(args) => {
            info!("Executing record command");
            commands::record(&container, &config, args).await?
        }
        Commands::Config => commands::show_config(&config)?,
    }

    debug!("reelcap completed successfully");
    Ok(())
}
