//! Lectern CLI entry point.

use anyhow::Result;
use clap::Parser;
use lectern::cli::commands::{self, NotesOptions};
use lectern::cli::{Cli, Commands};
use lectern::config::Settings;
use std::path::PathBuf;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    let config_path = cli.config.as_ref().map(PathBuf::from);
    let settings = Settings::load_from(config_path.as_ref())?;

    // Initialize logging: -v flags win over general.log_level
    let log_level = match cli.verbose {
        0 => settings.general.log_level.as_str(),
        1 => "info",
        2 => "debug",
        _ => "trace",
    };

    tracing_subscriber::registry()
        .with(EnvFilter::new(
            std::env::var("RUST_LOG").unwrap_or_else(|_| format!("lectern={}", log_level)),
        ))
        .with(tracing_subscriber::fmt::layer().with_target(false).with_writer(std::io::stderr))
        .init();

    match cli.command {
        Commands::Notes {
            inputs,
            list,
            playlist,
            limit,
            output,
            format,
            fresh,
        } => {
            let options = NotesOptions {
                inputs,
                list,
                playlist,
                limit,
                output,
                format,
                fresh,
            };
            commands::run_notes(options, settings).await?;
        }

        Commands::Title { input } => {
            commands::run_title(&input, settings).await?;
        }

        Commands::Chunk { input, max_length } => {
            commands::run_chunk(&input, max_length, settings).await?;
        }

        Commands::Doctor => {
            commands::run_doctor(&settings)?;
        }

        Commands::Config { action } => {
            commands::run_config(&action, config_path, settings)?;
        }
    }

    Ok(())
}
