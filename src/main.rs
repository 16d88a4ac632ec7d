//! Cuerag CLI entry point.

use anyhow::Result;
use clap::Parser;
use cuerag::cli::{commands, Cli, Commands};
use cuerag::config::Settings;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    // Load configuration
    let config_path = cli.config.as_deref().map(Settings::expand_path);
    let needs_settings = cli.command.needs_settings();
    let settings = if needs_settings {
        Settings::load_from(config_path.as_ref())?
    } else {
        Settings::default()
    };

    // Initialize logging
    let log_level = match cli.verbose {
        0 => settings.general.log_level.as_str(),
        1 => "info",
        2 => "debug",
        _ => "trace",
    };

    tracing_subscriber::registry()
        .with(EnvFilter::new(
            std::env::var("RUST_LOG").unwrap_or_else(|_| format!("cuerag={}", log_level)),
        ))
        .with(tracing_subscriber::fmt::layer().with_target(false).with_writer(std::io::stderr))
        .init();

    // Ensure data directory exists
    if needs_settings {
        std::fs::create_dir_all(settings.data_dir())?;
    }

    // Execute command
    match cli.command {
        Commands::Speaker {
            input,
            first_name,
            last_name,
            format,
            output,
            ingest,
        } => {
            commands::run_speaker(&input, &first_name, &last_name, format, output, ingest, settings)
                .await?;
        }

        Commands::Ingest {
            directory,
            collection,
            reset,
        } => {
            commands::run_ingest(&directory, collection, reset, settings).await?;
        }

        Commands::Retrieve {
            query,
            limit,
            min_score,
            variants,
            collection,
        } => {
            commands::run_retrieve(&query, limit, min_score, variants, collection, settings).await?;
        }

        Commands::Ask {
            question,
            model,
            max_chunks,
            variants,
            collection,
        } => {
            commands::run_ask(&question, model, max_chunks, variants, collection, settings).await?;
        }

        Commands::Clean {
            input,
            first_name,
            last_name,
            speaker,
            model,
            output,
        } => {
            commands::run_clean(&input, first_name, last_name, speaker, model, output, settings)
                .await?;
        }

        Commands::List { collection, full } => {
            commands::run_list(collection, full, settings).await?;
        }

        Commands::Reset { collection, yes } => {
            commands::run_reset(collection, yes, settings).await?;
        }

        Commands::Config { action } => {
            commands::run_config(&action, config_path, settings)?;
        }
    }

    Ok(())
}
