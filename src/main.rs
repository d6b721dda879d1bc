//! Bazarr Translate - Missing Subtitle Backfill Workflow
//!
//! Entry point: loads configuration, sets up logging and runs the episode
//! and/or movie batches against Bazarr.

use anyhow::Result;
use clap::Parser;
use tracing::{info, Level};
use tracing_appender::non_blocking::WorkerGuard;
use tracing_appender::{non_blocking, rolling};
use tracing_subscriber::{fmt, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use bazarr_translate::bazarr::ItemKind;
use bazarr_translate::cli::{Args, Commands, RunOptions};
use bazarr_translate::config::Config;
use bazarr_translate::error::BazarrError;
use bazarr_translate::workflow::Workflow;

#[tokio::main]
async fn main() -> Result<()> {
    // Parse command line arguments
    let args = Args::parse();

    // Load configuration
    let mut config = match &args.config {
        Some(config_path) => Config::from_file(config_path)?,
        None => {
            if std::path::Path::new("config.toml").exists() {
                Config::from_file("config.toml")?
            } else {
                Config::default()
            }
        }
    };
    if let Some(api_key) = &args.api_key {
        config.bazarr.api_key = api_key.clone();
    }

    // Setup logging to both console and file
    let _guard = setup_logging(args.verbose || config.workflow.debug)?;
    info!("Starting Bazarr Translate");

    let (kinds, options): (Vec<ItemKind>, &RunOptions) = match &args.command {
        Commands::Init { output, force } => {
            if output.exists() && !force {
                return Err(BazarrError::Config(format!(
                    "{} already exists, use --force to overwrite",
                    output.display()
                ))
                .into());
            }
            Config::default().save_to_file(output)?;
            info!("Wrote default configuration to {}", output.display());
            return Ok(());
        }
        Commands::Episodes { options } => (vec![ItemKind::Episode], options),
        Commands::Movies { options } => (vec![ItemKind::Movie], options),
        Commands::All { options } => (vec![ItemKind::Episode, ItemKind::Movie], options),
    };
    options.apply(&mut config.workflow);

    info!(
        "Bazarr at {}, search: {}, minimum score: {}, target language: {}",
        config.bazarr.base_url(),
        config.workflow.search,
        config.workflow.minimum_score,
        config.workflow.target_language
    );

    let workflow = Workflow::new(config)?;
    let target = workflow.config().workflow.target_language.to_uppercase();

    for kind in kinds {
        let summary = workflow.run(kind).await?;
        println!(
            "{} with missing {} subtitles: {}",
            kind.plural(),
            target,
            summary.translated
        );
    }

    info!("Bazarr Translate completed successfully");
    Ok(())
}

/// Setup logging to both console and file
fn setup_logging(verbose: bool) -> Result<WorkerGuard> {
    let log_dir = std::env::current_dir()?.join(".bazarr-translate").join("log");
    std::fs::create_dir_all(&log_dir)?;

    // Set up file appender with daily rotation
    let file_appender = rolling::daily(&log_dir, "bazarr-translate.log");
    let (non_blocking_file, guard) = non_blocking(file_appender);

    let log_level = if verbose { Level::DEBUG } else { Level::INFO };

    let console_layer = fmt::layer().with_target(false);

    // No ANSI colors in file
    let file_layer = fmt::layer()
        .with_writer(non_blocking_file)
        .with_target(false)
        .with_file(true)
        .with_line_number(true)
        .with_ansi(false);

    tracing_subscriber::registry()
        .with(EnvFilter::from_default_env().add_directive(log_level.into()))
        .with(console_layer)
        .with(file_layer)
        .try_init()
        .map_err(|e| anyhow::anyhow!("Failed to initialize logging: {}", e))?;

    info!(
        "Logging initialized - console: {}, file: {}",
        log_level,
        log_dir.join("bazarr-translate.log").display()
    );

    Ok(guard)
}
