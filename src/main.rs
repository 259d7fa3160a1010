//! ytdlp-relay - HTTP relay for yt-dlp
//!
//! This is the main entry point, which loads configuration, sets up logging
//! and runs either the HTTP server or one of the diagnostic subcommands.

use anyhow::Result;
use clap::Parser;
use std::path::Path;
use tracing::{info, Level};
use tracing_appender::non_blocking::WorkerGuard;
use tracing_appender::{non_blocking, rolling};
use tracing_subscriber::{fmt, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use ytdlp_relay::cli::{Args, Commands};
use ytdlp_relay::config::Config;
use ytdlp_relay::extractor::{ExtractorCommandBuilder, ExtractorFactory};
use ytdlp_relay::metadata::MetadataFetcher;
use ytdlp_relay::server::run_server;

#[tokio::main]
async fn main() -> Result<()> {
    // Parse command line arguments
    let args = Args::parse();

    // Load configuration
    let mut config = match &args.config {
        Some(config_path) => Config::from_file(config_path)?,
        None => {
            if Path::new("config.toml").exists() {
                Config::from_file("config.toml")?
            } else {
                Config::default()
            }
        }
    };
    config.apply_env()?;
    if let Some(Commands::Serve { port: Some(port) }) = &args.command {
        config.server.port = *port;
    }
    config.validate()?;

    // Keep the file writer alive until exit
    let _guard = setup_logging(args.verbose, config.logging.log_dir.as_deref())?;

    let extractor = ExtractorFactory::create_extractor(config.extractor.clone());

    match args.command {
        None | Some(Commands::Serve { .. }) => {
            info!("Starting ytdlp-relay on {}", config.bind_address());
            run_server(&config, extractor).await?;
        }
        Some(Commands::Check) => {
            let version = extractor.get_version_info().await?;
            println!("{} {}", config.extractor.binary_path, version);
        }
        Some(Commands::Info { url }) => {
            let fetcher = MetadataFetcher::new(
                extractor,
                ExtractorCommandBuilder::new(config.extractor.extra_args.clone()),
                config.extractor.metadata_timeout_secs.map(std::time::Duration::from_secs),
            );
            let info = fetcher.fetch_metadata(&url).await?;
            println!("{}", serde_json::to_string_pretty(&info)?);
        }
    }

    Ok(())
}

/// Setup logging to stderr and, when a directory is configured, a daily rotated file
fn setup_logging(verbose: bool, log_dir: Option<&Path>) -> Result<Option<WorkerGuard>> {
    let log_level = if verbose { Level::DEBUG } else { Level::INFO };

    let console_layer = fmt::layer()
        .with_writer(std::io::stderr)
        .with_target(false)
        .with_thread_ids(true)
        .with_file(true)
        .with_line_number(true);

    let (file_layer, guard) = match log_dir {
        Some(dir) => {
            std::fs::create_dir_all(dir)?;
            let file_appender = rolling::daily(dir, "ytdlp-relay.log");
            let (non_blocking_file, guard) = non_blocking(file_appender);

            let layer = fmt::layer()
                .with_writer(non_blocking_file)
                .with_target(false)
                .with_thread_ids(true)
                .with_file(true)
                .with_line_number(true)
                .with_ansi(false); // No ANSI colors in file

            (Some(layer), Some(guard))
        }
        None => (None, None),
    };

    tracing_subscriber::registry()
        .with(EnvFilter::from_default_env().add_directive(log_level.into()))
        .with(console_layer)
        .with(file_layer)
        .try_init()
        .map_err(|e| anyhow::anyhow!("Failed to initialize logging: {}", e))?;

    match log_dir {
        Some(dir) => info!("Logging initialized - console: {}, file: {}", log_level, dir.join("ytdlp-relay.log").display()),
        None => info!("Logging initialized - console: {}", log_level),
    }

    Ok(guard)
}
