//! Kaption - media subtitling pipeline
//!
//! Entry point for the `kaption` binary: the upload/download web server plus
//! command-line access to each pipeline stage.

use anyhow::Result;
use clap::Parser;
use std::sync::Arc;
use tracing::{info, Level};
use tracing_appender::non_blocking::WorkerGuard;
use tracing_appender::{non_blocking, rolling};
use tracing_subscriber::{fmt, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use kaption::cli::{Args, Commands};
use kaption::config::{Config, TOKEN_ENV_VAR};
use kaption::media::MediaProcessorFactory;
use kaption::setup::SetupManager;
use kaption::storage::cleanup_files;
use kaption::workflow::Workflow;

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();

    // Guard flushes the file writer when main returns
    let _guard = setup_logging(args.verbose)?;

    info!("Starting Kaption");

    let mut config = match &args.config {
        Some(config_path) => Config::from_file(config_path)?,
        None => {
            if std::path::Path::new("kaption.toml").exists() {
                info!("Found kaption.toml in current directory, loading...");
                Config::from_file("kaption.toml")?
            } else {
                Config::default()
            }
        }
    };
    config.apply_env_token(std::env::var(TOKEN_ENV_VAR).ok());

    match args.command {
        Commands::Models { download } => {
            let setup_manager = SetupManager::new()?;
            let models = setup_manager.get_available_models();

            println!("\nAvailable Whisper Models:");
            println!("{:<15} {:<22} {:<10} {:<10}", "Name", "Filename", "Size (MB)", "Status");
            println!("{}", "-".repeat(60));

            for model in &models {
                let status = if setup_manager.model_path(model).exists() {
                    "Downloaded"
                } else {
                    "Missing"
                };
                println!("{:<15} {:<22} {:<10.1} {:<10}", model.name, model.filename, model.size_mb, status);
            }

            if download {
                info!("Downloading all missing models...");
                for model in &models {
                    setup_manager.download_model(model).await?;
                }
                info!("All models downloaded successfully");
            }
        }
        Commands::Cleanup { files } => {
            let removed = cleanup_files(&files).await;
            println!("Removed {} of {} files", removed, files.len());
        }
        Commands::Extract { input, output } => {
            let media = MediaProcessorFactory::create_processor(config.media.clone());
            media.check_availability().await?;
            let audio = media.extract_audio(&input, &output).await?;
            println!("Audio written to {}", audio.display());
        }
        Commands::Embed { video, subtitles, output } => {
            let media = MediaProcessorFactory::create_processor(config.media.clone());
            media.check_availability().await?;
            media.embed_subtitles(&video, &subtitles, &output).await?;
            println!("Video with subtitles written to {}", output.display());
        }
        Commands::Serve { address, port } => {
            if let Some(address) = address {
                config.server.address = address;
            }
            if let Some(port) = port {
                config.server.port = port;
            }

            let workflow = initialize_workflow(&mut config).await?;
            kaption::server::serve(Arc::new(workflow), &config.server).await?;
        }
        Commands::Process { input, language, output_dir } => {
            if let Some(output_dir) = output_dir {
                config.storage.processed_dir = output_dir;
            }

            let workflow = initialize_workflow(&mut config).await?;
            let filename = input
                .file_name()
                .map(|name| name.to_string_lossy().to_string())
                .unwrap_or_default();

            let result = workflow.process(&input, &filename, &language).await;
            println!("{}", serde_json::to_string_pretty(&result)?);

            if let Some(error) = result.error {
                anyhow::bail!("Processing failed: {}", error);
            }
        }
        Commands::Transcribe { input, output, language } => {
            let workflow = initialize_workflow(&mut config).await?;
            let segments = workflow.transcribe_to_srt(&input, &output, language.as_deref()).await?;
            println!("Wrote {} subtitles to {}", segments.len(), output.display());
        }
        Commands::Translate { input, output, target_lang } => {
            let workflow = initialize_workflow(&mut config).await?;
            let outcome = workflow.translate_subtitles(&input, &output, &target_lang).await?;
            match outcome.fallback {
                None => println!("Translated {} subtitles to {}", outcome.segments.len(), output.display()),
                Some(reason) => println!("Kept source-language subtitles ({}) in {}", reason, output.display()),
            }
        }
    }

    Ok(())
}

async fn initialize_workflow(config: &mut Config) -> Result<Workflow> {
    info!("Checking and downloading necessary files...");
    let setup_manager = SetupManager::new()?;
    setup_manager.initialize(config).await?;

    Ok(Workflow::initialize(config).await?)
}

fn setup_logging(verbose: bool) -> Result<WorkerGuard> {
    let log_dir = std::env::current_dir()?.join(".kaption").join("log");
    std::fs::create_dir_all(&log_dir)?;

    // Daily rotation
    let file_appender = rolling::daily(&log_dir, "kaption.log");
    let (non_blocking_file, guard) = non_blocking(file_appender);

    let log_level = if verbose { Level::DEBUG } else { Level::INFO };

    let console_layer = fmt::layer()
        .with_target(false)
        .with_file(true)
        .with_line_number(true);

    let file_layer = fmt::layer()
        .with_writer(non_blocking_file)
        .with_target(false)
        .with_thread_ids(true)
        .with_file(true)
        .with_line_number(true)
        .with_ansi(false);

    tracing_subscriber::registry()
        .with(EnvFilter::from_default_env().add_directive(log_level.into()))
        .with(console_layer)
        .with(file_layer)
        .try_init()?;

    Ok(guard)
}
