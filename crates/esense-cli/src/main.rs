//! EarthSense command-line host.

mod config;
mod logging;
mod output;

use std::path::{Path, PathBuf};
use std::process::ExitCode;
use std::sync::Arc;

use anyhow::{bail, Context, Result};
use clap::{Parser, Subcommand};
use tracing::{debug, info};

use esense_client::{BackendStatus, HealthMonitor, InferenceApi, InferenceClient};
use esense_export::DirectorySink;
use esense_models::ImageHandle;
use esense_session::{BatchInferenceController, ControllerState, SingleInferenceController};

use crate::config::AppConfig;
use crate::output::{render_batch, render_prediction, StdoutClipboard};

#[derive(Parser)]
#[command(name = "esense", version, about = "Deforestation inference client")]
struct Cli {
    /// Base URL of the inference service [env: ESENSE_API_BASE]
    #[arg(long, global = true)]
    api_base: Option<String>,

    /// Directory for exported files [env: ESENSE_OUTPUT_DIR]
    #[arg(long, global = true)]
    output_dir: Option<PathBuf>,

    /// Emit logs as JSON
    #[arg(long, global = true)]
    json_logs: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Check whether the service is reachable
    Ping {
        /// Keep probing and print every status change
        #[arg(long)]
        watch: bool,
    },
    /// Classify one image
    Predict {
        /// Image file to classify
        image: PathBuf,
        /// Save the explanation overlay as gradcam.jpg
        #[arg(long)]
        explanation: bool,
        /// Print a one-line summary for the clipboard
        #[arg(long)]
        copy_summary: bool,
    },
    /// Classify several images in one request
    Batch {
        /// Image files to classify
        #[arg(required = true)]
        images: Vec<PathBuf>,
        /// Save the rows as batch_results.csv
        #[arg(long)]
        csv: bool,
    },
}

#[tokio::main]
async fn main() -> Result<ExitCode> {
    dotenvy::dotenv().ok();

    let cli = Cli::parse();
    logging::init_tracing(cli.json_logs);

    let config = AppConfig::from_env().with_overrides(cli.api_base, cli.output_dir);
    debug!("App config: {:?}", config);

    let client: Arc<dyn InferenceApi> = Arc::new(InferenceClient::new(config.client_config()?)?);

    match cli.command {
        Commands::Ping { watch } => ping(client, &config, watch).await,
        Commands::Predict {
            image,
            explanation,
            copy_summary,
        } => predict(client, &config, &image, explanation, copy_summary).await,
        Commands::Batch { images, csv } => batch(client, &config, &images, csv).await,
    }
}

async fn ping(client: Arc<dyn InferenceApi>, config: &AppConfig, watch: bool) -> Result<ExitCode> {
    let monitor = HealthMonitor::new(client);

    if !watch {
        let status = monitor.probe().await;
        println!("{}", status);
        return Ok(exit_code(status.is_online()));
    }

    let mut last = monitor.probe().await;
    println!("{}", last);

    let (mut rx, handle) = monitor.watch(config.health_interval);
    loop {
        tokio::select! {
            changed = rx.changed() => {
                if changed.is_err() {
                    break;
                }
                let status: BackendStatus = *rx.borrow_and_update();
                if status != last {
                    println!("{}", status);
                    last = status;
                }
            }
            _ = tokio::signal::ctrl_c() => {
                info!("Received shutdown signal");
                break;
            }
        }
    }
    drop(rx);
    handle.abort();
    Ok(ExitCode::SUCCESS)
}

async fn predict(
    client: Arc<dyn InferenceApi>,
    config: &AppConfig,
    path: &Path,
    explanation: bool,
    copy_summary: bool,
) -> Result<ExitCode> {
    let sink = Arc::new(DirectorySink::new(&config.output_dir));
    let controller = SingleInferenceController::new(client, sink, Arc::new(StdoutClipboard));

    let image = read_image(path).await?;
    let filename = image.filename().to_string();
    controller.select(image);
    if let Some(dimensions) = controller.image_dimensions() {
        println!("Image:       {} ({})", filename, dimensions);
    }
    controller.submit().await?;

    match controller.state() {
        ControllerState::Succeeded {
            result,
            completed_at,
            ..
        } => {
            println!("{}", render_prediction(&result));
            println!("Completed:   {}", completed_at.format("%Y-%m-%d %H:%M:%S UTC"));
        }
        ControllerState::Failed { error, .. } => {
            eprintln!("{}", error);
            return Ok(ExitCode::FAILURE);
        }
        other => bail!("unexpected controller state: {}", other.phase()),
    }

    if explanation {
        let file = controller.export_explanation_image().await?;
        println!(
            "Saved {}",
            config.output_dir.join(&file.file_name).display()
        );
    }
    if copy_summary {
        controller.copy_summary().await?;
    }
    Ok(ExitCode::SUCCESS)
}

async fn batch(
    client: Arc<dyn InferenceApi>,
    config: &AppConfig,
    paths: &[PathBuf],
    csv: bool,
) -> Result<ExitCode> {
    let sink = Arc::new(DirectorySink::new(&config.output_dir));
    let controller = BatchInferenceController::new(client, sink);

    let mut images = Vec::with_capacity(paths.len());
    for path in paths {
        images.push(read_image(path).await?);
    }
    controller.select_many(images);
    controller.submit().await?;

    match controller.state() {
        ControllerState::Succeeded { result, .. } => println!("{}", render_batch(&result)),
        ControllerState::Failed { error, .. } => {
            eprintln!("{}", error);
            return Ok(ExitCode::FAILURE);
        }
        other => bail!("unexpected controller state: {}", other.phase()),
    }

    if csv {
        let file = controller.export_results().await?;
        println!(
            "Saved {}",
            config.output_dir.join(&file.file_name).display()
        );
    }
    Ok(ExitCode::SUCCESS)
}

async fn read_image(path: &Path) -> Result<ImageHandle> {
    let content = tokio::fs::read(path)
        .await
        .with_context(|| format!("failed to read {}", path.display()))?;
    let filename = path
        .file_name()
        .map(|name| name.to_string_lossy().into_owned())
        .unwrap_or_else(|| path.display().to_string());
    Ok(ImageHandle::new(filename, content))
}

fn exit_code(ok: bool) -> ExitCode {
    if ok {
        ExitCode::SUCCESS
    } else {
        ExitCode::FAILURE
    }
}
