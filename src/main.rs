use std::path::PathBuf;
use std::process::ExitCode;

use clap::Parser;
use indicatif::{ProgressBar, ProgressStyle};
use tracing_subscriber::EnvFilter;

use pdf_extract_client::config::AppConfig;
use pdf_extract_client::models::extraction::ExtractionMethod;
use pdf_extract_client::models::job::{ExtractionMode, SubmissionFile};
use pdf_extract_client::models::request::SubmissionRequest;
use pdf_extract_client::services::controller::{SubmissionController, SubmitOutcome};
use pdf_extract_client::view::render;
use pdf_extract_client::view::state::View;

/// Submit a PDF to the extraction service and render the outcome.
#[derive(Debug, Parser)]
#[command(name = "pdf-extract", version, about)]
struct Cli {
    /// PDF document to submit.
    file: PathBuf,

    /// Processing mode: text or image.
    #[arg(long, default_value = "text")]
    mode: ExtractionMode,

    /// Text extraction backend: layout or basic.
    #[arg(long, default_value = "layout")]
    method: ExtractionMethod,

    /// Run OCR on pages without a text layer (text mode only).
    #[arg(long)]
    ocr: bool,

    /// Extraction service base URL; overrides SERVICE_URL.
    #[arg(long)]
    service_url: Option<String>,

    /// Write extracted text to this file instead of stdout.
    #[arg(long)]
    output: Option<PathBuf>,

    /// Save the export artifact of an image analysis to this file.
    #[arg(long)]
    save_export: Option<PathBuf>,
}

#[tokio::main]
async fn main() -> ExitCode {
    // Structured logging on stderr, stdout stays clean for results.
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();

    let mut config = match AppConfig::from_env() {
        Ok(config) => config,
        Err(error) => {
            eprintln!("Error: invalid configuration: {}", error);
            return ExitCode::FAILURE;
        }
    };
    if let Some(url) = cli.service_url.clone() {
        config.service_url = url;
    }

    match run(cli, config).await {
        Ok(()) => ExitCode::SUCCESS,
        Err(error) => {
            eprintln!("Error: {}", error);
            ExitCode::FAILURE
        }
    }
}

async fn run(cli: Cli, config: AppConfig) -> Result<(), Box<dyn std::error::Error>> {
    let bytes = tokio::fs::read(&cli.file).await?;
    let name = cli
        .file
        .file_name()
        .and_then(|name| name.to_str())
        .unwrap_or_default()
        .to_string();

    let controller = SubmissionController::from_config(&config)?;
    let session = controller.session().clone();
    let progress_task = tokio::spawn(paint_progress(session.subscribe()));

    let request = SubmissionRequest::new(Some(SubmissionFile::new(name, bytes)), cli.mode)
        .with_method(cli.method)
        .with_ocr(cli.ocr);

    let outcome = controller.submit(request).await;
    progress_task.abort();

    match outcome? {
        SubmitOutcome::Text(result) => {
            if let Some(path) = &cli.output {
                tokio::fs::write(path, &result.text).await?;
                tracing::info!(path = %path.display(), "extracted text saved");
                println!("File: {}", result.filename);
                println!("Method: {}", result.method);
            } else {
                print!("{}", render::render_text_result(&result));
            }
        }
        SubmitOutcome::Image(result) => {
            print!("{}", render::render_analysis_result(&result));
            if let Some(path) = &cli.save_export {
                match controller.download_export().await? {
                    Some(bytes) => {
                        tokio::fs::write(path, bytes).await?;
                        tracing::info!(path = %path.display(), "export saved");
                    }
                    None => tracing::warn!("the service produced no export artifact"),
                }
            }
        }
        // A single CLI invocation submits once, nothing can supersede it.
        SubmitOutcome::Superseded => {}
    }

    Ok(())
}

/// Paint the live progress bar while the view is in the progress state.
async fn paint_progress(mut updates: tokio::sync::watch::Receiver<View>) {
    let bar = ProgressBar::hidden();
    if let Ok(style) = ProgressStyle::default_bar()
        .template("{spinner:.green} [{bar:40.cyan/blue}] {pos}% {msg}")
    {
        bar.set_style(style.progress_chars("#>-"));
    }
    bar.set_length(100);

    let mut visible = false;
    while updates.changed().await.is_ok() {
        let view = updates.borrow_and_update().clone();
        match view {
            View::Progress(snapshot) => {
                if !visible {
                    bar.set_draw_target(indicatif::ProgressDrawTarget::stderr());
                    visible = true;
                }
                bar.set_position(u64::from(snapshot.percentage.min(100)));
                bar.set_message(format!(
                    "{} ({})",
                    snapshot.message,
                    render::eta_label(snapshot.eta_seconds)
                ));
            }
            _ => {
                if visible {
                    bar.finish_and_clear();
                    visible = false;
                }
            }
        }
    }
    if visible {
        bar.finish_and_clear();
    }
}
