// This is the primary entry point for the PhotoRevive CLI driver: it plays
// the role of the front end, feeding commands into the session dispatcher
// and rendering the events it emits.
// The lib.rs file serves only as a public API for external consumers.

use std::path::PathBuf;
use std::sync::Arc;

use anyhow::{Context, Result, anyhow, bail};
use clap::Parser;
use tokio::sync::mpsc;
use tracing::info;

use photorevive::utils::sniff_media_type;
use photorevive::{
    Command, ControllerConfig, EncodedImage, GeminiClient, OperationKind, SessionController,
    SessionEvent, UploadFile,
};

#[derive(Parser)]
#[command(name = "photorevive")]
#[command(about = "AI photo enhancement: colorize, upscale and retouch images", long_about = None)]
struct Cli {
    /// Image file to enhance
    image: PathBuf,

    /// Operation to run: colorize, upscale, beauty or custom
    #[arg(short, long, default_value = "colorize")]
    operation: OperationKind,

    /// Instruction text for the custom operation
    #[arg(short, long)]
    prompt: Option<String>,

    /// Write the enhanced image to this path
    #[arg(short, long)]
    save: Option<PathBuf>,

    /// Also produce the 4K download file
    #[arg(long)]
    download_4k: bool,

    /// Where the 4K file is written (defaults to the platform download directory)
    #[arg(long)]
    download_dir: Option<PathBuf>,
}

#[tokio::main]
async fn main() -> Result<()> {
    let subscriber = tracing_subscriber::fmt()
        .with_max_level(tracing::Level::INFO)
        .with_file(false)         // Remove file path
        .with_line_number(false)  // Remove line numbers
        .with_thread_ids(false)   // Remove thread IDs
        .with_thread_names(false) // Remove thread names
        .with_target(false)       // Remove module path
        .with_ansi(true)          // Keep colored output
        .with_writer(std::io::stdout)
        .compact();               // Use compact formatter instead of pretty

    subscriber.init();

    let cli = Cli::parse();

    if cli.operation == OperationKind::Custom
        && cli.prompt.as_deref().is_none_or(|p| p.trim().is_empty())
    {
        bail!("--prompt is required for the custom operation");
    }

    info!("=== PhotoRevive Starting ===");

    let bytes = tokio::fs::read(&cli.image)
        .await
        .with_context(|| format!("Failed to read {}", cli.image.display()))?;
    let media_type = sniff_media_type(&bytes).map(str::to_string).unwrap_or_else(|| {
        mime_guess::from_path(&cli.image)
            .first_or_octet_stream()
            .essence_str()
            .to_string()
    });
    let file = UploadFile {
        file_name: cli
            .image
            .file_name()
            .map(|n| n.to_string_lossy().to_string())
            .unwrap_or_else(|| "upload".to_string()),
        media_type,
        bytes,
    };

    let client = Arc::new(GeminiClient::from_env().context("Cannot reach the enhancement model")?);
    let mut config = ControllerConfig::default();
    if let Some(dir) = &cli.download_dir {
        config.download_dir = dir.clone();
    }

    let (events_tx, mut events) = mpsc::unbounded_channel();
    let controller = SessionController::new(client, config, events_tx);
    let commands = controller.commands();
    tokio::spawn(controller.run());

    let send = |command| {
        commands
            .send(command)
            .map_err(|_| anyhow!("The session dispatcher is gone"))
    };

    send(Command::SelectImage(file))?;
    if let Some(prompt) = &cli.prompt {
        send(Command::SetCustomInstruction(prompt.clone()))?;
    }
    send(Command::RequestOperation(cli.operation))?;

    while let Some(event) = events.recv().await {
        match event {
            SessionEvent::ProcessingStarted {
                title, description, ..
            } => {
                info!("{title}");
                info!("{description}");
            }
            SessionEvent::InputRejected { reason } => bail!("{reason}"),
            SessionEvent::ProcessingFailed { message } => bail!("{message}"),
            SessionEvent::ResultReady {
                label,
                original_path,
                enhanced_data_uri,
                ..
            } => {
                info!("Result ready ({label}); original preview at {original_path}");
                if let Some(path) = &cli.save {
                    let enhanced = EncodedImage::from_data_uri(&enhanced_data_uri)?;
                    tokio::fs::write(path, &enhanced.bytes)
                        .await
                        .with_context(|| format!("Failed to write {}", path.display()))?;
                    info!("Enhanced image written to {}", path.display());
                }
                if cli.download_4k {
                    send(Command::RequestDownload)?;
                } else {
                    break;
                }
            }
            SessionEvent::DownloadStarted => info!("Upscaling for 4K download..."),
            SessionEvent::DownloadFinished { path } => {
                info!("4K download written to {path}");
                break;
            }
            SessionEvent::DownloadFailed { message } => bail!("{message}"),
            _ => {}
        }
    }

    Ok(())
}
