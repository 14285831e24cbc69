use std::path::PathBuf;

use chrono::Local;
use posture_coach::coordinator::{Command, CoordinatorBuilder, SessionCoordinator, SessionUpdate};
use posture_coach::pose::PoseLandmarks;
use posture_coach::samples::PostureLabel;
use posture_coach::session::Feedback;
use posture_coach::{AppError, Configuration};
use serde::Deserialize;
use tokio::io::{AsyncBufReadExt, AsyncWriteExt, BufReader};
use tokio::sync::mpsc::Receiver;
use tracing::{Level, error, info, warn};

/// One line of driver input on stdin.
#[derive(Debug, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
enum DriverInput {
    Frame { landmarks: Option<PoseLandmarks> },
    StartBatch { label: PostureLabel },
    Cancel,
    Train,
    Evaluate,
    Export { path: Option<String> },
    Import { path: String },
    Clear,
}

fn init_logging() {
    tracing_subscriber::fmt()
        .with_max_level(Level::INFO)
        .with_writer(std::io::stderr)
        .init();
}

fn default_export_name() -> String {
    format!("houding-data_{}.json", Local::now().format("%Y-%m-%d"))
}

async fn write_line(line: &str) -> Result<(), AppError> {
    let mut stdout = tokio::io::stdout();
    stdout.write_all(line.as_bytes()).await?;
    stdout.write_all(b"\n").await?;
    stdout.flush().await?;
    Ok(())
}

async fn emit(update: &SessionUpdate) -> Result<(), AppError> {
    write_line(&serde_json::to_string(update)?).await
}

/// Prints updates as JSON lines; export snapshots go to disk instead.
async fn print_updates(mut updates: Receiver<SessionUpdate>) -> Result<(), AppError> {
    while let Some(update) = updates.recv().await {
        match update {
            SessionUpdate::Exported {
                destination,
                snapshot,
            } => {
                let path = PathBuf::from(destination.unwrap_or_else(default_export_name));
                let feedback = match tokio::fs::write(&path, snapshot).await {
                    Ok(()) => {
                        info!("Snapshot written to {}", path.display());
                        Feedback::good(format!("Data exported to {}.", path.display()))
                    }
                    Err(e) => Feedback::from(&AppError::Io(e)),
                };
                emit(&SessionUpdate::Feedback(feedback)).await?;
            }
            update => emit(&update).await?,
        }
    }
    Ok(())
}

async fn dispatch(coordinator: &SessionCoordinator, input: DriverInput) -> Result<(), AppError> {
    match input {
        DriverInput::Frame { landmarks } => coordinator.send_frame(landmarks).await,
        DriverInput::StartBatch { label } => {
            coordinator
                .send_command(Command::StartBatch { label })
                .await
        }
        DriverInput::Cancel => coordinator.send_command(Command::Cancel).await,
        DriverInput::Train => coordinator.send_command(Command::Train).await,
        DriverInput::Evaluate => coordinator.send_command(Command::Evaluate).await,
        DriverInput::Export { path } => {
            coordinator
                .send_command(Command::Export { destination: path })
                .await
        }
        DriverInput::Import { path } => match tokio::fs::read_to_string(&path).await {
            Ok(snapshot) => {
                coordinator
                    .send_command(Command::Import { snapshot })
                    .await
            }
            Err(e) => {
                warn!("Could not read {}: {}", path, e);
                emit(&SessionUpdate::Feedback(Feedback::from(&AppError::Io(e)))).await
            }
        },
        DriverInput::Clear => coordinator.send_command(Command::Clear).await,
    }
}

#[tokio::main]
async fn main() -> Result<(), AppError> {
    init_logging();

    let config_path = std::env::args().nth(1);
    let configuration = Configuration::load(config_path.as_deref())?;
    info!("Loaded configuration: {:?}", configuration);

    let (coordinator, updates) = CoordinatorBuilder::new(configuration).build()?;
    info!("Session {} ready, reading frames from stdin", coordinator.id());
    let printer = tokio::spawn(print_updates(updates));

    let mut lines = BufReader::new(tokio::io::stdin()).lines();
    while let Some(line) = lines.next_line().await? {
        let line = line.trim();
        if line.is_empty() {
            continue;
        }
        match serde_json::from_str::<DriverInput>(line) {
            Ok(input) => dispatch(&coordinator, input).await?,
            Err(e) => warn!("Ignoring malformed input line: {}", e),
        }
    }

    info!("Input closed, shutting down");
    coordinator.shutdown().await;
    match printer.await {
        Ok(result) => result,
        Err(e) => {
            error!("Update printer failed: {}", e);
            Ok(())
        }
    }
}
