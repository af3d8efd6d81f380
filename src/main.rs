use std::{io::Read, path::PathBuf};

use backup_events::{
    BackupEventHandler, BackupEventsConfig, HandlerError, Notification, observability,
};
use clap::Parser;

/// CLI arguments for the backup event handlers
#[derive(Parser, Debug)]
#[command(version, about = "AWS Backup copy and retention handlers", long_about = None)]
struct Args {
    #[command(subcommand)]
    command: Command,

    /// Path to config file (defaults to the BACKUP_VAULT_NAME, COPY_ROLE_ARN,
    /// DESTINATION_BACKUP_VAULT_ARN and NEW_DELETE_AFTER_DAYS environment variables)
    #[arg(short, long, global = true)]
    config: Option<PathBuf>,
}

#[derive(clap::Subcommand, Debug)]
enum Command {
    /// Start a copy of the recovery point a backup job created
    Copy {
        /// Notification JSON file (defaults to stdin)
        #[arg(short, long)]
        event: Option<PathBuf>,
    },
    /// Shorten the retention of the original a copy job was made from
    UpdateLifecycle {
        /// Notification JSON file (defaults to stdin)
        #[arg(short, long)]
        event: Option<PathBuf>,
    },
}

impl Command {
    fn event(&self) -> Option<&PathBuf> {
        match self {
            Command::Copy { event } | Command::UpdateLifecycle { event } => event.as_ref(),
        }
    }
}

#[tokio::main]
async fn main() {
    let args = Args::parse();

    let config = match &args.config {
        Some(path) => BackupEventsConfig::from_file(path),
        None => BackupEventsConfig::from_env(),
    };
    let config = match config {
        Ok(config) => config,
        Err(e) => {
            eprintln!("Failed to load configuration: {}", e);
            std::process::exit(1);
        }
    };

    if let Err(e) = observability::init_tracing(&config.observability.logging) {
        eprintln!("{}", e);
        std::process::exit(1);
    }

    let notification = match read_notification(args.command.event()) {
        Ok(notification) => notification,
        Err(e) => {
            tracing::error!(error = %e, "Failed to read notification");
            std::process::exit(1);
        }
    };

    let handler = BackupEventHandler::from_config(&config.backup).await;

    let result = match &args.command {
        Command::Copy { .. } => handler.copy(&notification).await,
        Command::UpdateLifecycle { .. } => handler.update_lifecycle(&notification).await,
    };

    match result {
        Ok(Some(response)) => {
            println!("{}", response.to_value());
        }
        Ok(None) => {}
        Err(HandlerError::UnexpectedRecoveryPoint { expected, actual }) => {
            tracing::error!(%expected, %actual, "Notification does not match the command");
            std::process::exit(1);
        }
        // Already logged as an EXCEPTION record
        Err(HandlerError::Action(_)) => std::process::exit(1),
    }
}

#[derive(Debug, thiserror::Error)]
enum ReadError {
    #[error("Failed to read {1}: {0}")]
    Io(std::io::Error, String),

    #[error("Invalid notification JSON: {0}")]
    Json(#[from] serde_json::Error),
}

fn read_notification(path: Option<&PathBuf>) -> Result<Notification, ReadError> {
    let contents = match path {
        Some(path) => std::fs::read_to_string(path)
            .map_err(|e| ReadError::Io(e, path.display().to_string()))?,
        None => {
            let mut contents = String::new();
            std::io::stdin()
                .read_to_string(&mut contents)
                .map_err(|e| ReadError::Io(e, "stdin".to_string()))?;
            contents
        }
    };

    Ok(serde_json::from_str(&contents)?)
}
