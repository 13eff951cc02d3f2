//! quizbank-ingest - Question bank ingestion service
//!
//! **Module Identity:**
//! - Name: quizbank-ingest
//! - Port: 5731 (default)
//!
//! Serves the import API over HTTP, or runs a single validation or import
//! from a JSON file and prints the result.

use std::net::SocketAddr;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use tokio::signal;
use tracing::info;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use quizbank_common::config::{load_toml_config, RootFolderInitializer, RootFolderResolver, TomlConfig};
use quizbank_common::db::init_database;
use quizbank_ingest::models::RawRecord;
use quizbank_ingest::services::{BatchImporter, MediaResolver};
use quizbank_ingest::AppState;

/// Command-line arguments for quizbank-ingest
#[derive(Parser, Debug)]
#[command(name = "quizbank-ingest")]
#[command(about = "Question bank ingestion service")]
#[command(version)]
struct Args {
    /// Root folder holding the database and stored images
    #[arg(short, long, global = true, env = "QUIZBANK_ROOT_FOLDER")]
    root_folder: Option<PathBuf>,

    /// Configuration file (defaults to the platform config directory)
    #[arg(short, long, global = true)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Option<Command>,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Run the HTTP service (default)
    Serve {
        /// Address to bind
        #[arg(long, default_value = "127.0.0.1", env = "QUIZBANK_HOST")]
        host: String,

        /// Port to listen on
        #[arg(short, long, default_value = "5731", env = "QUIZBANK_PORT")]
        port: u16,
    },

    /// Validate a JSON file of question records without importing
    Validate {
        /// JSON array of records, or an object with a `questions` array
        file: PathBuf,
    },

    /// Import a JSON file of question records
    Import {
        /// JSON array of records, or an object with a `questions` array
        file: PathBuf,

        /// Content-owner tag applied to every record
        #[arg(long, default_value = "MES")]
        created_by: String,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();
    let config = load_toml_config(args.config.as_deref());

    // RUST_LOG wins over the configured level
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| config.logging.level.clone().into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    let command = args.command.unwrap_or(Command::Serve {
        host: "127.0.0.1".to_string(),
        port: 5731,
    });

    if let Command::Validate { file } = &command {
        return validate_file(file);
    }

    // Step 1: Resolve root folder (CLI > ENV > TOML > default)
    let root_folder = RootFolderResolver::new(args.root_folder, &config).resolve();

    // Step 2: Create root folder and media directory if missing
    let initializer = RootFolderInitializer::new(root_folder);
    initializer
        .ensure_directory_exists()
        .context("Failed to initialize root folder")?;
    info!("Root folder: {}", initializer.root_folder().display());

    // Step 3: Open or create database
    let db_path = initializer.database_path();
    let db = init_database(&db_path)
        .await
        .with_context(|| format!("Failed to open database {}", db_path.display()))?;
    info!("Database: {}", db_path.display());

    let media = MediaResolver::with_defaults(initializer.media_path(), &config.media)
        .context("Failed to build media resolver")?;

    match command {
        Command::Serve { host, port } => serve(db, media, &config, &host, port).await,
        Command::Import { file, created_by } => {
            let importer = BatchImporter::new(db, media.into(), config.import.max_report_errors);
            import_file(&importer, &file, &created_by).await
        }
        Command::Validate { .. } => Ok(()),
    }
}

async fn serve(
    db: sqlx::SqlitePool,
    media: MediaResolver,
    config: &TomlConfig,
    host: &str,
    port: u16,
) -> Result<()> {
    info!("Starting quizbank-ingest");
    info!("Version: {}", env!("CARGO_PKG_VERSION"));
    info!(
        "Build: {} ({}, {})",
        env!("GIT_HASH"),
        env!("BUILD_PROFILE"),
        env!("BUILD_TIMESTAMP")
    );

    let state = AppState::new(db, media, config.import.max_report_errors);
    let app = quizbank_ingest::build_router(state);

    let addr: SocketAddr = format!("{}:{}", host, port)
        .parse()
        .with_context(|| format!("Invalid listen address {}:{}", host, port))?;

    let listener = tokio::net::TcpListener::bind(addr)
        .await
        .context("Failed to bind to address")?;
    info!("Listening on http://{}", addr);
    info!("Health check: http://{}/health", addr);

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await
        .context("Server error")?;

    info!("Server shutdown complete");
    Ok(())
}

/// Read records from a JSON file: a bare array or `{"questions": [...]}`
fn read_records(path: &Path) -> Result<Vec<RawRecord>> {
    let text = std::fs::read_to_string(path)
        .with_context(|| format!("Failed to read {}", path.display()))?;
    let value: serde_json::Value =
        serde_json::from_str(&text).with_context(|| format!("Invalid JSON in {}", path.display()))?;

    let records = match value {
        serde_json::Value::Object(mut map) => map
            .remove("questions")
            .context("Expected an array or an object with a \"questions\" array")?,
        other => other,
    };

    serde_json::from_value(records).context("Records must be JSON objects")
}

fn validate_file(path: &Path) -> Result<()> {
    let records = read_records(path)?;
    let report = quizbank_ingest::services::validate_batch(
        &quizbank_ingest::services::normalize_all(&records),
    );

    println!("{}", serde_json::to_string_pretty(&report)?);
    Ok(())
}

async fn import_file(importer: &BatchImporter, path: &Path, created_by: &str) -> Result<()> {
    let records = read_records(path)?;
    let report = importer.import(&records, Some(created_by)).await?;

    println!("{}", serde_json::to_string_pretty(&report)?);
    Ok(())
}

/// Graceful shutdown signal handler
async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = signal::ctrl_c().await {
            tracing::warn!(error = %e, "Failed to listen for Ctrl+C");
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match signal::unix::signal(signal::unix::SignalKind::terminate()) {
            Ok(mut sig) => {
                sig.recv().await;
            }
            Err(e) => {
                tracing::warn!(error = %e, "Failed to install SIGTERM handler");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {
            info!("Received Ctrl+C, shutting down");
        },
        _ = terminate => {
            info!("Received terminate signal, shutting down");
        },
    }
}
