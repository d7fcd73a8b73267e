//! catalyst-api - project tracker and meeting-to-tickets service
//!
//! Serves CRUD for projects, users, labels, cycles, modules and tickets, and
//! turns meeting transcripts into tickets through the agent pipeline.

use anyhow::{Context, Result};
use catalyst_common::config::{
    default_config_path, load_toml_config, read_toml_config, CompiledDefaults, RootFolderInitializer,
    RootFolderResolver,
};
use clap::Parser;
use std::net::SocketAddr;
use std::path::PathBuf;
use std::sync::Arc;
use tokio::signal;
use tracing::{error, info};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use catalyst_api::config::ServiceConfig;
use catalyst_api::services::{ChatCompletionClient, NotesClient, SpeechClient};
use catalyst_api::storage::SqliteStorage;
use catalyst_api::AppState;

/// Command-line arguments for catalyst-api
#[derive(Parser, Debug)]
#[command(name = "catalyst-api")]
#[command(about = "Project tracker with meeting-to-tickets automation")]
#[command(version)]
struct Args {
    /// Port to listen on
    #[arg(short, long, env = "CATALYST_PORT")]
    port: Option<u16>,

    /// Folder holding the database (overrides CATALYST_ROOT_FOLDER and TOML)
    #[arg(short, long)]
    root_folder: Option<PathBuf>,

    /// TOML config file (default: ~/.config/catalyst/config.toml)
    #[arg(short, long, env = "CATALYST_CONFIG")]
    config: Option<PathBuf>,
}

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();

    // Log level comes from the config file, so peek at it before tracing exists
    let log_level = args
        .config
        .clone()
        .or_else(default_config_path)
        .and_then(|path| read_toml_config(&path).ok())
        .map(|config| config.logging.level)
        .unwrap_or_else(|| CompiledDefaults::for_current_platform().log_level);

    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env().unwrap_or_else(|_| {
                format!(
                    "catalyst_api={level},catalyst_common={level},tower_http={level}",
                    level = log_level
                )
                .into()
            }),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    info!(
        "Starting catalyst-api v{} [{}] built {} ({})",
        env!("CARGO_PKG_VERSION"),
        env!("GIT_HASH"),
        env!("BUILD_TIMESTAMP"),
        env!("BUILD_PROFILE")
    );

    let toml_config = load_toml_config(args.config.as_deref());

    // Root folder: CLI → ENV → TOML → compiled default
    let root_folder = RootFolderResolver::new("catalyst-api")
        .with_cli_arg(args.root_folder.clone())
        .with_toml_root(toml_config.root_folder.clone())
        .resolve();

    let initializer = RootFolderInitializer::new(root_folder);
    initializer
        .ensure_directory_exists()
        .context("Failed to initialize root folder")?;

    let db_path = initializer.database_path();
    info!("Database: {}", db_path.display());

    let pool = catalyst_common::db::init_database(&db_path)
        .await
        .context("Failed to open database")?;
    info!("Database connection established");

    let service_config = ServiceConfig::resolve(&toml_config);
    let llm = ChatCompletionClient::new(&service_config.llm).context("Failed to build LLM client")?;
    let speech = SpeechClient::new(&service_config.speech).context("Failed to build speech client")?;
    let notes = NotesClient::new(&service_config.notes).context("Failed to build notes client")?;

    let state = AppState::new(
        Arc::new(SqliteStorage::new(pool)),
        Arc::new(llm),
        speech,
        notes,
        service_config,
    );
    let app = catalyst_api::build_router(state);

    let port = args
        .port
        .or(toml_config.port)
        .unwrap_or(CompiledDefaults::for_current_platform().port);
    let addr = SocketAddr::from(([0, 0, 0, 0], port));

    let listener = tokio::net::TcpListener::bind(addr)
        .await
        .with_context(|| format!("Failed to bind to {}", addr))?;
    info!("Listening on http://{}", addr);
    info!("Health check: http://{}/health", addr);

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await
        .context("Server error")?;

    info!("Server shutdown complete");
    Ok(())
}

/// Resolves on Ctrl+C or SIGTERM
async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = signal::ctrl_c().await {
            error!("Failed to listen for Ctrl+C: {}", e);
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match signal::unix::signal(signal::unix::SignalKind::terminate()) {
            Ok(mut stream) => {
                stream.recv().await;
            }
            Err(e) => {
                error!("Failed to install SIGTERM handler: {}", e);
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => info!("Received Ctrl+C, shutting down"),
        _ = terminate => info!("Received SIGTERM, shutting down"),
    }
}
