//! plq-an - Playlist uniqueness analyzer
//!
//! `plq-an serve` runs the HTTP API; `plq-an analyze <playlist_id>` scores one
//! playlist and prints the component breakdown.

use std::path::PathBuf;
use std::sync::Arc;

use anyhow::{anyhow, Context, Result};
use clap::{Parser, Subcommand};
use plq_common::config::{load_toml_config, RootFolderInitializer, RootFolderResolver};
use plq_common::time::secs_to_duration;
use tracing::info;
use uuid::Uuid;

use plq_an::services::AnalysisService;
use plq_an::spotify::{is_valid_spotify_id, SpotifyClient};
use plq_an::{build_router, logging, AppState};

#[derive(Parser, Debug)]
#[command(name = "plq-an", version, about = "Playlist uniqueness analyzer")]
struct Args {
    /// Root folder holding the database
    #[arg(short, long, global = true)]
    root_folder: Option<PathBuf>,

    /// Config file (defaults to $PLQ_CONFIG, then ~/.config/plq/config.toml)
    #[arg(short, long, global = true)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Option<Command>,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Run the HTTP API (default)
    Serve {
        /// Listen address, overrides [server] bind_address
        #[arg(short, long)]
        bind: Option<String>,
    },
    /// Score one playlist and print the breakdown as JSON
    Analyze {
        /// 22-character Spotify playlist id
        playlist_id: String,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();

    let log_filter = logging::init();

    let config = load_toml_config(args.config.as_deref())?;
    log_filter.apply_config_level(&config.logging.level)?;

    info!(
        "Starting plq-an v{} [{}] built {} ({})",
        env!("CARGO_PKG_VERSION"),
        env!("GIT_HASH"),
        env!("BUILD_TIMESTAMP"),
        env!("BUILD_PROFILE")
    );

    config.validate()?;

    let root_folder = RootFolderResolver::new("analyzer")
        .with_cli_arg(args.root_folder)
        .with_toml_config(&config)
        .resolve();
    let initializer = RootFolderInitializer::new(root_folder);
    initializer
        .ensure_directory_exists()
        .map_err(|e| anyhow!("Failed to initialize root folder: {}", e))?;

    let db_path = initializer.database_path();
    if initializer.database_exists() {
        info!("Database: {}", db_path.display());
    } else {
        info!("Creating new database: {}", db_path.display());
    }
    let db_pool = plq_an::db::init_database_pool(&db_path).await?;

    let credentials = plq_an::config::resolve_spotify_credentials(&config)?;
    let client = SpotifyClient::new(
        credentials,
        secs_to_duration(config.analysis.rate_limit_wait_secs),
    )?;

    let service = Arc::new(AnalysisService::new(
        db_pool.clone(),
        Arc::new(client),
        config.analysis.clone(),
        config.weights.clone(),
    ));

    match args.command.unwrap_or(Command::Serve { bind: None }) {
        Command::Serve { bind } => {
            let revoked = plq_an::db::analyses::revoke_unfinished(&db_pool).await?;
            if revoked > 0 {
                info!("Revoked {} analyses left unfinished by a previous run", revoked);
            }

            let state = AppState::new(db_pool, service);
            let app = build_router(state, &config.server.cors_origin);

            let bind_address = bind.unwrap_or_else(|| config.server.bind_address.clone());
            let listener = tokio::net::TcpListener::bind(&bind_address)
                .await
                .with_context(|| format!("Failed to bind {}", bind_address))?;
            info!("Listening on http://{}", bind_address);
            info!("Health check: http://{}/health", bind_address);

            axum::serve(listener, app)
                .with_graceful_shutdown(shutdown_signal())
                .await?;
            info!("Shutdown complete");
        }
        Command::Analyze { playlist_id } => {
            if !is_valid_spotify_id(&playlist_id) {
                return Err(anyhow!(
                    "'{}' is not a 22-character base-62 playlist id",
                    playlist_id
                ));
            }

            let version = service.playlist_info(&playlist_id).await?;
            info!(
                "Analyzing '{}' ({} tracks, snapshot {})",
                version.name, version.tracks_count, version.snapshot_id
            );

            let outcome = service
                .analyze_playlist(&playlist_id, version.version_id, Uuid::new_v4())
                .await?;
            println!("{}", serde_json::to_string_pretty(&outcome)?);
        }
    }

    Ok(())
}

async fn shutdown_signal() {
    match tokio::signal::ctrl_c().await {
        Ok(()) => info!("Shutdown signal received"),
        Err(e) => {
            tracing::error!("Failed to listen for shutdown signal: {}", e);
            std::future::pending::<()>().await;
        }
    }
}
