mod config;

use std::net::SocketAddr;
use std::sync::Arc;

use axum::{Router, extract::DefaultBodyLimit};
use clap::{Parser, Subcommand};
use tower_http::cors::CorsLayer;
use tower_http::services::ServeDir;
use tower_http::trace::TraceLayer;
use tracing::{info, warn};

use petal_api::auth::{AdminCredentials, AppStateInner};
use petal_media::{AnyObjectStore, HttpObjectStore, ImageUploader, LocalObjectStore};

use crate::config::{ServerConfig, StorageConfig};

#[derive(Parser)]
#[command(name = "petal")]
#[command(about = "Personal site backend: profile, notes, guestbook and image uploads")]
#[command(version)]
struct Cli {
    #[command(subcommand)]
    command: Option<Command>,
}

#[derive(Subcommand, Debug, PartialEq)]
enum Command {
    /// Serve the HTTP API (the default when no command is given)
    Serve,
    /// Print an argon2 hash for PETAL_ADMIN_PASSWORD_HASH
    HashPassword { password: String },
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    // Load .env if present
    let _ = dotenvy::dotenv();

    match cli.command.unwrap_or(Command::Serve) {
        Command::HashPassword { password } => {
            println!("{}", petal_api::auth::hash_password(&password)?);
            Ok(())
        }
        Command::Serve => serve().await,
    }
}

async fn serve() -> anyhow::Result<()> {
    // Init logging
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "petal=debug,petal_api=debug,petal_media=debug,tower_http=debug".into()),
        )
        .init();

    let config = ServerConfig::from_env()?;
    if config.admin_password_hash.is_none() {
        warn!("PETAL_ADMIN_PASSWORD_HASH is unset; admin login is disabled");
    }

    // Init database
    let db = Arc::new(petal_db::Database::open(&config.db_path)?);

    // Init object storage
    let (store, files_dir) = match &config.storage {
        StorageConfig::Local { dir, public_base_url } => {
            let store = LocalObjectStore::new(dir.clone(), public_base_url.clone()).await?;
            (AnyObjectStore::Local(store), Some(dir.clone()))
        }
        StorageConfig::Remote { endpoint, api_key } => {
            info!("Object storage endpoint: {}", endpoint);
            (AnyObjectStore::Http(HttpObjectStore::new(endpoint.clone(), api_key.clone())), None)
        }
    };

    let uploader = ImageUploader::new(Arc::new(store), db.clone(), config.bucket.clone());

    // Shared state
    let state = Arc::new(AppStateInner {
        db,
        jwt_secret: config.jwt_secret.clone(),
        admin: AdminCredentials {
            username: config.admin_username.clone(),
            password_hash: config.admin_password_hash.clone(),
        },
        uploader,
        default_cover_url: config.default_cover_url.clone(),
    });

    let mut app = Router::new().merge(petal_api::router(state));
    if let Some(dir) = files_dir {
        app = app.nest_service("/files", ServeDir::new(dir));
    }

    let app = app
        .layer(DefaultBodyLimit::max(config.max_upload_bytes))
        .layer(CorsLayer::permissive())
        .layer(TraceLayer::new_for_http());

    let addr: SocketAddr = format!("{}:{}", config.host, config.port).parse()?;
    info!("Petal server listening on {}", addr);

    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    Ok(())
}

async fn shutdown_signal() {
    let ctrl_c = tokio::signal::ctrl_c();
    #[cfg(unix)]
    {
        let mut sigterm =
            match tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate()) {
                Ok(s) => s,
                Err(e) => {
                    warn!("Failed to install SIGTERM handler: {}", e);
                    ctrl_c.await.ok();
                    info!("Received Ctrl+C, shutting down...");
                    return;
                }
            };
        tokio::select! {
            _ = ctrl_c => info!("Received Ctrl+C, shutting down..."),
            _ = sigterm.recv() => info!("Received SIGTERM, shutting down..."),
        }
    }
    #[cfg(not(unix))]
    {
        ctrl_c.await.ok();
        info!("Received Ctrl+C, shutting down...");
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn no_command_serves() {
        let cli = Cli::try_parse_from(["petal"]).unwrap();
        assert_eq!(cli.command, None);
        let cli = Cli::try_parse_from(["petal", "serve"]).unwrap();
        assert_eq!(cli.command, Some(Command::Serve));
    }

    #[test]
    fn hash_password_takes_the_password() {
        let cli = Cli::try_parse_from(["petal", "hash-password", "hunter2"]).unwrap();
        assert_eq!(
            cli.command,
            Some(Command::HashPassword {
                password: "hunter2".to_string()
            })
        );
        assert!(Cli::try_parse_from(["petal", "hash-password"]).is_err());
    }

    #[test]
    fn unknown_command_is_rejected() {
        assert!(Cli::try_parse_from(["petal", "hash-pasword", "secret"]).is_err());
        assert!(Cli::try_parse_from(["petal", "--port", "80"]).is_err());
    }

    #[test]
    fn cli_definition_is_consistent() {
        use clap::CommandFactory;
        Cli::command().debug_assert();
    }
}
