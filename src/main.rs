use std::fs;
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use clap::{Parser, Subcommand};
use tracing::info;
use tracing_subscriber::EnvFilter;

use shopfront::auth::SessionManager;
use shopfront::config::ServerConfig;
use shopfront::server::{AppState, create_router};
use shopfront::service;
use shopfront::store::{SqliteStore, Store};

const SESSION_PURGE_INTERVAL: Duration = Duration::from_secs(60 * 60);

#[derive(Parser)]
#[command(name = "shopfront")]
#[command(about = "A small shop backend: users, items and carts", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Create the data directory and database schema
    Init {
        /// Data directory for the database and item images [env: DATA_DIR]
        #[arg(long)]
        data_dir: Option<String>,
    },

    /// Start the server
    Serve {
        /// Host to bind to [env: HOST]
        #[arg(long)]
        host: Option<String>,

        /// Port to bind to [env: PORT]
        #[arg(long, short)]
        port: Option<u16>,

        /// Data directory for the database and item images [env: DATA_DIR]
        #[arg(long)]
        data_dir: Option<String>,
    },
}

fn open_store(config: &ServerConfig) -> anyhow::Result<SqliteStore> {
    fs::create_dir_all(&config.data_dir)?;

    let db_path = config.db_path();
    if let Some(parent) = db_path.parent().filter(|p| !p.as_os_str().is_empty()) {
        fs::create_dir_all(parent)?;
    }

    let store = SqliteStore::new(&db_path)?;
    store.initialize()?;
    Ok(store)
}

fn run_init(mut config: ServerConfig, data_dir: Option<String>) -> anyhow::Result<()> {
    if let Some(data_dir) = data_dir {
        config.data_dir = PathBuf::from(data_dir);
    }

    open_store(&config)?;

    println!("Initialized database at {}", config.db_path().display());
    if config.secret_key.is_none() {
        println!("Set SECRET_KEY before running 'shopfront serve'.");
    }

    Ok(())
}

async fn run_serve(config: ServerConfig) -> anyhow::Result<()> {
    let sessions = SessionManager::new(config.require_secret_key()?, config.session_ttl_seconds)?;

    let store: Arc<dyn Store> = Arc::new(open_store(&config)?);
    info!("Using database {}", config.db_path().display());

    let purge_store = Arc::clone(&store);
    tokio::spawn(async move {
        let mut interval = tokio::time::interval(SESSION_PURGE_INTERVAL);
        loop {
            interval.tick().await;
            match service::auth::purge_expired_sessions(purge_store.as_ref()) {
                Ok(0) => {}
                Ok(n) => info!("Purged {n} expired sessions"),
                Err(e) => tracing::warn!("Failed to purge expired sessions: {e}"),
            }
        }
    });

    let state = Arc::new(AppState::new(store, &config.data_dir, sessions));

    let app = create_router(state);
    let addr = config.socket_addr()?;

    info!("Starting server on {}", addr);

    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app).await?;

    Ok(())
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env().add_directive("shopfront=info".parse()?))
        .init();

    let cli = Cli::parse();
    let mut config = ServerConfig::from_env()?;

    match cli.command {
        Commands::Init { data_dir } => {
            run_init(config, data_dir)?;
        }
        Commands::Serve {
            host,
            port,
            data_dir,
        } => {
            if let Some(host) = host {
                config.host = host;
            }
            if let Some(port) = port {
                config.port = port;
            }
            if let Some(data_dir) = data_dir {
                config.data_dir = PathBuf::from(data_dir);
            }

            run_serve(config).await?;
        }
    }

    Ok(())
}
