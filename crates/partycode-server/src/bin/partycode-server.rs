//! Party Code Server
//!
//! HTTP service that maps short party codes to peer ids.
//!
//! # Usage
//!
//! ```bash
//! # In-memory mode (default)
//! partycode-server --port 8000
//!
//! # With SQLite persistence
//! partycode-server --port 8000 --db /var/lib/partycode/codes.db
//! ```

use std::net::IpAddr;
use std::path::PathBuf;
use std::sync::Arc;

use anyhow::Context;
use clap::Parser;
use tracing::{info, Level, Subscriber};
use tracing_subscriber::fmt::{self, MakeWriter};
use tracing_subscriber::{prelude::*, EnvFilter};

use partycode_core::Config;
use partycode_server::{serve, MemoryStore, Registry, SqliteStore};

#[derive(Parser, Debug)]
#[command(name = "partycode-server")]
#[command(about = "Party code service for peer rendezvous")]
#[command(version)]
struct Args {
    /// Configuration file (defaults to the platform config directory)
    #[arg(short, long, env = "PARTYCODE_CONFIG")]
    config: Option<PathBuf>,

    /// Port to listen on
    #[arg(short, long, env = "PARTYCODE_PORT")]
    port: Option<u16>,

    /// Bind address
    #[arg(short, long, env = "PARTYCODE_BIND")]
    bind: Option<IpAddr>,

    /// SQLite database path for persistence (in-memory if not specified)
    #[arg(short, long, env = "PARTYCODE_DB")]
    db: Option<PathBuf>,

    /// Log as JSON lines
    #[arg(long)]
    log_json: bool,

    /// Print a sample configuration file and exit
    #[arg(long)]
    print_config: bool,
}

impl Args {
    /// Command-line values take precedence over the config file
    fn apply(&self, config: &mut Config) {
        if let Some(port) = self.port {
            config.server.port = port;
        }
        if let Some(bind) = self.bind {
            config.server.bind = bind;
        }
        if let Some(db) = &self.db {
            config.server.db_path = Some(db.clone());
        }
        if self.log_json {
            config.logging.json = true;
        }
    }
}

fn env_filter() -> EnvFilter {
    EnvFilter::builder()
        .with_default_directive(Level::INFO.into())
        .from_env_lossy()
}

/// Plain subscriber used while the config that selects the real one loads
fn bootstrap_subscriber<W>(writer: W) -> impl Subscriber + Send + Sync
where
    W: for<'a> MakeWriter<'a> + Send + Sync + 'static,
{
    fmt::fmt().with_writer(writer).with_env_filter(env_filter()).finish()
}

fn load_config(args: &Args) -> anyhow::Result<Config> {
    let mut config = match &args.config {
        Some(path) => Config::load_from(path)
            .with_context(|| format!("loading config from {:?}", path))?,
        None => Config::load(),
    };
    args.apply(&mut config);
    Ok(config)
}

fn init_logging(json: bool) {
    let filter = env_filter();

    if json {
        tracing_subscriber::registry()
            .with(fmt::layer().json())
            .with(filter)
            .init();
    } else {
        tracing_subscriber::registry()
            .with(fmt::layer())
            .with(filter)
            .init();
    }
}

fn open_registry(config: &Config) -> anyhow::Result<Registry> {
    match &config.server.db_path {
        Some(db_path) => {
            if let Some(parent) = db_path.parent() {
                std::fs::create_dir_all(parent)
                    .with_context(|| format!("creating database directory {:?}", parent))?;
            }
            info!("Using SQLite persistence: {:?}", db_path);
            let store = SqliteStore::open(db_path)
                .with_context(|| format!("opening database {:?}", db_path))?;
            Ok(Registry::new(store))
        }
        None => {
            info!("Using in-memory storage (no persistence)");
            Ok(Registry::new(MemoryStore::new()))
        }
    }
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let args = Args::parse();

    if args.print_config {
        print!("{}", Config::sample());
        return Ok(());
    }

    let config = tracing::subscriber::with_default(bootstrap_subscriber(std::io::stderr), || {
        load_config(&args)
    })?;

    init_logging(config.logging.json);

    info!("Starting party code server");

    let registry = Arc::new(open_registry(&config)?);
    info!("Loaded {} party codes from storage", registry.live_count()?);

    serve(registry.clone(), config.server.socket_addr()).await?;

    drop(registry);
    info!("Storage closed, exiting");
    Ok(())
}
