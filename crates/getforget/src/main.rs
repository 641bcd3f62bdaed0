//! getforget daemon - HTTP memory service with background forgetting

use std::path::PathBuf;
use std::sync::Arc;

use clap::{Parser, Subcommand};
use tracing_subscriber::{EnvFilter, layer::SubscriberExt, util::SubscriberInitExt};

use getforget::config::Config;
use getforget::error::Result;
use getforget::memory::{Forgetter, MemoryStore, RandomSource, SeededRandom, SystemClock, ThreadRandom};
use getforget::server::MemoryServer;
use getforget::service::MemoryService;

/// getforget - A chat memory that forgets what stops mattering
#[derive(Parser)]
#[command(name = "getforget")]
#[command(about = "A volatile associative memory that forgets stale keywords")]
#[command(version)]
pub struct Cli {
    /// Path to config file
    #[arg(long, short = 'c', global = true)]
    pub config: Option<PathBuf>,

    #[command(subcommand)]
    pub command: Option<Command>,
}

#[derive(Subcommand)]
pub enum Command {
    /// Start the memory server (default command)
    #[command(name = "serve")]
    Serve,
}

#[tokio::main]
async fn main() {
    if let Err(e) = run().await {
        eprintln!("Error: {e}");
        std::process::exit(1);
    }
}

async fn run() -> Result<()> {
    init_logging();

    let cli = Cli::parse();

    match cli.command {
        None | Some(Command::Serve) => serve(cli.config).await,
    }
}

fn init_logging() {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new("info,getforget=debug"));

    tracing_subscriber::registry()
        .with(filter)
        .with(tracing_subscriber::fmt::layer())
        .init();
}

async fn serve(config_path: Option<PathBuf>) -> Result<()> {
    tracing::info!("Starting getforget daemon");

    let config = Config::load(config_path.as_deref())?;
    tracing::debug!("Config loaded: {:?}", config);

    let random: Arc<dyn RandomSource> = match config.memory.seed {
        Some(seed) => {
            tracing::info!("Using seeded randomness (seed={seed})");
            Arc::new(SeededRandom::new(seed))
        }
        None => Arc::new(ThreadRandom),
    };

    let store = Arc::new(
        MemoryStore::new()
            .with_clock(Arc::new(SystemClock))
            .with_random(random.clone())
            .with_importance_range(
                config.memory.min_base_importance,
                config.memory.max_base_importance,
            ),
    );

    let service = MemoryService::from_config(&config, store.clone(), random.clone());
    let forgetter = Forgetter::new(store)
        .with_model(service.model())
        .with_random(random)
        .with_events(service.events());

    tracing::info!(
        "Memory initialized (tau={}h, tokenizer={:?})",
        config.memory.decay_hours,
        config.tokenizer.strategy
    );

    let server = MemoryServer::new(
        config.server.clone(),
        config.forgetting.clone(),
        Arc::new(service),
        Arc::new(forgetter),
    );
    server.serve().await?;

    tracing::info!("getforget daemon stopped");
    Ok(())
}
