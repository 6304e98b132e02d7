mod api;
mod config;
mod pokedex;
mod server;
mod store;
mod util;

use anyhow::Context;
use clap::Parser;
use std::fs::OpenOptions;
use std::path::PathBuf;
use std::sync::Mutex;
use tracing::info;

use api::{AppState, Uploads};
use config::{Config, LogConfig};
use pokedex::PokedexSource;
use server::Server;
use store::ItemStore;

/// Pokedex lookup and item store HTTP service
#[derive(Debug, Parser)]
#[command(name = "pokedex-service", version)]
struct Args {
  /// Path to an INI configuration file
  #[arg(short, long)]
  config: Option<String>,

  /// Listening address, overrides [server] addr
  #[arg(long)]
  addr: Option<String>,

  /// Item file, overrides [store] items_file
  #[arg(long)]
  items_file: Option<PathBuf>,

  /// Saved pokedex page, overrides [pokedex] url/file
  #[arg(long)]
  pokedex_file: Option<PathBuf>,
}

impl Args {
  fn into_config(self) -> anyhow::Result<Config> {
    let mut config = match &self.config {
      Some(path) => Config::from_file(path)?,
      None => Config::default(),
    };

    if let Some(addr) = &self.addr {
      config.set_server_addr(addr)?;
    }
    if let Some(items_file) = self.items_file {
      config.items_file = items_file;
    }
    if let Some(pokedex_file) = self.pokedex_file {
      config.pokedex = PokedexSource::File(pokedex_file);
    }
    Ok(config)
  }
}

/// Initialize logging; RUST_LOG wins over the configured level
fn init_logging(log: &LogConfig) -> anyhow::Result<()> {
  let filter = tracing_subscriber::EnvFilter::try_from_default_env()
    .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(&log.level));
  let builder = tracing_subscriber::fmt()
    .with_env_filter(filter)
    .with_target(true)
    .with_thread_ids(true);

  match &log.file {
    Some(path) => {
      let file = OpenOptions::new()
        .create(true)
        .append(true)
        .open(path)
        .with_context(|| format!("failed to open log file '{}'", path.display()))?;
      builder.with_ansi(false).with_writer(Mutex::new(file)).init();
    }
    None => builder.init(),
  }
  Ok(())
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
  let config = Args::parse().into_config()?;
  init_logging(&config.log)?;

  info!("Starting pokedex-service");
  info!("Version: {}", env!("CARGO_PKG_VERSION"));

  let pokedex = pokedex::load_pokedex(&config.pokedex)
    .await
    .with_context(|| format!("failed to load pokedex from {}", config.pokedex))?;
  let store = ItemStore::load(&config.items_file)
    .with_context(|| format!("failed to load items from {}", config.items_file.display()))?;
  let uploads = Uploads::new(&config.upload_dir).reserve(&config.items_file);

  let state = AppState::new(pokedex, store, uploads);
  let server = Server::bind(config.server_addr, state)
    .await
    .with_context(|| format!("failed to bind {}", config.server_addr))?;
  info!("Server listening on: {}", server.local_addr());

  server.run().await?;
  Ok(())
}
