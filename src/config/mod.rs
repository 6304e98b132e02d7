use configparser::ini::Ini;
use std::net::SocketAddr;
use std::path::PathBuf;
use thiserror::Error;

use crate::pokedex::PokedexSource;

const DEFAULT_SERVER_ADDR: &str = "127.0.0.1:8000";
const DEFAULT_POKEDEX_URL: &str = "https://pokemondb.net/pokedex/all";
const DEFAULT_ITEMS_FILE: &str = "item.json";

/// Errors raised while loading configuration
#[derive(Debug, Error)]
pub enum ConfigError {
  #[error("failed to read config file '{path}': {reason}")]
  Read { path: String, reason: String },

  #[error("invalid server address '{0}'")]
  InvalidAddr(String),
}

/// Log configuration
#[derive(Debug, Clone, PartialEq)]
pub struct LogConfig {
  /// Log file path, if not set, logs will be printed to stdout
  pub file: Option<PathBuf>,
  /// Log level, default is "info"
  pub level: String,
}

impl Default for LogConfig {
  fn default() -> Self {
    Self {
      file: None,
      level: "info".to_string(),
    }
  }
}

/// Service configuration
#[derive(Debug, Clone, PartialEq)]
pub struct Config {
  /// HTTP listening address
  pub server_addr: SocketAddr,
  /// Directory receiving uploaded files
  pub upload_dir: PathBuf,
  /// JSON file backing the item store
  pub items_file: PathBuf,
  /// Where the pokedex table is scraped from
  pub pokedex: PokedexSource,
  /// Log configuration
  pub log: LogConfig,
}

impl Default for Config {
  fn default() -> Self {
    Self {
      server_addr: DEFAULT_SERVER_ADDR
        .parse()
        .unwrap_or_else(|_| SocketAddr::from(([127, 0, 0, 1], 8000))),
      upload_dir: PathBuf::from("."),
      items_file: PathBuf::from(DEFAULT_ITEMS_FILE),
      pokedex: PokedexSource::Url(DEFAULT_POKEDEX_URL.to_string()),
      log: LogConfig::default(),
    }
  }
}

impl Config {
  /// Load configuration from an INI file
  pub fn from_file(path: &str) -> Result<Self, ConfigError> {
    let mut ini = Ini::new();
    ini.load(path).map_err(|reason| ConfigError::Read {
      path: path.to_string(),
      reason,
    })?;
    Self::from_ini(&ini)
  }

  /// Parse configuration from INI text
  pub fn from_ini_str(content: &str) -> Result<Self, ConfigError> {
    let mut ini = Ini::new();
    ini.read(content.to_string()).map_err(|reason| ConfigError::Read {
      path: "<inline>".to_string(),
      reason,
    })?;
    Self::from_ini(&ini)
  }

  fn from_ini(ini: &Ini) -> Result<Self, ConfigError> {
    let mut config = Config::default();

    if let Some(addr) = ini.get("server", "addr") {
      config.set_server_addr(&addr)?;
    }
    if let Some(dir) = ini.get("server", "upload_dir") {
      config.upload_dir = PathBuf::from(dir);
    }
    if let Some(file) = ini.get("store", "items_file") {
      config.items_file = PathBuf::from(file);
    }
    // A local document takes precedence over the remote page
    if let Some(file) = ini.get("pokedex", "file") {
      config.pokedex = PokedexSource::File(PathBuf::from(file));
    } else if let Some(url) = ini.get("pokedex", "url") {
      config.pokedex = PokedexSource::Url(url);
    }
    if let Some(level) = ini.get("log", "level") {
      config.log.level = level;
    }
    config.log.file = ini.get("log", "file").map(PathBuf::from);

    Ok(config)
  }

  /// Override the listening address
  pub fn set_server_addr(&mut self, addr: &str) -> Result<(), ConfigError> {
    self.server_addr = addr
      .trim()
      .parse()
      .map_err(|_| ConfigError::InvalidAddr(addr.to_string()))?;
    Ok(())
  }
}
