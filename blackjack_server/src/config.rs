//! Configuration of the server process. Every setting can come from a command line flag, from a JSON config
//! file passed with `--config`, or from its default, in that order of precedence.

use crate::registry::DEFAULT_SESSION_TTL;
use blackjack_lib::{BlackjackError, TableConfig};
use clap::Parser;
use serde::Deserialize;
use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;
use thiserror::Error;

pub const DEFAULT_ADDRESS: &str = "127.0.0.1";
pub const DEFAULT_PORT: u16 = 8080;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("unable to read config file {path}: {source}")]
    Read {
        path: PathBuf,
        source: std::io::Error,
    },
    #[error("invalid config file {path}: {source}")]
    Parse {
        path: PathBuf,
        source: serde_json::Error,
    },
    #[error(transparent)]
    Table(#[from] BlackjackError),
}

/// Command line interface of the `api` binary.
#[derive(Debug, Default, Parser)]
#[command(
    name = "blackjack-trainer",
    about = "Serves a single player blackjack trainer that grades hit/stand decisions against basic strategy"
)]
pub struct Cli {
    /// Address to bind [default: 127.0.0.1]
    #[arg(long)]
    pub address: Option<String>,

    /// Port to listen on [default: 8080]
    #[arg(short, long)]
    pub port: Option<u16>,

    /// JSON config file, flags given on the command line override its values
    #[arg(short, long)]
    pub config: Option<PathBuf>,

    /// Number of decks in the shoe, 1 to 8 [default: 6]
    #[arg(long)]
    pub num_decks: Option<u8>,

    /// Reshuffle before a round once fewer cards than this remain [default: 67]
    #[arg(long)]
    pub reshuffle_threshold: Option<usize>,

    /// Dealer hits soft 17 [default: true]
    #[arg(long, action = clap::ArgAction::Set)]
    pub dealer_hits_soft_17: Option<bool>,

    /// Dealer peeks for blackjack [default: true]
    #[arg(long, action = clap::ArgAction::Set)]
    pub dealer_peeks: Option<bool>,

    /// File the all-time accuracy is kept in, kept in memory only when absent
    #[arg(long)]
    pub accuracy_file: Option<PathBuf>,

    /// Minutes of inactivity after which a session is dropped [default: 360]
    #[arg(long)]
    pub session_ttl_minutes: Option<u64>,
}

/// A struct for the optional config file, meant to be deserialized from JSON. Every field may be omitted.
#[derive(Debug, Default, Deserialize, PartialEq, Eq)]
pub struct GameConfig {
    pub address: Option<String>,
    pub port: Option<u16>,
    pub num_decks: Option<u8>,
    pub reshuffle_threshold: Option<usize>,
    pub dealer_hits_soft_17: Option<bool>,
    pub dealer_peeks: Option<bool>,
    pub accuracy_file: Option<PathBuf>,
    pub session_ttl_minutes: Option<u64>,
}

impl GameConfig {
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<GameConfig, ConfigError> {
        let path = path.as_ref();
        let contents = fs::read_to_string(path).map_err(|source| ConfigError::Read {
            path: path.to_path_buf(),
            source,
        })?;
        serde_json::from_str(&contents).map_err(|source| ConfigError::Parse {
            path: path.to_path_buf(),
            source,
        })
    }
}

/// The resolved configuration the server runs with.
#[derive(Debug, Clone, PartialEq)]
pub struct ServerConfig {
    pub address: String,
    pub port: u16,
    pub table: TableConfig,
    pub accuracy_file: Option<PathBuf>,
    pub session_ttl: Duration,
}

impl ServerConfig {
    /// Reads the config file named by `cli`, if any, and resolves every setting.
    pub fn load(cli: Cli) -> Result<ServerConfig, ConfigError> {
        let file = match &cli.config {
            Some(path) => GameConfig::from_file(path)?,
            None => GameConfig::default(),
        };
        ServerConfig::resolve(cli, file)
    }

    /// Merges the command line over the config file over the defaults.
    pub fn resolve(cli: Cli, file: GameConfig) -> Result<ServerConfig, ConfigError> {
        let mut builder = TableConfig::new();
        if let Some(decks) = cli.num_decks.or(file.num_decks) {
            builder.num_decks(decks);
        }
        if let Some(threshold) = cli.reshuffle_threshold.or(file.reshuffle_threshold) {
            builder.reshuffle_threshold(Some(threshold));
        }
        if let Some(hits) = cli.dealer_hits_soft_17.or(file.dealer_hits_soft_17) {
            builder.dealer_hits_soft_17(hits);
        }
        if let Some(peeks) = cli.dealer_peeks.or(file.dealer_peeks) {
            builder.dealer_peeks(peeks);
        }

        let session_ttl = cli
            .session_ttl_minutes
            .or(file.session_ttl_minutes)
            .map(|minutes| Duration::from_secs(minutes * 60))
            .unwrap_or(DEFAULT_SESSION_TTL);

        Ok(ServerConfig {
            address: cli
                .address
                .or(file.address)
                .unwrap_or_else(|| DEFAULT_ADDRESS.to_string()),
            port: cli.port.or(file.port).unwrap_or(DEFAULT_PORT),
            table: builder.build()?,
            accuracy_file: cli.accuracy_file.or(file.accuracy_file),
            session_ttl,
        })
    }
}
