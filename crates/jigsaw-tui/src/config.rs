//! Command line flags and their environment fallbacks

use crate::leaderboard::Environment;
use clap::{Parser, ValueEnum};
use jigsaw_core::{is_valid_grid_size, ConfigError, DifficultyTable, ImageCatalog, SessionConfig};
use rand::seq::SliceRandom;
use std::path::{Path, PathBuf};

/// Where finished games are recorded
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum BackendKind {
    /// JSON file in the data directory
    Local,
    /// In memory, gone on exit
    Test,
    /// HTTP leaderboard service
    Remote,
}

#[derive(Debug, Parser)]
#[command(name = "jigsaw", version, about = "Tile-swap jigsaw puzzle in the terminal")]
pub struct Cli {
    /// Image to open at start: a gallery file name or `random`
    #[arg(long)]
    pub image: Option<String>,

    /// Grid size for the first game
    #[arg(long, requires = "image")]
    pub grid: Option<usize>,

    /// Seed for reproducible shuffles
    #[arg(long)]
    pub seed: Option<u64>,

    /// JSON file mapping grid size to time budget and scoring
    #[arg(long, value_name = "FILE")]
    pub difficulty_table: Option<PathBuf>,

    /// Use the 3x3 to 10x10 lineup
    #[arg(long, conflicts_with = "difficulty_table")]
    pub classic: bool,

    /// Leaderboard backend (defaults from JIGSAW_ENV)
    #[arg(long, value_enum)]
    pub leaderboard: Option<BackendKind>,

    /// Remote leaderboard URL (defaults from JIGSAW_API_URL)
    #[arg(long)]
    pub api_url: Option<String>,

    /// Start with sound off
    #[arg(long)]
    pub mute: bool,

    /// Use the high contrast theme
    #[arg(long)]
    pub high_contrast: bool,
}

/// A game to start right away
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StartGame {
    pub image: String,
    /// `None` opens the difficulty dialog
    pub grid_size: Option<usize>,
}

/// Resolved settings
#[derive(Debug, Clone)]
pub struct Config {
    pub session: SessionConfig,
    pub start: Option<StartGame>,
    pub seed: Option<u64>,
    pub backend: BackendKind,
    pub api_url: Option<String>,
    pub data_dir: PathBuf,
    pub high_contrast: bool,
}

impl Config {
    /// Resolve flags against the environment and the gallery
    pub fn from_cli(cli: Cli, catalog: &ImageCatalog) -> Result<Self, ConfigError> {
        let difficulties = match (&cli.difficulty_table, cli.classic) {
            (Some(path), _) => load_difficulty_table(path)?,
            (None, true) => DifficultyTable::classic(),
            (None, false) => DifficultyTable::standard(),
        };

        if let Some(n) = cli.grid {
            if !is_valid_grid_size(n) {
                return Err(ConfigError::InvalidGridSize(n));
            }
        }

        let start = match cli.image.as_deref() {
            Some(name) => Some(StartGame {
                image: resolve_image(name, catalog).ok_or_else(|| {
                    ConfigError::Parse(format!("unknown image '{}'", name))
                })?,
                grid_size: cli.grid,
            }),
            None => None,
        };

        let api_url = cli
            .api_url
            .or_else(|| std::env::var("JIGSAW_API_URL").ok())
            .filter(|u| !u.trim().is_empty());

        Ok(Self {
            session: SessionConfig {
                difficulties,
                sound_on: !cli.mute,
                ..SessionConfig::default()
            },
            start,
            seed: cli.seed,
            backend: cli
                .leaderboard
                .unwrap_or_else(|| Environment::detect().backend_kind()),
            api_url,
            data_dir: data_dir(),
            high_contrast: cli.high_contrast,
        })
    }
}

/// Read a difficulty table from a JSON file
pub fn load_difficulty_table(path: &Path) -> Result<DifficultyTable, ConfigError> {
    let json = std::fs::read_to_string(path).map_err(|e| ConfigError::Io(e.to_string()))?;
    DifficultyTable::from_json(&json)
}

/// Match a gallery entry by file name or URL; `random` picks one
pub fn resolve_image(name: &str, catalog: &ImageCatalog) -> Option<String> {
    if name.eq_ignore_ascii_case("random") {
        return catalog.urls().choose(&mut rand::thread_rng()).cloned();
    }
    let index = (0..catalog.len())
        .find(|&i| catalog.name(i) == Some(name))
        .or_else(|| catalog.index_of(name))?;
    catalog.url(index)
}

/// Per-user data directory for the leaderboard and the log
pub fn data_dir() -> PathBuf {
    dirs::data_local_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join("jigsaw")
}
