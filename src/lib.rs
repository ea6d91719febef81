//! Play-call prediction features from NFL play-by-play data
//!
//! Builds a per-play feature table for run vs. pass prediction from a defensive
//! coordinator's point of view. Every feature is computed from information that is
//! known before the snap.

pub mod data;
pub mod features;
pub mod pipeline;
pub mod split;
pub mod table;

use serde::{Deserialize, Serialize};
use std::fmt;
use thiserror::Error;

pub use features::TendencyScope;

/// Team abbreviation as it appears in the source tables (e.g. "KC")
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct TeamCode(pub String);

impl TeamCode {
    pub fn new(code: impl Into<String>) -> Self {
        TeamCode(code.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for TeamCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Play call label
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum PlayType {
    Run,
    Pass,
}

impl PlayType {
    /// Parse the raw `play_type` value; anything other than run/pass is not a play call
    pub fn parse(raw: &str) -> Option<Self> {
        match raw.trim().to_lowercase().as_str() {
            "run" => Some(PlayType::Run),
            "pass" => Some(PlayType::Pass),
            _ => None,
        }
    }
}

impl fmt::Display for PlayType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            PlayType::Run => write!(f, "run"),
            PlayType::Pass => write!(f, "pass"),
        }
    }
}

/// Home or away side of the possessing team
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Side {
    Home,
    Away,
}

impl Side {
    pub fn parse(raw: &str) -> Option<Self> {
        match raw.trim().to_lowercase().as_str() {
            "home" => Some(Side::Home),
            "away" => Some(Side::Away),
            _ => None,
        }
    }
}

/// A single run or pass snap
///
/// Fields up to `game_seconds_remaining` are known before the snap. `yards_gained`,
/// `epa` and the first-down flags describe the outcome and may only feed features of
/// later plays.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PlayRecord {
    pub game_id: String,
    /// Unique within the game and increasing in real-time order
    pub play_id: u64,
    /// Drive number within the game, missing for a handful of administrative rows
    pub drive: Option<u32>,
    pub season: u16,
    pub week: u8,
    pub posteam: TeamCode,
    pub defteam: TeamCode,
    pub posteam_type: Option<Side>,
    pub down: Option<u8>,
    pub ydstogo: Option<u8>,
    /// Yards from the opponent goal line (100 = own goal line)
    pub yardline_100: Option<u8>,
    /// Score margin from the possessing team's perspective
    pub score_differential: Option<i32>,
    pub qtr: Option<u8>,
    pub half_seconds_remaining: Option<f64>,
    pub game_seconds_remaining: Option<f64>,
    pub play_type: PlayType,
    pub no_huddle: Option<bool>,
    pub shotgun: Option<bool>,

    // === Outcome (post-snap) ===
    pub yards_gained: Option<f64>,
    pub epa: Option<f64>,
    pub first_down_rush: Option<bool>,
    pub first_down_pass: Option<bool>,
}

impl PlayRecord {
    pub fn is_pass(&self) -> bool {
        self.play_type == PlayType::Pass
    }

    /// First downs earned on this play (rush or pass)
    pub fn first_downs(&self) -> u32 {
        u32::from(self.first_down_rush.unwrap_or(false))
            + u32::from(self.first_down_pass.unwrap_or(false))
    }
}

/// Application-wide errors
#[derive(Debug, Error)]
pub enum PlayCallError {
    #[error("Table {table} is missing required column '{column}'")]
    MissingColumn { table: String, column: String },

    #[error(
        "Plays are not sorted by (game, play): game {game_id} play {play_id} follows play {previous_play_id}"
    )]
    UnsortedInput {
        game_id: String,
        play_id: u64,
        previous_play_id: u64,
    },

    #[error("Game {0} appears in more than one block of the play table")]
    SplitGame(String),

    #[error("Required table not found: {0}")]
    MissingTable(String),

    #[error("Parse error in {table} row {row}: {message}")]
    Parse {
        table: String,
        row: usize,
        message: String,
    },

    #[error("Table shape error: {0}")]
    Shape(String),

    #[error("No plays to process: {0}")]
    Empty(String),

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Serialization error: {0}")]
    Serialization(String),

    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

pub type Result<T> = std::result::Result<T, PlayCallError>;

/// Application configuration loaded from config.toml
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    pub data: DataConfig,
    pub pipeline: PipelineConfig,
    pub split: SplitConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DataConfig {
    /// Directory holding `pbp_{season}.csv` and the auxiliary tables
    pub cache_dir: String,
    /// Directory the feature file and summary are written to
    pub output_dir: String,
    pub seasons: Vec<u16>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PipelineConfig {
    /// Which plays feed the team tendency rates joined to a given play
    pub tendency_scope: TendencyScope,
    /// Replace missing auxiliary feature values with 0 in the written table
    pub fill_auxiliary_nulls: bool,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SplitConfig {
    pub train_cutoff_season: u16,
    pub train_cutoff_week: u8,
    pub test_start_week: u8,
    pub test_end_week: u8,
}

impl Default for Config {
    fn default() -> Self {
        Config {
            data: DataConfig {
                cache_dir: "data/cache".to_string(),
                output_dir: "data/features".to_string(),
                seasons: vec![2021, 2022, 2023, 2024, 2025],
            },
            pipeline: PipelineConfig {
                tendency_scope: TendencyScope::PriorWeeks,
                fill_auxiliary_nulls: false,
            },
            split: SplitConfig {
                train_cutoff_season: 2025,
                train_cutoff_week: 10,
                test_start_week: 11,
                test_end_week: 13,
            },
        }
    }
}

impl Config {
    pub fn load(path: &str) -> Result<Self> {
        let content = std::fs::read_to_string(path).map_err(|e| {
            PlayCallError::Config(format!("Failed to read config file {}: {}", path, e))
        })?;
        let config: Config = toml::from_str(&content)
            .map_err(|e| PlayCallError::Config(format!("Failed to parse config: {}", e)))?;
        config.validate()?;
        Ok(config)
    }

    pub fn save(&self, path: &str) -> Result<()> {
        let content = toml::to_string_pretty(self)
            .map_err(|e| PlayCallError::Config(format!("Failed to serialize config: {}", e)))?;
        std::fs::write(path, content)?;
        Ok(())
    }

    pub fn validate(&self) -> Result<()> {
        if self.data.seasons.is_empty() {
            return Err(PlayCallError::Config("no seasons configured".to_string()));
        }
        if self.split.test_start_week > self.split.test_end_week {
            return Err(PlayCallError::Config(format!(
                "test weeks {}..={} are empty",
                self.split.test_start_week, self.split.test_end_week
            )));
        }
        if self.split.test_start_week <= self.split.train_cutoff_week {
            return Err(PlayCallError::Config(format!(
                "test window starts at week {} but training runs through week {}",
                self.split.test_start_week, self.split.train_cutoff_week
            )));
        }
        Ok(())
    }
}
