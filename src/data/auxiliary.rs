//! Auxiliary tables joined onto plays
//!
//! Participation (per play), schedules (per game) and weekly player stats
//! (per player-week). All three are optional for a season.

use std::io::Read;
use std::path::Path;

use csv::ReaderBuilder;

use super::schema::{ColumnIndex, Row};
use crate::{PlayCallError, Result, TeamCode};

/// Defensive alignment recorded for one play
#[derive(Debug, Clone, PartialEq)]
pub struct ParticipationRecord {
    pub game_id: String,
    pub play_id: u64,
    pub defenders_in_box: Option<u8>,
    pub number_of_pass_rushers: Option<u8>,
}

/// Game-level schedule and environment attributes
#[derive(Debug, Clone, PartialEq)]
pub struct ScheduleRecord {
    pub game_id: String,
    pub home_team: TeamCode,
    pub away_team: TeamCode,
    pub roof: Option<String>,
    pub surface: Option<String>,
    /// Degrees Fahrenheit
    pub temp: Option<f64>,
    /// Miles per hour
    pub wind: Option<f64>,
    pub home_rest: Option<f64>,
    pub away_rest: Option<f64>,
    pub div_game: Option<bool>,
}

/// Position group a weekly stat line is aggregated into
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum PositionGroup {
    Quarterback,
    RunningBack,
    Receiver,
    Other,
}

impl PositionGroup {
    pub fn from_position(position: &str) -> Self {
        match position.trim().to_uppercase().as_str() {
            "QB" => PositionGroup::Quarterback,
            "RB" | "FB" => PositionGroup::RunningBack,
            "WR" | "TE" => PositionGroup::Receiver,
            _ => PositionGroup::Other,
        }
    }
}

/// One player's counting stats for one week
#[derive(Debug, Clone, PartialEq)]
pub struct PlayerWeekStats {
    pub player_id: String,
    pub team: TeamCode,
    pub season: u16,
    pub week: u8,
    pub position: PositionGroup,
    pub completions: f64,
    pub attempts: f64,
    pub passing_yards: f64,
    pub passing_tds: f64,
    pub interceptions: f64,
    pub carries: f64,
    pub rushing_yards: f64,
    pub rushing_tds: f64,
    pub receptions: f64,
    pub targets: f64,
    pub receiving_yards: f64,
}

fn open(path: &Path) -> Result<std::fs::File> {
    if !path.exists() {
        return Err(PlayCallError::MissingTable(path.display().to_string()));
    }
    Ok(std::fs::File::open(path)?)
}

pub fn load_participation(path: &Path) -> Result<Vec<ParticipationRecord>> {
    read_participation(open(path)?)
}

pub fn read_participation<R: Read>(source: R) -> Result<Vec<ParticipationRecord>> {
    const TABLE: &str = "participation";
    let mut reader = ReaderBuilder::new().flexible(true).from_reader(source);
    let index = ColumnIndex::from_headers(TABLE, reader.headers()?);
    let game_id = index.require_any(&["nflverse_game_id", "game_id"])?;
    let play_id = index.require("play_id")?;
    let box_count = index.require("defenders_in_box")?;
    let rushers = index.require("number_of_pass_rushers")?;

    let mut records = Vec::new();
    let mut record = csv::StringRecord::new();
    let mut line = 1;
    while reader.read_record(&mut record)? {
        line += 1;
        let row = Row::new(TABLE, line, &record);
        let (Some(game), Some(play)) = (row.text(Some(game_id)), row.int::<u64>(Some(play_id))?)
        else {
            continue;
        };
        records.push(ParticipationRecord {
            game_id: game.to_string(),
            play_id: play,
            defenders_in_box: row.int(Some(box_count))?,
            number_of_pass_rushers: row.int(Some(rushers))?,
        });
    }
    Ok(records)
}

pub fn load_schedules(path: &Path) -> Result<Vec<ScheduleRecord>> {
    read_schedules(open(path)?)
}

pub fn read_schedules<R: Read>(source: R) -> Result<Vec<ScheduleRecord>> {
    const TABLE: &str = "schedules";
    let mut reader = ReaderBuilder::new().flexible(true).from_reader(source);
    let index = ColumnIndex::from_headers(TABLE, reader.headers()?);
    index.require_all(&[
        "game_id",
        "home_team",
        "away_team",
        "roof",
        "surface",
        "temp",
        "wind",
        "home_rest",
        "away_rest",
        "div_game",
    ])?;
    let col = |name: &str| index.optional(name);

    let mut records = Vec::new();
    let mut record = csv::StringRecord::new();
    let mut line = 1;
    while reader.read_record(&mut record)? {
        line += 1;
        let row = Row::new(TABLE, line, &record);
        let (Some(game_id), Some(home), Some(away)) = (
            row.text(col("game_id")),
            row.text(col("home_team")),
            row.text(col("away_team")),
        ) else {
            continue;
        };
        records.push(ScheduleRecord {
            game_id: game_id.to_string(),
            home_team: TeamCode::new(home),
            away_team: TeamCode::new(away),
            roof: row.text(col("roof")).map(str::to_lowercase),
            surface: row.text(col("surface")).map(str::to_lowercase),
            temp: row.float(col("temp"))?,
            wind: row.float(col("wind"))?,
            home_rest: row.float(col("home_rest"))?,
            away_rest: row.float(col("away_rest"))?,
            div_game: row.flag(col("div_game"))?,
        });
    }
    Ok(records)
}

pub fn load_player_stats(path: &Path, season: Option<u16>) -> Result<Vec<PlayerWeekStats>> {
    read_player_stats(open(path)?, season)
}

pub fn read_player_stats<R: Read>(source: R, season: Option<u16>) -> Result<Vec<PlayerWeekStats>> {
    const TABLE: &str = "player_stats";
    let mut reader = ReaderBuilder::new().flexible(true).from_reader(source);
    let index = ColumnIndex::from_headers(TABLE, reader.headers()?);
    let player_id = index.require("player_id")?;
    let team = index.require_any(&["recent_team", "team"])?;
    let week = index.require("week")?;
    let position = index.require("position")?;
    let interceptions = index.require_any(&["interceptions", "passing_interceptions"])?;
    index.require_all(&[
        "completions",
        "attempts",
        "passing_yards",
        "passing_tds",
        "carries",
        "rushing_yards",
        "rushing_tds",
        "receptions",
        "targets",
        "receiving_yards",
    ])?;
    let season_col = index.optional("season");
    if season_col.is_none() && season.is_none() {
        return Err(PlayCallError::MissingColumn {
            table: TABLE.to_string(),
            column: "season".to_string(),
        });
    }
    let col = |name: &str| index.optional(name);

    let mut records = Vec::new();
    let mut record = csv::StringRecord::new();
    let mut line = 1;
    while reader.read_record(&mut record)? {
        line += 1;
        let row = Row::new(TABLE, line, &record);
        let (Some(player), Some(team_code), Some(week_no), Some(row_season)) = (
            row.text(Some(player_id)),
            row.text(Some(team)),
            row.int::<u8>(Some(week))?,
            row.int::<u16>(season_col)?.or(season),
        ) else {
            continue;
        };
        records.push(PlayerWeekStats {
            player_id: player.to_string(),
            team: TeamCode::new(team_code),
            season: row_season,
            week: week_no,
            position: PositionGroup::from_position(row.text(Some(position)).unwrap_or("")),
            completions: row.count(col("completions"))?,
            attempts: row.count(col("attempts"))?,
            passing_yards: row.count(col("passing_yards"))?,
            passing_tds: row.count(col("passing_tds"))?,
            interceptions: row.count(Some(interceptions))?,
            carries: row.count(col("carries"))?,
            rushing_yards: row.count(col("rushing_yards"))?,
            rushing_tds: row.count(col("rushing_tds"))?,
            receptions: row.count(col("receptions"))?,
            targets: row.count(col("targets"))?,
            receiving_yards: row.count(col("receiving_yards"))?,
        });
    }
    Ok(records)
}
