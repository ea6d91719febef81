//! Play-by-play table loading
//!
//! Decodes the play-by-play export and keeps only run/pass snaps, the rows a play
//! call can be predicted for.

use std::io::Read;
use std::path::Path;

use csv::ReaderBuilder;

use super::schema::{ColumnIndex, Row};
use crate::{PlayCallError, PlayRecord, PlayType, Result, Side, TeamCode};

const TABLE: &str = "pbp";

/// Columns every play-by-play file must carry
pub const REQUIRED_COLUMNS: [&str; 21] = [
    "game_id",
    "play_id",
    "drive",
    "week",
    "posteam",
    "defteam",
    "down",
    "ydstogo",
    "yardline_100",
    "score_differential",
    "qtr",
    "half_seconds_remaining",
    "game_seconds_remaining",
    "play_type",
    "yards_gained",
    "epa",
    "first_down_rush",
    "first_down_pass",
    "no_huddle",
    "shotgun",
    "posteam_type",
];

/// Result of loading one play-by-play file
#[derive(Debug, Clone, Default)]
pub struct PlayLoad {
    pub plays: Vec<PlayRecord>,
    /// Rows that are not run/pass (kickoffs, punts, penalties, timeouts...)
    pub skipped_non_calls: usize,
    /// Run/pass rows missing an identifier (game, play, teams or week)
    pub skipped_incomplete: usize,
}

struct PlayColumns {
    game_id: usize,
    play_id: usize,
    drive: usize,
    season: Option<usize>,
    week: usize,
    posteam: usize,
    defteam: usize,
    posteam_type: usize,
    down: usize,
    ydstogo: usize,
    yardline_100: usize,
    score_differential: usize,
    qtr: usize,
    half_seconds_remaining: usize,
    game_seconds_remaining: usize,
    play_type: usize,
    yards_gained: usize,
    epa: usize,
    first_down_rush: usize,
    first_down_pass: usize,
    no_huddle: usize,
    shotgun: usize,
}

impl PlayColumns {
    fn resolve(index: &ColumnIndex) -> Result<Self> {
        index.require_all(&REQUIRED_COLUMNS)?;
        Ok(PlayColumns {
            game_id: index.require("game_id")?,
            play_id: index.require("play_id")?,
            drive: index.require("drive")?,
            season: index.optional("season"),
            week: index.require("week")?,
            posteam: index.require("posteam")?,
            defteam: index.require("defteam")?,
            posteam_type: index.require("posteam_type")?,
            down: index.require("down")?,
            ydstogo: index.require("ydstogo")?,
            yardline_100: index.require("yardline_100")?,
            score_differential: index.require("score_differential")?,
            qtr: index.require("qtr")?,
            half_seconds_remaining: index.require("half_seconds_remaining")?,
            game_seconds_remaining: index.require("game_seconds_remaining")?,
            play_type: index.require("play_type")?,
            yards_gained: index.require("yards_gained")?,
            epa: index.require("epa")?,
            first_down_rush: index.require("first_down_rush")?,
            first_down_pass: index.require("first_down_pass")?,
            no_huddle: index.require("no_huddle")?,
            shotgun: index.require("shotgun")?,
        })
    }
}

/// Load a play-by-play CSV file
///
/// `season` is used when the file has no `season` column.
pub fn load_plays(path: &Path, season: Option<u16>) -> Result<PlayLoad> {
    if !path.exists() {
        return Err(PlayCallError::MissingTable(path.display().to_string()));
    }
    let file = std::fs::File::open(path)?;
    let load = read_plays(file, season)?;
    log::debug!(
        "{}: {} run/pass plays ({} other rows, {} incomplete)",
        path.display(),
        load.plays.len(),
        load.skipped_non_calls,
        load.skipped_incomplete
    );
    Ok(load)
}

/// Decode play-by-play rows from any CSV source
pub fn read_plays<R: Read>(source: R, season: Option<u16>) -> Result<PlayLoad> {
    let mut reader = ReaderBuilder::new()
        .has_headers(true)
        .flexible(true)
        .from_reader(source);
    let index = ColumnIndex::from_headers(TABLE, reader.headers()?);
    let cols = PlayColumns::resolve(&index)?;
    if cols.season.is_none() && season.is_none() {
        return Err(PlayCallError::MissingColumn {
            table: TABLE.to_string(),
            column: "season".to_string(),
        });
    }

    let mut load = PlayLoad::default();
    let mut record = csv::StringRecord::new();
    let mut line = 1;
    while reader.read_record(&mut record)? {
        line += 1;
        let row = Row::new(TABLE, line, &record);

        let Some(play_type) = row.text(Some(cols.play_type)).and_then(PlayType::parse) else {
            load.skipped_non_calls += 1;
            continue;
        };

        let game_id = row.text(Some(cols.game_id));
        let play_id = row.int::<u64>(Some(cols.play_id))?;
        let posteam = row.text(Some(cols.posteam));
        let defteam = row.text(Some(cols.defteam));
        let week = row.int::<u8>(Some(cols.week))?;
        let row_season = row.int::<u16>(cols.season)?.or(season);

        let (Some(game_id), Some(play_id), Some(posteam), Some(defteam), Some(week), Some(row_season)) =
            (game_id, play_id, posteam, defteam, week, row_season)
        else {
            log::debug!("pbp line {}: run/pass row without identifiers, skipped", line);
            load.skipped_incomplete += 1;
            continue;
        };

        load.plays.push(PlayRecord {
            game_id: game_id.to_string(),
            play_id,
            drive: row.int(Some(cols.drive))?,
            season: row_season,
            week,
            posteam: TeamCode::new(posteam),
            defteam: TeamCode::new(defteam),
            posteam_type: row.text(Some(cols.posteam_type)).and_then(Side::parse),
            down: row.int(Some(cols.down))?,
            ydstogo: row.int(Some(cols.ydstogo))?,
            yardline_100: row.int(Some(cols.yardline_100))?,
            score_differential: row.int(Some(cols.score_differential))?,
            qtr: row.int(Some(cols.qtr))?,
            half_seconds_remaining: row.float(Some(cols.half_seconds_remaining))?,
            game_seconds_remaining: row.float(Some(cols.game_seconds_remaining))?,
            play_type,
            no_huddle: row.flag(Some(cols.no_huddle))?,
            shotgun: row.flag(Some(cols.shotgun))?,
            yards_gained: row.float(Some(cols.yards_gained))?,
            epa: row.float(Some(cols.epa))?,
            first_down_rush: row.flag(Some(cols.first_down_rush))?,
            first_down_pass: row.flag(Some(cols.first_down_pass))?,
        });
    }

    Ok(load)
}
