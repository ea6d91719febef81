//! Per-season input table files
//!
//! The acquisition step leaves one CSV per table per season in the cache
//! directory. Play-by-play is mandatory; the others degrade to join defaults.

use std::fmt;
use std::path::{Path, PathBuf};

use super::auxiliary::{
    load_participation, load_player_stats, load_schedules, ParticipationRecord, PlayerWeekStats,
    ScheduleRecord,
};
use super::plays::load_plays;
use crate::{PlayCallError, PlayRecord, Result};

/// Input tables recognised in the cache directory
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TableKind {
    Plays,
    Participation,
    Schedules,
    PlayerStats,
}

impl TableKind {
    pub const ALL: [TableKind; 4] = [
        TableKind::Plays,
        TableKind::Participation,
        TableKind::Schedules,
        TableKind::PlayerStats,
    ];

    fn prefix(&self) -> &'static str {
        match self {
            TableKind::Plays => "pbp",
            TableKind::Participation => "participation",
            TableKind::Schedules => "schedules",
            TableKind::PlayerStats => "player_stats",
        }
    }

    pub fn path(&self, cache_dir: &Path, season: u16) -> PathBuf {
        cache_dir.join(format!("{}_{}.csv", self.prefix(), season))
    }

    pub fn is_required(&self) -> bool {
        matches!(self, TableKind::Plays)
    }
}

impl fmt::Display for TableKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.pad(self.prefix())
    }
}

/// All input tables for a run, concatenated across seasons
#[derive(Debug, Clone, Default)]
pub struct InputTables {
    pub plays: Vec<PlayRecord>,
    pub participation: Vec<ParticipationRecord>,
    pub schedules: Vec<ScheduleRecord>,
    pub player_stats: Vec<PlayerWeekStats>,
}

/// Load and concatenate every configured season
pub fn load_seasons(cache_dir: &Path, seasons: &[u16]) -> Result<InputTables> {
    let mut tables = InputTables::default();

    for &season in seasons {
        log::info!("Loading season {}...", season);

        let plays_path = TableKind::Plays.path(cache_dir, season);
        let load = load_plays(&plays_path, Some(season))?;
        log::info!(
            "  pbp: {} run/pass plays ({} non-call rows dropped)",
            load.plays.len(),
            load.skipped_non_calls
        );
        if load.skipped_incomplete > 0 {
            log::warn!(
                "  pbp: {} run/pass rows without identifiers dropped",
                load.skipped_incomplete
            );
        }
        tables.plays.extend(load.plays);

        let path = TableKind::Participation.path(cache_dir, season);
        if let Some(rows) = optional(load_participation(&path))? {
            log::info!("  participation: {} rows", rows.len());
            tables.participation.extend(rows);
        } else {
            log::warn!("  participation not found for {}", season);
        }

        let path = TableKind::Schedules.path(cache_dir, season);
        if let Some(rows) = optional(load_schedules(&path))? {
            log::info!("  schedules: {} games", rows.len());
            tables.schedules.extend(rows);
        } else {
            log::warn!("  schedules not found for {}", season);
        }

        let path = TableKind::PlayerStats.path(cache_dir, season);
        if let Some(rows) = optional(load_player_stats(&path, Some(season)))? {
            log::info!("  player stats: {} player-weeks", rows.len());
            tables.player_stats.extend(rows);
        } else {
            log::warn!("  player stats not found for {}", season);
        }
    }

    if tables.plays.is_empty() {
        return Err(PlayCallError::Empty(format!(
            "no run/pass plays in {} for seasons {:?}",
            cache_dir.display(),
            seasons
        )));
    }
    Ok(tables)
}

/// An absent optional table is not an error; a malformed one still is
fn optional<T>(result: Result<T>) -> Result<Option<T>> {
    match result {
        Ok(value) => Ok(Some(value)),
        Err(PlayCallError::MissingTable(_)) => Ok(None),
        Err(e) => Err(e),
    }
}

/// Presence of each table file per season
pub fn table_status(cache_dir: &Path, seasons: &[u16]) -> Vec<(u16, TableKind, bool)> {
    seasons
        .iter()
        .flat_map(|&season| {
            TableKind::ALL
                .iter()
                .map(move |&kind| (season, kind, kind.path(cache_dir, season).exists()))
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_table_paths() {
        let dir = Path::new("data/cache");
        assert_eq!(
            TableKind::Plays.path(dir, 2024),
            PathBuf::from("data/cache/pbp_2024.csv")
        );
        assert_eq!(
            TableKind::PlayerStats.path(dir, 2023),
            PathBuf::from("data/cache/player_stats_2023.csv")
        );
        assert!(TableKind::Plays.is_required());
        assert!(!TableKind::Schedules.is_required());
    }

    #[test]
    fn test_missing_pbp_is_fatal() {
        let dir = tempfile::tempdir().unwrap();
        assert!(matches!(
            load_seasons(dir.path(), &[2024]),
            Err(PlayCallError::MissingTable(_))
        ));
    }

    #[test]
    fn test_status_reports_presence() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(TableKind::Plays.path(dir.path(), 2024), "game_id\n").unwrap();
        let status = table_status(dir.path(), &[2024]);
        assert_eq!(status.len(), 4);
        assert!(status[0].2);
        assert!(!status[1].2);
    }
}
