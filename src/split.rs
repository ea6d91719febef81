//! Model-ready exports of a feature table
//!
//! Column screening against post-snap leakage and a time-respecting
//! train/test split. Training itself happens outside this crate.

use std::path::{Path, PathBuf};

use serde::Serialize;

use crate::table::{FeatureTable, Value};
use crate::{PlayCallError, Result, SplitConfig};

/// Any column whose lowercased name contains one of these is excluded from model inputs
pub const LEAKAGE_KEYWORDS: &[&str] = &[
    "qb_dropback",
    "qb_scramble",
    "qb_hit",
    "qb_kneel",
    "qb_spike",
    "qb_epa",
    "receiver_id",
    "receiver_jersey",
    "receiver_player",
    "rusher_player",
    "passer_player",
    "interception",
    "fumble",
    "sack",
    "touchdown",
    "yards_gained",
    "first_down",
    "fourth_down_converted",
    "incomplete_pass",
    "pass_attempt",
    "rush_attempt",
    "complete_pass",
    "air_yards",
    "yards_after_catch",
    // Participation counts may be charted after the snap
    "personnel_pass_rushers",
    "personnel_defenders_in_box",
    "personnel_light_box",
    "personnel_heavy_box",
];

pub const LABEL_COLUMN: &str = "is_pass";

/// Identifiers and metadata that are never model inputs
pub const NON_FEATURE_COLUMNS: &[&str] = &[
    "game_id",
    "play_id",
    "posteam",
    "defteam",
    "week",
    "season",
    LABEL_COLUMN,
];

pub fn is_leakage_column(name: &str) -> bool {
    let lower = name.to_lowercase();
    LEAKAGE_KEYWORDS.iter().any(|k| lower.contains(k))
}

/// Numeric, non-identifier, leakage-free columns usable as model inputs
///
/// A column qualifies when it has at least one value and every value is numeric.
pub fn model_feature_columns(table: &FeatureTable) -> Vec<String> {
    table
        .columns()
        .iter()
        .enumerate()
        .filter(|(_, name)| !NON_FEATURE_COLUMNS.contains(&name.as_str()))
        .filter(|(_, name)| !is_leakage_column(name))
        .filter(|(i, _)| {
            let mut cells = table.rows().iter().map(|r| &r[*i]).filter(|v| !v.is_missing());
            let mut any = false;
            let numeric = cells.all(|v| {
                any = true;
                v.is_numeric()
            });
            any && numeric
        })
        .map(|(_, name)| name.clone())
        .collect()
}

/// Train on everything up to a cutoff week, test on a later block of weeks
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TemporalSplit {
    pub cutoff_season: u16,
    pub cutoff_week: u8,
    pub test_start_week: u8,
    pub test_end_week: u8,
}

impl TemporalSplit {
    pub fn from_config(config: &SplitConfig) -> Self {
        TemporalSplit {
            cutoff_season: config.train_cutoff_season,
            cutoff_week: config.train_cutoff_week,
            test_start_week: config.test_start_week,
            test_end_week: config.test_end_week,
        }
    }

    pub fn is_train(&self, season: i64, week: i64) -> bool {
        let cutoff = i64::from(self.cutoff_season);
        season < cutoff || (season == cutoff && week <= i64::from(self.cutoff_week))
    }

    pub fn is_test(&self, season: i64, week: i64) -> bool {
        season == i64::from(self.cutoff_season)
            && (i64::from(self.test_start_week)..=i64::from(self.test_end_week)).contains(&week)
    }

    /// Rows split into (train, test); rows in neither window are left out
    pub fn partition(&self, table: &FeatureTable) -> Result<(FeatureTable, FeatureTable)> {
        let season = table.require_column("season")?;
        let week = table.require_column("week")?;
        let key = |row: &[Value]| Some((row[season].as_i64()?, row[week].as_i64()?));

        let train = table.filter_rows(|row| key(row).is_some_and(|(s, w)| self.is_train(s, w)));
        let test = table.filter_rows(|row| key(row).is_some_and(|(s, w)| self.is_test(s, w)));
        Ok((train, test))
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct SplitReport {
    pub train_rows: usize,
    pub test_rows: usize,
    pub feature_columns: Vec<String>,
    pub leakage_columns: Vec<String>,
    pub train_pass_rate: Option<f64>,
    pub test_pass_rate: Option<f64>,
    pub train_path: PathBuf,
    pub test_path: PathBuf,
}

fn pass_rate(table: &FeatureTable) -> Option<f64> {
    let labels: Vec<f64> = table
        .column(LABEL_COLUMN)?
        .into_iter()
        .filter_map(Value::as_f64)
        .collect();
    if labels.is_empty() {
        None
    } else {
        Some(labels.iter().sum::<f64>() / labels.len() as f64)
    }
}

/// Keys, model inputs and label, with missing inputs filled with 0
pub fn model_frame(table: &FeatureTable, features: &[String]) -> Result<FeatureTable> {
    let mut columns: Vec<String> = ["game_id", "play_id", "season", "week"]
        .iter()
        .map(|c| c.to_string())
        .collect();
    columns.extend(features.iter().cloned());
    columns.push(LABEL_COLUMN.to_string());

    let mut frame = table.select(&columns)?;
    frame.fill_missing(&Value::Int(0), NON_FEATURE_COLUMNS);
    Ok(frame)
}

/// Split a feature file into `{stem}_train.csv` and `{stem}_test.csv` next to it
pub fn write_split(features_path: &Path, split: &TemporalSplit) -> Result<SplitReport> {
    let table = FeatureTable::load(features_path)?;
    if table.is_empty() {
        return Err(PlayCallError::Empty(format!(
            "{} has no rows",
            features_path.display()
        )));
    }

    let features = model_feature_columns(&table);
    let leakage_columns: Vec<String> = table
        .columns()
        .iter()
        .filter(|c| is_leakage_column(c))
        .cloned()
        .collect();
    log::info!(
        "{} model feature columns, {} leakage columns excluded",
        features.len(),
        leakage_columns.len()
    );

    let (train, test) = split.partition(&table)?;
    let train = model_frame(&train, &features)?;
    let test = model_frame(&test, &features)?;

    let stem = features_path
        .file_stem()
        .and_then(|s| s.to_str())
        .unwrap_or("features");
    let dir = features_path.parent().unwrap_or_else(|| Path::new("."));
    let train_path = dir.join(format!("{}_train.csv", stem));
    let test_path = dir.join(format!("{}_test.csv", stem));
    train.save(&train_path)?;
    test.save(&test_path)?;
    log::info!("Train: {} rows, test: {} rows", train.len(), test.len());

    Ok(SplitReport {
        train_rows: train.len(),
        test_rows: test.len(),
        feature_columns: features,
        leakage_columns,
        train_pass_rate: pass_rate(&train),
        test_pass_rate: pass_rate(&test),
        train_path,
        test_path,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn table() -> FeatureTable {
        let columns = [
            "game_id",
            "play_id",
            "season",
            "week",
            "is_pass",
            "down",
            "team_pass_rate_overall",
            "drive_first_downs",
            "personnel_light_box",
            "posteam",
            "empty_feature",
        ];
        let mut table = FeatureTable::new(columns.iter().map(|c| c.to_string()).collect());
        let rows = [(2024, 17, 1), (2025, 10, 0), (2025, 11, 1), (2025, 13, 0), (2025, 14, 1)];
        for (i, (season, week, pass)) in rows.into_iter().enumerate() {
            table
                .push_row(vec![
                    Value::text(format!("g{}", i)),
                    Value::Int(1),
                    Value::Int(season),
                    Value::Int(week),
                    Value::Int(pass),
                    Value::Int(2),
                    if i == 0 { Value::Missing } else { Value::Float(0.6) },
                    Value::Int(1),
                    Value::Int(0),
                    Value::text("KC"),
                    Value::Missing,
                ])
                .unwrap();
        }
        table
    }

    fn split() -> TemporalSplit {
        TemporalSplit {
            cutoff_season: 2025,
            cutoff_week: 10,
            test_start_week: 11,
            test_end_week: 13,
        }
    }

    #[test]
    fn test_leakage_keywords_match_substrings() {
        assert!(is_leakage_column("yards_gained"));
        assert!(is_leakage_column("drive_first_downs"));
        assert!(is_leakage_column("Personnel_Heavy_Box"));
        assert!(!is_leakage_column("team_qb_completion_pct"));
        assert!(!is_leakage_column("momentum_epa_last_3"));
    }

    #[test]
    fn test_model_feature_columns() {
        let cols = model_feature_columns(&table());
        assert_eq!(
            cols,
            vec!["down".to_string(), "team_pass_rate_overall".to_string()]
        );
    }

    #[test]
    fn test_partition_windows() {
        let (train, test) = split().partition(&table()).unwrap();
        let weeks = |t: &FeatureTable| -> Vec<i64> {
            t.column("week")
                .unwrap()
                .into_iter()
                .filter_map(Value::as_i64)
                .collect()
        };
        assert_eq!(weeks(&train), vec![17, 10]);
        assert_eq!(weeks(&test), vec![11, 13]);
    }

    #[test]
    fn test_model_frame_fills_missing_inputs() {
        let t = table();
        let frame = model_frame(&t, &model_feature_columns(&t)).unwrap();
        assert_eq!(frame.get(0, "team_pass_rate_overall"), Some(&Value::Int(0)));
        assert_eq!(frame.columns().last().map(String::as_str), Some(LABEL_COLUMN));
    }

    #[test]
    fn test_write_split_files() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("dc_features_2024-2025.csv");
        table().save(&path).unwrap();

        let report = write_split(&path, &split()).unwrap();
        assert_eq!(report.train_rows, 2);
        assert_eq!(report.test_rows, 2);
        assert_eq!(report.test_pass_rate, Some(0.5));
        assert!(report.train_path.ends_with("dc_features_2024-2025_train.csv"));
        assert!(report.test_path.exists());
        assert!(report
            .leakage_columns
            .contains(&"personnel_light_box".to_string()));
    }
}
