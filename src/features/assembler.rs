//! Final feature table selection
//!
//! Picks the core identifier/label/situation columns and every feature column
//! matching a group prefix, then drops rows missing a critical field.

use serde::Serialize;

use crate::table::{FeatureTable, Value};
use crate::Result;

/// Identifier, label and raw situation columns, always first
pub const CORE_COLUMNS: &[&str] = &[
    "game_id",
    "play_id",
    "posteam",
    "defteam",
    "week",
    "season",
    "is_pass",
    "down",
    "ydstogo",
    "yardline_100",
    "score_differential",
    "qtr",
    "half_seconds_remaining",
    "game_seconds_remaining",
];

/// Feature groups and the column prefixes that place a column in them
pub const FEATURE_GROUPS: &[(&str, &[&str])] = &[
    ("Team Tendencies", &["team_pass_rate_"]),
    ("Momentum", &["momentum_", "drive_"]),
    ("Fatigue", &["fatigue_"]),
    ("Personnel", &["personnel_"]),
    ("Formation", &["formation_"]),
    ("Context", &["context_"]),
    ("Situational", &["situation_"]),
    (
        "Team Performance",
        &["team_qb_", "team_rb_", "team_receiver_"],
    ),
];

/// A row missing any of these is dropped
pub const CRITICAL_COLUMNS: &[&str] = &[
    "down",
    "ydstogo",
    "yardline_100",
    "score_differential",
    "is_pass",
];

/// Group name for a feature column, if it belongs to one
pub fn feature_group(column: &str) -> Option<&'static str> {
    FEATURE_GROUPS
        .iter()
        .find(|(_, prefixes)| prefixes.iter().any(|p| column.starts_with(p)))
        .map(|(name, _)| *name)
}

/// Feature columns of `columns` in group order, then source order within a group
pub fn feature_columns(columns: &[String]) -> Vec<String> {
    FEATURE_GROUPS
        .iter()
        .flat_map(|(name, _)| {
            let name = *name;
            columns
                .iter()
                .filter(move |c| {
                    !CORE_COLUMNS.contains(&c.as_str()) && feature_group(c) == Some(name)
                })
        })
        .cloned()
        .collect()
}

/// Select core and feature columns and drop rows missing critical values
///
/// Auxiliary feature nulls never drop a row. With `fill_auxiliary_nulls` they
/// are replaced with 0; otherwise they stay missing.
pub fn assemble(wide: &FeatureTable, fill_auxiliary_nulls: bool) -> Result<(FeatureTable, usize)> {
    let mut selected: Vec<String> = CORE_COLUMNS.iter().map(|c| c.to_string()).collect();
    selected.extend(feature_columns(wide.columns()));
    let table = wide.select(&selected)?;

    let critical = CRITICAL_COLUMNS
        .iter()
        .map(|c| table.require_column(c))
        .collect::<Result<Vec<_>>>()?;
    let mut kept = table.filter_rows(|row| critical.iter().all(|&i| !row[i].is_missing()));
    let dropped = table.len() - kept.len();

    if fill_auxiliary_nulls {
        kept.fill_missing(&Value::Int(0), CORE_COLUMNS);
    }

    log::info!(
        "Assembled {} plays x {} columns ({} dropped for missing critical fields)",
        kept.len(),
        kept.width(),
        dropped
    );
    Ok((kept, dropped))
}

#[derive(Debug, Clone, Serialize, PartialEq)]
pub struct GroupSummary {
    pub name: String,
    pub columns: Vec<String>,
}

/// Counts and names of the written feature columns
#[derive(Debug, Clone, Serialize, PartialEq)]
pub struct FeatureSummary {
    pub seasons: Vec<u16>,
    pub total_plays: usize,
    pub dropped_plays: usize,
    pub total_columns: usize,
    pub groups: Vec<GroupSummary>,
}

impl FeatureSummary {
    pub fn from_table(table: &FeatureTable, seasons: &[u16], dropped_plays: usize) -> Self {
        let mut groups = vec![GroupSummary {
            name: "Core".to_string(),
            columns: table
                .columns()
                .iter()
                .filter(|c| CORE_COLUMNS.contains(&c.as_str()))
                .cloned()
                .collect(),
        }];
        for (name, _) in FEATURE_GROUPS {
            let mut columns: Vec<String> = table
                .columns()
                .iter()
                .filter(|c| !CORE_COLUMNS.contains(&c.as_str()) && feature_group(c) == Some(*name))
                .cloned()
                .collect();
            columns.sort();
            groups.push(GroupSummary {
                name: name.to_string(),
                columns,
            });
        }

        FeatureSummary {
            seasons: seasons.to_vec(),
            total_plays: table.len(),
            dropped_plays,
            total_columns: table.width(),
            groups,
        }
    }

    /// Columns outside the core set
    pub fn feature_count(&self) -> usize {
        self.groups
            .iter()
            .filter(|g| g.name != "Core")
            .map(|g| g.columns.len())
            .sum()
    }

    /// Plain-text report; `generated` is the timestamp line
    pub fn render(&self, generated: &str) -> String {
        let rule = "=".repeat(80);
        let mut out = String::new();
        out.push_str(&format!("{}\nPLAY-CALL FEATURE SUMMARY\nGenerated: {}\n{}\n\n", rule, generated, rule));
        out.push_str(&format!("Seasons: {}\n", season_range(&self.seasons)));
        out.push_str(&format!("Total plays: {}\n", self.total_plays));
        out.push_str(&format!("Dropped plays (missing critical fields): {}\n", self.dropped_plays));
        out.push_str(&format!("Total columns: {}\n", self.total_columns));
        out.push_str(&format!("Total features: {}\n\n", self.feature_count()));

        out.push_str(&format!("FEATURE GROUPS:\n{}\n", "-".repeat(80)));
        for group in &self.groups {
            out.push_str(&format!("{}: {}\n", group.name, group.columns.len()));
        }

        out.push_str(&format!("\n{}\nALL FEATURES BY CATEGORY:\n{}\n", rule, rule));
        for group in self.groups.iter().filter(|g| !g.columns.is_empty()) {
            out.push_str(&format!("\n{}:\n{}\n", group.name, "-".repeat(40)));
            for column in &group.columns {
                out.push_str(&format!("  - {}\n", column));
            }
        }
        out
    }
}

/// "2024" for one season, "2021-2025" for a range
pub fn season_range(seasons: &[u16]) -> String {
    match (seasons.iter().min(), seasons.iter().max()) {
        (Some(first), Some(last)) if first == last => first.to_string(),
        (Some(first), Some(last)) => format!("{}-{}", first, last),
        _ => "none".to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn wide() -> FeatureTable {
        let mut columns: Vec<String> = CORE_COLUMNS.iter().map(|c| c.to_string()).collect();
        columns.extend(
            [
                "situation_third_down",
                "yards_gained",
                "team_pass_rate_goal_line",
                "momentum_epa_last_3",
                "distance_category",
            ]
            .iter()
            .map(|c| c.to_string()),
        );
        let mut table = FeatureTable::new(columns);

        let mut row = |down: Value, goal_line: Value| {
            let mut cells = vec![
                Value::text("g1"),
                Value::Int(1),
                Value::text("KC"),
                Value::text("BAL"),
                Value::Int(1),
                Value::Int(2024),
                Value::Int(1),
                down,
                Value::Int(10),
                Value::Int(50),
                Value::Int(0),
                Value::Int(1),
                Value::Float(1500.0),
                Value::Float(3300.0),
            ];
            cells.extend([
                Value::Int(0),
                Value::Float(7.0),
                goal_line,
                Value::Missing,
                Value::text("long"),
            ]);
            table.push_row(cells).unwrap();
        };
        row(Value::Int(1), Value::Missing);
        row(Value::Missing, Value::Float(0.5));
        table
    }

    #[test]
    fn test_selects_core_then_groups() {
        let (table, _) = assemble(&wide(), false).unwrap();
        let columns = table.columns();
        assert_eq!(&columns[..CORE_COLUMNS.len()], CORE_COLUMNS);
        assert_eq!(
            &columns[CORE_COLUMNS.len()..],
            &[
                "team_pass_rate_goal_line".to_string(),
                "momentum_epa_last_3".to_string(),
                "situation_third_down".to_string(),
            ]
        );
        assert!(table.column_index("yards_gained").is_none());
    }

    #[test]
    fn test_null_auxiliary_feature_keeps_row() {
        let (table, dropped) = assemble(&wide(), false).unwrap();
        // Row 2 has no down; row 1 only lacks auxiliary features
        assert_eq!(dropped, 1);
        assert_eq!(table.len(), 1);
        assert_eq!(table.get(0, "team_pass_rate_goal_line"), Some(&Value::Missing));
    }

    #[test]
    fn test_fill_auxiliary_nulls() {
        let (table, _) = assemble(&wide(), true).unwrap();
        assert_eq!(table.get(0, "team_pass_rate_goal_line"), Some(&Value::Int(0)));
        assert_eq!(table.get(0, "momentum_epa_last_3"), Some(&Value::Int(0)));
    }

    #[test]
    fn test_missing_core_column_is_fatal() {
        let table = FeatureTable::new(vec!["game_id".to_string()]);
        assert!(assemble(&table, false).is_err());
    }

    #[test]
    fn test_summary_groups() {
        let (table, dropped) = assemble(&wide(), false).unwrap();
        let summary = FeatureSummary::from_table(&table, &[2024], dropped);
        assert_eq!(summary.feature_count(), 3);
        assert_eq!(summary.groups[0].columns.len(), CORE_COLUMNS.len());

        let text = summary.render("2026-01-01 00:00:00");
        assert!(text.contains("Total plays: 1\n"));
        assert!(text.contains("Momentum: 1\n"));
        assert!(text.contains("  - team_pass_rate_goal_line\n"));
        assert!(text.contains("Seasons: 2024\n"));
    }

    #[test]
    fn test_season_range() {
        assert_eq!(season_range(&[2024]), "2024");
        assert_eq!(season_range(&[2025, 2021, 2023]), "2021-2025");
    }
}
