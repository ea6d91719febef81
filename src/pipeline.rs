//! Feature pipeline
//!
//! Sorts plays, runs every feature stage, lays the results out as one wide
//! table and assembles the final feature table. Stages only read their inputs;
//! each returns one feature struct per play, aligned with the sorted plays.

use std::path::{Path, PathBuf};

use chrono::Local;

use crate::data::{load_seasons, InputTables};
use crate::features::assembler::season_range;
use crate::features::context::join_context;
use crate::features::fatigue::compute_fatigue;
use crate::features::momentum::compute_momentum;
use crate::features::performance::join_performance;
use crate::features::personnel::join_personnel;
use crate::features::situation::categorize_all;
use crate::features::tendencies::compute_tendencies;
use crate::features::{
    assemble, ensure_play_order, ContextFeatures, FatigueFeatures, FeatureGroup, FeatureSummary,
    MomentumFeatures, PerformanceFeatures, PersonnelFeatures, PersonnelIndex, ScheduleIndex,
    SituationFlags, TeamPerformance, TendencyFeatures,
};
use crate::table::{FeatureTable, Value};
use crate::{Config, PipelineConfig, PlayCallError, PlayRecord, Result};

/// Raw columns carried in the wide table but not in the final selection
const PASSTHROUGH_COLUMNS: &[&str] = &[
    "drive",
    "play_type",
    "yards_gained",
    "epa",
    "distance_category",
    "field_position_category",
    "score_situation",
];

/// Final feature table plus bookkeeping
#[derive(Debug, Clone)]
pub struct PipelineOutput {
    pub table: FeatureTable,
    pub dropped_plays: usize,
}

/// Files written by a run
#[derive(Debug, Clone)]
pub struct OutputPaths {
    pub features: PathBuf,
    pub summary: PathBuf,
    pub summary_json: PathBuf,
}

impl OutputPaths {
    pub fn new(output_dir: &Path, seasons: &[u16]) -> Self {
        let range = season_range(seasons);
        OutputPaths {
            features: output_dir.join(format!("dc_features_{}.csv", range)),
            summary: output_dir.join(format!("feature_summary_{}.txt", range)),
            summary_json: output_dir.join(format!("feature_summary_{}.json", range)),
        }
    }
}

/// Stable sort by (game, play) and verify the result is a valid play order
///
/// Duplicate (game, play) pairs survive a sort and are rejected here.
pub fn sort_plays(mut plays: Vec<PlayRecord>) -> Result<Vec<PlayRecord>> {
    plays.sort_by(|a, b| {
        a.game_id
            .cmp(&b.game_id)
            .then_with(|| a.play_id.cmp(&b.play_id))
    });
    ensure_play_order(&plays)?;
    Ok(plays)
}

fn wide_columns() -> Vec<String> {
    let groups: [&[&str]; 8] = [
        TendencyFeatures::NAMES,
        MomentumFeatures::NAMES,
        FatigueFeatures::NAMES,
        PersonnelFeatures::NAMES,
        ContextFeatures::NAMES,
        PerformanceFeatures::NAMES,
        SituationFlags::NAMES,
        PASSTHROUGH_COLUMNS,
    ];
    crate::features::assembler::CORE_COLUMNS
        .iter()
        .chain(groups.iter().flat_map(|g| g.iter()))
        .map(|c| c.to_string())
        .collect()
}

fn core_values(play: &PlayRecord) -> Vec<Value> {
    vec![
        Value::text(play.game_id.clone()),
        Value::Int(play.play_id as i64),
        Value::text(play.posteam.as_str()),
        Value::text(play.defteam.as_str()),
        Value::Int(i64::from(play.week)),
        Value::Int(i64::from(play.season)),
        Value::flag(play.is_pass()),
        Value::opt_int(play.down),
        Value::opt_int(play.ydstogo),
        Value::opt_int(play.yardline_100),
        Value::opt_int(play.score_differential),
        Value::opt_int(play.qtr),
        Value::opt_float(play.half_seconds_remaining),
        Value::opt_float(play.game_seconds_remaining),
    ]
}

/// Run every stage over sorted plays and lay the results out as one wide table
pub fn build_wide_table(
    plays: &[PlayRecord],
    tables: &InputTables,
    config: &PipelineConfig,
) -> Result<FeatureTable> {
    ensure_play_order(plays)?;

    let categories = categorize_all(plays);
    log::info!("Situation categories: {} plays", categories.len());

    let tendencies = compute_tendencies(plays, &categories, config.tendency_scope);
    log::info!("Team tendencies ({:?})", config.tendency_scope);

    let momentum = compute_momentum(plays)?;
    log::info!("Momentum: {} plays", momentum.len());

    let fatigue = compute_fatigue(plays)?;
    log::info!("Fatigue: {} plays", fatigue.len());

    let personnel_index = PersonnelIndex::new(&tables.participation);
    let personnel = join_personnel(plays, &personnel_index);
    log::info!("Personnel: {} participation rows indexed", personnel_index.len());

    let schedule_index = ScheduleIndex::new(&tables.schedules);
    let context = join_context(plays, &schedule_index);
    log::info!("Context: {} games indexed", schedule_index.len());

    let team_performance = TeamPerformance::new(&tables.player_stats);
    let performance = join_performance(plays, &team_performance);
    log::info!("Team performance: {} team-weeks", team_performance.len());

    let mut table = FeatureTable::new(wide_columns());
    for (i, play) in plays.iter().enumerate() {
        let cats = &categories[i];
        let mut row = core_values(play);
        row.extend(tendencies[i].to_vec());
        row.extend(momentum[i].to_vec());
        row.extend(fatigue[i].to_vec());
        row.extend(personnel[i].to_vec());
        row.extend(context[i].to_vec());
        row.extend(performance[i].to_vec());
        row.extend(SituationFlags::compute(play, cats).to_vec());
        row.extend([
            Value::opt_int(play.drive),
            Value::text(play.play_type.to_string()),
            Value::opt_float(play.yards_gained),
            Value::opt_float(play.epa),
            cats.distance.map_or(Value::Missing, |c| Value::text(c.label())),
            cats.field_position
                .map_or(Value::Missing, |c| Value::text(c.label())),
            cats.score.map_or(Value::Missing, |c| Value::text(c.label())),
        ]);
        table.push_row(row)?;
    }
    Ok(table)
}

/// Build the final feature table from loaded input tables
pub fn build_features(mut tables: InputTables, config: &PipelineConfig) -> Result<PipelineOutput> {
    if tables.plays.is_empty() {
        return Err(PlayCallError::Empty("no plays loaded".to_string()));
    }
    let plays = sort_plays(std::mem::take(&mut tables.plays))?;
    log::info!("Engineering features for {} plays", plays.len());

    let wide = build_wide_table(&plays, &tables, config)?;
    let (table, dropped_plays) = assemble(&wide, config.fill_auxiliary_nulls)?;
    Ok(PipelineOutput {
        table,
        dropped_plays,
    })
}

/// Write the feature file and both summaries
pub fn write_outputs(
    output: &PipelineOutput,
    output_dir: &Path,
    seasons: &[u16],
) -> Result<(OutputPaths, FeatureSummary)> {
    let paths = OutputPaths::new(output_dir, seasons);
    output.table.save(&paths.features)?;
    log::info!("Features saved: {}", paths.features.display());

    let summary = FeatureSummary::from_table(&output.table, seasons, output.dropped_plays);
    let generated = Local::now().format("%Y-%m-%d %H:%M:%S").to_string();
    std::fs::write(&paths.summary, summary.render(&generated))?;

    let json = serde_json::to_string_pretty(&summary)
        .map_err(|e| PlayCallError::Serialization(e.to_string()))?;
    std::fs::write(&paths.summary_json, json)?;
    log::info!("Summary saved: {}", paths.summary.display());

    Ok((paths, summary))
}

/// Load, build and write features for `seasons`
pub fn run(config: &Config, seasons: &[u16]) -> Result<(OutputPaths, FeatureSummary)> {
    if seasons.is_empty() {
        return Err(PlayCallError::Config("no seasons selected".to_string()));
    }
    let tables = load_seasons(Path::new(&config.data.cache_dir), seasons)?;
    let output = build_features(tables, &config.pipeline)?;
    write_outputs(&output, Path::new(&config.data.output_dir), seasons)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::features::test_support::make_play;
    use crate::TendencyScope;

    fn config() -> PipelineConfig {
        PipelineConfig {
            tendency_scope: TendencyScope::PriorWeeks,
            fill_auxiliary_nulls: false,
        }
    }

    #[test]
    fn test_sort_plays_orders_by_game_then_play() {
        let plays = vec![
            make_play("g2", 1, 1),
            make_play("g1", 7, 1),
            make_play("g1", 3, 1),
        ];
        let sorted = sort_plays(plays).unwrap();
        let keys: Vec<(&str, u64)> = sorted
            .iter()
            .map(|p| (p.game_id.as_str(), p.play_id))
            .collect();
        assert_eq!(keys, vec![("g1", 3), ("g1", 7), ("g2", 1)]);
    }

    #[test]
    fn test_sort_plays_rejects_duplicates() {
        let plays = vec![make_play("g1", 3, 1), make_play("g1", 3, 1)];
        assert!(sort_plays(plays).is_err());
    }

    #[test]
    fn test_wide_row_width_matches_columns() {
        let plays = vec![make_play("g1", 1, 1), make_play("g1", 2, 1)];
        let wide = build_wide_table(&plays, &InputTables::default(), &config()).unwrap();
        assert_eq!(wide.len(), 2);
        assert_eq!(wide.get(0, "distance_category"), Some(&Value::text("long")));
        assert_eq!(wide.get(1, "drive_play_count"), Some(&Value::Int(1)));
    }

    #[test]
    fn test_outcome_columns_not_in_final_table() {
        let tables = InputTables {
            plays: vec![make_play("g1", 2, 1), make_play("g1", 1, 1)],
            ..InputTables::default()
        };
        let output = build_features(tables, &config()).unwrap();
        for column in ["yards_gained", "epa", "play_type", "drive"] {
            assert!(output.table.column_index(column).is_none(), "{}", column);
        }
        assert_eq!(output.table.get(0, "play_id"), Some(&Value::Int(1)));
    }

    #[test]
    fn test_output_paths() {
        let paths = OutputPaths::new(Path::new("out"), &[2021, 2025]);
        assert_eq!(paths.features, Path::new("out/dc_features_2021-2025.csv"));
        assert_eq!(paths.summary, Path::new("out/feature_summary_2021-2025.txt"));

        let paths = OutputPaths::new(Path::new("out"), &[2024]);
        assert_eq!(paths.features, Path::new("out/dc_features_2024.csv"));
    }
}
