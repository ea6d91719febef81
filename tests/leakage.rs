//! Pre-snap invariants of the assembled feature table

use playcall::data::{InputTables, PlayerWeekStats, PositionGroup};
use playcall::pipeline::build_features;
use playcall::table::{FeatureTable, Value};
use playcall::{PipelineConfig, PlayRecord, PlayType, Side, TeamCode, TendencyScope};

fn play(game: &str, play_id: u64, drive: u32, epa: f64, yards: f64) -> PlayRecord {
    PlayRecord {
        game_id: game.to_string(),
        play_id,
        drive: Some(drive),
        season: 2024,
        week: 1,
        posteam: TeamCode::new("KC"),
        defteam: TeamCode::new("BAL"),
        posteam_type: Some(Side::Home),
        down: Some(1),
        ydstogo: Some(10),
        yardline_100: Some(60),
        score_differential: Some(0),
        qtr: Some(1),
        half_seconds_remaining: Some(1500.0),
        game_seconds_remaining: Some(3300.0 - play_id as f64 * 30.0),
        play_type: if play_id % 2 == 0 { PlayType::Pass } else { PlayType::Run },
        no_huddle: Some(false),
        shotgun: Some(true),
        yards_gained: Some(yards),
        epa: Some(epa),
        first_down_rush: Some(false),
        first_down_pass: Some(yards >= 10.0),
    }
}

fn config(scope: TendencyScope) -> PipelineConfig {
    PipelineConfig {
        tendency_scope: scope,
        fill_auxiliary_nulls: false,
    }
}

fn build(plays: Vec<PlayRecord>, scope: TendencyScope) -> FeatureTable {
    let tables = InputTables {
        plays,
        ..InputTables::default()
    };
    build_features(tables, &config(scope)).unwrap().table
}

fn float(table: &FeatureTable, row: usize, column: &str) -> Option<f64> {
    table.get(row, column).and_then(Value::as_f64)
}

fn drive_of_plays() -> Vec<PlayRecord> {
    let mut plays = Vec::new();
    let mut id = 1;
    for drive in 1..=4 {
        for k in 0..6 {
            let epa = ((drive * 7 + k * 3) % 5) as f64 - 2.0;
            let yards = ((drive * 11 + k * 5) % 17) as f64 - 2.0;
            plays.push(play("2024_01_BAL_KC", id, drive, epa, yards));
            id += 1;
        }
    }
    plays
}

const MOMENTUM_COLUMNS: [&str; 8] = [
    "momentum_success_last_3",
    "momentum_epa_last_3",
    "momentum_explosive_last_5",
    "drive_total_yards",
    "drive_play_count",
    "drive_first_downs",
    "drive_epa",
    "drive_yards_per_play",
];

#[test]
fn three_play_drive_uses_only_earlier_plays() {
    let plays = vec![
        play("g1", 1, 1, 0.5, 4.0),
        play("g1", 2, 1, -0.2, -1.0),
        play("g1", 3, 1, 1.0, 12.0),
    ];
    let table = build(plays, TendencyScope::FullCorpus);

    let epa = float(&table, 2, "momentum_epa_last_3").unwrap();
    assert!((epa - 0.15).abs() < 1e-9);
    assert_eq!(table.get(2, "momentum_explosive_last_5"), Some(&Value::Int(0)));
    assert_eq!(table.get(2, "drive_play_count"), Some(&Value::Int(2)));
}

#[test]
fn first_play_of_each_drive_has_no_history() {
    let table = build(drive_of_plays(), TendencyScope::FullCorpus);
    for row in (0..24).step_by(6) {
        assert_eq!(float(&table, row, "drive_total_yards"), Some(0.0));
        assert_eq!(table.get(row, "drive_play_count"), Some(&Value::Int(0)));
        assert_eq!(table.get(row, "drive_first_downs"), Some(&Value::Int(0)));
        assert_eq!(float(&table, row, "drive_epa"), Some(0.0));
        assert_eq!(table.get(row, "momentum_epa_last_3"), Some(&Value::Missing));
        assert_eq!(table.get(row, "drive_yards_per_play"), Some(&Value::Missing));
    }
}

#[test]
fn momentum_ignores_the_current_play_outcome() {
    let baseline = build(drive_of_plays(), TendencyScope::FullCorpus);

    for target in 0..24 {
        let mut plays = drive_of_plays();
        plays[target].epa = Some(25.0);
        plays[target].yards_gained = Some(80.0);
        plays[target].first_down_pass = Some(true);
        let changed = build(plays, TendencyScope::FullCorpus);

        for column in MOMENTUM_COLUMNS {
            assert_eq!(
                baseline.get(target, column),
                changed.get(target, column),
                "{} changed for row {}",
                column,
                target
            );
        }
    }
}

#[test]
fn prior_week_tendencies_ignore_current_week_calls() {
    let mut plays = drive_of_plays();
    for p in plays.iter_mut().skip(12) {
        p.week = 2;
        p.game_id = "2024_02_KC_LV".to_string();
    }
    let baseline = build(plays.clone(), TendencyScope::PriorWeeks);

    for p in plays.iter_mut().skip(12) {
        p.play_type = PlayType::Pass;
    }
    let flipped = build(plays, TendencyScope::PriorWeeks);

    for row in 12..24 {
        assert_eq!(
            baseline.get(row, "team_pass_rate_overall"),
            flipped.get(row, "team_pass_rate_overall")
        );
    }
    // Week 1 has no earlier weeks to draw on
    assert_eq!(baseline.get(0, "team_pass_rate_overall"), Some(&Value::Missing));
    // Week 2 sees week 1's even/odd alternation
    assert_eq!(float(&baseline, 12, "team_pass_rate_overall"), Some(0.5));
}

#[test]
fn tendency_rate_is_exact_and_empty_bucket_is_missing() {
    let mut plays = drive_of_plays();
    for (i, p) in plays.iter_mut().enumerate() {
        p.down = Some(if i % 3 == 0 { 3 } else { 1 });
    }
    let passes_on_third = plays
        .iter()
        .filter(|p| p.down == Some(3) && p.play_type == PlayType::Pass)
        .count() as f64;
    let third = plays.iter().filter(|p| p.down == Some(3)).count() as f64;

    let table = build(plays, TendencyScope::FullCorpus);
    assert_eq!(
        float(&table, 0, "team_pass_rate_down_3"),
        Some(passes_on_third / third)
    );

    // Every snap is at the 40: no goal line observations, but rows are kept
    assert_eq!(table.len(), 24);
    for row in 0..24 {
        assert_eq!(table.get(row, "team_pass_rate_goal_line"), Some(&Value::Missing));
        assert_eq!(table.get(row, "team_pass_rate_down_4"), Some(&Value::Missing));
    }
}

#[test]
fn performance_joins_only_prior_weeks() {
    fn qb(week: u8, completions: f64) -> PlayerWeekStats {
        PlayerWeekStats {
            player_id: "qb1".to_string(),
            team: TeamCode::new("KC"),
            season: 2024,
            week,
            position: PositionGroup::Quarterback,
            completions,
            attempts: 40.0,
            passing_yards: 300.0,
            passing_tds: 2.0,
            interceptions: 1.0,
            carries: 0.0,
            rushing_yards: 0.0,
            rushing_tds: 0.0,
            receptions: 0.0,
            targets: 0.0,
            receiving_yards: 0.0,
        }
    }

    let mut plays = Vec::new();
    for week in 1..=3u8 {
        let mut p = play(&format!("2024_0{}_KC_X", week), 1, 1, 0.0, 0.0);
        p.week = week;
        plays.push(p);
    }

    let run = |week3_completions: f64| {
        let tables = InputTables {
            plays: plays.clone(),
            player_stats: vec![qb(1, 20.0), qb(2, 30.0), qb(3, week3_completions)],
            ..InputTables::default()
        };
        build_features(tables, &config(TendencyScope::PriorWeeks))
            .unwrap()
            .table
    };

    let table = run(40.0);
    assert_eq!(float(&table, 0, "team_qb_completion_pct"), Some(0.0));
    assert_eq!(float(&table, 1, "team_qb_completion_pct"), Some(0.5));
    assert_eq!(float(&table, 2, "team_qb_completion_pct"), Some(50.0 / 80.0));

    let changed = run(0.0);
    assert_eq!(
        table.get(2, "team_qb_completion_pct"),
        changed.get(2, "team_qb_completion_pct")
    );
}

#[test]
fn pipeline_is_idempotent() {
    let render = |plays: Vec<PlayRecord>| {
        let mut buf = Vec::new();
        build(plays, TendencyScope::PriorWeeks)
            .write_csv(&mut buf)
            .unwrap();
        buf
    };
    let first = render(drive_of_plays());
    let second = render(drive_of_plays());
    assert_eq!(first, second);

    let mut shuffled = drive_of_plays();
    shuffled.reverse();
    assert_eq!(first, render(shuffled));
}

#[test]
fn rows_missing_critical_fields_are_dropped() {
    let mut plays = drive_of_plays();
    plays[4].ydstogo = None;
    plays[5].score_differential = None;
    plays[6].qtr = None;
    let tables = InputTables {
        plays,
        ..InputTables::default()
    };
    let output = build_features(tables, &config(TendencyScope::FullCorpus)).unwrap();
    assert_eq!(output.dropped_plays, 2);
    assert_eq!(output.table.len(), 22);
}
