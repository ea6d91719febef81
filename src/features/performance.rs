//! Team-level offensive efficiency from weekly player stats
//!
//! Player lines are summed into team-week totals per position group, made
//! cumulative within a season, then looked up as of the last week strictly
//! before the play's week. Stats are never joined per player: which player is
//! attached to a play depends on the play call itself.

use std::collections::BTreeMap;
use std::ops::Bound;

use crate::data::{PlayerWeekStats, PositionGroup};
use crate::features::FeatureGroup;
use crate::table::Value;
use crate::{PlayRecord, TeamCode};

/// Counting stats for one team, summed over a set of weeks
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct TeamTotals {
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
    /// Weeks contributing to the totals
    pub weeks: u32,
}

impl TeamTotals {
    /// Add a player's week into the group it belongs to
    pub fn add_line(&mut self, line: &PlayerWeekStats) {
        match line.position {
            PositionGroup::Quarterback => {
                self.completions += line.completions;
                self.attempts += line.attempts;
                self.passing_yards += line.passing_yards;
                self.passing_tds += line.passing_tds;
                self.interceptions += line.interceptions;
            }
            PositionGroup::RunningBack => {
                self.carries += line.carries;
                self.rushing_yards += line.rushing_yards;
                self.rushing_tds += line.rushing_tds;
            }
            PositionGroup::Receiver => {
                self.receptions += line.receptions;
                self.targets += line.targets;
                self.receiving_yards += line.receiving_yards;
            }
            PositionGroup::Other => {}
        }
    }

    pub fn merge(&mut self, other: &TeamTotals) {
        self.completions += other.completions;
        self.attempts += other.attempts;
        self.passing_yards += other.passing_yards;
        self.passing_tds += other.passing_tds;
        self.interceptions += other.interceptions;
        self.carries += other.carries;
        self.rushing_yards += other.rushing_yards;
        self.rushing_tds += other.rushing_tds;
        self.receptions += other.receptions;
        self.targets += other.targets;
        self.receiving_yards += other.receiving_yards;
        self.weeks += other.weeks;
    }

    pub fn features(&self) -> PerformanceFeatures {
        let weeks = f64::from(self.weeks);
        PerformanceFeatures {
            qb_completion_pct: ratio(self.completions, self.attempts),
            qb_yards_per_attempt: ratio(self.passing_yards, self.attempts),
            qb_td_int_ratio: self.passing_tds / self.interceptions.max(1.0),
            rb_yards_per_carry: ratio(self.rushing_yards, self.carries),
            rb_tds_per_game: ratio(self.rushing_tds, weeks),
            receiver_catch_rate: ratio(self.receptions, self.targets),
            receiver_yards_per_reception: ratio(self.receiving_yards, self.receptions),
            receiver_targets_per_game: ratio(self.targets, weeks),
        }
    }
}

/// Division that resolves to 0.0 on a zero denominator
fn ratio(numerator: f64, denominator: f64) -> f64 {
    if denominator == 0.0 {
        0.0
    } else {
        numerator / denominator
    }
}

/// Season-to-date team totals per week
#[derive(Debug, Default)]
pub struct TeamPerformance {
    /// Cumulative totals through each (team, season, week) with data
    cumulative: BTreeMap<(TeamCode, u16, u8), TeamTotals>,
}

impl TeamPerformance {
    pub fn new(lines: &[PlayerWeekStats]) -> Self {
        let mut weekly: BTreeMap<(TeamCode, u16, u8), TeamTotals> = BTreeMap::new();
        for line in lines {
            weekly
                .entry((line.team.clone(), line.season, line.week))
                .or_insert_with(|| TeamTotals {
                    weeks: 1,
                    ..TeamTotals::default()
                })
                .add_line(line);
        }

        // Keys are ordered by team, season, week so a running sum per (team, season) works
        let mut cumulative = BTreeMap::new();
        let mut running = TeamTotals::default();
        let mut current: Option<(TeamCode, u16)> = None;
        for ((team, season, week), totals) in weekly {
            if current.as_ref() != Some(&(team.clone(), season)) {
                running = TeamTotals::default();
                current = Some((team.clone(), season));
            }
            running.merge(&totals);
            cumulative.insert((team, season, week), running);
        }

        TeamPerformance { cumulative }
    }

    pub fn len(&self) -> usize {
        self.cumulative.len()
    }

    pub fn is_empty(&self) -> bool {
        self.cumulative.is_empty()
    }

    /// Totals through the latest week strictly before `week`
    pub fn totals_before(&self, team: &TeamCode, season: u16, week: u8) -> TeamTotals {
        self.cumulative
            .range((
                Bound::Included((team.clone(), season, u8::MIN)),
                Bound::Excluded((team.clone(), season, week)),
            ))
            .next_back()
            .map(|(_, totals)| *totals)
            .unwrap_or_default()
    }

    pub fn features(&self, play: &PlayRecord) -> PerformanceFeatures {
        self.totals_before(&play.posteam, play.season, play.week)
            .features()
    }
}

/// Possessing team's season-to-date efficiency before the play's week
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct PerformanceFeatures {
    pub qb_completion_pct: f64,
    pub qb_yards_per_attempt: f64,
    pub qb_td_int_ratio: f64,
    pub rb_yards_per_carry: f64,
    pub rb_tds_per_game: f64,
    pub receiver_catch_rate: f64,
    pub receiver_yards_per_reception: f64,
    pub receiver_targets_per_game: f64,
}

impl FeatureGroup for PerformanceFeatures {
    const NAMES: &'static [&'static str] = &[
        "team_qb_completion_pct",
        "team_qb_yards_per_attempt",
        "team_qb_td_int_ratio",
        "team_rb_yards_per_carry",
        "team_rb_tds_per_game",
        "team_receiver_catch_rate",
        "team_receiver_yards_per_reception",
        "team_receiver_targets_per_game",
    ];

    fn to_vec(&self) -> Vec<Value> {
        vec![
            Value::float(self.qb_completion_pct),
            Value::float(self.qb_yards_per_attempt),
            Value::float(self.qb_td_int_ratio),
            Value::float(self.rb_yards_per_carry),
            Value::float(self.rb_tds_per_game),
            Value::float(self.receiver_catch_rate),
            Value::float(self.receiver_yards_per_reception),
            Value::float(self.receiver_targets_per_game),
        ]
    }
}

pub fn join_performance(
    plays: &[PlayRecord],
    performance: &TeamPerformance,
) -> Vec<PerformanceFeatures> {
    plays.iter().map(|p| performance.features(p)).collect()
}
