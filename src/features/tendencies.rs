//! Team tendency features
//!
//! Pass rates per possessing team, overall and sliced by down, distance,
//! field position, score situation and three special filters. Rates are the
//! plain share of pass calls with no smoothing; an empty slice has no rate.

use std::collections::{BTreeMap, HashMap};
use std::ops::Bound;

use serde::{Deserialize, Serialize};

use crate::features::situation::SituationCategories;
use crate::features::FeatureGroup;
use crate::table::Value;
use crate::{PlayRecord, TeamCode};

/// Which plays feed the rates joined to a given play
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TendencyScope {
    /// Every loaded play for the team, across all seasons
    FullCorpus,
    /// Every play for the team in the same season
    Season,
    /// The team's plays in the same season from earlier weeks only
    #[default]
    PriorWeeks,
}

#[derive(Debug, Clone, Copy, Default, PartialEq)]
struct PassCounter {
    passes: u32,
    plays: u32,
}

impl PassCounter {
    fn record(&mut self, is_pass: bool) {
        self.plays += 1;
        self.passes += u32::from(is_pass);
    }

    fn merge(&mut self, other: &PassCounter) {
        self.plays += other.plays;
        self.passes += other.passes;
    }

    fn rate(&self) -> Option<f64> {
        if self.plays == 0 {
            None
        } else {
            Some(self.passes as f64 / self.plays as f64)
        }
    }
}

/// Pass/play counts for every tendency slice
#[derive(Debug, Clone, Default, PartialEq)]
pub struct TendencyCounts {
    overall: PassCounter,
    by_down: [PassCounter; 4],
    by_distance: [PassCounter; 3],
    by_field: [PassCounter; 5],
    by_score: [PassCounter; 5],
    red_zone: PassCounter,
    fourth_quarter: PassCounter,
    two_minute: PassCounter,
}

impl TendencyCounts {
    /// Count one play into every slice it belongs to
    ///
    /// A play with a missing input still counts toward the overall rate but
    /// not toward slices it cannot be placed in.
    pub fn update(&mut self, play: &PlayRecord, categories: &SituationCategories) {
        let is_pass = play.is_pass();
        self.overall.record(is_pass);

        if let Some(down) = play.down.filter(|d| (1..=4).contains(d)) {
            self.by_down[usize::from(down - 1)].record(is_pass);
        }
        if let Some(distance) = categories.distance {
            self.by_distance[distance.index()].record(is_pass);
        }
        if let Some(field) = categories.field_position {
            self.by_field[field.index()].record(is_pass);
        }
        if let Some(score) = categories.score {
            self.by_score[score.index()].record(is_pass);
        }
        if play.yardline_100.is_some_and(|y| y <= 20) {
            self.red_zone.record(is_pass);
        }
        if categories.fourth_quarter == Some(true) {
            self.fourth_quarter.record(is_pass);
        }
        if categories.two_minute_drill == Some(true) {
            self.two_minute.record(is_pass);
        }
    }

    pub fn merge(&mut self, other: &TendencyCounts) {
        self.overall.merge(&other.overall);
        for (a, b) in self.by_down.iter_mut().zip(&other.by_down) {
            a.merge(b);
        }
        for (a, b) in self.by_distance.iter_mut().zip(&other.by_distance) {
            a.merge(b);
        }
        for (a, b) in self.by_field.iter_mut().zip(&other.by_field) {
            a.merge(b);
        }
        for (a, b) in self.by_score.iter_mut().zip(&other.by_score) {
            a.merge(b);
        }
        self.red_zone.merge(&other.red_zone);
        self.fourth_quarter.merge(&other.fourth_quarter);
        self.two_minute.merge(&other.two_minute);
    }

    pub fn plays(&self) -> u32 {
        self.overall.plays
    }

    pub fn rates(&self) -> TendencyFeatures {
        TendencyFeatures {
            overall: self.overall.rate(),
            by_down: self.by_down.map(|c| c.rate()),
            by_distance: self.by_distance.map(|c| c.rate()),
            by_field: self.by_field.map(|c| c.rate()),
            by_score: self.by_score.map(|c| c.rate()),
            red_zone: self.red_zone.rate(),
            fourth_quarter: self.fourth_quarter.rate(),
            two_minute: self.two_minute.rate(),
        }
    }
}

/// Pass rates joined to a play
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct TendencyFeatures {
    pub overall: Option<f64>,
    /// Downs 1 to 4
    pub by_down: [Option<f64>; 4],
    /// Short, medium, long
    pub by_distance: [Option<f64>; 3],
    /// Own territory through goal line
    pub by_field: [Option<f64>; 5],
    /// Trailing big through leading big
    pub by_score: [Option<f64>; 5],
    pub red_zone: Option<f64>,
    pub fourth_quarter: Option<f64>,
    pub two_minute: Option<f64>,
}

impl FeatureGroup for TendencyFeatures {
    const NAMES: &'static [&'static str] = &[
        "team_pass_rate_overall",
        "team_pass_rate_down_1",
        "team_pass_rate_down_2",
        "team_pass_rate_down_3",
        "team_pass_rate_down_4",
        "team_pass_rate_short_distance",
        "team_pass_rate_medium_distance",
        "team_pass_rate_long_distance",
        "team_pass_rate_own_territory",
        "team_pass_rate_midfield_approach",
        "team_pass_rate_opponent_territory",
        "team_pass_rate_red_zone",
        "team_pass_rate_goal_line",
        "team_pass_rate_trailing_big",
        "team_pass_rate_trailing_small",
        "team_pass_rate_tied",
        "team_pass_rate_leading_small",
        "team_pass_rate_leading_big",
        "team_pass_rate_red_zone_special",
        "team_pass_rate_q4",
        "team_pass_rate_two_minute",
    ];

    fn to_vec(&self) -> Vec<Value> {
        let mut values = Vec::with_capacity(Self::NAMES.len());
        values.push(Value::opt_float(self.overall));
        values.extend(self.by_down.iter().map(|r| Value::opt_float(*r)));
        values.extend(self.by_distance.iter().map(|r| Value::opt_float(*r)));
        values.extend(self.by_field.iter().map(|r| Value::opt_float(*r)));
        values.extend(self.by_score.iter().map(|r| Value::opt_float(*r)));
        values.push(Value::opt_float(self.red_zone));
        values.push(Value::opt_float(self.fourth_quarter));
        values.push(Value::opt_float(self.two_minute));
        values
    }
}

type WeekKey = (TeamCode, u16, u8);

/// Accumulates team-week counts and answers rate lookups under a scope
pub struct TendencyComputer {
    scope: TendencyScope,
    weekly: BTreeMap<WeekKey, TendencyCounts>,
}

impl TendencyComputer {
    pub fn new(scope: TendencyScope) -> Self {
        TendencyComputer {
            scope,
            weekly: BTreeMap::new(),
        }
    }

    pub fn scope(&self) -> TendencyScope {
        self.scope
    }

    /// Count plays into their team-week cells
    pub fn process_plays(&mut self, plays: &[PlayRecord], categories: &[SituationCategories]) {
        for (play, cats) in plays.iter().zip(categories) {
            self.weekly
                .entry((play.posteam.clone(), play.season, play.week))
                .or_default()
                .update(play, cats);
        }
    }

    /// Counts visible to a play by `team` in `season`/`week`
    pub fn counts_for(&self, team: &TeamCode, season: u16, week: u8) -> TendencyCounts {
        let (lower, upper) = match self.scope {
            TendencyScope::FullCorpus => (
                Bound::Included((team.clone(), u16::MIN, u8::MIN)),
                Bound::Included((team.clone(), u16::MAX, u8::MAX)),
            ),
            TendencyScope::Season => (
                Bound::Included((team.clone(), season, u8::MIN)),
                Bound::Included((team.clone(), season, u8::MAX)),
            ),
            TendencyScope::PriorWeeks => (
                Bound::Included((team.clone(), season, u8::MIN)),
                Bound::Excluded((team.clone(), season, week)),
            ),
        };

        let mut total = TendencyCounts::default();
        for counts in self.weekly.range((lower, upper)).map(|(_, c)| c) {
            total.merge(counts);
        }
        total
    }

    pub fn get(&self, team: &TeamCode, season: u16, week: u8) -> TendencyFeatures {
        self.counts_for(team, season, week).rates()
    }

    /// Rates for every play, aligned by index
    pub fn features(&self, plays: &[PlayRecord]) -> Vec<TendencyFeatures> {
        let mut memo: HashMap<WeekKey, TendencyFeatures> = HashMap::new();
        plays
            .iter()
            .map(|play| {
                let key = match self.scope {
                    TendencyScope::FullCorpus => (play.posteam.clone(), 0, 0),
                    TendencyScope::Season => (play.posteam.clone(), play.season, 0),
                    TendencyScope::PriorWeeks => {
                        (play.posteam.clone(), play.season, play.week)
                    }
                };
                *memo
                    .entry(key)
                    .or_insert_with(|| self.get(&play.posteam, play.season, play.week))
            })
            .collect()
    }
}

/// Tendency features for every play under `scope`
pub fn compute_tendencies(
    plays: &[PlayRecord],
    categories: &[SituationCategories],
    scope: TendencyScope,
) -> Vec<TendencyFeatures> {
    let mut computer = TendencyComputer::new(scope);
    computer.process_plays(plays, categories);
    log::debug!(
        "Tendency counts cover {} team-weeks (scope {:?})",
        computer.weekly.len(),
        scope
    );
    computer.features(plays)
}
