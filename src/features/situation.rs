//! Situation categories and flags
//!
//! Buckets down-and-distance, field position, score and clock into the
//! categories tendencies are sliced by, plus simple 0/1 situation flags.

use crate::features::FeatureGroup;
use crate::table::Value;
use crate::PlayRecord;

/// Half clock below which a drive is in two-minute mode
pub const TWO_MINUTE_SECONDS: f64 = 120.0;

/// Yards to go bucket
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum DistanceBucket {
    Short,
    Medium,
    Long,
}

impl DistanceBucket {
    pub const ALL: [DistanceBucket; 3] = [
        DistanceBucket::Short,
        DistanceBucket::Medium,
        DistanceBucket::Long,
    ];

    pub fn from_ydstogo(ydstogo: u8) -> Self {
        if ydstogo <= 3 {
            DistanceBucket::Short
        } else if ydstogo <= 7 {
            DistanceBucket::Medium
        } else {
            DistanceBucket::Long
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            DistanceBucket::Short => "short",
            DistanceBucket::Medium => "medium",
            DistanceBucket::Long => "long",
        }
    }

    pub fn index(&self) -> usize {
        *self as usize
    }
}

/// Field position bucket, from the distance to the opponent goal line
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum FieldPosition {
    OwnTerritory,
    MidfieldApproach,
    OpponentTerritory,
    RedZone,
    GoalLine,
}

impl FieldPosition {
    pub const ALL: [FieldPosition; 5] = [
        FieldPosition::OwnTerritory,
        FieldPosition::MidfieldApproach,
        FieldPosition::OpponentTerritory,
        FieldPosition::RedZone,
        FieldPosition::GoalLine,
    ];

    pub fn from_yardline(yardline_100: u8) -> Self {
        if yardline_100 > 80 {
            FieldPosition::OwnTerritory
        } else if yardline_100 > 50 {
            FieldPosition::MidfieldApproach
        } else if yardline_100 > 20 {
            FieldPosition::OpponentTerritory
        } else if yardline_100 > 10 {
            FieldPosition::RedZone
        } else {
            FieldPosition::GoalLine
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            FieldPosition::OwnTerritory => "own_territory",
            FieldPosition::MidfieldApproach => "midfield_approach",
            FieldPosition::OpponentTerritory => "opponent_territory",
            FieldPosition::RedZone => "red_zone",
            FieldPosition::GoalLine => "goal_line",
        }
    }

    pub fn index(&self) -> usize {
        *self as usize
    }
}

/// Score margin bucket from the possessing team's perspective
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ScoreSituation {
    TrailingBig,
    TrailingSmall,
    Tied,
    LeadingSmall,
    LeadingBig,
}

impl ScoreSituation {
    pub const ALL: [ScoreSituation; 5] = [
        ScoreSituation::TrailingBig,
        ScoreSituation::TrailingSmall,
        ScoreSituation::Tied,
        ScoreSituation::LeadingSmall,
        ScoreSituation::LeadingBig,
    ];

    pub fn from_differential(diff: i32) -> Self {
        if diff < -7 {
            ScoreSituation::TrailingBig
        } else if diff < 0 {
            ScoreSituation::TrailingSmall
        } else if diff == 0 {
            ScoreSituation::Tied
        } else if diff <= 7 {
            ScoreSituation::LeadingSmall
        } else {
            ScoreSituation::LeadingBig
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            ScoreSituation::TrailingBig => "trailing_big",
            ScoreSituation::TrailingSmall => "trailing_small",
            ScoreSituation::Tied => "tied",
            ScoreSituation::LeadingSmall => "leading_small",
            ScoreSituation::LeadingBig => "leading_big",
        }
    }

    pub fn index(&self) -> usize {
        *self as usize
    }
}

/// Categorical view of a play's pre-snap situation
///
/// A category is `None` when its input field is missing.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct SituationCategories {
    pub distance: Option<DistanceBucket>,
    pub field_position: Option<FieldPosition>,
    pub score: Option<ScoreSituation>,
    pub two_minute_drill: Option<bool>,
    pub fourth_quarter: Option<bool>,
}

impl SituationCategories {
    pub fn categorize(play: &PlayRecord) -> Self {
        SituationCategories {
            distance: play.ydstogo.map(DistanceBucket::from_ydstogo),
            field_position: play.yardline_100.map(FieldPosition::from_yardline),
            score: play.score_differential.map(ScoreSituation::from_differential),
            two_minute_drill: play
                .half_seconds_remaining
                .map(|s| s < TWO_MINUTE_SECONDS),
            fourth_quarter: play.qtr.map(|q| q == 4),
        }
    }
}

pub fn categorize_all(plays: &[PlayRecord]) -> Vec<SituationCategories> {
    plays.iter().map(SituationCategories::categorize).collect()
}

/// 0/1 situation indicators
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct SituationFlags {
    pub short_yardage: Option<bool>,
    pub long_distance: Option<bool>,
    pub red_zone: Option<bool>,
    pub goal_line: Option<bool>,
    pub passing_down: Option<bool>,
    pub third_down: Option<bool>,
    pub losing: Option<bool>,
    pub winning: Option<bool>,
    pub tied: Option<bool>,
    /// Missing half clock counts as not two-minute
    pub two_minute: bool,
    pub fourth_quarter: Option<bool>,
}

impl SituationFlags {
    pub fn compute(play: &PlayRecord, categories: &SituationCategories) -> Self {
        SituationFlags {
            short_yardage: play.ydstogo.map(|y| y <= 3),
            long_distance: play.ydstogo.map(|y| y >= 7),
            red_zone: play.yardline_100.map(|y| y <= 20),
            goal_line: play.yardline_100.map(|y| y <= 5),
            passing_down: play.down.map(|d| d >= 3),
            third_down: play.down.map(|d| d == 3),
            losing: play.score_differential.map(|d| d < 0),
            winning: play.score_differential.map(|d| d > 0),
            tied: play.score_differential.map(|d| d == 0),
            two_minute: categories.two_minute_drill.unwrap_or(false),
            fourth_quarter: categories.fourth_quarter,
        }
    }
}

impl FeatureGroup for SituationFlags {
    const NAMES: &'static [&'static str] = &[
        "situation_short_yardage",
        "situation_long_distance",
        "situation_red_zone",
        "situation_goal_line",
        "situation_passing_down",
        "situation_third_down",
        "situation_losing",
        "situation_winning",
        "situation_tied",
        "situation_two_minute",
        "situation_fourth_quarter",
    ];

    fn to_vec(&self) -> Vec<Value> {
        vec![
            Value::opt_flag(self.short_yardage),
            Value::opt_flag(self.long_distance),
            Value::opt_flag(self.red_zone),
            Value::opt_flag(self.goal_line),
            Value::opt_flag(self.passing_down),
            Value::opt_flag(self.third_down),
            Value::opt_flag(self.losing),
            Value::opt_flag(self.winning),
            Value::opt_flag(self.tied),
            Value::flag(self.two_minute),
            Value::opt_flag(self.fourth_quarter),
        ]
    }
}
