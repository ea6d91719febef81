//! Game environment features joined from the schedule table
//!
//! Venue, weather, division and rest attributes are per game; rest days are
//! picked for the side the possessing team is on.

use std::collections::HashMap;

use crate::data::ScheduleRecord;
use crate::features::FeatureGroup;
use crate::table::Value;
use crate::{PlayRecord, Side};

/// Temperatures below this (°F) count as cold
pub const COLD_TEMPERATURE: f64 = 40.0;
/// Wind above this (mph) counts as high
pub const HIGH_WIND: f64 = 15.0;

/// Schedule rows keyed by game
#[derive(Debug, Default)]
pub struct ScheduleIndex {
    games: HashMap<String, ScheduleRecord>,
}

impl ScheduleIndex {
    pub fn new(records: &[ScheduleRecord]) -> Self {
        let mut games = HashMap::with_capacity(records.len());
        for record in records {
            games
                .entry(record.game_id.clone())
                .or_insert_with(|| record.clone());
        }
        ScheduleIndex { games }
    }

    pub fn len(&self) -> usize {
        self.games.len()
    }

    pub fn is_empty(&self) -> bool {
        self.games.is_empty()
    }

    pub fn get(&self, game_id: &str) -> Option<&ScheduleRecord> {
        self.games.get(game_id)
    }

    pub fn features(&self, play: &PlayRecord) -> ContextFeatures {
        match self.get(&play.game_id) {
            Some(game) => ContextFeatures::from_schedule(play, game),
            None => ContextFeatures::default(),
        }
    }
}

/// Environment features for a play
///
/// Flags default to 0 when the game has no schedule row or the attribute is
/// missing; raw measurements stay missing.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct ContextFeatures {
    pub outdoor: bool,
    pub dome: bool,
    pub grass: bool,
    pub temperature: Option<f64>,
    pub wind: Option<f64>,
    pub cold_weather: bool,
    pub high_wind: bool,
    pub division_game: bool,
    pub team_rest_days: Option<f64>,
}

impl ContextFeatures {
    pub fn from_schedule(play: &PlayRecord, game: &ScheduleRecord) -> Self {
        let side = play.posteam_type.or_else(|| {
            if play.posteam == game.home_team {
                Some(Side::Home)
            } else if play.posteam == game.away_team {
                Some(Side::Away)
            } else {
                None
            }
        });

        ContextFeatures {
            outdoor: game.roof.as_deref() == Some("outdoors"),
            dome: game.roof.as_deref() == Some("dome"),
            grass: game.surface.as_deref() == Some("grass"),
            temperature: game.temp,
            wind: game.wind,
            cold_weather: game.temp.is_some_and(|t| t < COLD_TEMPERATURE),
            high_wind: game.wind.is_some_and(|w| w > HIGH_WIND),
            division_game: game.div_game.unwrap_or(false),
            team_rest_days: match side {
                Some(Side::Home) => game.home_rest,
                Some(Side::Away) => game.away_rest,
                None => None,
            },
        }
    }
}

impl FeatureGroup for ContextFeatures {
    const NAMES: &'static [&'static str] = &[
        "context_outdoor",
        "context_dome",
        "context_grass",
        "context_temperature",
        "context_wind",
        "context_cold_weather",
        "context_high_wind",
        "context_division_game",
        "context_team_rest_days",
    ];

    fn to_vec(&self) -> Vec<Value> {
        vec![
            Value::flag(self.outdoor),
            Value::flag(self.dome),
            Value::flag(self.grass),
            Value::opt_float(self.temperature),
            Value::opt_float(self.wind),
            Value::flag(self.cold_weather),
            Value::flag(self.high_wind),
            Value::flag(self.division_game),
            Value::opt_float(self.team_rest_days),
        ]
    }
}

pub fn join_context(plays: &[PlayRecord], index: &ScheduleIndex) -> Vec<ContextFeatures> {
    plays.iter().map(|p| index.features(p)).collect()
}
