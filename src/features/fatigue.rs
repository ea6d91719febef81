//! Tempo and snap-count features
//!
//! Unlike momentum, these describe the game up to and including the current
//! snap: the time since the previous snap and the snap count are both known
//! before the ball is put in play.

use std::collections::HashMap;

use crate::features::{ensure_play_order, FeatureGroup};
use crate::table::Value;
use crate::{PlayRecord, Result, TeamCode};

/// Seconds between snaps below which tempo counts as fast
pub const FAST_TEMPO_SECONDS: f64 = 20.0;
/// Trailing snap window for the recent play count
pub const RECENT_SNAP_WINDOW: u32 = 10;

/// Tracks the previous snap per game and snap counts per offense
#[derive(Debug, Default)]
pub struct FatigueTracker {
    /// Game clock at the previous snap of each game
    last_clock: HashMap<String, Option<f64>>,
    snaps: HashMap<(String, TeamCode), u32>,
}

impl FatigueTracker {
    pub fn new() -> Self {
        Self::default()
    }

    /// Features for a play (call BEFORE update)
    pub fn compute(&self, play: &PlayRecord) -> FatigueFeatures {
        let seconds_since_last_play = match (
            self.last_clock.get(&play.game_id).copied().flatten(),
            play.game_seconds_remaining,
        ) {
            (Some(previous), Some(current)) => Some((previous - current).abs()),
            _ => None,
        };

        let snaps = self
            .snaps
            .get(&(play.game_id.clone(), play.posteam.clone()))
            .copied()
            .unwrap_or(0)
            + 1;

        FatigueFeatures {
            seconds_since_last_play,
            fast_tempo: seconds_since_last_play.is_some_and(|s| s < FAST_TEMPO_SECONDS),
            total_offensive_snaps: snaps,
            // Positional stand-in for a time window: snaps, not minutes
            plays_last_10: snaps.min(RECENT_SNAP_WINDOW),
            no_huddle: play.no_huddle,
            shotgun: play.shotgun,
        }
    }

    pub fn update(&mut self, play: &PlayRecord) {
        self.last_clock
            .insert(play.game_id.clone(), play.game_seconds_remaining);
        *self
            .snaps
            .entry((play.game_id.clone(), play.posteam.clone()))
            .or_insert(0) += 1;
    }

    pub fn reset(&mut self) {
        self.last_clock.clear();
        self.snaps.clear();
    }
}

/// Tempo features for a play
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct FatigueFeatures {
    pub seconds_since_last_play: Option<f64>,
    pub fast_tempo: bool,
    /// Running count of this offense's snaps in the game, this one included
    pub total_offensive_snaps: u32,
    pub plays_last_10: u32,
    pub no_huddle: Option<bool>,
    pub shotgun: Option<bool>,
}

impl FeatureGroup for FatigueFeatures {
    const NAMES: &'static [&'static str] = &[
        "fatigue_seconds_since_last_play",
        "fatigue_fast_tempo",
        "fatigue_total_offensive_snaps",
        "fatigue_plays_last_10",
        "fatigue_no_huddle",
        "formation_shotgun",
    ];

    fn to_vec(&self) -> Vec<Value> {
        vec![
            Value::opt_float(self.seconds_since_last_play),
            Value::flag(self.fast_tempo),
            Value::Int(i64::from(self.total_offensive_snaps)),
            Value::Int(i64::from(self.plays_last_10)),
            Value::opt_flag(self.no_huddle),
            Value::opt_flag(self.shotgun),
        ]
    }
}

/// Fatigue features for every play, aligned by index
pub fn compute_fatigue(plays: &[PlayRecord]) -> Result<Vec<FatigueFeatures>> {
    ensure_play_order(plays)?;

    let mut tracker = FatigueTracker::new();
    let mut features = Vec::with_capacity(plays.len());
    for play in plays {
        features.push(tracker.compute(play));
        tracker.update(play);
    }
    Ok(features)
}
