//! In-drive momentum features
//!
//! Rolling success, EPA and explosive-play windows plus running drive totals.
//! Everything here describes the plays before the current one in its drive:
//! features are computed from the drive state, then the play is folded in.

use std::collections::{HashMap, VecDeque};

use crate::features::{ensure_play_order, FeatureGroup};
use crate::table::Value;
use crate::{PlayRecord, Result};

/// Prior plays in the success rate and EPA windows
pub const SHORT_WINDOW: usize = 3;
/// Prior plays in the explosive-play window
pub const EXPLOSIVE_WINDOW: usize = 5;
/// Yards gained for a play to count as explosive
pub const EXPLOSIVE_YARDS: f64 = 10.0;

#[derive(Debug, Clone, Copy)]
struct Outcome {
    epa: Option<f64>,
    yards: Option<f64>,
}

#[derive(Debug, Clone, Default)]
struct DriveState {
    /// Most recent last, capped at the longest window
    recent: VecDeque<Outcome>,
    total_yards: f64,
    plays: u32,
    first_downs: u32,
    epa: f64,
}

impl DriveState {
    fn window(&self, len: usize) -> impl Iterator<Item = &Outcome> {
        self.recent.iter().skip(self.recent.len().saturating_sub(len))
    }

    fn features(&self) -> MomentumFeatures {
        let epas: Vec<f64> = self.window(SHORT_WINDOW).filter_map(|o| o.epa).collect();
        let (success_rate, epa_mean) = if epas.is_empty() {
            (None, None)
        } else {
            let n = epas.len() as f64;
            let successes = epas.iter().filter(|&&e| e > 0.0).count() as f64;
            (Some(successes / n), Some(epas.iter().sum::<f64>() / n))
        };

        let explosive = self
            .window(EXPLOSIVE_WINDOW)
            .filter(|o| o.yards.is_some_and(|y| y >= EXPLOSIVE_YARDS))
            .count() as u32;

        MomentumFeatures {
            success_last_3: success_rate,
            epa_last_3: epa_mean,
            explosive_last_5: explosive,
            drive_total_yards: self.total_yards,
            drive_play_count: self.plays,
            drive_first_downs: self.first_downs,
            drive_epa: self.epa,
            drive_yards_per_play: if self.plays == 0 {
                None
            } else {
                Some(self.total_yards / self.plays as f64)
            },
        }
    }

    fn push(&mut self, play: &PlayRecord) {
        self.recent.push_back(Outcome {
            epa: play.epa,
            yards: play.yards_gained,
        });
        if self.recent.len() > EXPLOSIVE_WINDOW {
            self.recent.pop_front();
        }
        self.total_yards += play.yards_gained.unwrap_or(0.0);
        self.plays += 1;
        self.first_downs += play.first_downs();
        self.epa += play.epa.unwrap_or(0.0);
    }
}

/// Tracks drive state across a sorted stream of plays
#[derive(Debug, Default)]
pub struct MomentumTracker {
    drives: HashMap<(String, u32), DriveState>,
}

impl MomentumTracker {
    pub fn new() -> Self {
        Self::default()
    }

    /// Features for a play from the plays already seen in its drive (call BEFORE update)
    pub fn compute(&self, play: &PlayRecord) -> MomentumFeatures {
        play.drive
            .and_then(|drive| self.drives.get(&(play.game_id.clone(), drive)))
            .map(DriveState::features)
            .unwrap_or_default()
    }

    /// Fold a play's outcome into its drive
    ///
    /// Plays without a drive number cannot be placed and are ignored.
    pub fn update(&mut self, play: &PlayRecord) {
        if let Some(drive) = play.drive {
            self.drives
                .entry((play.game_id.clone(), drive))
                .or_default()
                .push(play);
        }
    }

    pub fn reset(&mut self) {
        self.drives.clear();
    }
}

/// Momentum features for a play
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct MomentumFeatures {
    /// Share of the last 3 prior plays with positive EPA
    pub success_last_3: Option<f64>,
    pub epa_last_3: Option<f64>,
    /// Prior plays of 10+ yards among the last 5
    pub explosive_last_5: u32,
    pub drive_total_yards: f64,
    pub drive_play_count: u32,
    pub drive_first_downs: u32,
    pub drive_epa: f64,
    pub drive_yards_per_play: Option<f64>,
}

impl FeatureGroup for MomentumFeatures {
    const NAMES: &'static [&'static str] = &[
        "momentum_success_last_3",
        "momentum_epa_last_3",
        "momentum_explosive_last_5",
        "drive_total_yards",
        "drive_play_count",
        "drive_first_downs",
        "drive_epa",
        "drive_yards_per_play",
    ];

    fn to_vec(&self) -> Vec<Value> {
        vec![
            Value::opt_float(self.success_last_3),
            Value::opt_float(self.epa_last_3),
            Value::Int(i64::from(self.explosive_last_5)),
            Value::float(self.drive_total_yards),
            Value::Int(i64::from(self.drive_play_count)),
            Value::Int(i64::from(self.drive_first_downs)),
            Value::float(self.drive_epa),
            Value::opt_float(self.drive_yards_per_play),
        ]
    }
}

/// Momentum features for every play, aligned by index
///
/// Plays must be sorted by (game, play id); unsorted input is rejected.
pub fn compute_momentum(plays: &[PlayRecord]) -> Result<Vec<MomentumFeatures>> {
    ensure_play_order(plays)?;

    let mut tracker = MomentumTracker::new();
    let mut features = Vec::with_capacity(plays.len());
    for play in plays {
        features.push(tracker.compute(play));
        tracker.update(play);
    }
    Ok(features)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::features::test_support::make_play;

    fn drive_play(play_id: u64, drive: u32, epa: f64, yards: f64) -> PlayRecord {
        let mut p = make_play("g1", play_id, drive);
        p.epa = Some(epa);
        p.yards_gained = Some(yards);
        p
    }

    #[test]
    fn test_three_play_drive() {
        let plays = vec![
            drive_play(1, 1, 0.5, 4.0),
            drive_play(2, 1, -0.2, -1.0),
            drive_play(3, 1, 1.0, 12.0),
        ];
        let feats = compute_momentum(&plays).unwrap();

        let third = &feats[2];
        assert!((third.epa_last_3.unwrap() - 0.15).abs() < 1e-9);
        assert_eq!(third.success_last_3, Some(0.5));
        assert_eq!(third.explosive_last_5, 0);
        assert_eq!(third.drive_total_yards, 3.0);
        assert_eq!(third.drive_play_count, 2);
        assert!((third.drive_epa - 0.3).abs() < 1e-9);
        assert_eq!(third.drive_yards_per_play, Some(1.5));
    }

    #[test]
    fn test_first_play_of_drive_has_no_history() {
        let plays = vec![
            drive_play(1, 1, 2.0, 40.0),
            drive_play(2, 2, 3.0, 25.0),
        ];
        let feats = compute_momentum(&plays).unwrap();
        for f in &feats {
            assert_eq!(f.success_last_3, None);
            assert_eq!(f.epa_last_3, None);
            assert_eq!(f.explosive_last_5, 0);
            assert_eq!(f.drive_total_yards, 0.0);
            assert_eq!(f.drive_play_count, 0);
            assert_eq!(f.drive_first_downs, 0);
            assert_eq!(f.drive_epa, 0.0);
            assert_eq!(f.drive_yards_per_play, None);
        }
    }

    #[test]
    fn test_windows_slide() {
        let mut plays: Vec<PlayRecord> = (1..=6)
            .map(|i| drive_play(i, 1, -1.0, 15.0))
            .collect();
        plays.push(drive_play(7, 1, 0.0, 0.0));
        plays[5].epa = Some(3.0);
        let feats = compute_momentum(&plays).unwrap();

        // Play 7 sees plays 2..=6 for explosive, 4..=6 for EPA
        assert_eq!(feats[6].explosive_last_5, 5);
        assert!((feats[6].epa_last_3.unwrap() - (1.0 / 3.0)).abs() < 1e-9);
        assert_eq!(feats[6].drive_play_count, 6);
    }

    #[test]
    fn test_missing_epa_skipped_in_window() {
        let mut first = drive_play(1, 1, 0.0, 3.0);
        first.epa = None;
        let plays = vec![first, drive_play(2, 1, 0.0, 0.0)];
        let feats = compute_momentum(&plays).unwrap();
        assert_eq!(feats[1].epa_last_3, None);
        assert_eq!(feats[1].drive_play_count, 1);
        assert_eq!(feats[1].drive_total_yards, 3.0);
    }

    #[test]
    fn test_first_downs_accumulate() {
        let mut first = drive_play(1, 1, 0.5, 11.0);
        first.first_down_rush = Some(true);
        let mut second = drive_play(2, 1, 0.5, 11.0);
        second.first_down_pass = Some(true);
        let plays = vec![first, second, drive_play(3, 1, 0.0, 0.0)];
        let feats = compute_momentum(&plays).unwrap();
        assert_eq!(feats[1].drive_first_downs, 1);
        assert_eq!(feats[2].drive_first_downs, 2);
    }

    #[test]
    fn test_play_without_drive_gets_no_history() {
        let mut orphan = drive_play(2, 1, 1.0, 20.0);
        orphan.drive = None;
        let plays = vec![drive_play(1, 1, 1.0, 20.0), orphan, drive_play(3, 1, 0.0, 0.0)];
        let feats = compute_momentum(&plays).unwrap();
        assert_eq!(feats[1], MomentumFeatures::default());
        assert_eq!(feats[2].drive_play_count, 1);
    }

    #[test]
    fn test_unsorted_input_rejected() {
        let plays = vec![drive_play(2, 1, 0.0, 0.0), drive_play(1, 1, 0.0, 0.0)];
        assert!(compute_momentum(&plays).is_err());
    }
}
