//! Feature extraction
//!
//! One module per feature group. Stages read plays and produce one feature
//! struct per play, aligned by index; none of them modify their inputs.
//! Stages that walk plays in order (momentum, fatigue) compute a play's features
//! from state built by earlier plays, then fold the play in.

pub mod assembler;
pub mod context;
pub mod fatigue;
pub mod momentum;
pub mod performance;
pub mod personnel;
pub mod situation;
pub mod tendencies;

pub use assembler::{assemble, FeatureSummary};
pub use context::{ContextFeatures, ScheduleIndex};
pub use fatigue::{FatigueFeatures, FatigueTracker};
pub use momentum::{MomentumFeatures, MomentumTracker};
pub use performance::{PerformanceFeatures, TeamPerformance};
pub use personnel::{PersonnelFeatures, PersonnelIndex};
pub use situation::{SituationCategories, SituationFlags};
pub use tendencies::{TendencyComputer, TendencyFeatures, TendencyScope};

use std::collections::HashSet;

use crate::table::Value;
use crate::{PlayCallError, PlayRecord, Result};

/// A named block of feature columns
pub trait FeatureGroup {
    /// Column names, in the order `to_vec` yields values
    const NAMES: &'static [&'static str];

    fn to_vec(&self) -> Vec<Value>;
}

/// Verify plays are grouped by game and strictly increasing by play id within a game
///
/// Windowed stages depend on this order and would silently miscompute without it.
pub fn ensure_play_order(plays: &[PlayRecord]) -> Result<()> {
    let mut finished: HashSet<&str> = HashSet::new();
    let mut previous: Option<&PlayRecord> = None;

    for play in plays {
        if let Some(prev) = previous {
            if prev.game_id == play.game_id {
                if play.play_id <= prev.play_id {
                    return Err(PlayCallError::UnsortedInput {
                        game_id: play.game_id.clone(),
                        play_id: play.play_id,
                        previous_play_id: prev.play_id,
                    });
                }
            } else {
                finished.insert(prev.game_id.as_str());
                if finished.contains(play.game_id.as_str()) {
                    return Err(PlayCallError::SplitGame(play.game_id.clone()));
                }
            }
        }
        previous = Some(play);
    }
    Ok(())
}


#[cfg(test)]
mod tests {
    use super::test_support::make_play;
    use super::*;

    #[test]
    fn test_sorted_plays_pass() {
        let plays = vec![
            make_play("g1", 1, 1),
            make_play("g1", 5, 1),
            make_play("g2", 2, 1),
        ];
        assert!(ensure_play_order(&plays).is_ok());
    }

    #[test]
    fn test_out_of_order_play_fails() {
        let plays = vec![make_play("g1", 5, 1), make_play("g1", 3, 1)];
        match ensure_play_order(&plays) {
            Err(PlayCallError::UnsortedInput {
                play_id,
                previous_play_id,
                ..
            }) => {
                assert_eq!(play_id, 3);
                assert_eq!(previous_play_id, 5);
            }
            other => panic!("expected UnsortedInput, got {:?}", other),
        }
    }

    #[test]
    fn test_duplicate_play_fails() {
        let plays = vec![make_play("g1", 5, 1), make_play("g1", 5, 1)];
        assert!(ensure_play_order(&plays).is_err());
    }

    #[test]
    fn test_interleaved_games_fail() {
        let plays = vec![
            make_play("g1", 1, 1),
            make_play("g2", 1, 1),
            make_play("g1", 2, 1),
        ];
        assert!(matches!(
            ensure_play_order(&plays),
            Err(PlayCallError::SplitGame(g)) if g == "g1"
        ));
    }
}
