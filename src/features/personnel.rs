//! Defensive personnel features joined from participation data

use std::collections::HashMap;

use crate::data::ParticipationRecord;
use crate::features::FeatureGroup;
use crate::table::Value;
use crate::PlayRecord;

/// Box counts below this are a light box
pub const LIGHT_BOX: u8 = 6;
/// Box counts at or above this are a heavy box
pub const HEAVY_BOX: u8 = 8;

/// Participation rows keyed by (game, play)
#[derive(Debug, Default)]
pub struct PersonnelIndex {
    by_play: HashMap<(String, u64), ParticipationRecord>,
}

impl PersonnelIndex {
    /// Index records; the first record for a (game, play) wins
    pub fn new(records: &[ParticipationRecord]) -> Self {
        let mut by_play = HashMap::with_capacity(records.len());
        for record in records {
            by_play
                .entry((record.game_id.clone(), record.play_id))
                .or_insert_with(|| record.clone());
        }
        PersonnelIndex { by_play }
    }

    pub fn len(&self) -> usize {
        self.by_play.len()
    }

    pub fn is_empty(&self) -> bool {
        self.by_play.is_empty()
    }

    pub fn get(&self, game_id: &str, play_id: u64) -> Option<&ParticipationRecord> {
        self.by_play.get(&(game_id.to_string(), play_id))
    }

    /// Features for a play; an unmatched play keeps missing counts and 0 flags
    pub fn features(&self, play: &PlayRecord) -> PersonnelFeatures {
        let record = self.get(&play.game_id, play.play_id);
        let defenders_in_box = record.and_then(|r| r.defenders_in_box);
        PersonnelFeatures {
            defenders_in_box,
            pass_rushers: record.and_then(|r| r.number_of_pass_rushers),
            light_box: defenders_in_box.is_some_and(|n| n < LIGHT_BOX),
            heavy_box: defenders_in_box.is_some_and(|n| n >= HEAVY_BOX),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct PersonnelFeatures {
    pub defenders_in_box: Option<u8>,
    pub pass_rushers: Option<u8>,
    pub light_box: bool,
    pub heavy_box: bool,
}

impl FeatureGroup for PersonnelFeatures {
    const NAMES: &'static [&'static str] = &[
        "personnel_defenders_in_box",
        "personnel_light_box",
        "personnel_heavy_box",
        "personnel_pass_rushers",
    ];

    fn to_vec(&self) -> Vec<Value> {
        vec![
            Value::opt_int(self.defenders_in_box),
            Value::flag(self.light_box),
            Value::flag(self.heavy_box),
            Value::opt_int(self.pass_rushers),
        ]
    }
}

pub fn join_personnel(plays: &[PlayRecord], index: &PersonnelIndex) -> Vec<PersonnelFeatures> {
    plays.iter().map(|p| index.features(p)).collect()
}
