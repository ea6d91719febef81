//! Data ingestion
//!
//! CSV readers for the play-by-play, participation, schedule and weekly player
//! stats tables, with column checks done before any row is decoded.

pub mod auxiliary;
pub mod cache;
pub mod plays;
pub mod schema;

pub use auxiliary::{ParticipationRecord, PlayerWeekStats, PositionGroup, ScheduleRecord};
pub use cache::{load_seasons, InputTables, TableKind};
pub use plays::{load_plays, read_plays, PlayLoad};
